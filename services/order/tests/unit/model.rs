use chrono::{TimeZone, Utc};
use serde_json::{json, Value as JsnVal};

use shopping_order::api::web::dto::{OrderCreateReqData, OrderDto};
use shopping_order::error::AppErrorCode;
use shopping_order::model::{FeatureFlagModel, FeatureFlagSet, OrderModel, StoreModel};
use shopping_order::AppStoreSeedCfg;

#[test]
fn flag_set_parse_ok() {
    let raw = json!({
        "opsPreventCreateOrders": {"enabled": true},
        "releaseCheckCreateOrderQuantity": {"enabled": true, "limit": 7},
        "opsLimitListOrdersResults": {"enabled": false, "limit": 3.0},
        "createOrderAllowList": {"enabled": true, "allow": "59b8a675"},
        "someNewFlag": {"limit": 5}
    });
    let flags = serde_json::from_value::<FeatureFlagSet>(raw).unwrap();
    assert_eq!(flags.len(), 5);
    assert!(flags.is_enabled("opsPreventCreateOrders"));
    assert!(!flags.is_enabled("opsLimitListOrdersResults"));
    // switch defaults to off if omitted
    assert!(!flags.is_enabled("someNewFlag"));
    assert!(!flags.is_enabled("notExistFlag"));
    assert!(flags.get("notExistFlag").is_none());
    let f = flags.get("releaseCheckCreateOrderQuantity").unwrap();
    assert_eq!(f.limit(), Some(7));
    assert!(f.allow().is_none());
    let f = flags.get("opsLimitListOrdersResults").unwrap();
    assert_eq!(f.limit(), Some(3));
    let f = flags.get("createOrderAllowList").unwrap();
    assert_eq!(f.allow(), Some("59b8a675"));
    assert!(f.limit().is_none());
}

#[test]
fn flag_limit_invalid_value() {
    let cases = [json!("12"), json!(-3), json!(-1.5), json!(null), json!([4])];
    for v in cases {
        let raw = json!({"enabled": true, "limit": v});
        let f = serde_json::from_value::<FeatureFlagModel>(raw).unwrap();
        assert!(f.limit().is_none());
    }
}

#[test]
fn flag_set_parse_error() {
    let raw = json!({"opsPreventCreateOrders": {"enabled": "yes"}});
    let result = serde_json::from_value::<FeatureFlagSet>(raw);
    assert!(result.is_err());
    let raw = json!(["opsPreventCreateOrders"]);
    let result = serde_json::from_value::<FeatureFlagSet>(raw);
    assert!(result.is_err());
}

#[test]
fn flag_set_from_iter() {
    let flags = [(
        "opsPreventCreateOrders".to_string(),
        FeatureFlagModel {
            enabled: true,
            ..Default::default()
        },
    )]
    .into_iter()
    .collect::<FeatureFlagSet>();
    assert!(!flags.is_empty());
    assert!(flags.is_enabled("opsPreventCreateOrders"));
    let flags = FeatureFlagSet::default();
    assert!(flags.is_empty());
}

#[test]
fn order_from_request() {
    let raw = r#"{"productId":"p-1234","quantity":3,"storeId":"59b8a675-9bb7-46c7-955d-2566edfba8ea"}"#;
    let req = serde_json::from_str::<OrderCreateReqData>(raw).unwrap();
    let time_lower = Utc::now();
    let o1 = OrderModel::from(req);
    let req = serde_json::from_str::<OrderCreateReqData>(raw).unwrap();
    let o2 = OrderModel::from(req);
    assert_eq!(o1.product_id.as_str(), "p-1234");
    assert_eq!(o1.quantity, 3);
    assert_eq!(o1.kind.as_str(), "Orders");
    assert!(o1.created >= time_lower);
    assert_eq!(o1.id.len(), 36);
    assert_ne!(o1.id, o2.id);
}

#[test]
fn order_request_invalid() {
    let cases = [
        r#"{"productId":"p-1234","quantity":-3,"storeId":"s1"}"#,
        r#"{"productId":"p-1234","storeId":"s1"}"#,
        r#"{"productId":"p-1234","quantity":"3","storeId":"s1"}"#,
        r#"["p-1234", 3, "s1"]"#,
        r#"not-json"#,
    ];
    for raw in cases {
        let result = OrderCreateReqData::parse(raw);
        assert!(result.is_err(), "input:{raw}");
    }
}

#[test]
fn order_record_conversion() {
    let order = OrderModel {
        id: "6f3e2a10-8a4b-4d8e-9f60-2a9c1c0e4b11".to_string(),
        product_id: "p-1234".to_string(),
        quantity: 2,
        store_id: "4e02e8f2-c0fe-493e-b259-1047254ad969".to_string(),
        created: Utc.with_ymd_and_hms(2023, 11, 4, 8, 30, 15).unwrap(),
        kind: "Orders".to_string(),
    };
    let rec = order.to_record().unwrap();
    assert!(OrderModel::is_order_record(&rec));
    assert_eq!(rec.get("productId").unwrap().as_str(), Some("p-1234"));
    assert_eq!(rec.get("storeId").unwrap().as_str(), Some("4e02e8f2-c0fe-493e-b259-1047254ad969"));
    assert_eq!(rec.get("type").unwrap().as_str(), Some("Orders"));
    assert!(rec.get("kind").is_none());
    let restored = OrderModel::try_from_record(rec).unwrap();
    assert_eq!(restored, order);
    let dto = OrderDto::from(order);
    let serial = serde_json::to_value(dto).unwrap();
    let obj = serial.as_object().unwrap();
    let mut keys = obj.keys().map(String::as_str).collect::<Vec<_>>();
    keys.sort();
    assert_eq!(keys, vec!["created", "id", "productId", "quantity", "storeId", "type"]);
}

#[test]
fn order_record_corrupted() {
    let rec = json!({"id": "o1", "type": "Orders", "quantity": 2});
    let rec = rec.as_object().unwrap().clone();
    assert!(OrderModel::is_order_record(&rec));
    let result = OrderModel::try_from_record(rec);
    assert_eq!(result.unwrap_err().code, AppErrorCode::DataCorruption);
}

#[test]
fn store_record_conversion() {
    let seed = AppStoreSeedCfg {
        id: "f5de2a0a-5a1d-4842-b38d-34e0fe420d33".to_string(),
        store_code: "MAN".to_string(),
        store_name: "Manchester".to_string(),
    };
    let store = StoreModel::from(seed);
    assert_eq!(store.kind.as_str(), "Stores");
    let rec = store.to_record().unwrap();
    assert!(!OrderModel::is_order_record(&rec));
    assert_eq!(rec.get("storeCode").unwrap().as_str(), Some("MAN"));
    assert_eq!(
        rec.get("type"),
        Some(&JsnVal::String("Stores".to_string()))
    );
    let restored = StoreModel::try_from_record(rec).unwrap();
    assert_eq!(restored, store);
}
