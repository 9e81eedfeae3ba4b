use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use shopping_order::error::{AppError, AppErrorCode};
use shopping_order::model::OrderModel;
use shopping_order::objstore::AbstObjectStore;
use shopping_order::repository::{
    app_repo_invoice, app_repo_order, AbsInvoiceRepo, InvoiceObjStoreRepo,
};
use shopping_order::usecase::{
    CreateOrderUseCase, GetOrderUseCase, ListOrdersUseCase, OrderUsKsErr, SeedStoresUseCase,
};
use shopping_order::{AppMetricKind, AppSharedState};

use crate::{
    ut_load_config, ut_setup_share_state, ut_setup_share_state_with, UtRecordingObjStore, UtSpy,
};

const UT_STORE_NEW: &str = "59b8a675-9bb7-46c7-955d-2566edfba8ea";
const UT_STORE_MAN: &str = "f5de2a0a-5a1d-4842-b38d-34e0fe420d33";
const UT_FLAG_PREVENT: &str = "opsPreventCreateOrders";
const UT_FLAG_QTY: &str = "releaseCheckCreateOrderQuantity";
const UT_FLAG_LIMIT_LIST: &str = "opsLimitListOrdersResults";

const ALL_METRICS: [AppMetricKind; 6] = [
    AppMetricKind::OrderCreatedSuccess,
    AppMetricKind::OrderCreatedError,
    AppMetricKind::GetOrderSuccess,
    AppMetricKind::GetOrderError,
    AppMetricKind::ListOrdersSuccess,
    AppMetricKind::ListOrdersError,
];

struct MockInvoiceRepo;

#[async_trait]
impl AbsInvoiceRepo for MockInvoiceRepo {
    async fn save(&self, _order: &OrderModel) -> DefaultResult<String, AppError> {
        Err(AppError {
            code: AppErrorCode::ObjectStoreFailure,
            detail: Some("bucket-unavailable".to_string()),
        })
    }
}

async fn ut_seed_stores(shr_state: &AppSharedState) {
    let repo_order = app_repo_order(shr_state.datastore()).await.unwrap();
    let seeds = shr_state.config().api_server.seed_stores.clone();
    let uc = SeedStoresUseCase {
        glb_state: shr_state.clone(),
        repo_order,
    };
    let num = uc.execute(seeds).await.unwrap();
    assert_eq!(num, 3);
}

async fn ut_setup(
    mocked_flags: DefaultResult<serde_json::Value, AppError>,
    fault_on: bool,
) -> (AppSharedState, UtSpy) {
    let (shr_state, spy) = ut_setup_share_state("config_ok.json", mocked_flags, fault_on);
    ut_seed_stores(&shr_state).await;
    (shr_state, spy)
}

async fn ut_create_order(
    shr_state: &AppSharedState,
    raw_body: &str,
) -> DefaultResult<OrderModel, OrderUsKsErr> {
    let ds = shr_state.datastore();
    let uc = CreateOrderUseCase {
        glb_state: shr_state.clone(),
        repo_order: app_repo_order(ds.clone()).await.unwrap(),
        repo_invoice: app_repo_invoice(ds),
    };
    uc.execute(raw_body).await
}

async fn ut_saved_orders(shr_state: &AppSharedState) -> Vec<OrderModel> {
    let repo = app_repo_order(shr_state.datastore()).await.unwrap();
    repo.fetch_all().await.unwrap()
}

async fn ut_insert_orders(shr_state: &AppSharedState, ids: &[&str]) {
    let repo = app_repo_order(shr_state.datastore()).await.unwrap();
    for id in ids {
        let o = OrderModel {
            id: id.to_string(),
            product_id: "p-883".to_string(),
            quantity: 1,
            store_id: UT_STORE_NEW.to_string(),
            created: Utc::now(),
            kind: "Orders".to_string(),
        };
        repo.create(&o).await.unwrap();
    }
}

fn ut_order_body(store_id: &str, quantity: u32) -> String {
    json!({"productId": "p-1234", "quantity": quantity, "storeId": store_id}).to_string()
}

fn ut_verify_metrics(shr_state: &AppSharedState, expect: &[(AppMetricKind, u64)]) {
    let metrics = shr_state.metrics();
    for kind in ALL_METRICS {
        let expect_value = expect
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| *v)
            .unwrap_or(0);
        assert_eq!(metrics.get(kind), expect_value, "metric:{}", kind.label());
    }
}

#[tokio::test]
async fn create_order_ok() {
    let (shr_state, spy) = ut_setup(Ok(json!({})), false).await;
    let recorder = UtRecordingObjStore::default();
    let objstore: Arc<Box<dyn AbstObjectStore>> = Arc::new(Box::new(recorder.clone()));
    let body = ut_order_body(UT_STORE_MAN, 3);
    let uc = CreateOrderUseCase {
        glb_state: shr_state.clone(),
        repo_order: app_repo_order(shr_state.datastore()).await.unwrap(),
        repo_invoice: Box::new(InvoiceObjStoreRepo::new(objstore)),
    };
    let order = uc.execute(body.as_str()).await.unwrap();
    assert_eq!(order.store_id.as_str(), UT_STORE_MAN);
    assert_eq!(order.quantity, 3);
    assert_eq!(order.kind.as_str(), "Orders");
    let saved = ut_saved_orders(&shr_state).await;
    assert_eq!(saved, vec![order.clone()]);
    // invoice written to object store
    let uploaded = recorder.uploaded.lock().unwrap().clone();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].0, format!("{}-invoice.txt", order.id));
    let invoice = serde_json::from_slice::<OrderModel>(&uploaded[0].1).unwrap();
    assert_eq!(invoice, order);
    let requested = spy.flag_requests.lock().unwrap().clone();
    assert_eq!(requested, vec![vec![UT_FLAG_PREVENT.to_string(), UT_FLAG_QTY.to_string()]]);
    assert_eq!(spy.fault_calls.load(Ordering::Relaxed), 1);
    ut_verify_metrics(&shr_state, &[(AppMetricKind::OrderCreatedSuccess, 1)]);
}

#[tokio::test]
async fn create_order_admission_blocked() {
    let flags = json!({UT_FLAG_PREVENT: {"enabled": true}});
    let (shr_state, spy) = ut_setup(Ok(flags), false).await;
    for qty in [1u32, 2, 3] {
        let body = ut_order_body(UT_STORE_NEW, qty);
        let result = ut_create_order(&shr_state, body.as_str()).await;
        let error = result.unwrap_err();
        assert!(matches!(error, OrderUsKsErr::AdmissionBlocked));
        assert_eq!(
            error.to_string().as_str(),
            "The creation of orders is currently on hold for maintenance"
        );
    }
    assert!(ut_saved_orders(&shr_state).await.is_empty());
    assert_eq!(spy.fault_calls.load(Ordering::Relaxed), 0);
    ut_verify_metrics(&shr_state, &[(AppMetricKind::OrderCreatedError, 3)]);
}

#[tokio::test]
async fn create_order_quantity_limit() {
    let flags = json!({
        UT_FLAG_PREVENT: {"enabled": false},
        UT_FLAG_QTY: {"enabled": true, "limit": 5}
    });
    let (shr_state, _spy) = ut_setup(Ok(flags), false).await;
    for qty in [5u32, 6, 250] {
        let body = ut_order_body(UT_STORE_NEW, qty);
        let error = ut_create_order(&shr_state, body.as_str()).await.unwrap_err();
        if let OrderUsKsErr::QuantityExceeded { quantity, limit } = &error {
            assert_eq!(*quantity, qty);
            assert_eq!(*limit, 5);
        } else {
            panic!("unexpected error: {:?}", error);
        }
        let expect_msg = format!("The quantity of {} is above the limit of 5", qty);
        assert_eq!(error.to_string(), expect_msg);
    }
    assert!(ut_saved_orders(&shr_state).await.is_empty());
    for qty in [0u32, 4] {
        let body = ut_order_body(UT_STORE_NEW, qty);
        let result = ut_create_order(&shr_state, body.as_str()).await;
        assert!(result.is_ok());
    }
    assert_eq!(ut_saved_orders(&shr_state).await.len(), 2);
    ut_verify_metrics(
        &shr_state,
        &[
            (AppMetricKind::OrderCreatedError, 3),
            (AppMetricKind::OrderCreatedSuccess, 2),
        ],
    );
}

#[tokio::test]
async fn create_order_quantity_check_disabled() {
    let flags = json!({UT_FLAG_QTY: {"enabled": false, "limit": 1}});
    let (shr_state, _spy) = ut_setup(Ok(flags), false).await;
    let body = ut_order_body(UT_STORE_NEW, 9999);
    let order = ut_create_order(&shr_state, body.as_str()).await.unwrap();
    assert_eq!(order.quantity, 9999);
}

#[tokio::test]
async fn create_order_quantity_flag_missing_limit() {
    let flags = json!({UT_FLAG_QTY: {"enabled": true}});
    let (shr_state, _spy) = ut_setup(Ok(flags), false).await;
    let body = ut_order_body(UT_STORE_NEW, 1);
    let error = ut_create_order(&shr_state, body.as_str()).await.unwrap_err();
    if let OrderUsKsErr::ConfigurationFetch(e) = error {
        assert_eq!(e.code, AppErrorCode::InvalidFeatureFlagCfg);
    } else {
        panic!("unexpected error: {:?}", error);
    }
    assert!(ut_saved_orders(&shr_state).await.is_empty());
}

#[tokio::test]
async fn create_order_store_not_found() {
    let (shr_state, _spy) = ut_setup(Ok(json!({})), false).await;
    let body = ut_order_body("a1e0d7c2-0000-4000-8000-000000000000", 2);
    let error = ut_create_order(&shr_state, body.as_str()).await.unwrap_err();
    assert!(matches!(&error, OrderUsKsErr::StoreNotFound(_)));
    assert_eq!(
        error.to_string().as_str(),
        "a1e0d7c2-0000-4000-8000-000000000000 is not found"
    );
    assert!(ut_saved_orders(&shr_state).await.is_empty());
}

#[tokio::test]
async fn create_order_without_seeded_stores() {
    let (shr_state, _spy) = ut_setup_share_state("config_ok.json", Ok(json!({})), false);
    let body = ut_order_body(UT_STORE_NEW, 2);
    let error = ut_create_order(&shr_state, body.as_str()).await.unwrap_err();
    assert!(matches!(error, OrderUsKsErr::StoreNotFound(_)));
}

#[tokio::test]
async fn create_order_empty_body() {
    let (shr_state, spy) = ut_setup(Ok(json!({})), false).await;
    for body in ["", "   ", "\n\t"] {
        let error = ut_create_order(&shr_state, body).await.unwrap_err();
        assert!(matches!(&error, OrderUsKsErr::Validation(_)));
        assert_eq!(error.to_string().as_str(), "no order supplied");
    }
    // rejected before any flag lookup
    assert!(spy.flag_requests.lock().unwrap().is_empty());
    ut_verify_metrics(&shr_state, &[(AppMetricKind::OrderCreatedError, 3)]);
}

#[tokio::test]
async fn create_order_invalid_payload() {
    let (shr_state, _spy) = ut_setup(Ok(json!({})), false).await;
    let cases = [
        r#"{"productId":"p-1234","storeId":"59b8a675-9bb7-46c7-955d-2566edfba8ea"}"#,
        r#"{"productId":"p-1234","quantity":-1,"storeId":"59b8a675-9bb7-46c7-955d-2566edfba8ea"}"#,
        r#"{"productId":"p-1234","quantity":2"#,
        "quantity=2",
        r#"["p-1234", 3, "59b8a675-9bb7-46c7-955d-2566edfba8ea"]"#,
        "17",
    ];
    for body in cases {
        let error = ut_create_order(&shr_state, body).await.unwrap_err();
        if let OrderUsKsErr::Validation(msg) = &error {
            assert!(msg.starts_with("invalid order"));
        } else {
            panic!("unexpected error: {:?}", error);
        }
    }
    assert!(ut_saved_orders(&shr_state).await.is_empty());
}

#[tokio::test]
async fn create_order_flag_service_error() {
    let mocked = Err(AppError {
        code: AppErrorCode::IOerror(std::io::ErrorKind::ConnectionRefused),
        detail: Some("flag-extension-down".to_string()),
    });
    let (shr_state, spy) = ut_setup(mocked, false).await;
    let body = ut_order_body(UT_STORE_NEW, 2);
    let error = ut_create_order(&shr_state, body.as_str()).await.unwrap_err();
    if let OrderUsKsErr::ConfigurationFetch(e) = &error {
        assert_eq!(
            e.code,
            AppErrorCode::IOerror(std::io::ErrorKind::ConnectionRefused)
        );
    } else {
        panic!("unexpected error: {:?}", error);
    }
    assert!(error.to_string().starts_with("failed to fetch feature flags"));
    assert_eq!(spy.fault_calls.load(Ordering::Relaxed), 0);
    assert!(ut_saved_orders(&shr_state).await.is_empty());
    ut_verify_metrics(&shr_state, &[(AppMetricKind::OrderCreatedError, 1)]);
}

#[tokio::test]
async fn create_order_synthetic_fault() {
    let (shr_state, spy) = ut_setup(Ok(json!({})), true).await;
    let body = ut_order_body(UT_STORE_NEW, 2);
    let error = ut_create_order(&shr_state, body.as_str()).await.unwrap_err();
    assert!(matches!(&error, OrderUsKsErr::SyntheticFault));
    assert_eq!(error.to_string().as_str(), "spurious error!!!");
    assert_eq!(spy.fault_calls.load(Ordering::Relaxed), 1);
    assert!(ut_saved_orders(&shr_state).await.is_empty());
}

#[tokio::test]
async fn create_order_fault_switched_off() {
    let mut cfg = ut_load_config("config_ok.json");
    cfg.api_server.random_errors_enabled = "FALSE".to_string();
    let (shr_state, spy) = ut_setup_share_state_with(cfg, Ok(json!({})), true);
    ut_seed_stores(&shr_state).await;
    for _ in 0..5 {
        let body = ut_order_body(UT_STORE_NEW, 2);
        let result = ut_create_order(&shr_state, body.as_str()).await;
        assert!(result.is_ok());
    }
    assert_eq!(spy.fault_calls.load(Ordering::Relaxed), 0);
    assert_eq!(ut_saved_orders(&shr_state).await.len(), 5);
}

#[tokio::test]
async fn create_order_invoice_failure() {
    let (shr_state, _spy) = ut_setup(Ok(json!({})), false).await;
    let uc = CreateOrderUseCase {
        glb_state: shr_state.clone(),
        repo_order: app_repo_order(shr_state.datastore()).await.unwrap(),
        repo_invoice: Box::new(MockInvoiceRepo),
    };
    let body = ut_order_body(UT_STORE_NEW, 2);
    let error = uc.execute(body.as_str()).await.unwrap_err();
    if let OrderUsKsErr::Persistence(e) = &error {
        assert_eq!(e.code, AppErrorCode::ObjectStoreFailure);
    } else {
        panic!("unexpected error: {:?}", error);
    }
    // the order is kept even though the invoice is missing
    let saved = ut_saved_orders(&shr_state).await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].store_id.as_str(), UT_STORE_NEW);
    ut_verify_metrics(&shr_state, &[(AppMetricKind::OrderCreatedError, 1)]);
}

#[tokio::test]
async fn create_order_table_full() {
    let (shr_state, _spy) = ut_setup_share_state("config_small_table.json", Ok(json!({})), false);
    ut_seed_stores(&shr_state).await;
    let body = ut_order_body(UT_STORE_NEW, 2);
    ut_create_order(&shr_state, body.as_str()).await.unwrap();
    let error = ut_create_order(&shr_state, body.as_str()).await.unwrap_err();
    if let OrderUsKsErr::Persistence(e) = &error {
        assert_eq!(e.code, AppErrorCode::ExceedingMaxLimit);
    } else {
        panic!("unexpected error: {:?}", error);
    }
}

#[tokio::test]
async fn get_order_ok() {
    let (shr_state, spy) = ut_setup(Ok(json!({})), false).await;
    let body = ut_order_body(UT_STORE_MAN, 7);
    let created = ut_create_order(&shr_state, body.as_str()).await.unwrap();
    let uc = GetOrderUseCase {
        glb_state: shr_state.clone(),
        repo_order: app_repo_order(shr_state.datastore()).await.unwrap(),
    };
    let fetched = uc.execute(created.id.as_str()).await.unwrap();
    assert_eq!(fetched, created);
    let requested = spy.flag_requests.lock().unwrap().clone();
    assert_eq!(requested.len(), 2);
    // lookup does not depend on any specific flag
    assert!(requested[1].is_empty());
    assert_eq!(spy.fault_calls.load(Ordering::Relaxed), 2);
    ut_verify_metrics(
        &shr_state,
        &[
            (AppMetricKind::OrderCreatedSuccess, 1),
            (AppMetricKind::GetOrderSuccess, 1),
        ],
    );
}

#[tokio::test]
async fn get_order_not_found() {
    let (shr_state, _spy) = ut_setup(Ok(json!({})), false).await;
    for oid in ["3a9c2f5e-7b1d-4e8a-9c0f-1d2e3f4a5b6c", UT_STORE_NEW] {
        let uc = GetOrderUseCase {
            glb_state: shr_state.clone(),
            repo_order: app_repo_order(shr_state.datastore()).await.unwrap(),
        };
        let error = uc.execute(oid).await.unwrap_err();
        assert!(matches!(&error, OrderUsKsErr::NotFound(_)));
        assert_eq!(error.to_string(), format!("order id {} is not found", oid));
    }
    ut_verify_metrics(&shr_state, &[(AppMetricKind::GetOrderError, 2)]);
}

#[tokio::test]
async fn get_order_synthetic_fault() {
    let (shr_state, _spy) = ut_setup(Ok(json!({})), true).await;
    ut_insert_orders(&shr_state, &["o-01"]).await;
    let uc = GetOrderUseCase {
        glb_state: shr_state.clone(),
        repo_order: app_repo_order(shr_state.datastore()).await.unwrap(),
    };
    let error = uc.execute("o-01").await.unwrap_err();
    assert!(matches!(error, OrderUsKsErr::SyntheticFault));
    ut_verify_metrics(&shr_state, &[(AppMetricKind::GetOrderError, 1)]);
}

async fn ut_list_orders(shr_state: &AppSharedState) -> DefaultResult<Vec<OrderModel>, OrderUsKsErr> {
    let uc = ListOrdersUseCase {
        glb_state: shr_state.clone(),
        repo_order: app_repo_order(shr_state.datastore()).await.unwrap(),
    };
    uc.execute().await
}

#[tokio::test]
async fn list_orders_without_limit() {
    let flags = json!({UT_FLAG_LIMIT_LIST: {"enabled": false, "limit": 1}});
    let (shr_state, spy) = ut_setup(Ok(flags), false).await;
    let orders = ut_list_orders(&shr_state).await.unwrap();
    assert!(orders.is_empty());
    ut_insert_orders(&shr_state, &["o-01", "o-02", "o-03"]).await;
    let orders = ut_list_orders(&shr_state).await.unwrap();
    let actual = orders.iter().map(|o| o.id.as_str()).collect::<Vec<_>>();
    assert_eq!(actual, vec!["o-01", "o-02", "o-03"]);
    let requested = spy.flag_requests.lock().unwrap().clone();
    assert_eq!(requested[0], vec![UT_FLAG_LIMIT_LIST.to_string()]);
    ut_verify_metrics(&shr_state, &[(AppMetricKind::ListOrdersSuccess, 2)]);
}

#[tokio::test]
async fn list_orders_with_limit() {
    let flags = json!({UT_FLAG_LIMIT_LIST: {"enabled": true, "limit": 2}});
    let (shr_state, _spy) = ut_setup(Ok(flags), false).await;
    ut_insert_orders(&shr_state, &["o-01"]).await;
    let orders = ut_list_orders(&shr_state).await.unwrap();
    assert_eq!(orders.len(), 1);
    ut_insert_orders(&shr_state, &["o-02", "o-03", "o-04"]).await;
    let orders = ut_list_orders(&shr_state).await.unwrap();
    let actual = orders.iter().map(|o| o.id.as_str()).collect::<Vec<_>>();
    assert_eq!(actual, vec!["o-01", "o-02"]);
}

#[tokio::test]
async fn list_orders_zero_limit() {
    let flags = json!({UT_FLAG_LIMIT_LIST: {"enabled": true, "limit": 0}});
    let (shr_state, _spy) = ut_setup(Ok(flags), false).await;
    ut_insert_orders(&shr_state, &["o-01", "o-02"]).await;
    let orders = ut_list_orders(&shr_state).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn list_orders_error() {
    let mocked = Err(AppError {
        code: AppErrorCode::HttpHandshakeFailure,
        detail: Some("status:500".to_string()),
    });
    let (shr_state, _spy) = ut_setup(mocked, false).await;
    let error = ut_list_orders(&shr_state).await.unwrap_err();
    assert!(matches!(error, OrderUsKsErr::ConfigurationFetch(_)));
    let (shr_state, _spy) = ut_setup(Ok(json!({})), true).await;
    let error = ut_list_orders(&shr_state).await.unwrap_err();
    assert!(matches!(error, OrderUsKsErr::SyntheticFault));
    ut_verify_metrics(&shr_state, &[(AppMetricKind::ListOrdersError, 1)]);
}

#[tokio::test]
async fn seed_stores_empty_list() {
    let (shr_state, _spy) = ut_setup_share_state("config_ok.json", Ok(json!({})), false);
    let uc = SeedStoresUseCase {
        glb_state: shr_state.clone(),
        repo_order: app_repo_order(shr_state.datastore()).await.unwrap(),
    };
    let num = uc.execute(Vec::new()).await.unwrap();
    assert_eq!(num, 0);
    let repo = app_repo_order(shr_state.datastore()).await.unwrap();
    assert!(repo.fetch_stores().await.unwrap().is_empty());
}

#[tokio::test]
async fn seed_stores_idempotent() {
    let (shr_state, _spy) = ut_setup(Ok(json!({})), false).await;
    ut_seed_stores(&shr_state).await;
    let repo = app_repo_order(shr_state.datastore()).await.unwrap();
    let stores = repo.fetch_stores().await.unwrap();
    let codes = stores.iter().map(|s| s.store_code.as_str()).collect::<Vec<_>>();
    assert_eq!(codes, vec!["NEW", "LON", "MAN"]);
}
