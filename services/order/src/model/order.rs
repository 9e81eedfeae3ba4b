use std::result::Result as DefaultResult;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsnMap, Value as JsnVal};
use uuid::Uuid;

use shopping_common::config::AppStoreSeedCfg;
use shopping_common::error::AppErrorCode;

use crate::api::web::dto::OrderCreateReqData;
use crate::constant::record_kind;
use crate::error::AppError;

// orders and stores share the same table, the attribute `type` tells
// them apart, field names follow the stored record layout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderModel {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub store_id: String,
    pub created: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreModel {
    pub id: String,
    pub store_code: String,
    pub store_name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<OrderCreateReqData> for OrderModel {
    fn from(value: OrderCreateReqData) -> Self {
        let OrderCreateReqData {
            product_id,
            quantity,
            store_id,
        } = value;
        Self {
            id: Uuid::new_v4().to_string(),
            created: Utc::now(),
            kind: record_kind::ORDER.to_string(),
            product_id,
            quantity,
            store_id,
        }
    }
}

impl From<AppStoreSeedCfg> for StoreModel {
    fn from(value: AppStoreSeedCfg) -> Self {
        Self {
            id: value.id,
            store_code: value.store_code,
            store_name: value.store_name,
            kind: record_kind::STORE.to_string(),
        }
    }
}

fn to_record<T: Serialize>(obj: &T) -> DefaultResult<JsnMap<String, JsnVal>, AppError> {
    match serde_json::to_value(obj) {
        Ok(JsnVal::Object(m)) => Ok(m),
        Ok(_others) => Err(AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some("record-not-object".to_string()),
        }),
        Err(e) => Err(AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(e.to_string()),
        }),
    }
}

fn from_record<T: for<'de> Deserialize<'de>>(
    rec: JsnMap<String, JsnVal>,
) -> DefaultResult<T, AppError> {
    serde_json::from_value::<T>(JsnVal::Object(rec)).map_err(|e| AppError {
        code: AppErrorCode::DataCorruption,
        detail: Some(e.to_string()),
    })
}

impl OrderModel {
    pub fn is_order_record(rec: &JsnMap<String, JsnVal>) -> bool {
        rec.get("type").and_then(JsnVal::as_str) == Some(record_kind::ORDER)
    }
    pub fn to_record(&self) -> DefaultResult<JsnMap<String, JsnVal>, AppError> {
        to_record(self)
    }
    pub fn try_from_record(rec: JsnMap<String, JsnVal>) -> DefaultResult<Self, AppError> {
        from_record(rec)
    }
}

impl StoreModel {
    pub fn to_record(&self) -> DefaultResult<JsnMap<String, JsnVal>, AppError> {
        to_record(self)
    }
    pub fn try_from_record(rec: JsnMap<String, JsnVal>) -> DefaultResult<Self, AppError> {
        from_record(rec)
    }
}
