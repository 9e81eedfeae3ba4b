use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsnVal;

use crate::model::OrderModel;

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateReqData {
    pub product_id: String,
    pub quantity: u32,
    pub store_id: String,
}

impl OrderCreateReqData {
    /// decode a raw request body, only a JSON object is accepted, derived
    /// struct deserializers would otherwise take a sequence of field values
    pub fn parse(raw: &str) -> Result<Self, String> {
        let value = serde_json::from_str::<JsnVal>(raw).map_err(|e| e.to_string())?;
        if !value.is_object() {
            return Err("order must be a JSON object".to_string());
        }
        serde_json::from_value::<Self>(value).map_err(|e| e.to_string())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub store_id: String,
    pub created: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ErrorRespDto {
    pub reason: String,
}

impl From<OrderModel> for OrderDto {
    fn from(value: OrderModel) -> Self {
        Self {
            id: value.id,
            product_id: value.product_id,
            quantity: value.quantity,
            store_id: value.store_id,
            created: value.created,
            kind: value.kind,
        }
    }
}
