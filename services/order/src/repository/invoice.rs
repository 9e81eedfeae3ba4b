use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;

use shopping_common::error::AppErrorCode;

use crate::constant::INVOICE_KEY_SUFFIX;
use crate::error::AppError;
use crate::model::OrderModel;
use crate::objstore::AbstObjectStore;

use super::AbsInvoiceRepo;

pub struct InvoiceObjStoreRepo {
    objstore: Arc<Box<dyn AbstObjectStore>>,
}

impl InvoiceObjStoreRepo {
    pub fn new(objstore: Arc<Box<dyn AbstObjectStore>>) -> Self {
        Self { objstore }
    }

    pub fn object_key(oid: &str) -> String {
        format!("{oid}{INVOICE_KEY_SUFFIX}")
    }
}

#[async_trait]
impl AbsInvoiceRepo for InvoiceObjStoreRepo {
    async fn save(&self, order: &OrderModel) -> DefaultResult<String, AppError> {
        let body = serde_json::to_vec(order).map_err(|e| AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(e.to_string()),
        })?;
        let key = Self::object_key(order.id.as_str());
        self.objstore.upload(key.as_str(), body).await?;
        Ok(key)
    }
}
