use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;
use std::vec::Vec;

use async_trait::async_trait;

use shopping_common::error::AppErrorCode;

use crate::error::AppError;
use crate::model::{OrderModel, StoreModel};
use crate::AppDataStoreContext;

mod in_mem;
mod invoice;

pub use in_mem::order::OrderInMemRepo;
pub use invoice::InvoiceObjStoreRepo;

// the repository instance may be used across an await,
// the future created by app callers has to be able to pass to different threads
// , it is the reason to add `Send` and `Sync` as super-traits
#[async_trait]
pub trait AbsOrderRepo: Sync + Send {
    // `None` if the identifier does not refer to an order record
    async fn fetch(&self, oid: &str) -> DefaultResult<Option<OrderModel>, AppError>;
    async fn create(&self, order: &OrderModel) -> DefaultResult<(), AppError>;
    // all orders in scan order of the underlying table
    async fn fetch_all(&self) -> DefaultResult<Vec<OrderModel>, AppError>;
    async fn fetch_stores(&self) -> DefaultResult<Vec<StoreModel>, AppError>;
    async fn seed_stores(&self, stores: Vec<StoreModel>) -> DefaultResult<usize, AppError>;
}

#[async_trait]
pub trait AbsInvoiceRepo: Sync + Send {
    // return key of the saved invoice object
    async fn save(&self, order: &OrderModel) -> DefaultResult<String, AppError>;
}

pub async fn app_repo_order(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsOrderRepo>, AppError> {
    if let Some(m) = ds.in_mem.as_ref() {
        let obj = OrderInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknwon-type".to_string()),
        })
    }
}

pub fn app_repo_invoice(ds: Arc<AppDataStoreContext>) -> Box<dyn AbsInvoiceRepo> {
    let obj = InvoiceObjStoreRepo::new(ds.obj_store.clone());
    Box::new(obj)
}
