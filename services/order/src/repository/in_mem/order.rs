use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;

use crate::constant::record_kind;
use crate::datastore::AbstInMemoryDStore;
use crate::error::AppError;
use crate::model::{OrderModel, StoreModel};

use super::super::AbsOrderRepo;

// orders and stores are kept in the same table
pub(crate) const TABLE_LABEL: &str = "shopping_orders";

pub struct OrderInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl OrderInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(TABLE_LABEL).await?;
        Ok(Self { datastore: m })
    }
}

#[async_trait]
impl AbsOrderRepo for OrderInMemRepo {
    async fn fetch(&self, oid: &str) -> DefaultResult<Option<OrderModel>, AppError> {
        let found = self.datastore.get(TABLE_LABEL, oid).await?;
        match found {
            Some(rec) if OrderModel::is_order_record(&rec) => {
                let obj = OrderModel::try_from_record(rec)?;
                Ok(Some(obj))
            }
            _others => Ok(None),
        }
    }

    async fn create(&self, order: &OrderModel) -> DefaultResult<(), AppError> {
        let rec = order.to_record()?;
        self.datastore.put(TABLE_LABEL, rec).await
    }

    async fn fetch_all(&self) -> DefaultResult<Vec<OrderModel>, AppError> {
        let rows = self.datastore.scan(TABLE_LABEL).await?;
        rows.into_iter()
            .filter(OrderModel::is_order_record)
            .map(OrderModel::try_from_record)
            .collect()
    }

    async fn fetch_stores(&self) -> DefaultResult<Vec<StoreModel>, AppError> {
        let rows = self
            .datastore
            .query_by_kind(TABLE_LABEL, record_kind::STORE)
            .await?;
        rows.into_iter().map(StoreModel::try_from_record).collect()
    }

    async fn seed_stores(&self, stores: Vec<StoreModel>) -> DefaultResult<usize, AppError> {
        let records = stores
            .iter()
            .map(StoreModel::to_record)
            .collect::<DefaultResult<Vec<_>, AppError>>()?;
        self.datastore.batch_write(TABLE_LABEL, records).await
    }
} // end of impl OrderInMemRepo
