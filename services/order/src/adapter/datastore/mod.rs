mod in_mem;

use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use shopping_common::config::{AppConfig, AppDataStoreCfg};
use shopping_common::error::AppErrorCode;
use shopping_common::logging::{app_log_event, AppLogContext, AppLogLevel};

pub use in_mem::{AbstInMemoryDStore, AppInMemRecord, AppInMemoryDStore};

use crate::error::AppError;
use crate::objstore;
use crate::AppDataStoreContext;

pub(crate) fn build_context(
    logctx: Arc<AppLogContext>,
    cfg: &AppConfig,
) -> DefaultResult<AppDataStoreContext, AppError> {
    let mut in_mem = None;
    for c in cfg.api_server.data_store.iter() {
        match c {
            AppDataStoreCfg::InMemory(d) => {
                let item: Box<dyn AbstInMemoryDStore> = Box::new(AppInMemoryDStore::new(d));
                in_mem = Some(Arc::new(item));
            }
        }
    }
    if in_mem.is_none() {
        app_log_event!(logctx, AppLogLevel::ERROR, "no in-memory store configured");
        return Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("in-memory".to_string()),
        });
    }
    let obj_store = objstore::build_context(&cfg.api_server.object_store, &cfg.basepath)?;
    Ok(AppDataStoreContext {
        in_mem,
        obj_store: Arc::new(obj_store),
    })
}
