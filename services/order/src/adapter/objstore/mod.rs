mod in_mem;
mod local_fs;

use std::boxed::Box;
use std::path::Path;
use std::result::Result as DefaultResult;

use async_trait::async_trait;

use shopping_common::config::{AppBasepathCfg, AppObjectStoreCfg};

use crate::error::AppError;

pub use in_mem::AppInMemObjStore;
pub use local_fs::AppLocalFsObjStore;

#[async_trait]
pub trait AbstObjectStore: Send + Sync {
    // overwrite the object if the key already exists
    async fn upload(&self, key: &str, body: Vec<u8>) -> DefaultResult<(), AppError>;
}

pub(crate) fn build_context(
    cfg: &AppObjectStoreCfg,
    basepath: &AppBasepathCfg,
) -> DefaultResult<Box<dyn AbstObjectStore>, AppError> {
    let obj: Box<dyn AbstObjectStore> = match cfg {
        AppObjectStoreCfg::InMemory => Box::new(AppInMemObjStore::default()),
        AppObjectStoreCfg::LocalFs { path } => {
            let fullpath = Path::new(&basepath.system).join(path);
            Box::new(AppLocalFsObjStore::try_build(fullpath)?)
        }
    };
    Ok(obj)
}
