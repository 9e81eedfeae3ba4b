use std::path::{Component, Path, PathBuf};
use std::result::Result as DefaultResult;

use async_trait::async_trait;

use shopping_common::error::AppErrorCode;

use super::AbstObjectStore;
use crate::error::AppError;

/// every object is a plain file directly under the base directory
pub struct AppLocalFsObjStore {
    basedir: PathBuf,
}

impl AppLocalFsObjStore {
    pub fn try_build<P: AsRef<Path>>(basedir: P) -> DefaultResult<Self, AppError> {
        let basedir = basedir.as_ref().to_path_buf();
        std::fs::create_dir_all(&basedir)?;
        Ok(Self { basedir })
    }

    fn _object_path(&self, key: &str) -> DefaultResult<PathBuf, AppError> {
        let mut comps = Path::new(key).components();
        // reject keys escaping the base directory
        match (comps.next(), comps.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.basedir.join(key)),
            _others => Err(AppError {
                code: AppErrorCode::ObjectStoreFailure,
                detail: Some(format!("invalid-key:{key}")),
            }),
        }
    }
}

#[async_trait]
impl AbstObjectStore for AppLocalFsObjStore {
    async fn upload(&self, key: &str, body: Vec<u8>) -> DefaultResult<(), AppError> {
        let path = self._object_path(key)?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}
