use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Mutex;

use async_trait::async_trait;

use shopping_common::error::AppErrorCode;

use super::AbstObjectStore;
use crate::error::AppError;

#[derive(Default)]
pub struct AppInMemObjStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl AppInMemObjStore {
    fn lock_err<T: ToString>(e: T) -> AppError {
        AppError {
            code: AppErrorCode::AcquireLockFailure,
            detail: Some(e.to_string()),
        }
    }
}

#[async_trait]
impl AbstObjectStore for AppInMemObjStore {
    async fn upload(&self, key: &str, body: Vec<u8>) -> DefaultResult<(), AppError> {
        if key.is_empty() {
            return Err(AppError {
                code: AppErrorCode::ObjectStoreFailure,
                detail: Some("empty-key".to_string()),
            });
        }
        let mut guard = self.objects.lock().map_err(Self::lock_err)?;
        let _old = guard.insert(key.to_string(), body);
        Ok(())
    }
}
