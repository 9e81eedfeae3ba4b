use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map as JsnMap, Value as JsnVal};

use shopping_common::config::AppInMemoryDbCfg;
use shopping_common::error::AppErrorCode;

use crate::error::AppError;

// simple implementation of in-memory data storage

// each record is a flat JSON object, callers are responsible to keep
// the attributes `id` and `type` in every record
pub type AppInMemRecord = JsnMap<String, JsnVal>;

#[derive(Default)]
struct InnerTable {
    rows: HashMap<String, AppInMemRecord>,
    // insertion order, used as scan order
    seq: Vec<String>,
}
type AllTable = HashMap<String, InnerTable>;

#[async_trait]
pub trait AbstInMemoryDStore: Send + Sync {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError>;
    async fn get(&self, table: &str, id: &str) -> DefaultResult<Option<AppInMemRecord>, AppError>;
    // replace the whole record if the identifier exists
    async fn put(&self, table: &str, record: AppInMemRecord) -> DefaultResult<(), AppError>;
    async fn batch_write(
        &self,
        table: &str,
        records: Vec<AppInMemRecord>,
    ) -> DefaultResult<usize, AppError>;
    async fn scan(&self, table: &str) -> DefaultResult<Vec<AppInMemRecord>, AppError>;
    async fn query_by_kind(
        &self,
        table: &str,
        kind: &str,
    ) -> DefaultResult<Vec<AppInMemRecord>, AppError>;
}

pub struct AppInMemoryDStore {
    max_items_per_table: u32,
    table_map: Mutex<AllTable>,
}

fn record_id(rec: &AppInMemRecord) -> DefaultResult<String, AppError> {
    match rec.get("id") {
        Some(JsnVal::String(s)) if !s.is_empty() => Ok(s.clone()),
        _others => Err(AppError {
            code: AppErrorCode::InvalidInput,
            detail: Some("record-missing-id".to_string()),
        }),
    }
}

impl AppInMemoryDStore {
    pub fn new(cfg: &AppInMemoryDbCfg) -> Self {
        Self {
            table_map: Mutex::new(HashMap::new()),
            max_items_per_table: cfg.max_items,
        }
    }

    fn try_get_table(&self) -> DefaultResult<MutexGuard<AllTable>, AppError> {
        self.table_map.lock().map_err(|e| AppError {
            detail: Some(e.to_string()),
            code: AppErrorCode::AcquireLockFailure,
        })
    }

    fn _get_table_mut<'a>(
        _map: &'a mut AllTable,
        label: &str,
    ) -> DefaultResult<&'a mut InnerTable, AppError> {
        _map.get_mut(label).ok_or(AppError {
            detail: Some(label.to_string()),
            code: AppErrorCode::DataTableNotExist,
        })
    }

    fn _check_capacity(&self, label: &str, num_new: usize) -> DefaultResult<(), AppError> {
        let limit = self.max_items_per_table as usize;
        if num_new > limit {
            let msg = format!("table:{}, limit:{}, actual:{}", label, limit, num_new);
            Err(AppError {
                detail: Some(msg),
                code: AppErrorCode::ExceedingMaxLimit,
            })
        } else {
            Ok(())
        }
    }

    fn _write_rows(
        &self,
        label: &str,
        rows: Vec<(String, AppInMemRecord)>,
    ) -> DefaultResult<usize, AppError> {
        let mut guard = self.try_get_table()?;
        let table = Self::_get_table_mut(&mut guard, label)?;
        let num_new = rows
            .iter()
            .filter(|(id, _)| !table.rows.contains_key(id.as_str()))
            .count();
        self._check_capacity(label, table.rows.len() + num_new)?;
        let tot_cnt = rows.len();
        for (id, row) in rows {
            if table.rows.insert(id.clone(), row).is_none() {
                table.seq.push(id);
            }
        }
        Ok(tot_cnt)
    }

    fn _collect_rows<F>(&self, label: &str, filter: F) -> DefaultResult<Vec<AppInMemRecord>, AppError>
    where
        F: Fn(&AppInMemRecord) -> bool,
    {
        let mut guard = self.try_get_table()?;
        let table = Self::_get_table_mut(&mut guard, label)?;
        let out = table
            .seq
            .iter()
            .filter_map(|id| table.rows.get(id))
            .filter(|row| filter(row))
            .cloned()
            .collect::<Vec<_>>();
        Ok(out)
    }
} // end of impl AppInMemoryDStore

#[async_trait]
impl AbstInMemoryDStore for AppInMemoryDStore {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError> {
        let mut guard = self.try_get_table()?;
        if !guard.contains_key(label) {
            guard.insert(label.to_string(), InnerTable::default());
        }
        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> DefaultResult<Option<AppInMemRecord>, AppError> {
        let mut guard = self.try_get_table()?;
        let t = Self::_get_table_mut(&mut guard, table)?;
        Ok(t.rows.get(id).cloned())
    }

    async fn put(&self, table: &str, record: AppInMemRecord) -> DefaultResult<(), AppError> {
        let id = record_id(&record)?;
        let _num = self._write_rows(table, vec![(id, record)])?;
        Ok(())
    }

    async fn batch_write(
        &self,
        table: &str,
        records: Vec<AppInMemRecord>,
    ) -> DefaultResult<usize, AppError> {
        // reject the whole batch if any of the records is invalid
        let mut rows = Vec::with_capacity(records.len());
        for rec in records {
            rows.push((record_id(&rec)?, rec));
        }
        self._write_rows(table, rows)
    }

    async fn scan(&self, table: &str) -> DefaultResult<Vec<AppInMemRecord>, AppError> {
        self._collect_rows(table, |_| true)
    }

    async fn query_by_kind(
        &self,
        table: &str,
        kind: &str,
    ) -> DefaultResult<Vec<AppInMemRecord>, AppError> {
        self._collect_rows(table, |row| {
            row.get("type").and_then(JsnVal::as_str) == Some(kind)
        })
    }
} // end of impl AbstInMemoryDStore
