use std::result::Result as DefaultResult;
use std::sync::Arc;

pub mod api;
pub mod constant;
pub mod error;
pub mod fault;
pub mod model;
pub mod network;
pub mod repository;
pub mod usecase;

mod adapter;
pub use adapter::{datastore, objstore, thirdparty};

mod metrics;
pub use metrics::{AppMetricKind, AppMetrics};

pub use shopping_common::config::{
    ApiServerCfg, AppBasepathCfg, AppCfgHardLimit, AppCfgInitArgs, AppConfig,
    AppFeatureFlagCfg, AppFeatureFlagNamesCfg, AppInMemoryDbCfg, AppLoggingCfg,
    AppObjectStoreCfg, AppStoreSeedCfg, WebApiCorsCfg, WebApiListenCfg, WebApiRouteCfg,
};
pub use shopping_common::logging;

use error::AppError;
use fault::{AbstFaultStrategy, RandomFaultStrategy};
use logging::AppLogContext;
use thirdparty::AbstFeatureFlagClient;

type WebApiHdlrLabel = &'static str;

pub struct AppDataStoreContext {
    pub in_mem: Option<Arc<Box<dyn datastore::AbstInMemoryDStore>>>,
    pub obj_store: Arc<Box<dyn objstore::AbstObjectStore>>,
}

// global state shared by all threads, every field is read-only or
// internally synchronized, the pipelines never keep per-request data here
pub struct AppSharedState {
    _cfg: Arc<AppConfig>,
    _log: Arc<AppLogContext>,
    dstore: Arc<AppDataStoreContext>,
    _flags: Arc<Box<dyn AbstFeatureFlagClient>>,
    _fault: Arc<Box<dyn AbstFaultStrategy>>,
    _metrics: Arc<AppMetrics>,
}

impl AppSharedState {
    pub fn new(cfg: AppConfig, log: AppLogContext) -> DefaultResult<Self, AppError> {
        let log = Arc::new(log);
        let flags = thirdparty::app_feature_flag_context(&cfg.api_server.feature_flag, log.clone())?;
        let fault: Box<dyn AbstFaultStrategy> = Box::<RandomFaultStrategy>::default();
        Self::with_collaborators(cfg, log, flags, fault)
    }

    /// build the shared state with externally constructed flag client
    /// and fault strategy, data stores are still built from the config
    pub fn with_collaborators(
        cfg: AppConfig,
        log: Arc<AppLogContext>,
        flags: Box<dyn AbstFeatureFlagClient>,
        fault: Box<dyn AbstFaultStrategy>,
    ) -> DefaultResult<Self, AppError> {
        let ds_ctx = datastore::build_context(log.clone(), &cfg)?;
        let metrics = AppMetrics::new()?;
        Ok(Self {
            _cfg: Arc::new(cfg),
            _log: log,
            dstore: Arc::new(ds_ctx),
            _flags: Arc::new(flags),
            _fault: Arc::new(fault),
            _metrics: Arc::new(metrics),
        })
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self._cfg
    }

    pub fn log_context(&self) -> &Arc<AppLogContext> {
        &self._log
    }

    pub fn datastore(&self) -> Arc<AppDataStoreContext> {
        self.dstore.clone()
    }

    pub fn feature_flag(&self) -> Arc<Box<dyn AbstFeatureFlagClient>> {
        self._flags.clone()
    }

    pub fn fault_strategy(&self) -> Arc<Box<dyn AbstFaultStrategy>> {
        self._fault.clone()
    }

    pub fn metrics(&self) -> Arc<AppMetrics> {
        self._metrics.clone()
    }
} // end of impl AppSharedState

impl Clone for AppSharedState {
    fn clone(&self) -> Self {
        Self {
            _cfg: self._cfg.clone(),
            _log: self._log.clone(),
            dstore: self.dstore.clone(),
            _flags: self._flags.clone(),
            _fault: self._fault.clone(),
            _metrics: self._metrics.clone(),
        }
    }
}
