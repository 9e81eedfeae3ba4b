mod base_client;
mod feature_flag;

use std::boxed::Box;
use std::result::Result;
use std::sync::Arc;

use shopping_common::config::AppFeatureFlagCfg;
use shopping_common::logging::AppLogContext;

use crate::error::AppError;

pub use feature_flag::{
    flag_extension_url, flag_resource_path, AbstFeatureFlagClient, FeatureFlagIdentity,
};
use feature_flag::AppFeatureFlagClient;

impl From<&AppFeatureFlagCfg> for FeatureFlagIdentity {
    fn from(value: &AppFeatureFlagCfg) -> Self {
        Self {
            application: value.application.clone(),
            environment: value.environment.clone(),
            configuration: value.configuration.clone(),
        }
    }
}

pub fn app_feature_flag_context(
    cfg: &AppFeatureFlagCfg,
    logctx: Arc<AppLogContext>,
) -> Result<Box<dyn AbstFeatureFlagClient>, AppError> {
    let identity = FeatureFlagIdentity::from(cfg);
    let obj = AppFeatureFlagClient::new(cfg.host.clone(), cfg.port, identity, logctx);
    Ok(Box::new(obj))
}
