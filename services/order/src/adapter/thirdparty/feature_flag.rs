use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;

use shopping_common::error::AppErrorCode;
use shopping_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::base_client::FlagExtensionConn;
use crate::error::AppError;
use crate::model::FeatureFlagSet;

/// address of a flag configuration profile in remote configuration service
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFlagIdentity {
    pub application: String,
    pub environment: String,
    pub configuration: String,
}

#[async_trait]
pub trait AbstFeatureFlagClient: Send + Sync {
    // fetch flags of the given names, empty list means all the flags
    // in the configuration profile. Every call hits the remote service,
    // nothing is cached between calls.
    async fn fetch(&self, names: &[String]) -> Result<FeatureFlagSet, AppError>;
}

pub(super) struct AppFeatureFlagClient {
    _host: String,
    _port: u16,
    _identity: FeatureFlagIdentity,
    _logctx: Arc<AppLogContext>,
}

pub fn flag_resource_path(identity: &FeatureFlagIdentity, names: &[String]) -> String {
    let mut out = format!(
        "/applications/{}/environments/{}/configurations/{}",
        identity.application, identity.environment, identity.configuration
    );
    for (idx, name) in names.iter().enumerate() {
        let sep = if idx == 0 { '?' } else { '&' };
        out.push(sep);
        out.push_str("flag=");
        out.push_str(name);
    }
    out
}

pub fn flag_extension_url(
    host: &str,
    port: u16,
    identity: &FeatureFlagIdentity,
    names: &[String],
) -> String {
    let path = flag_resource_path(identity, names);
    format!("http://{host}:{port}{path}")
}

#[async_trait]
impl AbstFeatureFlagClient for AppFeatureFlagClient {
    async fn fetch(&self, names: &[String]) -> Result<FeatureFlagSet, AppError> {
        let logctx_p = &self._logctx;
        let resource_path = flag_resource_path(&self._identity, names);
        let conn =
            FlagExtensionConn::connect(self._host.as_str(), self._port, self._logctx.clone())
                .await?;
        let (status, rawbody) = conn.get_json(resource_path.as_str()).await?;
        if !status.is_success() {
            let detail = format!(
                "host: {}:{}, path:{}, status:{}",
                self._host.as_str(),
                self._port,
                resource_path.as_str(),
                status.as_u16()
            );
            app_log_event!(logctx_p, AppLogLevel::WARNING, "{}", &detail);
            return Err(AppError {
                code: AppErrorCode::HttpHandshakeFailure,
                detail: Some(detail),
            });
        }
        serde_json::from_slice::<FeatureFlagSet>(&rawbody).map_err(|e| {
            let detail = e.to_string();
            app_log_event!(
                logctx_p,
                AppLogLevel::ERROR,
                path = %resource_path,
                "corrupted flag set: {}",
                &detail
            );
            AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(detail),
            }
        })
    } // end of fn fetch
} // end of impl AppFeatureFlagClient

impl AppFeatureFlagClient {
    pub(super) fn new(
        host: String,
        port: u16,
        identity: FeatureFlagIdentity,
        logctx: Arc<AppLogContext>,
    ) -> Self {
        Self {
            _host: host,
            _port: port,
            _identity: identity,
            _logctx: logctx,
        }
    }
}
