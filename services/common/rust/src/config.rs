use std::collections::hash_map::RandomState;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::result::Result as DefaultResult;

use serde::de::{Error as DeserializeError, Unexpected};
use serde::{Deserialize, Deserializer};

use crate::constant::{env_vars, feature_flag as const_flag, logging as const_log};
use crate::error::{AppCfgError, AppErrorCode};
use crate::{AppLogAlias, WebApiPath};

fn cfg_error(code: AppErrorCode, detail: Option<String>) -> AppCfgError {
    AppCfgError { code, detail }
}

#[derive(Deserialize)]
pub struct AppLogHandlerCfg {
    pub min_level: const_log::Level,
    pub destination: const_log::Destination,
    #[serde(default)]
    pub format: const_log::Format,
    pub alias: AppLogAlias,
    pub path: Option<String>,
}

#[derive(Deserialize)]
pub struct AppLoggerCfg {
    pub alias: AppLogAlias,
    pub handlers: Vec<String>,
    pub level: Option<const_log::Level>,
}

#[derive(Deserialize)]
pub struct AppLoggingCfg {
    #[serde(
        default = "default_log_service_name",
        deserialize_with = "jsn_deny_empty_string"
    )]
    pub service_name: String,
    pub handlers: Vec<AppLogHandlerCfg>,
    pub loggers: Vec<AppLoggerCfg>,
}

impl AppLoggingCfg {
    fn validate(&self) -> DefaultResult<(), AppCfgError> {
        if self.handlers.is_empty() {
            return Err(cfg_error(AppErrorCode::NoLogHandlerCfg, None));
        }
        if self.loggers.is_empty() {
            return Err(cfg_error(AppErrorCode::NoLoggerCfg, None));
        }
        if let Some(lg) = self.loggers.iter().find(|l| l.handlers.is_empty()) {
            let msg = format!("the logger does not have handler: {}", lg.alias);
            return Err(cfg_error(AppErrorCode::NoHandlerInLoggerCfg, Some(msg)));
        }
        if self.handlers.iter().any(|h| h.alias.is_empty()) {
            return Err(cfg_error(AppErrorCode::MissingAliasLogHdlerCfg, None));
        }
        if self.loggers.iter().any(|l| l.alias.is_empty()) {
            return Err(cfg_error(AppErrorCode::MissingAliasLoggerCfg, None));
        }
        let file_without_path = self.handlers.iter().find(|h| {
            matches!(h.destination, const_log::Destination::LOCALFS) && h.path.is_none()
        });
        if let Some(h) = file_without_path {
            let msg = format!("file-type handler does not contain path: {}", h.alias);
            return Err(cfg_error(AppErrorCode::InvalidHandlerLoggerCfg, Some(msg)));
        }
        let known: HashSet<&str> = self.handlers.iter().map(|h| h.alias.as_str()).collect();
        let dangling = self
            .loggers
            .iter()
            .find(|l| l.handlers.iter().any(|a| !known.contains(a.as_str())));
        match dangling {
            Some(lg) => {
                let msg = format!("the logger contains invalid handler alias: {}", lg.alias);
                Err(cfg_error(AppErrorCode::InvalidHandlerLoggerCfg, Some(msg)))
            }
            None => Ok(()),
        }
    }
} // end of impl AppLoggingCfg

#[derive(Deserialize)]
pub struct WebApiRouteCfg {
    pub path: WebApiPath,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub handler: String,
}

/// response headers shared by all the endpoints, browser clients
/// are served from a different origin
#[derive(Deserialize)]
pub struct WebApiCorsCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub allowed_origin: String,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub preflight_max_age: u64,
}

#[derive(Deserialize)]
pub struct WebApiListenCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub api_version: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub cors: WebApiCorsCfg,
    pub routes: Vec<WebApiRouteCfg>,
}

impl WebApiListenCfg {
    fn validate(&self) -> DefaultResult<(), AppCfgError> {
        if self.routes.is_empty() {
            return Err(cfg_error(AppErrorCode::NoRouteApiServerCfg, None));
        }
        // the version becomes the path prefix of every route, e.g. `/1.0.4`
        if self.api_version.split('.').any(|n| n.parse::<u16>().is_err()) {
            let msg = format!("version must be numeric: {}", self.api_version);
            return Err(cfg_error(AppErrorCode::InvalidVersion, Some(msg)));
        }
        let bad_route = self
            .routes
            .iter()
            .find(|r| r.path.is_empty() || !r.path.starts_with('/'));
        if let Some(r) = bad_route {
            let msg = format!("path:{}, handler:{}", r.path, r.handler);
            return Err(cfg_error(AppErrorCode::InvalidRouteConfig, Some(msg)));
        }
        if self.cors.allowed_methods.is_empty() {
            let msg = "cors-allowed-methods".to_string();
            return Err(cfg_error(AppErrorCode::InvalidCorsConfig, Some(msg)));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct AppInMemoryDbCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub alias: String,
    pub max_items: u32,
}

#[derive(Deserialize)]
#[serde(tag = "_type")]
pub enum AppDataStoreCfg {
    InMemory(AppInMemoryDbCfg),
}

#[derive(Deserialize, Debug)]
#[serde(tag = "_type")]
pub enum AppObjectStoreCfg {
    InMemory,
    LocalFs {
        // relative to system base path
        #[serde(deserialize_with = "jsn_deny_empty_string")]
        path: String,
    },
}

/// map each role in the order pipelines to the flag name
/// registered in remote configuration service
#[derive(Deserialize, Debug, Clone)]
pub struct AppFeatureFlagNamesCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub prevent_create_order: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub check_create_order_quantity: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub limit_list_orders: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub create_order_allow_list: String,
}

impl AppFeatureFlagNamesCfg {
    pub fn all(&self) -> [&str; 4] {
        [
            self.prevent_create_order.as_str(),
            self.check_create_order_quantity.as_str(),
            self.limit_list_orders.as_str(),
            self.create_order_allow_list.as_str(),
        ]
    }
}

#[derive(Deserialize, Debug)]
pub struct AppFeatureFlagCfg {
    // the flag extension runs next to the service
    #[serde(
        default = "default_flag_host",
        deserialize_with = "jsn_deny_empty_string"
    )]
    pub host: String,
    #[serde(default = "default_flag_port")]
    pub port: u16,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub application: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub environment: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub configuration: String,
    pub names: AppFeatureFlagNamesCfg,
}

impl AppFeatureFlagCfg {
    fn validate(&self) -> DefaultResult<(), AppCfgError> {
        if self.port == 0 {
            let msg = "port".to_string();
            return Err(cfg_error(AppErrorCode::InvalidFeatureFlagCfg, Some(msg)));
        }
        let names = self.names.all();
        let distinct: HashSet<&str> = names.iter().copied().collect();
        if distinct.len() < names.len() {
            let msg = "duplicate-flag-name".to_string();
            return Err(cfg_error(AppErrorCode::InvalidFeatureFlagCfg, Some(msg)));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreSeedCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub id: String,
    pub store_code: String,
    pub store_name: String,
}

#[derive(Deserialize)]
pub struct ApiServerCfg {
    pub logging: AppLoggingCfg,
    pub listen: WebApiListenCfg,
    pub limit_req_body_in_bytes: usize,
    pub num_workers: u8,
    pub stack_sz_kb: u16,
    pub data_store: Vec<AppDataStoreCfg>,
    pub object_store: AppObjectStoreCfg,
    pub feature_flag: AppFeatureFlagCfg,
    #[serde(default = "default_random_errors_switch")]
    pub random_errors_enabled: String,
    #[serde(default)]
    pub seed_stores: Vec<AppStoreSeedCfg>,
}

impl ApiServerCfg {
    fn validate(&self, limit: &AppCfgHardLimit) -> DefaultResult<(), AppCfgError> {
        self.listen.validate()?;
        self.logging.validate()?;
        if self.data_store.is_empty() {
            return Err(cfg_error(AppErrorCode::NoDatabaseCfg, None));
        }
        let max_allowed = limit.nitems_per_inmem_table;
        for item in self.data_store.iter() {
            let AppDataStoreCfg::InMemory(c) = item;
            if c.max_items > max_allowed {
                let msg = format!("table:{}, limit:{}", c.alias, max_allowed);
                return Err(cfg_error(AppErrorCode::ExceedingMaxLimit, Some(msg)));
            }
        }
        self.feature_flag.validate()
    }
}

pub struct AppBasepathCfg {
    pub system: String,
    pub service: String,
}

pub struct AppConfig {
    pub basepath: AppBasepathCfg,
    pub api_server: ApiServerCfg,
}

pub struct AppCfgHardLimit {
    pub nitems_per_inmem_table: u32,
}

pub struct AppCfgInitArgs {
    pub env_var_map: HashMap<String, String, RandomState>,
    pub limit: AppCfgHardLimit,
}

fn default_random_errors_switch() -> String {
    "false".to_string()
}
fn default_flag_host() -> String {
    const_flag::DEFAULT_HOST.to_string()
}
fn default_flag_port() -> u16 {
    const_flag::DEFAULT_PORT
}
fn default_log_service_name() -> String {
    const_log::DEFAULT_SERVICE_NAME.to_string()
}

impl AppConfig {
    /// Build the process configuration from environment variables, the file
    /// `CONFIG_FILE_PATH` is resolved against `SERVICE_BASE_PATH`.
    pub fn new(args: AppCfgInitArgs) -> DefaultResult<Self, AppCfgError> {
        let (mut env_vars_map, limit) = (args.env_var_map, args.limit);
        let mut take = |label: &str, code: AppErrorCode| {
            env_vars_map
                .remove(label)
                .ok_or_else(|| cfg_error(code, Some(label.to_string())))
        };
        let system = take(env_vars::SYS_BASEPATH, AppErrorCode::MissingSysBasePath)?;
        let service = take(env_vars::SERVICE_BASEPATH, AppErrorCode::MissingAppBasePath)?;
        let cfg_relpath = take(env_vars::CFG_FILEPATH, AppErrorCode::MissingConfigPath)?;
        let fault_switch = env_vars_map.remove(env_vars::RANDOM_ERRORS_ENABLED);

        let cfg_fullpath = Path::new(&service).join(cfg_relpath);
        let mut api_server = Self::parse_from_file(cfg_fullpath.to_string_lossy(), limit)?;
        if let Some(switch) = fault_switch {
            api_server.random_errors_enabled = switch;
        }
        Ok(Self {
            api_server,
            basepath: AppBasepathCfg { system, service },
        })
    }

    pub fn parse_from_file<P: AsRef<str>>(
        filepath: P,
        limit: AppCfgHardLimit,
    ) -> DefaultResult<ApiServerCfg, AppCfgError> {
        let fileobj = File::open(filepath.as_ref())
            .map_err(|e| cfg_error(AppErrorCode::IOerror(e.kind()), Some(e.to_string())))?;
        let reader = BufReader::new(fileobj);
        let parsed = serde_json::from_reader::<_, ApiServerCfg>(reader)
            .map_err(|e| cfg_error(AppErrorCode::InvalidJsonFormat, Some(e.to_string())))?;
        parsed.validate(&limit)?;
        Ok(parsed)
    }
} // end of impl AppConfig

fn jsn_deny_empty_string<'de, D>(raw: D) -> DefaultResult<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(raw)?;
    if s.is_empty() {
        Err(D::Error::invalid_value(
            Unexpected::Str(""),
            &"a non-empty string",
        ))
    } else {
        Ok(s)
    }
}
