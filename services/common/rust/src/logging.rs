use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::stdout;
use std::path::Path;

use tracing::dispatcher::Dispatch;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::{AppBasepathCfg, AppLogHandlerCfg, AppLoggerCfg, AppLoggingCfg};
use crate::constant::logging::{Destination, Format, Level as AppLogLevelInner};
use crate::AppLogAlias;

pub type AppLogLevel = AppLogLevelInner;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

struct LogHandler {
    writer: NonBlocking,
    min_level: tracing::Level,
    format: Format,
}

/// Per-module event dispatchers of the service. Every event carries the
/// service name as field `service`, modules without a registered logger
/// write to the console fallback.
pub struct AppLogContext {
    service: String,
    loggers: HashMap<AppLogAlias, Dispatch>,
    fallback: Dispatch,
    // flushing stops once a guard is dropped
    _io_guards: Vec<WorkerGuard>,
}

// exported because binaries expand `app_log_event!` in their own crate
#[macro_export]
macro_rules! to_3rdparty_level {
    ($lvlin:expr) => {
        match $lvlin {
            $crate::logging::AppLogLevel::FATAL | $crate::logging::AppLogLevel::ERROR => {
                tracing::Level::ERROR
            }
            $crate::logging::AppLogLevel::WARNING => tracing::Level::WARN,
            $crate::logging::AppLogLevel::INFO => tracing::Level::INFO,
            $crate::logging::AppLogLevel::DEBUG => tracing::Level::DEBUG,
            $crate::logging::AppLogLevel::TRACE => tracing::Level::TRACE,
        }
    };
}

fn localfile_writer(sys_basepath: &str, rpath: &str) -> (NonBlocking, WorkerGuard) {
    let fullpath = Path::new(sys_basepath).join(rpath);
    let dir = fullpath.parent().unwrap_or_else(|| Path::new("."));
    let fname = fullpath
        .file_name()
        .unwrap_or_else(|| OsStr::new("shopping-order.log"));
    let appender = RollingFileAppender::new(Rotation::NEVER, dir, fname);
    tracing_appender::non_blocking(appender)
}

fn console_writer() -> (NonBlocking, WorkerGuard) {
    tracing_appender::non_blocking(stdout())
}

fn build_handler(basepath: &AppBasepathCfg, cfg: &AppLogHandlerCfg) -> (LogHandler, WorkerGuard) {
    let (writer, guard) = match (&cfg.destination, cfg.path.as_deref()) {
        (Destination::LOCALFS, Some(rpath)) => localfile_writer(&basepath.system, rpath),
        // the config loader rejects file handlers without path
        (Destination::LOCALFS, None) | (Destination::CONSOLE, _) => console_writer(),
    };
    let handler = LogHandler {
        writer,
        min_level: to_3rdparty_level!(&cfg.min_level),
        format: cfg.format.clone(),
    };
    (handler, guard)
}

fn build_layer(handler: &LogHandler, level: tracing::Level) -> BoxedLayer {
    let filter = LevelFilter::from_level(level);
    let base = FmtLayer::new()
        .with_writer(handler.writer.clone())
        .with_file(false)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_level(true);
    match handler.format {
        // one object per line, event fields at top level next to `message`
        Format::JSON => base
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_filter(filter)
            .boxed(),
        Format::PLAIN => base.with_filter(filter).boxed(),
    }
}

fn build_logger(cfg: &AppLoggerCfg, handlers: &HashMap<AppLogAlias, LogHandler>) -> Dispatch {
    let layers = cfg
        .handlers
        .iter()
        .filter_map(|alias| handlers.get(alias))
        .map(|h| {
            let lvl = cfg
                .level
                .as_ref()
                .map(|l| to_3rdparty_level!(l))
                .unwrap_or(h.min_level);
            build_layer(h, lvl)
        })
        .collect::<Vec<_>>();
    Dispatch::new(Registry::default().with(layers))
}

impl AppLogContext {
    pub fn new(basepath: &AppBasepathCfg, cfg: &AppLoggingCfg) -> Self {
        let mut guards = Vec::with_capacity(cfg.handlers.len() + 1);
        let mut handlers = HashMap::new();
        for item in cfg.handlers.iter() {
            let (h, g) = build_handler(basepath, item);
            guards.push(g);
            let _ = handlers.insert(item.alias.clone(), h);
        }
        let loggers = cfg
            .loggers
            .iter()
            .map(|item| (item.alias.clone(), build_logger(item, &handlers)))
            .collect::<HashMap<_, _>>();
        let (writer, guard) = console_writer();
        guards.push(guard);
        let console = LogHandler {
            writer,
            min_level: tracing::Level::INFO,
            format: Format::PLAIN,
        };
        let fallback = Dispatch::new(
            Registry::default().with(build_layer(&console, tracing::Level::INFO)),
        );
        Self {
            service: cfg.service_name.clone(),
            loggers,
            fallback,
            _io_guards: guards,
        }
    }

    pub fn service_name(&self) -> &str {
        self.service.as_str()
    }

    pub fn get_assigner(&self, key: &str) -> Option<&Dispatch> {
        self.loggers.get(&key.to_string())
    }

    /// dispatcher registered for the module path, or the console fallback
    /// with `false` as second item
    pub fn assigner_or_fallback(&self, key: &str) -> (&Dispatch, bool) {
        match self.get_assigner(key) {
            Some(d) => (d, true),
            None => (&self.fallback, false),
        }
    }
} // end of impl AppLogContext

/// Emit an event through the logger registered for the calling module.
/// Structured fields may precede the message, as in `tracing::event!`:
///
/// ```text
/// app_log_event!(logctx, AppLogLevel::INFO, order_id = %oid, "order saved");
/// ```
#[macro_export]
macro_rules! app_log_event {
    ( $ctx:ident, $lvl:expr, $($arg:tt)+ ) => {{
        const MOD_PATH: &str = module_path!();
        const LVL_INNER: tracing::Level = $crate::logging::to_3rdparty_level!($lvl);
        let (assigner, registered) = $ctx.assigner_or_fallback(MOD_PATH);
        let svc_name = $ctx.service_name();
        tracing::dispatcher::with_default(assigner, || {
            if !registered {
                tracing::event!(
                    tracing::Level::WARN,
                    service = svc_name,
                    module = MOD_PATH,
                    "no logger registered at the module path"
                );
            }
            tracing::event!(LVL_INNER, service = svc_name, $($arg)+);
        });
    }};
}

pub use app_log_event;
pub use to_3rdparty_level;
