use std::result::Result as DefaultResult;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{AppError, AppErrorCode};

const OUTCOME_COUNTER_NAME: &str = "shopping_order_outcome_total";
const OUTCOME_LABEL: &str = "outcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppMetricKind {
    OrderCreatedSuccess,
    OrderCreatedError,
    GetOrderSuccess,
    GetOrderError,
    ListOrdersSuccess,
    ListOrdersError,
}

impl AppMetricKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OrderCreatedSuccess => "OrderCreatedSuccess",
            Self::OrderCreatedError => "OrderCreatedError",
            Self::GetOrderSuccess => "GetOrderSuccess",
            Self::GetOrderError => "GetOrderError",
            Self::ListOrdersSuccess => "ListOrdersSuccess",
            Self::ListOrdersError => "ListOrdersError",
        }
    }
}

fn registry_error(e: prometheus::Error) -> AppError {
    AppError {
        code: AppErrorCode::MetricRegistryFailure,
        detail: Some(e.to_string()),
    }
}

/// Outcome counters of the order pipelines, kept in a private registry
/// so that each shared state (and each test) counts from zero.
pub struct AppMetrics {
    registry: Registry,
    outcome: IntCounterVec,
}

impl AppMetrics {
    pub fn new() -> DefaultResult<Self, AppError> {
        let registry = Registry::new();
        let opts = Opts::new(OUTCOME_COUNTER_NAME, "Outcomes of the order pipelines");
        let outcome = IntCounterVec::new(opts, &[OUTCOME_LABEL]).map_err(registry_error)?;
        registry
            .register(Box::new(outcome.clone()))
            .map_err(registry_error)?;
        Ok(Self { registry, outcome })
    }

    /// returns the value after increment
    pub fn increment(&self, kind: AppMetricKind) -> u64 {
        let counter = self.outcome.with_label_values(&[kind.label()]);
        counter.inc();
        counter.get()
    }

    pub fn get(&self, kind: AppMetricKind) -> u64 {
        self.outcome.with_label_values(&[kind.label()]).get()
    }

    // text exposition format, as scraped by a prometheus server
    pub fn export_text(&self) -> DefaultResult<String, AppError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(registry_error)?;
        String::from_utf8(buffer).map_err(|e| AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(e.to_string()),
        })
    }
}
