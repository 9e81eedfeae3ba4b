use std::boxed::Box;
use std::fmt::Display;
use std::result::Result as DefaultResult;
use std::vec::Vec;

use shopping_common::config::AppStoreSeedCfg;
use shopping_common::error::AppErrorCode;
use shopping_common::logging::{app_log_event, AppLogLevel};

use crate::api::web::dto::OrderCreateReqData;
use crate::error::AppError;
use crate::fault::maybe_fail;
use crate::model::{FeatureFlagSet, OrderModel, StoreModel};
use crate::repository::{AbsInvoiceRepo, AbsOrderRepo};
use crate::{AppMetricKind, AppSharedState};

#[derive(Debug)]
pub enum OrderUsKsErr {
    Validation(String),
    AdmissionBlocked,
    QuantityExceeded { quantity: u32, limit: u64 },
    StoreNotFound(String),
    SyntheticFault,
    Persistence(AppError),
    NotFound(String),
    ConfigurationFetch(AppError),
}

impl Display for OrderUsKsErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => f.write_str(msg),
            Self::AdmissionBlocked => {
                f.write_str("The creation of orders is currently on hold for maintenance")
            }
            Self::QuantityExceeded { quantity, limit } => write!(
                f,
                "The quantity of {} is above the limit of {}",
                quantity, limit
            ),
            Self::StoreNotFound(store_id) => write!(f, "{} is not found", store_id),
            Self::SyntheticFault => f.write_str("spurious error!!!"),
            Self::Persistence(e) => write!(f, "failed to persist the order, {}", e),
            Self::NotFound(oid) => write!(f, "order id {} is not found", oid),
            Self::ConfigurationFetch(e) => write!(f, "failed to fetch feature flags, {}", e),
        }
    }
}

pub struct CreateOrderUseCase {
    pub glb_state: AppSharedState,
    pub repo_order: Box<dyn AbsOrderRepo>,
    pub repo_invoice: Box<dyn AbsInvoiceRepo>,
}

pub struct GetOrderUseCase {
    pub glb_state: AppSharedState,
    pub repo_order: Box<dyn AbsOrderRepo>,
}

pub struct ListOrdersUseCase {
    pub glb_state: AppSharedState,
    pub repo_order: Box<dyn AbsOrderRepo>,
}

pub struct SeedStoresUseCase {
    pub glb_state: AppSharedState,
    pub repo_order: Box<dyn AbsOrderRepo>,
}

const PIPELINE_CREATE: &str = "create-order";
const PIPELINE_GET: &str = "get-order";
const PIPELINE_LIST: &str = "list-orders";

async fn fetch_flags(
    glb_state: &AppSharedState,
    pipeline: &'static str,
    names: &[String],
) -> DefaultResult<FeatureFlagSet, OrderUsKsErr> {
    let logctx_p = glb_state.log_context();
    let client = glb_state.feature_flag();
    let flags = client.fetch(names).await.map_err(|e| {
        app_log_event!(logctx_p, AppLogLevel::ERROR, pipeline, "flag-fetch-fail: {}", e);
        OrderUsKsErr::ConfigurationFetch(e)
    })?;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, pipeline, flags = ?flags, "flags fetched");
    for n in names.iter().filter(|n| flags.get(n.as_str()).is_none()) {
        app_log_event!(logctx_p, AppLogLevel::WARNING, pipeline, flag = %n, "flag-missing");
    }
    Ok(flags)
}

// the ceiling carried by an enabled flag, `None` if the flag is off
fn enabled_flag_limit(
    flags: &FeatureFlagSet,
    name: &str,
) -> DefaultResult<Option<u64>, OrderUsKsErr> {
    match flags.get(name) {
        Some(f) if f.enabled => f.limit().map(Some).ok_or_else(|| {
            OrderUsKsErr::ConfigurationFetch(AppError {
                code: AppErrorCode::InvalidFeatureFlagCfg,
                detail: Some(format!("flag-missing-limit: {name}")),
            })
        }),
        _others => Ok(None),
    }
}

fn inject_fault(
    glb_state: &AppSharedState,
    pipeline: &'static str,
) -> DefaultResult<(), OrderUsKsErr> {
    let switch = glb_state.config().api_server.random_errors_enabled.as_str();
    let strategy = glb_state.fault_strategy();
    maybe_fail(Some(switch), &**strategy).map_err(|e| {
        let logctx_p = glb_state.log_context();
        app_log_event!(logctx_p, AppLogLevel::WARNING, pipeline, "{}", e);
        OrderUsKsErr::SyntheticFault
    })
}

fn record_outcome<T>(
    glb_state: &AppSharedState,
    pipeline: &'static str,
    result: &DefaultResult<T, OrderUsKsErr>,
    succeed: AppMetricKind,
    failed: AppMetricKind,
) {
    let logctx_p = glb_state.log_context();
    let kind = match result {
        Ok(_) => succeed,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, pipeline, "{}", e);
            failed
        }
    };
    let value = glb_state.metrics().increment(kind);
    app_log_event!(
        logctx_p,
        AppLogLevel::INFO,
        pipeline,
        metric = kind.label(),
        value,
        "metric recorded"
    );
}

impl CreateOrderUseCase {
    pub async fn execute(self, raw_body: &str) -> DefaultResult<OrderModel, OrderUsKsErr> {
        let result = self._execute(raw_body).await;
        record_outcome(
            &self.glb_state,
            PIPELINE_CREATE,
            &result,
            AppMetricKind::OrderCreatedSuccess,
            AppMetricKind::OrderCreatedError,
        );
        result
    }

    async fn _execute(&self, raw_body: &str) -> DefaultResult<OrderModel, OrderUsKsErr> {
        let logctx_p = self.glb_state.log_context();
        app_log_event!(logctx_p, AppLogLevel::DEBUG, pipeline = PIPELINE_CREATE, "start");
        if raw_body.trim().is_empty() {
            return Err(OrderUsKsErr::Validation("no order supplied".to_string()));
        }
        let flag_names = &self.glb_state.config().api_server.feature_flag.names;
        let names = [
            flag_names.prevent_create_order.clone(),
            flag_names.check_create_order_quantity.clone(),
        ];
        let flags = fetch_flags(&self.glb_state, PIPELINE_CREATE, &names).await?;
        if flags.is_enabled(flag_names.prevent_create_order.as_str()) {
            return Err(OrderUsKsErr::AdmissionBlocked);
        }
        inject_fault(&self.glb_state, PIPELINE_CREATE)?;
        let req = OrderCreateReqData::parse(raw_body)
            .map_err(|e| OrderUsKsErr::Validation(format!("invalid order, {}", e)))?;
        let order = OrderModel::from(req);
        let qty_limit =
            enabled_flag_limit(&flags, flag_names.check_create_order_quantity.as_str())?;
        if let Some(limit) = qty_limit {
            if order.quantity as u64 >= limit {
                return Err(OrderUsKsErr::QuantityExceeded {
                    quantity: order.quantity,
                    limit,
                });
            }
        }
        let stores = self
            .repo_order
            .fetch_stores()
            .await
            .map_err(OrderUsKsErr::Persistence)?;
        if !stores.iter().any(|s| s.id == order.store_id) {
            return Err(OrderUsKsErr::StoreNotFound(order.store_id));
        }
        self.repo_order
            .create(&order)
            .await
            .map_err(OrderUsKsErr::Persistence)?;
        app_log_event!(
            logctx_p,
            AppLogLevel::INFO,
            pipeline = PIPELINE_CREATE,
            order_id = %order.id,
            store_id = %order.store_id,
            quantity = order.quantity,
            "order saved"
        );
        // the order remains even if the invoice is not written
        let key = self
            .repo_invoice
            .save(&order)
            .await
            .map_err(OrderUsKsErr::Persistence)?;
        app_log_event!(
            logctx_p,
            AppLogLevel::INFO,
            pipeline = PIPELINE_CREATE,
            order_id = %order.id,
            invoice_key = %key,
            "invoice saved"
        );
        Ok(order)
    } // end of fn _execute
} // end of impl CreateOrderUseCase

impl GetOrderUseCase {
    pub async fn execute(self, oid: &str) -> DefaultResult<OrderModel, OrderUsKsErr> {
        let result = self._execute(oid).await;
        record_outcome(
            &self.glb_state,
            PIPELINE_GET,
            &result,
            AppMetricKind::GetOrderSuccess,
            AppMetricKind::GetOrderError,
        );
        result
    }

    async fn _execute(&self, oid: &str) -> DefaultResult<OrderModel, OrderUsKsErr> {
        let logctx_p = self.glb_state.log_context();
        app_log_event!(
            logctx_p,
            AppLogLevel::DEBUG,
            pipeline = PIPELINE_GET,
            order_id = oid,
            "start"
        );
        let _flags = fetch_flags(&self.glb_state, PIPELINE_GET, &[]).await?;
        inject_fault(&self.glb_state, PIPELINE_GET)?;
        self.repo_order
            .fetch(oid)
            .await
            .map_err(OrderUsKsErr::Persistence)?
            .ok_or_else(|| OrderUsKsErr::NotFound(oid.to_string()))
    }
}

impl ListOrdersUseCase {
    pub async fn execute(self) -> DefaultResult<Vec<OrderModel>, OrderUsKsErr> {
        let result = self._execute().await;
        record_outcome(
            &self.glb_state,
            PIPELINE_LIST,
            &result,
            AppMetricKind::ListOrdersSuccess,
            AppMetricKind::ListOrdersError,
        );
        result
    }

    async fn _execute(&self) -> DefaultResult<Vec<OrderModel>, OrderUsKsErr> {
        let logctx_p = self.glb_state.log_context();
        app_log_event!(logctx_p, AppLogLevel::DEBUG, pipeline = PIPELINE_LIST, "start");
        let limit_flag = self
            .glb_state
            .config()
            .api_server
            .feature_flag
            .names
            .limit_list_orders
            .clone();
        let flags = fetch_flags(&self.glb_state, PIPELINE_LIST, &[limit_flag.clone()]).await?;
        inject_fault(&self.glb_state, PIPELINE_LIST)?;
        let mut orders = self
            .repo_order
            .fetch_all()
            .await
            .map_err(OrderUsKsErr::Persistence)?;
        if let Some(limit) = enabled_flag_limit(&flags, limit_flag.as_str())? {
            app_log_event!(
                logctx_p,
                AppLogLevel::DEBUG,
                pipeline = PIPELINE_LIST,
                limit,
                num_found = orders.len(),
                "results truncated"
            );
            orders.truncate(limit as usize);
        }
        Ok(orders)
    }
}

impl SeedStoresUseCase {
    pub async fn execute(self, seeds: Vec<AppStoreSeedCfg>) -> DefaultResult<usize, AppError> {
        let logctx_p = self.glb_state.log_context();
        if seeds.is_empty() {
            app_log_event!(logctx_p, AppLogLevel::WARNING, "no store to seed");
            return Ok(0);
        }
        let stores = seeds.into_iter().map(StoreModel::from).collect::<Vec<_>>();
        let num = self.repo_order.seed_stores(stores).await.map_err(|e| {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "seed-stores-fail: {}", e);
            e
        })?;
        app_log_event!(logctx_p, AppLogLevel::INFO, "stores seeded: {}", num);
        Ok(num)
    }
}
