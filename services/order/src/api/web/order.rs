use axum::debug_handler;
use axum::extract::{Path as ExtractPath, State as ExtractState};
use axum::http::{
    header as HttpHeader, HeaderMap as HttpHeaderMap, HeaderValue as HttpHeaderValue,
    StatusCode as HttpStatusCode,
};
use axum::response::IntoResponse;
use serde::Serialize;

use shopping_common::logging::{app_log_event, AppLogLevel};

use crate::api::web::dto::{ErrorRespDto, OrderDto};
use crate::constant as AppConst;
use crate::repository::{app_repo_invoice, app_repo_order};
use crate::usecase::{CreateOrderUseCase, GetOrderUseCase, ListOrdersUseCase, OrderUsKsErr};
use crate::AppSharedState;

const INTERNAL_ERROR_BODY: &str = r#"{"reason":"internal-error"}"#;

pub fn usecase_error_status(e: &OrderUsKsErr) -> HttpStatusCode {
    match e {
        OrderUsKsErr::Validation(_) => HttpStatusCode::BAD_REQUEST,
        OrderUsKsErr::QuantityExceeded { .. } | OrderUsKsErr::StoreNotFound(_) => {
            HttpStatusCode::UNPROCESSABLE_ENTITY
        }
        OrderUsKsErr::NotFound(_) => HttpStatusCode::NOT_FOUND,
        OrderUsKsErr::AdmissionBlocked => HttpStatusCode::SERVICE_UNAVAILABLE,
        OrderUsKsErr::SyntheticFault | OrderUsKsErr::Persistence(_) => {
            HttpStatusCode::INTERNAL_SERVER_ERROR
        }
        OrderUsKsErr::ConfigurationFetch(_) => HttpStatusCode::BAD_GATEWAY,
    }
}

fn serialize_ok<T: Serialize>(status: HttpStatusCode, value: &T) -> (HttpStatusCode, String) {
    match serde_json::to_string(value) {
        Ok(s) => (status, s),
        Err(_) => (
            HttpStatusCode::INTERNAL_SERVER_ERROR,
            r#"{"reason":"serialization-faulire"}"#.to_string(),
        ),
    }
}

fn serialize_error(e: OrderUsKsErr) -> (HttpStatusCode, String) {
    let status = usecase_error_status(&e);
    let body = ErrorRespDto {
        reason: e.to_string(),
    };
    serialize_ok(status, &body)
}

fn json_response(status: HttpStatusCode, body: String) -> impl IntoResponse {
    let mut hdr_map = HttpHeaderMap::new();
    hdr_map.insert(
        HttpHeader::CONTENT_TYPE,
        HttpHeaderValue::from_static(AppConst::HTTP_CONTENT_TYPE_JSON),
    );
    (status, hdr_map, body)
}

// always to specify state type explicitly to the debug macro
#[debug_handler(state=AppSharedState)]
pub(super) async fn create_handler(
    ExtractState(_appstate): ExtractState<AppSharedState>,
    raw_body: String,
) -> impl IntoResponse {
    let log_ctx = _appstate.log_context().clone();
    let ds = _appstate.datastore();
    let (status, body) = match app_repo_order(ds.clone()).await {
        Ok(repo_order) => {
            let uc = CreateOrderUseCase {
                glb_state: _appstate,
                repo_invoice: app_repo_invoice(ds),
                repo_order,
            };
            match uc.execute(raw_body.as_str()).await {
                Ok(order) => serialize_ok(HttpStatusCode::CREATED, &OrderDto::from(order)),
                Err(e) => serialize_error(e),
            }
        }
        Err(e) => {
            app_log_event!(log_ctx, AppLogLevel::ERROR, "repository init failure: {e}");
            (
                HttpStatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_BODY.to_string(),
            )
        }
    };
    json_response(status, body)
} // end of create_handler

#[debug_handler(state=AppSharedState)]
pub(super) async fn list_handler(
    ExtractState(_appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let log_ctx = _appstate.log_context().clone();
    let (status, body) = match app_repo_order(_appstate.datastore()).await {
        Ok(repo_order) => {
            let uc = ListOrdersUseCase {
                glb_state: _appstate,
                repo_order,
            };
            match uc.execute().await {
                Ok(orders) => {
                    let items = orders.into_iter().map(OrderDto::from).collect::<Vec<_>>();
                    serialize_ok(HttpStatusCode::OK, &items)
                }
                Err(e) => serialize_error(e),
            }
        }
        Err(e) => {
            app_log_event!(log_ctx, AppLogLevel::ERROR, "repository init failure: {e}");
            (
                HttpStatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_BODY.to_string(),
            )
        }
    };
    json_response(status, body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn get_handler(
    ExtractPath(oid): ExtractPath<String>,
    ExtractState(_appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let log_ctx = _appstate.log_context().clone();
    let (status, body) = match app_repo_order(_appstate.datastore()).await {
        Ok(repo_order) => {
            let uc = GetOrderUseCase {
                glb_state: _appstate,
                repo_order,
            };
            match uc.execute(oid.as_str()).await {
                Ok(order) => serialize_ok(HttpStatusCode::OK, &OrderDto::from(order)),
                Err(e) => serialize_error(e),
            }
        }
        Err(e) => {
            app_log_event!(log_ctx, AppLogLevel::ERROR, "repository init failure: {e}");
            (
                HttpStatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_BODY.to_string(),
            )
        }
    };
    json_response(status, body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn health_handler(
    ExtractState(_appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    json_response(HttpStatusCode::OK, r#""success""#.to_string())
}
