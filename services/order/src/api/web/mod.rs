use std::collections::HashMap;

use axum::routing::{get, post, MethodRouter};

use crate::constant::api::web as WebConst;
use crate::{AppSharedState, WebApiHdlrLabel};

pub mod dto;
mod order;

pub use order::usecase_error_status;

pub type ApiRouteType = MethodRouter<AppSharedState>;
pub type ApiRouteTableType = HashMap<WebApiHdlrLabel, ApiRouteType>;

pub fn route_table() -> ApiRouteTableType {
    let mut out: ApiRouteTableType = HashMap::new();
    out.insert(WebConst::CREATE_NEW_ORDER, post(order::create_handler));
    out.insert(WebConst::LIST_ORDERS, get(order::list_handler));
    out.insert(WebConst::GET_ORDER, get(order::get_handler));
    out.insert(WebConst::HEALTH_CHECK, get(order::health_handler));
    out
}
