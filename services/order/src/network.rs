use std::io::ErrorKind;
use std::net::ToSocketAddrs;
use std::result::Result as DefaultResult;

use axum::Router;
use tokio::net::TcpListener;

use shopping_common::error::AppErrorCode;

use crate::api::web::{ApiRouteTableType, ApiRouteType};
use crate::error::AppError;
use crate::{AppSharedState, WebApiListenCfg, WebApiRouteCfg};

pub type WebServiceRoute = Router<()>;

pub fn app_web_service(
    cfg: &WebApiListenCfg,
    rtable: ApiRouteTableType,
    shr_state: AppSharedState,
) -> (WebServiceRoute, u16) {
    // the router is created without concrete state first, the state is
    // provided at the end of this function
    let mut router: Router<AppSharedState> = Router::new();
    let iterator = cfg.routes.iter();
    let filt_fn = |&item: &&WebApiRouteCfg| -> bool {
        let hdlr_label = item.handler.as_str();
        rtable.contains_key(hdlr_label)
    };
    let filtered = iterator.filter(filt_fn);
    let mut num_applied: u16 = 0;
    for item in filtered {
        let hdlr_label = item.handler.as_str();
        if let Some(route) = rtable.get(hdlr_label) {
            let route_cpy: ApiRouteType = route.clone();
            // method routers of the same path are merged
            router = router.route(item.path.as_str(), route_cpy);
            num_applied += 1u16;
        }
    }
    let router = if num_applied > 0 {
        let api_ver_path = String::from("/") + &cfg.api_version;
        Router::new().nest(api_ver_path.as_str(), router)
    } else {
        router
    };
    // Axum converts a router to a leaf service ONLY when the type parameter
    // `S` in `Router` becomes empty tuple `()`, which means :
    //
    //     "state type that is missing in the router".
    //
    let router = router.with_state(shr_state);
    (router, num_applied)
} // end of fn app_web_service

pub mod middleware {
    use std::str::FromStr;
    use std::time::Duration;

    use tower::limit::RateLimitLayer;
    use tower::Layer;
    use tower_http::cors::{AllowOrigin, CorsLayer};
    use tower_http::limit::RequestBodyLimitLayer;
    use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

    use shopping_common::config::WebApiCorsCfg;

    use super::{AppError, AppErrorCode, DefaultResult, WebServiceRoute};

    pub fn rate_limit(max_conn: u32) -> RateLimitLayer {
        let num = max_conn as u64;
        let period = Duration::from_secs(1);
        RateLimitLayer::new(num, period)
    }

    fn cors_error(detail: String) -> AppError {
        AppError {
            detail: Some(detail),
            code: AppErrorCode::InvalidCorsConfig,
        }
    }

    pub fn cors(cfg: &WebApiCorsCfg) -> DefaultResult<CorsLayer, AppError> {
        let methods = cfg
            .allowed_methods
            .iter()
            .map(|m| {
                http::Method::from_bytes(m.as_bytes())
                    .map_err(|_e| cors_error(format!("invalid-allowed-method: {m}")))
            })
            .collect::<DefaultResult<Vec<http::Method>, AppError>>()?;
        let headers = cfg
            .allowed_headers
            .iter()
            .map(|h| {
                http::HeaderName::from_str(h.as_str())
                    .map_err(|_e| cors_error(format!("invalid-allowed-header: {h}")))
            })
            .collect::<DefaultResult<Vec<http::HeaderName>, AppError>>()?;
        let origin = if cfg.allowed_origin == "*" {
            if cfg.allow_credentials {
                // browsers reject wildcard origin with credentials
                return Err(cors_error("wildcard-origin-with-credentials".to_string()));
            }
            AllowOrigin::any()
        } else {
            let v = cfg
                .allowed_origin
                .parse::<http::HeaderValue>()
                .map_err(|e| cors_error(format!("invalid-origin-header: {}", e)))?;
            AllowOrigin::exact(v)
        };
        let co = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(cfg.allow_credentials)
            .max_age(Duration::from_secs(cfg.preflight_max_age));
        Ok(co)
    } // end of fn cors

    pub fn req_body_limit(limit: usize) -> RequestBodyLimitLayer {
        RequestBodyLimitLayer::new(limit)
    }

    // wraps the router from outside, `/orders/` has to be rewritten
    // before the route is matched
    pub fn trim_trailing_slash(router: WebServiceRoute) -> NormalizePath<WebServiceRoute> {
        NormalizePathLayer::trim_trailing_slash().layer(router)
    }
} // end of inner-module middleware

pub async fn net_listener(
    mut domain_host: String,
    port: u16,
) -> DefaultResult<TcpListener, AppError> {
    if !domain_host.contains(':') {
        domain_host += ":0";
    }
    let mut iterator = domain_host.to_socket_addrs().map_err(
        // IP not found after domain name resolution
        |e| AppError {
            detail: Some(e.to_string() + ", domain_host:" + &domain_host),
            code: AppErrorCode::IOerror(ErrorKind::AddrNotAvailable),
        },
    )?;
    loop {
        let mut addr = iterator.next().ok_or(AppError {
            detail: Some("failed to bound with all IPs".to_string()),
            code: AppErrorCode::IOerror(ErrorKind::AddrInUse),
        })?;
        addr.set_port(port);
        if let Ok(b) = TcpListener::bind(addr).await {
            break Ok(b);
        }
    } // end of loop
} // end of fn net_listener
