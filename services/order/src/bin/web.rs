use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::env;

use axum::extract::Request;
use axum::ServiceExt;
use tokio::runtime::Builder as RuntimeBuilder;
use tower::ServiceBuilder;

use shopping_common::constant::env_vars::EXPECTED_LABELS;
use shopping_order::api::web::route_table;
use shopping_order::constant::hard_limit;
use shopping_order::logging::{app_log_event, AppLogContext, AppLogLevel};
use shopping_order::network::{app_web_service, middleware, net_listener};
use shopping_order::repository::app_repo_order;
use shopping_order::usecase::SeedStoresUseCase;
use shopping_order::{AppCfgHardLimit, AppCfgInitArgs, AppConfig, AppSharedState};

async fn seed_stores(shr_state: AppSharedState) {
    let log_ctx_p = shr_state.log_context().clone();
    let seeds = shr_state.config().api_server.seed_stores.clone();
    match app_repo_order(shr_state.datastore()).await {
        Ok(repo_order) => {
            let uc = SeedStoresUseCase {
                glb_state: shr_state,
                repo_order,
            };
            if let Err(e) = uc.execute(seeds).await {
                app_log_event!(log_ctx_p, AppLogLevel::ERROR, "store seeding failure: {e}");
            }
        }
        Err(e) => {
            app_log_event!(log_ctx_p, AppLogLevel::ERROR, "repository init failure: {e}");
        }
    }
}

async fn shutdown_signal(shr_state: AppSharedState) {
    let log_ctx_p = shr_state.log_context().clone();
    if let Err(e) = tokio::signal::ctrl_c().await {
        app_log_event!(log_ctx_p, AppLogLevel::ERROR, "signal handler failure: {e}");
    }
    app_log_event!(log_ctx_p, AppLogLevel::WARNING, "API server shutting down");
}

async fn start_server(shr_state: AppSharedState) {
    let log_ctx_p = shr_state.log_context().clone();
    let cfg = shr_state.config().clone();
    seed_stores(shr_state.clone()).await;
    let listener = &cfg.api_server.listen;
    let routes = route_table();
    let (service, num_applied) = app_web_service(listener, routes, shr_state.clone());
    if num_applied == 0 {
        app_log_event!(
            log_ctx_p,
            AppLogLevel::ERROR,
            "no route created, web API server failed to start"
        );
        return;
    }
    let co = match middleware::cors(&listener.cors) {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(
                log_ctx_p,
                AppLogLevel::ERROR,
                "cors layer init error, detail: {e}"
            );
            return;
        }
    };
    let reqlm = middleware::req_body_limit(cfg.api_server.limit_req_body_in_bytes);
    let middlewares1 = ServiceBuilder::new().layer(reqlm).layer(co);
    let service = middleware::trim_trailing_slash(service.layer(middlewares1));
    let ratelm = middleware::rate_limit(listener.max_connections);
    let final_service = ServiceBuilder::new()
        .layer(ratelm) // rate-limit not allowed to clone
        .service(ServiceExt::<Request>::into_make_service(service));
    match net_listener(listener.host.clone(), listener.port).await {
        Ok(tcp_lstn) => {
            app_log_event!(
                log_ctx_p,
                AppLogLevel::INFO,
                "API server listening, port:{}",
                listener.port
            );
            let shr_state_cpy = shr_state.clone();
            let sr = axum::serve(tcp_lstn, final_service)
                .with_graceful_shutdown(shutdown_signal(shr_state));
            if let Err(e) = sr.await {
                app_log_event!(log_ctx_p, AppLogLevel::ERROR, "API server error: {e}");
            }
            match shr_state_cpy.metrics().export_text() {
                Ok(snapshot) => {
                    app_log_event!(log_ctx_p, AppLogLevel::INFO, "final metrics:\n{snapshot}")
                }
                Err(e) => {
                    app_log_event!(log_ctx_p, AppLogLevel::ERROR, "metrics export error: {e}")
                }
            }
            app_log_event!(log_ctx_p, AppLogLevel::WARNING, "API server terminated");
        }
        Err(e) => {
            app_log_event!(
                log_ctx_p,
                AppLogLevel::ERROR,
                "API server failed to start, {} ",
                e
            );
        }
    }
} // end of fn start_server

fn start_async_runtime(cfg: AppConfig) {
    let log_ctx = AppLogContext::new(&cfg.basepath, &cfg.api_server.logging);
    let shr_state = match AppSharedState::new(cfg, log_ctx) {
        Ok(v) => v,
        Err(e) => {
            println!("app failed to init shared state, error: {} ", e);
            return;
        }
    };
    let cfg = shr_state.config();
    let log_ctx = shr_state.log_context().clone();
    let log_ctx2 = log_ctx.clone();
    let stack_nbytes: usize = (cfg.api_server.stack_sz_kb as usize) << 10;
    let result = RuntimeBuilder::new_multi_thread()
        .worker_threads(cfg.api_server.num_workers as usize)
        .on_thread_start(move || {
            // this `Fn()` closure will be invoked several times by new thread,
            // depending on number of work threads in the application, all variables
            // moved into this closure have to be clonable.
            let log_cpy = log_ctx.clone();
            app_log_event!(log_cpy, AppLogLevel::INFO, "[API server] worker started");
        })
        .on_thread_stop(move || {
            let log_cpy = log_ctx2.clone();
            app_log_event!(log_cpy, AppLogLevel::INFO, "[API server] worker terminating");
        })
        .thread_stack_size(stack_nbytes)
        .thread_name("web-api-worker")
        // manage low-level I/O drivers used by network types
        .enable_io()
        // rate limiter in crate `tower` requires the timer in the runtime builder
        .enable_time()
        .build();
    match result {
        Ok(rt) => {
            rt.block_on(async move {
                start_server(shr_state).await;
            });
        }
        Err(e) => {
            let log_ctx_p = shr_state.log_context();
            app_log_event!(
                log_ctx_p,
                AppLogLevel::ERROR,
                "async runtime failed to build, {} ",
                e
            );
        }
    };
} // end of start_async_runtime

fn main() {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_LABELS.contains(&k.as_str()));
    let args = AppCfgInitArgs {
        env_var_map: HashMap::<String, String, RandomState>::from_iter(iter),
        limit: AppCfgHardLimit {
            nitems_per_inmem_table: hard_limit::MAX_ITEMS_STORED_PER_MODEL,
        },
    };
    match AppConfig::new(args) {
        Ok(cfg) => start_async_runtime(cfg),
        Err(e) => {
            println!("app failed to configure, error code: {} ", e);
        }
    };
} // end of main
