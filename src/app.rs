use crate::{
    config::Config,
    handlers::{get_fee_limits_status, health_check, AppState},
    middleware::resolve_account,
};
use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Mounts `/health` and `{route_prefix}/status`.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let fee_limits = Router::new()
        .route("/status", get(get_fee_limits_status))
        .route_layer(axum_middleware::from_fn_with_state(
            config.account_scope,
            resolve_account,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest(&config.route_prefix, fee_limits)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
