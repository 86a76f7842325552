use crate::{handlers::AppState, models::HealthStatus};
use axum::{extract::State, Json};
use chrono::Utc;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let reachable = state.store.ping().await;

    let status = if reachable { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_store: state.store.backend().to_string(),
        data_store_reachable: reachable,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
