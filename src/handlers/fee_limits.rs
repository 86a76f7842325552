use crate::{
    error::FeeLimitsError,
    models::{AccountId, FeeUsageSnapshot},
    services::{FeeLimitsService, FeeStore},
};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub fee_limits: Arc<FeeLimitsService>,
    pub store: Arc<dyn FeeStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(fee_limits: Arc<FeeLimitsService>, store: Arc<dyn FeeStore>) -> Self {
        Self {
            fee_limits,
            store,
            started_at: Instant::now(),
        }
    }
}

pub async fn get_fee_limits_status(
    State(state): State<AppState>,
    Extension(account): Extension<AccountId>,
) -> Result<Json<FeeUsageSnapshot>, FeeLimitsError> {
    state
        .fee_limits
        .snapshot(&account, Utc::now())
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(
                target: "fee_limits::status",
                account = %account,
                "Error getting fee limits status: {}",
                e
            );
            e
        })
}
