use crate::{config::AccountScope, error::FeeLimitsError, models::AccountId};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use ethers::types::Address;

pub const ACCOUNT_HEADER: &str = "x-account-address";

/// Resolves the request's account and stores it in request extensions.
pub async fn resolve_account(
    State(scope): State<AccountScope>,
    mut request: Request,
    next: Next,
) -> Result<Response, FeeLimitsError> {
    let account = match scope {
        AccountScope::Global => AccountId::Global,
        AccountScope::PerAccount => account_from_headers(request.headers()).map_err(|e| {
            tracing::warn!("Rejected request without a valid account: {}", e);
            e
        })?,
    };

    tracing::debug!("Account resolved: {}", account);
    request.extensions_mut().insert(account);

    Ok(next.run(request).await)
}

pub fn account_from_headers(headers: &HeaderMap) -> Result<AccountId, FeeLimitsError> {
    let header = headers.get(ACCOUNT_HEADER).ok_or_else(|| {
        FeeLimitsError::Unauthorized(format!("Missing {} header", ACCOUNT_HEADER))
    })?;

    let raw = header
        .to_str()
        .map_err(|_| FeeLimitsError::Unauthorized("Invalid account address".to_string()))?;

    raw.trim()
        .parse::<Address>()
        .map(AccountId::Address)
        .map_err(|_| FeeLimitsError::Unauthorized(format!("Invalid account address: {}", raw)))
}
