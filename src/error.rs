use crate::services::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Message sent to clients when a failure carries no description of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to get fee limits status";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Error, Debug)]
pub enum FeeLimitsError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    DataStoreUnavailable(String),

    #[error("{0}")]
    ComputationFailure(String),
}

impl FeeLimitsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FeeLimitsError::NotFound(_) => StatusCode::NOT_FOUND,
            FeeLimitsError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FeeLimitsError::DataStoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            FeeLimitsError::ComputationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FeeLimitsError::NotFound(_) => "NOT_FOUND",
            FeeLimitsError::Unauthorized(_) => "UNAUTHORIZED",
            FeeLimitsError::DataStoreUnavailable(_) => "DATA_STORE_UNAVAILABLE",
            FeeLimitsError::ComputationFailure(_) => "COMPUTATION_FAILURE",
        }
    }

    /// The message shown to clients, never empty.
    pub fn client_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl From<StoreError> for FeeLimitsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => FeeLimitsError::DataStoreUnavailable(err.to_string()),
            StoreError::Query(message) | StoreError::Corrupt(message) => {
                FeeLimitsError::ComputationFailure(message)
            }
        }
    }
}

impl From<anyhow::Error> for FeeLimitsError {
    fn from(err: anyhow::Error) -> Self {
        FeeLimitsError::ComputationFailure(err.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for FeeLimitsError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let status = self.status_code();
        let error_code = self.error_code();

        let body = ErrorResponse {
            success: false,
            error: self.client_message(),
        };

        // Callers log the failure with request context
        tracing::debug!(
            error = ?self,
            error_code = error_code,
            request_id = %request_id,
            "Request failed"
        );

        (status, [(REQUEST_ID_HEADER, request_id)], Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: FeeLimitsError) -> (StatusCode, bool, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let has_request_id = response.headers().contains_key(REQUEST_ID_HEADER);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, has_request_id, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (FeeLimitsError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (FeeLimitsError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (
                FeeLimitsError::DataStoreUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                FeeLimitsError::ComputationFailure("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let (status, has_request_id, _) = body_of(err).await;
            assert_eq!(status, expected);
            assert!(has_request_id);
        }
    }

    #[tokio::test]
    async fn test_empty_message_falls_back() {
        let (status, _, body) = body_of(FeeLimitsError::ComputationFailure(String::new())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "error": FALLBACK_ERROR_MESSAGE })
        );
    }

    #[tokio::test]
    async fn test_message_is_passed_through() {
        let (_, _, body) =
            body_of(FeeLimitsError::ComputationFailure("ledger offline".into())).await;
        assert_eq!(body["error"], "ledger offline");
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_store_errors_map_to_kinds() {
        let unavailable: FeeLimitsError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(unavailable, FeeLimitsError::DataStoreUnavailable(_)));

        let corrupt: FeeLimitsError = StoreError::Corrupt("bad json".into()).into();
        assert!(matches!(corrupt, FeeLimitsError::ComputationFailure(ref m) if m == "bad json"));

        let silent: FeeLimitsError = StoreError::Query(String::new()).into();
        assert_eq!(silent.client_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_rendering_an_error_does_not_log_at_error_level() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        struct ErrorCounter(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == tracing::Level::ERROR {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(errors.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let response = FeeLimitsError::DataStoreUnavailable("down".into()).into_response();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        });

        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_anyhow_errors_are_computation_failures() {
        let err: FeeLimitsError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, FeeLimitsError::ComputationFailure(ref m) if m == "boom"));
    }
}
