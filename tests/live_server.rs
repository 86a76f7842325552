use fee_limits::{
    app::build_router,
    client::{StatusClient, StatusOutcome},
    config::{AccountScope, Config},
    handlers::AppState,
    models::{AccountId, FeeUsageSnapshot},
    services::{FeeLimitsService, FeeStore, InMemoryFeeStore},
};
use std::sync::Arc;

const WALLET: &str = "0x4444444444444444444444444444444444444444";

/// Serves the app on an ephemeral port and returns its base URL.
async fn spawn_server(store: Arc<dyn FeeStore>, scope: AccountScope) -> String {
    let config = Config {
        account_scope: scope,
        ..Config::default()
    };
    let service = Arc::new(FeeLimitsService::new(store.clone(), &config));
    let app = build_router(AppState::new(service, store), &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_status_over_http() {
    let store = InMemoryFeeStore::new();
    let account: AccountId = WALLET.parse().unwrap();
    store.set_monthly_limit(account, 250.0).await;

    let base_url = spawn_server(Arc::new(store), AccountScope::PerAccount).await;
    let client = StatusClient::new(&base_url, "/api/fee-limits");

    match client.fetch(Some(WALLET)).await.unwrap() {
        StatusOutcome::Snapshot(snapshot) => {
            assert_eq!(snapshot, FeeUsageSnapshot::empty(250.0));
        }
        other => panic!("expected snapshot, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_body_over_http() {
    let base_url = spawn_server(Arc::new(InMemoryFeeStore::new()), AccountScope::PerAccount).await;

    let response = reqwest::get(format!("{}/api/fee-limits/status", base_url))
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 401);
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_health_over_http() {
    let base_url = spawn_server(Arc::new(InMemoryFeeStore::new()), AccountScope::Global).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base_url))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid JSON");

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
