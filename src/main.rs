use anyhow::Result;
use fee_limits::{
    app::build_router,
    config::Config,
    handlers::AppState,
    services::{FeeLimitsService, FeeStore, RedisFeeStore, UnwiredFeeStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fee_limits=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting fee-limits service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);
    tracing::info!("Account scope: {:?}", config.account_scope);

    // Initialize data store
    let store: Arc<dyn FeeStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisFeeStore::connect(url).await?),
        None => {
            tracing::warn!("REDIS_URL not set, serving default fee limits for every account");
            Arc::new(UnwiredFeeStore)
        }
    };

    let fee_limits = Arc::new(FeeLimitsService::new(store.clone(), &config));
    let app = build_router(AppState::new(fee_limits, store), &config);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Fee limits status: http://{}{}/status", addr, config.route_prefix);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}
