use anyhow::Result;
use fee_limits::client::{StatusClient, StatusOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Load configuration
    dotenvy::dotenv().ok();

    let base_url = std::env::var("FEE_LIMITS_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let route_prefix = std::env::var("ROUTE_PREFIX")
        .unwrap_or_else(|_| "/api/fee-limits".to_string());
    let account = std::env::args().nth(1);

    let client = StatusClient::new(&base_url, &route_prefix);

    println!("Fee Limits Status Probe");
    println!("=======================");
    println!("Endpoint: {}", client.status_url());
    println!("Account: {}", account.as_deref().unwrap_or("(none)"));
    println!();

    match client.fetch(account.as_deref()).await? {
        StatusOutcome::Snapshot(snapshot) => {
            println!("[SUCCESS] Received fee usage snapshot:");
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            println!();
            println!(
                "Spent ${:.2} of ${:.2} ({:.1}% used, ${:.2} remaining)",
                snapshot.spent_30_days,
                snapshot.monthly_limit,
                snapshot.percent_used,
                snapshot.remaining
            );
        }
        StatusOutcome::Failed { status, error } => {
            println!("[FAILED] HTTP {}: {}", status, error.error);
            std::process::exit(1);
        }
    }

    Ok(())
}
