use crate::{error::ErrorResponse, middleware::ACCOUNT_HEADER, models::FeeUsageSnapshot};
use anyhow::{bail, Context, Result};
use reqwest::Client;

/// Result of one status request against a running service.
#[derive(Debug)]
pub enum StatusOutcome {
    Snapshot(FeeUsageSnapshot),
    Failed { status: u16, error: ErrorResponse },
}

pub struct StatusClient {
    client: Client,
    status_url: String,
}

impl StatusClient {
    pub fn new(base_url: &str, route_prefix: &str) -> Self {
        Self {
            client: Client::new(),
            status_url: format!(
                "{}{}/status",
                base_url.trim_end_matches('/'),
                route_prefix.trim_end_matches('/')
            ),
        }
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    pub async fn fetch(&self, account: Option<&str>) -> Result<StatusOutcome> {
        let mut request = self.client.get(&self.status_url);
        if let Some(account) = account {
            request = request.header(ACCOUNT_HEADER, account);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.status_url))?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let snapshot = serde_json::from_str(&body)
                .with_context(|| format!("Invalid fee snapshot: {}", body))?;
            return Ok(StatusOutcome::Snapshot(snapshot));
        }

        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error) => Ok(StatusOutcome::Failed {
                status: status.as_u16(),
                error,
            }),
            Err(_) => bail!("Unexpected {} response: {}", status, body),
        }
    }
}
