use crate::models::{AccountFeeData, AccountId, FeeTransaction};
use crate::services::store::{FeeStore, StoreError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::RedisError;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Set of every account the indexer has written data for.
pub const ACCOUNTS_KEY: &str = "fees:accounts";

pub fn limit_key(account: &AccountId) -> String {
    format!("fees:{}:limit", account)
}

pub fn transactions_key(account: &AccountId) -> String {
    format!("fees:{}:txs", account)
}

pub fn optimal_hours_key(account: &AccountId) -> String {
    format!("fees:{}:optimal_hours", account)
}

/// Read-only view over the fee data the indexer keeps in Redis.
///
/// Transactions live in a sorted set scored by unix timestamp, with each
/// member a JSON-encoded [`FeeTransaction`].
pub struct RedisFeeStore {
    client: redis::Client,
    redis: RwLock<Option<ConnectionManager>>,
    connect_attempts: AtomicU64,
}

impl RedisFeeStore {
    /// Fails only on a malformed URL. An unreachable server is logged and
    /// the connection is retried on the next query or health check.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid REDIS_URL")?;

        let store = Self {
            client,
            redis: RwLock::new(None),
            connect_attempts: AtomicU64::new(0),
        };

        if let Err(e) = store.connection().await {
            tracing::warn!("Redis connection failed: {}, will retry on demand", e);
        }

        Ok(store)
    }

    /// Number of times a connection has been attempted so far.
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    /// Returns the shared connection, establishing it first if needed.
    /// Once established, the manager reconnects by itself.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        if let Some(conn) = self.redis.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut slot = self.redis.write().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
        let conn = self
            .client
            .get_connection_manager_with_backoff(2, 100, 1)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis connection failed: {}", e)))?;

        tracing::info!("Redis fee store connected successfully");
        *slot = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl FeeStore for RedisFeeStore {
    async fn load_account(
        &self,
        account: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Option<AccountFeeData>, StoreError> {
        let mut redis = self.connection().await?;

        let account_key = account.to_string();
        let (known, limit, members, hours): (bool, Option<String>, Vec<String>, Option<String>) =
            redis::pipe()
                .sismember(ACCOUNTS_KEY, &account_key)
                .get(limit_key(account))
                .zrangebyscore(transactions_key(account), since.timestamp(), "+inf")
                .get(optimal_hours_key(account))
                .query_async(&mut redis)
                .await
                .map_err(map_redis_error)?;

        if !is_known(known, limit.as_deref(), &members, hours.as_deref()) {
            tracing::debug!("No fee data in Redis for account {}", account);
            return Ok(None);
        }

        let data = AccountFeeData {
            monthly_limit_usd: limit.as_deref().map(parse_limit).transpose()?,
            transactions: members
                .iter()
                .map(|member| decode_transaction(member))
                .collect::<Result<Vec<_>, _>>()?,
            optimal_hours: hours
                .as_deref()
                .map(parse_optimal_hours)
                .transpose()?
                .unwrap_or_default(),
        };

        tracing::debug!(
            "Loaded {} fee transactions for {} from Redis",
            data.transactions.len(),
            account
        );

        Ok(Some(data))
    }

    async fn ping(&self) -> bool {
        let Ok(mut redis) = self.connection().await else {
            return false;
        };
        redis::cmd("PING")
            .query_async::<_, String>(&mut redis)
            .await
            .is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// An account is known if it is registered in the accounts set or if any
/// of its own keys holds data.
fn is_known(
    registered: bool,
    limit: Option<&str>,
    members: &[String],
    hours: Option<&str>,
) -> bool {
    registered || limit.is_some() || !members.is_empty() || hours.is_some()
}

fn map_redis_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Query(e.to_string())
    }
}

fn parse_limit(raw: &str) -> Result<f64, StoreError> {
    raw.trim()
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("monthly limit {:?} is not a number", raw)))
}

fn decode_transaction(member: &str) -> Result<FeeTransaction, StoreError> {
    serde_json::from_str(member)
        .map_err(|e| StoreError::Corrupt(format!("undecodable fee transaction: {}", e)))
}

fn parse_optimal_hours(raw: &str) -> Result<Vec<i64>, StoreError> {
    serde_json::from_str(raw)
        .map_err(|e| StoreError::Corrupt(format!("undecodable optimal hours: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let wallet: AccountId = "0x2222222222222222222222222222222222222222".parse().unwrap();

        assert_eq!(limit_key(&AccountId::Global), "fees:global:limit");
        assert_eq!(
            transactions_key(&wallet),
            "fees:0x2222222222222222222222222222222222222222:txs"
        );
        assert_eq!(
            optimal_hours_key(&AccountId::Global),
            "fees:global:optimal_hours"
        );
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(" 150.5 ").unwrap(), 150.5);
        assert!(matches!(parse_limit("lots"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_decode_transaction_member() {
        let member = r#"{"tx_hash":"0x00000000000000000000000000000000000000000000000000000000000000ff","timestamp":"2024-05-02T03:00:00Z","fee_usd":0.75,"gas_price_wei":"0x4a817c800","saved_usd":0.1}"#;
        let tx = decode_transaction(member).unwrap();

        assert_eq!(tx.fee_usd, 0.75);
        assert_eq!(tx.gas_price_gwei(), Some(20.0));
        assert!(matches!(
            decode_transaction("{}"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_parse_optimal_hours() {
        assert_eq!(parse_optimal_hours("[3, 1, 2]").unwrap(), vec![3, 1, 2]);
        assert!(parse_optimal_hours("\"night\"").is_err());
    }

    #[test]
    fn test_account_known_from_any_key() {
        assert!(!is_known(false, None, &[], None));
        assert!(is_known(true, None, &[], None));
        assert!(is_known(false, Some("50"), &[], None));
        assert!(is_known(false, None, &["{}".to_string()], None));
        assert!(is_known(false, None, &[], Some("[1]")));
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_unavailable() {
        // Nothing listens on port 1
        let store = RedisFeeStore::connect("redis://127.0.0.1:1").await.unwrap();

        assert!(!store.ping().await);
        let result = store.load_account(&AccountId::Global, Utc::now()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_failed_startup_connection_is_retried() {
        let store = RedisFeeStore::connect("redis://127.0.0.1:1").await.unwrap();
        assert_eq!(store.connect_attempts(), 1);

        assert!(!store.ping().await);
        assert_eq!(store.connect_attempts(), 2);

        let result = store.load_account(&AccountId::Global, Utc::now()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.connect_attempts(), 3);
    }

    #[tokio::test]
    async fn test_malformed_url_is_rejected() {
        assert!(RedisFeeStore::connect("not a url").await.is_err());
    }
}
