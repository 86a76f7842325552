use crate::models::{AccountFeeData, AccountId, FeeTransaction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    #[error("Data store query failed: {0}")]
    Query(String),

    #[error("Corrupt fee data: {0}")]
    Corrupt(String),
}

/// Read contract for the store holding per-account fee history and limits.
#[async_trait]
pub trait FeeStore: Send + Sync {
    /// Fee data for `account`, with transactions timestamped at or after
    /// `since`. `Ok(None)` means the store has no record of the account.
    async fn load_account(
        &self,
        account: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Option<AccountFeeData>, StoreError>;

    async fn ping(&self) -> bool;

    fn backend(&self) -> &'static str;
}

/// Stand-in used when no data store is configured: every account exists and
/// has no recorded activity.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnwiredFeeStore;

#[async_trait]
impl FeeStore for UnwiredFeeStore {
    async fn load_account(
        &self,
        _account: &AccountId,
        _since: DateTime<Utc>,
    ) -> Result<Option<AccountFeeData>, StoreError> {
        Ok(Some(AccountFeeData::default()))
    }

    async fn ping(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "unwired"
    }
}

/// Process-local store for development and tests.
#[derive(Default, Clone)]
pub struct InMemoryFeeStore {
    accounts: Arc<RwLock<HashMap<AccountId, AccountFeeData>>>,
}

impl InMemoryFeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the account known without any data.
    pub async fn register(&self, account: AccountId) {
        self.accounts.write().await.entry(account).or_default();
    }

    pub async fn set_monthly_limit(&self, account: AccountId, limit_usd: f64) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(account).or_default().monthly_limit_usd = Some(limit_usd);
    }

    pub async fn record_transaction(&self, account: AccountId, tx: FeeTransaction) {
        let mut accounts = self.accounts.write().await;
        let data = accounts.entry(account).or_default();
        data.transactions.push(tx);
        data.transactions.sort_by_key(|tx| tx.timestamp);
    }

    pub async fn set_optimal_hours(&self, account: AccountId, hours: Vec<i64>) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(account).or_default().optimal_hours = hours;
    }
}

#[async_trait]
impl FeeStore for InMemoryFeeStore {
    async fn load_account(
        &self,
        account: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Option<AccountFeeData>, StoreError> {
        let accounts = self.accounts.read().await;

        Ok(accounts.get(account).map(|data| AccountFeeData {
            monthly_limit_usd: data.monthly_limit_usd,
            transactions: data
                .transactions
                .iter()
                .filter(|tx| tx.timestamp >= since)
                .cloned()
                .collect(),
            optimal_hours: data.optimal_hours.clone(),
        }))
    }

    async fn ping(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
