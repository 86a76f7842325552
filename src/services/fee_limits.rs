use crate::{
    config::{AccountScope, Config},
    error::FeeLimitsError,
    models::{
        month_start, AccountFeeData, AccountId, FeeTransaction, FeeUsageSnapshot, FeeWindow,
        GasOptimization, TransactionSummary,
    },
    services::FeeStore,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Builds fee usage snapshots from a single read of the fee store.
pub struct FeeLimitsService {
    store: Arc<dyn FeeStore>,
    account_scope: AccountScope,
    default_monthly_limit_usd: f64,
    window_days: u32,
    query_timeout: Duration,
}

impl FeeLimitsService {
    pub fn new(store: Arc<dyn FeeStore>, config: &Config) -> Self {
        Self {
            store,
            account_scope: config.account_scope,
            default_monthly_limit_usd: config.default_monthly_limit_usd,
            window_days: config.window_days,
            query_timeout: config.query_timeout(),
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub async fn snapshot(
        &self,
        account: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<FeeUsageSnapshot, FeeLimitsError> {
        let window = FeeWindow::trailing(now, self.window_days).ok_or_else(|| {
            FeeLimitsError::ComputationFailure(format!(
                "Trailing window of {} days is out of range",
                self.window_days
            ))
        })?;
        let month_start = month_start(now);
        let since = window.start.min(month_start);

        let data = match self.load(account, since).await? {
            Some(data) => data,
            None if self.account_scope == AccountScope::PerAccount => {
                return Err(FeeLimitsError::NotFound(format!(
                    "No fee data for account {}",
                    account
                )));
            }
            None => AccountFeeData::default(),
        };

        let monthly_limit = self.monthly_limit(&data)?;
        let in_window: Vec<&FeeTransaction> = data
            .transactions
            .iter()
            .filter(|tx| window.contains(tx.timestamp))
            .collect();

        let transactions = summarize(&in_window)?;
        let this_month: Vec<&FeeTransaction> = data
            .transactions
            .iter()
            .filter(|tx| tx.timestamp >= month_start && tx.timestamp <= now)
            .collect();

        let gas_optimization = GasOptimization {
            saved_this_month: total_savings(&this_month)?,
            avg_gas_price: average_gas_price_gwei(&in_window)?,
            optimal_hours: normalize_hours(&data.optimal_hours),
        };

        let snapshot = FeeUsageSnapshot::new(monthly_limit, transactions, gas_optimization);

        tracing::debug!(
            "Fee snapshot for {}: spent={:.2} of {:.2} USD ({:.1}%) over {} transactions",
            account,
            snapshot.spent_30_days,
            snapshot.monthly_limit,
            snapshot.percent_used,
            snapshot.transactions.count
        );

        Ok(snapshot)
    }

    async fn load(
        &self,
        account: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Option<AccountFeeData>, FeeLimitsError> {
        match tokio::time::timeout(self.query_timeout, self.store.load_account(account, since)).await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(FeeLimitsError::DataStoreUnavailable(format!(
                "{} fee store did not answer within {}ms",
                self.store.backend(),
                self.query_timeout.as_millis()
            ))),
        }
    }

    fn monthly_limit(&self, data: &AccountFeeData) -> Result<f64, FeeLimitsError> {
        let limit = data
            .monthly_limit_usd
            .unwrap_or(self.default_monthly_limit_usd);

        if !limit.is_finite() || limit < 0.0 {
            return Err(FeeLimitsError::ComputationFailure(format!(
                "Invalid monthly limit: {}",
                limit
            )));
        }
        Ok(limit)
    }
}

fn summarize(transactions: &[&FeeTransaction]) -> Result<TransactionSummary, FeeLimitsError> {
    let mut total_fees_usd = 0.0;
    for tx in transactions {
        if !tx.fee_usd.is_finite() {
            return Err(FeeLimitsError::ComputationFailure(format!(
                "Invalid fee amount on transaction {:?}",
                tx.tx_hash
            )));
        }
        total_fees_usd += tx.fee_usd;
    }

    let total_fees_usd = ensure_finite(total_fees_usd, "Total fees")?;
    Ok(TransactionSummary::new(transactions.len() as u64, total_fees_usd))
}

fn total_savings(transactions: &[&FeeTransaction]) -> Result<f64, FeeLimitsError> {
    let mut saved = 0.0;
    for tx in transactions {
        if !tx.saved_usd.is_finite() {
            return Err(FeeLimitsError::ComputationFailure(format!(
                "Invalid savings amount on transaction {:?}",
                tx.tx_hash
            )));
        }
        saved += tx.saved_usd;
    }

    ensure_finite(saved, "Savings this month")
}

/// Sums of finite amounts can still overflow to infinity.
fn ensure_finite(value: f64, what: &str) -> Result<f64, FeeLimitsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FeeLimitsError::ComputationFailure(format!(
            "{} overflowed",
            what
        )))
    }
}

fn average_gas_price_gwei(transactions: &[&FeeTransaction]) -> Result<f64, FeeLimitsError> {
    if transactions.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for tx in transactions {
        total += tx.gas_price_gwei().ok_or_else(|| {
            FeeLimitsError::ComputationFailure(format!(
                "Gas price out of range on transaction {:?}",
                tx.tx_hash
            ))
        })?;
    }

    ensure_finite(total / transactions.len() as f64, "Average gas price")
}

/// Keeps valid hours of day, ascending and without duplicates.
fn normalize_hours(raw: &[i64]) -> Vec<u8> {
    let mut hours: Vec<u8> = raw
        .iter()
        .filter_map(|&hour| match u8::try_from(hour) {
            Ok(h) if h < 24 => Some(h),
            _ => {
                tracing::warn!("Dropping invalid optimal hour {}", hour);
                None
            }
        })
        .collect();
    hours.sort_unstable();
    hours.dedup();
    hours
}
