use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account a fee snapshot is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountId {
    /// Single shared account, used when requests are not scoped per wallet.
    Global,
    Address(Address),
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::Global => write!(f, "global"),
            // Debug prints the full lowercase hex, Display abbreviates it
            AccountId::Address(address) => write!(f, "{:?}", address),
        }
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("global") {
            return Ok(AccountId::Global);
        }
        s.parse::<Address>()
            .map(AccountId::Address)
            .map_err(|e| format!("Invalid account address {}: {}", s, e))
    }
}

/// One fee-incurring transaction, as written by the indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTransaction {
    pub tx_hash: H256,
    pub timestamp: DateTime<Utc>,
    pub fee_usd: f64,
    pub gas_price_wei: U256,
    #[serde(default)]
    pub saved_usd: f64,
}

impl FeeTransaction {
    /// Gas price in gwei, or `None` if the wei value does not fit in a u128.
    pub fn gas_price_gwei(&self) -> Option<f64> {
        if self.gas_price_wei > U256::from(u128::MAX) {
            return None;
        }
        Some(self.gas_price_wei.as_u128() as f64 / 1e9)
    }
}

/// Everything the data store knows about an account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFeeData {
    pub monthly_limit_usd: Option<f64>,
    pub transactions: Vec<FeeTransaction>,
    /// Raw hours as provided by the collaborator; validated downstream.
    pub optimal_hours: Vec<i64>,
}

/// Closed instant range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FeeWindow {
    /// `None` when the start falls outside chrono's representable range.
    pub fn trailing(end: DateTime<Utc>, days: u32) -> Option<Self> {
        let start = end.checked_sub_signed(Duration::try_days(i64::from(days))?)?;
        Some(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(now)
}
