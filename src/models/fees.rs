use serde::{Deserialize, Serialize, Serializer};

/// Point-in-time read of an account's fee spend against its monthly allowance.
///
/// `remaining` and `percent_used` are always derived from `monthly_limit` and
/// `spent_30_days`; build snapshots through [`FeeUsageSnapshot::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeUsageSnapshot {
    #[serde(serialize_with = "serialize_amount")]
    pub monthly_limit: f64,
    #[serde(rename = "spent30Days", serialize_with = "serialize_amount")]
    pub spent_30_days: f64,
    #[serde(serialize_with = "serialize_amount")]
    pub remaining: f64,
    #[serde(serialize_with = "serialize_amount")]
    pub percent_used: f64,
    pub transactions: TransactionSummary,
    pub gas_optimization: GasOptimization,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub count: u64,
    #[serde(rename = "totalFeesUSD", serialize_with = "serialize_amount")]
    pub total_fees_usd: f64,
    #[serde(rename = "avgFeeUSD", serialize_with = "serialize_amount")]
    pub avg_fee_usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasOptimization {
    #[serde(serialize_with = "serialize_amount")]
    pub saved_this_month: f64,
    /// Mean gas price paid over the window, in gwei.
    #[serde(serialize_with = "serialize_amount")]
    pub avg_gas_price: f64,
    /// Hours of day (UTC, 0-23) favourable for low fees, ascending.
    pub optimal_hours: Vec<u8>,
}

impl FeeUsageSnapshot {
    pub fn new(
        monthly_limit: f64,
        transactions: TransactionSummary,
        gas_optimization: GasOptimization,
    ) -> Self {
        let spent_30_days = transactions.total_fees_usd;

        Self {
            monthly_limit,
            spent_30_days,
            remaining: remaining(monthly_limit, spent_30_days),
            percent_used: percent_used(monthly_limit, spent_30_days),
            transactions,
            gas_optimization,
        }
    }

    /// Snapshot for an account with no recorded activity.
    pub fn empty(monthly_limit: f64) -> Self {
        Self::new(
            monthly_limit,
            TransactionSummary::default(),
            GasOptimization::default(),
        )
    }
}

impl TransactionSummary {
    pub fn new(count: u64, total_fees_usd: f64) -> Self {
        let avg_fee_usd = if count == 0 {
            0.0
        } else {
            total_fees_usd / count as f64
        };

        Self {
            count,
            total_fees_usd,
            avg_fee_usd,
        }
    }
}

pub fn remaining(monthly_limit: f64, spent: f64) -> f64 {
    (monthly_limit - spent).max(0.0)
}

/// Share of the limit consumed, clamped to [0, 100]. A zero limit counts as
/// fully used once anything has been spent.
pub fn percent_used(monthly_limit: f64, spent: f64) -> f64 {
    if monthly_limit > 0.0 {
        (spent / monthly_limit * 100.0).clamp(0.0, 100.0)
    } else if spent > 0.0 {
        100.0
    } else {
        0.0
    }
}

// 2^53: beyond this f64 no longer holds every integer exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole-valued amounts go out as JSON integers (`100`, not `100.0`).
fn serialize_amount<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
