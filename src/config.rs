use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for the trailing window, ten years.
pub const MAX_WINDOW_DAYS: u32 = 3650;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

/// How requests are mapped to accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountScope {
    /// Every request reads the shared global account.
    Global,
    /// Requests must name their wallet in the `X-Account-Address` header.
    PerAccount,
}

impl FromStr for AccountScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "global" => Ok(AccountScope::Global),
            "per-account" | "per_account" | "account" => Ok(AccountScope::PerAccount),
            _ => bail!("Unknown account scope: {}", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Routing
    pub route_prefix: String,
    pub account_scope: AccountScope,

    // Fee limits
    pub default_monthly_limit_usd: f64,
    pub window_days: u32,
    pub query_timeout_secs: u64,

    // Data store; unset means no store is wired
    pub redis_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            host: "0.0.0.0".to_string(),
            port: 8080,
            route_prefix: "/api/fee-limits".to_string(),
            account_scope: AccountScope::Global,
            default_monthly_limit_usd: 100.0,
            window_days: 30,
            query_timeout_secs: 5,
            redis_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            environment: Self::parse_environment(lookup("ENVIRONMENT"))?,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: Self::parse_or("PORT", lookup("PORT"), defaults.port)?,

            route_prefix: lookup("ROUTE_PREFIX").unwrap_or(defaults.route_prefix),
            account_scope: Self::parse_or(
                "ACCOUNT_SCOPE",
                lookup("ACCOUNT_SCOPE"),
                defaults.account_scope,
            )?,

            default_monthly_limit_usd: Self::parse_or(
                "DEFAULT_MONTHLY_LIMIT_USD",
                lookup("DEFAULT_MONTHLY_LIMIT_USD"),
                defaults.default_monthly_limit_usd,
            )?,
            window_days: Self::parse_or("WINDOW_DAYS", lookup("WINDOW_DAYS"), defaults.window_days)?,
            query_timeout_secs: Self::parse_or(
                "QUERY_TIMEOUT_SECS",
                lookup("QUERY_TIMEOUT_SECS"),
                defaults.query_timeout_secs,
            )?,

            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    fn parse_environment(value: Option<String>) -> Result<Environment> {
        let env = value.unwrap_or_else(|| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_or<T>(var: &str, value: Option<String>, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match value {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Invalid {}", var)),
            None => Ok(default),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.route_prefix.starts_with('/') {
            bail!("ROUTE_PREFIX must start with '/'");
        }
        if self.route_prefix == "/" || self.route_prefix.ends_with('/') {
            bail!("ROUTE_PREFIX must not be '/' or end with '/'");
        }

        if !self.default_monthly_limit_usd.is_finite() || self.default_monthly_limit_usd < 0.0 {
            bail!("DEFAULT_MONTHLY_LIMIT_USD must be a non-negative number");
        }
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            bail!("WINDOW_DAYS must be between 1 and {}", MAX_WINDOW_DAYS);
        }
        if self.query_timeout_secs == 0 {
            bail!("QUERY_TIMEOUT_SECS must be at least 1");
        }

        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                bail!("REDIS_URL must be a redis:// or rediss:// URL");
            }
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
