//! Configuration loader and application settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;

use crate::errors::{AppError, Result};
use crate::pool::PoolId;
use crate::quote::Balances;

const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1_000;
const DEFAULT_SLIPPAGE_BPS: u32 = 100;

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Pool to quote against.
    pub pool_id: PoolId,
    /// JSON file holding the latest pool observation.
    pub snapshot_path: PathBuf,
    /// Wallet balances used for validation.
    pub balances: Balances,
    pub service: ServiceConfig,
}

/// Knobs of the quote service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Period of the refresh timer.
    pub refresh_interval: Duration,
    /// Refresh triggers closer together than this collapse into one. Kept
    /// below `refresh_interval` so late timer ticks are never swallowed.
    pub refresh_throttle: Duration,
    /// Allowance added to the derived side of a deposit, in basis points.
    pub slippage_bps: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            refresh_throttle: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS / 2),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("Set {key} env var")))
        };

        let pool_id = PoolId::new(required("POOL_ID")?.trim());
        let snapshot_path = PathBuf::from(required("SNAPSHOT_PATH")?);

        let refresh_interval_ms: u64 =
            parse_or(&lookup, "REFRESH_INTERVAL_MS", DEFAULT_REFRESH_INTERVAL_MS)?;
        if refresh_interval_ms == 0 {
            return Err(AppError::Config(
                "REFRESH_INTERVAL_MS must be greater than zero".into(),
            ));
        }
        // defaults to half a period
        let refresh_throttle_ms: u64 =
            parse_or(&lookup, "REFRESH_THROTTLE_MS", refresh_interval_ms / 2)?;
        if refresh_throttle_ms >= refresh_interval_ms {
            return Err(AppError::Config(
                "REFRESH_THROTTLE_MS must be less than REFRESH_INTERVAL_MS".into(),
            ));
        }
        let slippage_bps: u32 = parse_or(&lookup, "SLIPPAGE_BPS", DEFAULT_SLIPPAGE_BPS)?;

        let balances = Balances {
            base: parse_or(&lookup, "BASE_BALANCE", BigDecimal::from(0))?,
            quote: parse_or(&lookup, "QUOTE_BALANCE", BigDecimal::from(0))?,
        };

        Ok(Self {
            pool_id,
            snapshot_path,
            balances,
            service: ServiceConfig {
                refresh_interval: Duration::from_millis(refresh_interval_ms),
                refresh_throttle: Duration::from_millis(refresh_throttle_ms),
                slippage_bps,
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
        _ => Ok(default),
    }
}
