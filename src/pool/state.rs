use std::fmt;

use num_bigint::BigInt;
use num_traits::Signed;

use crate::models::FocusSide;

/// Identity of a two-asset pool (e.g. its on-chain address).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolId(String);

impl PoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable observation of a pool's reserves and LP supply.
///
/// All amounts are in smallest units. A snapshot is never mutated; a newer
/// one with a strictly greater `as_of` supersedes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub pool_id: PoolId,
    /// Base token reserve.
    pub base_reserve: BigInt,
    /// Quote token reserve.
    pub quote_reserve: BigInt,
    /// Total LP share supply.
    pub lp_supply: BigInt,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub lp_decimals: u8,
    /// Monotonic sequence number of the observation.
    pub as_of: u64,
}

impl ReserveSnapshot {
    /// Reserve held for `side`.
    pub fn reserve(&self, side: FocusSide) -> &BigInt {
        match side {
            FocusSide::Base => &self.base_reserve,
            FocusSide::Quote => &self.quote_reserve,
        }
    }

    pub fn decimals(&self, side: FocusSide) -> u8 {
        match side {
            FocusSide::Base => self.base_decimals,
            FocusSide::Quote => self.quote_decimals,
        }
    }

    /// A pool with either reserve at zero cannot be quoted proportionally.
    pub fn is_degenerate(&self) -> bool {
        !self.base_reserve.is_positive() || !self.quote_reserve.is_positive()
    }

    /// Checks the non-negativity invariant of externally produced data.
    pub fn check(&self) -> Result<(), String> {
        for (name, value) in [
            ("base_reserve", &self.base_reserve),
            ("quote_reserve", &self.quote_reserve),
            ("lp_supply", &self.lp_supply),
        ] {
            if value.is_negative() {
                return Err(format!("{name} is negative ({value})"));
            }
        }
        Ok(())
    }
}
