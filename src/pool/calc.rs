use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use thiserror::Error;

use crate::models::FocusSide;
use crate::pool::state::ReserveSnapshot;

const BPS_DENOMINATOR: u32 = 10_000;
/// Minimum number of places shown for the display exchange rate.
const MIN_RATE_PLACES: u8 = 6;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuoteError {
    #[error("pool has a zero reserve")]
    DegeneratePool,
}

/// Counterpart amount and LP estimate for one driving amount.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotePair {
    /// Counterpart amount in display units; empty for the quiescent quote.
    pub derived_amount: String,
    /// LP shares the deposit would mint, in display units.
    pub minted_shares: BigDecimal,
}

impl QuotePair {
    pub fn empty() -> Self {
        Self {
            derived_amount: String::new(),
            minted_shares: BigDecimal::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.derived_amount.is_empty()
    }
}

/// Quote the deposit that keeps the pool ratio for `raw_amount` on `side`.
///
/// # Arguments
/// * `snapshot` - Reserves and supply the quote is computed against
/// * `side` - Driving side, the one the user typed into
/// * `raw_amount` - Driving amount as a display-unit decimal string
///
/// # Returns
/// The counterpart amount, floored to the other token's smallest unit, and
/// the floored LP share estimate. Empty or non-positive input yields the
/// empty quote; a zero reserve yields `QuoteError::DegeneratePool`.
pub fn quote(
    snapshot: &ReserveSnapshot,
    side: FocusSide,
    raw_amount: &str,
) -> Result<QuotePair, QuoteError> {
    let Some(amount) = parse_amount(raw_amount) else {
        return Ok(QuotePair::empty());
    };
    if snapshot.is_degenerate() {
        return Err(QuoteError::DegeneratePool);
    }

    let driving_raw = to_smallest_units(&amount, snapshot.decimals(side));
    if driving_raw.is_zero() {
        return Ok(QuotePair::empty());
    }

    let other = side.other();
    let driving_reserve = snapshot.reserve(side);

    // non-negative operands: truncating division is floor
    let derived_raw = &driving_raw * snapshot.reserve(other) / driving_reserve;
    let minted_raw = &driving_raw * &snapshot.lp_supply / driving_reserve;

    Ok(QuotePair {
        derived_amount: format_units(&derived_raw, snapshot.decimals(other)),
        minted_shares: BigDecimal::new(minted_raw, i64::from(snapshot.lp_decimals)),
    })
}

/// Display rate "1 `side` ≈ X other", rounded up to
/// `max(other decimals, 6)` places. `None` for a degenerate pool.
pub fn exchange_rate(snapshot: &ReserveSnapshot, side: FocusSide) -> Option<String> {
    if snapshot.is_degenerate() {
        return None;
    }
    let other = side.other();
    let places = snapshot.decimals(other).max(MIN_RATE_PLACES);

    // (other / 10^od) / (driving / 10^dd) scaled by 10^places
    let numerator = snapshot.reserve(other)
        * pow10(snapshot.decimals(side))
        * pow10(places);
    let denominator = snapshot.reserve(side) * pow10(snapshot.decimals(other));
    Some(format_units(&div_ceil(&numerator, &denominator), places))
}

/// Raise a derived amount by the slippage allowance, rounding up.
pub fn with_slippage(raw: &BigInt, slippage_bps: u32) -> BigInt {
    let factor = BigInt::from(BPS_DENOMINATOR + slippage_bps);
    div_ceil(&(raw * factor), &BigInt::from(BPS_DENOMINATOR))
}

/// Parse a display amount. Empty, malformed and non-positive input is `None`.
pub fn parse_amount(raw_amount: &str) -> Option<BigDecimal> {
    let trimmed = raw_amount.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed)
        .ok()
        .filter(|amount| amount.is_positive())
}

/// Convert a display amount to smallest units, truncating extra precision.
pub fn to_smallest_units(amount: &BigDecimal, decimals: u8) -> BigInt {
    let (digits, _scale) = amount.with_scale(i64::from(decimals)).into_bigint_and_exponent();
    digits
}

/// Format a smallest-unit integer as a plain display decimal with trailing
/// zeros trimmed.
pub fn format_units(raw: &BigInt, decimals: u8) -> String {
    let sign = if raw.is_negative() { "-" } else { "" };
    let digits = raw.abs().to_string();
    let places = usize::from(decimals);
    if places == 0 {
        return format!("{sign}{digits}");
    }
    let padded = if digits.len() <= places {
        format!("{}{}", "0".repeat(places - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    }
}

// ---------- helper functions ----------

fn pow10(exp: u8) -> BigInt {
    num_traits::pow(BigInt::from(10u8), usize::from(exp))
}

/// Ceiling division for non-negative numerator and positive denominator.
fn div_ceil(numerator: &BigInt, denominator: &BigInt) -> BigInt {
    let quotient = numerator / denominator;
    if (&quotient * denominator) == *numerator {
        quotient
    } else {
        quotient + 1u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::state::PoolId;

    fn mock_pool(
        base_reserve: u128,
        quote_reserve: u128,
        lp_supply: u128,
        base_decimals: u8,
        quote_decimals: u8,
    ) -> ReserveSnapshot {
        ReserveSnapshot {
            pool_id: PoolId::new("pool"),
            base_reserve: BigInt::from(base_reserve),
            quote_reserve: BigInt::from(quote_reserve),
            lp_supply: BigInt::from(lp_supply),
            base_decimals,
            quote_decimals,
            lp_decimals: base_decimals,
            as_of: 1,
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn floors_non_terminating_ratio() {
        // 1 * 1 / 3 must floor to zero, never 0.333...
        let pool = mock_pool(3, 1, 3, 0, 0);
        let q = quote(&pool, FocusSide::Base, "1").unwrap();
        assert_eq!(q.derived_amount, "0");
        assert_eq!(q.minted_shares, dec("1"));
    }

    #[test]
    fn proportional_with_mixed_decimals() {
        // 100 SOL (9 dp) against 15_000 USDC (6 dp)
        let pool = mock_pool(100_000_000_000, 15_000_000_000, 1_000_000_000_000, 9, 6);
        let q = quote(&pool, FocusSide::Base, "1.5").unwrap();
        assert_eq!(q.derived_amount, "225");
        // 1.5e9 * 1e12 / 1e11 = 1.5e10 raw LP at 9 dp
        assert_eq!(q.minted_shares, dec("15"));

        let q = quote(&pool, FocusSide::Quote, "1").unwrap();
        // 1e6 * 1e11 / 1.5e10 = 6_666_666.66.. -> 6_666_666
        assert_eq!(q.derived_amount, "0.006666666");
        assert_eq!(q.minted_shares, dec("0.066666666"));
    }

    #[test]
    fn driving_precision_beyond_decimals_is_truncated() {
        let pool = mock_pool(1_000, 2_000, 1_000, 2, 2);
        let q = quote(&pool, FocusSide::Base, "1.239").unwrap();
        // 1.23 -> 123 raw -> 246 raw quote
        assert_eq!(q.derived_amount, "2.46");
    }

    #[test]
    fn swap_back_never_exceeds_original() {
        let pool = mock_pool(7_777_777, 3_333_331, 5_000_000, 3, 4);
        for x in ["1", "0.007", "12.345", "999.999"] {
            let forward = quote(&pool, FocusSide::Base, x).unwrap();
            let back = quote(&pool, FocusSide::Quote, &forward.derived_amount).unwrap();
            let back_amount = parse_amount(&back.derived_amount).unwrap_or_default();
            assert!(back_amount <= dec(x), "{x} came back as {back_amount}");
        }
    }

    #[test]
    fn empty_and_non_positive_input_is_quiescent() {
        let pool = mock_pool(10, 10, 10, 0, 0);
        for raw in ["", "   ", "0", "-1", "abc", "0.0"] {
            let q = quote(&pool, FocusSide::Base, raw).unwrap();
            assert!(q.is_empty(), "{raw:?}");
            assert!(q.minted_shares.is_zero());
        }
    }

    #[test]
    fn dust_below_smallest_unit_is_quiescent() {
        let pool = mock_pool(10, 10, 10, 2, 2);
        let q = quote(&pool, FocusSide::Base, "0.001").unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn zero_reserve_is_degenerate() {
        let pool = mock_pool(0, 10, 10, 0, 0);
        assert_eq!(
            quote(&pool, FocusSide::Base, "1"),
            Err(QuoteError::DegeneratePool)
        );
        assert_eq!(
            quote(&pool, FocusSide::Quote, "1"),
            Err(QuoteError::DegeneratePool)
        );
        // empty input stays quiescent even on a degenerate pool
        assert!(quote(&pool, FocusSide::Base, "").unwrap().is_empty());
    }

    #[test]
    fn exchange_rate_rounds_up() {
        let pool = mock_pool(3, 1, 1, 0, 0);
        // 1/3 rounded up at 6 places
        assert_eq!(exchange_rate(&pool, FocusSide::Base).as_deref(), Some("0.333334"));
        assert_eq!(exchange_rate(&pool, FocusSide::Quote).as_deref(), Some("3"));

        let pool = mock_pool(100_000_000_000, 15_000_000_000, 1, 9, 6);
        assert_eq!(exchange_rate(&pool, FocusSide::Base).as_deref(), Some("150"));
        // other side has 9 decimals, so 9 places
        assert_eq!(
            exchange_rate(&pool, FocusSide::Quote).as_deref(),
            Some("0.006666667")
        );

        assert_eq!(exchange_rate(&mock_pool(0, 1, 1, 0, 0), FocusSide::Base), None);
    }

    #[test]
    fn slippage_allowance_rounds_up() {
        assert_eq!(with_slippage(&BigInt::from(10_000), 100), BigInt::from(10_100));
        assert_eq!(with_slippage(&BigInt::from(1), 100), BigInt::from(2));
        assert_eq!(with_slippage(&BigInt::from(0), 100), BigInt::from(0));
        assert_eq!(with_slippage(&BigInt::from(7), 0), BigInt::from(7));
    }

    #[test]
    fn format_units_is_plain_and_trimmed() {
        assert_eq!(format_units(&BigInt::from(0), 6), "0");
        assert_eq!(format_units(&BigInt::from(5), 3), "0.005");
        assert_eq!(format_units(&BigInt::from(1_500_000), 6), "1.5");
        assert_eq!(format_units(&BigInt::from(42), 0), "42");
        let huge = BigInt::from_str("123456789012345678901234567890").unwrap();
        assert_eq!(format_units(&huge, 18), "123456789012.34567890123456789");
    }

    #[test]
    fn smallest_units_round_trip_through_formatting() {
        let raw = BigInt::from(1_234_567u64);
        let text = format_units(&raw, 4);
        assert_eq!(to_smallest_units(&parse_amount(&text).unwrap(), 4), raw);
        assert_eq!(to_smallest_units(&dec("1e3"), 2), BigInt::from(100_000));
    }
}
