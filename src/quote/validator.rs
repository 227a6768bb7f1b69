use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::models::{FocusSide, PairAmounts};
use crate::pool::calc::parse_amount;

/// Outcome of checking the deposit amounts against wallet balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationVerdict {
    Ok,
    EmptyAmount,
    InsufficientBalance { side: FocusSide },
}

/// Held wallet balances in display units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balances {
    pub base: BigDecimal,
    pub quote: BigDecimal,
}

impl Default for Balances {
    fn default() -> Self {
        Self {
            base: BigDecimal::zero(),
            quote: BigDecimal::zero(),
        }
    }
}

impl Balances {
    pub fn held(&self, side: FocusSide) -> &BigDecimal {
        match side {
            FocusSide::Base => &self.base,
            FocusSide::Quote => &self.quote,
        }
    }
}

/// Validate both deposit amounts. First matching rule wins:
/// an empty or non-positive amount, then an amount above its balance (base
/// is checked first), otherwise `Ok`.
pub fn validate(amounts: &PairAmounts, balances: &Balances) -> ValidationVerdict {
    let (Some(base), Some(quote)) = (
        parse_amount(amounts.get(FocusSide::Base)),
        parse_amount(amounts.get(FocusSide::Quote)),
    ) else {
        return ValidationVerdict::EmptyAmount;
    };

    for (side, amount) in [(FocusSide::Base, base), (FocusSide::Quote, quote)] {
        if &amount > balances.held(side) {
            return ValidationVerdict::InsufficientBalance { side };
        }
    }
    ValidationVerdict::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amounts(base: &str, quote: &str) -> PairAmounts {
        PairAmounts {
            base: base.into(),
            quote: quote.into(),
        }
    }

    fn balances(base: &str, quote: &str) -> Balances {
        Balances {
            base: BigDecimal::from_str(base).unwrap(),
            quote: BigDecimal::from_str(quote).unwrap(),
        }
    }

    #[test]
    fn empty_amount_wins_over_balance() {
        let b = balances("0", "0");
        assert_eq!(validate(&amounts("", "5"), &b), ValidationVerdict::EmptyAmount);
        assert_eq!(validate(&amounts("5", "0"), &b), ValidationVerdict::EmptyAmount);
        assert_eq!(validate(&amounts("-1", "5"), &b), ValidationVerdict::EmptyAmount);
    }

    #[test]
    fn both_insufficient_reports_base() {
        assert_eq!(
            validate(&amounts("1", "1"), &balances("0", "0")),
            ValidationVerdict::InsufficientBalance {
                side: FocusSide::Base
            }
        );
    }

    #[test]
    fn quote_side_insufficient() {
        assert_eq!(
            validate(&amounts("1", "2.000001"), &balances("1", "2")),
            ValidationVerdict::InsufficientBalance {
                side: FocusSide::Quote
            }
        );
    }

    #[test]
    fn exact_balance_is_enough() {
        // 0.1 + 0.2 style boundaries must compare exactly
        assert_eq!(
            validate(
                &amounts("0.30000000000000000001", "2"),
                &balances("0.30000000000000000001", "2.0")
            ),
            ValidationVerdict::Ok
        );
    }
}
