//! Shared data structures used throughout the application.

use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::pool::PoolId;
use crate::quote::ValidationVerdict;

/// Which deposit field the user is driving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FocusSide {
    #[default]
    Base,
    Quote,
}

impl FocusSide {
    /// The side whose amount is derived when `self` is driving.
    pub fn other(self) -> Self {
        match self {
            FocusSide::Base => FocusSide::Quote,
            FocusSide::Quote => FocusSide::Base,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FocusSide::Base => "base",
            FocusSide::Quote => "quote",
        }
    }
}

/// Raw display amounts for both deposit fields, exactly as typed or derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairAmounts {
    pub base: String,
    pub quote: String,
}

impl PairAmounts {
    pub fn get(&self, side: FocusSide) -> &str {
        match side {
            FocusSide::Base => &self.base,
            FocusSide::Quote => &self.quote,
        }
    }

    pub fn set(&mut self, side: FocusSide, value: impl Into<String>) {
        let value = value.into();
        match side {
            FocusSide::Base => self.base = value,
            FocusSide::Quote => self.quote = value,
        }
    }

    pub fn clear(&mut self) {
        self.base.clear();
        self.quote.clear();
    }
}

/// The latest input event: driving side, its raw text and the generation it
/// was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositInput {
    pub side: FocusSide,
    pub raw_amount: String,
    pub generation: u64,
}

/// Outcome of one quote request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteResult {
    /// Driving side the quote was computed for.
    pub side: FocusSide,
    /// Counterpart amount in display units, empty for the quiescent state.
    pub derived_amount: String,
    pub minted_shares: BigDecimal,
    pub for_generation: u64,
    pub for_snapshot_as_of: u64,
}

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinatorState {
    #[default]
    Idle,
    Computing(u64),
    Applied(u64),
}

/// Everything the deposit submission needs: final validated amounts and the
/// fixed side. The derived side already carries the slippage allowance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    pub pool_id: PoolId,
    pub base_amount: String,
    pub quote_amount: String,
    pub fixed_side: FocusSide,
}

/// Read model published for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteView {
    pub base_amount: String,
    pub quote_amount: String,
    pub minted_shares_estimate: BigDecimal,
    pub verdict: ValidationVerdict,
    pub focus: FocusSide,
    pub state: CoordinatorState,
    pub snapshot_as_of: Option<u64>,
    pub pool_not_found: bool,
    /// "1 focused token ≈ X other token", rounded up.
    pub exchange_rate: Option<String>,
    pub deposit: Option<DepositRequest>,
}

impl Default for QuoteView {
    fn default() -> Self {
        Self {
            base_amount: String::new(),
            quote_amount: String::new(),
            minted_shares_estimate: BigDecimal::zero(),
            verdict: ValidationVerdict::EmptyAmount,
            focus: FocusSide::Base,
            state: CoordinatorState::Idle,
            snapshot_as_of: None,
            pool_not_found: false,
            exchange_rate: None,
            deposit: None,
        }
    }
}
