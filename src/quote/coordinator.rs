//! Generation-based recomputation state machine.
//!
//! Every input event (edit, snapshot, pool change, deposit sent) bumps the
//! generation before any quote request leaves this module. A result is
//! applied only when it carries the current generation and was computed
//! against the snapshot still held, so out-of-order completions can never
//! overwrite newer state.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_traits::Zero;
use tracing::debug;

use crate::models::{
    CoordinatorState, DepositInput, DepositRequest, FocusSide, PairAmounts, QuoteResult, QuoteView,
};
use crate::pool::calc::{self, QuoteError, QuotePair};
use crate::pool::{PoolId, ReserveSnapshot};
use crate::quote::focus::FocusTracker;
use crate::quote::validator::{self, Balances, ValidationVerdict};

/// A quote to run off the event loop.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub generation: u64,
    pub side: FocusSide,
    pub raw_amount: String,
    pub snapshot: Arc<ReserveSnapshot>,
}

impl QuoteRequest {
    /// Run the pure quote. A degenerate pool resolves to the empty quote.
    pub fn execute(&self) -> QuoteResult {
        let pair = match calc::quote(&self.snapshot, self.side, &self.raw_amount) {
            Ok(pair) => pair,
            Err(QuoteError::DegeneratePool) => {
                debug!(
                    as_of = self.snapshot.as_of,
                    "[QUOTE] degenerate pool, quoting empty"
                );
                QuotePair::empty()
            }
        };
        QuoteResult {
            side: self.side,
            derived_amount: pair.derived_amount,
            minted_shares: pair.minted_shares,
            for_generation: self.generation,
            for_snapshot_as_of: self.snapshot.as_of,
        }
    }
}

#[derive(Debug)]
pub struct RecomputeCoordinator {
    pool: Option<PoolId>,
    pool_not_found: bool,
    snapshot: Option<Arc<ReserveSnapshot>>,
    amounts: PairAmounts,
    minted_shares: BigDecimal,
    focus: FocusTracker,
    generation: u64,
    state: CoordinatorState,
}

impl RecomputeCoordinator {
    pub fn new(pool: Option<PoolId>) -> Self {
        Self {
            pool,
            pool_not_found: false,
            snapshot: None,
            amounts: PairAmounts::default(),
            minted_shares: BigDecimal::zero(),
            focus: FocusTracker::default(),
            generation: 0,
            state: CoordinatorState::Idle,
        }
    }

    pub fn pool(&self) -> Option<&PoolId> {
        self.pool.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn amounts(&self) -> &PairAmounts {
        &self.amounts
    }

    pub fn minted_shares(&self) -> &BigDecimal {
        &self.minted_shares
    }

    pub fn snapshot(&self) -> Option<&ReserveSnapshot> {
        self.snapshot.as_deref()
    }

    pub fn current_input(&self) -> DepositInput {
        let side = self.focus.current();
        DepositInput {
            side,
            raw_amount: self.amounts.get(side).to_owned(),
            generation: self.generation,
        }
    }

    /// Store the keystroke, make `side` the driving side and requote.
    pub fn on_amount_edited(&mut self, side: FocusSide, raw_amount: &str) -> Option<QuoteRequest> {
        self.amounts.set(side, raw_amount);
        self.focus.on_focus(side);
        self.issue()
    }

    pub fn on_focus_changed(&mut self, side: FocusSide) {
        self.focus.on_focus(side);
    }

    /// Accept a fresher snapshot for the active pool and requote against it.
    pub fn on_snapshot(&mut self, snapshot: ReserveSnapshot) -> Option<QuoteRequest> {
        if self.pool.as_ref() != Some(&snapshot.pool_id) {
            debug!(pool = %snapshot.pool_id, "[POOL] snapshot for inactive pool ignored");
            return None;
        }
        if let Some(held) = &self.snapshot {
            if snapshot.as_of <= held.as_of {
                debug!(
                    held = held.as_of,
                    received = snapshot.as_of,
                    "[POOL] superseded snapshot ignored"
                );
                return None;
            }
        }
        self.pool_not_found = false;
        self.snapshot = Some(Arc::new(snapshot));
        self.issue()
    }

    /// Switch to another pool (or none). Pending quotes and amounts are dropped.
    pub fn on_pool_changed(&mut self, pool: Option<PoolId>) {
        self.pool = pool;
        self.pool_not_found = false;
        self.snapshot = None;
        self.clear_inputs();
    }

    /// The active pool no longer exists upstream. Repeated reports are no-ops
    /// so edits made meanwhile survive.
    pub fn on_pool_not_found(&mut self) {
        if self.pool_not_found {
            return;
        }
        self.pool_not_found = true;
        self.snapshot = None;
        self.clear_inputs();
    }

    pub fn is_pool_not_found(&self) -> bool {
        self.pool_not_found
    }

    /// The deposit went out; start over with empty fields.
    pub fn on_deposit_sent(&mut self) {
        self.clear_inputs();
    }

    /// Apply `result` if it is still current. Returns whether it was applied.
    pub fn on_quote_result(&mut self, result: QuoteResult) -> bool {
        let held_as_of = self.snapshot.as_ref().map(|s| s.as_of);
        if result.for_generation != self.generation
            || held_as_of != Some(result.for_snapshot_as_of)
        {
            debug!(
                result_generation = result.for_generation,
                current_generation = self.generation,
                "[QUOTE] stale result discarded"
            );
            return false;
        }

        self.amounts.set(result.side.other(), result.derived_amount);
        self.minted_shares = result.minted_shares;
        self.state = CoordinatorState::Applied(result.for_generation);
        true
    }

    pub fn verdict(&self, balances: &Balances) -> ValidationVerdict {
        validator::validate(&self.amounts, balances)
    }

    /// Amounts to submit: the fixed side truncated to its token's precision,
    /// the derived side raised by `slippage_bps`. Only available once the
    /// latest generation's quote is applied and the amounts validate.
    pub fn deposit_request(
        &self,
        balances: &Balances,
        slippage_bps: u32,
    ) -> Option<DepositRequest> {
        if self.state != CoordinatorState::Applied(self.generation) {
            return None;
        }
        if self.verdict(balances) != ValidationVerdict::Ok {
            return None;
        }
        let pool_id = self.pool.clone()?;
        let snapshot = self.snapshot.as_ref()?;

        let fixed = self.focus.current();
        let derived = fixed.other();

        let fixed_amount = calc::parse_amount(self.amounts.get(fixed))?;
        let fixed_raw = calc::to_smallest_units(&fixed_amount, snapshot.decimals(fixed));

        let derived_amount = calc::parse_amount(self.amounts.get(derived))?;
        let decimals = snapshot.decimals(derived);
        let derived_raw = calc::to_smallest_units(&derived_amount, decimals);
        let max_raw = calc::with_slippage(&derived_raw, slippage_bps);

        let mut submitted = PairAmounts::default();
        submitted.set(fixed, calc::format_units(&fixed_raw, snapshot.decimals(fixed)));
        submitted.set(derived, calc::format_units(&max_raw, decimals));
        Some(DepositRequest {
            pool_id,
            base_amount: submitted.base,
            quote_amount: submitted.quote,
            fixed_side: fixed,
        })
    }

    /// Read model for rendering.
    pub fn view(&self, balances: &Balances, slippage_bps: u32) -> QuoteView {
        QuoteView {
            base_amount: self.amounts.base.clone(),
            quote_amount: self.amounts.quote.clone(),
            minted_shares_estimate: self.minted_shares.clone(),
            verdict: self.verdict(balances),
            focus: self.focus.current(),
            state: self.state,
            snapshot_as_of: self.snapshot.as_ref().map(|s| s.as_of),
            pool_not_found: self.pool_not_found,
            exchange_rate: self
                .snapshot
                .as_ref()
                .and_then(|s| calc::exchange_rate(s, self.focus.current())),
            deposit: self.deposit_request(balances, slippage_bps),
        }
    }

    // ---------- internals ----------

    /// Bump the generation, then either resolve synchronously (empty driving
    /// amount, nothing to quote against) or hand out a request.
    fn issue(&mut self) -> Option<QuoteRequest> {
        self.generation += 1;
        let side = self.focus.current();
        let raw_amount = self.amounts.get(side).trim().to_owned();

        if raw_amount.is_empty() || self.pool_not_found {
            self.clear_derived(side);
            return None;
        }
        let Some(snapshot) = self.snapshot.clone() else {
            self.state = CoordinatorState::Idle;
            return None;
        };

        self.state = CoordinatorState::Computing(self.generation);
        Some(QuoteRequest {
            generation: self.generation,
            side,
            raw_amount,
            snapshot,
        })
    }

    fn clear_derived(&mut self, driving: FocusSide) {
        self.amounts.set(driving.other(), "");
        self.minted_shares = BigDecimal::zero();
        self.state = CoordinatorState::Idle;
    }

    fn clear_inputs(&mut self) {
        self.generation += 1;
        self.amounts.clear();
        self.minted_shares = BigDecimal::zero();
        self.state = CoordinatorState::Idle;
    }
}
