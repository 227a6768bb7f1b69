//! Deposit-quote state: focus, recomputation and balance checks.

pub mod coordinator;
pub mod focus;
pub mod validator;

pub use coordinator::{QuoteRequest, RecomputeCoordinator};
pub use focus::FocusTracker;
pub use validator::{Balances, ValidationVerdict, validate};
