//! Proportional liquidity-quote engine for two-asset pools.
//!
//! Given a reserve snapshot and one side of a deposit, the engine derives the
//! counterpart amount and the LP shares the deposit would mint, and keeps
//! that quote current while the user edits and reserves refresh.

pub mod config;
pub mod errors;
pub mod models;
pub mod pool;
pub mod quote;
pub mod scheduler;
pub mod service;
pub mod utils;
