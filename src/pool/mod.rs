//! Pool data and the pure quote math.

pub mod calc;
pub mod source;
pub mod state;

pub use calc::{QuoteError, QuotePair, exchange_rate, quote};
pub use source::{FileSnapshotSource, SnapshotSource};
pub use state::{PoolId, ReserveSnapshot};
