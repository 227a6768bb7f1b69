use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use num_bigint::BigInt;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{AppError, Result};
use crate::pool::state::{PoolId, ReserveSnapshot};

/// Producer of reserve snapshots; the polling transport lives behind it.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch_reserve_snapshot(
        &self,
        pool: &PoolId,
    ) -> impl Future<Output = Result<ReserveSnapshot>> + Send;
}

/// On-disk shape of a pool observation. Integers travel as decimal strings.
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    pool_id: String,
    base_reserve: String,
    quote_reserve: String,
    lp_supply: String,
    base_decimals: u8,
    quote_decimals: u8,
    lp_decimals: u8,
}

impl SnapshotFile {
    fn into_snapshot(self, as_of: u64) -> Result<ReserveSnapshot> {
        let snapshot = ReserveSnapshot {
            pool_id: PoolId::new(self.pool_id),
            base_reserve: BigInt::from_str(self.base_reserve.trim())?,
            quote_reserve: BigInt::from_str(self.quote_reserve.trim())?,
            lp_supply: BigInt::from_str(self.lp_supply.trim())?,
            base_decimals: self.base_decimals,
            quote_decimals: self.quote_decimals,
            lp_decimals: self.lp_decimals,
            as_of,
        };
        snapshot.check().map_err(AppError::InvalidSnapshot)?;
        Ok(snapshot)
    }
}

/// Reads the pool state from a JSON file on every fetch, so an external
/// process can keep the file current.
#[derive(Debug)]
pub struct FileSnapshotSource {
    path: PathBuf,
    sequence: AtomicU64,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sequence: AtomicU64::new(0),
        }
    }

    fn parse(&self, pool: &PoolId, raw: &str) -> Result<ReserveSnapshot> {
        let file: SnapshotFile = serde_json::from_str(raw)?;
        if file.pool_id != pool.as_str() {
            return Err(AppError::PoolNotFound(pool.clone()));
        }
        let as_of = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        file.into_snapshot(as_of)
    }
}

impl SnapshotSource for FileSnapshotSource {
    async fn fetch_reserve_snapshot(&self, pool: &PoolId) -> Result<ReserveSnapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let snapshot = self.parse(pool, &raw)?;
        debug!(pool = %pool, as_of = snapshot.as_of, "[POOL] snapshot read");
        Ok(snapshot)
    }
}
