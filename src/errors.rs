use thiserror::Error;

use crate::pool::PoolId;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Parse integer error: {0}")]
    ParseBigInt(#[from] num_bigint::ParseBigIntError),

    #[error("Parse decimal error: {0}")]
    ParseDecimal(#[from] bigdecimal::ParseBigDecimalError),

    #[error("Pool not found: {0}")]
    PoolNotFound(PoolId),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Quote service is no longer running")]
    ServiceClosed,
}
