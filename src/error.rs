//! Error taxonomy.
//!
//! Only two kinds of failure ever leave the engine as `Err`:
//!
//! - input the caller must fix (`Input`, `InvalidPath`, `Config`)
//! - collaborator failures (`Infrastructure`), which must reach the caller
//!   because an unreachable catalog is not the same thing as "nothing matched"
//!
//! A conflict veto is a normal [`Decision`](crate::Decision) with
//! `can_save == false`, never an error.

use thiserror::Error;

/// Failure reported by a store or sink collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("write rejected: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("invalid category path: {0}")]
    InvalidPath(String),

    #[error("infrastructure failure: {0}")]
    Infrastructure(#[from] StoreError),

    #[error("invalid configuration for {field}: '{value}' ({reason})")]
    Config { field: String, value: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
