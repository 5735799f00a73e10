//! Error types for ledger submission

use thiserror::Error;

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Dispatch errors
#[derive(Error, Debug)]
pub enum Error {
    /// The ledger executed the transaction and rejected it (contract logic,
    /// validation, missing record). Attributed to the caller.
    #[error("{0}")]
    Rejected(String),

    /// The ledger could not be reached or answered outside its contract
    #[error("Transport error: {0}")]
    Transport(String),
}
