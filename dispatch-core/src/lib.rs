//! Patient Gateway Dispatch Core
//!
//! Turns inbound patient-record operations into ledger transactions.
//!
//! # Architecture
//!
//! - **Marshalling**: heterogeneous JSON arguments become the string-only
//!   argument list the ledger's transaction interface accepts
//! - **Resolution**: HTTP methods and event hints map onto four operations
//! - **Submission**: one shared [`LedgerSession`] executes every transaction
//!   and each result is classified as success, request error or transport error
//!
//! Both ingress adapters (REST and pub/sub) depend only on the
//! [`TransactionSubmitter`]; neither knows how the other reports failures.
//!
//! # Invariants
//!
//! - Exactly one ledger session exists per process; it is never replaced
//! - A marshalled argument list has the same length and order as its input
//! - Every submission produces exactly one [`TransactionOutcome`]

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod error;
pub mod ledger;
pub mod marshal;
pub mod metrics;
pub mod resolver;
pub mod submitter;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use ledger::{LedgerClient, LedgerSession};
pub use marshal::marshal_arguments;
pub use resolver::{OperationResolver, Resolution, UnknownHintPolicy, SUPPORTED_DATA_FORMAT};
pub use submitter::TransactionSubmitter;
pub use types::{Operation, TransactionOutcome, TransactionRequest};
