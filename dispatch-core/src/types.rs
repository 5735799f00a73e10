//! Core types: operations, transaction requests and their outcomes

use crate::marshal::marshal_arguments;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical patient-record operation
///
/// Every inbound event, regardless of channel, is reduced to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Insert a new record
    Add,
    /// Replace an existing record wholesale
    Replace,
    /// Merge fields into an existing record
    Update,
    /// Read a record by id
    Query,
}

impl Operation {
    /// All operations, in declaration order
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Replace,
        Operation::Update,
        Operation::Query,
    ];

    /// Short canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Replace => "replace",
            Operation::Update => "update",
            Operation::Query => "query",
        }
    }

    /// Name of the contract function invoked on the ledger
    pub fn function_name(&self) -> &'static str {
        match self {
            Operation::Add => "addPatient",
            Operation::Replace => "replacePatient",
            Operation::Update => "updatePatient",
            Operation::Query => "queryPatient",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transaction bound for the ledger
///
/// Built fresh for each inbound event and consumed by one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Operation to execute
    pub operation: Operation,

    /// Positional, already-marshalled arguments
    pub arguments: Vec<String>,
}

impl TransactionRequest {
    /// Create a request from arguments that are already strings
    pub fn new(operation: Operation, arguments: Vec<String>) -> Self {
        Self {
            operation,
            arguments,
        }
    }

    /// Create a request from arbitrary JSON arguments
    pub fn from_values(operation: Operation, arguments: &[Value]) -> Self {
        Self::new(operation, marshal_arguments(arguments))
    }
}

/// Result of submitting one [`TransactionRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// The ledger accepted the transaction. `None` when it returned no payload.
    Success(Option<Value>),

    /// The ledger rejected the transaction; the caller is at fault
    RequestError(String),

    /// The transaction could not be carried out; the system is at fault
    TransportError(String),
}

impl TransactionOutcome {
    /// Whether the transaction succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Success(_))
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionOutcome::Success(_) => "success",
            TransactionOutcome::RequestError(_) => "request_error",
            TransactionOutcome::TransportError(_) => "transport_error",
        }
    }
}
