//! Transaction submission and outcome classification
//!
//! The submitter is the only component that talks to the ledger. It knows
//! nothing about HTTP or pub/sub: it hands back a [`TransactionOutcome`] and
//! each adapter applies its own policy (status code, or log and continue).

use crate::ledger::LedgerSession;
use crate::metrics::{TRANSACTIONS_TOTAL, TRANSACTION_DURATION};
use crate::types::{Operation, TransactionOutcome, TransactionRequest};
use crate::Error;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Submits transactions through the shared [`LedgerSession`]
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    session: LedgerSession,
}

impl TransactionSubmitter {
    /// Create a submitter over an established session
    pub fn new(session: LedgerSession) -> Self {
        Self { session }
    }

    /// Submit one transaction and classify the result
    pub async fn submit(&self, request: TransactionRequest) -> TransactionOutcome {
        let TransactionRequest {
            operation,
            arguments,
        } = request;
        let function = operation.function_name();
        let start = Instant::now();

        debug!(
            "Submitting {} transaction with {} argument(s)",
            function,
            arguments.len()
        );

        let outcome = match self.session.submit(function, &arguments).await {
            Ok(payload) => Self::parse_payload(&payload),
            Err(Error::Rejected(message)) => TransactionOutcome::RequestError(message),
            Err(e) => TransactionOutcome::TransportError(e.to_string()),
        };

        TRANSACTION_DURATION
            .with_label_values(&[operation.as_str()])
            .observe(start.elapsed().as_secs_f64());
        TRANSACTIONS_TOTAL
            .with_label_values(&[operation.as_str(), outcome.kind()])
            .inc();

        match &outcome {
            TransactionOutcome::Success(_) => info!("Submitted {} transaction", function),
            TransactionOutcome::RequestError(msg) => {
                warn!("Ledger rejected {} transaction: {}", function, msg)
            }
            TransactionOutcome::TransportError(msg) => {
                error!("Failed to submit {} transaction: {}", function, msg)
            }
        }

        outcome
    }

    /// Marshal JSON arguments and submit
    pub async fn submit_values(
        &self,
        operation: Operation,
        arguments: &[Value],
    ) -> TransactionOutcome {
        self.submit(TransactionRequest::from_values(operation, arguments))
            .await
    }

    fn parse_payload(payload: &[u8]) -> TransactionOutcome {
        if payload.is_empty() {
            return TransactionOutcome::Success(None);
        }

        match serde_json::from_slice::<Value>(payload) {
            Ok(value) => TransactionOutcome::Success(Some(value)),
            Err(e) => TransactionOutcome::RequestError(format!(
                "Ledger returned a payload that is not JSON: {}",
                e
            )),
        }
    }
}
