//! Ledger client capability and the shared session handle
//!
//! How a session is bootstrapped (identities, channel and contract binding)
//! is left to the process; the dispatch core only needs something that can
//! submit a named transaction with string arguments.

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Backend ledger able to execute named transactions
///
/// Implementations must be safe for concurrent shared use; the gateway does no
/// locking of its own. Return [`crate::Error::Rejected`] when the ledger
/// executed the transaction and refused it, and any other error for failures
/// to carry it out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit `function` with positional `args`, returning the raw response payload
    async fn submit(&self, function: &str, args: &[String]) -> Result<Vec<u8>>;
}

/// The process-wide handle to the ledger contract
///
/// Created once at startup and cloned into every adapter. It exposes no way to
/// swap the underlying client.
#[derive(Clone)]
pub struct LedgerSession {
    client: Arc<dyn LedgerClient>,
}

impl LedgerSession {
    /// Wrap an established client
    pub fn new<C>(client: C) -> Self
    where
        C: LedgerClient + 'static,
    {
        Self {
            client: Arc::new(client),
        }
    }

    /// Submit a transaction through the underlying client
    pub async fn submit(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        self.client.submit(function, args).await
    }
}

impl fmt::Debug for LedgerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerSession").finish_non_exhaustive()
    }
}
