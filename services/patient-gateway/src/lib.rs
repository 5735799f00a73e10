// Patient Gateway Service Library
// Exposes the REST adapter, bootstrap and configuration for the binary and tests

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod ledger_client;
pub mod metrics;
pub mod rest;

use dispatch_core::TransactionSubmitter;
use message_bus::EventIngress;

pub use config::Config;
pub use error::GatewayError;
pub use rest::router;

/// State shared by every REST handler
///
/// Only constructed once the ledger session exists, so a router holding it is
/// ready to serve.
#[derive(Clone)]
pub struct AppState {
    pub submitter: TransactionSubmitter,
    pub events: Option<EventIngress>,
}

impl AppState {
    pub fn new(submitter: TransactionSubmitter) -> Self {
        Self {
            submitter,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventIngress) -> Self {
        self.events = Some(events);
        self
    }
}
