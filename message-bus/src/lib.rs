//! Message Bus: pub/sub ingress for patient-record events
//!
//! Provides event consumption with:
//! - One NATS subscription per configured server (nkey auth, pinned root CA)
//! - Envelope decoding and operation resolution
//! - Per-message fault isolation: a failed submission never stops a loop
//! - Observability via Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod envelope;
pub mod error;
pub mod metrics;
pub mod subscriber;

pub use client::{NatsConfig, NatsCredentials, NatsEventSource, ServerEntry};
pub use envelope::EventEnvelope;
pub use error::{Error, Result};
pub use subscriber::{
    EventIngress, EventSource, MessageDisposition, MessageStream, SubscriptionEnd,
    SubscriptionHandle, SubscriptionState,
};
