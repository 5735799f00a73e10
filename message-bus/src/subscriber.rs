//! Subscription management and the per-server consumption loop
//!
//! Each configured server gets its own subscription and its own task. A
//! subscription moves through
//!
//! ```text
//! Connecting ──► Subscribed ──► ReceivingMessage* ──► Disconnected
//!      │
//!      └──► Failed
//! ```
//!
//! A message that fails (bad envelope, rejected or failed transaction) is
//! logged and the loop moves on; only the end of the message stream stops it.

use crate::client::ServerEntry;
use crate::envelope::EventEnvelope;
use crate::metrics::{
    ACTIVE_SUBSCRIPTIONS, MESSAGE_PROCESS_DURATION, MESSAGE_RECEIVE_TOTAL, SUBSCRIPTION_STATUS,
};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use dispatch_core::{
    Operation, OperationResolver, Resolution, TransactionOutcome, TransactionRequest,
    TransactionSubmitter, SUPPORTED_DATA_FORMAT,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Raw message payloads delivered by one subscription
pub type MessageStream = BoxStream<'static, Bytes>;

/// Something that can open a subscription on a server
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Connect to `server` and subscribe, returning its message stream
    async fn subscribe(&self, server: &ServerEntry) -> Result<MessageStream>;
}

/// Lifecycle state of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Establishing the connection and subscription
    Connecting,
    /// Subscribed and waiting for messages
    Subscribed,
    /// Handling a message
    ReceivingMessage,
    /// The message stream ended
    Disconnected,
    /// The subscription could not be established
    Failed,
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionState::Connecting => "connecting",
            SubscriptionState::Subscribed => "subscribed",
            SubscriptionState::ReceivingMessage => "receiving",
            SubscriptionState::Disconnected => "disconnected",
            SubscriptionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    /// Transaction submitted and accepted
    Submitted(Operation),
    /// Ledger rejected the transaction
    Rejected(String),
    /// Transaction could not be carried out
    TransportFailed(String),
    /// Envelope declared a data format the gateway does not handle
    UnsupportedFormat(String),
    /// Operation hint not recognised under the skip policy
    UnknownOperation(String),
    /// Envelope or payload could not be decoded
    Malformed(String),
}

impl MessageDisposition {
    /// Stable label for logs and metrics
    pub fn status(&self) -> &'static str {
        match self {
            MessageDisposition::Submitted(_) => "submitted",
            MessageDisposition::Rejected(_) => "rejected",
            MessageDisposition::TransportFailed(_) => "transport_error",
            MessageDisposition::UnsupportedFormat(_) => "unsupported_format",
            MessageDisposition::UnknownOperation(_) => "unknown_operation",
            MessageDisposition::Malformed(_) => "malformed",
        }
    }

    /// Whether a transaction was attempted and did not succeed
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            MessageDisposition::Rejected(_)
                | MessageDisposition::TransportFailed(_)
                | MessageDisposition::Malformed(_)
        )
    }
}

/// Summary returned when a subscription's stream ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionEnd {
    /// Server the subscription was bound to
    pub server: ServerEntry,
    /// Final state (always [`SubscriptionState::Disconnected`])
    pub state: SubscriptionState,
    /// Messages whose transaction succeeded
    pub submitted: u64,
    /// Messages that failed
    pub failed: u64,
    /// Messages skipped without a transaction
    pub skipped: u64,
}

/// A running subscription
#[derive(Debug)]
pub struct SubscriptionHandle {
    /// Server the subscription is bound to
    pub server: ServerEntry,
    /// Task running the consumption loop
    pub task: JoinHandle<SubscriptionEnd>,
}

/// Pub/sub ingress adapter
///
/// Cheap to clone; clones share the submitter and the active-subscription count.
#[derive(Debug, Clone)]
pub struct EventIngress {
    submitter: TransactionSubmitter,
    resolver: OperationResolver,
    active: Arc<AtomicUsize>,
}

impl EventIngress {
    /// Create an ingress adapter
    pub fn new(submitter: TransactionSubmitter, resolver: OperationResolver) -> Self {
        Self {
            submitter,
            resolver,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of subscriptions currently consuming
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Subscribe on every server and spawn one consumption loop per subscription
    ///
    /// A server that cannot be subscribed is logged and skipped; the remaining
    /// servers are still attempted. Deciding what to do when none succeed is
    /// left to the caller.
    pub async fn start<S>(&self, source: &S, servers: &[ServerEntry]) -> Vec<SubscriptionHandle>
    where
        S: EventSource + ?Sized,
    {
        let mut handles = Vec::with_capacity(servers.len());

        for server in servers {
            debug!("Subscription {}: {}", server, SubscriptionState::Connecting);

            match source.subscribe(server).await {
                Ok(stream) => {
                    info!("Subscription {}: {}", server, SubscriptionState::Subscribed);
                    SUBSCRIPTION_STATUS
                        .with_label_values(&[server.label(), "subscribed"])
                        .inc();

                    let ingress = self.clone();
                    let entry = server.clone();
                    let task =
                        tokio::spawn(async move { ingress.run_subscription(entry, stream).await });

                    handles.push(SubscriptionHandle {
                        server: server.clone(),
                        task,
                    });
                }
                Err(e) => {
                    error!(
                        "Subscription {}: {} ({})",
                        server,
                        SubscriptionState::Failed,
                        e
                    );
                    SUBSCRIPTION_STATUS
                        .with_label_values(&[server.label(), "failed"])
                        .inc();
                }
            }
        }

        info!(
            "Started {}/{} subscriptions",
            handles.len(),
            servers.len()
        );

        handles
    }

    /// Consume `stream` until it ends
    ///
    /// Each message is fully processed, including awaiting its transaction,
    /// before the next one is received.
    pub async fn run_subscription(
        &self,
        server: ServerEntry,
        mut stream: MessageStream,
    ) -> SubscriptionEnd {
        let mut end = SubscriptionEnd {
            server,
            state: SubscriptionState::Subscribed,
            submitted: 0,
            failed: 0,
            skipped: 0,
        };
        let label = end.server.label().to_string();

        self.active.fetch_add(1, Ordering::SeqCst);
        ACTIVE_SUBSCRIPTIONS.inc();
        info!("🔄 Consumer for {} started", label);

        while let Some(payload) = stream.next().await {
            debug!("Subscription {}: {}", label, SubscriptionState::ReceivingMessage);
            let start = Instant::now();

            let disposition = self.process_message(&payload).await;

            MESSAGE_PROCESS_DURATION
                .with_label_values(&[label.as_str()])
                .observe(start.elapsed().as_secs_f64());
            MESSAGE_RECEIVE_TOTAL
                .with_label_values(&[label.as_str(), disposition.status()])
                .inc();

            match &disposition {
                MessageDisposition::Submitted(_) => end.submitted += 1,
                d if d.is_failure() => end.failed += 1,
                _ => end.skipped += 1,
            }
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        ACTIVE_SUBSCRIPTIONS.dec();
        SUBSCRIPTION_STATUS
            .with_label_values(&[label.as_str(), "disconnected"])
            .inc();

        end.state = SubscriptionState::Disconnected;
        error!(
            "⚠️ Subscription {} ended ({} submitted, {} failed, {} skipped)",
            label, end.submitted, end.failed, end.skipped
        );

        end
    }

    /// Decode, resolve and submit a single message
    pub async fn process_message(&self, payload: &[u8]) -> MessageDisposition {
        let envelope = match EventEnvelope::from_bytes(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Formats we do not handle are skipped whatever shape they arrive in
                if let Some(format) = EventEnvelope::declared_format(payload)
                    .filter(|format| format.as_str() != SUPPORTED_DATA_FORMAT)
                {
                    info!("Skipping event: unsupported data format {}", format);
                    return MessageDisposition::UnsupportedFormat(format);
                }

                error!("Failed to parse event envelope: {}", e);
                return MessageDisposition::Malformed(e.to_string());
            }
        };

        let operation = match self
            .resolver
            .resolve_event(&envelope.operation, &envelope.data_format)
        {
            Resolution::Resolved(op) => op,
            Resolution::UnsupportedFormat(format) => {
                info!(
                    "Skipping event {}: unsupported data format {}",
                    envelope.uuid, format
                );
                return MessageDisposition::UnsupportedFormat(format);
            }
            Resolution::UnknownOperation(hint) => {
                warn!(
                    "Skipping event {}: unrecognised operation {:?}",
                    envelope.uuid, hint
                );
                return MessageDisposition::UnknownOperation(hint);
            }
        };

        let record = match envelope.decode_payload() {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to decode payload of event {}: {}", envelope.uuid, e);
                return MessageDisposition::Malformed(e.to_string());
            }
        };

        debug!("Event {} resolved to {}", envelope.uuid, operation);

        let request = TransactionRequest::new(operation, vec![envelope.uuid.clone(), record]);
        match self.submitter.submit(request).await {
            TransactionOutcome::Success(_) => {
                info!("✅ Event {} applied as {}", envelope.uuid, operation);
                MessageDisposition::Submitted(operation)
            }
            TransactionOutcome::RequestError(msg) => {
                error!("❌ Event {} rejected by ledger: {}", envelope.uuid, msg);
                MessageDisposition::Rejected(msg)
            }
            TransactionOutcome::TransportError(msg) => {
                error!("❌ Event {} could not be submitted: {}", envelope.uuid, msg);
                MessageDisposition::TransportFailed(msg)
            }
        }
    }
}
