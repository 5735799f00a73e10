//! NATS connection setup for event ingress

use crate::subscriber::{EventSource, MessageStream};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// One NATS server to subscribe on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Server URL (`tls://host:4222` or `nats://host:4222`)
    pub url: String,

    /// Label used in logs and metrics; defaults to the URL
    #[serde(default)]
    pub name: Option<String>,
}

impl ServerEntry {
    /// Create an entry for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
        }
    }

    /// Label for logs and metrics
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

impl fmt::Display for ServerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key-based credentials and the pinned trust anchor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsCredentials {
    /// File holding the nkey seed (`SU...`)
    pub nkey_seed_path: PathBuf,

    /// PEM root certificate the servers must chain to
    pub root_cert_path: PathBuf,
}

impl NatsCredentials {
    /// Read the nkey seed, trimming surrounding whitespace
    pub async fn load_seed(&self) -> Result<String> {
        let seed = tokio::fs::read_to_string(&self.nkey_seed_path)
            .await
            .map_err(|e| {
                Error::Credentials(format!(
                    "cannot read nkey seed {}: {}",
                    self.nkey_seed_path.display(),
                    e
                ))
            })?;

        let seed = seed.trim();
        if seed.is_empty() {
            return Err(Error::Credentials(format!(
                "nkey seed file {} is empty",
                self.nkey_seed_path.display()
            )));
        }

        Ok(seed.to_string())
    }
}

/// Event ingress configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Servers to subscribe on, one subscription each
    pub servers: Vec<ServerEntry>,

    /// Subject carrying patient-record envelopes
    pub subject: String,

    /// Credentials shared by every server
    pub credentials: NatsCredentials,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Client name reported to the servers
    pub client_name: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec![ServerEntry::new("tls://localhost:4222")],
            subject: "patient.records".to_string(),
            credentials: NatsCredentials {
                nkey_seed_path: PathBuf::from("./conf/nats/gateway.nk"),
                root_cert_path: PathBuf::from("./conf/nats/ca.pem"),
            },
            connect_timeout_secs: 10,
            client_name: "patient-gateway".to_string(),
        }
    }
}

/// Production [`EventSource`] backed by NATS
#[derive(Debug, Clone)]
pub struct NatsEventSource {
    config: NatsConfig,
}

impl NatsEventSource {
    /// Create a source for `config`
    pub fn new(config: NatsConfig) -> Self {
        Self { config }
    }

    /// Configured servers
    pub fn servers(&self) -> &[ServerEntry] {
        &self.config.servers
    }

    async fn connect(&self, server: &ServerEntry) -> Result<async_nats::Client> {
        let seed = self.config.credentials.load_seed().await?;

        debug!(
            "Connecting to {} with root certificate {}",
            server,
            self.config.credentials.root_cert_path.display()
        );

        async_nats::ConnectOptions::with_nkey(seed)
            .add_root_certificates(self.config.credentials.root_cert_path.clone())
            .require_tls(true)
            .connection_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .name(&self.config.client_name)
            .connect(server.url.as_str())
            .await
            .map_err(|e| Error::Connection(format!("{}: {}", server, e)))
    }
}

#[async_trait]
impl EventSource for NatsEventSource {
    async fn subscribe(&self, server: &ServerEntry) -> Result<MessageStream> {
        let client = self.connect(server).await?;
        info!("✅ Connected to NATS: {}", server);

        let subscriber = client
            .subscribe(self.config.subject.clone())
            .await
            .map_err(|e| Error::Subscribe(format!("{}: {}", server, e)))?;

        info!("📡 Subscribed to {} on {}", self.config.subject, server);

        // The stream owns the client so the connection lives as long as the loop
        Ok(subscriber
            .map(move |msg| {
                let _connection = &client;
                msg.payload
            })
            .boxed())
    }
}
