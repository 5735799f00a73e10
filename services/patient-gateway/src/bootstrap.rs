//! Ledger session bootstrap
//!
//! Loads the configured user's identity from the file-system wallet and
//! builds the one [`LedgerSession`] the process shares. Failures are returned
//! to the caller; the entry point decides whether to exit.

use crate::config::LedgerConfig;
use crate::ledger_client::HttpLedgerClient;
use dispatch_core::LedgerSession;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const X509_IDENTITY: &str = "X.509";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("An identity for the user {0} does not exist in the wallet {1}")]
    MissingIdentity(String, PathBuf),

    #[error("Identity for {0} is invalid: {1}")]
    InvalidIdentity(String, String),

    #[error("Wallet error: {0}")]
    Wallet(#[from] std::io::Error),

    #[error("Ledger client error: {0}")]
    Client(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityCredentials {
    pub certificate: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

/// A wallet entry: an enrolled X.509 identity
#[derive(Debug, Clone, Deserialize)]
pub struct WalletIdentity {
    pub credentials: IdentityCredentials,
    #[serde(rename = "mspId")]
    pub msp_id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Directory of identity files, one `<label>.id` per user
#[derive(Debug, Clone)]
pub struct Wallet {
    root: PathBuf,
}

impl Wallet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Look up `label`, returning `None` when the wallet has no such identity
    pub async fn get(&self, label: &str) -> Result<Option<WalletIdentity>, BootstrapError> {
        let file = self.root.join(format!("{}.id", label));

        let raw = match tokio::fs::read(&file).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let identity: WalletIdentity = serde_json::from_slice(&raw)
            .map_err(|e| BootstrapError::InvalidIdentity(label.to_string(), e.to_string()))?;

        if identity.kind != X509_IDENTITY {
            return Err(BootstrapError::InvalidIdentity(
                label.to_string(),
                format!("unsupported identity type {}", identity.kind),
            ));
        }

        Ok(Some(identity))
    }
}

/// Load the configured identity from the wallet
pub async fn load_identity(config: &LedgerConfig) -> Result<WalletIdentity, BootstrapError> {
    let wallet = Wallet::new(&config.wallet_location);
    info!("Wallet path: {}", wallet.path().display());

    wallet.get(&config.user_name).await?.ok_or_else(|| {
        BootstrapError::MissingIdentity(config.user_name.clone(), wallet.path().to_path_buf())
    })
}

/// Establish the shared ledger session
pub async fn connect(config: &LedgerConfig) -> Result<LedgerSession, BootstrapError> {
    let identity = load_identity(config).await?;
    let client = HttpLedgerClient::new(config, &identity)?;

    info!(
        "🔗 Ledger session ready: {} as {} ({}) on {}/{}",
        config.endpoint, config.user_name, identity.msp_id, config.channel, config.contract
    );

    Ok(LedgerSession::new(client))
}
