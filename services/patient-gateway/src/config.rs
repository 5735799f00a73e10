use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use dispatch_core::UnknownHintPolicy;
use message_bus::{NatsConfig, ServerEntry};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls_enabled: bool,
    pub tls_cert_path: PathBuf,
    pub tls_key_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LedgerConfig {
    pub endpoint: String,
    pub channel: String,
    pub contract: String,
    pub user_name: String,
    pub wallet_location: PathBuf,
    pub timeout_secs: u64,
    pub tls_ca_cert_path: Option<PathBuf>, // Pinned ledger CA, system roots otherwise
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EventsConfig {
    pub enabled: bool,
    pub unknown_operation: UnknownHintPolicy,
    pub nats: NatsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = Self::defaults()?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("PATIENT_GATEWAY").separator("__"),
        );

        // Special handling for common env vars
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(endpoint) = env::var("LEDGER_ENDPOINT") {
            builder = builder.set_override("ledger.endpoint", endpoint)?;
        }

        let mut config: Config = builder.build()?.try_deserialize()?;

        if let Ok(servers) = env::var("NATS_SERVERS") {
            config.events.nats.servers = parse_server_list(&servers);
        }

        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let nats = NatsConfig::default();

        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .set_default("server.tls_enabled", true)?
            .set_default("server.tls_cert_path", "./conf/tls/server.crt")?
            .set_default("server.tls_key_path", "./conf/tls/server.key")?
            .set_default("ledger.endpoint", "https://localhost:7443")?
            .set_default("ledger.channel", "mychannel")?
            .set_default("ledger.contract", "patient")?
            .set_default("ledger.user_name", "appUser")?
            .set_default("ledger.wallet_location", "./wallet")?
            .set_default("ledger.timeout_secs", 30)?
            .set_default("events.enabled", true)?
            .set_default("events.unknown_operation", "add")?
            .set_default("events.nats.servers", Vec::<String>::new())?
            .set_default("events.nats.subject", nats.subject)?
            .set_default(
                "events.nats.credentials.nkey_seed_path",
                nats.credentials.nkey_seed_path.to_string_lossy().to_string(),
            )?
            .set_default(
                "events.nats.credentials.root_cert_path",
                nats.credentials.root_cert_path.to_string_lossy().to_string(),
            )?
            .set_default("events.nats.connect_timeout_secs", nats.connect_timeout_secs)?
            .set_default("events.nats.client_name", nats.client_name)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.tls_enabled
            && (self.server.tls_cert_path.as_os_str().is_empty()
                || self.server.tls_key_path.as_os_str().is_empty())
        {
            return Err("TLS certificate and key paths are required when TLS is enabled".to_string());
        }

        if self.ledger.endpoint.is_empty() {
            return Err("Ledger endpoint is required".to_string());
        }

        if self.ledger.channel.is_empty() || self.ledger.contract.is_empty() {
            return Err("Ledger channel and contract are required".to_string());
        }

        if self.ledger.user_name.is_empty() {
            return Err("Ledger user name is required".to_string());
        }

        if self.events.enabled {
            if self.events.nats.servers.is_empty() {
                return Err("At least one NATS server is required when events are enabled".to_string());
            }

            if self.events.nats.subject.is_empty() {
                return Err("NATS subject is required".to_string());
            }
        }

        Ok(())
    }
}

/// Parse a comma-separated list of server URLs
pub fn parse_server_list(raw: &str) -> Vec<ServerEntry> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ServerEntry::new)
        .collect()
}
