// Patient Gateway Service - entry point
// Establishes the ledger session, starts event ingress, then serves REST over HTTPS

use anyhow::Context;
use axum_server::tls_rustls::RustlsConfig;
use dispatch_core::{OperationResolver, TransactionSubmitter};
use message_bus::{EventIngress, NatsEventSource, SubscriptionHandle};
use patient_gateway::config::LoggingConfig;
use patient_gateway::{bootstrap, router, AppState, Config};
use std::net::SocketAddr;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_line_number(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// Log when a subscription's stream ends; resubscribing is left to the operator
async fn watch_subscription(handle: SubscriptionHandle) {
    match handle.task.await {
        Ok(end) => warn!(
            "Subscription {} is {}; {} submitted, {} failed, {} skipped",
            end.server, end.state, end.submitted, end.failed, end.skipped
        ),
        Err(e) => error!("Subscription {} task aborted: {}", handle.server, e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.logging);
    config.validate().map_err(anyhow::Error::msg)?;

    info!("🚀 Starting Patient Gateway Service");

    // Ledger session must exist before anything can submit
    let session = bootstrap::connect(&config.ledger).await.map_err(|e| {
        error!("Failed to establish the ledger session: {}", e);
        e
    })?;
    let submitter = TransactionSubmitter::new(session);
    let mut state = AppState::new(submitter.clone());

    if config.events.enabled {
        let ingress = EventIngress::new(
            submitter,
            OperationResolver::new(config.events.unknown_operation),
        );
        let source = NatsEventSource::new(config.events.nats.clone());

        info!(
            "Subscribing to {} on {} server(s)",
            config.events.nats.subject,
            source.servers().len()
        );
        let handles = ingress.start(&source, source.servers()).await;
        if handles.is_empty() {
            anyhow::bail!("No event subscription could be established");
        }

        for handle in handles {
            tokio::spawn(watch_subscription(handle));
        }
        state = state.with_events(ingress);
    } else {
        info!("Event ingress disabled");
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    info!("   GET   /patient?id=<id> - Query patient");
    info!("   POST  /patient - Add patient");
    info!("   PUT   /patient - Replace patient");
    info!("   PATCH /patient - Update patient");
    info!("   GET   /health - Readiness");
    info!("   GET   /metrics - Prometheus metrics");

    if config.server.tls_enabled {
        let tls = RustlsConfig::from_pem_file(&config.server.tls_cert_path, &config.server.tls_key_path)
            .await
            .context("Failed to load TLS certificate and key")?;

        info!("✅ Gateway listening on: https://{}", addr);
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
    } else {
        warn!("TLS disabled, serving plain HTTP");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("✅ Gateway listening on: http://{}", addr);
        axum::serve(listener, app).await?;
    }

    Ok(())
}
