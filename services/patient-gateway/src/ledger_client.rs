use crate::bootstrap::{BootstrapError, WalletIdentity};
use crate::config::LedgerConfig;
use async_trait::async_trait;
use dispatch_core::{Error, LedgerClient, Result};
use reqwest::{Certificate, Client, Identity, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct SubmitTransactionRequest<'a> {
    function: &'a str,
    args: &'a [String],
}

/// Ledger client speaking to the contract's HTTPS gateway
///
/// Authenticates with the wallet identity as the TLS client certificate.
pub struct HttpLedgerClient {
    client: Client,
    transactions_url: String,
    msp_id: String,
}

impl HttpLedgerClient {
    pub fn new(config: &LedgerConfig, identity: &WalletIdentity) -> std::result::Result<Self, BootstrapError> {
        let pem = format!(
            "{}\n{}",
            identity.credentials.private_key.trim(),
            identity.credentials.certificate.trim()
        );
        let tls_identity = Identity::from_pem(pem.as_bytes())
            .map_err(|e| BootstrapError::InvalidIdentity(config.user_name.clone(), e.to_string()))?;

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .identity(tls_identity);

        if let Some(ca_path) = &config.tls_ca_cert_path {
            let ca = std::fs::read(ca_path).map_err(|e| {
                BootstrapError::Client(format!("cannot read ledger CA {}: {}", ca_path.display(), e))
            })?;
            let ca = Certificate::from_pem(&ca).map_err(|e| BootstrapError::Client(e.to_string()))?;
            builder = builder.add_root_certificate(ca);
        }

        let client = builder
            .build()
            .map_err(|e| BootstrapError::Client(e.to_string()))?;

        Ok(Self::with_client(
            client,
            &config.endpoint,
            &config.channel,
            &config.contract,
            &identity.msp_id,
        ))
    }

    /// Build on an existing HTTP client
    pub fn with_client(
        client: Client,
        endpoint: &str,
        channel: &str,
        contract: &str,
        msp_id: &str,
    ) -> Self {
        let transactions_url = format!(
            "{}/channels/{}/contracts/{}/transactions",
            endpoint.trim_end_matches('/'),
            channel,
            contract
        );

        HttpLedgerClient {
            client,
            transactions_url,
            msp_id: msp_id.to_string(),
        }
    }

    pub fn transactions_url(&self) -> &str {
        &self.transactions_url
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        debug!("Submitting {} to {}", function, self.transactions_url);

        let response = self
            .client
            .post(&self.transactions_url)
            .header("X-Msp-Id", &self.msp_id)
            .json(&SubmitTransactionRequest { function, args })
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;
            return Ok(body.to_vec());
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => format!("<unreadable body: {}>", e),
        };

        if is_rejection(status) {
            let message = if text.is_empty() {
                status.to_string()
            } else {
                text
            };
            Err(Error::Rejected(message))
        } else {
            Err(Error::Transport(format!("ledger responded {}: {}", status, text)))
        }
    }
}

/// Whether a non-success status means the ledger refused the request itself
///
/// Authentication, proxy, timeout and rate-limit statuses are about the
/// gateway's own link to the ledger, not the caller's request.
fn is_rejection(status: StatusCode) -> bool {
    status.is_client_error()
        && !matches!(
            status,
            StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::PROXY_AUTHENTICATION_REQUIRED
                | StatusCode::REQUEST_TIMEOUT
                | StatusCode::TOO_MANY_REQUESTS
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Json, http::StatusCode as ServerStatus, routing::post, Router};
    use serde_json::Value;

    async fn transactions(Json(body): Json<Value>) -> (ServerStatus, String) {
        let function = body["function"].as_str().unwrap_or_default();
        let first = body["args"][0].as_str().unwrap_or_default().to_string();

        match function {
            "queryPatient" => (ServerStatus::OK, format!(r#"{{"id":"{}"}}"#, first)),
            "addPatient" => (ServerStatus::BAD_REQUEST, format!("patient {} already exists", first)),
            "updatePatient" => (ServerStatus::OK, String::new()),
            "forbiddenPatient" => (ServerStatus::FORBIDDEN, "identity not authorised".to_string()),
            "throttledPatient" => (ServerStatus::TOO_MANY_REQUESTS, String::new()),
            _ => (ServerStatus::BAD_GATEWAY, "endorsement failed".to_string()),
        }
    }

    async fn spawn_ledger() -> HttpLedgerClient {
        let app = Router::new().route(
            "/channels/mychannel/contracts/patient/transactions",
            post(transactions),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        HttpLedgerClient::with_client(
            Client::new(),
            &format!("http://{}/", addr),
            "mychannel",
            "patient",
            "Org1MSP",
        )
    }

    #[test]
    fn test_transactions_url() {
        let client = HttpLedgerClient::with_client(
            Client::new(),
            "https://ledger:7443/",
            "mychannel",
            "patient",
            "Org1MSP",
        );
        assert_eq!(
            client.transactions_url(),
            "https://ledger:7443/channels/mychannel/contracts/patient/transactions"
        );
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let client = spawn_ledger().await;
        let body = client
            .submit("queryPatient", &["p-1".to_string()])
            .await
            .unwrap();
        assert_eq!(body, br#"{"id":"p-1"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_success_with_empty_body() {
        let client = spawn_ledger().await;
        let body = client
            .submit("updatePatient", &["p-1".to_string(), "{}".to_string()])
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_client_error_is_rejection() {
        let client = spawn_ledger().await;
        let err = client
            .submit("addPatient", &["p-1".to_string(), "{}".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected(ref m) if m == "patient p-1 already exists"));
    }

    #[tokio::test]
    async fn test_auth_and_throttling_are_transport_failures() {
        let client = spawn_ledger().await;

        for function in ["forbiddenPatient", "throttledPatient"] {
            let err = client
                .submit(function, &["p-1".to_string()])
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Transport(_)), "{}", function);
        }
    }

    #[test]
    fn test_rejection_statuses() {
        assert!(is_rejection(StatusCode::BAD_REQUEST));
        assert!(is_rejection(StatusCode::NOT_FOUND));
        assert!(is_rejection(StatusCode::CONFLICT));
        assert!(!is_rejection(StatusCode::UNAUTHORIZED));
        assert!(!is_rejection(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_rejection(StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn test_server_error_is_transport_failure() {
        let client = spawn_ledger().await;
        let err = client
            .submit("replacePatient", &["p-1".to_string(), "{}".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_ledger_is_transport_failure() {
        let client = HttpLedgerClient::with_client(
            Client::new(),
            "http://127.0.0.1:1",
            "mychannel",
            "patient",
            "Org1MSP",
        );
        let err = client.submit("queryPatient", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
