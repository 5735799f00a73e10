use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors surfaced to REST callers
///
/// Bodies are plain text carrying only the message.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be turned into a transaction
    #[error("{0}")]
    BadRequest(String),

    /// The ledger rejected the transaction
    #[error("{0}")]
    Rejected(String),

    /// The transaction could not be carried out
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Rejected(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
