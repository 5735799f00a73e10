//! Error types for message bus

use thiserror::Error;

/// Message bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Subscribe error
    #[error("Subscribe error: {0}")]
    Subscribe(String),

    /// Credentials could not be loaded
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Envelope was not valid JSON or lacked required fields
    #[error("Malformed envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    /// Envelope payload was not valid base64
    #[error("Payload decode error: {0}")]
    PayloadDecode(#[from] base64::DecodeError),

    /// Decoded payload was not UTF-8 text
    #[error("Payload is not UTF-8: {0}")]
    PayloadEncoding(#[from] std::string::FromUtf8Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
