//! Inbound event envelope

use crate::Result;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use dispatch_core::SUPPORTED_DATA_FORMAT;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Publishers differ on padding and alphabet; accept both alphabets either way
const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Event envelope as published on the patient-records subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Record identifier, passed to the ledger as the first argument
    pub uuid: String,

    /// Operation hint (HTTP verb style)
    pub operation: String,

    /// Declared format of `data`
    pub data_format: String,

    /// Base64-encoded record
    pub data: String,
}

impl EventEnvelope {
    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Build an envelope around a plain-text record
    pub fn encode(
        uuid: impl Into<String>,
        operation: impl Into<String>,
        data_format: impl Into<String>,
        record: &str,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            operation: operation.into(),
            data_format: data_format.into(),
            data: STANDARD.encode(record),
        }
    }

    /// Whether the gateway handles this envelope's data format
    pub fn is_supported(&self) -> bool {
        self.data_format == SUPPORTED_DATA_FORMAT
    }

    /// Decode `data` into the record text
    ///
    /// Padding is optional and the URL-safe alphabet is accepted.
    pub fn decode_payload(&self) -> Result<String> {
        let data = self.data.trim();
        let raw = if data.contains(['-', '_']) {
            URL_SAFE_LENIENT.decode(data)?
        } else {
            STANDARD_LENIENT.decode(data)?
        };
        Ok(String::from_utf8(raw)?)
    }

    /// The `data_format` of a message that may not be a complete envelope
    pub fn declared_format(bytes: &[u8]) -> Option<String> {
        let value: Value = serde_json::from_slice(bytes).ok()?;
        value.get("data_format")?.as_str().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_parse_and_decode() {
        let bytes = br#"{"uuid":"p-1","operation":"POST","data_format":"FHIR-R4_PATIENT","data":"eyJpZCI6InAtMSJ9"}"#;
        let envelope = EventEnvelope::from_bytes(bytes).unwrap();

        assert_eq!(envelope.uuid, "p-1");
        assert!(envelope.is_supported());
        assert_eq!(envelope.decode_payload().unwrap(), r#"{"id":"p-1"}"#);
    }

    #[test]
    fn test_unsupported_format() {
        let envelope = EventEnvelope::encode("p-1", "POST", "HL7-V2_ADT", "MSH|...");
        assert!(!envelope.is_supported());
    }

    #[test]
    fn test_missing_field_is_envelope_error() {
        let err = EventEnvelope::from_bytes(br#"{"uuid":"p-1"}"#).unwrap_err();
        assert!(matches!(err, Error::Envelope(_)));
    }

    #[test]
    fn test_unpadded_and_url_safe_payloads() {
        let mut envelope = EventEnvelope::encode("p-1", "POST", SUPPORTED_DATA_FORMAT, "");

        envelope.data = "eyJpZCI6InAtMTIifQ".to_string();
        assert_eq!(envelope.decode_payload().unwrap(), r#"{"id":"p-12"}"#);

        envelope.data = "eyJuYW1lIjoiw6k_In0".to_string();
        assert_eq!(envelope.decode_payload().unwrap(), r#"{"name":"é?"}"#);

        envelope.data = "eyJuYW1lIjoiw6k/In0=".to_string();
        assert_eq!(envelope.decode_payload().unwrap(), r#"{"name":"é?"}"#);
    }

    #[test]
    fn test_declared_format_of_incomplete_envelope() {
        assert_eq!(
            EventEnvelope::declared_format(br#"{"uuid":"p-1","data_format":"CSV"}"#),
            Some("CSV".to_string())
        );
        assert_eq!(EventEnvelope::declared_format(br#"{"uuid":"p-1"}"#), None);
        assert_eq!(EventEnvelope::declared_format(b"garbage"), None);
    }

    #[test]
    fn test_bad_base64() {
        let envelope = EventEnvelope {
            uuid: "p-1".into(),
            operation: "POST".into(),
            data_format: SUPPORTED_DATA_FORMAT.into(),
            data: "***".into(),
        };
        assert!(matches!(
            envelope.decode_payload().unwrap_err(),
            Error::PayloadDecode(_)
        ));
    }

    #[test]
    fn test_non_utf8_payload() {
        let envelope = EventEnvelope {
            uuid: "p-1".into(),
            operation: "POST".into(),
            data_format: SUPPORTED_DATA_FORMAT.into(),
            data: STANDARD.encode([0xff, 0xfe, 0xfd]),
        };
        assert!(matches!(
            envelope.decode_payload().unwrap_err(),
            Error::PayloadEncoding(_)
        ));
    }
}
