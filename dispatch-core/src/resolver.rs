//! Operation resolution for both ingress channels
//!
//! REST requests resolve by HTTP method over a fixed table. Pub/sub envelopes
//! carry an operation hint plus a declared data format; only the supported
//! patient format is resolved at all.

use crate::types::Operation;
use serde::{Deserialize, Serialize};

/// The only envelope data format the gateway processes
pub const SUPPORTED_DATA_FORMAT: &str = "FHIR-R4_PATIENT";

/// What to do with an event whose operation hint is not recognised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownHintPolicy {
    /// Treat the event as an insert
    #[default]
    Add,
    /// Drop the event without submitting anything
    Skip,
}

/// Result of resolving an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The event maps to this operation
    Resolved(Operation),
    /// The declared data format is not handled; carries the format
    UnsupportedFormat(String),
    /// The hint was not recognised and the policy is [`UnknownHintPolicy::Skip`]
    UnknownOperation(String),
}

/// Maps channel-specific verbs onto [`Operation`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationResolver {
    unknown_hint: UnknownHintPolicy,
}

impl OperationResolver {
    /// Create a resolver with the given fallback policy
    pub fn new(unknown_hint: UnknownHintPolicy) -> Self {
        Self { unknown_hint }
    }

    /// Resolve an HTTP method on the patient resource
    ///
    /// Returns `None` for methods that are not routed.
    pub fn resolve_method(method: &str) -> Option<Operation> {
        match method {
            "GET" => Some(Operation::Query),
            "POST" => Some(Operation::Add),
            "PUT" => Some(Operation::Replace),
            "PATCH" => Some(Operation::Update),
            _ => None,
        }
    }

    /// Resolve a pub/sub operation hint
    ///
    /// Matching ignores ASCII case and surrounding whitespace. Unrecognised
    /// hints fall back according to the policy.
    pub fn resolve_hint(&self, hint: &str) -> Option<Operation> {
        let hint = hint.trim();
        let known = [
            ("POST", Operation::Add),
            ("PUT", Operation::Replace),
            ("PATCH", Operation::Update),
            ("GET", Operation::Query),
        ];

        known
            .iter()
            .find(|(verb, _)| verb.eq_ignore_ascii_case(hint))
            .map(|(_, op)| *op)
            .or(match self.unknown_hint {
                UnknownHintPolicy::Add => Some(Operation::Add),
                UnknownHintPolicy::Skip => None,
            })
    }

    /// Resolve a full pub/sub event: data format first, then operation hint
    pub fn resolve_event(&self, hint: &str, data_format: &str) -> Resolution {
        if data_format != SUPPORTED_DATA_FORMAT {
            return Resolution::UnsupportedFormat(data_format.to_string());
        }

        match self.resolve_hint(hint) {
            Some(op) => Resolution::Resolved(op),
            None => Resolution::UnknownOperation(hint.to_string()),
        }
    }
}
