//! Argument marshalling for the string-only transaction interface
//!
//! The ledger accepts positional string arguments, but inbound requests carry
//! JSON records. Strings pass through untouched; everything else is rendered
//! as compact JSON text.

use serde_json::Value;

/// Marshal a heterogeneous argument list into ledger arguments
///
/// The output has the same length and order as the input.
pub fn marshal_arguments(arguments: &[Value]) -> Vec<String> {
    arguments.iter().map(marshal_argument).collect()
}

/// Marshal a single argument
pub fn marshal_argument(argument: &Value) -> String {
    match argument {
        Value::String(s) => s.clone(),
        // Display on Value is infallible compact serialization
        other => other.to_string(),
    }
}
