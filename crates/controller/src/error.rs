//! Errors crossing the remote-store boundary.
//!
//! Every remote read or write returns `Result<_, RemoteError>`.  None of
//! these are fatal: each component logs and moves on, and the next cycle
//! tries again.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RemoteError {
    /// Transport failure, timeout, non-success status, or not connected.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The path holds no value.
    #[error("no value at '{0}'")]
    Missing(String),

    /// A value is present but of the wrong type for this field.
    #[error("schema mismatch at '{path}': expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: &'static str,
        found: String,
    },

    /// A value could not be encoded for the wire.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl RemoteError {
    pub fn mismatch(path: &str, expected: &'static str, found: &serde_json::Value) -> Self {
        Self::SchemaMismatch {
            path: path.to_string(),
            expected,
            found: json_type_name(found).to_string(),
        }
    }
}

/// JSON type name as reported in schema-mismatch logs.
pub fn json_type_name(v: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
