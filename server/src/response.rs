//! Response envelope.
//!
//! Domain outcomes travel inside a `200`-wrapped envelope with the
//! application code embedded; only unexpected internal errors surface as
//! transport 500.

use serde::Serialize;

/// The `{code, message?, data}` envelope every endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Application-level outcome code.
    pub code: u16,

    /// Human-readable message, omitted when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Payload.
    pub data: serde_json::Value,
}

impl Envelope {
    /// Build an envelope.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// Successful outcome (code 200).
    #[must_use]
    pub fn ok(data: serde_json::Value) -> Self {
        Self::new(200, "", data)
    }

    /// Resource-created outcome (code 201).
    #[must_use]
    pub fn created(data: serde_json::Value) -> Self {
        Self::new(201, "", data)
    }
}
