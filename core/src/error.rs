//! Error types for the response builder.
//!
//! # Design
//! Building an envelope never fails; malformed inputs degrade to defaults.
//! The variants here cover the edges around it: turning a caller's value
//! into a structured body, and decoding JSON text handed in over FFI.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// A structured body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Input text that should have been JSON was not.
    #[error("invalid JSON input: {0}")]
    InvalidJson(String),
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        EnvelopeError::InvalidJson(err.to_string())
    }
}
