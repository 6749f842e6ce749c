//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding an inbound frame
///
/// None of these are fatal to a session: the offending frame is logged and
/// dropped.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The frame is a JSON object but not a `{type, data}` envelope
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The envelope's `data` does not match the schema for its type
    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A screenshot entry is not valid base64
    #[error("Invalid screenshot encoding: {0}")]
    InvalidImage(#[from] base64::DecodeError),
}
