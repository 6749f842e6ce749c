//! Inbound message types for the Headsup protocol
//!
//! Every structured frame from the device is an envelope:
//!
//! ```text
//! { "type": "status" | "logs" | "screenshot", "data": "<JSON-encoded string>" }
//! ```
//!
//! The `data` string is decoded a second time according to `type`:
//!
//! - `status`: an object matching [`StatusFields`]
//! - `logs`: a JSON string, forwarded verbatim
//! - `screenshot`: an array of base64 image payloads, one per display
//!
//! Frames that are not JSON at all are free text and go straight to the
//! console. JSON values that are not objects are command replies (the device
//! answers `kill` with `"Done"`, for instance).

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::status::StatusFields;

/// Envelope wrapping every structured inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type discriminator
    #[serde(rename = "type")]
    pub kind: String,
    /// JSON-encoded payload
    pub data: String,
}

impl Envelope {
    /// Create an envelope for a known message kind
    pub fn new(kind: MessageKind, data: impl Into<String>) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            data: data.into(),
        }
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Message type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Device and experiment status
    Status,
    /// A log line produced on the device
    Logs,
    /// Display captures
    Screenshot,
}

impl MessageKind {
    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Status => "status",
            MessageKind::Logs => "logs",
            MessageKind::Screenshot => "screenshot",
        }
    }

    /// Look up a kind by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "status" => Some(Self::Status),
            "logs" => Some(Self::Logs),
            "screenshot" => Some(Self::Screenshot),
            _ => None,
        }
    }
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Status update
    Status(StatusFields),
    /// Device log line
    Logs(String),
    /// Base64 image payloads, one per display
    Screenshot(Vec<String>),
    /// Well-formed envelope with a type this client does not handle
    Unknown { kind: String },
    /// A bare JSON value, which is how the device acknowledges commands
    Reply(String),
    /// A frame that is not JSON at all
    Text(String),
}

impl InboundMessage {
    /// Decode one raw text frame
    ///
    /// Never fails for frames that are not JSON objects; those become
    /// [`InboundMessage::Text`] or [`InboundMessage::Reply`]. Errors are
    /// reserved for objects that are not envelopes and for envelopes whose
    /// payload does not match their type.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => return Ok(Self::Text(raw.to_string())),
        };

        let envelope = match value {
            serde_json::Value::Object(_) => {
                serde_json::from_value::<Envelope>(value).map_err(ProtocolError::MalformedEnvelope)?
            }
            serde_json::Value::String(text) => return Ok(Self::Reply(text)),
            other => return Ok(Self::Reply(other.to_string())),
        };

        let kind = match MessageKind::from_name(&envelope.kind) {
            Some(kind) => kind,
            None => return Ok(Self::Unknown { kind: envelope.kind }),
        };

        let payload_error = |source| ProtocolError::InvalidPayload {
            kind: kind.as_str(),
            source,
        };

        Ok(match kind {
            MessageKind::Status => {
                Self::Status(StatusFields::from_json(&envelope.data).map_err(payload_error)?)
            }
            MessageKind::Logs => {
                Self::Logs(serde_json::from_str(&envelope.data).map_err(payload_error)?)
            }
            MessageKind::Screenshot => {
                Self::Screenshot(serde_json::from_str(&envelope.data).map_err(payload_error)?)
            }
        })
    }

    /// The wire type name, for log messages
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Status(_) => MessageKind::Status.as_str(),
            Self::Logs(_) => MessageKind::Logs.as_str(),
            Self::Screenshot(_) => MessageKind::Screenshot.as_str(),
            Self::Unknown { kind } => kind,
            Self::Reply(_) => "reply",
            Self::Text(_) => "text",
        }
    }
}

/// Decode the first screenshot payload into raw image bytes
///
/// Returns `Ok(None)` when the device sent no payloads, or only empty ones.
pub fn decode_first_image(images: &[String]) -> Result<Option<Vec<u8>>, ProtocolError> {
    match images.first() {
        Some(encoded) if !encoded.is_empty() => {
            let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
            Ok(Some(bytes))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn envelope(kind: &str, data: &str) -> String {
        serde_json::json!({ "type": kind, "data": data }).to_string()
    }

    #[test]
    fn test_message_kind_names() {
        for kind in [MessageKind::Status, MessageKind::Logs, MessageKind::Screenshot] {
            assert_eq!(MessageKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::from_name("heartbeat"), None);
    }

    #[test]
    fn test_non_json_is_free_text() {
        let message = InboundMessage::decode("not json").unwrap();
        assert_eq!(message, InboundMessage::Text("not json".to_string()));
    }

    #[test]
    fn test_bare_json_is_reply() {
        let message = InboundMessage::decode(r#""Fixation Enabled""#).unwrap();
        assert_eq!(message, InboundMessage::Reply("Fixation Enabled".to_string()));

        let message = InboundMessage::decode("true").unwrap();
        assert_eq!(message, InboundMessage::Reply("true".to_string()));
        assert_eq!(message.kind_name(), "reply");
    }

    #[test]
    fn test_status_envelope() {
        let raw = envelope("status", r#"{"current_trial":3,"total_trials":10}"#);
        match InboundMessage::decode(&raw).unwrap() {
            InboundMessage::Status(fields) => {
                assert_eq!(fields.current_trial, Some(3));
                assert_eq!(fields.total_trials, Some(10));
                assert_eq!(fields.device_name, None);
            }
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_logs_envelope() {
        let raw = envelope("logs", r#""Block 2 started""#);
        assert_eq!(
            InboundMessage::decode(&raw).unwrap(),
            InboundMessage::Logs("Block 2 started".to_string())
        );
    }

    #[test]
    fn test_screenshot_envelope() {
        let raw = envelope("screenshot", r#"["aGVsbG8=","d29ybGQ="]"#);
        assert_eq!(
            InboundMessage::decode(&raw).unwrap(),
            InboundMessage::Screenshot(vec!["aGVsbG8=".to_string(), "d29ybGQ=".to_string()])
        );
    }

    #[test]
    fn test_unknown_type() {
        let raw = envelope("telemetry", "{}");
        assert_eq!(
            InboundMessage::decode(&raw).unwrap(),
            InboundMessage::Unknown {
                kind: "telemetry".to_string()
            }
        );
    }

    #[test]
    fn test_object_without_type_is_malformed() {
        let err = InboundMessage::decode(r#"{"data":"{}"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_bad_payload_names_its_kind() {
        let raw = envelope("screenshot", r#"{"left":"abc"}"#);
        let err = InboundMessage::decode(&raw).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidPayload {
                kind: "screenshot",
                ..
            }
        ));
        assert!(err.to_string().starts_with("Invalid screenshot payload"));
    }

    #[test]
    fn test_decode_first_image() {
        let images = vec!["aGVsbG8=".to_string(), "ignored".to_string()];
        assert_eq!(decode_first_image(&images).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(decode_first_image(&[]).unwrap(), None);
        assert_eq!(decode_first_image(&[String::new()]).unwrap(), None);
        assert!(decode_first_image(&["***".to_string()]).is_err());
    }

    #[test]
    fn test_envelope_frame_encoding() {
        let frame = Envelope::new(MessageKind::Logs, "\"hi\"").to_frame().unwrap();
        let decoded: Envelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(decoded.kind, "logs");
        assert_eq!(decoded.data, "\"hi\"");
    }

    proptest! {
        #[test]
        fn prop_non_json_is_text(raw in "\\PC*") {
            prop_assume!(serde_json::from_str::<serde_json::Value>(&raw).is_err());
            prop_assert_eq!(InboundMessage::decode(&raw).unwrap(), InboundMessage::Text(raw.clone()));
        }

        #[test]
        fn prop_logs_carry_any_line(line in "\\PC*") {
            let data = serde_json::to_string(&line).unwrap();
            let frame = Envelope::new(MessageKind::Logs, data).to_frame().unwrap();
            prop_assert_eq!(InboundMessage::decode(&frame).unwrap(), InboundMessage::Logs(line));
        }

        #[test]
        fn prop_unknown_types_never_fail(kind in "[a-z_]{1,12}", data in "\\PC*") {
            prop_assume!(MessageKind::from_name(&kind).is_none());
            let frame = serde_json::json!({ "type": kind, "data": data }).to_string();
            prop_assert_eq!(InboundMessage::decode(&frame).unwrap(), InboundMessage::Unknown { kind });
        }
    }
}
