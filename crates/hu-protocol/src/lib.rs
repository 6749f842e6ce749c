//! hu-protocol: Wire protocol for the Headsup control channel
//!
//! The device pushes JSON envelopes (`{"type": ..., "data": ...}`) over a
//! WebSocket and accepts bare text tokens as commands. This crate holds the
//! types for both directions and the single validating decoder for inbound
//! frames. It performs no I/O.

pub mod command;
pub mod error;
pub mod message;
pub mod status;

pub use command::Command;
pub use error::ProtocolError;
pub use message::{decode_first_image, Envelope, InboundMessage, MessageKind};
pub use status::StatusFields;
