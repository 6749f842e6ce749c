//! WebSocket transport to the device
//!
//! A [`TransportSession`] is one WebSocket connection: created by a connect,
//! destroyed by a close or a failure, never reused. Sessions report to the
//! supervisor through [`SessionEvent`]s tagged with their [`SessionId`], so
//! anything a superseded session still emits can be recognised and dropped.

mod session;

pub use session::TransportSession;

use hu_core::{SessionId, TransportError};

/// Why a session stopped receiving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The device closed the connection
    RemoteClosed,
    /// Receiving failed
    Failed(TransportError),
}

impl SessionEnd {
    /// The error reported to the operator for this ending
    pub fn into_error(self) -> TransportError {
        match self {
            SessionEnd::RemoteClosed => TransportError::RemoteClosed,
            SessionEnd::Failed(err) => err,
        }
    }
}

/// Notifications from a session's receive loop to the supervisor
#[derive(Debug)]
pub enum SessionEvent {
    /// A text frame arrived
    Frame { id: SessionId, text: String },
    /// The session will deliver no more frames
    Ended { id: SessionId, reason: SessionEnd },
}

impl SessionEvent {
    /// Session this event belongs to
    pub fn id(&self) -> SessionId {
        match self {
            SessionEvent::Frame { id, .. }
            | SessionEvent::Ended { id, .. } => *id,
        }
    }
}
