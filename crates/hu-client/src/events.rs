//! Events posted from the network context to the control context

use tokio::sync::mpsc;

use hu_core::{ConnectionState, StatusSnapshot};

/// A connection-state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// The new state
    pub state: ConnectionState,
    /// Human-readable cause; always present for `Error`
    pub cause: Option<String>,
}

/// Everything the presentation side is told about
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Connection state changed
    State(StateChange),
    /// New status snapshot
    Status(StatusSnapshot),
    /// The device reported its fixation requirement
    Fixation(bool),
    /// Console line
    Log(String),
    /// Raw bytes of the first display capture
    Screenshot(Vec<u8>),
}

/// Posts events into the control context
///
/// Posting never blocks or suspends the network context. Events posted after
/// the control side has gone away are discarded.
#[derive(Debug, Clone)]
pub struct EventPoster {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl EventPoster {
    /// Create a poster and the receiver the control context reads from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post one event
    pub fn post(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Control context gone, event dropped");
        }
    }

    /// Post a console line
    pub fn log(&self, message: impl Into<String>) {
        self.post(ClientEvent::Log(message.into()));
    }
}
