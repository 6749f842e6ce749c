//! Control-context handle to the connection supervisor

use tokio::sync::{mpsc, watch};

use hu_core::{ConnectionIntent, ConnectionState, Endpoint, ValidationError};
use hu_protocol::Command;

use crate::dispatcher::CommandDispatcher;

/// Requests from the control context to the network context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// Replace the connection intent
    SetIntent(ConnectionIntent),
    /// Stop wanting a connection
    ClearIntent,
    /// Send a command over the current session
    Submit(Command),
    /// Close any session and stop the supervisor
    Shutdown,
}

/// Cloneable handle used by the control context
///
/// Every method returns immediately; the network context acts on requests
/// in the order they were made.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    requests: mpsc::UnboundedSender<ControlRequest>,
    state: watch::Receiver<ConnectionState>,
}

impl ControlHandle {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<ControlRequest>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { requests, state }
    }

    fn request(&self, request: ControlRequest) -> bool {
        if self.requests.send(request).is_err() {
            tracing::warn!("Network context is not running; request dropped");
            return false;
        }
        true
    }

    /// Ask for a connection to `endpoint`
    pub fn connect(&self, endpoint: Endpoint) -> bool {
        self.request(ControlRequest::SetIntent(ConnectionIntent::connect(endpoint)))
    }

    /// Validate operator input and ask for a connection
    pub fn connect_to(&self, host: &str, port: &str) -> Result<Endpoint, ValidationError> {
        let endpoint = Endpoint::parse(host, port)?;
        self.connect(endpoint.clone());
        Ok(endpoint)
    }

    /// Ask for the current session, if any, to be closed
    pub fn disconnect(&self) -> bool {
        self.request(ControlRequest::ClearIntent)
    }

    /// Stop the supervisor
    pub fn shutdown(&self) -> bool {
        self.request(ControlRequest::Shutdown)
    }

    /// Latest connection state published by the supervisor
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that can await state changes
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// A command dispatcher bound to this handle
    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(self.requests.clone(), self.state.clone())
    }
}
