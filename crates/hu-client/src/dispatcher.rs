//! Operator command submission

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use hu_core::ConnectionState;
use hu_protocol::Command;

use crate::control::ControlRequest;

/// A command that was not handed to the network context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No session is connected
    #[error("Cannot send command '{0}': not connected")]
    NotConnected(Command),

    /// The network context has stopped
    #[error("Cannot send command '{0}': connection core stopped")]
    Stopped(Command),
}

/// Submits commands for the current session
///
/// Commands are rejected here, synchronously, when the last published state
/// is not `Connected`. The supervisor checks again when the request arrives,
/// so a command racing a disconnect is still reported rather than lost.
#[derive(Debug)]
pub struct CommandDispatcher {
    requests: mpsc::UnboundedSender<ControlRequest>,
    state: watch::Receiver<ConnectionState>,
    /// Operator's view of whether the device requires fixation
    fixation_required: bool,
}

impl CommandDispatcher {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<ControlRequest>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            requests,
            state,
            fixation_required: true,
        }
    }

    /// Submit a command
    pub fn submit(&self, command: Command) -> Result<(), DispatchError> {
        let state = *self.state.borrow();
        if state != ConnectionState::Connected {
            tracing::warn!("Rejected command '{}': connection is {}", command, state);
            return Err(DispatchError::NotConnected(command));
        }

        tracing::debug!("Submitting command '{}'", command);
        self.requests
            .send(ControlRequest::Submit(command.clone()))
            .map_err(|_| DispatchError::Stopped(command))
    }

    /// Flip the fixation requirement and send the matching command
    ///
    /// The flip is optimistic and does not wait for the device. A rejected
    /// submit restores the previous requirement, since nothing was sent.
    pub fn toggle_fixation(&mut self) -> Result<Command, DispatchError> {
        let command = Command::fixation_toggle(self.fixation_required);
        self.fixation_required = !self.fixation_required;
        if let Err(e) = self.submit(command.clone()) {
            self.fixation_required = !self.fixation_required;
            return Err(e);
        }
        Ok(command)
    }

    /// Whether the operator's view says fixation is required
    pub fn fixation_required(&self) -> bool {
        self.fixation_required
    }

    /// Adopt the requirement the device reported
    pub fn set_fixation_required(&mut self, required: bool) {
        self.fixation_required = required;
    }
}
