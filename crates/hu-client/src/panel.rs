//! Control-context view of the client
//!
//! [`ControlPanel`] is what an operator interface drives. It keeps the
//! latest state, status and console history, updated only by
//! [`ControlPanel::apply_event`], and turns operator actions into requests
//! for the network context. It never touches a socket.

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use hu_core::status::StatusSnapshot;
use hu_core::time::console_stamp;
use hu_core::traits::DeviceLauncher;
use hu_core::types::is_valid_host;
use hu_core::{ConnectionState, Endpoint, LaunchError, ValidationError};
use hu_protocol::Command;

use crate::control::ControlHandle;
use crate::dispatcher::{CommandDispatcher, DispatchError};
use crate::events::{ClientEvent, StateChange};

/// Errors from operator actions
#[derive(Error, Debug)]
pub enum PanelError {
    /// Operator input was invalid
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A command could not be submitted
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Launching or stopping the application failed
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// Calibration needs a running task
    #[error("Start the task before starting calibration")]
    TaskNotStarted,
}

/// One timestamped console entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    /// Position in the panel's lifetime log; never reused
    pub seq: u64,
    /// `[HH:MM:SS]`
    pub stamp: String,
    pub text: String,
}

impl fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.stamp, self.text)
    }
}

/// Operator-side aggregate of connection, status and console state
#[derive(Debug)]
pub struct ControlPanel {
    handle: ControlHandle,
    dispatcher: CommandDispatcher,
    state: ConnectionState,
    last_error: Option<String>,
    status: StatusSnapshot,
    console: VecDeque<ConsoleLine>,
    max_lines: usize,
    next_seq: u64,
    screenshot: Option<Vec<u8>>,
    /// Host the application was last launched on
    launched_on: Option<String>,
    task_started: bool,
    calibration_started: bool,
}

impl ControlPanel {
    /// Create a panel keeping at most `max_lines` console lines
    pub fn new(handle: ControlHandle, max_lines: usize) -> Self {
        Self {
            dispatcher: handle.dispatcher(),
            state: handle.state(),
            handle,
            last_error: None,
            status: StatusSnapshot::offline(),
            console: VecDeque::new(),
            max_lines: max_lines.max(1),
            next_seq: 0,
            screenshot: None,
            launched_on: None,
            task_started: false,
            calibration_started: false,
        }
    }

    /// Apply one event from the network context
    pub fn apply_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::State(change) => self.apply_state(change),
            ClientEvent::Status(snapshot) => {
                self.status = StatusSnapshot {
                    fixation_required: self.dispatcher.fixation_required(),
                    ..snapshot
                };
            }
            ClientEvent::Fixation(required) => {
                self.dispatcher.set_fixation_required(required);
                self.status.fixation_required = required;
            }
            ClientEvent::Log(line) => self.log(line),
            ClientEvent::Screenshot(bytes) => {
                self.log(format!("Screenshot received ({} bytes)", bytes.len()));
                self.screenshot = Some(bytes);
            }
        }
    }

    fn apply_state(&mut self, change: StateChange) {
        self.state = change.state;
        match change.state {
            ConnectionState::Connected => {
                self.console.clear();
                self.screenshot = None;
                self.status = StatusSnapshot::offline();
                self.dispatcher.set_fixation_required(true);
                self.task_started = false;
                self.calibration_started = false;
                self.last_error = None;
            }
            ConnectionState::Error => {
                self.last_error = change.cause;
            }
            ConnectionState::Connecting | ConnectionState::Disconnected => {
                self.last_error = None;
            }
        }
    }

    /// Append a line to the console, dropping the oldest beyond the limit
    pub fn log(&mut self, text: impl Into<String>) {
        if self.console.len() == self.max_lines {
            self.console.pop_front();
        }
        self.console.push_back(ConsoleLine {
            seq: self.next_seq,
            stamp: console_stamp(),
            text: text.into(),
        });
        self.next_seq += 1;
    }

    /// Validate and request a connection
    ///
    /// Remote hosts are only accepted once the application has been launched
    /// on them; `localhost` is always accepted.
    pub fn connect(&mut self, host: &str, port: &str) -> Result<Endpoint, PanelError> {
        let endpoint = Endpoint::parse(host, port)?;
        if !endpoint.is_local() && self.launched_on.as_deref() != Some(endpoint.host()) {
            return Err(ValidationError::NotLaunched(endpoint.host().to_string()).into());
        }
        self.handle.connect(endpoint.clone());
        Ok(endpoint)
    }

    /// Request the current session be closed
    pub fn disconnect(&mut self) {
        self.handle.disconnect();
    }

    /// Launch the task application on `host`
    pub async fn launch(
        &mut self,
        launcher: &dyn DeviceLauncher,
        host: &str,
    ) -> Result<(), PanelError> {
        let host = host.trim();
        if !is_valid_host(host) {
            return Err(ValidationError::InvalidHost(host.to_string()).into());
        }

        self.log(format!("Launching application on {}...", host));
        match launcher.launch(host).await {
            Ok(()) => {
                self.launched_on = Some(host.to_string());
                self.log("Application launched successfully");
                Ok(())
            }
            Err(e) => {
                self.log(format!("Launch error: {}", e));
                Err(e.into())
            }
        }
    }

    /// Stop the task application on `host`
    pub async fn quit(&mut self, launcher: &dyn DeviceLauncher, host: &str) -> Result<(), PanelError> {
        let host = host.trim();
        if !is_valid_host(host) {
            return Err(ValidationError::InvalidHost(host.to_string()).into());
        }

        if self.state.is_active() {
            self.handle.disconnect();
        }

        match launcher.quit(host).await {
            Ok(()) => {
                self.launched_on = None;
                self.task_started = false;
                self.calibration_started = false;
                self.log("Application stopped");
                Ok(())
            }
            Err(e) => {
                self.log(format!("Quit error: {}", e));
                Err(e.into())
            }
        }
    }

    fn submit(&mut self, command: Command) -> Result<(), PanelError> {
        if let Err(e) = self.dispatcher.submit(command) {
            self.log(e.to_string());
            return Err(e.into());
        }
        Ok(())
    }

    /// Request a display capture
    pub fn screenshot(&mut self) -> Result<(), PanelError> {
        self.submit(Command::Screenshot)
    }

    /// Start the experiment task
    pub fn start_task(&mut self) -> Result<(), PanelError> {
        self.submit(Command::StartTask)?;
        self.task_started = true;
        Ok(())
    }

    /// Start eye-tracker calibration; the task must have been started
    pub fn start_calibration(&mut self) -> Result<(), PanelError> {
        if !self.task_started {
            self.log("Cannot start calibration: task not started");
            return Err(PanelError::TaskNotStarted);
        }
        self.submit(Command::StartCalibration)?;
        self.calibration_started = true;
        Ok(())
    }

    /// Flip the fixation requirement
    pub fn toggle_fixation(&mut self) -> Result<Command, PanelError> {
        match self.dispatcher.toggle_fixation() {
            Ok(command) => {
                self.status.fixation_required = self.dispatcher.fixation_required();
                Ok(command)
            }
            Err(e) => {
                self.log(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Ask the device to stop the task
    pub fn kill(&mut self) -> Result<(), PanelError> {
        self.submit(Command::Kill)
    }

    /// Send an arbitrary token
    pub fn send_token(&mut self, token: &str) -> Result<Command, PanelError> {
        let command = Command::from_token(token);
        if !command.is_known() {
            tracing::debug!("Forwarding unrecognised token '{}'", token);
        }
        self.submit(command.clone())?;
        Ok(command)
    }

    /// Latest connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Cause of the last connection error, while in `Error`
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Latest status snapshot
    pub fn status(&self) -> &StatusSnapshot {
        &self.status
    }

    /// Whether the operator's view says fixation is required
    pub fn fixation_required(&self) -> bool {
        self.dispatcher.fixation_required()
    }

    /// Console history, oldest first
    pub fn console(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.console.iter()
    }

    /// Retained console lines logged at or after `seq`
    pub fn console_since(&self, seq: u64) -> impl Iterator<Item = &ConsoleLine> {
        self.console.iter().filter(move |line| line.seq >= seq)
    }

    /// Sequence number the next console line will get
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Take the last received screenshot
    pub fn take_screenshot(&mut self) -> Option<Vec<u8>> {
        self.screenshot.take()
    }

    /// Host the application was launched on, if any
    pub fn launched_on(&self) -> Option<&str> {
        self.launched_on.as_deref()
    }

    pub fn task_started(&self) -> bool {
        self.task_started
    }

    pub fn calibration_started(&self) -> bool {
        self.calibration_started
    }
}
