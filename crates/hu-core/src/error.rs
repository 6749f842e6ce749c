//! Core error types for the Headsup client

use std::path::PathBuf;
use std::time::Duration;

use hu_protocol::ProtocolError;
use thiserror::Error;

/// Top-level error type for the Headsup client
#[derive(Error, Debug)]
pub enum HuError {
    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Validation error
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Device launch error
    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operator input rejected before any I/O takes place
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Host is neither a dotted-quad IPv4 address nor `localhost`
    #[error("Invalid host address: {0:?} (expected an IPv4 address or \"localhost\")")]
    InvalidHost(String),

    /// Port is not an integer in 0..=65535
    #[error("Invalid port: {0:?} (expected a number between 0 and 65535)")]
    InvalidPort(String),

    /// Remote hosts need the task application launched before connecting
    #[error("Application has not been launched on {0}")]
    NotLaunched(String),
}

/// Failures of the WebSocket transport
///
/// Every variant is fatal to the session that produced it and to nothing
/// else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Handshake failed
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Handshake did not complete within the configured timeout
    #[error("Connection to {url} timed out after {timeout:?}")]
    ConnectTimeout { url: String, timeout: Duration },

    /// Remote end closed the connection
    #[error("Connection closed by device")]
    RemoteClosed,

    /// Reading the next frame failed
    #[error("Error receiving message: {0}")]
    Receive(String),

    /// Writing a frame failed
    #[error("Error sending command: {0}")]
    Send(String),

    /// The session has already been closed locally
    #[error("Session is closed")]
    Closed,
}

/// Errors from the device-launch collaborator
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The adb executable could not be found
    #[error("adb not found at {0:?}; ensure the Android platform tools are installed and on PATH")]
    AdbNotFound(PathBuf),

    /// An adb step exited unsuccessfully
    #[error("{step} failed: {stderr}")]
    CommandFailed { step: &'static str, stderr: String },

    /// An adb step did not finish in time
    #[error("{step} timed out after {timeout:?}; check the device connection")]
    Timeout {
        step: &'static str,
        timeout: Duration,
    },

    /// Spawning adb failed for another reason
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
