//! hu-core: Core abstractions and configuration for the Headsup client
//!
//! This crate provides the domain types shared by the connection core and
//! the command-line panel: validated endpoints, connection state, the status
//! model, the error taxonomy, configuration, and the device-launch
//! collaborator.

pub mod adb;
pub mod config;
pub mod error;
pub mod status;
pub mod time;
pub mod traits;
pub mod types;

pub use error::{ConfigError, HuError, LaunchError, TransportError, ValidationError};
pub use status::{StatusModel, StatusSnapshot};
pub use types::{ConnectionIntent, ConnectionState, Endpoint, SessionId};
