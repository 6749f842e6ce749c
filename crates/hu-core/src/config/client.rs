//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ValidationError;
use crate::types::Endpoint;

/// Package id of the task application on the headset
pub const DEFAULT_PACKAGE: &str = "com.BrainDevelopmentandDisordersLab.task_vr_rdk";

/// Launcher activity of the task application
pub const DEFAULT_ACTIVITY: &str = "com.unity3d.player.UnityPlayerActivity";

/// Port the device's WebSocket server listens on by default
pub const DEFAULT_PORT: u16 = 4444;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket connection settings
    pub connection: ConnectionConfig,
    /// Device-bridge (adb) settings
    pub device: DeviceConfig,
    /// Operator console settings
    pub console: ConsoleConfig,
}

/// Where and how to reach the device's WebSocket server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Headset IP address, or `localhost` for a desktop build
    pub host: String,

    /// WebSocket port
    pub port: u16,

    /// Upper bound on the WebSocket handshake. Sends and receives are never
    /// timed out.
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionConfig {
    /// Validate the configured host and port
    pub fn endpoint(&self) -> Result<Endpoint, ValidationError> {
        Endpoint::new(&self.host, self.port)
    }
}

/// Settings for launching and stopping the task application over adb
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// adb executable (looked up on PATH when relative)
    pub adb_path: PathBuf,

    /// Port adb uses for TCP/IP connections to the headset
    pub adb_port: u16,

    /// Package id of the task application
    pub package_name: String,

    /// Activity started by `launch`
    pub activity: String,

    /// Limit on each adb invocation
    #[serde(with = "duration_secs")]
    pub command_timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            adb_port: 5555,
            package_name: DEFAULT_PACKAGE.to_string(),
            activity: DEFAULT_ACTIVITY.to_string(),
            command_timeout: Duration::from_secs(10),
        }
    }
}

impl DeviceConfig {
    /// adb serial for a headset reachable over TCP/IP
    pub fn serial(&self, host: &str) -> String {
        format!("{}:{}", host, self.adb_port)
    }

    /// Component name passed to `am start -n`
    pub fn component(&self) -> String {
        format!("{}/{}", self.package_name, self.activity)
    }
}

/// Operator console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Lines kept in the console history
    pub max_lines: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { max_lines: 500 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 4444);
        assert_eq!(config.device.adb_port, 5555);
        assert_eq!(
            config.device.component(),
            "com.BrainDevelopmentandDisordersLab.task_vr_rdk/com.unity3d.player.UnityPlayerActivity"
        );
        assert_eq!(config.device.serial("10.0.0.5"), "10.0.0.5:5555");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [connection]
            host = "10.0.0.5"
            connect_timeout = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.host, "10.0.0.5");
        assert_eq!(config.connection.port, DEFAULT_PORT);
        assert_eq!(config.connection.connect_timeout, Duration::from_millis(2500));
        assert_eq!(config.console.max_lines, 500);
    }

    #[test]
    fn test_endpoint_validation() {
        let mut connection = ConnectionConfig::default();
        assert_eq!(connection.endpoint().unwrap().url(), "ws://localhost:4444");

        connection.host = "headset.local".to_string();
        assert!(connection.endpoint().is_err());
    }
}
