//! Device-launch collaborator

use async_trait::async_trait;

use crate::error::LaunchError;

/// Starts and stops the task application on a device
///
/// Runs independently of the WebSocket transport. The only coupling is that
/// a successful launch is required before connecting to a non-local host.
#[async_trait]
pub trait DeviceLauncher: Send + Sync {
    /// Start the task application on `host`
    async fn launch(&self, host: &str) -> Result<(), LaunchError>;

    /// Force-stop the task application on `host`
    async fn quit(&self, host: &str) -> Result<(), LaunchError>;
}
