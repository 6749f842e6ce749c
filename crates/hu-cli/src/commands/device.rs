//! One-shot launch and quit of the task application

use anyhow::{Context, Result};

use crate::output::{print_info, print_success};
use hu_core::adb::AdbLauncher;
use hu_core::config::DeviceConfig;
use hu_core::traits::DeviceLauncher;
use hu_core::types::is_valid_host;
use hu_core::{HuError, ValidationError};

#[derive(Debug, Clone, Copy)]
enum DeviceAction {
    Launch,
    Quit,
}

fn validated(host: &str) -> Result<&str, HuError> {
    let host = host.trim();
    if !is_valid_host(host) {
        return Err(ValidationError::InvalidHost(host.to_string()).into());
    }
    Ok(host)
}

async fn run_action(
    launcher: &dyn DeviceLauncher,
    host: &str,
    action: DeviceAction,
) -> Result<(), HuError> {
    match action {
        DeviceAction::Launch => launcher.launch(host).await?,
        DeviceAction::Quit => launcher.quit(host).await?,
    }
    Ok(())
}

/// Launch the task application on `host`
pub async fn launch_command(config: &DeviceConfig, host: &str) -> Result<()> {
    let host = validated(host)?;
    print_info(&format!("Launching {} on {}...", config.package_name, host));

    let launcher = AdbLauncher::new(config.clone());
    run_action(&launcher, host, DeviceAction::Launch)
        .await
        .with_context(|| format!("Failed to launch application on {}", host))?;

    print_success("Application launched successfully");
    Ok(())
}

/// Stop the task application on `host`
pub async fn quit_command(config: &DeviceConfig, host: &str) -> Result<()> {
    let host = validated(host)?;
    print_info(&format!("Stopping {} on {}...", config.package_name, host));

    let launcher = AdbLauncher::new(config.clone());
    run_action(&launcher, host, DeviceAction::Quit)
        .await
        .with_context(|| format!("Failed to stop application on {}", host))?;

    print_success("Application stopped");
    Ok(())
}
