//! adb integration for launching the task application
//!
//! Drives the Android debug bridge the same way an operator would from a
//! shell: `adb connect` to the headset over TCP/IP, then `am start` or
//! `am force-stop` for the task package. `localhost` is a desktop build of
//! the task, so both operations succeed without touching adb.

use std::io;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::DeviceConfig;
use crate::error::LaunchError;
use crate::traits::DeviceLauncher;
use crate::types::is_local_host;

/// [`DeviceLauncher`] backed by the `adb` command-line tool
#[derive(Debug, Clone)]
pub struct AdbLauncher {
    config: DeviceConfig,
}

impl AdbLauncher {
    /// Create a launcher from device settings
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Run one adb step and return its trimmed stdout
    ///
    /// adb reports several failures on stdout with a zero exit status, so
    /// the output is checked for them as well.
    async fn run(&self, step: &'static str, args: &[&str]) -> Result<String, LaunchError> {
        tracing::info!(
            "{}: {} {}",
            step,
            self.config.adb_path.display(),
            args.join(" ")
        );

        let mut command = Command::new(&self.config.adb_path);
        command.args(args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.config.command_timeout, command.output()).await
        {
            Err(_) => {
                return Err(LaunchError::Timeout {
                    step,
                    timeout: self.config.command_timeout,
                })
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LaunchError::AdbNotFound(self.config.adb_path.clone()))
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() || reports_failure(&stdout) {
            let detail = if stderr.is_empty() { stdout } else { stderr };
            return Err(LaunchError::CommandFailed {
                step,
                stderr: detail,
            });
        }

        tracing::debug!("{} result: {}", step, stdout);
        Ok(stdout)
    }

    async fn connect(&self, host: &str) -> Result<(), LaunchError> {
        let serial = self.config.serial(host);
        self.run("adb connect", &["connect", &serial]).await?;
        Ok(())
    }
}

/// Failure messages adb prints on stdout while still exiting 0
fn reports_failure(stdout: &str) -> bool {
    let lower = stdout.to_ascii_lowercase();
    lower.starts_with("failed to connect")
        || lower.starts_with("cannot connect")
        || lower.contains("error:")
}

#[async_trait]
impl DeviceLauncher for AdbLauncher {
    async fn launch(&self, host: &str) -> Result<(), LaunchError> {
        if is_local_host(host) {
            tracing::info!("Development mode: skipping adb launch for localhost");
            return Ok(());
        }

        self.connect(host).await?;

        let serial = self.config.serial(host);
        let component = self.config.component();
        self.run(
            "Launch application",
            &["-s", &serial, "shell", "am", "start", "-n", &component],
        )
        .await?;

        tracing::info!("Application launched on {}", host);
        Ok(())
    }

    async fn quit(&self, host: &str) -> Result<(), LaunchError> {
        if is_local_host(host) {
            tracing::info!("Development mode: skipping adb quit for localhost");
            return Ok(());
        }

        let serial = self.config.serial(host);
        self.run(
            "Quit application",
            &[
                "-s",
                &serial,
                "shell",
                "am",
                "force-stop",
                &self.config.package_name,
            ],
        )
        .await?;

        tracing::info!("Application stopped on {}", host);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn launcher_with(adb_path: PathBuf) -> AdbLauncher {
        AdbLauncher::new(DeviceConfig {
            adb_path,
            command_timeout: Duration::from_secs(5),
            ..DeviceConfig::default()
        })
    }

    #[test]
    fn test_reports_failure() {
        assert!(reports_failure("failed to connect to '10.0.0.9:5555': Connection refused"));
        assert!(reports_failure("Error: Activity class does not exist."));
        assert!(!reports_failure("connected to 10.0.0.9:5555"));
        assert!(!reports_failure("Starting: Intent { cmp=pkg/.Main }"));
    }

    #[tokio::test]
    async fn test_localhost_never_runs_adb() {
        let launcher = launcher_with(PathBuf::from("/definitely/not/adb"));
        launcher.launch("localhost").await.unwrap();
        launcher.quit("localhost").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_adb() {
        let launcher = launcher_with(PathBuf::from("/definitely/not/adb"));
        let err = launcher.launch("10.0.0.9").await.unwrap_err();
        assert!(matches!(err, LaunchError::AdbNotFound(_)));
    }

    #[cfg(unix)]
    fn fake_adb(dir: &std::path::Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("adb");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_with(fake_adb(dir.path(), "echo 'device offline' >&2; exit 1"));
        match launcher.quit("10.0.0.9").await.unwrap_err() {
            LaunchError::CommandFailed { step, stderr } => {
                assert_eq!(step, "Quit application");
                assert_eq!(stderr, "device offline");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_launch() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_with(fake_adb(dir.path(), "echo ok"));
        launcher.launch("10.0.0.9").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_failure_on_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_with(fake_adb(
            dir.path(),
            "echo \"failed to connect to '$2': Connection refused\"",
        ));
        let err = launcher.launch("10.0.0.9").await.unwrap_err();
        assert!(matches!(
            err,
            LaunchError::CommandFailed {
                step: "adb connect",
                ..
            }
        ));
    }
}
