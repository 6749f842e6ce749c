//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use hu_core::config;

fn resolve(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path)
}

/// Print the path of the configuration file in use
pub fn config_path(config_path: Option<&Path>) -> Result<()> {
    println!("{}", resolve(config_path).display());
    Ok(())
}

/// Show the effective configuration
///
/// Prints the file when one exists, otherwise the built-in defaults.
pub fn config_show(config_path: Option<&Path>) -> Result<()> {
    let path = resolve(config_path);

    if !path.exists() {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Run 'headsup config init' to create one; built-in defaults:");
        println!();
        let defaults = toml::to_string_pretty(&config::ClientConfig::default())
            .context("Failed to render default configuration")?;
        println!("{}", defaults);
        return Ok(());
    }

    // Parse first so a broken file is reported instead of echoed
    config::load_client_config(Some(&path))
        .with_context(|| format!("Invalid configuration file: {:?}", path))?;

    print_info(&format!("Configuration file: {:?}", path));
    println!();

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    println!("{}", content);

    Ok(())
}

/// Write the default configuration file
pub fn config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let config_file = resolve(config_path);
    let config_dir = config_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_dir);

    if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
        print_success(&format!("Created config directory: {:?}", config_dir));
    }

    if config_file.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", config_file));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(&config_file, generate_default_config())
        .with_context(|| format!("Failed to write config file: {:?}", config_file))?;

    print_success(&format!("Created configuration file: {:?}", config_file));
    Ok(())
}

/// Default configuration with comments
fn generate_default_config() -> String {
    format!(
        r#"# Headsup Configuration

[connection]
# Headset IP address, or "localhost" for a desktop build of the task
host = "localhost"

# Port of the WebSocket server in the task application
port = {port}

# Seconds to wait for the WebSocket handshake
connect_timeout = 10

[device]
# adb executable (looked up on PATH when relative)
adb_path = "adb"

# Port adb uses for TCP/IP connections to the headset
adb_port = 5555

# Task application
package_name = "{package}"
activity = "{activity}"

# Seconds allowed for each adb invocation
command_timeout = 10

[console]
# Lines kept in the panel's console history
max_lines = 500
"#,
        port = config::DEFAULT_PORT,
        package = config::DEFAULT_PACKAGE,
        activity = config::DEFAULT_ACTIVITY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hu_core::config::ClientConfig;

    #[test]
    fn test_generated_config_matches_defaults() {
        let parsed: ClientConfig = toml::from_str(&generate_default_config()).unwrap();
        let defaults = ClientConfig::default();

        assert_eq!(parsed.connection.host, defaults.connection.host);
        assert_eq!(parsed.connection.port, defaults.connection.port);
        assert_eq!(
            parsed.connection.connect_timeout,
            defaults.connection.connect_timeout
        );
        assert_eq!(parsed.device.adb_path, defaults.device.adb_path);
        assert_eq!(parsed.device.component(), defaults.device.component());
        assert_eq!(parsed.device.command_timeout, defaults.device.command_timeout);
        assert_eq!(parsed.console.max_lines, defaults.console.max_lines);
    }

    #[test]
    fn test_init_respects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        config_init(Some(path.as_path()), false).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[console]\nmax_lines = 7\n").unwrap();
        config_init(Some(path.as_path()), false).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("max_lines = 7"));

        config_init(Some(path.as_path()), true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("max_lines = 500"));
    }
}
