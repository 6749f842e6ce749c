//! Headsup CLI
//!
//! Terminal control panel for VR experiments running on a standalone
//! headset:
//! - Interactive panel (connect, drive the task, watch status and logs)
//! - One-shot launch and quit of the task application over adb
//! - Configuration management

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headsup::commands::{self, PanelOptions};
use headsup::output::print_error;
use hu_core::config::{self, ClientConfig};

#[derive(Parser)]
#[command(name = "headsup")]
#[command(author, version, about = "Control panel for VR experiments on a standalone headset")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "HEADSUP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive control panel
    Panel {
        /// Headset IP address or "localhost" (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// WebSocket port (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Connect immediately
        #[arg(long)]
        connect: bool,
        /// Directory screenshots are saved to
        #[arg(long, default_value = ".")]
        screenshot_dir: PathBuf,
    },

    /// Launch the task application on the headset
    Launch {
        /// Headset IP address (defaults to the configured host)
        host: Option<String>,
    },

    /// Stop the task application on the headset
    Quit {
        /// Headset IP address (defaults to the configured host)
        host: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    config::load_client_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {:?}", path),
        None => "Failed to load configuration".to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the panel's stdout stays readable
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match &cli.command {
        Commands::Panel {
            host,
            port,
            connect,
            screenshot_dir,
        } => {
            let config = load_config(&cli)?;
            let options = PanelOptions {
                host: host
                    .clone()
                    .unwrap_or_else(|| config.connection.host.clone()),
                port: port.unwrap_or(config.connection.port),
                connect: *connect,
                screenshot_dir: screenshot_dir.clone(),
            };
            commands::run_panel(&config, options).await
        }

        Commands::Launch { host } => {
            let config = load_config(&cli)?;
            let host = host.as_deref().unwrap_or(&config.connection.host);
            commands::launch_command(&config.device, host).await
        }

        Commands::Quit { host } => {
            let config = load_config(&cli)?;
            let host = host.as_deref().unwrap_or(&config.connection.host);
            commands::quit_command(&config.device, host).await
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(cli.config.as_deref()),
            ConfigAction::Path => commands::config_path(cli.config.as_deref()),
            ConfigAction::Init { force } => commands::config_init(cli.config.as_deref(), *force),
        },
    };

    if let Err(e) = result {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
