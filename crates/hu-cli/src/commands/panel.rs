//! Interactive control panel
//!
//! Reads operator commands from stdin and renders events from the network
//! context as they arrive. Both are handled on the control side; the
//! connection itself lives on the network thread.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output::{
    format_status, print_console_line, print_error, print_info, print_state, print_success,
};
use hu_client::{ClientEvent, ControlPanel, NetworkContext, PanelError};
use hu_core::adb::AdbLauncher;
use hu_core::config::ClientConfig;
use hu_core::time::current_time_secs;
use hu_core::ValidationError;

const HELP: &str = "\
Commands:
  connect [host] [port]   Connect to the device (defaults to the last target)
  disconnect              Close the connection
  launch [host]           Start the task application over adb
  quit-app [host]         Stop the task application
  screenshot              Request a display capture
  start-task              Start the experiment task
  start-calibration       Start eye-tracker calibration (task must be running)
  fixation                Toggle the fixation requirement
  kill                    Stop the task on the device
  send <token>            Send a raw command token
  status                  Show connection and experiment status
  logs                    Show the console history
  help                    Show this help
  exit                    Leave the panel";

/// Options for `headsup panel`
#[derive(Debug, Clone)]
pub struct PanelOptions {
    pub host: String,
    pub port: u16,
    /// Connect as soon as the panel starts
    pub connect: bool,
    /// Where received screenshots are written
    pub screenshot_dir: PathBuf,
}

/// One line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Connect {
        host: Option<String>,
        port: Option<String>,
    },
    Disconnect,
    Launch {
        host: Option<String>,
    },
    QuitApp {
        host: Option<String>,
    },
    Screenshot,
    StartTask,
    StartCalibration,
    Fixation,
    Kill,
    Send(String),
    Status,
    Logs,
    Help,
    Exit,
}

/// Input the panel could not understand
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command '{0}'; type 'help' for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Parse one line of input; blank lines yield `None`
pub fn parse_panel_command(line: &str) -> Result<Option<PanelCommand>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<String> = words.map(str::to_string).collect();
    let mut args = args.into_iter();

    let command = match name.to_ascii_lowercase().as_str() {
        "connect" => PanelCommand::Connect {
            host: args.next(),
            port: args.next(),
        },
        "disconnect" => PanelCommand::Disconnect,
        "launch" => PanelCommand::Launch { host: args.next() },
        "quit-app" => PanelCommand::QuitApp { host: args.next() },
        "screenshot" => PanelCommand::Screenshot,
        "start-task" => PanelCommand::StartTask,
        "start-calibration" => PanelCommand::StartCalibration,
        "fixation" => PanelCommand::Fixation,
        "kill" => PanelCommand::Kill,
        "send" => match args.next() {
            Some(token) => PanelCommand::Send(token),
            None => return Err(ParseError::Usage("send <token>")),
        },
        "status" => PanelCommand::Status,
        "logs" => PanelCommand::Logs,
        "help" | "?" => PanelCommand::Help,
        "exit" | "quit" => PanelCommand::Exit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    if args.next().is_some() {
        tracing::debug!("Ignoring extra arguments to '{}'", name);
    }
    Ok(Some(command))
}

/// File extension for a screenshot, sniffed from its magic bytes
fn image_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else {
        "bin"
    }
}

struct Session {
    panel: ControlPanel,
    launcher: AdbLauncher,
    host: String,
    port: String,
    screenshot_dir: PathBuf,
    screenshots_saved: u32,
    printed_seq: u64,
}

impl Session {
    /// Print console lines added since the last flush
    fn flush_console(&mut self) {
        for line in self.panel.console_since(self.printed_seq) {
            print_console_line(line);
        }
        self.printed_seq = self.panel.next_seq();
    }

    fn on_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::State(change) => {
                let (state, cause) = (change.state, change.cause.clone());
                self.panel.apply_event(ClientEvent::State(change));
                print_state(state, cause.as_deref());
            }
            ClientEvent::Screenshot(bytes) => {
                self.panel.apply_event(ClientEvent::Screenshot(bytes));
                if let Some(image) = self.panel.take_screenshot() {
                    self.save_screenshot(&image);
                }
            }
            other => self.panel.apply_event(other),
        }
        self.flush_console();
    }

    fn save_screenshot(&mut self, image: &[u8]) {
        self.screenshots_saved += 1;
        let name = format!(
            "screenshot-{}-{}.{}",
            current_time_secs(),
            self.screenshots_saved,
            image_extension(image)
        );
        let path = self.screenshot_dir.join(name);
        match write_file(&path, image) {
            Ok(()) => print_success(&format!("Screenshot saved to {}", path.display())),
            Err(e) => print_error(&format!("{:#}", e)),
        }
    }

    async fn execute(&mut self, command: PanelCommand) {
        let result = match command {
            PanelCommand::Connect { host, port } => {
                if let Some(host) = host {
                    self.host = host;
                }
                if let Some(port) = port {
                    self.port = port;
                }
                self.panel.connect(&self.host, &self.port).map(|_| ())
            }
            PanelCommand::Disconnect => {
                self.panel.disconnect();
                Ok(())
            }
            PanelCommand::Launch { host } => {
                if let Some(host) = host {
                    self.host = host;
                }
                self.panel.launch(&self.launcher, &self.host).await
            }
            PanelCommand::QuitApp { host } => {
                let host = host.unwrap_or_else(|| self.host.clone());
                self.panel.quit(&self.launcher, &host).await
            }
            PanelCommand::Screenshot => self.panel.screenshot(),
            PanelCommand::StartTask => self.panel.start_task(),
            PanelCommand::StartCalibration => self.panel.start_calibration(),
            PanelCommand::Fixation => self.panel.toggle_fixation().map(|command| {
                print_info(&format!("Requested {}", command));
            }),
            PanelCommand::Kill => self.panel.kill(),
            PanelCommand::Send(token) => self.panel.send_token(&token).map(|_| ()),
            PanelCommand::Status => {
                println!("{}", format_status(&self.panel));
                Ok(())
            }
            PanelCommand::Logs => {
                for line in self.panel.console() {
                    print_console_line(line);
                }
                Ok(())
            }
            PanelCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            PanelCommand::Exit => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(PanelError::Validation(ValidationError::NotLaunched(host))) => {
                print_error(&format!(
                    "Application has not been launched on {}; run 'launch' first",
                    host
                ));
            }
            Err(PanelError::Validation(e)) => print_error(&e.to_string()),
            // Everything else is already on the console
            Err(e) => tracing::debug!("Panel action failed: {}", e),
        }
        self.flush_console();
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write screenshot {:?}", path))
}

/// Run the interactive panel until `exit` or end of input
pub async fn run_panel(config: &ClientConfig, options: PanelOptions) -> Result<()> {
    let mut context = NetworkContext::spawn(Some(config.connection.connect_timeout))
        .context("Failed to start network thread")?;
    let mut events = context
        .take_events()
        .context("Event stream already taken")?;

    let mut session = Session {
        panel: ControlPanel::new(context.handle(), config.console.max_lines),
        launcher: AdbLauncher::new(config.device.clone()),
        host: options.host,
        port: options.port.to_string(),
        screenshot_dir: options.screenshot_dir,
        screenshots_saved: 0,
        printed_seq: 0,
    };

    print_info("Headsup control panel. Type 'help' for commands.");
    if options.connect {
        session
            .execute(PanelCommand::Connect {
                host: None,
                port: None,
            })
            .await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => session.on_event(event),
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match parse_panel_command(&line) {
                    Ok(Some(PanelCommand::Exit)) => break,
                    Ok(Some(command)) => session.execute(command).await,
                    Ok(None) => {}
                    Err(e) => print_error(&e.to_string()),
                }
            }
        }
    }

    print_info("Closing connection...");
    context.shutdown_async().await;
    while let Ok(event) = events.try_recv() {
        session.on_event(event);
    }
    Ok(())
}
