//! Output formatting for the terminal panel
//!
//! Status tables, console lines coloured by content, and the coloured
//! one-line messages used by every command.

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{settings::Style, Table, Tabled};

use hu_client::{ConsoleLine, ControlPanel};
use hu_core::ConnectionState;

/// How a console line is coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Error,
    Warning,
    Success,
    Info,
}

impl Tone {
    /// Classify a console line by its wording
    pub fn of(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("error") {
            Tone::Error
        } else if lower.contains("warning") {
            Tone::Warning
        } else if lower.contains("connected") || lower.contains("success") {
            Tone::Success
        } else {
            Tone::Info
        }
    }

    fn color(self) -> Color {
        match self {
            Tone::Error => Color::Red,
            Tone::Warning => Color::Yellow,
            Tone::Success => Color::Green,
            Tone::Info => Color::Blue,
        }
    }
}

/// Colour of the connection indicator
pub fn state_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Error => Color::Red,
        ConnectionState::Disconnected => Color::DarkGrey,
    }
}

/// Format the panel's connection and status as a table
pub fn format_status(panel: &ControlPanel) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "FIELD")]
        field: &'static str,
        #[tabled(rename = "VALUE")]
        value: String,
    }

    let status = panel.status();
    let connection = match panel.last_error() {
        Some(cause) => format!("{} ({})", panel.state().label(), cause),
        None => panel.state().label().to_string(),
    };
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" }.to_string();

    let rows = vec![
        Row {
            field: "Connection",
            value: connection,
        },
        Row {
            field: "Device",
            value: status.device_name.clone(),
        },
        Row {
            field: "Model",
            value: status.device_model.clone(),
        },
        Row {
            field: "Battery",
            value: format!("{}%", status.battery_percent()),
        },
        Row {
            field: "Block",
            value: status.active_block.clone(),
        },
        Row {
            field: "Trial",
            value: format!(
                "{}/{} ({}%)",
                status.current_trial,
                status.total_trials,
                status.progress_percent()
            ),
        },
        Row {
            field: "Fixation required",
            value: yes_no(panel.fixation_required()),
        },
        Row {
            field: "Task started",
            value: yes_no(panel.task_started()),
        },
        Row {
            field: "Calibration started",
            value: yes_no(panel.calibration_started()),
        },
        Row {
            field: "Launched on",
            value: panel.launched_on().unwrap_or("-").to_string(),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print a console line, coloured by content
pub fn print_console_line(line: &ConsoleLine) {
    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        Print(&line.stamp),
        Print(" "),
        SetForegroundColor(Tone::of(&line.text).color()),
        Print(&line.text),
        ResetColor,
        Print("\n")
    );
}

/// Print a connection-state change
pub fn print_state(state: ConnectionState, cause: Option<&str>) {
    let mut stdout = std::io::stdout();
    let detail = cause.map(|c| format!(": {}", c)).unwrap_or_default();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(state_color(state)),
        Print("● "),
        ResetColor,
        Print(state.label()),
        Print(detail),
        Print("\n")
    );
}

fn print_tagged(out: &mut impl Write, color: Color, symbol: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(symbol),
        Print(" "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a success message in green to stdout
pub fn print_success(msg: &str) {
    print_tagged(&mut std::io::stdout(), Color::Green, "✓", msg);
}

/// Print an error message in red to stderr
pub fn print_error(msg: &str) {
    print_tagged(&mut std::io::stderr(), Color::Red, "✗", msg);
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    print_tagged(&mut std::io::stderr(), Color::Yellow, "⚠", msg);
}

/// Print an informational message in cyan to stdout
pub fn print_info(msg: &str) {
    print_tagged(&mut std::io::stdout(), Color::Cyan, "ℹ", msg);
}
