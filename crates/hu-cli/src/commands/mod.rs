//! CLI command implementations

mod config;
mod device;
mod panel;

pub use config::{config_init, config_path, config_show};
pub use device::{launch_command, quit_command};
pub use panel::{parse_panel_command, run_panel, PanelCommand, PanelOptions};
