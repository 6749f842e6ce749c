//! headsup: Terminal control panel for the Headsup client
//!
//! Provides the `headsup` binary: an interactive panel driving the
//! connection core, plus one-shot device and configuration commands.

pub mod commands;
pub mod output;
