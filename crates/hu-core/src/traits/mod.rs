//! Core trait definitions

mod launcher;

pub use launcher::DeviceLauncher;
