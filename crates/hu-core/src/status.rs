//! Device and experiment status
//!
//! [`StatusModel`] holds the latest [`StatusSnapshot`]. It is mutated only by
//! applying parsed status updates and by resetting it when a new connection
//! begins. The operator's fixation toggle lives with the control side.
//!
//! Two sets of defaults exist. A status update that omits a field gets the
//! "unknown" default for that field; a reset (no device yet) gets the
//! "offline" defaults. Keeping them distinct lets the operator tell "the
//! device did not say" apart from "there is no device".

use serde::{Deserialize, Serialize};

use hu_protocol::StatusFields;

/// Name and model shown when a status update omits them
pub const UNKNOWN: &str = "Unknown";
/// Name and model shown before any device has reported
pub const OFFLINE: &str = "Offline";
/// Block shown when no block is running
pub const INACTIVE_BLOCK: &str = "Inactive";

/// Point-in-time copy of device and experiment status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub device_name: String,
    pub device_model: String,
    /// Battery charge in [0, 1]
    pub device_battery: f64,
    pub active_block: String,
    pub current_trial: u32,
    pub total_trials: u32,
    pub fixation_required: bool,
}

impl StatusSnapshot {
    /// Snapshot shown while no device is connected
    pub fn offline() -> Self {
        Self {
            device_name: OFFLINE.to_string(),
            device_model: OFFLINE.to_string(),
            device_battery: 0.0,
            active_block: INACTIVE_BLOCK.to_string(),
            current_trial: 0,
            total_trials: 0,
            fixation_required: true,
        }
    }

    /// Trial progress as a rounded percentage; 0 when there are no trials
    pub fn progress_percent(&self) -> u32 {
        if self.total_trials == 0 {
            return 0;
        }
        (100.0 * f64::from(self.current_trial) / f64::from(self.total_trials)).round() as u32
    }

    /// Battery charge as a rounded percentage
    pub fn battery_percent(&self) -> u32 {
        (self.device_battery * 100.0).round() as u32
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::offline()
    }
}

/// Holder of the latest status snapshot
#[derive(Debug, Clone, Default)]
pub struct StatusModel {
    snapshot: StatusSnapshot,
}

impl StatusModel {
    /// Create a model holding the offline snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a status update
    ///
    /// This is a full replace: every field the update omits takes its
    /// documented default rather than keeping its previous value. The
    /// fixation requirement is the exception; it only changes when the
    /// update carries it.
    pub fn apply(&mut self, fields: &StatusFields) -> &StatusSnapshot {
        let battery = fields.device_battery.unwrap_or(0.0);
        self.snapshot = StatusSnapshot {
            device_name: fields
                .device_name
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            device_model: fields
                .device_model
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            device_battery: if battery.is_finite() {
                battery.clamp(0.0, 1.0)
            } else {
                0.0
            },
            active_block: fields
                .active_block
                .clone()
                .unwrap_or_else(|| INACTIVE_BLOCK.to_string()),
            current_trial: fields.current_trial.unwrap_or(0),
            total_trials: fields.total_trials.unwrap_or(0),
            fixation_required: fields
                .fixation_required
                .unwrap_or(self.snapshot.fixation_required),
        };
        &self.snapshot
    }

    /// Restore the offline defaults
    pub fn reset(&mut self) {
        self.snapshot = StatusSnapshot::offline();
    }

    /// The latest snapshot
    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Trial progress of the latest snapshot
    pub fn progress_percent(&self) -> u32 {
        self.snapshot.progress_percent()
    }
}
