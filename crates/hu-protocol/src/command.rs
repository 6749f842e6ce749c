//! Outbound command tokens
//!
//! Commands travel as bare text frames with no envelope and no
//! acknowledgement. The device answers some of them with a JSON string
//! reply, which the router surfaces on the console.

use std::fmt;
use std::str::FromStr;

/// A command token sent to the device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Request a capture of every display
    Screenshot,
    /// Start the experiment task
    StartTask,
    /// Start eye-tracker calibration
    StartCalibration,
    /// Require fixation before trials advance
    EnableFixation,
    /// Stop requiring fixation
    DisableFixation,
    /// End the experiment
    Kill,
    /// Any other token; forwarded to the device unchanged
    Other(String),
}

impl Command {
    /// Every token in the fixed vocabulary
    pub const KNOWN: [Command; 6] = [
        Command::Screenshot,
        Command::StartTask,
        Command::StartCalibration,
        Command::EnableFixation,
        Command::DisableFixation,
        Command::Kill,
    ];

    /// The wire representation of this command
    pub fn as_token(&self) -> &str {
        match self {
            Command::Screenshot => "screenshot",
            Command::StartTask => "start_task",
            Command::StartCalibration => "start_calibration",
            Command::EnableFixation => "enable_fixation",
            Command::DisableFixation => "disable_fixation",
            Command::Kill => "kill",
            Command::Other(token) => token,
        }
    }

    /// Map a token to a command. Unrecognised tokens become `Other`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "screenshot" => Command::Screenshot,
            "start_task" => Command::StartTask,
            "start_calibration" => Command::StartCalibration,
            "enable_fixation" => Command::EnableFixation,
            "disable_fixation" => Command::DisableFixation,
            "kill" => Command::Kill,
            other => Command::Other(other.to_string()),
        }
    }

    /// Whether this token belongs to the fixed vocabulary
    pub fn is_known(&self) -> bool {
        !matches!(self, Command::Other(_))
    }

    /// The token that flips the device's fixation requirement away from `required`
    pub fn fixation_toggle(required: bool) -> Self {
        if required {
            Command::DisableFixation
        } else {
            Command::EnableFixation
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Command {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_token(s))
    }
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        Self::from_token(s)
    }
}
