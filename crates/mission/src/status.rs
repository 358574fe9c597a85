//! Mission status state machine
//!
//! `pending` is the only initial status. `completed` and `aborted` are
//! terminal: no command is dispatched from them and no write leaves them.
//! Outside the terminal states every authoritative write (telemetry or
//! confirmed command) simply replaces the status, last write wins.

use crate::error::MissionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mission lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Planned, not yet started
    #[default]
    Pending,
    /// Drone is flying the plan
    InProgress,
    /// Execution suspended by the operator
    Paused,
    /// Plan finished (terminal)
    Completed,
    /// Execution cancelled (terminal)
    Aborted,
}

impl MissionStatus {
    /// All statuses in lifecycle order
    pub const ALL: [MissionStatus; 5] = [
        MissionStatus::Pending,
        MissionStatus::InProgress,
        MissionStatus::Paused,
        MissionStatus::Completed,
        MissionStatus::Aborted,
    ];

    /// Check if status is terminal (completed or aborted)
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Aborted)
    }

    /// Statuses during which the live telemetry channel is kept open
    pub fn is_live(&self) -> bool {
        matches!(self, MissionStatus::InProgress | MissionStatus::Paused)
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Pending => "pending",
            MissionStatus::InProgress => "in_progress",
            MissionStatus::Paused => "paused",
            MissionStatus::Completed => "completed",
            MissionStatus::Aborted => "aborted",
        }
    }

    /// Operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            MissionStatus::Pending => "Pending",
            MissionStatus::InProgress => "In progress",
            MissionStatus::Paused => "Paused",
            MissionStatus::Completed => "Completed",
            MissionStatus::Aborted => "Aborted",
        }
    }

    /// Whether `command` may be dispatched from this status
    pub fn accepts(&self, command: ControlCommand) -> bool {
        command.legal_sources().contains(self)
    }

    /// Commands that may be dispatched from this status, in display order
    pub fn available_commands(&self) -> Vec<ControlCommand> {
        ControlCommand::ALL
            .into_iter()
            .filter(|command| self.accepts(*command))
            .collect()
    }

    /// Client-side guard run before a command is sent
    pub fn check_command(&self, command: ControlCommand) -> Result<(), MissionError> {
        if self.accepts(command) {
            Ok(())
        } else {
            Err(MissionError::InvalidTransition {
                command,
                status: *self,
            })
        }
    }

    /// Resolve an authoritative write against the current status.
    ///
    /// Terminal statuses absorb every write; otherwise the incoming value wins.
    pub fn apply(self, incoming: MissionStatus) -> MissionStatus {
        if self.is_terminal() {
            self
        } else {
            incoming
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionStatus {
    type Err = MissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MissionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| MissionError::UnknownStatus(s.to_string()))
    }
}

/// User-issued control command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    /// Begin a pending mission
    Start,
    /// Suspend a running mission
    Pause,
    /// Continue a paused mission
    Resume,
    /// Cancel a running or paused mission
    Abort,
}

impl ControlCommand {
    /// All commands in display order
    pub const ALL: [ControlCommand; 4] = [
        ControlCommand::Start,
        ControlCommand::Pause,
        ControlCommand::Resume,
        ControlCommand::Abort,
    ];

    /// Statuses from which this command may be sent
    pub fn legal_sources(&self) -> &'static [MissionStatus] {
        match self {
            ControlCommand::Start => &[MissionStatus::Pending],
            ControlCommand::Pause => &[MissionStatus::InProgress],
            ControlCommand::Resume => &[MissionStatus::Paused],
            ControlCommand::Abort => &[MissionStatus::InProgress, MissionStatus::Paused],
        }
    }

    /// Status the server is expected to confirm.
    ///
    /// Informational only: the confirmed value always comes from the server.
    pub fn expected_target(&self) -> MissionStatus {
        match self {
            ControlCommand::Start | ControlCommand::Resume => MissionStatus::InProgress,
            ControlCommand::Pause => MissionStatus::Paused,
            ControlCommand::Abort => MissionStatus::Aborted,
        }
    }

    /// URL path segment for `POST /missions/{id}/{segment}`
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlCommand::Start => "start",
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Abort => "abort",
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlCommand {
    type Err = MissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlCommand::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| MissionError::UnknownCommand(s.to_string()))
    }
}
