//! Mission domain errors

use crate::status::{ControlCommand, MissionStatus};
use thiserror::Error;

/// Errors raised by the mission state machine and wire parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissionError {
    /// Command is not legal from the current status
    #[error("Command {command} is not allowed while mission is {status}")]
    InvalidTransition {
        /// Rejected command
        command: ControlCommand,
        /// Status at the time of rejection
        status: MissionStatus,
    },

    /// Unrecognized status string
    #[error("Unknown mission status: {0}")]
    UnknownStatus(String),

    /// Unrecognized command string
    #[error("Unknown control command: {0}")]
    UnknownCommand(String),
}
