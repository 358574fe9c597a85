//! Synchronization errors

use surveylink_mission::{ControlCommand, MissionError};
use thiserror::Error;

/// Errors raised by the network-bound operations and the live channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Mission does not exist
    #[error("Mission not found")]
    NotFound,

    /// Credential rejected by the backend
    #[error("Unauthorized")]
    Unauthorized,

    /// Credential could not be obtained from the identity provider
    #[error("Credential unavailable: {0}")]
    Credential(String),

    /// Command not legal, rejected client-side or by the backend
    #[error("Command {command} rejected: {reason}")]
    InvalidTransition {
        /// Rejected command
        command: ControlCommand,
        /// Rejection reason
        reason: String,
    },

    /// Backend refused the request for a non-transport reason
    #[error("Request rejected with HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response or frame could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No mission view is ready to accept the request
    #[error("No active mission")]
    NoActiveMission,

    /// Response arrived after the view moved on and was dropped
    #[error("Response discarded: mission view changed")]
    Discarded,

    /// View runtime is no longer running
    #[error("Mission view closed")]
    ViewClosed,
}

impl SyncError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => SyncError::NotFound,
            401 | 403 => SyncError::Unauthorized,
            409 | 422 => SyncError::Rejected {
                status,
                message: body,
            },
            _ => SyncError::Network(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Whether the outer auth guard should handle this failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SyncError::Unauthorized | SyncError::Credential(_))
    }

    /// Attribute a backend rejection to the command that caused it
    pub fn for_command(self, command: ControlCommand) -> Self {
        match self {
            SyncError::Rejected { message, .. } => SyncError::InvalidTransition {
                command,
                reason: message,
            },
            other => other,
        }
    }
}

impl From<MissionError> for SyncError {
    fn from(error: MissionError) -> Self {
        match error {
            MissionError::InvalidTransition { command, status } => SyncError::InvalidTransition {
                command,
                reason: format!("mission is {}", status),
            },
            other => SyncError::Protocol(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        SyncError::Network(error.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        match error {
            // Handshake rejected by the server, e.g. a refused credential
            tokio_tungstenite::tungstenite::Error::Http(response) => {
                let body = response
                    .body()
                    .as_deref()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default();
                SyncError::from_status(response.status().as_u16(), body)
            }
            other => SyncError::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        SyncError::Protocol(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveylink_mission::MissionStatus;

    #[test]
    fn test_status_mapping() {
        assert_eq!(SyncError::from_status(404, String::new()), SyncError::NotFound);
        assert_eq!(SyncError::from_status(401, String::new()), SyncError::Unauthorized);
        assert_eq!(SyncError::from_status(403, String::new()), SyncError::Unauthorized);
        assert!(matches!(
            SyncError::from_status(409, "busy".to_string()),
            SyncError::Rejected { status: 409, .. }
        ));
        assert!(matches!(
            SyncError::from_status(500, "boom".to_string()),
            SyncError::Network(_)
        ));
    }

    #[test]
    fn test_rejection_attributed_to_command() {
        let err = SyncError::from_status(409, "already paused".to_string())
            .for_command(ControlCommand::Pause);
        assert_eq!(
            err,
            SyncError::InvalidTransition {
                command: ControlCommand::Pause,
                reason: "already paused".to_string(),
            }
        );
        assert_eq!(
            SyncError::NotFound.for_command(ControlCommand::Pause),
            SyncError::NotFound
        );
    }

    #[test]
    fn test_client_side_rejection_message() {
        let err: SyncError = MissionStatus::Completed
            .check_command(ControlCommand::Abort)
            .unwrap_err()
            .into();
        assert_eq!(err.to_string(), "Command abort rejected: mission is completed");
    }

    #[test]
    fn test_rejected_handshake_maps_status() {
        use tokio_tungstenite::tungstenite::{http::Response, Error};

        let refused = Response::builder().status(401).body(None).unwrap();
        assert_eq!(SyncError::from(Error::Http(refused)), SyncError::Unauthorized);

        let forbidden = Response::builder().status(403).body(None).unwrap();
        assert!(SyncError::from(Error::Http(forbidden)).is_auth_failure());

        let missing = Response::builder().status(404).body(None).unwrap();
        assert_eq!(SyncError::from(Error::Http(missing)), SyncError::NotFound);

        assert!(matches!(
            SyncError::from(Error::ConnectionClosed),
            SyncError::Network(_)
        ));
    }

    #[test]
    fn test_auth_failures() {
        assert!(SyncError::Unauthorized.is_auth_failure());
        assert!(SyncError::Credential("expired".to_string()).is_auth_failure());
        assert!(!SyncError::NotFound.is_auth_failure());
    }
}
