//! Control command dispatch
//!
//! Commands are guarded client-side against the current status and sent
//! only when legal. Nothing is assumed locally: the caller applies exactly
//! the status the backend confirms.

use crate::api::MissionApi;
use crate::error::SyncError;
use std::sync::Arc;
use surveylink_mission::{ControlCommand, MissionId, MissionStatus};
use tracing::{debug, info, warn};

/// Sends control commands for mission views
#[derive(Clone)]
pub struct ControlDispatcher {
    api: Arc<dyn MissionApi>,
}

impl ControlDispatcher {
    /// Create a dispatcher over `api`
    pub fn new(api: Arc<dyn MissionApi>) -> Self {
        Self { api }
    }

    /// Client-side guard: is `command` legal from `current`?
    pub fn check(current: MissionStatus, command: ControlCommand) -> Result<(), SyncError> {
        current.check_command(command).map_err(SyncError::from)
    }

    /// Guard, then send `command`; returns the backend-confirmed status
    pub async fn send(
        &self,
        mission_id: &MissionId,
        command: ControlCommand,
        current: MissionStatus,
        token: &str,
    ) -> Result<MissionStatus, SyncError> {
        Self::check(current, command)?;
        self.send_unchecked(mission_id, command, token).await
    }

    /// Send a command that has already passed the guard
    pub(crate) async fn send_unchecked(
        &self,
        mission_id: &MissionId,
        command: ControlCommand,
        token: &str,
    ) -> Result<MissionStatus, SyncError> {
        debug!(mission_id = %mission_id, %command, "dispatching control command");
        match self.api.send_command(mission_id, command, token).await {
            Ok(status) => {
                info!(mission_id = %mission_id, %command, %status, "control command confirmed");
                Ok(status)
            }
            Err(e) => {
                warn!(mission_id = %mission_id, %command, error = %e, "control command failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ControlDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlDispatcher").finish_non_exhaustive()
    }
}
