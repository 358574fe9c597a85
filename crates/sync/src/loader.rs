//! Plan loading and state hydration
//!
//! Both are single requests with no retry. A failure leaves the view in
//! its pre-load state; reloading the view is the only way to try again.

use crate::api::MissionApi;
use crate::error::SyncError;
use surveylink_mission::{MissionId, MissionPlan, StateSnapshot};
use tracing::{debug, warn};

/// Fetch the mission definition for `mission_id`
pub async fn load_plan(
    api: &dyn MissionApi,
    mission_id: &MissionId,
    token: &str,
) -> Result<MissionPlan, SyncError> {
    debug!(mission_id = %mission_id, "loading mission plan");
    match api.fetch_plan(mission_id, token).await {
        Ok(plan) => {
            debug!(
                mission_id = %mission_id,
                waypoints = plan.waypoints.len(),
                "mission plan loaded"
            );
            Ok(plan)
        }
        Err(e) => {
            warn!(mission_id = %mission_id, error = %e, "mission plan load failed");
            Err(e)
        }
    }
}

/// Fetch the last persisted execution state for `mission_id`
pub async fn hydrate(
    api: &dyn MissionApi,
    mission_id: &MissionId,
    token: &str,
) -> Result<StateSnapshot, SyncError> {
    debug!(mission_id = %mission_id, "hydrating mission state");
    let result = api.fetch_state(mission_id, token).await;
    match &result {
        Ok(snapshot) => debug!(
            mission_id = %mission_id,
            status = %snapshot.status,
            progress = snapshot.progress,
            "mission state hydrated"
        ),
        Err(e) => warn!(mission_id = %mission_id, error = %e, "hydration failed"),
    }
    result
}
