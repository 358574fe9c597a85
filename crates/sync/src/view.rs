//! Mission view reducer
//!
//! `MissionView` owns the plan and the `SessionState` of the mission being
//! viewed and turns every input into a list of `Effect`s for the runtime to
//! execute. It performs no I/O.
//!
//! Every network request is issued with a `Ticket` carrying the mission
//! identity and the view generation. Navigating or leaving bumps the
//! generation, so any response that arrives for an earlier ticket is
//! discarded instead of applied.

use crate::error::SyncError;
use crate::subscription::{SubscriptionChange, SubscriptionId, SubscriptionManager};
use serde::Serialize;
use surveylink_core::ViewConfig;
use surveylink_mission::{
    initial_camera, project, CameraDirective, ConnectionState, ControlCommand, MissionId,
    MissionPlan, MissionStatus, Projection, SessionState, StateSnapshot, TelemetryOutcome,
    TelemetrySample,
};
use tracing::{debug, info};

/// Request generation stamp
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// Mission identity the request was made for
    pub mission_id: MissionId,
    /// View generation at request time
    pub generation: u64,
}

/// Operator-facing notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// Camera movement for the map surface
    Camera(CameraDirective),
    /// Mission does not exist
    NotFound {
        /// Requested mission
        mission_id: MissionId,
    },
    /// Credential rejected; the outer auth guard decides what to do
    Unauthorized {
        /// Mission being viewed
        mission_id: MissionId,
    },
    /// Plan could not be loaded; the view stays in its loading state
    LoadFailed {
        /// Mission being viewed
        mission_id: MissionId,
        /// Failure description
        error: String,
    },
    /// A control command failed; status is unchanged
    CommandFailed {
        /// Mission being viewed
        mission_id: MissionId,
        /// Failed command
        command: ControlCommand,
        /// Failure description
        error: String,
    },
    /// Live channel ended on its own
    ChannelLost {
        /// Mission being viewed
        mission_id: MissionId,
        /// Reason, when known
        reason: Option<String>,
    },
}

/// Work for the runtime
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch the plan
    LoadPlan(Ticket),
    /// Fetch the persisted state
    Hydrate(Ticket),
    /// Connect a live channel
    OpenChannel(SubscriptionId),
    /// Tear down a live channel
    CloseChannel(SubscriptionId),
    /// Publish a notice
    Notify(Notice),
}

#[derive(Debug)]
struct ActiveMission {
    mission_id: MissionId,
    plan: Option<MissionPlan>,
    session: Option<SessionState>,
}

/// Reducer for one mission view
#[derive(Debug)]
pub struct MissionView {
    config: ViewConfig,
    generation: u64,
    active: Option<ActiveMission>,
    subscriptions: SubscriptionManager,
}

impl MissionView {
    /// Empty view showing no mission
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            generation: 0,
            active: None,
            subscriptions: SubscriptionManager::new(),
        }
    }

    /// Mission currently viewed
    pub fn mission_id(&self) -> Option<&MissionId> {
        self.active.as_ref().map(|active| &active.mission_id)
    }

    /// Loaded plan, if any
    pub fn plan(&self) -> Option<&MissionPlan> {
        self.active.as_ref().and_then(|active| active.plan.as_ref())
    }

    /// Session state, once the plan is loaded
    pub fn session(&self) -> Option<&SessionState> {
        self.active.as_ref().and_then(|active| active.session.as_ref())
    }

    /// Current live subscription
    pub fn subscription(&self) -> Option<&SubscriptionId> {
        self.subscriptions.current()
    }

    /// Render data for the current state
    pub fn projection(&self) -> Option<Projection> {
        let active = self.active.as_ref()?;
        Some(project(active.plan.as_ref()?, active.session.as_ref()?))
    }

    /// Whether `ticket` belongs to the current view generation
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
            && self.mission_id() == Some(&ticket.mission_id)
    }

    fn ticket(&self, mission_id: &MissionId) -> Ticket {
        Ticket {
            mission_id: mission_id.clone(),
            generation: self.generation,
        }
    }

    /// Show `mission_id`. Re-navigating to the mission already shown is a no-op.
    pub fn navigate(&mut self, mission_id: MissionId) -> Vec<Effect> {
        if self.mission_id() == Some(&mission_id) {
            return Vec::new();
        }

        self.generation += 1;
        info!(mission_id = %mission_id, generation = self.generation, "navigating to mission");
        self.active = Some(ActiveMission {
            mission_id: mission_id.clone(),
            plan: None,
            session: None,
        });

        let mut effects = self.sync_subscription();
        effects.push(Effect::LoadPlan(self.ticket(&mission_id)));
        effects
    }

    /// Tear the view down; in-flight responses are discarded and the channel closes
    pub fn leave(&mut self) -> Vec<Effect> {
        if self.active.is_none() {
            return Vec::new();
        }
        self.generation += 1;
        if let Some(active) = self.active.take() {
            info!(mission_id = %active.mission_id, "leaving mission view");
        }
        self.sync_subscription()
    }

    /// Plan request completed
    pub fn on_plan_loaded(
        &mut self,
        ticket: &Ticket,
        result: Result<MissionPlan, SyncError>,
    ) -> Vec<Effect> {
        if !self.is_current(ticket) {
            debug!(
                mission_id = %ticket.mission_id,
                generation = ticket.generation,
                "discarding stale plan response"
            );
            return Vec::new();
        }
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        if active.plan.is_some() {
            return Vec::new();
        }

        match result {
            Ok(plan) => {
                let camera = initial_camera(&plan, self.config.recenter_zoom);
                active.plan = Some(plan);
                active.session = Some(SessionState::new(ticket.mission_id.clone()));
                vec![
                    Effect::Notify(Notice::Camera(CameraDirective::JumpTo {
                        center: camera.center,
                        zoom: camera.zoom,
                    })),
                    Effect::Hydrate(ticket.clone()),
                ]
            }
            Err(e) => vec![Effect::Notify(failure_notice(&ticket.mission_id, e))],
        }
    }

    /// Hydration request completed. Failure leaves the session at `pending`.
    pub fn on_hydrated(
        &mut self,
        ticket: &Ticket,
        result: Result<StateSnapshot, SyncError>,
    ) -> Vec<Effect> {
        if !self.is_current(ticket) {
            debug!(
                mission_id = %ticket.mission_id,
                generation = ticket.generation,
                "discarding stale hydration response"
            );
            return Vec::new();
        }
        let recenter_zoom = self.config.recenter_zoom;
        let Some(session) = self.session_mut() else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        match result {
            Ok(snapshot) => {
                if let Some(center) = session.apply_hydration(&snapshot) {
                    effects.push(Effect::Notify(Notice::Camera(CameraDirective::JumpTo {
                        center,
                        zoom: recenter_zoom,
                    })));
                }
            }
            Err(e) if e.is_auth_failure() => {
                effects.push(Effect::Notify(Notice::Unauthorized {
                    mission_id: ticket.mission_id.clone(),
                }));
            }
            Err(e) => {
                debug!(
                    mission_id = %ticket.mission_id,
                    error = %e,
                    "hydration failed, staying pending"
                );
            }
        }
        effects.extend(self.sync_subscription());
        effects
    }

    /// Guard a user command; returns the ticket to send it under
    pub fn request_command(&self, command: ControlCommand) -> Result<Ticket, SyncError> {
        let active = self.active.as_ref().ok_or(SyncError::NoActiveMission)?;
        let session = active.session.as_ref().ok_or(SyncError::NoActiveMission)?;
        session.status().check_command(command)?;
        Ok(self.ticket(&active.mission_id))
    }

    /// Command request completed.
    ///
    /// Returns `None` when the response was stale and discarded.
    pub fn on_command_result(
        &mut self,
        ticket: &Ticket,
        command: ControlCommand,
        result: &Result<MissionStatus, SyncError>,
    ) -> Option<Vec<Effect>> {
        if !self.is_current(ticket) {
            debug!(
                mission_id = %ticket.mission_id,
                %command,
                "discarding stale command response"
            );
            return None;
        }
        let session = self.session_mut()?;

        let mut effects = Vec::new();
        match result {
            Ok(confirmed) => {
                if !session.apply_confirmation(*confirmed) {
                    debug!(
                        mission_id = %ticket.mission_id,
                        %command,
                        confirmed = %confirmed,
                        status = %session.status(),
                        "confirmation absorbed by terminal status"
                    );
                }
            }
            Err(e) if e.is_auth_failure() => {
                effects.push(Effect::Notify(Notice::Unauthorized {
                    mission_id: ticket.mission_id.clone(),
                }));
            }
            Err(e) => {
                effects.push(Effect::Notify(Notice::CommandFailed {
                    mission_id: ticket.mission_id.clone(),
                    command,
                    error: e.to_string(),
                }));
            }
        }
        effects.extend(self.sync_subscription());
        Some(effects)
    }

    /// Live channel connected and joined
    pub fn on_channel_connected(&mut self, id: &SubscriptionId) {
        if !self.subscriptions.is_current(id) {
            return;
        }
        if let Some(session) = self.session_mut() {
            session.set_connection(ConnectionState::Connected);
        }
    }

    /// Live channel ended without being closed by the view. No reconnect is attempted.
    ///
    /// A rejected credential is reported as `Unauthorized` for the auth guard.
    pub fn on_channel_lost(
        &mut self,
        id: &SubscriptionId,
        error: Option<SyncError>,
    ) -> Vec<Effect> {
        if !self.subscriptions.on_lost(id) {
            return Vec::new();
        }
        if let Some(session) = self.session_mut() {
            session.set_connection(ConnectionState::Disconnected);
        }
        let mission_id = id.mission_id.clone();
        let notice = match error {
            Some(e) if e.is_auth_failure() => Notice::Unauthorized { mission_id },
            error => Notice::ChannelLost {
                mission_id,
                reason: error.map(|e| e.to_string()),
            },
        };
        vec![Effect::Notify(notice)]
    }

    /// Telemetry event from a live channel
    pub fn on_telemetry(&mut self, id: &SubscriptionId, sample: TelemetrySample) -> Vec<Effect> {
        if !self.subscriptions.is_current(id) {
            debug!(
                mission_id = %id.mission_id,
                serial = id.serial,
                "ignoring telemetry from closed channel"
            );
            return Vec::new();
        }
        let (fly_speed, fly_curve) = (self.config.fly_speed, self.config.fly_curve);
        let Some(session) = self.session_mut() else {
            return Vec::new();
        };

        let position = sample.position;
        let mut effects = Vec::new();
        match session.apply_telemetry(sample) {
            TelemetryOutcome::Applied => {
                effects.push(Effect::Notify(Notice::Camera(CameraDirective::FlyTo {
                    center: position,
                    speed: fly_speed,
                    curve: fly_curve,
                })));
            }
            outcome => {
                debug!(mission_id = %id.mission_id, ?outcome, "telemetry not applied");
            }
        }
        effects.extend(self.sync_subscription());
        effects
    }

    fn session_mut(&mut self) -> Option<&mut SessionState> {
        self.active.as_mut().and_then(|active| active.session.as_mut())
    }

    fn sync_subscription(&mut self) -> Vec<Effect> {
        let desired = self
            .active
            .as_ref()
            .filter(|active| {
                active
                    .session
                    .as_ref()
                    .is_some_and(|session| session.status().is_live())
            })
            .map(|active| active.mission_id.clone());

        let mut effects = Vec::new();
        for change in self.subscriptions.reconcile(desired.as_ref()) {
            match change {
                SubscriptionChange::Close(id) => {
                    if let Some(session) = self.session_mut() {
                        session.set_connection(ConnectionState::Disconnected);
                    }
                    effects.push(Effect::CloseChannel(id));
                }
                SubscriptionChange::Open(id) => {
                    if let Some(session) = self.session_mut() {
                        session.set_connection(ConnectionState::Connecting);
                    }
                    effects.push(Effect::OpenChannel(id));
                }
            }
        }
        effects
    }
}

fn failure_notice(mission_id: &MissionId, error: SyncError) -> Notice {
    match error {
        SyncError::NotFound => Notice::NotFound {
            mission_id: mission_id.clone(),
        },
        e if e.is_auth_failure() => Notice::Unauthorized {
            mission_id: mission_id.clone(),
        },
        e => Notice::LoadFailed {
            mission_id: mission_id.clone(),
            error: e.to_string(),
        },
    }
}
