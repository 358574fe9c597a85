//! Authoritative per-view session state
//!
//! A `SessionState` exists once per active mission identity. Its fields are
//! private; the only mutations are the hydration write (once), the
//! telemetry write (repeatedly) and the confirmed-command write, plus the
//! channel bookkeeping of the connection state.

use crate::model::{ConnectionState, Coordinate, MissionId, StateSnapshot, TelemetrySample};
use crate::status::MissionStatus;
use serde::Serialize;

/// Result of offering a telemetry sample to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryOutcome {
    /// Status and sample were replaced together
    Applied,
    /// Sample belongs to a different mission identity
    ForeignMission,
    /// Session is terminal, nothing changes
    Terminal,
}

/// Single authoritative mutable record for one mission view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    mission_id: MissionId,
    status: MissionStatus,
    telemetry: Option<TelemetrySample>,
    connection: ConnectionState,
    #[serde(skip)]
    hydrated: bool,
    // Set once a confirmation or live event has written the status.
    #[serde(skip)]
    live_written: bool,
}

impl SessionState {
    /// Fresh session in its default `pending` state
    pub fn new(mission_id: MissionId) -> Self {
        Self {
            mission_id,
            status: MissionStatus::Pending,
            telemetry: None,
            connection: ConnectionState::Disconnected,
            hydrated: false,
            live_written: false,
        }
    }

    /// Mission identity this session is scoped to
    pub fn mission_id(&self) -> &MissionId {
        &self.mission_id
    }

    /// Current authoritative status
    pub fn status(&self) -> MissionStatus {
        self.status
    }

    /// Latest telemetry sample, if any
    pub fn telemetry(&self) -> Option<&TelemetrySample> {
        self.telemetry.as_ref()
    }

    /// Live channel connection state
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Whether the hydration write has happened
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Seed the session from the persisted snapshot.
    ///
    /// Applies at most once, and only before any confirmation or live event
    /// has written the session. Returns the position to recentre on when the
    /// snapshot carried one.
    pub fn apply_hydration(&mut self, snapshot: &StateSnapshot) -> Option<Coordinate> {
        if self.hydrated {
            tracing::debug!(mission_id = %self.mission_id, "hydration already applied");
            return None;
        }
        self.hydrated = true;
        if self.live_written {
            tracing::debug!(
                mission_id = %self.mission_id,
                snapshot = %snapshot.status,
                status = %self.status,
                "hydration arrived after live writes, ignoring"
            );
            return None;
        }
        self.status = self.status.apply(snapshot.status);
        self.telemetry = snapshot.to_sample(&self.mission_id);
        self.telemetry.as_ref().map(|sample| sample.position)
    }

    /// Overwrite status and telemetry from one live event.
    ///
    /// Both fields change together or not at all.
    pub fn apply_telemetry(&mut self, sample: TelemetrySample) -> TelemetryOutcome {
        if sample.mission_id != self.mission_id {
            return TelemetryOutcome::ForeignMission;
        }
        if self.status.is_terminal() {
            return TelemetryOutcome::Terminal;
        }
        self.live_written = true;
        self.status = sample.status;
        self.telemetry = Some(sample);
        TelemetryOutcome::Applied
    }

    /// Replace the status with a server-confirmed value.
    ///
    /// Returns false when a terminal status absorbed the write.
    pub fn apply_confirmation(&mut self, confirmed: MissionStatus) -> bool {
        self.live_written = true;
        let next = self.status.apply(confirmed);
        let applied = next == confirmed;
        self.status = next;
        applied
    }

    /// Record the live channel's connection state
    pub fn set_connection(&mut self, connection: ConnectionState) {
        self.connection = connection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(id: &str, progress: f64, status: MissionStatus) -> TelemetrySample {
        TelemetrySample {
            mission_id: MissionId::new(id),
            position: Coordinate::new(progress, -progress),
            progress,
            status,
        }
    }

    #[test]
    fn test_initial_state() {
        let session = SessionState::new(MissionId::new("m-1"));
        assert_eq!(session.status(), MissionStatus::Pending);
        assert!(session.telemetry().is_none());
        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert!(!session.is_hydrated());
    }

    #[test]
    fn test_hydration_with_position_seeds_telemetry() {
        let mut session = SessionState::new(MissionId::new("m-1"));
        let snapshot = StateSnapshot {
            status: MissionStatus::Paused,
            progress: 40.0,
            position: Some(Coordinate::new(10.0, 20.0)),
        };

        let recentre = session.apply_hydration(&snapshot);
        assert_eq!(recentre, Some(Coordinate::new(10.0, 20.0)));
        assert_eq!(session.status(), MissionStatus::Paused);
        assert_eq!(session.telemetry().unwrap().progress, 40.0);
    }

    #[test]
    fn test_hydration_applies_once() {
        let mut session = SessionState::new(MissionId::new("m-1"));
        session.apply_hydration(&StateSnapshot {
            status: MissionStatus::InProgress,
            progress: 0.0,
            position: None,
        });
        let second = session.apply_hydration(&StateSnapshot {
            status: MissionStatus::Completed,
            progress: 100.0,
            position: Some(Coordinate::new(1.0, 1.0)),
        });

        assert!(second.is_none());
        assert_eq!(session.status(), MissionStatus::InProgress);
        assert!(session.telemetry().is_none());
    }

    #[test]
    fn test_late_hydration_cannot_leave_terminal() {
        let mut session = SessionState::new(MissionId::new("m-1"));
        session.apply_confirmation(MissionStatus::InProgress);
        session.apply_confirmation(MissionStatus::Aborted);

        let recentre = session.apply_hydration(&StateSnapshot {
            status: MissionStatus::InProgress,
            progress: 10.0,
            position: Some(Coordinate::new(1.0, 1.0)),
        });
        assert!(recentre.is_none());
        assert_eq!(session.status(), MissionStatus::Aborted);
        assert!(session.is_hydrated());
    }

    #[test]
    fn test_late_hydration_keeps_live_sample() {
        let mut session = SessionState::new(MissionId::new("m-1"));
        session.apply_telemetry(sample("m-1", 55.0, MissionStatus::Paused));

        session.apply_hydration(&StateSnapshot {
            status: MissionStatus::InProgress,
            progress: 20.0,
            position: None,
        });
        assert_eq!(session.status(), MissionStatus::Paused);
        assert_eq!(session.telemetry().unwrap().progress, 55.0);
    }

    #[test]
    fn test_foreign_sample_ignored() {
        let mut session = SessionState::new(MissionId::new("m-1"));
        session.apply_confirmation(MissionStatus::InProgress);

        let outcome = session.apply_telemetry(sample("m-2", 50.0, MissionStatus::Completed));
        assert_eq!(outcome, TelemetryOutcome::ForeignMission);
        assert_eq!(session.status(), MissionStatus::InProgress);
        assert!(session.telemetry().is_none());
    }

    #[test]
    fn test_completion_event_then_commands_absorbed() {
        let mut session = SessionState::new(MissionId::new("m-1"));
        session.apply_confirmation(MissionStatus::InProgress);

        let outcome = session.apply_telemetry(sample("m-1", 100.0, MissionStatus::Completed));
        assert_eq!(outcome, TelemetryOutcome::Applied);
        assert_eq!(session.status(), MissionStatus::Completed);

        assert!(!session.apply_confirmation(MissionStatus::Paused));
        assert_eq!(session.status(), MissionStatus::Completed);
        assert_eq!(
            session.apply_telemetry(sample("m-1", 20.0, MissionStatus::InProgress)),
            TelemetryOutcome::Terminal
        );
        assert_eq!(session.telemetry().unwrap().progress, 100.0);
    }

    #[test]
    fn test_confirmation_then_telemetry_last_write_wins() {
        let mut session = SessionState::new(MissionId::new("m-1"));
        session.apply_confirmation(MissionStatus::InProgress);
        session.apply_confirmation(MissionStatus::Paused);
        session.apply_telemetry(sample("m-1", 30.0, MissionStatus::InProgress));
        assert_eq!(session.status(), MissionStatus::InProgress);

        session.apply_confirmation(MissionStatus::Paused);
        assert_eq!(session.status(), MissionStatus::Paused);
    }

    fn live_status() -> impl Strategy<Value = MissionStatus> {
        prop::sample::select(MissionStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_event_atomicity(progress in 0.0f64..=100.0, status in live_status()) {
            let mut session = SessionState::new(MissionId::new("m-1"));
            session.apply_confirmation(MissionStatus::InProgress);
            let event = sample("m-1", progress, status);

            session.apply_telemetry(event.clone());
            prop_assert_eq!(session.status(), event.status);
            prop_assert_eq!(session.telemetry(), Some(&event));
        }

        #[test]
        fn prop_second_event_wins(
            p1 in 0.0f64..=100.0,
            p2 in 0.0f64..=100.0,
            s1 in prop::sample::select(vec![MissionStatus::InProgress, MissionStatus::Paused]),
            s2 in live_status(),
        ) {
            let mut session = SessionState::new(MissionId::new("m-1"));
            session.apply_confirmation(MissionStatus::InProgress);
            let e2 = sample("m-1", p2, s2);

            session.apply_telemetry(sample("m-1", p1, s1));
            session.apply_telemetry(e2.clone());
            prop_assert_eq!(session.status(), e2.status);
            prop_assert_eq!(session.telemetry(), Some(&e2));
        }
    }
}
