//! View projection
//!
//! Pure derivation of render data from the plan and the session. The
//! output depends on its inputs only, so projecting the same state twice
//! yields identical values and identical serialized bytes.

use crate::model::{ConnectionState, Coordinate, MissionPlan};
use crate::session::SessionState;
use crate::status::{ControlCommand, MissionStatus};
use serde::{Deserialize, Serialize};

/// Ordered path for the map surface, positions in GeoJSON `[lng, lat]` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    /// Line coordinates
    pub coordinates: Vec<[f64; 2]>,
}

impl PathGeometry {
    /// Path through the plan's waypoints in plan order
    pub fn from_plan(plan: &MissionPlan) -> Self {
        Self {
            coordinates: plan.waypoints.iter().map(Coordinate::to_lng_lat).collect(),
        }
    }

    /// A line needs at least two positions to be drawn
    pub fn is_drawable(&self) -> bool {
        self.coordinates.len() >= 2
    }

    /// GeoJSON `Feature<LineString>` for map sources
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": self.coordinates,
            },
            "properties": {},
        })
    }
}

/// Camera placement for the map surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    /// Camera centre
    pub center: Coordinate,
    /// Zoom level
    pub zoom: f64,
}

/// Camera movement requested from the map surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraDirective {
    /// One-time, non-animated recentre (hydration)
    JumpTo {
        /// Target centre
        center: Coordinate,
        /// Target zoom
        zoom: f64,
    },
    /// Animated tracking of live telemetry
    FlyTo {
        /// Target centre
        center: Coordinate,
        /// Animation speed
        speed: f64,
        /// Animation curve
        curve: f64,
    },
}

/// Render data for one mission view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Planned flight path
    pub path: PathGeometry,
    /// Live drone marker, when a sample is known
    pub marker: Option<Coordinate>,
    /// Progress as a ratio in `[0, 1]`
    pub progress_ratio: f64,
    /// Current status
    pub status: MissionStatus,
    /// Operator-facing status label
    pub status_label: &'static str,
    /// Commands the operator may issue now
    pub enabled_commands: Vec<ControlCommand>,
    /// Live channel state
    pub connection: ConnectionState,
}

impl Projection {
    /// Progress in percent, for the progress bar caption
    pub fn progress_percent(&self) -> f64 {
        self.progress_ratio * 100.0
    }

    /// Whether `command` is currently offered to the operator
    pub fn is_enabled(&self, command: ControlCommand) -> bool {
        self.enabled_commands.contains(&command)
    }
}

/// Project the current plan and session into render data
pub fn project(plan: &MissionPlan, session: &SessionState) -> Projection {
    let telemetry = session.telemetry();
    let progress_ratio = telemetry
        .map(|sample| progress_ratio(sample.progress))
        .unwrap_or(0.0);
    let status = session.status();

    Projection {
        path: PathGeometry::from_plan(plan),
        marker: telemetry.map(|sample| sample.position),
        progress_ratio,
        status,
        status_label: status.label(),
        enabled_commands: status.available_commands(),
        connection: session.connection(),
    }
}

/// Initial camera: first waypoint, or the origin for an empty plan
pub fn initial_camera(plan: &MissionPlan, zoom: f64) -> CameraView {
    CameraView {
        center: plan
            .waypoints
            .first()
            .copied()
            .unwrap_or(Coordinate::new(0.0, 0.0)),
        zoom,
    }
}

fn progress_ratio(progress: f64) -> f64 {
    if progress.is_finite() {
        (progress / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CaptureParams, CoveragePattern, MissionId, StateSnapshot, TelemetrySample};
    use proptest::prelude::*;

    fn plan(waypoints: Vec<Coordinate>) -> MissionPlan {
        MissionPlan {
            id: MissionId::new("m-1"),
            waypoints,
            params: CaptureParams {
                altitude: 100.0,
                overlap: 20.0,
                pattern: CoveragePattern::Grid,
            },
        }
    }

    #[test]
    fn test_pending_projection() {
        let plan = plan(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]);
        let session = SessionState::new(MissionId::new("m-1"));

        let projection = project(&plan, &session);
        assert_eq!(projection.path.coordinates, vec![[0.0, 0.0], [1.0, 1.0]]);
        assert!(projection.path.is_drawable());
        assert_eq!(projection.marker, None);
        assert_eq!(projection.progress_ratio, 0.0);
        assert_eq!(projection.status_label, "Pending");
        assert_eq!(projection.enabled_commands, vec![ControlCommand::Start]);
    }

    #[test]
    fn test_path_uses_lng_lat_order() {
        let plan = plan(vec![Coordinate::new(10.0, 20.0), Coordinate::new(11.0, 21.0)]);
        let path = PathGeometry::from_plan(&plan);
        assert_eq!(path.coordinates[0], [20.0, 10.0]);

        let geojson = path.to_geojson();
        assert_eq!(geojson["geometry"]["type"], "LineString");
        assert_eq!(geojson["geometry"]["coordinates"][1][0], 21.0);
    }

    #[test]
    fn test_paused_hydration_projection() {
        let plan = plan(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]);
        let mut session = SessionState::new(MissionId::new("m-1"));
        session.apply_hydration(&StateSnapshot {
            status: MissionStatus::Paused,
            progress: 40.0,
            position: Some(Coordinate::new(10.0, 20.0)),
        });

        let projection = project(&plan, &session);
        assert_eq!(projection.marker, Some(Coordinate::new(10.0, 20.0)));
        assert!((projection.progress_percent() - 40.0).abs() < 1e-9);
        assert_eq!(
            projection.enabled_commands,
            vec![ControlCommand::Resume, ControlCommand::Abort]
        );
        assert!(!projection.is_enabled(ControlCommand::Pause));
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(progress_ratio(150.0), 1.0);
        assert_eq!(progress_ratio(-5.0), 0.0);
        assert_eq!(progress_ratio(f64::NAN), 0.0);
    }

    #[test]
    fn test_initial_camera() {
        let empty = plan(vec![]);
        assert_eq!(initial_camera(&empty, 14.0).center, Coordinate::new(0.0, 0.0));
        assert!(!PathGeometry::from_plan(&empty).is_drawable());

        let plan = plan(vec![Coordinate::new(5.0, 6.0)]);
        let camera = initial_camera(&plan, 12.0);
        assert_eq!(camera.center, Coordinate::new(5.0, 6.0));
        assert_eq!(camera.zoom, 12.0);
    }

    #[test]
    fn test_camera_directive_wire_shape() {
        let directive = CameraDirective::JumpTo {
            center: Coordinate::new(1.0, 2.0),
            zoom: 14.0,
        };
        let json = serde_json::to_value(directive).unwrap();
        assert_eq!(json["kind"], "jump_to");
        assert_eq!(json["center"]["lng"], 2.0);
    }

    proptest! {
        #[test]
        fn prop_projection_is_pure(
            waypoints in prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 0..12),
            progress in -10.0f64..120.0,
            lat in -90.0f64..90.0,
            lng in -180.0f64..180.0,
        ) {
            let plan = plan(waypoints.into_iter().map(|(lat, lng)| Coordinate::new(lat, lng)).collect());
            let mut session = SessionState::new(MissionId::new("m-1"));
            session.apply_confirmation(MissionStatus::InProgress);
            session.apply_telemetry(TelemetrySample {
                mission_id: MissionId::new("m-1"),
                position: Coordinate::new(lat, lng),
                progress,
                status: MissionStatus::InProgress,
            });

            let first = project(&plan, &session);
            let second = project(&plan, &session);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(
                serde_json::to_vec(&first).unwrap(),
                serde_json::to_vec(&second).unwrap()
            );
            prop_assert!((0.0..=1.0).contains(&first.progress_ratio));
        }
    }
}
