//! Mission data model and wire documents
//!
//! Field names follow the backend JSON contract (`lat`/`lng`, camelCase
//! telemetry keys).

use crate::status::MissionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mission identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(String);

impl MissionId {
    /// Wrap a raw identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MissionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MissionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// GeoJSON position order `[lng, lat]`
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Image capture pattern flown over the survey area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoveragePattern {
    /// Parallel passes
    Grid,
    /// Two perpendicular grids
    Crosshatch,
    /// Boundary only
    Perimeter,
}

impl fmt::Display for CoveragePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoveragePattern::Grid => "grid",
            CoveragePattern::Crosshatch => "crosshatch",
            CoveragePattern::Perimeter => "perimeter",
        })
    }
}

/// Capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureParams {
    /// Flight altitude in meters
    pub altitude: f64,
    /// Image overlap percentage
    pub overlap: f64,
    /// Coverage pattern
    pub pattern: CoveragePattern,
}

/// Plan document as returned by `GET /missions/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    /// Identifier echoed by the backend, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MissionId>,
    /// Ordered waypoints
    pub waypoints: Vec<Coordinate>,
    /// Capture parameters
    pub params: CaptureParams,
}

impl PlanDocument {
    /// Bind the document to the identity it was requested for.
    ///
    /// The requested identity wins over any echoed one so the plan always
    /// matches the view that asked for it.
    pub fn into_plan(self, requested: &MissionId) -> MissionPlan {
        if let Some(echoed) = &self.id {
            if echoed != requested {
                tracing::warn!(
                    requested = %requested,
                    echoed = %echoed,
                    "plan document identity differs from request"
                );
            }
        }
        MissionPlan {
            id: requested.clone(),
            waypoints: self.waypoints,
            params: self.params,
        }
    }
}

/// Immutable mission definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionPlan {
    /// Mission identity
    pub id: MissionId,
    /// Ordered waypoints
    pub waypoints: Vec<Coordinate>,
    /// Capture parameters
    pub params: CaptureParams,
}

/// Server-pushed telemetry event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Mission the sample belongs to
    pub mission_id: MissionId,
    /// Current drone position
    pub position: Coordinate,
    /// Progress percentage (0-100)
    pub progress: f64,
    /// Status reported by the backend
    pub status: MissionStatus,
}

/// Last known execution state from `GET /missions/{id}/state`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Persisted status
    pub status: MissionStatus,
    /// Persisted progress percentage
    #[serde(default)]
    pub progress: f64,
    /// Last known position, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinate>,
}

impl StateSnapshot {
    /// Copy the snapshot into a telemetry sample.
    ///
    /// This is the only place a sample is produced locally; it requires a position.
    pub fn to_sample(&self, mission_id: &MissionId) -> Option<TelemetrySample> {
        self.position.map(|position| TelemetrySample {
            mission_id: mission_id.clone(),
            position,
            progress: self.progress,
            status: self.status,
        })
    }
}

/// Live channel connection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No channel open
    #[default]
    Disconnected,
    /// Channel requested, join not yet acknowledged by a successful connect
    Connecting,
    /// Channel open and joined
    Connected,
}

/// Entry of `GET /missions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionListItem {
    /// Mission identity
    pub id: MissionId,
    /// Coverage pattern
    pub pattern: CoveragePattern,
    /// Flight altitude in meters
    pub altitude: f64,
    /// Image overlap percentage
    pub overlap: f64,
}

impl fmt::Display for MissionListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} @ {}m (overlap: {}%)",
            self.id, self.pattern, self.altitude, self.overlap
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_document_decodes_without_id() {
        let doc: PlanDocument = serde_json::from_str(
            r#"{
                "waypoints": [{"lat": 0.0, "lng": 0.0}, {"lat": 1.0, "lng": 1.0}],
                "params": {"altitude": 100, "overlap": 20, "pattern": "grid"}
            }"#,
        )
        .unwrap();

        let plan = doc.into_plan(&MissionId::new("m-1"));
        assert_eq!(plan.id.as_str(), "m-1");
        assert_eq!(plan.waypoints.len(), 2);
        assert_eq!(plan.params.pattern, CoveragePattern::Grid);
    }

    #[test]
    fn test_requested_identity_wins() {
        let doc = PlanDocument {
            id: Some(MissionId::new("other")),
            waypoints: vec![],
            params: CaptureParams {
                altitude: 50.0,
                overlap: 10.0,
                pattern: CoveragePattern::Perimeter,
            },
        };
        assert_eq!(doc.into_plan(&MissionId::new("m-2")).id, MissionId::new("m-2"));
    }

    #[test]
    fn test_telemetry_wire_shape() {
        let sample: TelemetrySample = serde_json::from_str(
            r#"{"missionId":"m-1","position":{"lat":10,"lng":20},"progress":55,"status":"in_progress"}"#,
        )
        .unwrap();
        assert_eq!(sample.mission_id, MissionId::new("m-1"));
        assert_eq!(sample.position, Coordinate::new(10.0, 20.0));
        assert_eq!(sample.status, MissionStatus::InProgress);
    }

    #[test]
    fn test_snapshot_to_sample_needs_position() {
        let id = MissionId::new("m-1");
        let without: StateSnapshot = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert_eq!(without.progress, 0.0);
        assert!(without.to_sample(&id).is_none());

        let with: StateSnapshot = serde_json::from_str(
            r#"{"status":"paused","progress":40,"position":{"lat":10,"lng":20}}"#,
        )
        .unwrap();
        let sample = with.to_sample(&id).unwrap();
        assert_eq!(sample.progress, 40.0);
        assert_eq!(sample.status, MissionStatus::Paused);
    }

    #[test]
    fn test_list_item_display() {
        let item = MissionListItem {
            id: MissionId::new("m-9"),
            pattern: CoveragePattern::Crosshatch,
            altitude: 120.0,
            overlap: 30.0,
        };
        assert_eq!(item.to_string(), "m-9 - crosshatch @ 120m (overlap: 30%)");
    }
}
