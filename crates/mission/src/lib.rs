//! Mission domain for SurveyLink
//!
//! Pure types and derivations for a single drone survey mission:
//! - Mission plan, telemetry samples and hydration snapshots
//! - The mission status state machine and control command legality
//! - The authoritative per-view `SessionState` and its three writers
//! - View projection for the external map and chart surfaces
//! - Report summary derivation
//!
//! Nothing in this crate performs I/O. Network access and event
//! scheduling live in `surveylink-sync`.

#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod projection;
pub mod reports;
pub mod session;
pub mod status;

pub use error::MissionError;
pub use model::{
    CaptureParams, ConnectionState, Coordinate, CoveragePattern, MissionId, MissionListItem,
    MissionPlan, PlanDocument, StateSnapshot, TelemetrySample,
};
pub use projection::{
    initial_camera, project, CameraDirective, CameraView, PathGeometry, Projection,
};
pub use reports::{ReportProjection, ReportSummary};
pub use session::{SessionState, TelemetryOutcome};
pub use status::{ControlCommand, MissionStatus};
