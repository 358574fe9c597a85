//! Mission state synchronization for SurveyLink
//!
//! Keeps one mission view consistent with the backend:
//! - Plan loading and one-time state hydration over HTTP
//! - A streaming telemetry channel over WebSocket, scoped to one mission
//! - Guarded control commands applied only on backend confirmation
//! - A subscription manager that never keeps two channels open
//! - The `MissionView` reducer and the tokio `ViewRuntime` that drives it
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use surveylink_core::SyncConfig;
//! use surveylink_mission::ControlCommand;
//! use surveylink_sync::{runtime, StaticCredentials, ViewContext};
//!
//! # async fn demo() -> Result<(), surveylink_sync::SyncError> {
//! let ctx = ViewContext::from_config(
//!     &SyncConfig::default(),
//!     Arc::new(StaticCredentials::new("token")),
//! )?;
//! let (handle, mut events) = runtime::spawn(ctx);
//! handle.navigate("m-1")?;
//! events.frames.changed().await.ok();
//! handle.send_command(ControlCommand::Start).await?;
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod channel;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod loader;
pub mod runtime;
pub mod subscription;
pub mod view;

pub use api::{HttpMissionApi, MissionApi};
pub use channel::{ChannelFrame, TelemetrySource, TelemetryStream, WsTelemetrySource};
pub use context::{CredentialProvider, StaticCredentials, ViewContext};
pub use dispatcher::ControlDispatcher;
pub use error::SyncError;
pub use runtime::{spawn, ViewEvents, ViewHandle, ViewRuntime};
pub use subscription::{SubscriptionChange, SubscriptionId, SubscriptionManager};
pub use view::{Effect, MissionView, Notice, Ticket};
