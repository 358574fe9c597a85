//! Per-view collaborators
//!
//! A `ViewContext` is built for each mission view and dropped with it.
//! It carries everything the view needs from the outside world, so no
//! process-wide client state is involved.

use crate::api::{HttpMissionApi, MissionApi};
use crate::channel::{TelemetrySource, WsTelemetrySource};
use crate::error::SyncError;
use async_trait::async_trait;
use std::sync::Arc;
use surveylink_core::{SyncConfig, ViewConfig};

/// Supplies bearer credentials from the external identity provider
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token
    async fn bearer_token(&self) -> Result<String, SyncError>;
}

/// Fixed token, e.g. from the command line or environment
#[derive(Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Result<String, SyncError> {
        if self.token.trim().is_empty() {
            return Err(SyncError::Credential("no token configured".to_string()));
        }
        Ok(self.token.clone())
    }
}

/// Collaborators for one mission view
#[derive(Clone)]
pub struct ViewContext {
    /// Backend request/response API
    pub api: Arc<dyn MissionApi>,
    /// Live channel factory
    pub telemetry: Arc<dyn TelemetrySource>,
    /// Credential provider
    pub credentials: Arc<dyn CredentialProvider>,
    /// Camera parameters
    pub view: ViewConfig,
}

impl ViewContext {
    /// Assemble a context from explicit collaborators
    pub fn new(
        api: Arc<dyn MissionApi>,
        telemetry: Arc<dyn TelemetrySource>,
        credentials: Arc<dyn CredentialProvider>,
        view: ViewConfig,
    ) -> Self {
        Self {
            api,
            telemetry,
            credentials,
            view,
        }
    }

    /// HTTP + WebSocket context from configuration
    pub fn from_config(
        config: &SyncConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, SyncError> {
        let api = HttpMissionApi::new(&config.api.base_url, config.timeouts.request())?;
        let telemetry =
            WsTelemetrySource::new(&config.channel.url, config.timeouts.channel_connect())?;
        Ok(Self::new(
            Arc::new(api),
            Arc::new(telemetry),
            credentials,
            config.view.clone(),
        ))
    }
}
