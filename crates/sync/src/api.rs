//! Backend request/response contract
//!
//! `MissionApi` is the seam between the view runtime and the backend.
//! `HttpMissionApi` implements it over HTTP with bearer credentials:
//! - `GET  /missions/{id}`            mission plan
//! - `GET  /missions/{id}/state`      last known execution state
//! - `POST /missions/{id}/{command}`  control command, returns `{ status }`
//! - `GET  /missions`                 mission list
//! - `GET  /reports/summary`          report summary

use crate::error::SyncError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use surveylink_mission::{
    ControlCommand, MissionId, MissionListItem, MissionPlan, MissionStatus, PlanDocument,
    ReportSummary, StateSnapshot,
};
use tracing::debug;
use url::Url;

/// Backend operations used by a mission view
#[async_trait]
pub trait MissionApi: Send + Sync {
    /// Fetch the immutable mission definition
    async fn fetch_plan(&self, mission_id: &MissionId, token: &str)
        -> Result<MissionPlan, SyncError>;

    /// Fetch the last persisted execution state
    async fn fetch_state(
        &self,
        mission_id: &MissionId,
        token: &str,
    ) -> Result<StateSnapshot, SyncError>;

    /// Send a control command; returns the status confirmed by the backend
    async fn send_command(
        &self,
        mission_id: &MissionId,
        command: ControlCommand,
        token: &str,
    ) -> Result<MissionStatus, SyncError>;

    /// List the operator's missions
    async fn list_missions(&self, token: &str) -> Result<Vec<MissionListItem>, SyncError>;

    /// Fetch aggregate mission reports
    async fn report_summary(&self, token: &str) -> Result<ReportSummary, SyncError>;
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: MissionStatus,
}

/// `MissionApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpMissionApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpMissionApi {
    /// Create a client for `base_url`, with an optional per-request timeout.
    ///
    /// Without a timeout a request may wait indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, SyncError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::Protocol(format!("invalid api url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Protocol(format!(
                "api url cannot be a base: {}",
                base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, token: &str) -> Result<T, SyncError> {
        debug!(%url, "GET");
        let response = self.client.get(url).bearer_auth(token).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SyncError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::from_status(status.as_u16(), body));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::Protocol(format!("unexpected API response: {}", e)))
}

#[async_trait]
impl MissionApi for HttpMissionApi {
    async fn fetch_plan(
        &self,
        mission_id: &MissionId,
        token: &str,
    ) -> Result<MissionPlan, SyncError> {
        let url = self.endpoint(&["missions", mission_id.as_str()]);
        let document: PlanDocument = self.get_json(url, token).await?;
        Ok(document.into_plan(mission_id))
    }

    async fn fetch_state(
        &self,
        mission_id: &MissionId,
        token: &str,
    ) -> Result<StateSnapshot, SyncError> {
        let url = self.endpoint(&["missions", mission_id.as_str(), "state"]);
        self.get_json(url, token).await
    }

    async fn send_command(
        &self,
        mission_id: &MissionId,
        command: ControlCommand,
        token: &str,
    ) -> Result<MissionStatus, SyncError> {
        let url = self.endpoint(&["missions", mission_id.as_str(), command.as_str()]);
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .send()
            .await?;
        let body: StatusResponse = decode(response)
            .await
            .map_err(|e| e.for_command(command))?;
        Ok(body.status)
    }

    async fn list_missions(&self, token: &str) -> Result<Vec<MissionListItem>, SyncError> {
        self.get_json(self.endpoint(&["missions"]), token).await
    }

    async fn report_summary(&self, token: &str) -> Result<ReportSummary, SyncError> {
        self.get_json(self.endpoint(&["reports", "summary"]), token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let api = HttpMissionApi::new("http://localhost:4000", None).unwrap();
        assert_eq!(
            api.endpoint(&["missions", "m-1", "state"]).as_str(),
            "http://localhost:4000/missions/m-1/state"
        );

        let prefixed = HttpMissionApi::new("http://localhost:4000/api/", None).unwrap();
        assert_eq!(
            prefixed.endpoint(&["missions", "m-1", "abort"]).as_str(),
            "http://localhost:4000/api/missions/m-1/abort"
        );
    }

    #[test]
    fn test_mission_id_is_escaped() {
        let api = HttpMissionApi::new("http://localhost:4000", None).unwrap();
        assert_eq!(
            api.endpoint(&["missions", "a/b"]).as_str(),
            "http://localhost:4000/missions/a%2Fb"
        );
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(HttpMissionApi::new("not a url", None).is_err());
        assert!(HttpMissionApi::new("mailto:ops@example.com", None).is_err());
    }
}
