//! Live telemetry channel
//!
//! Provides the streaming subscription for one mission identity:
//! - JSON text frames tagged by `type`
//! - `join` sent once on connect, carrying the mission identity
//! - `telemetry` pushed by the server, delivered in arrival order
//!
//! Frames for any other mission identity are dropped here, so a stream
//! only ever yields samples for the identity it was opened for.

use crate::error::SyncError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use surveylink_mission::{MissionId, TelemetrySample};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Channel frame format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelFrame {
    /// Client interest in one mission
    Join {
        /// Mission to receive telemetry for
        #[serde(rename = "missionId")]
        mission_id: MissionId,
    },

    /// Server-pushed telemetry event
    Telemetry(TelemetrySample),

    /// Any frame type this client does not handle
    #[serde(other)]
    Unknown,
}

/// Ordered telemetry for one mission. Ends when the connection closes.
pub type TelemetryStream = BoxStream<'static, Result<TelemetrySample, SyncError>>;

/// Opens streaming subscriptions
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Connect and announce interest in `mission_id`
    async fn connect(&self, mission_id: &MissionId, token: &str)
        -> Result<TelemetryStream, SyncError>;
}

/// `TelemetrySource` over WebSocket
#[derive(Debug, Clone)]
pub struct WsTelemetrySource {
    url: Url,
    connect_timeout: Option<Duration>,
}

impl WsTelemetrySource {
    /// Create a source for `url` (`ws://` or `wss://`)
    pub fn new(url: &str, connect_timeout: Option<Duration>) -> Result<Self, SyncError> {
        let url = Url::parse(url)
            .map_err(|e| SyncError::Protocol(format!("invalid channel url: {}", e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(SyncError::Protocol(
                "channel url must start with ws:// or wss://".to_string(),
            ));
        }
        Ok(Self {
            url,
            connect_timeout,
        })
    }
}

#[async_trait]
impl TelemetrySource for WsTelemetrySource {
    async fn connect(
        &self,
        mission_id: &MissionId,
        token: &str,
    ) -> Result<TelemetryStream, SyncError> {
        let mut request = self.url.as_str().into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SyncError::Credential(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let connect = connect_async(request);
        let (mut ws_stream, _) = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| SyncError::Network("channel connect timed out".to_string()))??,
            None => connect.await?,
        };

        let join = serde_json::to_string(&ChannelFrame::Join {
            mission_id: mission_id.clone(),
        })?;
        ws_stream.send(Message::Text(join)).await?;
        info!(mission_id = %mission_id, url = %self.url, "telemetry channel joined");

        let scope = mission_id.clone();
        let stream = ws_stream.filter_map(move |message| {
            let decoded = decode_message(message, &scope);
            async move { decoded }
        });
        Ok(stream.boxed())
    }
}

fn decode_message(
    message: Result<Message, tokio_tungstenite::tungstenite::Error>,
    scope: &MissionId,
) -> Option<Result<TelemetrySample, SyncError>> {
    match message {
        Ok(Message::Text(text)) => decode_frame(&text, scope),
        Ok(Message::Close(frame)) => {
            debug!(mission_id = %scope, ?frame, "telemetry channel closed by server");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(SyncError::from(e))),
    }
}

/// Decode one text frame, keeping only telemetry for `scope`
pub fn decode_frame(text: &str, scope: &MissionId) -> Option<Result<TelemetrySample, SyncError>> {
    match serde_json::from_str::<ChannelFrame>(text) {
        Ok(ChannelFrame::Telemetry(sample)) if &sample.mission_id == scope => Some(Ok(sample)),
        Ok(ChannelFrame::Telemetry(sample)) => {
            debug!(
                mission_id = %scope,
                foreign = %sample.mission_id,
                "dropping telemetry for another mission"
            );
            None
        }
        Ok(_) => None,
        Err(e) => {
            warn!(mission_id = %scope, error = %e, "undecodable telemetry frame");
            Some(Err(SyncError::Protocol(e.to_string())))
        }
    }
}
