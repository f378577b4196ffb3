//! Event publishing over the Pusher Channels HTTP API.

use crate::signing::signed_query;
use crate::{Publisher, PusherConfig, TransportError, TransportResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Largest `data` string the channel service accepts for a single event.
pub const MAX_EVENT_BYTES: usize = 10 * 1024;

#[derive(serde::Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: [&'a str; 1],
    data: &'a str,
}

/// Publisher for a single app on the hosted channel service.
#[derive(Clone, Debug)]
pub struct PusherPublisher {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    key: String,
    secret: String,
}

impl PusherPublisher {
    /// Builds a publisher from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MissingCredential`] naming the first absent value.
    pub fn from_config(cfg: &PusherConfig) -> TransportResult<Self> {
        let app_id = PusherConfig::require(&cfg.app_id, "PUSHER_APP_ID")?.to_string();
        let key = PusherConfig::require(&cfg.key, "PUSHER_KEY")?.to_string();
        let secret = PusherConfig::require(&cfg.secret, "PUSHER_SECRET")?.to_string();
        let base_url = cfg.rest_base_url()?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            app_id,
            key,
            secret,
        })
    }

    fn events_path(&self) -> String {
        format!("/apps/{}/events", self.app_id)
    }

    /// Encodes the trigger body. The payload travels as a JSON string inside `data`.
    fn encode(channel: &str, event: &str, payload: &serde_json::Value) -> TransportResult<Vec<u8>> {
        let data = serde_json::to_string(payload)?;
        if data.len() > MAX_EVENT_BYTES {
            return Err(TransportError::PayloadTooLarge {
                size: data.len(),
                limit: MAX_EVENT_BYTES,
            });
        }
        Ok(serde_json::to_vec(&TriggerBody {
            name: event,
            channels: [channel],
            data: &data,
        })?)
    }
}

#[async_trait]
impl Publisher for PusherPublisher {
    async fn trigger(
        &self,
        channel: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> TransportResult<()> {
        let body = Self::encode(channel, event, payload)?;
        let path = self.events_path();
        let query = signed_query(
            &self.key,
            &self.secret,
            "POST",
            &path,
            &body,
            chrono::Utc::now().timestamp(),
        )?;

        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .query(&query)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("triggered {} on {}", event, channel);
        Ok(())
    }
}
