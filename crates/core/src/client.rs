use crate::constants::RELAY_PATH;
use crate::form::Submitter;
use crate::{FormError, FormResult};
use async_trait::async_trait;
use intake_types::{RelayRequest, RelayResponse};

/// HTTP client for the relay endpoint.
#[derive(Clone, Debug)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    /// `base_url` is the relay origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), RELAY_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Submitter for RelayClient {
    async fn send(&self, request: &RelayRequest) -> FormResult<RelayResponse> {
        let response = self.http.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<RelayResponse>(&text) {
            Ok(body) if status.is_success() && body.success => Ok(body),
            Ok(body) => Err(FormError::Relay {
                status: status.as_u16(),
                message: body.message,
            }),
            Err(_) => Err(FormError::Relay {
                status: status.as_u16(),
                message: text,
            }),
        }
    }
}
