//! Credentials and endpoints for the hosted channel service.
//!
//! Values are resolved once at process startup. Absent credentials are not an error here: the
//! publisher reports them on its first publish attempt.

use crate::{TransportError, TransportResult};

const CLIENT_NAME: &str = "intake-rs";
const PROTOCOL_VERSION: u8 = 7;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PusherConfig {
    pub app_id: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
    pub cluster: Option<String>,
    /// Overrides `https://api-<cluster>.pusher.com` (self-hosted or test servers).
    pub host: Option<String>,
    /// Overrides the websocket endpoint, e.g. `ws://localhost:3000/app/local`.
    pub ws_url: Option<String>,
}

impl PusherConfig {
    /// Reads `PUSHER_*` variables from the process environment.
    ///
    /// `NEXT_PUBLIC_PUSHER_KEY` and `NEXT_PUBLIC_PUSHER_CLUSTER` are accepted as fallbacks so an
    /// existing `.env` file keeps working.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        Self {
            app_id: read(&["PUSHER_APP_ID"]),
            key: read(&["PUSHER_KEY", "NEXT_PUBLIC_PUSHER_KEY"]),
            secret: read(&["PUSHER_SECRET"]),
            cluster: read(&["PUSHER_CLUSTER", "NEXT_PUBLIC_PUSHER_CLUSTER"]),
            host: read(&["PUSHER_HOST"]),
            ws_url: read(&["PUSHER_WS_URL"]),
        }
    }

    pub(crate) fn require<'a>(
        value: &'a Option<String>,
        name: &'static str,
    ) -> TransportResult<&'a str> {
        value
            .as_deref()
            .ok_or(TransportError::MissingCredential(name))
    }

    /// Base URL for the HTTP API, without a trailing slash.
    pub fn rest_base_url(&self) -> TransportResult<String> {
        if let Some(host) = &self.host {
            let host = host.trim_end_matches('/');
            if host.starts_with("http://") || host.starts_with("https://") {
                return Ok(host.to_string());
            }
            return Ok(format!("https://{host}"));
        }
        let cluster = Self::require(&self.cluster, "PUSHER_CLUSTER")?;
        Ok(format!("https://api-{cluster}.pusher.com"))
    }

    /// Websocket URL including the protocol query string.
    pub fn websocket_url(&self) -> TransportResult<String> {
        let base = match &self.ws_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let cluster = Self::require(&self.cluster, "PUSHER_CLUSTER")?;
                let key = Self::require(&self.key, "PUSHER_KEY")?;
                format!("wss://ws-{cluster}.pusher.com/app/{key}")
            }
        };
        if base.contains('?') {
            return Ok(base);
        }
        Ok(format!(
            "{base}?protocol={PROTOCOL_VERSION}&client={CLIENT_NAME}&version={}",
            env!("CARGO_PKG_VERSION")
        ))
    }
}
