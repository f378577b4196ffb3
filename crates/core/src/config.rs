//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services, so request
//! handlers and the dashboard loop never read process-wide environment variables.

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_RELAY_URL, DEFAULT_REST_ADDR};
use crate::{ConfigError, ConfigResult};
use intake_transport::PusherConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which channel implementation the relay publishes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportMode {
    /// The hosted channel service.
    #[default]
    Pusher,
    /// An in-process channel served to dashboards by the relay itself.
    Local,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pusher" => Ok(TransportMode::Pusher),
            "local" => Ok(TransportMode::Local),
            other => Err(ConfigError::InvalidInput(format!(
                "INTAKE_TRANSPORT must be 'pusher' or 'local', got '{other}'"
            ))),
        }
    }
}

/// Configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    rest_addr: String,
    transport: TransportMode,
    data_dir: PathBuf,
    relay_url: String,
    pusher: PusherConfig,
}

impl IntakeConfig {
    pub fn new(
        rest_addr: String,
        transport: TransportMode,
        data_dir: PathBuf,
        relay_url: String,
        pusher: PusherConfig,
    ) -> ConfigResult<Self> {
        if rest_addr.trim().is_empty() {
            return Err(ConfigError::InvalidInput("rest_addr cannot be empty".into()));
        }
        if !(relay_url.starts_with("http://") || relay_url.starts_with("https://")) {
            return Err(ConfigError::InvalidInput(format!(
                "relay URL must start with http:// or https://, got '{relay_url}'"
            )));
        }

        Ok(Self {
            rest_addr,
            transport,
            data_dir,
            relay_url,
            pusher,
        })
    }

    /// Reads `INTAKE_*` and `PUSHER_*` variables from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let transport = read("INTAKE_TRANSPORT")
            .map(|v| v.parse::<TransportMode>())
            .transpose()?
            .unwrap_or_default();

        Self::new(
            read("INTAKE_REST_ADDR").unwrap_or_else(|| DEFAULT_REST_ADDR.into()),
            transport,
            read("INTAKE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            read("INTAKE_RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.into()),
            PusherConfig::from_lookup(&lookup),
        )
    }

    pub fn rest_addr(&self) -> &str {
        &self.rest_addr
    }

    pub fn transport(&self) -> TransportMode {
        self.transport
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    pub fn pusher(&self) -> &PusherConfig {
        &self.pusher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = IntakeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.rest_addr(), DEFAULT_REST_ADDR);
        assert_eq!(cfg.transport(), TransportMode::Pusher);
        assert_eq!(cfg.data_dir(), Path::new(DEFAULT_DATA_DIR));
        assert_eq!(cfg.relay_url(), DEFAULT_RELAY_URL);
        assert!(cfg.pusher().app_id.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = IntakeConfig::from_lookup(|name| match name {
            "INTAKE_TRANSPORT" => Some("Local".into()),
            "INTAKE_DATA_DIR" => Some("/tmp/slots".into()),
            "PUSHER_APP_ID" => Some("77".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.transport(), TransportMode::Local);
        assert_eq!(cfg.data_dir(), Path::new("/tmp/slots"));
        assert_eq!(cfg.pusher().app_id.as_deref(), Some("77"));
    }

    #[test]
    fn rejects_unknown_transport() {
        let result = IntakeConfig::from_lookup(|name| {
            (name == "INTAKE_TRANSPORT").then(|| "carrier-pigeon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidInput(_))));
    }

    #[test]
    fn rejects_relay_url_without_scheme() {
        let result = IntakeConfig::from_lookup(|name| {
            (name == "INTAKE_RELAY_URL").then(|| "localhost:3000".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidInput(_))));
    }
}
