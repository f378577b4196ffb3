use crate::{Publisher, PusherConfig, PusherPublisher, TransportResult};
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Process-scoped publisher, initialised on first use.
///
/// Construct one at startup and share it (behind an `Arc`) with every request handler. A
/// failed initialisation is not cached, so the next publish tries again.
#[derive(Debug)]
pub struct SharedPublisher {
    config: PusherConfig,
    inner: OnceCell<PusherPublisher>,
}

impl SharedPublisher {
    pub fn new(config: PusherConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    async fn get(&self) -> TransportResult<&PusherPublisher> {
        self.inner
            .get_or_try_init(|| async {
                tracing::info!("initialising channel publisher");
                PusherPublisher::from_config(&self.config)
            })
            .await
    }

    pub fn is_initialised(&self) -> bool {
        self.inner.initialized()
    }
}

#[async_trait]
impl Publisher for SharedPublisher {
    async fn trigger(
        &self,
        channel: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> TransportResult<()> {
        self.get().await?.trigger(channel, event, payload).await
    }
}
