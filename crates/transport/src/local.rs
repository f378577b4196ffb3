//! In-process channel used when no hosted service is configured.

use crate::{ChannelEvent, Publisher, Subscription, TransportResult};
use async_trait::async_trait;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcast fan-out of channel events within one process.
///
/// Every subscriber sees every event published after it subscribed. Publishing with no
/// subscribers is not an error.
#[derive(Clone, Debug)]
pub struct LocalChannel {
    tx: broadcast::Sender<ChannelEvent>,
}

impl Default for LocalChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LocalChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribes to `event` on `channel`.
    pub fn subscribe(&self, channel: &str, event: &str) -> LocalSubscription {
        LocalSubscription {
            rx: Some(self.tx.subscribe()),
            channel: channel.to_string(),
            event: event.to_string(),
        }
    }

    /// Raw receiver of every event on every channel.
    pub fn receiver(&self) -> broadcast::Receiver<ChannelEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl Publisher for LocalChannel {
    async fn trigger(
        &self,
        channel: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> TransportResult<()> {
        let event = ChannelEvent {
            channel: channel.to_string(),
            event: event.to_string(),
            data: serde_json::to_string(payload)?,
        };
        if self.tx.send(event).is_err() {
            tracing::debug!("no local subscribers on {}", channel);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct LocalSubscription {
    rx: Option<broadcast::Receiver<ChannelEvent>>,
    channel: String,
    event: String,
}

#[async_trait]
impl Subscription for LocalSubscription {
    async fn next_event(&mut self) -> TransportResult<Option<ChannelEvent>> {
        let Some(rx) = self.rx.as_mut() else {
            return Ok(None);
        };
        loop {
            match rx.recv().await {
                Ok(ev) if ev.channel == self.channel && ev.event == self.event => {
                    return Ok(Some(ev))
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("local subscription lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.rx = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscriber_receives_only_bound_events() {
        let channel = LocalChannel::default();
        let mut sub = channel.subscribe("hospital-system", "patient-input");

        channel
            .trigger("other-channel", "patient-input", &json!({"n": 0}))
            .await
            .unwrap();
        channel
            .trigger("hospital-system", "something-else", &json!({"n": 1}))
            .await
            .unwrap();
        channel
            .trigger("hospital-system", "patient-input", &json!({"n": 2}))
            .await
            .unwrap();

        let ev = sub.next_event().await.unwrap().unwrap();
        assert_eq!(ev.data, "{\"n\":2}");
    }

    #[tokio::test]
    async fn publishing_without_subscribers_succeeds() {
        let channel = LocalChannel::default();
        assert_eq!(channel.subscriber_count(), 0);
        channel.trigger("c", "e", &json!(null)).await.unwrap();
    }

    #[tokio::test]
    async fn closed_subscription_ends_stream_and_releases_receiver() {
        let channel = LocalChannel::default();
        let mut sub = channel.subscribe("c", "e");
        assert_eq!(channel.subscriber_count(), 1);

        sub.close().await.unwrap();
        assert_eq!(channel.subscriber_count(), 0);
        assert!(sub.next_event().await.unwrap().is_none());
        sub.close().await.unwrap();
    }
}
