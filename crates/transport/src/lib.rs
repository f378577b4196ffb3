//! # Intake Transport
//!
//! The publish/subscribe seam between the relay and the dashboards.
//!
//! Delivery and fan-out belong to the hosted channel service; this crate only speaks its wire
//! protocols:
//! - [`PusherPublisher`] triggers events over the Pusher Channels HTTP API.
//! - [`PusherSubscription`] listens on a channel over the Pusher websocket protocol and
//!   reconnects when the connection drops.
//! - [`LocalChannel`] is an in-process broadcast used for local runs and tests.
//! - [`SharedPublisher`] is the process-wide publisher, built on first use.

mod config;
mod local;
pub mod protocol;
mod publisher;
mod shared;
mod signing;
mod socket;

pub use config::PusherConfig;
pub use local::{LocalChannel, LocalSubscription};
pub use publisher::{PusherPublisher, MAX_EVENT_BYTES};
pub use shared::SharedPublisher;
pub use socket::{PusherSubscription, RECONNECT_INITIAL, RECONNECT_MAX};

use async_trait::async_trait;

/// Errors raised by publishers and subscriptions.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("missing transport credential: {0}")]
    MissingCredential(&'static str),
    #[error("event payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("publish rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("cannot sign request: {0}")]
    Signing(String),
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("connection closed")]
    Closed,
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A single event received on a channel. `data` is the payload as a JSON string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    pub data: String,
}

/// Publishes events onto named channels.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn trigger(
        &self,
        channel: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> TransportResult<()>;
}

/// A live subscription bound to one channel and one event name.
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next bound event. `Ok(None)` means the stream has ended.
    async fn next_event(&mut self) -> TransportResult<Option<ChannelEvent>>;

    /// Removes the binding, unsubscribes and disconnects. Safe to call more than once.
    async fn close(&mut self) -> TransportResult<()>;
}
