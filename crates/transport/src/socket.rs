//! Channel subscription over the Pusher websocket protocol.
//!
//! A dropped connection is reopened and resubscribed inside [`Subscription::next_event`]. The
//! close or `pusher:error` code decides how:
//! - `4000..=4099`: the server refuses the connection; the error is returned and nothing retries.
//! - `4200..=4299`: reconnect at once.
//! - anything else, including `4100..=4199` and plain network loss: reconnect after a delay that
//!   doubles up to a ceiling.

use crate::protocol::{self, ProtocolMessage};
use crate::{ChannelEvent, Subscription, TransportError, TransportResult};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// First reconnect delay after an unclassified disconnect.
pub const RECONNECT_INITIAL: Duration = Duration::from_secs(1);
/// Ceiling for the doubling reconnect delay.
pub const RECONNECT_MAX: Duration = Duration::from_secs(30);

fn ws_error(e: tungstenite::Error) -> TransportError {
    TransportError::WebSocket(Box::new(e))
}

/// How to react to a disconnect carrying `code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reconnect {
    Never,
    Immediately,
    WithBackoff,
}

fn classify(code: Option<u16>) -> Reconnect {
    match code {
        Some(4000..=4099) => Reconnect::Never,
        Some(4200..=4299) => Reconnect::Immediately,
        _ => Reconnect::WithBackoff,
    }
}

fn refused(code: Option<u16>, detail: &str) -> TransportError {
    match code {
        Some(code) => TransportError::Protocol(format!("refused with code {code}: {detail}")),
        None => TransportError::Protocol(detail.to_string()),
    }
}

enum Frame {
    Message(ProtocolMessage),
    /// The server closed the connection, with its close code if it sent one.
    Gone(Option<u16>),
}

/// One websocket connection subscribed to one channel, bound to one event name.
pub struct PusherSubscription {
    url: String,
    socket: Option<Socket>,
    channel: String,
    event: String,
    socket_id: Option<String>,
    closed: bool,
    initial_delay: Duration,
    max_delay: Duration,
}

impl PusherSubscription {
    /// Connects, waits for the handshake and subscribes to `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened, the server reports
    /// `pusher:error`, or the connection closes before the subscription is confirmed.
    pub async fn connect(url: &str, channel: &str, event: &str) -> TransportResult<Self> {
        let mut sub = Self {
            url: url.to_string(),
            socket: None,
            channel: channel.to_string(),
            event: event.to_string(),
            socket_id: None,
            closed: false,
            initial_delay: RECONNECT_INITIAL,
            max_delay: RECONNECT_MAX,
        };
        sub.open().await?;
        Ok(sub)
    }

    /// Overrides the reconnect delays.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max.max(initial);
        self
    }

    pub fn socket_id(&self) -> Option<&str> {
        self.socket_id.as_deref()
    }

    async fn open(&mut self) -> TransportResult<()> {
        let (socket, _response) = connect_async(self.url.as_str()).await.map_err(ws_error)?;
        self.socket = Some(socket);

        let established = self.expect(protocol::CONNECTION_ESTABLISHED).await?;
        self.socket_id = serde_json::from_str::<serde_json::Value>(&established.data_string())
            .ok()
            .and_then(|v| v.get("socket_id")?.as_str().map(str::to_string));

        let subscribe = ProtocolMessage::subscribe(&self.channel);
        self.send(&subscribe).await?;
        self.expect(protocol::SUBSCRIPTION_SUCCEEDED).await?;

        tracing::info!(
            "subscribed to {} (socket {})",
            self.channel,
            self.socket_id.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }

    /// Reopens the connection until it succeeds or the server refuses it for good.
    async fn reconnect(&mut self, code: Option<u16>) -> TransportResult<()> {
        self.socket = None;
        self.socket_id = None;

        let mut delay = match classify(code) {
            Reconnect::Never => return Err(refused(code, "connection closed by server")),
            Reconnect::Immediately => Duration::ZERO,
            Reconnect::WithBackoff => self.initial_delay,
        };

        loop {
            if !delay.is_zero() {
                tracing::warn!("connection to {} lost, retrying in {:?}", self.url, delay);
                tokio::time::sleep(delay).await;
            }
            match self.open().await {
                Ok(()) => return Ok(()),
                Err(e @ TransportError::Protocol(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("reconnect to {} failed: {}", self.url, e);
                    self.socket = None;
                    delay = (delay * 2).clamp(self.initial_delay, self.max_delay);
                }
            }
        }
    }

    async fn send(&mut self, frame: &ProtocolMessage) -> TransportResult<()> {
        let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
        socket
            .send(Message::Text(frame.to_json()))
            .await
            .map_err(ws_error)
    }

    async fn read_frame(&mut self) -> TransportResult<Frame> {
        loop {
            let Some(socket) = self.socket.as_mut() else {
                return Ok(Frame::Gone(None));
            };
            match socket.next().await {
                None => return Ok(Frame::Gone(None)),
                Some(Ok(Message::Close(frame))) => {
                    return Ok(Frame::Gone(frame.map(|f| u16::from(f.code))))
                }
                Some(Err(e)) => return Err(ws_error(e)),
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ProtocolMessage>(&text) {
                        Ok(frame) => return Ok(Frame::Message(frame)),
                        Err(e) => tracing::warn!("ignoring unreadable frame: {}", e),
                    }
                }
                // Websocket-level pings are answered by tungstenite.
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn expect(&mut self, name: &str) -> TransportResult<ProtocolMessage> {
        loop {
            match self.read_frame().await? {
                Frame::Gone(code) if classify(code) == Reconnect::Never => {
                    return Err(refused(code, "connection closed during handshake"))
                }
                Frame::Gone(_) => return Err(TransportError::Closed),
                Frame::Message(frame) if frame.event == name => return Ok(frame),
                Frame::Message(frame) if frame.event == protocol::ERROR => {
                    let code = frame.error_code();
                    return match (code, classify(code)) {
                        (Some(_), Reconnect::Immediately | Reconnect::WithBackoff) => {
                            tracing::warn!("handshake error: {}", frame.data_string());
                            Err(TransportError::Closed)
                        }
                        _ => Err(refused(code, &frame.data_string())),
                    };
                }
                Frame::Message(frame) if frame.event == protocol::PING => {
                    self.send(&ProtocolMessage::pong()).await?;
                }
                Frame::Message(_) => continue,
            }
        }
    }
}

#[async_trait]
impl Subscription for PusherSubscription {
    async fn next_event(&mut self) -> TransportResult<Option<ChannelEvent>> {
        loop {
            if self.closed {
                return Ok(None);
            }
            let frame = match self.read_frame().await {
                Ok(Frame::Message(frame)) => frame,
                Ok(Frame::Gone(code)) => {
                    self.reconnect(code).await?;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("websocket error: {}", e);
                    self.reconnect(None).await?;
                    continue;
                }
            };

            if frame.event == protocol::PING {
                self.send(&ProtocolMessage::pong()).await?;
                continue;
            }
            if frame.event == protocol::ERROR {
                // A coded error is followed by the server closing the connection.
                match frame.error_code() {
                    Some(code) if classify(Some(code)) != Reconnect::Never => {
                        tracing::warn!("server error: {}", frame.data_string());
                        continue;
                    }
                    code => return Err(refused(code, &frame.data_string())),
                }
            }
            if frame.event == self.event && frame.channel.as_deref() == Some(self.channel.as_str())
            {
                return Ok(Some(ChannelEvent {
                    channel: self.channel.clone(),
                    event: frame.event.clone(),
                    data: frame.data_string(),
                }));
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.closed = true;
        if self.socket.is_none() {
            return Ok(());
        }
        let unsubscribe = ProtocolMessage::unsubscribe(&self.channel);
        if let Err(e) = self.send(&unsubscribe).await {
            tracing::debug!("unsubscribe on close failed: {}", e);
        }
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                tracing::debug!("websocket close failed: {}", e);
            }
        }
        tracing::info!("unsubscribed from {}", self.channel);
        Ok(())
    }
}
