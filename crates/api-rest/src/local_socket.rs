//! Pusher-protocol websocket over the in-process channel.
//!
//! Lets a dashboard built for the hosted service subscribe to a relay running on the local
//! transport. Only public channels are supported, and the app key in the path is not checked.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use intake_transport::protocol::{self, ProtocolMessage};
use intake_transport::ChannelEvent;
use std::collections::HashSet;
use tokio::sync::broadcast;

pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let Some(channel) = state.local else {
        return StatusCode::NOT_FOUND.into_response();
    };
    tracing::debug!("websocket upgrade for app key {}", key);
    let rx = channel.receiver();
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

/// Pusher socket ids are two integers joined by a dot.
fn new_socket_id() -> String {
    let n = uuid::Uuid::new_v4().as_u128();
    format!("{}.{}", (n >> 64) as u32, n as u32)
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &ProtocolMessage,
) -> Result<(), axum::Error> {
    sender.send(Message::Text(frame.to_json())).await
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<ChannelEvent>) {
    let (mut sender, mut receiver) = socket.split();
    let socket_id = new_socket_id();
    let mut subscribed: HashSet<String> = HashSet::new();

    if send(&mut sender, &ProtocolMessage::connection_established(&socket_id))
        .await
        .is_err()
    {
        return;
    }
    tracing::info!("dashboard socket {} connected", socket_id);

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !subscribed.contains(&event.channel) {
                            continue;
                        }
                        let frame = ProtocolMessage::event(&event.channel, &event.event, &event.data);
                        if send(&mut sender, &frame).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("socket {} missed {} events", socket_id, n);
                    }
                }
            }

            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                };
                let Ok(frame) = serde_json::from_str::<ProtocolMessage>(&text) else {
                    tracing::debug!("socket {} sent a non-protocol frame", socket_id);
                    continue;
                };
                let reply = match frame.event.as_str() {
                    protocol::SUBSCRIBE => match frame.requested_channel() {
                        Some(channel) => {
                            subscribed.insert(channel.to_string());
                            Some(ProtocolMessage::subscription_succeeded(channel))
                        }
                        None => Some(ProtocolMessage::error(4000, "subscribe requires a channel")),
                    },
                    protocol::UNSUBSCRIBE => {
                        if let Some(channel) = frame.requested_channel() {
                            subscribed.remove(channel);
                        }
                        None
                    }
                    protocol::PING => Some(ProtocolMessage::pong()),
                    _ => None,
                };
                if let Some(reply) = reply {
                    if send(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    tracing::info!("dashboard socket {} closed", socket_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_router, AppState};
    use intake_core::{
        run_dashboard, Dashboard, IntakeForm, MemorySlot, RelayClient, CHANNEL_NAME,
        PATIENT_INPUT_EVENT,
    };
    use intake_transport::{LocalChannel, PusherSubscription, Publisher, Subscription};
    use intake_types::{PatientField, RosterEntry, StatusTag};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn socket_ids_are_dotted_pairs() {
        let id = new_socket_id();
        let (a, b) = id.split_once('.').unwrap();
        assert!(a.parse::<u32>().is_ok());
        assert!(b.parse::<u32>().is_ok());
    }

    #[tokio::test]
    async fn pusher_client_receives_relayed_events() {
        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("Skipping pusher_client_receives_relayed_events (sandbox): {:?}", e);
                return;
            }
        };
        let addr = listener.local_addr().unwrap();
        let channel = LocalChannel::default();
        let app = build_router(AppState::local(channel.clone()));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let url = format!("ws://{}/app/local?protocol=7", addr);
        let mut sub = PusherSubscription::connect(&url, CHANNEL_NAME, PATIENT_INPUT_EVENT)
            .await
            .unwrap();
        assert!(sub.socket_id().is_some());

        channel
            .trigger("other-channel", PATIENT_INPUT_EVENT, &json!({"ignored": true}))
            .await
            .unwrap();
        channel
            .trigger(CHANNEL_NAME, "other-event", &json!({"ignored": true}))
            .await
            .unwrap();
        channel
            .trigger(CHANNEL_NAME, PATIENT_INPUT_EVENT, &json!({"status": "filling"}))
            .await
            .unwrap();

        let event = sub.next_event().await.unwrap().unwrap();
        assert_eq!(event.event, PATIENT_INPUT_EVENT);
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["status"], "filling");

        sub.close().await.unwrap();
        sub.close().await.unwrap();
    }

    fn completed_form() -> IntakeForm {
        let mut form = IntakeForm::new();
        for field in PatientField::ALL {
            let value = match field {
                PatientField::FirstName => "Ann",
                PatientField::LastName => "Lee",
                PatientField::DateOfBirth => "1990-04-01",
                PatientField::Gender => "female",
                PatientField::Email => "ann@example.org",
                PatientField::PreferredLanguage => "english",
                _ => "n/a",
            };
            form.set(field, value).unwrap();
        }
        form
    }

    #[tokio::test]
    async fn submitted_form_reaches_the_dashboard_mirror() {
        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!(
                    "Skipping submitted_form_reaches_the_dashboard_mirror (sandbox): {:?}",
                    e
                );
                return;
            }
        };
        let addr = listener.local_addr().unwrap();
        let app = build_router(AppState::local(LocalChannel::default()));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let url = format!("ws://{}/app/local?protocol=7", addr);
        let subscription = PusherSubscription::connect(&url, CHANNEL_NAME, PATIENT_INPUT_EVENT)
            .await
            .unwrap();
        let mut dashboard = Dashboard::mount(MemorySlot::default());
        let client = RelayClient::new(&format!("http://{}", addr));
        let mut form = completed_form();
        let id = form.draft().id.clone();

        let (changed_tx, changed_rx) = tokio::sync::oneshot::channel::<()>();
        let mut changed_tx = Some(changed_tx);
        let on_change = move |_: &Dashboard<MemorySlot>| {
            if let Some(tx) = changed_tx.take() {
                let _ = tx.send(());
            }
        };
        let shutdown = async {
            let _ = changed_rx.await;
        };

        let (sent, watched) = tokio::time::timeout(Duration::from_secs(10), async {
            tokio::join!(
                form.submit(&client),
                run_dashboard(subscription, &mut dashboard, shutdown, on_change)
            )
        })
        .await
        .expect("dashboard never saw the submission");

        assert!(sent.unwrap().success);
        watched.unwrap();
        assert_ne!(form.draft().id, id);
        assert!(form.draft().first_name.is_empty());

        assert_eq!(dashboard.roster().len(), 1);
        let mirror: Vec<RosterEntry> =
            serde_json::from_str(dashboard.slot().contents().unwrap()).unwrap();
        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror[0].record.id, id);
        assert_eq!(mirror[0].record.first_name, "Ann");
        assert_eq!(mirror[0].status, StatusTag::Submitted);
    }
}
