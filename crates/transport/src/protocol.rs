//! Frames of the Pusher websocket protocol (version 7) used by this system.
//!
//! Every frame is a JSON object with an `event` name, an optional `channel` and an optional
//! `data` member. Server-originated `data` is a JSON document encoded as a string; client
//! frames such as `pusher:subscribe` carry an object.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
pub const SUBSCRIBE: &str = "pusher:subscribe";
pub const UNSUBSCRIBE: &str = "pusher:unsubscribe";
pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";
pub const PING: &str = "pusher:ping";
pub const PONG: &str = "pusher:pong";
pub const ERROR: &str = "pusher:error";

/// Seconds of silence after which either side should ping.
pub const ACTIVITY_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProtocolMessage {
    pub fn connection_established(socket_id: &str) -> Self {
        let data = json!({
            "socket_id": socket_id,
            "activity_timeout": ACTIVITY_TIMEOUT_SECS,
        });
        Self {
            event: CONNECTION_ESTABLISHED.into(),
            channel: None,
            data: Some(Value::String(data.to_string())),
        }
    }

    pub fn subscribe(channel: &str) -> Self {
        Self {
            event: SUBSCRIBE.into(),
            channel: None,
            data: Some(json!({ "channel": channel })),
        }
    }

    pub fn unsubscribe(channel: &str) -> Self {
        Self {
            event: UNSUBSCRIBE.into(),
            channel: None,
            data: Some(json!({ "channel": channel })),
        }
    }

    pub fn subscription_succeeded(channel: &str) -> Self {
        Self {
            event: SUBSCRIPTION_SUCCEEDED.into(),
            channel: Some(channel.into()),
            data: Some(Value::String("{}".into())),
        }
    }

    pub fn ping() -> Self {
        Self {
            event: PING.into(),
            channel: None,
            data: Some(json!({})),
        }
    }

    pub fn pong() -> Self {
        Self {
            event: PONG.into(),
            channel: None,
            data: Some(json!({})),
        }
    }

    pub fn error(code: u16, message: &str) -> Self {
        Self {
            event: ERROR.into(),
            channel: None,
            data: Some(json!({ "code": code, "message": message })),
        }
    }

    /// An application event; `data` is already a JSON string.
    pub fn event(channel: &str, event: &str, data: &str) -> Self {
        Self {
            event: event.into(),
            channel: Some(channel.into()),
            data: Some(Value::String(data.into())),
        }
    }

    /// The channel named in a subscribe/unsubscribe request.
    pub fn requested_channel(&self) -> Option<&str> {
        self.data.as_ref()?.get("channel")?.as_str()
    }

    /// The `data` member as a JSON string, re-encoding objects if a server sent one inline.
    pub fn data_string(&self) -> String {
        match &self.data {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// The `code` of a `pusher:error` frame, whether `data` arrived inline or string-encoded.
    pub fn error_code(&self) -> Option<u16> {
        let data = match &self.data {
            Some(Value::String(s)) => serde_json::from_str(s).ok()?,
            Some(other) => other.clone(),
            None => return None,
        };
        data.get("code")?.as_u64()?.try_into().ok()
    }

    pub fn to_json(&self) -> String {
        // A struct of strings and `Value`s always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_shape() {
        let frame: Value = serde_json::from_str(&ProtocolMessage::subscribe("hospital-system").to_json())
            .unwrap();
        assert_eq!(
            frame,
            json!({"event": "pusher:subscribe", "data": {"channel": "hospital-system"}})
        );
    }

    #[test]
    fn application_event_data_is_string_encoded() {
        let frame = ProtocolMessage::event("hospital-system", "patient-input", "{\"a\":1}");
        let raw: Value = serde_json::from_str(&frame.to_json()).unwrap();
        assert_eq!(raw["data"], "{\"a\":1}");
        assert_eq!(frame.data_string(), "{\"a\":1}");
    }

    #[test]
    fn inline_object_data_is_reencoded() {
        let frame: ProtocolMessage =
            serde_json::from_str(r#"{"event":"x","channel":"c","data":{"a":1}}"#).unwrap();
        assert_eq!(frame.data_string(), "{\"a\":1}");
    }

    #[test]
    fn error_code_reads_both_data_encodings() {
        assert_eq!(ProtocolMessage::error(4001, "disabled").error_code(), Some(4001));
        let frame: ProtocolMessage = serde_json::from_str(
            r#"{"event":"pusher:error","data":"{\"code\":4201,\"message\":\"pong\"}"}"#,
        )
        .unwrap();
        assert_eq!(frame.error_code(), Some(4201));
        let frame: ProtocolMessage =
            serde_json::from_str(r#"{"event":"pusher:error","data":{"code":null}}"#).unwrap();
        assert_eq!(frame.error_code(), None);
    }

    #[test]
    fn requested_channel_reads_subscribe_data() {
        assert_eq!(
            ProtocolMessage::unsubscribe("c1").requested_channel(),
            Some("c1")
        );
        assert_eq!(ProtocolMessage::ping().requested_channel(), None);
    }
}
