use axum::extract::ws::Message;
use pollcast_core::domain::Tally;
use serde::{Deserialize, Serialize};

/// Frames a subscriber may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinSession { session_id: String },
    /// Application-level keepalive; echoed back as [`ServerMessage::Pong`].
    Ping { timestamp: i64 },
}

/// Frames pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionUpdated { session_id: String, votes: Tally },
    SessionError { session_id: String, message: String },
    Pong { timestamp: i64 },
}

impl ClientMessage {
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl ServerMessage {
    pub fn to_websocket(&self) -> Result<Message, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(Message::Text(json.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn join_and_ping_frames_parse() {
        assert_eq!(
            ClientMessage::from_text(r#"{"type":"join_session","session_id":"abc"}"#).unwrap(),
            ClientMessage::JoinSession {
                session_id: "abc".into()
            }
        );
        assert_eq!(
            ClientMessage::from_bytes(br#"{"type":"ping","timestamp":42}"#).unwrap(),
            ClientMessage::Ping { timestamp: 42 }
        );
        assert!(ClientMessage::from_text(r#"{"type":"vote","option":"A"}"#).is_err());
    }

    #[test]
    fn session_update_keeps_option_order() {
        let message = ServerMessage::SessionUpdated {
            session_id: "abc".into(),
            votes: Tally::from_pairs([("B", 2), ("A", 1)]),
        };

        let text = serde_json::to_string(&message).unwrap();
        assert_eq!(
            text,
            r#"{"type":"session_updated","session_id":"abc","votes":{"B":2,"A":1}}"#
        );
    }

    #[test]
    fn session_error_shape() {
        let message = ServerMessage::SessionError {
            session_id: "abc".into(),
            message: "Session not found".into(),
        };
        let value: Value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({"type": "session_error", "session_id": "abc", "message": "Session not found"})
        );
    }
}
