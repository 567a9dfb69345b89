use serde::{Deserialize, Serialize};

use crate::models::request::RequestStatus;

/// Client-to-server chat frames. JSON-tagged by event name, e.g.
/// `{"event":"send_message","data":{"request_id":1,"msg":"hi"}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundChatEvent {
    Join { room: String },
    SendMessage { request_id: i64, msg: String },
    ChangeStatus { request_id: i64, status: String },
}

/// Server-to-client chat frames, broadcast to every connection joined to the
/// request's room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundChatEvent {
    ReceiveMessage {
        username: String,
        msg: String,
        /// `YYYY-MM-DD HH:MM`, assigned at persist time.
        timestamp: String,
    },
    StatusUpdated {
        status: RequestStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_join_parses_room_as_string() {
        let frame = r#"{"event":"join","data":{"room":"7"}}"#;
        let event: InboundChatEvent = serde_json::from_str(frame).unwrap();
        match event {
            InboundChatEvent::Join { room } => assert_eq!(room, "7"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn outbound_message_frame_shape() {
        let event = OutboundChatEvent::ReceiveMessage {
            username: "alice".into(),
            msg: "when will this be ready?".into(),
            timestamp: "2026-01-15 09:05".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "receive_message");
        assert_eq!(json["data"]["username"], "alice");
        assert_eq!(json["data"]["timestamp"], "2026-01-15 09:05");
    }

    #[test]
    fn outbound_status_frame_uses_display_spelling() {
        let event = OutboundChatEvent::StatusUpdated {
            status: RequestStatus::AwaitingReply,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "status_updated");
        assert_eq!(json["data"]["status"], "Awaiting Reply");
    }
}
