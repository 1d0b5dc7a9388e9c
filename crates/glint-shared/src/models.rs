//! Domain entities mirrored from the backend's REST responses.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be decoded
//! straight off the wire and handed to the UI layer unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ConversationId, MessageId, UserId};

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

/// The slice of a user profile the chat core needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: UserId,
    pub username: String,
    /// Optional human-readable display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Avatar URL, if the user has uploaded one.
    #[serde(default)]
    pub profile_picture: Option<String>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
}

/// Message payload. Text and image are mutually exclusive, so the payload is
/// an enum rather than a pair of optional fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "messageType", rename_all = "snake_case")]
pub enum MessageBody {
    Text {
        content: String,
    },
    Image {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Text { .. } => MessageKind::Text,
            MessageBody::Image { .. } => MessageKind::Image,
        }
    }
}

/// A single direct message. The id and timestamp are always issued by the
/// server; the store never holds an unacknowledged message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    /// The conversation this message belongs to.
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    #[serde(flatten)]
    pub body: MessageBody,
    /// Whether the recipient has seen this message.
    #[serde(default)]
    pub is_read: bool,
    /// Server timestamp. Defines the sort order of the initial bulk load;
    /// live events are kept in arrival order regardless of this value.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Summary of one two-participant messaging thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    /// Exactly two participants, immutable once set.
    pub participants: Vec<Peer>,
    /// The most recent message, if any has been exchanged.
    #[serde(default)]
    pub last_message: Option<Message>,
    /// Messages the local user has not seen yet.
    #[serde(default)]
    pub unread_count: u32,
    /// Drives list ordering: most recently active first.
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// The participant other than `me`, if present.
    pub fn peer_of(&self, me: &UserId) -> Option<&Peer> {
        self.participants.iter().find(|p| &p.id != me)
    }

    /// Whether `user` is one of the two participants.
    pub fn has_participant(&self, user: &UserId) -> bool {
        self.participants.iter().any(|p| &p.id == user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_kind() {
        let text = MessageBody::Text {
            content: "hi".into(),
        };
        let image = MessageBody::Image {
            image_url: "https://cdn.glint.app/p/1.jpg".into(),
        };
        assert_eq!(text.kind(), MessageKind::Text);
        assert_eq!(image.kind(), MessageKind::Image);
    }

    #[test]
    fn test_message_wire_shape() {
        let json = r#"{
            "id": "m-1",
            "conversationId": "c-1",
            "senderId": "u-a",
            "recipientId": "u-b",
            "messageType": "text",
            "content": "hello",
            "isRead": false,
            "createdAt": "2025-11-02T10:15:00Z"
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id.as_str(), "m-1");
        assert_eq!(
            msg.body,
            MessageBody::Text {
                content: "hello".into()
            }
        );

        let round: serde_json::Value =
            serde_json::to_value(&msg).unwrap();
        assert_eq!(round["messageType"], "text");
        assert_eq!(round["content"], "hello");
    }

    #[test]
    fn test_peer_of() {
        let conv = Conversation {
            id: "c-1".into(),
            participants: vec![
                Peer {
                    id: "u-a".into(),
                    username: "ana".into(),
                    full_name: None,
                    profile_picture: None,
                },
                Peer {
                    id: "u-b".into(),
                    username: "ben".into(),
                    full_name: None,
                    profile_picture: None,
                },
            ],
            last_message: None,
            unread_count: 0,
            last_activity_at: Utc::now(),
            created_at: Utc::now(),
        };

        assert_eq!(conv.peer_of(&"u-a".into()).unwrap().username, "ben");
        assert!(conv.has_participant(&"u-b".into()));
        assert!(!conv.has_participant(&"u-c".into()));
    }
}
