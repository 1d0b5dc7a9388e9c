//! Wire schema for the gateway connection and REST page payloads.
//!
//! Every inbound frame must deserialize into [`GatewayEvent`] before it is
//! allowed anywhere near the stores; a frame that fails shape validation is
//! dropped at the transport boundary, never partially merged.

use serde::{Deserialize, Serialize};

use crate::models::{Conversation, Message, MessageBody};
use crate::types::{ConversationId, UserId};

// ---------------------------------------------------------------------------
// Gateway events (server → client)
// ---------------------------------------------------------------------------

/// Events pushed by the gateway over the persistent connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A new message was appended to one of the user's conversations.
    NewMessage(Message),
    /// Full replacement snapshot of currently-online users.
    OnlineUsers(Vec<UserId>),
    /// The other participant started typing.
    #[serde(rename_all = "camelCase")]
    Typing { conversation_id: ConversationId },
    /// The other participant stopped typing.
    #[serde(rename_all = "camelCase")]
    StopTyping { conversation_id: ConversationId },
}

// ---------------------------------------------------------------------------
// Client signals (client → server, fire-and-forget)
// ---------------------------------------------------------------------------

/// Signals the client emits on the gateway connection. These carry no
/// persisted state and are never acknowledged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ClientSignal {
    #[serde(rename_all = "camelCase")]
    Typing {
        conversation_id: ConversationId,
        recipient_id: UserId,
    },
    #[serde(rename_all = "camelCase")]
    StopTyping {
        conversation_id: ConversationId,
        recipient_id: UserId,
    },
}

// ---------------------------------------------------------------------------
// REST page payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
}

/// One page of the conversation list, newest activity first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub conversations: Vec<Conversation>,
    pub pagination: Pagination,
}

/// One page of a conversation's history. Page 1 is the newest window;
/// higher pages reach further back in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub pagination: Pagination,
}

/// Body of a send-message request. The server assigns the id and timestamp
/// and echoes the full [`Message`] back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub conversation_id: ConversationId,
    pub recipient_id: UserId,
    #[serde(flatten)]
    pub body: MessageBody,
}
