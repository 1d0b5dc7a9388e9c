use serde::Serialize;
use tokio::sync::broadcast;

use glint_shared::types::{ConversationId, MessageId};

use crate::sessions::Surface;

/// Change notifications fanned out to subscribed UI surfaces.
///
/// Payloads carry ids, not entities: a surface re-reads the snapshot it
/// cares about, after checking the notification against its own active
/// conversation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A message was merged into the store (live event or send echo).
    #[serde(rename_all = "camelCase")]
    MessageReceived {
        conversation_id: ConversationId,
        message_id: MessageId,
    },
    /// The conversation list changed (order, previews, unread counts).
    ConversationsUpdated,
    /// A history page finished merging for this conversation.
    #[serde(rename_all = "camelCase")]
    MessagesLoaded { conversation_id: ConversationId },
    /// A surface's activation state changed.
    SessionChanged { surface: Surface },
    /// The online-users set was replaced.
    PresenceChanged,
    /// The other participant started typing.
    #[serde(rename_all = "camelCase")]
    TypingStarted { conversation_id: ConversationId },
    /// The other participant stopped typing.
    #[serde(rename_all = "camelCase")]
    TypingStopped { conversation_id: ConversationId },
}

/// Fan an event out to whoever is listening. Having no subscribers is
/// normal (headless tests, teardown), so send errors are ignored.
pub(crate) fn notify(tx: &broadcast::Sender<ChatEvent>, event: ChatEvent) {
    let _ = tx.send(event);
}
