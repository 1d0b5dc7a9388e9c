//! Test fixtures: entity builders and an in-memory [`ChatApi`] fake with
//! controllable completion order.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use glint_net::{ApiError, ChatApi};
use glint_shared::models::{Conversation, Message, MessageBody, Peer};
use glint_shared::protocol::{ConversationPage, MessagePage, OutgoingMessage, Pagination};
use glint_shared::types::{ConversationId, UserId};

/// Install a fmt subscriber that plays nicely with `cargo test` output.
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn peer(id: &str) -> Peer {
    Peer {
        id: id.into(),
        username: id.to_string(),
        full_name: None,
        profile_picture: None,
    }
}

/// A conversation between `u-me` and `with`, last active at the given
/// minute past 10:00.
pub(crate) fn conv(id: &str, with: &str, minute: u32) -> Conversation {
    Conversation {
        id: id.into(),
        participants: vec![peer("u-me"), peer(with)],
        last_message: None,
        unread_count: 0,
        last_activity_at: Utc.with_ymd_and_hms(2025, 11, 2, 10, minute, 0).unwrap(),
        created_at: Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
    }
}

pub(crate) fn msg(id: &str, conversation: &str, from: &str, to: &str, minute: u32) -> Message {
    Message {
        id: id.into(),
        conversation_id: conversation.into(),
        sender_id: from.into(),
        recipient_id: to.into(),
        body: MessageBody::Text {
            content: format!("msg {id}"),
        },
        is_read: false,
        created_at: Utc.with_ymd_and_hms(2025, 11, 2, 11, minute, 0).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// MockApi
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockInner {
    conversations: Vec<Conversation>,
    pages: HashMap<(ConversationId, u32), Vec<Message>>,
    lookup_gates: HashMap<UserId, oneshot::Receiver<()>>,
    message_gates: HashMap<ConversationId, oneshot::Receiver<()>>,
    failing_lookups: Vec<UserId>,
}

/// In-memory REST backend. Lookups and history fetches can be gated on a
/// oneshot so tests decide the order in which in-flight calls resolve.
pub(crate) struct MockApi {
    local_user: UserId,
    inner: Mutex<MockInner>,
}

impl MockApi {
    pub(crate) fn new(local_user: &str) -> Self {
        Self {
            local_user: local_user.into(),
            inner: Mutex::new(MockInner::default()),
        }
    }

    pub(crate) fn add_conversation(&self, conversation: Conversation) {
        self.inner.lock().unwrap().conversations.push(conversation);
    }

    pub(crate) fn stage_messages(&self, id: &str, page: u32, messages: Vec<Message>) {
        self.inner
            .lock()
            .unwrap()
            .pages
            .insert((id.into(), page), messages);
    }

    /// The next `get_or_create_conversation` for `recipient` blocks until
    /// the returned sender fires (or is dropped).
    pub(crate) fn gate_lookup(&self, recipient: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap()
            .lookup_gates
            .insert(recipient.into(), rx);
        tx
    }

    /// Every `get_or_create_conversation` for `recipient` fails with a 500.
    pub(crate) fn fail_lookup(&self, recipient: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_lookups
            .push(recipient.into());
    }

    /// The next `list_messages` for `id` blocks until the returned sender
    /// fires (or is dropped).
    pub(crate) fn gate_messages(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap()
            .message_gates
            .insert(id.into(), rx);
        tx
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn list_conversations(
        &self,
        page: u32,
        _limit: u32,
    ) -> Result<ConversationPage, ApiError> {
        let conversations = self.inner.lock().unwrap().conversations.clone();
        Ok(ConversationPage {
            conversations,
            pagination: Pagination {
                page,
                total_pages: 1,
            },
        })
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, ApiError> {
        self.inner
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                code: 404,
                message: "conversation not found".into(),
            })
    }

    async fn get_or_create_conversation(
        &self,
        recipient: &UserId,
    ) -> Result<Conversation, ApiError> {
        let gate = self.inner.lock().unwrap().lookup_gates.remove(recipient);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.failing_lookups.contains(recipient) {
            return Err(ApiError::Status {
                code: 500,
                message: "conversation lookup failed".into(),
            });
        }
        if let Some(existing) = inner
            .conversations
            .iter()
            .find(|c| c.has_participant(recipient))
        {
            return Ok(existing.clone());
        }

        let created = Conversation {
            id: format!("c-{recipient}").as_str().into(),
            participants: vec![
                Peer {
                    id: self.local_user.clone(),
                    username: self.local_user.to_string(),
                    full_name: None,
                    profile_picture: None,
                },
                peer(recipient.as_str()),
            ],
            last_message: None,
            unread_count: 0,
            last_activity_at: Utc.with_ymd_and_hms(2025, 11, 2, 12, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 11, 2, 12, 0, 0).unwrap(),
        };
        inner.conversations.push(created.clone());
        Ok(created)
    }

    async fn list_messages(
        &self,
        id: &ConversationId,
        page: u32,
        _limit: u32,
    ) -> Result<MessagePage, ApiError> {
        let gate = self.inner.lock().unwrap().message_gates.remove(id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let messages = self
            .inner
            .lock()
            .unwrap()
            .pages
            .get(&(id.clone(), page))
            .cloned()
            .unwrap_or_default();
        Ok(MessagePage {
            messages,
            pagination: Pagination {
                page,
                total_pages: page,
            },
        })
    }

    async fn send_message(&self, outgoing: &OutgoingMessage) -> Result<Message, ApiError> {
        Ok(Message {
            id: format!("m-{}", uuid::Uuid::new_v4()).as_str().into(),
            conversation_id: outgoing.conversation_id.clone(),
            sender_id: self.local_user.clone(),
            recipient_id: outgoing.recipient_id.clone(),
            body: outgoing.body.clone(),
            is_read: false,
            created_at: Utc::now(),
        })
    }

    async fn mark_read(&self, _id: &ConversationId) -> Result<(), ApiError> {
        Ok(())
    }
}
