//! Ordered conversation collection.
//!
//! Maintains the canonical list of conversation summaries, most recent
//! activity first. The first REST page owns ordering authority; everything
//! after that is merged in through [`upsert`](ConversationStore::upsert) and
//! [`touch`](ConversationStore::touch), both idempotent with respect to
//! final state.

use tracing::debug;

use glint_shared::models::{Conversation, Message};
use glint_shared::types::{ConversationId, UserId};

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    /// Front of the vec = most recently active.
    entries: Vec<Conversation>,
}

impl ConversationStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Merge one REST page into the collection.
    ///
    /// Page 1 replaces the whole list (the server sort is authoritative for
    /// a fresh load); later pages append, skipping ids already present.
    pub fn load_initial(&mut self, page: u32, conversations: Vec<Conversation>) {
        if page <= 1 {
            debug!(count = conversations.len(), "Conversation list reloaded");
            self.entries = conversations;
            return;
        }
        for conv in conversations {
            if !self.contains(&conv.id) {
                self.entries.push(conv);
            }
        }
    }

    /// Insert a conversation, or merge it into the existing entry.
    ///
    /// Participants are immutable once set; `last_message`,
    /// `last_activity_at` and `unread_count` take the incoming value. The
    /// entry moves to the front of the list.
    pub fn upsert(&mut self, conversation: Conversation) {
        match self.position(&conversation.id) {
            Some(idx) => {
                let mut existing = self.entries.remove(idx);
                existing.last_message = conversation.last_message;
                existing.last_activity_at = conversation.last_activity_at;
                existing.unread_count = conversation.unread_count;
                self.entries.insert(0, existing);
            }
            None => {
                debug!(conversation = %conversation.id, "New conversation tracked");
                self.entries.insert(0, conversation);
            }
        }
    }

    /// Record a new last message: updates the preview fields and moves the
    /// conversation to the front. `bump_unread` increments the unread count
    /// (live message while the thread is not being looked at).
    ///
    /// No-op if the conversation is unknown — the reconciliation layer is
    /// responsible for inserting the summary first.
    pub fn touch(&mut self, id: &ConversationId, message: &Message, bump_unread: bool) {
        let Some(idx) = self.position(id) else {
            return;
        };
        let mut conv = self.entries.remove(idx);
        conv.last_activity_at = message.created_at;
        conv.last_message = Some(message.clone());
        if bump_unread {
            conv.unread_count += 1;
        }
        self.entries.insert(0, conv);
    }

    /// Clear the unread counter, after the backend acknowledged mark-read.
    pub fn clear_unread(&mut self, id: &ConversationId) {
        if let Some(conv) = self.get_mut(id) {
            conv.unread_count = 0;
        }
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.entries.iter().find(|c| &c.id == id)
    }

    /// Find the direct conversation with `recipient`, if already known.
    pub fn find_with(&self, recipient: &UserId) -> Option<&Conversation> {
        self.entries.iter().find(|c| c.has_participant(recipient))
    }

    /// Snapshot of the ordered list, most recently active first.
    pub fn list(&self) -> &[Conversation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything (logout).
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    fn position(&self, id: &ConversationId) -> Option<usize> {
        self.entries.iter().position(|c| &c.id == id)
    }

    fn get_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.entries.iter_mut().find(|c| &c.id == id)
    }
}
