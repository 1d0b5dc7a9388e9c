//! Central chat state shared between the client operations and the
//! reconciliation loop.
//!
//! The [`ChatState`] struct is wrapped in `Arc<Mutex<>>`; the lock is only
//! ever held across synchronous merge sections, never across an await, so
//! reconciliations are serialized globally.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use glint_shared::types::UserId;
use glint_store::{ConversationStore, MessageStore};

use crate::sessions::SessionTable;

pub(crate) type SharedState = Arc<Mutex<ChatState>>;

/// Canonical in-memory chat state.
#[derive(Debug)]
pub struct ChatState {
    /// Ordered conversation summaries, most recent activity first.
    pub conversations: ConversationStore,

    /// Per-conversation message sequences, LRU-bounded.
    pub messages: MessageStore,

    /// Which conversation each UI surface is pointed at.
    pub sessions: SessionTable,

    /// Users currently online, as last reported by the gateway.
    pub online: HashSet<UserId>,
}

impl ChatState {
    /// Create a fresh state with the given message cache bound.
    pub fn new(message_cache_capacity: usize) -> Self {
        Self {
            conversations: ConversationStore::new(),
            messages: MessageStore::with_capacity(message_cache_capacity),
            sessions: SessionTable::new(),
            online: HashSet::new(),
        }
    }

    /// Drop everything (logout). Sessions return to idle; the stores and
    /// the presence set are cleared.
    pub fn reset(&mut self) {
        self.conversations.reset();
        self.messages.reset();
        self.sessions.reset();
        self.online.clear();
    }
}
