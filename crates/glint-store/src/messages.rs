//! Per-conversation message sequences with a bounded cache.
//!
//! Sequences are loaded lazily, one conversation at a time, and merged with
//! live-pushed messages. Ordering within a sequence is arrival order: the
//! initial bulk load arrives server-sorted, history pages are prepended in
//! front of the loaded window, and live events always land at the end even
//! when their timestamp is older than the last-known message.
//!
//! The cache keeps at most `capacity` conversations' sequences in memory;
//! the least-recently-viewed one is evicted first.

use std::collections::HashMap;

use tracing::debug;

use glint_shared::constants::MESSAGE_CACHE_CAPACITY;
use glint_shared::models::Message;
use glint_shared::types::{ConversationId, MessageId};

#[derive(Debug, Clone)]
pub struct MessageStore {
    capacity: usize,
    sequences: HashMap<ConversationId, Vec<Message>>,
    /// Recency order, most recently used last.
    recency: Vec<ConversationId>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::with_capacity(MESSAGE_CACHE_CAPACITY)
    }

    /// `capacity` bounds how many conversations' sequences stay cached;
    /// zero is clamped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sequences: HashMap::new(),
            recency: Vec::new(),
        }
    }

    /// Merge one history page.
    ///
    /// Page 1 seeds the window when nothing is cached; higher pages are
    /// prepended in front of the already-loaded window without reordering
    /// it. Messages whose id is already present are skipped.
    pub fn insert_page(&mut self, id: &ConversationId, page: u32, messages: Vec<Message>) {
        self.mark_used(id);
        let seq = self.sequences.entry(id.clone()).or_default();

        if seq.is_empty() {
            debug!(conversation = %id, count = messages.len(), "Message window seeded");
            *seq = messages;
        } else {
            let fresh: Vec<Message> = messages
                .into_iter()
                .filter(|m| !seq.iter().any(|existing| existing.id == m.id))
                .collect();
            if page <= 1 {
                // A re-fetch of the newest window for a warm cache: anything
                // unseen goes to the end, keeping the loaded window stable.
                seq.extend(fresh);
            } else {
                seq.splice(0..0, fresh);
            }
        }
        self.evict_over_capacity();
    }

    /// Append a live (or echoed) message at the end of its sequence.
    ///
    /// Returns `true` if the message was new, `false` for a duplicate id —
    /// the merge is idempotent either way.
    pub fn append(&mut self, id: &ConversationId, message: Message) -> bool {
        self.mark_used(id);
        let seq = self.sequences.entry(id.clone()).or_default();
        if seq.iter().any(|m| m.id == message.id) {
            debug!(conversation = %id, message = %message.id, "Duplicate message ignored");
            return false;
        }
        seq.push(message);
        self.evict_over_capacity();
        true
    }

    /// The loaded sequence for a conversation, oldest first. `None` if
    /// nothing is cached (distinct from an empty, freshly-seeded window).
    pub fn messages(&self, id: &ConversationId) -> Option<&[Message]> {
        self.sequences.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &ConversationId, message: &MessageId) -> bool {
        self.sequences
            .get(id)
            .is_some_and(|seq| seq.iter().any(|m| &m.id == message))
    }

    /// Record that a surface is viewing this conversation, refreshing its
    /// cache recency without mutating the sequence.
    pub fn mark_viewed(&mut self, id: &ConversationId) {
        if self.sequences.contains_key(id) {
            self.mark_used(id);
        }
    }

    pub fn cached_count(&self) -> usize {
        self.sequences.len()
    }

    /// Drop everything (logout).
    pub fn reset(&mut self) {
        self.sequences.clear();
        self.recency.clear();
    }

    fn mark_used(&mut self, id: &ConversationId) {
        self.recency.retain(|c| c != id);
        self.recency.push(id.clone());
    }

    fn evict_over_capacity(&mut self) {
        while self.sequences.len() > self.capacity {
            // Recency front = least recently used.
            let Some(victim) = self.recency.first().cloned() else {
                break;
            };
            self.recency.remove(0);
            self.sequences.remove(&victim);
            debug!(conversation = %victim, "Evicted message cache entry");
        }
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use glint_shared::models::MessageBody;

    fn msg(id: &str, conversation: &str, minute: u32) -> Message {
        Message {
            id: id.into(),
            conversation_id: conversation.into(),
            sender_id: "u-other".into(),
            recipient_id: "u-me".into(),
            body: MessageBody::Text {
                content: format!("msg {id}"),
            },
            is_read: false,
            created_at: Utc.with_ymd_and_hms(2025, 11, 2, 10, minute, 0).unwrap(),
        }
    }

    fn ids(store: &MessageStore, conversation: &str) -> Vec<String> {
        store
            .messages(&conversation.into())
            .unwrap()
            .iter()
            .map(|m| m.id.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_append_is_idempotent() {
        let mut store = MessageStore::new();
        let c = "c-1".into();

        assert!(store.append(&c, msg("m-1", "c-1", 0)));
        assert!(!store.append(&c, msg("m-1", "c-1", 0)));

        assert_eq!(ids(&store, "c-1"), ["m-1"]);
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut store = MessageStore::new();
        let c = "c-1".into();

        store.append(&c, msg("m-2", "c-1", 30));
        // Older timestamp, later arrival: still appended at the end.
        store.append(&c, msg("m-1", "c-1", 10));

        assert_eq!(ids(&store, "c-1"), ["m-2", "m-1"]);
    }

    #[test]
    fn test_history_page_prepends_without_reordering() {
        let mut store = MessageStore::new();
        let c = "c-1".into();

        store.insert_page(&c, 1, vec![msg("m-3", "c-1", 30), msg("m-4", "c-1", 40)]);
        store.insert_page(&c, 2, vec![msg("m-1", "c-1", 10), msg("m-2", "c-1", 20)]);

        assert_eq!(ids(&store, "c-1"), ["m-1", "m-2", "m-3", "m-4"]);
    }

    #[test]
    fn test_page_skips_known_ids() {
        let mut store = MessageStore::new();
        let c = "c-1".into();

        store.insert_page(&c, 1, vec![msg("m-2", "c-1", 20), msg("m-3", "c-1", 30)]);
        store.insert_page(&c, 2, vec![msg("m-1", "c-1", 10), msg("m-2", "c-1", 20)]);

        assert_eq!(ids(&store, "c-1"), ["m-1", "m-2", "m-3"]);
    }

    #[test]
    fn test_live_message_lands_after_history() {
        let mut store = MessageStore::new();
        let c = "c-1".into();

        store.append(&c, msg("m-9", "c-1", 50));
        store.insert_page(&c, 1, vec![msg("m-1", "c-1", 10), msg("m-9", "c-1", 50)]);

        // The live message was already present; the page only adds unseen
        // history without displacing it.
        assert_eq!(ids(&store, "c-1"), ["m-9", "m-1"]);
    }

    #[test]
    fn test_lru_eviction() {
        let mut store = MessageStore::with_capacity(2);

        store.append(&"c-1".into(), msg("m-1", "c-1", 0));
        store.append(&"c-2".into(), msg("m-2", "c-2", 1));
        // Refresh c-1, making c-2 the eviction victim.
        store.mark_viewed(&"c-1".into());
        store.append(&"c-3".into(), msg("m-3", "c-3", 2));

        assert_eq!(store.cached_count(), 2);
        assert!(store.messages(&"c-1".into()).is_some());
        assert!(store.messages(&"c-2".into()).is_none());
        assert!(store.messages(&"c-3".into()).is_some());
    }

    #[test]
    fn test_missing_conversation_is_none() {
        let store = MessageStore::new();
        assert!(store.messages(&"c-ghost".into()).is_none());
    }

    #[test]
    fn test_reset() {
        let mut store = MessageStore::new();
        store.append(&"c-1".into(), msg("m-1", "c-1", 0));
        store.reset();
        assert_eq!(store.cached_count(), 0);
    }
}
