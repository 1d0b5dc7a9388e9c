//! # glint-store
//!
//! In-memory canonical state for the chat core: the ordered conversation
//! list and the per-conversation message sequences.
//!
//! Nothing here touches disk — all state is process-lifetime and rebuilt
//! from the REST API on (re)load. Every mutation is an idempotent merge, so
//! the reconciliation layer can replay events and responses freely without
//! producing duplicates.

pub mod conversations;
pub mod messages;

pub use conversations::ConversationStore;
pub use messages::MessageStore;
