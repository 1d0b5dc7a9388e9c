//! # glint-chat
//!
//! The conversation and message state synchronizer behind glint's direct
//! messaging. Owns the canonical in-memory view of conversations and
//! messages, merges paginated REST fetches with live gateway events, and
//! serves a consistent snapshot to the three chat surfaces (full page,
//! floating widget, sidebar preview).
//!
//! All store mutation funnels through either the reconciliation loop (live
//! events) or the named [`ChatClient`] operations — UI surfaces only ever
//! read snapshots and subscribe to change notifications.

pub mod client;
pub mod error;
pub mod events;
pub mod sessions;
pub mod state;

mod reconcile;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{ChatClient, ChatConfig};
pub use error::ChatError;
pub use events::ChatEvent;
pub use sessions::{SessionState, Surface};
