//! Per-surface activation state machines.
//!
//! Each UI surface owns one slot: `Idle → Activating → Active → Idle`.
//! Activations that need a conversation lookup carry a token from a
//! monotonically increasing counter; a lookup that completes after a newer
//! activation took the slot no longer matches the stored token and is
//! discarded (last request wins).

use serde::Serialize;
use tracing::debug;

use glint_shared::types::{ConversationId, UserId};

/// One independent UI presentation of chat.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// The full chat page.
    Page,
    /// The floating mini-widget.
    Widget,
    /// The embedded sidebar preview.
    Sidebar,
}

impl Surface {
    pub const ALL: [Surface; 3] = [Surface::Page, Surface::Widget, Surface::Sidebar];

    fn index(self) -> usize {
        match self {
            Surface::Page => 0,
            Surface::Widget => 1,
            Surface::Sidebar => 2,
        }
    }
}

/// Activation state of one surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// A conversation lookup for `recipient` is in flight.
    Activating { recipient: UserId, token: u64 },
    /// The surface renders `conversation`.
    Active {
        conversation: ConversationId,
        recipient: UserId,
    },
}

#[derive(Debug, Default)]
pub struct SessionTable {
    slots: [SessionState; 3],
    next_token: u64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, surface: Surface) -> &SessionState {
        &self.slots[surface.index()]
    }

    /// Start a lookup-backed activation, superseding whatever the slot held.
    /// Returns the token the completion must present.
    pub fn begin(&mut self, surface: Surface, recipient: UserId) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        debug!(surface = ?surface, recipient = %recipient, token, "Activation started");
        self.slots[surface.index()] = SessionState::Activating { recipient, token };
        token
    }

    /// Land a completed lookup. Returns `false` — and changes nothing — if
    /// the slot has moved on since `token` was issued.
    pub fn complete(
        &mut self,
        surface: Surface,
        token: u64,
        conversation: ConversationId,
        recipient: UserId,
    ) -> bool {
        match &self.slots[surface.index()] {
            SessionState::Activating { token: held, .. } if *held == token => {
                self.slots[surface.index()] = SessionState::Active {
                    conversation,
                    recipient,
                };
                true
            }
            _ => {
                debug!(surface = ?surface, token, "Stale activation discarded");
                false
            }
        }
    }

    /// Abort a failed lookup, returning the slot to idle. No-op if the slot
    /// has already moved on.
    pub fn fail(&mut self, surface: Surface, token: u64) {
        if let SessionState::Activating { token: held, .. } = &self.slots[surface.index()] {
            if *held == token {
                self.slots[surface.index()] = SessionState::Idle;
            }
        }
    }

    /// Activate directly onto an already-known conversation.
    pub fn set_active(
        &mut self,
        surface: Surface,
        conversation: ConversationId,
        recipient: UserId,
    ) {
        self.slots[surface.index()] = SessionState::Active {
            conversation,
            recipient,
        };
    }

    pub fn deactivate(&mut self, surface: Surface) {
        self.slots[surface.index()] = SessionState::Idle;
    }

    /// The conversation the surface currently renders, if any.
    pub fn active_conversation(&self, surface: Surface) -> Option<&ConversationId> {
        match &self.slots[surface.index()] {
            SessionState::Active { conversation, .. } => Some(conversation),
            _ => None,
        }
    }

    /// Whether any surface currently renders this conversation.
    pub fn is_active_anywhere(&self, conversation: &ConversationId) -> bool {
        Surface::ALL
            .iter()
            .any(|s| self.active_conversation(*s) == Some(conversation))
    }

    /// Return every slot to idle (logout).
    pub fn reset(&mut self) {
        self.slots = Default::default();
    }
}
