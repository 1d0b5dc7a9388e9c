//! The chat core facade.
//!
//! [`ChatClient`] owns the shared state, the REST collaborator handle and
//! the gateway link, and exposes the operations UI surfaces are allowed to
//! call. Every suspending operation follows the same lock discipline:
//! gather what it needs under the lock, await the network with the lock
//! released, then re-lock to merge the result — so a failed call never
//! leaves a half-applied merge behind.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use glint_net::gateway::{spawn_gateway, Credentials, GatewayCommand, GatewayConfig};
use glint_net::ChatApi;
use glint_shared::constants::{
    CONVERSATION_PAGE_SIZE, MESSAGE_CACHE_CAPACITY, MESSAGE_PAGE_SIZE,
};
use glint_shared::models::{Conversation, Message, MessageBody};
use glint_shared::protocol::{ClientSignal, OutgoingMessage};
use glint_shared::types::{ConnectionState, ConversationId, UserId};

use crate::error::{ChatError, Result};
use crate::events::{notify, ChatEvent};
use crate::reconcile;
use crate::sessions::{SessionState, Surface};
use crate::state::{ChatState, SharedState};

/// Tunables for the chat core.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// How many conversations' message sets stay cached (LRU).
    pub message_cache_capacity: usize,
    /// Page size for conversation list fetches.
    pub conversation_page_size: u32,
    /// Page size for message history fetches.
    pub message_page_size: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_cache_capacity: MESSAGE_CACHE_CAPACITY,
            conversation_page_size: CONVERSATION_PAGE_SIZE,
            message_page_size: MESSAGE_PAGE_SIZE,
        }
    }
}

/// A live gateway connection plus the reconciler consuming its events.
struct GatewayLink {
    credentials: Credentials,
    cmd_tx: mpsc::Sender<GatewayCommand>,
    state_rx: watch::Receiver<ConnectionState>,
    reconciler: JoinHandle<()>,
}

/// Client facade over the conversation/message synchronizer.
pub struct ChatClient {
    local_user: UserId,
    config: ChatConfig,
    state: SharedState,
    api: Arc<dyn ChatApi>,
    notify_tx: broadcast::Sender<ChatEvent>,
    gateway: Option<GatewayLink>,
}

impl ChatClient {
    pub fn new(api: Arc<dyn ChatApi>, local_user: UserId, config: ChatConfig) -> Self {
        let state = Arc::new(Mutex::new(ChatState::new(config.message_cache_capacity)));
        let (notify_tx, _) = broadcast::channel(256);
        Self {
            local_user,
            config,
            state,
            api,
            notify_tx,
            gateway: None,
        }
    }

    // ------------------------------------------------------------------
    // Gateway lifecycle
    // ------------------------------------------------------------------

    /// Establish the gateway connection and start reconciling its events.
    ///
    /// Idempotent: calling again with the same credentials while the link
    /// is alive is a no-op; different credentials tear the old link down
    /// first. Reconnection after transient failures happens inside the
    /// gateway task and needs no involvement from the caller.
    pub fn connect(&mut self, config: GatewayConfig, credentials: Credentials) -> anyhow::Result<()> {
        if let Some(link) = &self.gateway {
            if link.credentials == credentials && !link.reconciler.is_finished() {
                debug!("Gateway already connected for these credentials");
                return Ok(());
            }
        }
        self.disconnect();

        let (cmd_tx, event_rx, state_rx) = spawn_gateway(config, credentials.clone())?;
        let reconciler = tokio::spawn(reconcile::run(
            self.state.clone(),
            self.api.clone(),
            event_rx,
            self.notify_tx.clone(),
            self.local_user.clone(),
        ));

        info!(user = %credentials.user_id, "Gateway link established");
        self.gateway = Some(GatewayLink {
            credentials,
            cmd_tx,
            state_rx,
            reconciler,
        });
        Ok(())
    }

    /// Tear down the gateway link. Always safe, even if never connected.
    /// The reconciler drains and exits once the gateway closes its event
    /// channel.
    pub fn disconnect(&mut self) {
        if let Some(link) = self.gateway.take() {
            let _ = link.cmd_tx.try_send(GatewayCommand::Shutdown);
            info!("Gateway link closed");
        }
    }

    /// Current gateway connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.gateway
            .as_ref()
            .map(|link| *link.state_rx.borrow())
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Watch channel for connection-state transitions, if connected.
    pub fn connection_changes(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.gateway.as_ref().map(|link| link.state_rx.clone())
    }

    /// Subscribe to store/session change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.notify_tx.subscribe()
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    // ------------------------------------------------------------------
    // Conversation list
    // ------------------------------------------------------------------

    /// Fetch one page of the conversation list and merge it. Page 1
    /// replaces the list; later pages append.
    pub async fn load_initial(&self, page: u32) -> Result<()> {
        let fetched = self
            .api
            .list_conversations(page, self.config.conversation_page_size)
            .await?;

        let mut guard = self.lock()?;
        guard.conversations.load_initial(page, fetched.conversations);
        drop(guard);

        notify(&self.notify_tx, ChatEvent::ConversationsUpdated);
        Ok(())
    }

    /// Ordered snapshot of the conversation list.
    pub fn conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.lock()?.conversations.list().to_vec())
    }

    /// Sum of unread counts across all conversations (nav badge).
    pub fn unread_total(&self) -> Result<u32> {
        Ok(self
            .lock()?
            .conversations
            .list()
            .iter()
            .map(|c| c.unread_count)
            .sum())
    }

    /// Whether the gateway last reported this user online.
    pub fn is_online(&self, user: &UserId) -> Result<bool> {
        Ok(self.lock()?.online.contains(user))
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Point `surface` at the conversation with `recipient`.
    ///
    /// If the conversation is already known the transition is immediate;
    /// otherwise the backend is asked to get-or-create it. Concurrent
    /// activations of the same surface race last-request-wins: a lookup
    /// that resolves after a newer activation is discarded and reported as
    /// [`ChatError::ActivationSuperseded`].
    pub async fn activate(&self, surface: Surface, recipient: UserId) -> Result<ConversationId> {
        let token = {
            let mut guard = self.lock()?;
            let st = &mut *guard;
            if let Some(existing) = st.conversations.find_with(&recipient) {
                let id = existing.id.clone();
                st.sessions.set_active(surface, id.clone(), recipient);
                st.messages.mark_viewed(&id);
                drop(guard);
                notify(&self.notify_tx, ChatEvent::SessionChanged { surface });
                return Ok(id);
            }
            st.sessions.begin(surface, recipient.clone())
        };

        let looked_up = match self.api.get_or_create_conversation(&recipient).await {
            Ok(conversation) => conversation,
            Err(e) => {
                // Back to idle, unless a newer activation owns the slot.
                self.lock()?.sessions.fail(surface, token);
                notify(&self.notify_tx, ChatEvent::SessionChanged { surface });
                return Err(e.into());
            }
        };

        let id = looked_up.id.clone();
        let mut guard = self.lock()?;
        if !guard.sessions.complete(surface, token, id.clone(), recipient) {
            return Err(ChatError::ActivationSuperseded);
        }
        if !guard.conversations.contains(&id) {
            guard.conversations.upsert(looked_up);
        }
        drop(guard);

        notify(&self.notify_tx, ChatEvent::SessionChanged { surface });
        notify(&self.notify_tx, ChatEvent::ConversationsUpdated);
        Ok(id)
    }

    /// Return `surface` to idle. Stores are untouched.
    pub fn deactivate(&self, surface: Surface) -> Result<()> {
        self.lock()?.sessions.deactivate(surface);
        notify(&self.notify_tx, ChatEvent::SessionChanged { surface });
        Ok(())
    }

    /// Current activation state of a surface.
    pub fn session(&self, surface: Surface) -> Result<SessionState> {
        Ok(self.lock()?.sessions.state(surface).clone())
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Fetch one history page for the surface's active conversation.
    ///
    /// The page always merges into the store (merges are idempotent and
    /// cheap to keep); the surface is only notified if it still views the
    /// same conversation when the fetch lands, so a late page can never
    /// drag a surface back to a conversation the user has left.
    pub async fn load_page(&self, surface: Surface, page: u32) -> Result<()> {
        let conversation = {
            let guard = self.lock()?;
            guard
                .sessions
                .active_conversation(surface)
                .cloned()
                .ok_or(ChatError::NoActiveConversation(surface))?
        };

        let fetched = self
            .api
            .list_messages(&conversation, page, self.config.message_page_size)
            .await?;

        let mut guard = self.lock()?;
        let st = &mut *guard;
        st.messages.insert_page(&conversation, page, fetched.messages);
        let still_viewing = st.sessions.active_conversation(surface) == Some(&conversation);
        drop(guard);

        if still_viewing {
            notify(
                &self.notify_tx,
                ChatEvent::MessagesLoaded {
                    conversation_id: conversation,
                },
            );
        }
        Ok(())
    }

    /// Snapshot of the active conversation's loaded messages, oldest
    /// first. Empty if the surface is idle or nothing is cached.
    pub fn messages(&self, surface: Surface) -> Result<Vec<Message>> {
        let mut guard = self.lock()?;
        let st = &mut *guard;
        let Some(id) = st.sessions.active_conversation(surface).cloned() else {
            return Ok(Vec::new());
        };
        st.messages.mark_viewed(&id);
        Ok(st
            .messages
            .messages(&id)
            .map(|s| s.to_vec())
            .unwrap_or_default())
    }

    /// Send a message on the surface's active conversation.
    ///
    /// Nothing is inserted before the server acknowledges — the store only
    /// ever holds server-confirmed messages. The acknowledged entity then
    /// merges through the reconciliation path, identical to a live event,
    /// so a later server echo of the same id is a no-op.
    pub async fn send_message(&self, surface: Surface, body: MessageBody) -> Result<Message> {
        let (conversation_id, recipient_id) = self.active_pair(surface)?;

        let outgoing = OutgoingMessage {
            conversation_id,
            recipient_id,
            body,
        };
        let message = self.api.send_message(&outgoing).await?;

        reconcile::ingest_message(
            &self.state,
            self.api.as_ref(),
            &self.notify_tx,
            &self.local_user,
            message.clone(),
        )
        .await?;

        Ok(message)
    }

    /// Mark the surface's active conversation as read.
    pub async fn mark_read(&self, surface: Surface) -> Result<()> {
        let (conversation, _) = self.active_pair(surface)?;

        self.api.mark_read(&conversation).await?;

        self.lock()?.conversations.clear_unread(&conversation);
        notify(&self.notify_tx, ChatEvent::ConversationsUpdated);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Typing signals
    // ------------------------------------------------------------------

    /// Tell the other participant the local user started typing.
    /// Fire-and-forget: dropped if the gateway is down.
    pub async fn send_typing(&self, surface: Surface) -> Result<()> {
        self.signal(surface, true).await
    }

    pub async fn send_stop_typing(&self, surface: Surface) -> Result<()> {
        self.signal(surface, false).await
    }

    async fn signal(&self, surface: Surface, start: bool) -> Result<()> {
        let (conversation_id, recipient_id) = self.active_pair(surface)?;
        let signal = if start {
            ClientSignal::Typing {
                conversation_id,
                recipient_id,
            }
        } else {
            ClientSignal::StopTyping {
                conversation_id,
                recipient_id,
            }
        };

        let link = self.gateway.as_ref().ok_or(ChatError::GatewayUnavailable)?;
        link.cmd_tx
            .send(GatewayCommand::Emit(signal))
            .await
            .map_err(|_| ChatError::GatewayUnavailable)
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Logout: drop the gateway link and clear all state.
    pub fn reset(&mut self) -> Result<()> {
        self.disconnect();
        self.lock()?.reset();
        notify(&self.notify_tx, ChatEvent::ConversationsUpdated);
        notify(&self.notify_tx, ChatEvent::PresenceChanged);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lock(&self) -> Result<MutexGuard<'_, ChatState>> {
        self.state.lock().map_err(|_| ChatError::StatePoisoned)
    }

    fn active_pair(&self, surface: Surface) -> Result<(ConversationId, UserId)> {
        let guard = self.lock()?;
        match guard.sessions.state(surface) {
            SessionState::Active {
                conversation,
                recipient,
            } => Ok((conversation.clone(), recipient.clone())),
            _ => Err(ChatError::NoActiveConversation(surface)),
        }
    }

    /// Wire a pre-built gateway into the client so tests can feed events
    /// and observe emitted commands without a real socket.
    #[cfg(test)]
    pub(crate) fn attach_fake_gateway(
        &mut self,
    ) -> (
        mpsc::Sender<glint_shared::protocol::GatewayEvent>,
        mpsc::Receiver<GatewayCommand>,
        watch::Sender<ConnectionState>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connected);
        let reconciler = tokio::spawn(reconcile::run(
            self.state.clone(),
            self.api.clone(),
            event_rx,
            self.notify_tx.clone(),
            self.local_user.clone(),
        ));
        self.gateway = Some(GatewayLink {
            credentials: Credentials {
                user_id: self.local_user.clone(),
                token: "test-token".into(),
            },
            cmd_tx,
            state_rx,
            reconciler,
        });
        (event_tx, cmd_rx, state_tx)
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
