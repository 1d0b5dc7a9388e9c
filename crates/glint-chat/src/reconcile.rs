//! Reconciliation of inbound gateway events into the stores.
//!
//! This is the only code path allowed to mutate the stores in reaction to
//! live events, which centralizes de-duplication and ordering so surfaces
//! never race each other. Send responses go through the same merge as live
//! events: a message appears in the sender's UI through exactly the code
//! path a remote participant's socket event would take.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use glint_net::ChatApi;
use glint_shared::models::Message;
use glint_shared::protocol::GatewayEvent;
use glint_shared::types::UserId;

use crate::error::{ChatError, Result};
use crate::events::{notify, ChatEvent};
use crate::state::SharedState;

/// Run the reconciliation loop until the gateway event channel closes.
pub(crate) async fn run(
    state: SharedState,
    api: Arc<dyn ChatApi>,
    mut events: mpsc::Receiver<GatewayEvent>,
    notify_tx: broadcast::Sender<ChatEvent>,
    local_user: UserId,
) {
    info!("Reconciliation loop started");

    while let Some(event) = events.recv().await {
        match event {
            GatewayEvent::NewMessage(message) => {
                let conversation = message.conversation_id.clone();
                if let Err(e) =
                    ingest_message(&state, api.as_ref(), &notify_tx, &local_user, message).await
                {
                    // Dropped, not retried: better a missing preview than a
                    // message pointing at a phantom conversation.
                    warn!(
                        conversation = %conversation,
                        error = %e,
                        "Dropping live message event"
                    );
                }
            }

            GatewayEvent::OnlineUsers(users) => {
                let Ok(mut guard) = state.lock() else {
                    warn!("State lock poisoned, dropping presence update");
                    continue;
                };
                guard.online = users.into_iter().collect();
                drop(guard);
                notify(&notify_tx, ChatEvent::PresenceChanged);
            }

            GatewayEvent::Typing { conversation_id } => {
                notify(&notify_tx, ChatEvent::TypingStarted { conversation_id });
            }

            GatewayEvent::StopTyping { conversation_id } => {
                notify(&notify_tx, ChatEvent::TypingStopped { conversation_id });
            }
        }
    }

    info!("Reconciliation loop ended");
}

/// Merge one server-confirmed message into the stores.
///
/// Shared by the live-event path and [`ChatClient::send_message`]: the send
/// response is treated as one more inbound event instance.
///
/// If the owning conversation is unknown its summary is fetched first;
/// a fetch failure drops the whole event and leaves the stores untouched.
///
/// [`ChatClient::send_message`]: crate::client::ChatClient::send_message
pub(crate) async fn ingest_message(
    state: &SharedState,
    api: &dyn ChatApi,
    notify_tx: &broadcast::Sender<ChatEvent>,
    local_user: &UserId,
    message: Message,
) -> Result<()> {
    let conversation_id = message.conversation_id.clone();

    let known = {
        let guard = state.lock().map_err(|_| ChatError::StatePoisoned)?;
        guard.conversations.contains(&conversation_id)
    };

    if !known {
        // Lazily pull the summary so a message never lands without its
        // conversation. Only this event blocks on the fetch.
        debug!(conversation = %conversation_id, "Fetching summary for unknown conversation");
        let summary = api.get_conversation(&conversation_id).await?;

        let mut guard = state.lock().map_err(|_| ChatError::StatePoisoned)?;
        if !guard.conversations.contains(&summary.id) {
            guard.conversations.upsert(summary);
        }
    }

    let mut guard = state.lock().map_err(|_| ChatError::StatePoisoned)?;

    let inbound = &message.sender_id != local_user;
    let appended = guard.messages.append(&conversation_id, message.clone());
    let viewing = guard.sessions.is_active_anywhere(&conversation_id);
    let bump_unread = appended && inbound && !viewing;
    guard.conversations.touch(&conversation_id, &message, bump_unread);
    drop(guard);

    notify(
        notify_tx,
        ChatEvent::MessageReceived {
            conversation_id,
            message_id: message.id,
        },
    );
    notify(notify_tx, ChatEvent::ConversationsUpdated);

    Ok(())
}
