//! Persistent gateway connection with tokio mpsc command/event pattern.
//!
//! The WebSocket session runs in a dedicated tokio task. External code
//! communicates with it through typed command and event channels, and
//! observes the connection state through a watch channel. Reconnection with
//! backoff happens inside the task; callers never see transient transport
//! failures, only the `Disconnected` state.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsFrame;
use tracing::{debug, error, info, warn};

use glint_shared::constants::{
    GATEWAY_CHANNEL_CAPACITY, RECONNECT_INITIAL_MS, RECONNECT_MAX_MS,
};
use glint_shared::protocol::{ClientSignal, GatewayEvent};
use glint_shared::types::{ConnectionState, UserId};

// ---------------------------------------------------------------------------
// Command type
// ---------------------------------------------------------------------------

/// Commands sent *into* the gateway task.
#[derive(Debug)]
pub enum GatewayCommand {
    /// Emit a fire-and-forget signal (typing indicators). Dropped with a
    /// log line if the connection is down; the gateway never buffers
    /// outbound traffic.
    Emit(ClientSignal),
    /// Gracefully close the connection and end the task.
    Shutdown,
}

/// Bearer credential presented during the connection handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: UserId,
    pub token: String,
}

/// Configuration for spawning the gateway task.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// WebSocket endpoint, e.g. `wss://gateway.glint.app/api`.
    pub url: String,
    /// First reconnect delay; doubles up to `reconnect_max`.
    pub reconnect_initial: Duration,
    /// Ceiling for the reconnect delay.
    pub reconnect_max: Duration,
    /// Capacity of the command and event channels.
    pub channel_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_initial: Duration::from_millis(RECONNECT_INITIAL_MS),
            reconnect_max: Duration::from_millis(RECONNECT_MAX_MS),
            channel_capacity: GATEWAY_CHANNEL_CAPACITY,
        }
    }
}

/// Spawn the gateway session in a background tokio task.
///
/// Returns channels for sending commands and receiving validated events,
/// plus a watch receiver for the connection state.
///
/// Fails only on a malformed endpoint URL; everything after that point is
/// handled inside the task (reconnection, frame validation, shutdown).
pub fn spawn_gateway(
    config: GatewayConfig,
    credentials: Credentials,
) -> anyhow::Result<(
    mpsc::Sender<GatewayCommand>,
    mpsc::Receiver<GatewayEvent>,
    watch::Receiver<ConnectionState>,
)> {
    let connect_url = handshake_url(&config.url, &credentials)?;

    let (cmd_tx, cmd_rx) = mpsc::channel::<GatewayCommand>(config.channel_capacity);
    let (event_tx, event_rx) = mpsc::channel::<GatewayEvent>(config.channel_capacity);
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

    tokio::spawn(session_loop(config, connect_url, cmd_rx, event_tx, state_tx));

    Ok((cmd_tx, event_rx, state_rx))
}

/// Build the connect URL with the bearer token as a query parameter.
fn handshake_url(url: &str, credentials: &Credentials) -> anyhow::Result<String> {
    if !url.starts_with("ws://") && !url.starts_with("wss://") {
        anyhow::bail!("gateway URL must be ws:// or wss://, got {url:?}");
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{url}{sep}token={}", credentials.token))
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

async fn session_loop(
    config: GatewayConfig,
    connect_url: String,
    mut cmd_rx: mpsc::Receiver<GatewayCommand>,
    event_tx: mpsc::Sender<GatewayEvent>,
    state_tx: watch::Sender<ConnectionState>,
) {
    let mut delay = config.reconnect_initial;

    'reconnect: loop {
        let mut ws = match connect_async(connect_url.as_str()).await {
            Ok((ws, _resp)) => {
                info!("Gateway connected");
                let _ = state_tx.send(ConnectionState::Connected);
                delay = config.reconnect_initial;
                ws
            }
            Err(e) => {
                warn!(error = %e, "Gateway connect failed");
                if !backoff(&mut cmd_rx, &mut delay, config.reconnect_max).await {
                    break 'reconnect;
                }
                continue 'reconnect;
            }
        };

        // Connected: pump commands out and frames in until either side drops.
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(GatewayCommand::Emit(signal)) => {
                            let text = match serde_json::to_string(&signal) {
                                Ok(t) => t,
                                Err(e) => {
                                    error!(error = %e, "Failed to serialize signal");
                                    continue;
                                }
                            };
                            if let Err(e) = ws.send(WsFrame::Text(text)).await {
                                warn!(error = %e, "Signal send failed, reconnecting");
                                break;
                            }
                        }
                        Some(GatewayCommand::Shutdown) => {
                            info!("Gateway shutdown requested");
                            let _ = ws.close(None).await;
                            break 'reconnect;
                        }
                        None => {
                            // All senders dropped
                            info!("Command channel closed, shutting down gateway");
                            let _ = ws.close(None).await;
                            break 'reconnect;
                        }
                    }
                }

                frame = ws.next() => {
                    match frame {
                        Some(Ok(WsFrame::Text(text))) => {
                            if let Some(event) = decode_frame(&text) {
                                if event_tx.send(event).await.is_err() {
                                    info!("Event receiver dropped, shutting down gateway");
                                    let _ = ws.close(None).await;
                                    break 'reconnect;
                                }
                            }
                        }
                        Some(Ok(WsFrame::Ping(payload))) => {
                            let _ = ws.send(WsFrame::Pong(payload)).await;
                        }
                        Some(Ok(WsFrame::Close(_))) | None => {
                            warn!("Gateway connection closed by server");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Binary / pong frames carry nothing for us
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Gateway read error");
                            break;
                        }
                    }
                }
            }
        }

        let _ = state_tx.send(ConnectionState::Disconnected);
        if !backoff(&mut cmd_rx, &mut delay, config.reconnect_max).await {
            break 'reconnect;
        }
    }

    let _ = state_tx.send(ConnectionState::Disconnected);
    info!("Gateway session loop terminated");
}

/// Validate one inbound text frame. Anything that fails shape validation is
/// dropped here and never reaches the stores.
fn decode_frame(text: &str) -> Option<GatewayEvent> {
    match serde_json::from_str::<GatewayEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, frame = %truncate(text, 120), "Dropping malformed gateway frame");
            None
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Sleep for the current backoff delay (with jitter), doubling it for next
/// time. Commands arriving while disconnected are serviced here: `Emit`
/// fails fast, `Shutdown` (or a closed channel) aborts the session.
///
/// Returns `false` if the session should end instead of reconnecting.
async fn backoff(
    cmd_rx: &mut mpsc::Receiver<GatewayCommand>,
    delay: &mut Duration,
    max: Duration,
) -> bool {
    let jitter_ms = rand::thread_rng().gen_range(0..=delay.as_millis() as u64 / 2);
    let wait = *delay + Duration::from_millis(jitter_ms);
    *delay = (*delay * 2).min(max);
    debug!(wait_ms = wait.as_millis() as u64, "Gateway reconnect backoff");

    let sleep = tokio::time::sleep(wait);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(GatewayCommand::Emit(signal)) => {
                        // Fail fast: the caller retries if it cares.
                        debug!(signal = ?signal, "Dropping signal while disconnected");
                    }
                    Some(GatewayCommand::Shutdown) | None => return false,
                }
            }
        }
    }
}
