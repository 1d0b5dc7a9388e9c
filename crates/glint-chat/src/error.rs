use thiserror::Error;

use glint_net::ApiError;

use crate::sessions::Surface;

#[derive(Error, Debug)]
pub enum ChatError {
    /// The REST collaborator failed; nothing was merged into the stores.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The operation needs an active conversation on the surface.
    #[error("No active conversation on surface {0:?}")]
    NoActiveConversation(Surface),

    /// A newer activation for the same surface superseded this one; its
    /// result was discarded.
    #[error("Activation superseded by a newer request")]
    ActivationSuperseded,

    /// The gateway connection was never established or has shut down.
    #[error("Gateway unavailable")]
    GatewayUnavailable,

    /// The state mutex was poisoned by a panicking thread.
    #[error("Chat state lock poisoned")]
    StatePoisoned,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChatError>;
