// Shared domain types for the glint chat core.

pub mod constants;
pub mod models;
pub mod protocol;
pub mod types;

pub use models::{Conversation, Message, MessageBody, MessageKind, Peer};
pub use protocol::{ClientSignal, GatewayEvent};
pub use types::{ConnectionState, ConversationId, MessageId, UserId};
