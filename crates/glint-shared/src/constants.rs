/// Default page size for the conversation list
pub const CONVERSATION_PAGE_SIZE: u32 = 20;

/// Default page size for message history
pub const MESSAGE_PAGE_SIZE: u32 = 50;

/// How many conversations' message sets the cache retains
pub const MESSAGE_CACHE_CAPACITY: usize = 5;

/// Initial gateway reconnect delay in milliseconds
pub const RECONNECT_INITIAL_MS: u64 = 500;

/// Maximum gateway reconnect delay in milliseconds
pub const RECONNECT_MAX_MS: u64 = 30_000;

/// Capacity of the gateway command / event channels
pub const GATEWAY_CHANNEL_CAPACITY: usize = 256;

/// REST path for the conversation list and get-or-create
pub const CONVERSATIONS_PATH: &str = "/api/messages/conversations";

/// REST path for sending a message
pub const MESSAGES_PATH: &str = "/api/messages/messages";
