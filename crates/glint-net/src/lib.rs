// Network edge of the chat core: the persistent gateway connection and the
// REST collaborator client.

pub mod error;
pub mod gateway;
pub mod rest;

pub use error::ApiError;
pub use gateway::{spawn_gateway, Credentials, GatewayCommand, GatewayConfig};
pub use rest::{ChatApi, HttpChatApi};
