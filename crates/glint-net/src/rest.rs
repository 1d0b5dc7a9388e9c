//! REST collaborator client.
//!
//! [`ChatApi`] is the seam the chat core talks through; [`HttpChatApi`] is
//! the production implementation against the glint backend. The backend
//! wraps every response in a `{ success, data }` envelope, which is
//! unwrapped here so the rest of the core only ever sees domain entities.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use glint_shared::constants::{CONVERSATIONS_PATH, MESSAGES_PATH};
use glint_shared::models::{Conversation, Message};
use glint_shared::protocol::{ConversationPage, MessagePage, OutgoingMessage};
use glint_shared::types::{ConversationId, UserId};

use crate::error::{ApiError, Result};

/// The chat core's view of the REST backend.
///
/// All calls are opaque request/response round trips: they either fully
/// succeed with a decoded entity or fail with an [`ApiError`].
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetch one page of the conversation list, newest activity first.
    async fn list_conversations(&self, page: u32, limit: u32) -> Result<ConversationPage>;

    /// Fetch a single conversation summary by id.
    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation>;

    /// Get the existing conversation with `recipient`, or have the backend
    /// create one.
    async fn get_or_create_conversation(&self, recipient: &UserId) -> Result<Conversation>;

    /// Fetch one page of a conversation's history. Page 1 is the newest
    /// window; higher pages reach further back.
    async fn list_messages(&self, id: &ConversationId, page: u32, limit: u32)
        -> Result<MessagePage>;

    /// Send a message. The server assigns the id and timestamp and echoes
    /// the stored entity back.
    async fn send_message(&self, outgoing: &OutgoingMessage) -> Result<Message>;

    /// Mark every message in the conversation as read by the local user.
    async fn mark_read(&self, id: &ConversationId) -> Result<()>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "unspecified".to_string()),
            ));
        }
        self.data.ok_or(ApiError::MissingData)
    }
}

pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    bearer: String,
}

impl HttpChatApi {
    /// `base_url` without a trailing slash, e.g. `https://api.glint.app`.
    pub fn new(base_url: impl Into<String>, bearer: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer: bearer.into(),
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            // The backend still sends an envelope on most error statuses;
            // fall back to the canonical reason if it doesn't.
            let message = match resp.json::<Envelope<serde_json::Value>>().await {
                Ok(env) => env
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
                Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
            };
            return Err(ApiError::Status {
                code: status.as_u16(),
                message,
            });
        }
        resp.json::<Envelope<T>>().await?.into_data()
    }

    /// Like [`decode`](Self::decode), for endpoints that acknowledge without
    /// a payload.
    async fn decode_ack(resp: reqwest::Response) -> Result<()> {
        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<Envelope<serde_json::Value>>().await {
                Ok(env) => env
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
                Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
            };
            return Err(ApiError::Status {
                code: status.as_u16(),
                message,
            });
        }
        let env = resp.json::<Envelope<serde_json::Value>>().await?;
        if !env.success {
            return Err(ApiError::Rejected(
                env.message.unwrap_or_else(|| "unspecified".to_string()),
            ));
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.bearer)
            .query(query)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.bearer)
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_conversations(&self, page: u32, limit: u32) -> Result<ConversationPage> {
        self.get(
            CONVERSATIONS_PATH,
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation> {
        self.get(&format!("{}/{}", CONVERSATIONS_PATH, id), &[]).await
    }

    async fn get_or_create_conversation(&self, recipient: &UserId) -> Result<Conversation> {
        self.post(CONVERSATIONS_PATH, &json!({ "userId": recipient }))
            .await
    }

    async fn list_messages(
        &self,
        id: &ConversationId,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage> {
        self.get(
            &format!("{}/{}/messages", CONVERSATIONS_PATH, id),
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn send_message(&self, outgoing: &OutgoingMessage) -> Result<Message> {
        self.post(MESSAGES_PATH, outgoing).await
    }

    async fn mark_read(&self, id: &ConversationId) -> Result<()> {
        let resp = self
            .client
            .post(format!(
                "{}{}/{}/read",
                self.base_url, CONVERSATIONS_PATH, id
            ))
            .bearer_auth(&self.bearer)
            .json(&json!({}))
            .send()
            .await?;
        Self::decode_ack(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let env: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"data":[1,2,3]}"#).unwrap();
        assert_eq!(env.into_data().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_envelope_rejected() {
        let env: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":false,"message":"nope"}"#).unwrap();
        match env.into_data() {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "nope"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_missing_data() {
        let env: Envelope<Vec<u32>> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(env.into_data(), Err(ApiError::MissingData)));
    }

    #[test]
    fn test_conversation_page_decodes() {
        let json = r#"{
            "conversations": [{
                "id": "c-1",
                "participants": [
                    {"id": "u-a", "username": "ana"},
                    {"id": "u-b", "username": "ben"}
                ],
                "unreadCount": 2,
                "lastActivityAt": "2025-11-02T10:15:00Z",
                "createdAt": "2025-10-30T08:00:00Z"
            }],
            "pagination": {"page": 1, "totalPages": 1}
        }"#;
        let page: ConversationPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.conversations.len(), 1);
        assert_eq!(page.conversations[0].unread_count, 2);
        assert!(page.conversations[0].last_message.is_none());
    }
}
