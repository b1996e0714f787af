use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::gateway::Gateway;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub conversation_id: i64,
    pub content: String,
    #[serde(default)]
    pub tools_used: Vec<String>,
}

/// Request/response client for the assistant endpoint. The conversation id
/// from a reply is passed back on the next turn to stay in the same thread.
pub struct ChatClient {
    gateway: Arc<Gateway>,
}

impl ChatClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn send(
        &self,
        user_id: &str,
        message: &str,
        conversation_id: Option<i64>,
    ) -> Result<ChatReply> {
        let mut body = serde_json::json!({ "message": message });
        if let Some(id) = conversation_id {
            body["conversation_id"] = serde_json::json!(id);
        }

        let value = self
            .gateway
            .post(&format!("/users/{user_id}/chat"), &body)?
            .ok_or_else(|| Error::Decode("empty chat response".to_string()))?;

        let reply: ChatReply =
            serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))?;
        debug!(
            conversation_id = reply.conversation_id,
            tools = reply.tools_used.len(),
            "assistant replied"
        );
        Ok(reply)
    }
}
