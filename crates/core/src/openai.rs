//! OpenAI Assistants backend for [`SessionService`].
//!
//! Requests go through `async-openai`'s bring-your-own-types endpoints so only
//! the handful of response fields the simulator reads need local definitions.

use crate::service::{
    AssistantSpec, MessageRole, RunState, ServiceError, SessionService, ThreadMessage,
};
use async_openai::{Client, config::OpenAIConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// Any object the service returns that we only need the id of.
#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DeletionStatus {
    id: String,
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageEntry>,
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    role: MessageRole,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

impl From<MessageEntry> for ThreadMessage {
    fn from(entry: MessageEntry) -> Self {
        let text = entry.content.into_iter().find_map(|c| match c {
            MessageContent::Text { text } => Some(text.value),
            MessageContent::Other => None,
        });
        Self {
            role: entry.role,
            text,
        }
    }
}

fn check_deleted(kind: &str, status: DeletionStatus) -> Result<(), ServiceError> {
    if status.deleted {
        debug!(kind, id = %status.id, "Deleted");
        Ok(())
    } else {
        warn!(kind, id = %status.id, "Service declined deletion");
        Err(ServiceError::Api(format!(
            "{} {} was not deleted",
            kind, status.id
        )))
    }
}

/// A [`SessionService`] backed by the OpenAI Assistants API.
pub struct OpenAIAssistantsService {
    client: Client<OpenAIConfig>,
}

impl OpenAIAssistantsService {
    /// Creates a backend from an explicit client configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL for the service.
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config),
        }
    }
}

#[async_trait]
impl SessionService for OpenAIAssistantsService {
    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> Result<String, ServiceError> {
        let store: ObjectId = self
            .client
            .vector_stores()
            .create_byot(json!({ "name": name, "file_ids": file_ids }))
            .await?;
        info!(vector_store_id = %store.id, files = file_ids.len(), "Vector store created");
        Ok(store.id)
    }

    async fn delete_vector_store(&self, vector_store_id: &str) -> Result<(), ServiceError> {
        let status: DeletionStatus = self
            .client
            .vector_stores()
            .delete_byot(vector_store_id)
            .await?;
        check_deleted("vector store", status)
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, ServiceError> {
        let assistant: ObjectId = self
            .client
            .assistants()
            .create_byot(json!({
                "name": spec.name,
                "instructions": spec.instructions,
                "model": spec.model,
                "tools": spec.tools,
            }))
            .await?;
        info!(assistant_id = %assistant.id, model = %spec.model, "Assistant created");
        Ok(assistant.id)
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), ServiceError> {
        let status: DeletionStatus = self.client.assistants().delete_byot(assistant_id).await?;
        check_deleted("assistant", status)
    }

    async fn create_thread(&self, vector_store_id: &str) -> Result<String, ServiceError> {
        let thread: ObjectId = self
            .client
            .threads()
            .create_byot(json!({
                "tool_resources": {
                    "file_search": { "vector_store_ids": [vector_store_id] }
                }
            }))
            .await?;
        info!(thread_id = %thread.id, %vector_store_id, "Thread created");
        Ok(thread.id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), ServiceError> {
        let status: DeletionStatus = self.client.threads().delete_byot(thread_id).await?;
        check_deleted("thread", status)
    }

    async fn add_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<(), ServiceError> {
        let message: ObjectId = self
            .client
            .threads()
            .messages(thread_id)
            .create_byot(json!({ "role": role, "content": text }))
            .await?;
        debug!(%thread_id, message_id = %message.id, "Message added");
        Ok(())
    }

    async fn start_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<RunState, ServiceError> {
        let run: RunState = self
            .client
            .threads()
            .runs(thread_id)
            .create_byot(json!({ "assistant_id": assistant_id }))
            .await?;
        Ok(run)
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunState, ServiceError> {
        let run: RunState = self
            .client
            .threads()
            .runs(thread_id)
            .retrieve_byot(run_id)
            .await?;
        Ok(run)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ServiceError> {
        let list: MessageList = self
            .client
            .threads()
            .messages(thread_id)
            .list_byot(&[("order", "desc")])
            .await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_list_keeps_first_text_block() {
        let list: MessageList = serde_json::from_str(
            r#"{"object": "list", "data": [
                {"id": "msg_2", "role": "assistant", "content": [
                    {"type": "image_file", "image_file": {"file_id": "file-img"}},
                    {"type": "text", "text": {"value": "Hello", "annotations": []}}
                ]},
                {"id": "msg_1", "role": "user", "content": [
                    {"type": "text", "text": {"value": "Hi Sarah", "annotations": []}}
                ]}
            ], "has_more": false}"#,
        )
        .unwrap();

        let messages: Vec<ThreadMessage> = list.data.into_iter().map(ThreadMessage::from).collect();
        assert_eq!(
            messages[0],
            ThreadMessage {
                role: MessageRole::Assistant,
                text: Some("Hello".to_string())
            }
        );
        assert_eq!(messages[1].role, MessageRole::User);
    }

    #[test]
    fn test_message_without_text_content() {
        let entry: MessageEntry = serde_json::from_str(
            r#"{"role": "assistant", "content": [{"type": "image_url", "image_url": {"url": "x"}}]}"#,
        )
        .unwrap();
        assert_eq!(ThreadMessage::from(entry).text, None);
    }

    #[test]
    fn test_declined_deletion_is_an_error() {
        let ok = DeletionStatus {
            id: "asst_1".to_string(),
            deleted: true,
        };
        assert!(check_deleted("assistant", ok).is_ok());

        let declined = DeletionStatus {
            id: "asst_1".to_string(),
            deleted: false,
        };
        let err = check_deleted("assistant", declined).unwrap_err();
        assert_eq!(err.to_string(), "assistant asst_1 was not deleted");
    }
}
