//! Hosted Session Service Boundary
//!
//! The simulator only needs a handful of capabilities from the hosted model
//! provider: a document store for retrieval, an assistant configuration, a
//! conversation thread, and runs of the assistant against that thread. This
//! module captures those capabilities as a trait so the orchestrator can be
//! driven by any backend, including test doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Errors surfaced by a session service backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The request failed in transport or was rejected by the service.
    #[error("{0}")]
    Api(String),
    #[error("Run {run_id} was still pending after {attempts} status checks")]
    PollExhausted { run_id: String, attempts: u32 },
}

impl From<async_openai::error::OpenAIError> for ServiceError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Api(err.to_string())
    }
}

/// Capabilities an assistant can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantTool {
    /// Retrieval over the documents attached to the thread.
    FileSearch,
}

/// Everything needed to create an assistant configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<AssistantTool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Lifecycle status of an assistant run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// Whether the run may still change status on its own.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last error the service recorded for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A snapshot of a run as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// A message on a conversation thread, reduced to its first text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub role: MessageRole,
    pub text: Option<String>,
}

/// The capabilities the simulator consumes from the hosted model service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Creates a retrieval store over already-uploaded documents.
    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> Result<String, ServiceError>;

    async fn delete_vector_store(&self, vector_store_id: &str) -> Result<(), ServiceError>;

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, ServiceError>;

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), ServiceError>;

    /// Creates a conversation thread whose file search is bound to the store.
    async fn create_thread(&self, vector_store_id: &str) -> Result<String, ServiceError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<(), ServiceError>;

    /// Appends a message to the thread.
    async fn add_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<(), ServiceError>;

    /// Starts a run of the assistant on the thread without waiting for it.
    async fn start_run(&self, thread_id: &str, assistant_id: &str)
    -> Result<RunState, ServiceError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunState, ServiceError>;

    /// Lists the thread's messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ServiceError>;
}

/// How often, and how many times, a pending run is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollStrategy {
    pub interval: Duration,
    /// `None` polls until the run leaves its pending states.
    pub max_attempts: Option<u32>,
}

impl Default for PollStrategy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_attempts: None,
        }
    }
}

impl PollStrategy {
    /// Polls back-to-back with no delay.
    pub fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Starts a run and waits until it reaches a terminal status.
///
/// The caller sees a single blocking call; the returned state is never
/// pending. Transport errors from any status check end the wait immediately.
pub async fn run_to_terminal<S>(
    service: &S,
    thread_id: &str,
    assistant_id: &str,
    poll: &PollStrategy,
) -> Result<RunState, ServiceError>
where
    S: SessionService + ?Sized,
{
    let mut run = service.start_run(thread_id, assistant_id).await?;
    info!(%thread_id, run_id = %run.id, status = %run.status, "Run started");

    let mut attempts = 0u32;
    while run.status.is_pending() {
        if poll.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(ServiceError::PollExhausted {
                run_id: run.id,
                attempts,
            });
        }
        if !poll.interval.is_zero() {
            tokio::time::sleep(poll.interval).await;
        }
        attempts += 1;
        run = service.retrieve_run(thread_id, &run.id).await?;
        debug!(run_id = %run.id, status = %run.status, attempts, "Polled run status");
    }

    info!(run_id = %run.id, status = %run.status, "Run reached terminal status");
    Ok(run)
}
