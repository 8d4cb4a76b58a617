//! Session Orchestrator
//!
//! Owns one practice session from start to finish: creates the hosted
//! resources for the chosen scenario, runs the question/answer loop on the
//! console, and deletes the resources again on every way out of the loop.

use crate::{
    console::ConsoleLines,
    prompt::DEBRIEF_TRIGGER,
    scenario::Scenario,
    service::{
        AssistantSpec, AssistantTool, MessageRole, PollStrategy, RunStatus, ServiceError,
        SessionService, run_to_terminal,
    },
};
use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Input that ends the session.
const QUIT_COMMAND: &str = "quit";

/// Whether a line typed during the session ends it.
///
/// Matches `quit` in any letter case, ignoring surrounding whitespace, but
/// only as the whole line.
pub fn is_quit_command(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(QUIT_COMMAND)
}

/// Whether a message asks the assistant to switch to the debrief role.
///
/// This is a case-insensitive substring match, so "end walkthroughs" counts.
pub fn requests_debrief(input: &str) -> bool {
    input.to_lowercase().contains(DEBRIEF_TRIGGER)
}

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Initializing,
    Active,
    Terminated,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Creating the hosted resources failed; no messages were exchanged.
    #[error("Session setup failed: {0}")]
    Setup(#[source] ServiceError),
    /// A transport or API failure ended the session mid-conversation.
    #[error("Session ended by a service error: {0}")]
    Turn(#[source] ServiceError),
    #[error("Console I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Settings applied to every session the orchestrator runs.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Model identifier the assistant is created with (e.g., "gpt-4o").
    pub model: String,
    pub poll: PollStrategy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            poll: PollStrategy::default(),
        }
    }
}

/// Handles of the hosted resources backing one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResources {
    pub vector_store_id: String,
    pub assistant_id: String,
    pub thread_id: String,
}

/// What happened during a session that ended normally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Messages sent to the assistant.
    pub turns: usize,
    /// Runs that finished with status `completed`.
    pub completed_runs: usize,
    pub debrief_requested: bool,
    /// The session was cut short by an interrupt (Ctrl-C).
    pub interrupted: bool,
}

/// Drives a single practice session against a [`SessionService`].
pub struct SessionOrchestrator {
    service: Arc<dyn SessionService>,
    settings: SessionSettings,
    state: SessionState,
}

impl SessionOrchestrator {
    pub fn new(service: Arc<dyn SessionService>, settings: SessionSettings) -> Self {
        Self {
            service,
            settings,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs a full session for `scenario` using the composed `instructions`.
    ///
    /// Once setup succeeds, the resources are deleted whichever way the
    /// conversation ends: `quit`, end of input, a service error, or
    /// `interrupt` completing while waiting for input or for a reply.
    pub async fn run<W, F>(
        &mut self,
        scenario: &Scenario,
        instructions: &str,
        input: &mut ConsoleLines,
        mut output: W,
        interrupt: F,
    ) -> Result<SessionSummary, SessionError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        self.state = SessionState::Initializing;
        info!(scenario = %scenario.id, "Initializing session");
        writeln!(
            output,
            "\nSetting up your practice session... This may take a moment."
        )?;

        let resources = match self.open(scenario, instructions).await {
            Ok(resources) => resources,
            Err(e) => {
                self.state = SessionState::Terminated;
                error!(scenario = %scenario.id, error = %e, "Session setup failed");
                writeln!(output, "An error occurred with the hosted service: {}", e)?;
                writeln!(
                    output,
                    "Please check the document IDs in the scenario configuration and ensure they are correct."
                )?;
                return Err(SessionError::Setup(e));
            }
        };

        self.state = SessionState::Active;
        let outcome = self
            .converse(scenario, &resources, input, &mut output, interrupt)
            .await;

        let failed = self.close(&resources).await;
        self.state = SessionState::Terminated;
        let reported = if failed == 0 {
            writeln!(output, "Cleanup complete.")
        } else {
            writeln!(
                output,
                "Cleanup finished with {} resource(s) that could not be deleted.",
                failed
            )
        };
        info!(scenario = %scenario.id, "Session terminated");

        match (outcome, reported) {
            (Ok(_), Err(e)) => Err(SessionError::Io(e)),
            (outcome @ Err(_), Err(e)) => {
                warn!(error = %e, "Failed to print cleanup status");
                outcome
            }
            (outcome, Ok(())) => outcome,
        }
    }

    /// Creates the vector store, assistant and thread, in that order.
    ///
    /// If a later step fails, whatever was already created is deleted before
    /// the error is returned.
    async fn open(
        &self,
        scenario: &Scenario,
        instructions: &str,
    ) -> Result<SessionResources, ServiceError> {
        let vector_store_id = self
            .service
            .create_vector_store(
                &format!("Vector Store - {}", scenario.name),
                &scenario.document_ids(),
            )
            .await?;

        let spec = AssistantSpec {
            name: format!("Audit Simulator - {}", scenario.name),
            instructions: instructions.to_string(),
            model: self.settings.model.clone(),
            tools: vec![AssistantTool::FileSearch],
        };
        let assistant_id = match self.service.create_assistant(&spec).await {
            Ok(id) => id,
            Err(e) => {
                report_delete(
                    "vector store",
                    &vector_store_id,
                    self.service.delete_vector_store(&vector_store_id).await,
                );
                return Err(e);
            }
        };

        let thread_id = match self.service.create_thread(&vector_store_id).await {
            Ok(id) => id,
            Err(e) => {
                report_delete(
                    "assistant",
                    &assistant_id,
                    self.service.delete_assistant(&assistant_id).await,
                );
                report_delete(
                    "vector store",
                    &vector_store_id,
                    self.service.delete_vector_store(&vector_store_id).await,
                );
                return Err(e);
            }
        };

        Ok(SessionResources {
            vector_store_id,
            assistant_id,
            thread_id,
        })
    }

    /// Deletes all three resources, continuing past failures. Returns the
    /// number of deletes that failed.
    async fn close(&self, resources: &SessionResources) -> usize {
        let results = [
            report_delete(
                "assistant",
                &resources.assistant_id,
                self.service.delete_assistant(&resources.assistant_id).await,
            ),
            report_delete(
                "vector store",
                &resources.vector_store_id,
                self.service
                    .delete_vector_store(&resources.vector_store_id)
                    .await,
            ),
            report_delete(
                "thread",
                &resources.thread_id,
                self.service.delete_thread(&resources.thread_id).await,
            ),
        ];
        results.iter().filter(|ok| !**ok).count()
    }

    async fn converse<W, F>(
        &self,
        scenario: &Scenario,
        resources: &SessionResources,
        input: &mut ConsoleLines,
        output: &mut W,
        mut interrupt: Pin<&mut F>,
    ) -> Result<SessionSummary, SessionError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        writeln!(output, "\n--- Session Started ---")?;
        writeln!(
            output,
            "You are now speaking with {}. Type 'quit' at any time to exit.",
            scenario.persona_name
        )?;

        let mut summary = SessionSummary::default();
        loop {
            write!(output, "\nYour question: ")?;
            output.flush()?;

            let line = tokio::select! {
                biased;
                _ = &mut interrupt => None,
                line = input.recv() => Some(line),
            };
            let Some(line) = line else {
                return interrupted(output, summary);
            };
            let Some(message) = line.filter(|line| !is_quit_command(line)) else {
                writeln!(output, "Exiting session.")?;
                return Ok(summary);
            };
            if message.trim().is_empty() {
                continue;
            }

            let turn = tokio::select! {
                biased;
                _ = &mut interrupt => None,
                turn = self.take_turn(resources, &message, output, &mut summary) => Some(turn),
            };
            let Some(turn) = turn else {
                warn!(thread_id = %resources.thread_id, "Interrupted while waiting for a reply");
                return interrupted(output, summary);
            };
            match turn {
                Ok(()) => {}
                Err(SessionError::Turn(e)) => {
                    error!(thread_id = %resources.thread_id, error = %e, "Turn failed");
                    writeln!(output, "An error occurred during the run: {}", e)?;
                    return Err(SessionError::Turn(e));
                }
                Err(other) => return Err(other),
            }

            if requests_debrief(&message) {
                summary.debrief_requested = true;
                writeln!(output, "\n--- Debrief Mode Activated ---")?;
                writeln!(
                    output,
                    "You are now speaking with the Audit Practice Partner. Ask for your debrief."
                )?;
            }
        }
    }

    /// Sends one user message and prints the outcome of the resulting run.
    ///
    /// A run that ends in any status other than `completed` is reported but
    /// is not an error.
    async fn take_turn<W: Write>(
        &self,
        resources: &SessionResources,
        message: &str,
        output: &mut W,
        summary: &mut SessionSummary,
    ) -> Result<(), SessionError> {
        self.service
            .add_message(&resources.thread_id, MessageRole::User, message)
            .await
            .map_err(SessionError::Turn)?;
        summary.turns += 1;

        let run = run_to_terminal(
            self.service.as_ref(),
            &resources.thread_id,
            &resources.assistant_id,
            &self.settings.poll,
        )
        .await
        .map_err(SessionError::Turn)?;

        if run.status == RunStatus::Completed {
            summary.completed_runs += 1;
            let messages = self
                .service
                .list_messages(&resources.thread_id)
                .await
                .map_err(SessionError::Turn)?;
            let reply = messages
                .into_iter()
                .next()
                .and_then(|m| m.text)
                .unwrap_or_default();
            writeln!(output, "\nResponse: {}", reply)?;
        } else {
            warn!(run_id = %run.id, status = %run.status, "Run did not complete");
            let details = run
                .last_error
                .as_ref()
                .map_or_else(|| "None".to_string(), ToString::to_string);
            writeln!(output, "Run ended with status: {}", run.status)?;
            writeln!(output, "Details: {}", details)?;
        }
        Ok(())
    }
}

/// Ends the conversation after an interrupt; cleanup still follows.
fn interrupted<W: Write>(
    output: &mut W,
    mut summary: SessionSummary,
) -> Result<SessionSummary, SessionError> {
    info!("Session interrupted");
    summary.interrupted = true;
    writeln!(output, "\nSession interrupted.")?;
    Ok(summary)
}

/// Logs the outcome of a best-effort delete and returns whether it succeeded.
fn report_delete(kind: &str, id: &str, result: Result<(), ServiceError>) -> bool {
    match result {
        Ok(()) => {
            info!(kind, %id, "Session resource deleted");
            true
        }
        Err(e) => {
            warn!(kind, %id, error = %e, "Failed to delete session resource");
            false
        }
    }
}
