//! Main Entrypoint for the Audit Walkthrough Simulator
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Loading the scenario catalog and instructions template.
//! 4. Letting the user choose a scenario on the console.
//! 5. Running the practice session against the hosted service.

use anyhow::Context;
use std::{future, io, process, sync::Arc};
use tracing::{info, warn};
use walkthrough_core::{
    SessionError, SessionOrchestrator, choose_scenario, console::spawn_stdin_reader,
    openai::OpenAIAssistantsService,
};
use walkthrough_simulator::{
    bootstrap::{load_catalog, load_composer, openai_config, session_settings},
    config::{Config, ConfigError},
};

/// Completes on `Ctrl+C`. If the handler cannot be installed, never completes.
async fn interrupt_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received interrupt signal. Ending the session..."),
        Err(e) => {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingVar(var)) if var == "OPENAI_API_KEY" => {
            eprintln!(
                "OpenAI API key not found. Please set the OPENAI_API_KEY environment variable."
            );
            process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(io::stderr)
        .init();
    info!("Configuration loaded.");

    // --- 3. Load Scenarios and Prompt Template ---
    let catalog = load_catalog(&config)?;
    let composer = load_composer(&config)?;

    // --- 4. Choose a Scenario ---
    let mut lines = spawn_stdin_reader().context("Failed to start console reader")?;
    let Some(scenario) = choose_scenario(&catalog, &mut lines, io::stdout()).await? else {
        println!("No scenario selected. Goodbye.");
        return Ok(());
    };
    let instructions = composer.build_instructions(scenario);

    // --- 5. Run the Session ---
    let service = Arc::new(OpenAIAssistantsService::new(openai_config(&config)));
    let mut orchestrator = SessionOrchestrator::new(service, session_settings(&config));
    info!(
        scenario = %scenario.id,
        model = %config.assistant_model,
        "Starting practice session"
    );

    match orchestrator
        .run(
            scenario,
            &instructions,
            &mut lines,
            io::stdout(),
            interrupt_signal(),
        )
        .await
    {
        Ok(summary) => {
            info!(
                turns = summary.turns,
                completed_runs = summary.completed_runs,
                debrief_requested = summary.debrief_requested,
                interrupted = summary.interrupted,
                "Session finished"
            );
            Ok(())
        }
        // Already reported on the console; nothing was exchanged.
        Err(SessionError::Setup(_)) => Ok(()),
        Err(SessionError::Turn(e)) => {
            info!(error = %e, "Session ended by service error");
            Ok(())
        }
        Err(e) => Err(e).context("Session failed"),
    }
}
