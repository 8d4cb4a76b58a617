//! Startup helpers that turn a [`Config`] into the pieces a session needs.

use crate::config::Config;
use anyhow::{Context, Result};
use async_openai::config::OpenAIConfig;
use std::fs;
use tracing::info;
use walkthrough_core::{
    PollStrategy, PromptComposer, ScenarioCatalog, SessionSettings, prompt::TEMPLATE_FILE_NAME,
};

/// Loads the scenario catalog from `SCENARIOS_PATH`, or the built-in one.
pub fn load_catalog(config: &Config) -> Result<ScenarioCatalog> {
    match &config.scenarios_path {
        Some(path) => {
            let catalog = ScenarioCatalog::from_path(path)?;
            info!(path = %path.display(), scenarios = catalog.len(), "Loaded scenario catalog");
            Ok(catalog)
        }
        None => ScenarioCatalog::builtin().context("Built-in scenario catalog is invalid"),
    }
}

/// Builds the prompt composer, reading the template from `PROMPTS_PATH` when set.
pub fn load_composer(config: &Config) -> Result<PromptComposer> {
    let Some(dir) = &config.prompts_path else {
        return Ok(PromptComposer::default());
    };
    let path = dir.join(TEMPLATE_FILE_NAME);
    let template = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read prompt template {}", path.display()))?;
    info!(path = %path.display(), "Loaded instructions template");
    Ok(PromptComposer::new(template))
}

/// The explicit client configuration handed to the hosted service backend.
pub fn openai_config(config: &Config) -> OpenAIConfig {
    OpenAIConfig::new()
        .with_api_key(&config.openai_api_key)
        .with_api_base(&config.openai_api_base)
}

pub fn session_settings(config: &Config) -> SessionSettings {
    SessionSettings {
        model: config.assistant_model.clone(),
        poll: PollStrategy {
            interval: config.poll_interval,
            max_attempts: config.poll_max_attempts,
        },
    }
}
