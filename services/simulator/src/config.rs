use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub assistant_model: String,
    pub log_level: Level,
    /// JSON catalog overriding the built-in scenarios.
    pub scenarios_path: Option<PathBuf>,
    /// Directory holding an instructions template overriding the built-in one.
    pub prompts_path: Option<PathBuf>,
    pub poll_interval: Duration,
    pub poll_max_attempts: Option<u32>,
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let openai_api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let assistant_model =
            std::env::var("ASSISTANT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let scenarios_path = std::env::var("SCENARIOS_PATH").ok().map(PathBuf::from);
        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        let poll_interval =
            Duration::from_millis(parse_var::<u64>("RUN_POLL_INTERVAL_MS")?.unwrap_or(1000));
        let poll_max_attempts = parse_var::<u32>("RUN_POLL_MAX_ATTEMPTS")?;
        if poll_max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue(
                "RUN_POLL_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            openai_api_key,
            openai_api_base,
            assistant_model,
            log_level,
            scenarios_path,
            prompts_path,
            poll_interval,
            poll_max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_API_BASE");
            env::remove_var("ASSISTANT_MODEL");
            env::remove_var("RUST_LOG");
            env::remove_var("SCENARIOS_PATH");
            env::remove_var("PROMPTS_PATH");
            env::remove_var("RUN_POLL_INTERVAL_MS");
            env::remove_var("RUN_POLL_MAX_ATTEMPTS");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.openai_api_key, "test-openai-key");
        assert_eq!(config.openai_api_base, "https://api.openai.com/v1");
        assert_eq!(config.assistant_model, "gpt-4o");
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.scenarios_path, None);
        assert_eq!(config.prompts_path, None);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.poll_max_attempts, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "custom-key");
            env::set_var("OPENAI_API_BASE", "http://localhost:8080/v1");
            env::set_var("ASSISTANT_MODEL", "gpt-4o-mini");
            env::set_var("RUST_LOG", "debug");
            env::set_var("SCENARIOS_PATH", "/etc/walkthrough/scenarios.json");
            env::set_var("PROMPTS_PATH", "/etc/walkthrough/prompts");
            env::set_var("RUN_POLL_INTERVAL_MS", "250");
            env::set_var("RUN_POLL_MAX_ATTEMPTS", "40");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.openai_api_base, "http://localhost:8080/v1");
        assert_eq!(config.assistant_model, "gpt-4o-mini");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(
            config.scenarios_path,
            Some(PathBuf::from("/etc/walkthrough/scenarios.json"))
        );
        assert_eq!(
            config.prompts_path,
            Some(PathBuf::from("/etc/walkthrough/prompts"))
        );
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.poll_max_attempts, Some(40));
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_blank_openai_key_is_missing() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "   ");
        }

        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::MissingVar(_)
        ));
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_poll_settings() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
            env::set_var("RUN_POLL_INTERVAL_MS", "soon");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUN_POLL_INTERVAL_MS"),
            _ => panic!("Expected InvalidValue for RUN_POLL_INTERVAL_MS"),
        }

        unsafe {
            env::remove_var("RUN_POLL_INTERVAL_MS");
            env::set_var("RUN_POLL_MAX_ATTEMPTS", "0");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUN_POLL_MAX_ATTEMPTS"),
            _ => panic!("Expected InvalidValue for RUN_POLL_MAX_ATTEMPTS"),
        }
    }
}
