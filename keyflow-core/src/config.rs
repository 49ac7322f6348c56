use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::event::Mode;

pub const ENV_MODE: &str = "KEYFLOW_MODE";
pub const ENV_PLATFORM: &str = "KEYFLOW_PLATFORM";
pub const ENV_HISTORY: &str = "KEYFLOW_HISTORY";
pub const ENV_STREAM_CAPACITY: &str = "KEYFLOW_STREAM_CAPACITY";

/// Agent settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub starting_mode: Mode,
    /// OS name to bind capture for instead of the detected host.
    pub platform: Option<String>,
    pub history_capacity: usize,
    /// Buffer size of each [`crate::Subscription`] channel.
    pub stream_capacity: usize,
    pub thread_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            starting_mode: Mode::SingleKey,
            platform: None,
            history_capacity: 256,
            stream_capacity: 64,
            thread_name: "keyflow-input".to_string(),
        }
    }
}

impl AgentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AgentError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `KEYFLOW_*` environment variables.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AgentConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup(ENV_MODE) {
            config.starting_mode = mode.parse()?;
        }
        if let Some(platform) = lookup(ENV_PLATFORM) {
            let platform = platform.trim();
            if !platform.is_empty() {
                config.platform = Some(platform.to_string());
            }
        }
        if let Some(history) = lookup(ENV_HISTORY) {
            config.history_capacity = parse_count(ENV_HISTORY, &history)?;
        }
        if let Some(capacity) = lookup(ENV_STREAM_CAPACITY) {
            config.stream_capacity = parse_count(ENV_STREAM_CAPACITY, &capacity)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks what deserialization cannot. Thread names go to the OS as C
    /// strings, so an interior NUL is rejected here rather than at spawn.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.thread_name.contains('\0') {
            return Err(AgentError::Config(format!(
                "thread_name must not contain NUL, got {:?}",
                self.thread_name
            )));
        }
        Ok(())
    }
}

fn parse_count(key: &str, raw: &str) -> Result<usize, AgentError> {
    raw.trim()
        .parse()
        .map_err(|_| AgentError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}
