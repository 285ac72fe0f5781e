//! Configuration management for the lazy-command runner.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::Command;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How commands are run.
    pub execution: ExecutionSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Execution configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Wait bound in seconds. Absent means wait indefinitely.
    pub timeout_secs: Option<f64>,
    /// Run through the platform shell.
    pub shell: bool,
    /// Keep captured output as raw bytes.
    pub binary: bool,
    /// Capture stdout and stderr instead of inheriting them.
    pub capture: bool,
    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,
    /// Start from an empty environment.
    pub env_clear: bool,
    /// Variables removed from the environment.
    pub env_remove: Vec<String>,
    /// Variables added to the environment.
    pub env: BTreeMap<String, String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(timeout) = std::env::var("LAZY_COMMAND_TIMEOUT") {
            let secs = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(timeout.clone()))?;
            self.execution.timeout_secs = Some(secs);
        }

        if let Ok(shell) = std::env::var("LAZY_COMMAND_SHELL") {
            self.execution.shell = matches!(shell.as_str(), "1" | "true" | "yes");
        }

        if let Ok(level) = std::env::var("LAZY_COMMAND_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        let exec = &mut self.execution;

        if let Some(secs) = args.timeout {
            exec.timeout_secs = Some(secs);
        }
        exec.shell |= args.shell;
        exec.binary |= args.binary;
        exec.capture |= args.capture || args.json;
        exec.env_clear |= args.env_clear;

        if let Some(ref dir) = args.cwd {
            exec.working_dir = Some(dir.clone());
        }

        exec.env_remove.extend(args.unset.iter().cloned());
        for (key, value) in &args.env {
            exec.env.insert(key.clone(), value.clone());
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env()?;
        config.apply_args(args);

        // Reject a bad bound before anything is spawned.
        config.timeout()?;

        Ok(config)
    }

    /// Wait bound as a `Duration`.
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.execution
            .timeout_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|_| ConfigError::InvalidTimeout(secs.to_string()))
            })
            .transpose()
    }

    /// Build a command from already separated words with this configuration
    /// applied.
    ///
    /// Words are passed through untouched; in shell mode they are joined
    /// with spaces when the command starts. Environment changes apply in
    /// order: clear, remove, then set.
    pub fn build_command<I, S>(&self, words: I) -> crate::Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exec = &self.execution;
        let mut cmd = Command::from_args(words);

        if exec.shell {
            cmd.use_shell();
        }
        if exec.binary {
            cmd.use_binary_mode();
        }
        if exec.env_clear {
            cmd.clear_environment();
        }
        cmd.remove_environment_vars(&exec.env_remove)
            .set_environment_vars(exec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if let Some(ref dir) = exec.working_dir {
            cmd.set_working_directory(dir)?;
        }

        Ok(cmd)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Timeout that is negative, not a number, or too large.
    InvalidTimeout(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidTimeout(value) => write!(f, "invalid timeout: {}", value),
        }
    }
}

impl std::error::Error for ConfigError {}
