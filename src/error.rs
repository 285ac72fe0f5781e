//! Error types for lazy-command.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for command building and process lifecycle operations.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command line could not be tokenized.
    #[error("failed to parse command line: {0}")]
    Parse(String),

    /// The command has no program to run.
    #[error("command line is empty")]
    EmptyCommand,

    /// Working directory does not exist or is not a directory.
    #[error("invalid working directory: {}", .0.display())]
    InvalidWorkingDirectory(PathBuf),

    /// The OS refused to create the process.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while waiting on, signalling or reading from a process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for lazy-command operations.
pub type Result<T> = std::result::Result<T, CommandError>;
