//! Execution result types.

use std::fmt;

use serde::Serialize;

/// Outcome of a bounded wait on a running process.
///
/// `TimedOut` is not an error: the process is still running and the
/// command keeps its handle.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    /// The process exited within the bound.
    Completed(T),
    /// The bound elapsed first.
    TimedOut,
}

impl<T> Completion<T> {
    /// Check if the process finished.
    pub fn is_completed(&self) -> bool {
        matches!(self, Completion::Completed(_))
    }

    /// Check if the wait ran out of time.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Completion::TimedOut)
    }

    /// Convert into an `Option`, discarding the timeout case.
    pub fn completed(self) -> Option<T> {
        match self {
            Completion::Completed(value) => Some(value),
            Completion::TimedOut => None,
        }
    }

    /// Map the completed value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Completion<U> {
        match self {
            Completion::Completed(value) => Completion::Completed(f(value)),
            Completion::TimedOut => Completion::TimedOut,
        }
    }
}

/// Captured content of one standard stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StreamContent {
    /// Decoded text with newlines normalized to `\n`.
    Text(String),
    /// Raw bytes, as written by the process.
    Binary(Vec<u8>),
}

impl StreamContent {
    /// Decode captured bytes as text with universal newlines.
    pub fn text(raw: &[u8]) -> Self {
        let decoded = String::from_utf8_lossy(raw);
        StreamContent::Text(decoded.replace("\r\n", "\n").replace('\r', "\n"))
    }

    /// Wrap captured bytes without interpretation.
    pub fn binary(raw: Vec<u8>) -> Self {
        StreamContent::Binary(raw)
    }

    /// Get the content as text, if it was decoded.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamContent::Text(text) => Some(text),
            StreamContent::Binary(_) => None,
        }
    }

    /// Get the underlying bytes of either representation.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            StreamContent::Text(text) => text.as_bytes(),
            StreamContent::Binary(raw) => raw,
        }
    }

    /// Check if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl fmt::Display for StreamContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamContent::Text(text) => write!(f, "{:?}", text),
            StreamContent::Binary(raw) => write!(f, "b\"{}\"", raw.escape_ascii()),
        }
    }
}

/// Result of a completed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    return_code: i32,
    stdout: Option<StreamContent>,
    stderr: Option<StreamContent>,
}

impl Output {
    /// Create a new output. Streams that were not piped are `None`.
    pub fn new(
        return_code: i32,
        stdout: Option<StreamContent>,
        stderr: Option<StreamContent>,
    ) -> Self {
        Self {
            return_code,
            stdout,
            stderr,
        }
    }

    /// Exit status of the process.
    pub fn return_code(&self) -> i32 {
        self.return_code
    }

    /// Captured standard output.
    pub fn stdout(&self) -> Option<&StreamContent> {
        self.stdout.as_ref()
    }

    /// Captured standard error.
    pub fn stderr(&self) -> Option<&StreamContent> {
        self.stderr.as_ref()
    }

    /// Check if the process succeeded (exit code 0).
    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn stream(content: Option<&StreamContent>) -> String {
            content.map_or_else(|| "None".to_string(), ToString::to_string)
        }

        write!(
            f,
            "Output(code={}, stdout={}, stderr={})",
            self.return_code,
            stream(self.stdout()),
            stream(self.stderr())
        )
    }
}
