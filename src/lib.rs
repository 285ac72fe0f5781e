//! # lazy-command
//!
//! A fluent builder over the operating system's process spawning.
//!
//! Build a command line, configure its environment, working directory and
//! stream redirection, then start it and either wait for completion, poll
//! it, or terminate it. One [`Command`] owns at most one live process and
//! can be run again once that process is gone.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use lazy_command::{Command, Completion};
//!
//! fn main() -> lazy_command::Result<()> {
//!     lazy_command::logging::try_init().ok();
//!
//!     let mut cmd = Command::new("cargo --version")?;
//!     cmd.set_environment_var("CARGO_TERM_COLOR", "never");
//!
//!     if let Completion::Completed(output) = cmd.output(Some(Duration::from_secs(10)))? {
//!         assert!(output.is_success());
//!         println!("{}", output);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;

// Re-export commonly used types
pub use error::{CommandError, Result};
pub use execution::{Command, Completion, Output, Redirect, StreamContent};
