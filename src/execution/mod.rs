//! Command building and process lifecycle.
//!
//! This module provides:
//! - A fluent [`Command`] builder over `std::process`
//! - Bounded waits that report a timeout as data, not as an error
//! - Output capture that drains stdout and stderr concurrently
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use lazy_command::{Command, Completion};
//!
//! let mut cmd = Command::new("echo hello")?;
//! match cmd.output(Some(Duration::from_secs(5)))? {
//!     Completion::Completed(output) => println!("{}", output),
//!     Completion::TimedOut => {
//!         cmd.stop()?;
//!     }
//! }
//! # Ok::<(), lazy_command::CommandError>(())
//! ```

mod command;
mod lexer;
mod process;
mod redirect;
mod result;

pub use command::Command;
pub use lexer::split;
pub use redirect::Redirect;
pub use result::{Completion, Output, StreamContent};
