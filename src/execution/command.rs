//! Command building and representation.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use super::lexer;
use super::process::Running;
use super::redirect::Redirect;
use crate::error::CommandError;
use crate::Result;

/// A process builder that also owns at most one live process.
///
/// Configuration methods take `&mut self` and return it so calls chain.
/// Nothing touches the OS until [`start`](Command::start) or one of the
/// methods that start implicitly.
#[derive(Debug)]
pub struct Command {
    pub(super) args: Vec<String>,
    pub(super) env: HashMap<OsString, OsString>,
    pub(super) cwd: Option<PathBuf>,
    pub(super) shell: bool,
    pub(super) text_mode: bool,
    pub(super) stdin: Redirect,
    pub(super) stdout: Redirect,
    pub(super) stderr: Redirect,
    pub(super) running: Option<Running>,
}

impl Command {
    /// Create a command from a command line.
    ///
    /// The line is split with a non-POSIX lexer: quotes group words and are
    /// kept, backslashes are literal. The environment is a snapshot of the
    /// current process environment.
    pub fn new(command_line: &str) -> Result<Self> {
        Ok(Self::from_args(lexer::split(command_line)?))
    }

    /// Create a command from pre-split arguments.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: std::env::vars_os().collect(),
            cwd: None,
            shell: false,
            text_mode: true,
            stdin: Redirect::Inherit,
            stdout: Redirect::Inherit,
            stderr: Redirect::Inherit,
            running: None,
        }
    }

    /// Append one argument.
    pub fn add_argument(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments in order.
    pub fn add_arguments<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Return captured streams as raw bytes instead of decoded text.
    pub fn use_binary_mode(&mut self) -> &mut Self {
        self.text_mode = false;
        self
    }

    /// Join all arguments into one line and run it through the platform shell.
    pub fn use_shell(&mut self) -> &mut Self {
        self.shell = true;
        self
    }

    /// Set the working directory.
    ///
    /// Fails without changing anything if `dir` is not an existing directory.
    pub fn set_working_directory(&mut self, dir: impl AsRef<Path>) -> Result<&mut Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(dir.to_path_buf()));
        }
        self.cwd = Some(dir.to_path_buf());
        Ok(self)
    }

    /// Remove every environment variable.
    pub fn clear_environment(&mut self) -> &mut Self {
        self.env.clear();
        self
    }

    /// Remove the named variables. Names that are not set are ignored.
    pub fn remove_environment_vars<I, K>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<OsStr>,
    {
        for name in names {
            self.env.remove(name.as_ref());
        }
        self
    }

    /// Merge variables into the environment, overwriting existing keys.
    pub fn set_environment_vars<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Set one environment variable.
    pub fn set_environment_var(
        &mut self,
        key: impl Into<OsString>,
        value: impl Into<OsString>,
    ) -> &mut Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set stdin redirection.
    pub fn set_stdin(&mut self, target: impl Into<Redirect>) -> &mut Self {
        self.stdin = target.into();
        self
    }

    /// Set stdout redirection.
    pub fn set_stdout(&mut self, target: impl Into<Redirect>) -> &mut Self {
        self.stdout = target.into();
        self
    }

    /// Set stderr redirection.
    pub fn set_stderr(&mut self, target: impl Into<Redirect>) -> &mut Self {
        self.stderr = target.into();
        self
    }

    /// Pipe all three standard streams.
    pub fn pipe_all(&mut self) -> &mut Self {
        self.pipe_stderr().pipe_stdout().pipe_stdin()
    }

    pub fn pipe_stdin(&mut self) -> &mut Self {
        self.set_stdin(Redirect::Pipe)
    }

    pub fn pipe_stdout(&mut self) -> &mut Self {
        self.set_stdout(Redirect::Pipe)
    }

    pub fn pipe_stderr(&mut self) -> &mut Self {
        self.set_stderr(Redirect::Pipe)
    }

    /// Send all three standard streams to the null device.
    pub fn null_all(&mut self) -> &mut Self {
        self.null_stderr().null_stdout().null_stdin()
    }

    pub fn null_stdin(&mut self) -> &mut Self {
        self.set_stdin(Redirect::Null)
    }

    pub fn null_stdout(&mut self) -> &mut Self {
        self.set_stdout(Redirect::Null)
    }

    pub fn null_stderr(&mut self) -> &mut Self {
        self.set_stderr(Redirect::Null)
    }

    /// Arguments, program first.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Environment the process will receive.
    pub fn environment(&self) -> &HashMap<OsString, OsString> {
        &self.env
    }

    /// Configured working directory, `None` to inherit.
    pub fn working_directory(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn is_shell(&self) -> bool {
        self.shell
    }

    pub fn is_text_mode(&self) -> bool {
        self.text_mode
    }

    pub fn stdin(&self) -> &Redirect {
        &self.stdin
    }

    pub fn stdout(&self) -> &Redirect {
        &self.stdout
    }

    pub fn stderr(&self) -> &Redirect {
        &self.stderr
    }
}
