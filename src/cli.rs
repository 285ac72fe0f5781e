//! Command-line interface for the lazy-command runner.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Program and arguments, one entry per positional argument.
    pub command: Vec<String>,
    /// Run through the platform shell.
    pub shell: bool,
    /// Keep captured output as raw bytes.
    pub binary: bool,
    /// Capture output and replay it after exit.
    pub capture: bool,
    /// Print the captured output as JSON.
    pub json: bool,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Wait bound in seconds.
    pub timeout: Option<f64>,
    /// Variables to set, in order.
    pub env: Vec<(String, String)>,
    /// Variables to remove.
    pub unset: Vec<String>,
    /// Start from an empty environment.
    pub env_clear: bool,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
///
/// Everything from the first positional argument on belongs to the command,
/// so flags meant for the child do not need a `--` separator.
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('s') | Long("shell") => {
                result.shell = true;
            }
            Short('b') | Long("binary") => {
                result.binary = true;
            }
            Short('o') | Long("capture") => {
                result.capture = true;
            }
            Short('j') | Long("json") => {
                result.json = true;
            }
            Short('C') | Long("cwd") => {
                result.cwd = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs: f64 = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("timeout", value.clone()))?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(ArgsError::InvalidValue("timeout", value));
                }
                result.timeout = Some(secs);
            }
            Short('e') | Long("env") => {
                let value: String = parser.value()?.parse()?;
                let (key, val) = value
                    .split_once('=')
                    .filter(|(key, _)| !key.is_empty())
                    .ok_or_else(|| ArgsError::InvalidValue("env", value.clone()))?;
                result.env.push((key.to_string(), val.to_string()));
            }
            Short('u') | Long("unset") => {
                result.unset.push(parser.value()?.parse()?);
            }
            Long("env-clear") => {
                result.env_clear = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(first) => {
                result.command.push(first.string()?);
                for raw in parser.raw_args()? {
                    result.command.push(
                        raw.into_string()
                            .map_err(|raw| ArgsError::NonUnicode(raw.to_string_lossy().into()))?,
                    );
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"lazy-command {version}
Run a command line with configurable environment, redirection and timeout

USAGE:
    lazy-command [OPTIONS] <COMMAND>...

OPTIONS:
    -s, --shell             Run the command line through the platform shell
    -b, --binary            Keep captured output as raw bytes
    -o, --capture           Capture stdout/stderr and replay them after exit
    -j, --json              Print the captured output as JSON (implies --capture)
    -C, --cwd <DIR>         Working directory (must exist)
    -t, --timeout <SECS>    Stop the command after SECS seconds (fractions allowed)
    -e, --env <KEY=VALUE>   Set an environment variable (repeatable)
    -u, --unset <KEY>       Remove an environment variable (repeatable)
        --env-clear         Start from an empty environment
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    LAZY_COMMAND_TIMEOUT    Timeout in seconds (overrides config)
    LAZY_COMMAND_SHELL      Shell mode when "1", "true" or "yes"
    LAZY_COMMAND_LOG_LEVEL  Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXIT STATUS:
    The command's own exit code, 124 on timeout, 2 on runner errors.

EXAMPLES:
    # Run a program directly
    lazy-command ls -la

    # Use the shell and give up after 1.5 seconds
    lazy-command -s -t 1.5 'sleep 5 && echo done'

    # Capture output as JSON with an extra variable
    lazy-command -j -e GREETING=hi -s 'echo $GREETING'
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("lazy-command {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Command word that is not valid Unicode.
    NonUnicode(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::NonUnicode(arg) => {
                write!(f, "argument is not valid unicode: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
