//! lazy-command binary entry point.

use std::io::Write;
use std::process::ExitCode;

use lazy_command::cli::{self, Args};
use lazy_command::config::Config;
use lazy_command::{logging, Completion, StreamContent};
use tracing::{info, warn};

/// Exit status when the command outlives its timeout.
const TIMEOUT_EXIT: u8 = 124;

/// Exit status for runner errors (bad arguments, launch failure).
const ERROR_EXIT: u8 = 2;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'lazy-command --help' for more information.");
            return ExitCode::from(ERROR_EXIT);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(ERROR_EXIT)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load(args)?;
    logging::try_init_with(config.log_filter()).ok();

    if args.command.is_empty() {
        return Err("no command given".into());
    }

    info!("lazy-command v{}", env!("CARGO_PKG_VERSION"));

    let timeout = config.timeout()?;
    let mut cmd = config.build_command(&args.command)?;

    if !config.execution.capture {
        return match cmd.status(timeout)? {
            Completion::Completed(code) => Ok(exit_code(code)),
            Completion::TimedOut => {
                warn!(?timeout, "command timed out, stopping it");
                cmd.stop()?;
                Ok(ExitCode::from(TIMEOUT_EXIT))
            }
        };
    }

    let output = match cmd.output(timeout)? {
        Completion::Completed(output) => output,
        Completion::TimedOut => {
            warn!(?timeout, "command timed out, stopping it");
            cmd.stop()?;
            return Ok(ExitCode::from(TIMEOUT_EXIT));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        replay(&mut std::io::stdout(), output.stdout())?;
        replay(&mut std::io::stderr(), output.stderr())?;
    }

    Ok(exit_code(output.return_code()))
}

fn replay(out: &mut impl Write, content: Option<&StreamContent>) -> std::io::Result<()> {
    if let Some(content) = content {
        out.write_all(content.as_bytes())?;
        out.flush()?;
    }
    Ok(())
}

/// Clamp a child's exit code into the range a process can return.
fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        // Signals and out-of-range codes map to a generic failure.
        Err(_) => ExitCode::FAILURE,
    }
}
