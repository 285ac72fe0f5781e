//! Process lifecycle: start, status, output, poll and stop.

use std::io::{self, Read};
use std::process::{self, Child, ExitStatus};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::command::Command;
use super::redirect::Redirect;
use super::result::{Completion, Output, StreamContent};
use crate::error::CommandError;
use crate::Result;

/// Interval between exit checks during a bounded wait.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Buffer size for draining captured streams.
const READ_BUFFER_SIZE: usize = 4096;

type Drain = JoinHandle<io::Result<Vec<u8>>>;

/// A spawned process owned by a [`Command`].
#[derive(Debug)]
pub(crate) struct Running {
    child: Child,
    capture: Option<Capture>,
}

/// Background readers for the piped output streams.
#[derive(Debug)]
struct Capture {
    stdout: Option<Drain>,
    stderr: Option<Drain>,
}

impl Capture {
    fn attach(child: &mut Child) -> io::Result<Self> {
        let stdout = child
            .stdout
            .take()
            .map(|pipe| spawn_drain("lazy-command-stdout", pipe))
            .transpose()?;
        let stderr = child
            .stderr
            .take()
            .map(|pipe| spawn_drain("lazy-command-stderr", pipe))
            .transpose()?;
        Ok(Self { stdout, stderr })
    }

    /// Wait until both readers hit EOF or the deadline passes.
    ///
    /// A grandchild that inherited a pipe keeps it open after the direct
    /// child exits, so readers can outlive the process they were attached to.
    fn finished_by(&self, deadline: Option<Instant>) -> bool {
        let Some(deadline) = deadline else {
            return true;
        };

        loop {
            let done = [&self.stdout, &self.stderr]
                .into_iter()
                .flatten()
                .all(JoinHandle::is_finished);
            if done {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn join(self) -> io::Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
        Ok((join_drain(self.stdout)?, join_drain(self.stderr)?))
    }
}

fn spawn_drain<R: Read + Send + 'static>(name: &str, mut pipe: R) -> io::Result<Drain> {
    thread::Builder::new().name(name.to_string()).spawn(move || {
        let mut collected = Vec::new();
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => collected.extend_from_slice(&buf[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(collected)
    })
}

fn join_drain(drain: Option<Drain>) -> io::Result<Option<Vec<u8>>> {
    match drain {
        None => Ok(None),
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "stream reader panicked"))?
            .map(Some),
    }
}

impl Running {
    fn new(child: Child) -> Self {
        Self {
            child,
            capture: None,
        }
    }

    /// Wait for exit, up to `deadline` if one is given.
    ///
    /// Always polls `try_wait`: `Child::wait` would close a piped stdin
    /// first, which bounded waits must not do either.
    fn wait_until(&mut self, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(Some(status));
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Ask the process to exit and hand it to a reaper thread.
    fn terminate(mut self) -> io::Result<()> {
        let pid = self.child.id();
        if self.child.try_wait()?.is_none() {
            send_terminate(&mut self.child)?;
        }

        let mut child = self.child;
        let reaper = thread::Builder::new()
            .name("lazy-command-reaper".to_string())
            .spawn(move || child.wait());
        if let Err(e) = reaper {
            debug!(pid, error = %e, "could not spawn reaper thread");
        }
        Ok(())
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> io::Result<()> {
    let pid = libc::pid_t::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    // SAFETY: kill(2) has no memory-safety preconditions. The child has not
    // been reaped yet, so the pid still names our process.
    if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> io::Result<()> {
    child.kill()
}

/// Map an exit status to an integer code.
///
/// On Unix a process killed by a signal reports the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}

impl Command {
    /// Start the process.
    ///
    /// Does nothing if a process is already running. On launch failure no
    /// handle is recorded.
    pub fn start(&mut self) -> Result<&mut Self> {
        self.ensure_started()?;
        Ok(self)
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// Starts the process first if needed. `None` waits indefinitely. On
    /// timeout the process keeps running and the handle is kept. A piped
    /// stdin is left open whether or not a timeout is given, so a child
    /// reading it until EOF never finishes here; use [`output`](Command::output)
    /// or [`stop`](Command::stop) for that.
    pub fn status(&mut self, timeout: Option<Duration>) -> Result<Completion<i32>> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let running = self.ensure_started()?;
        match running.wait_until(deadline)? {
            Some(status) => {
                let code = exit_code(status);
                info!(code, "process exited");
                self.running = None;
                Ok(Completion::Completed(code))
            }
            None => {
                debug!(?timeout, "process still running after timeout");
                Ok(Completion::TimedOut)
            }
        }
    }

    /// Wait for the process to exit and collect its output.
    ///
    /// Streams that are still at [`Redirect::Inherit`] are switched to
    /// pipes first; explicitly set redirections are left alone. The timeout
    /// bounds both the exit and reading the pipes to EOF. On timeout the
    /// handle is kept and a later call resumes collection.
    pub fn output(&mut self, timeout: Option<Duration>) -> Result<Completion<Output>> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        for stream in [&mut self.stderr, &mut self.stdout, &mut self.stdin] {
            if stream.is_inherit() {
                *stream = Redirect::Pipe;
            }
        }

        let running = self.ensure_started()?;
        if running.capture.is_none() {
            // No input is ever written, so the child sees EOF right away.
            drop(running.child.stdin.take());
            running.capture = Some(Capture::attach(&mut running.child)?);
        }

        let Some(status) = running.wait_until(deadline)? else {
            debug!(?timeout, "process still running after timeout");
            return Ok(Completion::TimedOut);
        };

        let drained = running
            .capture
            .as_ref()
            .map_or(true, |capture| capture.finished_by(deadline));
        if !drained {
            debug!(?timeout, "process exited but its pipes are still open");
            return Ok(Completion::TimedOut);
        }

        let code = exit_code(status);
        let capture = running.capture.take();
        self.running = None;

        let (stdout, stderr) = match capture {
            Some(capture) => capture.join()?,
            None => (None, None),
        };
        info!(code, "process exited");

        let decode = |raw: Vec<u8>| {
            if self.text_mode {
                StreamContent::text(&raw)
            } else {
                StreamContent::binary(raw)
            }
        };
        Ok(Completion::Completed(Output::new(
            code,
            stdout.map(decode),
            stderr.map(decode),
        )))
    }

    /// Check for exit without blocking.
    ///
    /// Returns `None` if the process was never started or is still running.
    /// The handle is kept either way.
    pub fn poll(&mut self) -> Result<Option<i32>> {
        match self.running.as_mut() {
            None => Ok(None),
            Some(running) => Ok(running.child.try_wait()?.map(exit_code)),
        }
    }

    /// Ask the process to terminate and drop the handle.
    ///
    /// Does not wait for the process to exit. No-op if nothing is running.
    pub fn stop(&mut self) -> Result<&mut Self> {
        if let Some(running) = self.running.take() {
            let pid = running.child.id();
            running.terminate()?;
            info!(pid, "process stopped");
        }
        Ok(self)
    }

    /// PID of the live process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().map(|running| running.child.id())
    }

    fn ensure_started(&mut self) -> Result<&mut Running> {
        let running = match self.running.take() {
            Some(running) => {
                debug!(pid = running.child.id(), "already started");
                running
            }
            None => Running::new(self.spawn()?),
        };
        Ok(self.running.insert(running))
    }

    fn spawn(&self) -> Result<Child> {
        let mut process = self.build_process()?;
        process
            .env_clear()
            .envs(&self.env)
            .stdin(self.stdin.to_stdio()?)
            .stdout(self.stdout.to_stdio()?)
            .stderr(self.stderr.to_stdio()?);
        if let Some(ref dir) = self.cwd {
            process.current_dir(dir);
        }

        debug!(args = ?self.args, shell = self.shell, cwd = ?self.cwd, "spawning process");
        match process.spawn() {
            Ok(child) => {
                info!(pid = child.id(), "process started");
                Ok(child)
            }
            Err(source) => {
                let program = self.program_display();
                warn!(%program, error = %source, "failed to launch process");
                Err(CommandError::Launch { program, source })
            }
        }
    }

    fn build_process(&self) -> Result<process::Command> {
        let (program, rest) = self.args.split_first().ok_or(CommandError::EmptyCommand)?;

        if !self.shell {
            let mut process = process::Command::new(program);
            process.args(rest);
            return Ok(process);
        }

        Ok(shell_process(&self.args.join(" ")))
    }

    fn program_display(&self) -> String {
        if self.shell {
            self.args.join(" ")
        } else {
            self.args.first().cloned().unwrap_or_default()
        }
    }
}

#[cfg(unix)]
fn shell_process(line: &str) -> process::Command {
    let mut process = process::Command::new("/bin/sh");
    process.arg("-c").arg(line);
    process
}

#[cfg(windows)]
fn shell_process(line: &str) -> process::Command {
    use std::os::windows::process::CommandExt;

    let comspec = std::env::var_os("COMSPEC").unwrap_or_else(|| "cmd.exe".into());
    let mut process = process::Command::new(comspec);
    process.raw_arg(format!("/c \"{}\"", line));
    process
}
