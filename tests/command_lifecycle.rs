//! Process lifecycle integration tests.
//!
//! These tests spawn real processes through `/bin/sh` and core utilities,
//! so they only run on Unix.

#![cfg(unix)]

use std::io::{Read, Seek, SeekFrom};
use std::time::{Duration, Instant};

use lazy_command::{Command, CommandError, Completion, Output, Redirect, StreamContent};

fn completed<T: std::fmt::Debug>(completion: Completion<T>) -> T {
    match completion {
        Completion::Completed(value) => value,
        Completion::TimedOut => panic!("expected completion, got timeout"),
    }
}

fn text(content: Option<&StreamContent>) -> Option<&str> {
    content.and_then(StreamContent::as_text)
}

// ============================================================================
// Output capture
// ============================================================================

#[test]
fn test_output_captures_by_default() {
    let mut cmd = Command::new("echo hello").unwrap();
    let output = completed(cmd.output(None).unwrap());

    assert_eq!(
        output,
        Output::new(
            0,
            Some(StreamContent::Text("hello\n".into())),
            Some(StreamContent::Text(String::new()))
        )
    );
    assert!(output.is_success());
    assert!(cmd.pid().is_none());
    assert!(cmd.stdout().is_pipe());
    assert!(cmd.stderr().is_pipe());
    assert!(cmd.stdin().is_pipe());
}

#[test]
fn test_output_separates_streams() {
    let mut cmd = Command::new("echo out; echo err 1>&2; exit 3").unwrap();
    cmd.use_shell();
    let output = completed(cmd.output(Some(Duration::from_secs(10))).unwrap());

    assert_eq!(output.return_code(), 3);
    assert!(!output.is_success());
    assert_eq!(text(output.stdout()), Some("out\n"));
    assert_eq!(text(output.stderr()), Some("err\n"));
}

#[test]
fn test_output_binary_mode() {
    let mut text_cmd = Command::new(r"printf 'a\r\nb'").unwrap();
    text_cmd.use_shell();
    let text_output = completed(text_cmd.output(None).unwrap());
    assert_eq!(text(text_output.stdout()), Some("a\nb"));

    let mut binary_cmd = Command::new(r"printf 'a\r\nb'").unwrap();
    binary_cmd.use_shell().use_binary_mode();
    let binary_output = completed(binary_cmd.output(None).unwrap());
    assert_eq!(
        binary_output.stdout(),
        Some(&StreamContent::Binary(b"a\r\nb".to_vec()))
    );
}

#[test]
fn test_output_explicit_null_is_not_captured() {
    let mut cmd = Command::new("echo hidden").unwrap();
    cmd.null_stdout();
    let output = completed(cmd.output(None).unwrap());

    assert!(output.stdout().is_none());
    assert_eq!(text(output.stderr()), Some(""));
    assert!(matches!(cmd.stdout(), Redirect::Null));
}

#[test]
fn test_output_large_streams_do_not_deadlock() {
    // Both streams well past a typical 64 KiB pipe buffer.
    let script = "i=0; while [ $i -lt 20000 ]; do echo xxxxxxxxxx; echo yyyyyyyyyy 1>&2; i=$((i+1)); done";
    let mut cmd = Command::from_args(["/bin/sh", "-c", script]);
    let output = completed(cmd.output(Some(Duration::from_secs(60))).unwrap());

    assert!(output.is_success());
    assert_eq!(output.stdout().unwrap().as_bytes().len(), 20000 * 11);
    assert_eq!(output.stderr().unwrap().as_bytes().len(), 20000 * 11);
}

#[test]
fn test_output_stdin_closed() {
    // cat would block forever if stdin stayed open.
    let mut cmd = Command::new("cat").unwrap();
    let output = completed(cmd.output(Some(Duration::from_secs(10))).unwrap());
    assert!(output.is_success());
    assert_eq!(text(output.stdout()), Some(""));
}

#[test]
fn test_output_timeout_then_resume() {
    let mut cmd = Command::new("echo early; sleep 1; echo late").unwrap();
    cmd.use_shell();

    let first = cmd.output(Some(Duration::from_millis(100))).unwrap();
    assert!(first.is_timed_out());
    assert!(cmd.pid().is_some());

    let output = completed(cmd.output(None).unwrap());
    assert_eq!(text(output.stdout()), Some("early\nlate\n"));
    assert!(cmd.pid().is_none());
}

#[test]
fn test_output_timeout_covers_inherited_pipes() {
    // The shell exits at once, but the background sleep keeps both pipes open.
    let mut cmd = Command::new("sleep 3 & echo hi").unwrap();
    cmd.use_shell();

    let started = Instant::now();
    let result = cmd.output(Some(Duration::from_millis(500))).unwrap();

    assert!(result.is_timed_out());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(cmd.pid().is_some());
    cmd.stop().unwrap();
}

#[test]
fn test_output_resumes_after_inherited_pipes_close() {
    let mut cmd = Command::new("sleep 1 & echo hi").unwrap();
    cmd.use_shell();

    let first = cmd.output(Some(Duration::from_millis(200))).unwrap();
    assert!(first.is_timed_out());

    let output = completed(cmd.output(None).unwrap());
    assert!(output.is_success());
    assert_eq!(text(output.stdout()), Some("hi\n"));
    assert!(cmd.pid().is_none());
}

#[test]
fn test_shell_and_direct_agree() {
    let mut direct = Command::new("echo hello").unwrap();
    let mut shelled = Command::new("echo hello").unwrap();
    shelled.use_shell();

    let direct = completed(direct.output(None).unwrap());
    let shelled = completed(shelled.output(None).unwrap());
    assert_eq!(direct, shelled);
}

// ============================================================================
// Status and poll
// ============================================================================

#[test]
fn test_status_returns_exit_code() {
    let mut cmd = Command::from_args(["/bin/sh", "-c", "exit 7"]);
    assert_eq!(cmd.status(None).unwrap(), Completion::Completed(7));
    assert!(cmd.pid().is_none());
}

#[test]
fn test_status_timeout_then_complete() {
    let mut cmd = Command::new("sleep 1").unwrap();

    let first = cmd.status(Some(Duration::from_millis(50))).unwrap();
    assert_eq!(first, Completion::TimedOut);
    let pid = cmd.pid();
    assert!(pid.is_some());

    // Same process, waited to completion.
    let second = cmd.status(None).unwrap();
    assert_eq!(second, Completion::Completed(0));
    assert!(cmd.pid().is_none());
}

#[test]
fn test_status_leaves_piped_stdin_open() {
    // cat only exits on EOF, which a bounded wait must not trigger.
    let mut cmd = Command::new("cat").unwrap();
    cmd.pipe_stdin().null_stdout();

    let first = cmd.status(Some(Duration::from_millis(100))).unwrap();
    assert_eq!(first, Completion::TimedOut);
    let second = cmd.status(Some(Duration::from_millis(100))).unwrap();
    assert_eq!(second, Completion::TimedOut);
    assert_eq!(cmd.poll().unwrap(), None);

    cmd.stop().unwrap();
}

#[test]
fn test_start_twice_keeps_process() {
    let mut cmd = Command::new("sleep 5").unwrap();
    let first = cmd.start().unwrap().pid();
    let second = cmd.start().unwrap().pid();

    assert!(first.is_some());
    assert_eq!(first, second);
    cmd.stop().unwrap();
}

#[test]
fn test_poll_does_not_clear_handle() {
    let mut cmd = Command::new("true").unwrap();
    assert_eq!(cmd.poll().unwrap(), None);

    cmd.start().unwrap();
    let pid = cmd.pid();

    let deadline = Instant::now() + Duration::from_secs(10);
    let code = loop {
        if let Some(code) = cmd.poll().unwrap() {
            break code;
        }
        assert!(Instant::now() < deadline, "process never exited");
        std::thread::sleep(Duration::from_millis(10));
    };

    assert_eq!(code, 0);
    assert_eq!(cmd.pid(), pid);
    // Repeated polls keep reporting the same code.
    assert_eq!(cmd.poll().unwrap(), Some(0));
    assert_eq!(cmd.status(None).unwrap(), Completion::Completed(0));
    assert!(cmd.pid().is_none());
}

#[test]
fn test_poll_running() {
    let mut cmd = Command::new("sleep 5").unwrap();
    cmd.start().unwrap();
    assert_eq!(cmd.poll().unwrap(), None);
    assert!(cmd.pid().is_some());
    cmd.stop().unwrap();
}

#[test]
fn test_command_is_reusable() {
    let mut cmd = Command::new("echo again").unwrap();
    let first = completed(cmd.output(None).unwrap());
    let second = completed(cmd.output(None).unwrap());
    assert_eq!(first, second);
}

// ============================================================================
// Stop
// ============================================================================

#[test]
fn test_stop_clears_handle() {
    let mut cmd = Command::new("sleep 30").unwrap();
    cmd.start().unwrap();
    assert!(cmd.pid().is_some());

    cmd.stop().unwrap();
    assert!(cmd.pid().is_none());
    assert_eq!(cmd.poll().unwrap(), None);

    // Stopping again is a no-op.
    cmd.stop().unwrap();
}

#[test]
fn test_stop_after_exit() {
    let mut cmd = Command::new("true").unwrap();
    cmd.start().unwrap();
    std::thread::sleep(Duration::from_millis(200));
    assert!(cmd.stop().is_ok());
    assert!(cmd.pid().is_none());
}

#[test]
fn test_stop_never_started() {
    let mut cmd = Command::new("sleep 30").unwrap();
    assert!(cmd.stop().is_ok());
    assert!(cmd.pid().is_none());
}

// ============================================================================
// Configuration flowing into the process
// ============================================================================

#[test]
fn test_environment_vars_reach_child() {
    let mut cmd = Command::new("echo $LAZY_COMMAND_TEST_VALUE").unwrap();
    cmd.use_shell()
        .set_environment_vars([("LAZY_COMMAND_TEST_VALUE", "from-builder")]);

    let output = completed(cmd.output(None).unwrap());
    assert_eq!(text(output.stdout()), Some("from-builder\n"));
    // The parent environment is untouched.
    assert!(std::env::var_os("LAZY_COMMAND_TEST_VALUE").is_none());
}

#[test]
fn test_clear_environment_reaches_child() {
    let mut cmd = Command::from_args(["/bin/sh", "-c", "echo ${HOME:-unset}"]);
    cmd.clear_environment();

    let output = completed(cmd.output(None).unwrap());
    assert_eq!(text(output.stdout()), Some("unset\n"));
}

#[test]
fn test_working_directory_reaches_child() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().canonicalize().unwrap();

    let mut cmd = Command::new("pwd -P").unwrap();
    cmd.use_shell().set_working_directory(dir.path()).unwrap();

    let output = completed(cmd.output(None).unwrap());
    assert_eq!(
        text(output.stdout()).map(str::trim_end),
        expected.to_str()
    );
}

#[test]
fn test_stdout_to_file() {
    let mut file = tempfile::tempfile().unwrap();
    let mut cmd = Command::new("echo to-file").unwrap();
    cmd.set_stdout(file.try_clone().unwrap());

    assert_eq!(cmd.status(None).unwrap(), Completion::Completed(0));

    let mut written = String::new();
    file.seek(SeekFrom::Start(0)).unwrap();
    file.read_to_string(&mut written).unwrap();
    assert_eq!(written, "to-file\n");
}

#[test]
fn test_launch_failure_stays_unstarted() {
    let mut cmd = Command::new("lazy-command-definitely-missing").unwrap();
    assert!(matches!(cmd.start(), Err(CommandError::Launch { .. })));
    assert!(cmd.pid().is_none());
    assert!(matches!(cmd.status(None), Err(CommandError::Launch { .. })));
}
