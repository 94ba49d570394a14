//! Integration tests against real processes.
//!
//! These spawn small POSIX tools (`echo`, `sh`) through the default
//! [`shoal::SystemRunner`] and verify capture, file logging, and the
//! exit-code policy end to end.

use shoal::{ExecError, Executor, OutputMode, RunArgs, Shell};
use tempfile::tempdir;

#[test]
fn batch_captures_stdout_and_stderr_separately() {
    let exec = Executor::new(Shell::new());
    let (stdout, stderr) = exec
        .command(["sh", "-c", "echo out; echo err >&2"])
        .batch()
        .unwrap();
    assert_eq!(stdout, "out\n");
    assert_eq!(stderr, "err\n");
}

#[test]
fn byte_capture_returns_raw_bytes() {
    let shell = Shell::new();
    let run_args = RunArgs {
        text: false,
        output: OutputMode::Capture,
        ..RunArgs::default()
    };
    let argv: Vec<String> = ["echo", "hello"].iter().map(|s| s.to_string()).collect();
    let result = shell.run_command(&argv, &run_args).unwrap();
    match result.output {
        shoal::RunOutput::Bytes { stdout, .. } => assert_eq!(stdout, b"hello\n"),
        other => panic!("expected Bytes, got {other:?}"),
    }
}

#[test]
fn redirect_writes_uuid_named_log_files() {
    let dir = tempdir().unwrap();
    let shell = Shell::new().with_log_dir(dir.path());
    let exec = Executor::new(shell);

    let (out_path, err_path) = exec
        .command(["sh", "-c", "echo logged; echo trouble >&2"])
        .redirect()
        .unwrap();

    assert_eq!(out_path.extension().unwrap(), "out");
    assert_eq!(err_path.extension().unwrap(), "err");
    // Both files share the per-run identifier
    assert_eq!(out_path.file_stem(), err_path.file_stem());

    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "logged\n");
    assert_eq!(std::fs::read_to_string(&err_path).unwrap(), "trouble\n");
}

#[test]
fn redirect_creates_the_log_directory() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("logs/commands");
    let exec = Executor::new(Shell::new().with_log_dir(&nested));

    exec.command(["echo", "hi"]).redirect().unwrap();

    assert!(nested.is_dir());
}

#[test]
fn each_redirected_run_gets_fresh_files() {
    let dir = tempdir().unwrap();
    let exec = Executor::new(Shell::new().with_log_dir(dir.path()));

    let (first, _) = exec.command(["echo", "one"]).redirect().unwrap();
    let (second, _) = exec.command(["echo", "two"]).redirect().unwrap();

    assert_ne!(first, second);
    assert_eq!(std::fs::read_to_string(&first).unwrap(), "one\n");
    assert_eq!(std::fs::read_to_string(&second).unwrap(), "two\n");
}

#[test]
fn failing_redirected_run_reports_output_from_the_logs() {
    let dir = tempdir().unwrap();
    let exec = Executor::new(Shell::new().with_log_dir(dir.path()));

    let err = exec
        .command(["sh", "-c", "echo oops >&2; exit 9"])
        .redirect()
        .unwrap_err();
    match err {
        ExecError::CommandFailed(failure) => {
            assert_eq!(failure.code, 9);
            assert_eq!(failure.stderr_text(), "oops\n");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn nonzero_exit_without_check_reports_the_code() {
    let shell = Shell::new();
    let run_args = RunArgs {
        check: false,
        output: OutputMode::Capture,
        ..RunArgs::default()
    };
    let argv: Vec<String> = ["sh", "-c", "exit 3"].iter().map(|s| s.to_string()).collect();
    let result = shell.run_command(&argv, &run_args).unwrap();
    assert_eq!(result.code, 3);
}

#[test]
fn nonzero_exit_with_check_raises() {
    let exec = Executor::new(Shell::new());
    let err = exec.command(["sh", "-c", "exit 1"]).batch().unwrap_err();
    match err {
        ExecError::CommandFailed(failure) => {
            assert_eq!(failure.code, 1);
            assert_eq!(failure.argv, ["sh", "-c", "exit 1"]);
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn missing_binary_is_a_spawn_error() {
    let exec = Executor::new(Shell::new());
    let err = exec
        .command(["shoal-definitely-not-installed"])
        .batch()
        .unwrap_err();
    assert!(matches!(err, ExecError::Spawn { .. }));
}

#[test]
fn child_sees_the_shell_cwd_and_env() {
    let dir = tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let exec = Executor::new(
        Shell::new()
            .chdir(&canonical)
            .with_env([("SHOAL_PROBE", Some("42"))]),
    );

    let (stdout, _) = exec.command(["sh", "-c", "pwd; echo $SHOAL_PROBE"]).batch().unwrap();
    assert_eq!(stdout, format!("{}\n42\n", canonical.display()));
}

#[test]
fn popen_hands_back_a_waitable_child() {
    let shell = Shell::new();
    let argv: Vec<String> = ["sh", "-c", "exit 0"].iter().map(|s| s.to_string()).collect();
    let mut child = shell.popen(&argv).unwrap();
    let status = child.wait().unwrap();
    assert!(status.success());
}
