//! End-to-end scenarios over a scripted runner.
//!
//! These exercise the full chain (executor, spec building, encoding,
//! output routing, exit-code policy) while asserting on the exact spawn
//! requests the runner receives. No real processes are spawned.

use std::io;
use std::sync::Arc;

use shoal::{
    ExecError, Executor, OptionValue, OutputMode, RawOutcome, RunArgs, Shell, StdioKind,
};
use shoal_testutil::ScriptedRunner;

fn scripted() -> (Arc<ScriptedRunner>, Executor) {
    let runner = ScriptedRunner::new();
    let shell = Shell::new().with_runner(runner.clone());
    (runner, Executor::new(shell))
}

#[test]
fn git_commit_reaches_the_runner_with_the_full_argv() {
    let (runner, exec) = scripted();

    exec.git()
        .subcommand("commit")
        .opt("message", OptionValue::eq("msg"))
        .batch()
        .unwrap();

    assert_eq!(runner.only_call().argv, ["git", "commit", "--message=msg"]);
}

#[test]
fn batch_requests_capture_on_both_streams() {
    let (runner, exec) = scripted();
    runner.push(RawOutcome::ok("out\n"));

    let (stdout, stderr) = exec.git().subcommand("status").batch().unwrap();
    assert_eq!(stdout, "out\n");
    assert_eq!(stderr, "");

    let call = runner.only_call();
    assert_eq!(call.stdout, StdioKind::Capture);
    assert_eq!(call.stderr, StdioKind::Capture);
}

#[test]
fn interactive_inherits_both_streams() {
    let (runner, exec) = scripted();

    let result = exec.git().subcommand("status").interactive().unwrap();
    assert!(result.ok());
    assert!(result.captured_text().is_none());

    let call = runner.only_call();
    assert_eq!(call.stdout, StdioKind::Inherit);
    assert_eq!(call.stderr, StdioKind::Inherit);
}

#[test]
fn pip_install_appends_the_extra_index() {
    let (runner, exec) = scripted();

    exec.pip_install(["attrs"], Some("https://x")).unwrap();

    let argv = runner.only_call().argv;
    assert_eq!(argv[0], "pip");
    assert!(argv.ends_with(&[
        "install".to_string(),
        "attrs".to_string(),
        "--extra-index-url".to_string(),
        "https://x".to_string(),
    ]));
}

#[test]
fn pip_install_falls_back_to_the_executor_pypi() {
    let (runner, exec) = scripted();
    let exec = exec.with_pypi("https://default");

    exec.pip_install(["attrs"], None).unwrap();

    let argv = runner.only_call().argv;
    assert!(argv.ends_with(&[
        "--extra-index-url".to_string(),
        "https://default".to_string(),
    ]));
}

#[test]
fn pip_install_without_any_index_adds_no_option() {
    let (runner, exec) = scripted();

    exec.pip_install(["attrs"], None).unwrap();

    assert_eq!(runner.only_call().argv, ["pip", "install", "attrs"]);
}

#[test]
fn conda_install_expands_flags_and_channels() {
    let (runner, exec) = scripted();

    exec.conda_install(["numpy"], &["conda-forge", "bioconda"]).unwrap();

    assert_eq!(
        runner.only_call().argv,
        [
            "conda",
            "install",
            "numpy",
            "--quiet",
            "--yes",
            "--show-channel-urls",
            "--channel",
            "conda-forge",
            "--channel",
            "bioconda",
        ]
    );
}

#[test]
fn conda_install_with_no_channels_omits_the_option() {
    let (runner, exec) = scripted();

    exec.conda_install(["numpy"], &[]).unwrap();

    assert_eq!(
        runner.only_call().argv,
        ["conda", "install", "numpy", "--quiet", "--yes", "--show-channel-urls"]
    );
}

#[test]
fn patched_env_and_cwd_reach_the_runner() {
    let (runner, exec) = scripted();
    let exec = exec.patch_env([("API_KEY", Some("sekrit"))]).chdir("/elsewhere");

    exec.git().subcommand("status").batch().unwrap();

    let call = runner.only_call();
    assert_eq!(call.env.get("API_KEY").map(String::as_str), Some("sekrit"));
    assert_eq!(call.cwd, std::path::PathBuf::from("/elsewhere"));
}

#[test]
fn virtual_env_executor_rewrites_path() {
    let (runner, exec) = scripted();
    let exec = exec
        .patch_env([("PATH", Some("/usr/bin")), ("PYTHONHOME", Some("/opt/py"))])
        .in_virtual_env("/venvs/app");

    exec.pip_install(["attrs"], None).unwrap();

    let env = runner.only_call().env;
    assert_eq!(env.get("PATH").map(String::as_str), Some("/venvs/app/bin:/usr/bin"));
    assert_eq!(env.get("VIRTUAL_ENV").map(String::as_str), Some("/venvs/app"));
    assert!(!env.contains_key("PYTHONHOME"));
}

#[test]
fn nonzero_exit_with_check_carries_the_argv() {
    let (runner, exec) = scripted();
    runner.push(RawOutcome {
        code: 1,
        stdout: b"partial".to_vec(),
        stderr: b"boom".to_vec(),
    });

    let err = exec.git().subcommand("push").batch().unwrap_err();
    match err {
        ExecError::CommandFailed(failure) => {
            assert_eq!(failure.argv, ["git", "push"]);
            assert_eq!(failure.code, 1);
            assert_eq!(failure.stdout_text(), "partial");
            assert_eq!(failure.stderr_text(), "boom");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn nonzero_exit_without_check_is_a_result() {
    let (runner, exec) = scripted();
    runner.push(RawOutcome::exit(1));

    let run_args = RunArgs {
        check: false,
        output: OutputMode::Capture,
        ..RunArgs::default()
    };
    let result = exec.git().subcommand("push").run(&run_args).unwrap();
    assert_eq!(result.code, 1);
    assert!(!result.ok());
}

#[test]
fn spawn_failure_is_distinct_from_command_failure() {
    let (runner, exec) = scripted();
    runner.push_spawn_error(io::Error::new(io::ErrorKind::NotFound, "no git"));

    let err = exec.git().subcommand("status").batch().unwrap_err();
    match err {
        ExecError::Spawn { command, source } => {
            assert_eq!(command, "git");
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("expected Spawn, got {other:?}"),
    }
}

#[test]
fn resolve_runs_registered_commands() {
    let (runner, exec) = scripted();
    let mut exec = exec;
    exec.add_command("kubectl");

    exec.resolve("kubectl")
        .unwrap()
        .subcommand("get")
        .arg("pods")
        .batch()
        .unwrap();

    assert_eq!(runner.only_call().argv, ["kubectl", "get", "pods"]);
}

#[test]
fn byte_capture_skips_text_decoding() {
    let (runner, exec) = scripted();
    runner.push(RawOutcome {
        code: 0,
        stdout: vec![0xde, 0xad],
        stderr: Vec::new(),
    });

    let run_args = RunArgs {
        text: false,
        output: OutputMode::Capture,
        ..RunArgs::default()
    };
    let result = exec.command(["dump"]).run(&run_args).unwrap();
    match result.output {
        shoal::RunOutput::Bytes { stdout, .. } => assert_eq!(stdout, vec![0xde, 0xad]),
        other => panic!("expected Bytes, got {other:?}"),
    }
}
