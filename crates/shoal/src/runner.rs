//! The process-spawning boundary.
//!
//! [`ProcessRunner`] is the minimal capability the shell needs from the
//! outside world: spawn an argument vector, block until it exits, report the
//! raw outcome. Consumers implement it to substitute a fake for tests or to
//! route execution somewhere else entirely; [`SystemRunner`] is the default
//! over `std::process::Command`.
//!
//! Exit-code policy (raise vs. report) is not the runner's concern: a
//! runner errors only when the process could not be launched.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Disposition of one output stream for a single run.
#[derive(Debug)]
pub enum StdioSpec {
    /// Inherit the parent's stream.
    Inherit,
    /// Buffer the stream in memory.
    Capture,
    /// Redirect the stream into an already-open file. The handle is moved
    /// into the child, so it is closed when the run completes.
    File(File),
}

impl StdioSpec {
    /// The disposition without its payload, for recording and logging.
    pub fn kind(&self) -> StdioKind {
        match self {
            StdioSpec::Inherit => StdioKind::Inherit,
            StdioSpec::Capture => StdioKind::Capture,
            StdioSpec::File(_) => StdioKind::File,
        }
    }
}

/// Payload-free view of a [`StdioSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioKind {
    Inherit,
    Capture,
    File,
}

/// Everything a runner needs to start one process.
#[derive(Debug)]
pub struct SpawnRequest {
    /// Full argument vector, binary name first.
    pub argv: Vec<String>,
    /// Working directory for the child.
    pub cwd: PathBuf,
    /// The child's entire environment, not a patch over the parent's.
    pub env: BTreeMap<String, String>,
    pub stdout: StdioSpec,
    pub stderr: StdioSpec,
}

/// Raw result of one finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutcome {
    /// Exit code; -1 when the child was terminated by a signal.
    pub code: i32,
    /// Captured stdout bytes (empty unless stdout was `Capture`).
    pub stdout: Vec<u8>,
    /// Captured stderr bytes (empty unless stderr was `Capture`).
    pub stderr: Vec<u8>,
}

impl RawOutcome {
    /// A zero-exit outcome with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        RawOutcome {
            code: 0,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// An outcome that exited with `code` and produced no output.
    pub fn exit(code: i32) -> Self {
        RawOutcome {
            code,
            ..RawOutcome::default()
        }
    }
}

/// Spawns a process and blocks until it exits.
pub trait ProcessRunner: Send + Sync {
    /// Run the request to completion.
    ///
    /// Errors only on launch failure (binary not found, permission denied).
    /// A non-zero exit is a normal [`RawOutcome`].
    fn run(&self, req: SpawnRequest) -> io::Result<RawOutcome>;
}

/// The default runner, backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, req: SpawnRequest) -> io::Result<RawOutcome> {
        let Some((program, rest)) = req.argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty argv"));
        };

        let mut cmd = Command::new(program);
        cmd.args(rest).current_dir(&req.cwd);
        cmd.env_clear().envs(&req.env);

        // Both streams captured: Command::output reads them concurrently,
        // which the sequential fallback below cannot do without deadlocking
        // on large interleaved output.
        if matches!((&req.stdout, &req.stderr), (StdioSpec::Capture, StdioSpec::Capture)) {
            let output = cmd.output()?;
            return Ok(RawOutcome {
                code: output.status.code().unwrap_or(-1),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        cmd.stdout(stdio_for(req.stdout));
        cmd.stderr(stdio_for(req.stderr));

        let mut child = cmd.spawn()?;

        // At most one stream is piped here, so reading it to EOF before
        // waiting cannot deadlock against the other.
        let mut stdout = Vec::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_end(&mut stdout)?;
        }
        let mut stderr = Vec::new();
        if let Some(mut pipe) = child.stderr.take() {
            pipe.read_to_end(&mut stderr)?;
        }

        let status = child.wait()?;
        Ok(RawOutcome {
            code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

fn stdio_for(spec: StdioSpec) -> Stdio {
    match spec {
        StdioSpec::Inherit => Stdio::inherit(),
        StdioSpec::Capture => Stdio::piped(),
        StdioSpec::File(file) => Stdio::from(file),
    }
}
