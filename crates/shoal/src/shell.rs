//! The execution context: working directory, environment, output routing.
//!
//! A [`Shell`] is an immutable value. Derivations (`with_env`, `chdir`,
//! `in_virtual_env`) return a new shell and never touch the receiver, so a
//! shell can be shared read-only across threads and every call chain sees
//! exactly the context it was built with.
//!
//! ```text
//! argv + RunArgs ──▶ Shell::run_command ──▶ stdio routing ──▶ ProcessRunner
//!                          │                                      │
//!                    Inherit / Capture / LogToFile          RawOutcome
//!                          │                                      │
//!                          └──────────── check policy ──▶ ExecResult / ExecError
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::Arc;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CommandFailure, ExecError};
use crate::runner::{ProcessRunner, SpawnRequest, StdioSpec, SystemRunner};

/// Where a running process's stdout and stderr go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// The child inherits the caller's own streams; nothing is returned.
    #[default]
    Inherit,
    /// Both streams are buffered in memory and returned.
    Capture,
    /// Both streams are redirected into fresh log files; the result carries
    /// the two paths.
    LogToFile,
}

/// Options governing a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunArgs {
    /// Decode captured output as text (lossy UTF-8) rather than bytes.
    pub text: bool,
    /// Treat a non-zero exit as an error rather than a result.
    pub check: bool,
    pub output: OutputMode,
}

impl Default for RunArgs {
    fn default() -> Self {
        RunArgs {
            text: true,
            check: true,
            output: OutputMode::Inherit,
        }
    }
}

/// What a finished run produced, shaped by [`OutputMode`] and `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutput {
    /// Output went to the caller's own streams.
    Inherited,
    Text { stdout: String, stderr: String },
    Bytes { stdout: Vec<u8>, stderr: Vec<u8> },
    Files { stdout: PathBuf, stderr: PathBuf },
}

/// The result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Exit code, read from the process handle. Non-zero only reaches here
    /// when checking was disabled.
    pub code: i32,
    pub output: RunOutput,
}

impl ExecResult {
    pub fn ok(&self) -> bool {
        self.code == 0
    }

    /// Captured output as a `(stdout, stderr)` text pair.
    ///
    /// Byte captures are decoded lossily; `None` when the run did not
    /// capture (inherited or file-logged output).
    pub fn captured_text(&self) -> Option<(String, String)> {
        match &self.output {
            RunOutput::Text { stdout, stderr } => Some((stdout.clone(), stderr.clone())),
            RunOutput::Bytes { stdout, stderr } => Some((
                String::from_utf8_lossy(stdout).into_owned(),
                String::from_utf8_lossy(stderr).into_owned(),
            )),
            _ => None,
        }
    }

    /// The log-file paths, when the run was file-logged.
    pub fn log_paths(&self) -> Option<(&Path, &Path)> {
        match &self.output {
            RunOutput::Files { stdout, stderr } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

/// The environment a command runs under.
#[derive(Clone)]
pub struct Shell {
    cwd: PathBuf,
    env: BTreeMap<String, String>,
    log_dir: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("cwd", &self.cwd)
            .field("log_dir", &self.log_dir)
            .field("env_keys", &self.env.len())
            .finish_non_exhaustive()
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new()
    }
}

impl Shell {
    /// A shell over the current directory, the inherited process
    /// environment, and `~/.command-logs` (falling back to a relative
    /// `.command-logs` when no home directory is known).
    pub fn new() -> Self {
        let log_dir = BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".command-logs"))
            .unwrap_or_else(|| PathBuf::from(".command-logs"));
        Shell {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env: std::env::vars().collect(),
            log_dir,
            runner: Arc::new(SystemRunner),
        }
    }

    /// Replace the process-spawning capability (e.g. with a test double).
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the log directory used by [`OutputMode::LogToFile`].
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// A new shell with the environment patched.
    ///
    /// `Some(value)` sets the key; `None` removes it (a no-op when the key
    /// is already absent).
    pub fn with_env<I, K, V>(&self, patch: I) -> Shell
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env = self.env.clone();
        for (key, value) in patch {
            let key = key.into();
            match value {
                Some(value) => {
                    env.insert(key, value.into());
                }
                None => {
                    env.remove(&key);
                }
            }
        }
        Shell {
            env,
            ..self.clone()
        }
    }

    /// A new shell with the working directory changed.
    ///
    /// Joins like shell `cd`: a relative path composes with the current
    /// directory, an absolute path replaces it.
    pub fn chdir(&self, path: impl AsRef<Path>) -> Shell {
        Shell {
            cwd: self.cwd.join(path),
            ..self.clone()
        }
    }

    /// A new shell pointed into a Python virtual environment.
    ///
    /// Sets `VIRTUAL_ENV`, unsets `PYTHONHOME`, and prepends
    /// `{env_path}/bin` to `PATH`. A missing `PATH` degrades to the bare
    /// bin path.
    pub fn in_virtual_env(&self, env_path: impl AsRef<Path>) -> Shell {
        let env_path = env_path.as_ref();
        let bin = env_path.join("bin");
        let path = match self.env.get("PATH") {
            Some(old) => format!("{}:{}", bin.display(), old),
            None => bin.display().to_string(),
        };
        self.with_env([
            ("VIRTUAL_ENV", Some(env_path.display().to_string())),
            ("PYTHONHOME", None),
            ("PATH", Some(path)),
        ])
    }

    /// Run an argument vector (binary name first) under this shell.
    ///
    /// Routes output per `run_args.output`, then applies the exit-code
    /// policy: with `check` a non-zero exit becomes
    /// [`ExecError::CommandFailed`] carrying whatever output is available;
    /// without it the code is reported in the result.
    pub fn run_command(&self, argv: &[String], run_args: &RunArgs) -> Result<ExecResult, ExecError> {
        let command = argv.first().cloned().unwrap_or_default();
        debug!(command = %command, cwd = %self.cwd.display(), "running command");

        let routing = self.prepare_routing(run_args.output)?;
        let (stdout_spec, stderr_spec) = routing.specs()?;

        let raw = self
            .runner
            .run(SpawnRequest {
                argv: argv.to_vec(),
                cwd: self.cwd.clone(),
                env: self.env.clone(),
                stdout: stdout_spec,
                stderr: stderr_spec,
            })
            .map_err(|source| ExecError::Spawn { command, source })?;

        if run_args.check && raw.code != 0 {
            let (stdout, stderr) = match &routing {
                Routing::Log { stdout, stderr } => (read_log(stdout), read_log(stderr)),
                _ => (raw.stdout, raw.stderr),
            };
            return Err(CommandFailure {
                argv: argv.to_vec(),
                code: raw.code,
                stdout,
                stderr,
            }
            .into());
        }

        let output = match routing {
            Routing::Inherit => RunOutput::Inherited,
            Routing::Capture if run_args.text => RunOutput::Text {
                stdout: String::from_utf8_lossy(&raw.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&raw.stderr).into_owned(),
            },
            Routing::Capture => RunOutput::Bytes {
                stdout: raw.stdout,
                stderr: raw.stderr,
            },
            Routing::Log { stdout, stderr } => RunOutput::Files { stdout, stderr },
        };
        Ok(ExecResult {
            code: raw.code,
            output,
        })
    }

    /// Spawn an argument vector with inherited stdio and hand back the raw
    /// child handle without waiting.
    ///
    /// The escape hatch for callers that need kill/timeout control. This
    /// bypasses the [`ProcessRunner`] seam and always uses the real system
    /// spawner.
    pub fn popen(&self, argv: &[String]) -> Result<Child, ExecError> {
        let Some((program, rest)) = argv.split_first() else {
            return Err(ExecError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
            });
        };
        debug!(command = %program, "spawning raw child");
        Command::new(program)
            .args(rest)
            .current_dir(&self.cwd)
            .env_clear()
            .envs(&self.env)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: program.clone(),
                source,
            })
    }

    fn prepare_routing(&self, mode: OutputMode) -> Result<Routing, ExecError> {
        match mode {
            OutputMode::Inherit => Ok(Routing::Inherit),
            OutputMode::Capture => Ok(Routing::Capture),
            OutputMode::LogToFile => {
                fs::create_dir_all(&self.log_dir).map_err(|source| ExecError::Log {
                    path: self.log_dir.clone(),
                    source,
                })?;
                let base = Uuid::new_v4().to_string();
                Ok(Routing::Log {
                    stdout: self.log_dir.join(format!("{base}.out")),
                    stderr: self.log_dir.join(format!("{base}.err")),
                })
            }
        }
    }
}

/// Output routing resolved for one run. Log paths are kept here so the
/// result (and the failure path) can name them after the handles are gone.
enum Routing {
    Inherit,
    Capture,
    Log { stdout: PathBuf, stderr: PathBuf },
}

impl Routing {
    fn specs(&self) -> Result<(StdioSpec, StdioSpec), ExecError> {
        match self {
            Routing::Inherit => Ok((StdioSpec::Inherit, StdioSpec::Inherit)),
            Routing::Capture => Ok((StdioSpec::Capture, StdioSpec::Capture)),
            Routing::Log { stdout, stderr } => {
                Ok((StdioSpec::File(create_log(stdout)?), StdioSpec::File(create_log(stderr)?)))
            }
        }
    }
}

fn create_log(path: &Path) -> Result<File, ExecError> {
    File::create(path).map_err(|source| ExecError::Log {
        path: path.to_path_buf(),
        source,
    })
}

/// Best-effort re-read of a log file for the failure report.
fn read_log(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "could not re-read log file");
        Vec::new()
    })
}
