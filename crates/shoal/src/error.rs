//! Error types for shoal.
//!
//! Two layers: [`EncodeError`] for argument-vector construction and
//! [`ExecError`] for everything on the execution path. A non-zero exit with
//! checking enabled is [`CommandFailure`], kept separate from spawn failure
//! (binary not found, permissions) so callers can tell the two apart.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from flattening a command spec into an argument vector.
///
/// Always fatal to the `to_argv()` call that produced them; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("empty option name")]
    EmptyOptionName,
    /// Two raw option names normalized to the same spelling.
    ///
    /// Unreachable through the builders, which replace on collision; a
    /// deserialized spec can still carry duplicates.
    #[error("duplicate option: {0}")]
    DuplicateOption(String),
    #[error("empty subcommand segment")]
    EmptySegment,
    #[error("empty positional argument")]
    EmptyArg,
}

/// Errors from running a command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be launched at all.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited non-zero while checking was enabled.
    #[error(transparent)]
    CommandFailed(#[from] CommandFailure),

    /// The log directory or a log file could not be set up.
    #[error("log setup failed at {}: {source}", .path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The executor has no command registered under this name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Invariant violation; not expected in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A command that exited non-zero, with whatever output was available.
///
/// For captured runs `stdout`/`stderr` hold the buffered streams; for
/// file-logged runs they are re-read from the log files best-effort; for
/// inherited runs they are empty.
#[derive(Debug, Error)]
#[error("command `{}` exited with code {code}", .argv.join(" "))]
pub struct CommandFailure {
    /// The full argument vector, binary name included.
    pub argv: Vec<String>,
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandFailure {
    /// Stdout as text (lossy).
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr as text (lossy).
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}
