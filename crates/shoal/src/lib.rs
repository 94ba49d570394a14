//! shoal: composable construction and blocking execution of external
//! command lines.
//!
//! - **[`OptionValue`]**: typed option payloads with a total, closed
//!   argument encoding
//! - **[`CommandSpec`]**: immutable command description (subcommand path,
//!   positional args, keyword options, run options)
//! - **[`Shell`]**: immutable execution context (cwd, environment, log
//!   directory) that routes output inline, captured, or into log files
//! - **[`ProcessRunner`]**: the injectable spawning boundary;
//!   [`SystemRunner`] is the `std::process` default
//! - **[`Executor`]**: named-command registry with `batch` /
//!   `interactive` / `redirect` / `popen` accessors
//!
//! Everything here is synchronous: each run blocks until the child exits.
//! The library coordinates no concurrency of its own; `Shell` and
//! `CommandSpec` are immutable values, safe to share read-only.

pub mod command;
pub mod error;
pub mod executor;
pub mod runner;
pub mod shell;
pub mod value;

// Flat re-exports for convenience
pub use command::CommandSpec;
pub use error::{CommandFailure, EncodeError, ExecError};
pub use executor::{BoundCommand, Executor, PreparedCommand, DEFAULT_COMMANDS};
pub use runner::{ProcessRunner, RawOutcome, SpawnRequest, StdioKind, StdioSpec, SystemRunner};
pub use shell::{ExecResult, OutputMode, RunArgs, RunOutput, Shell};
pub use value::OptionValue;
