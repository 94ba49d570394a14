//! Named-command execution: the registry over a shell.
//!
//! An [`Executor`] binds command names (git, pip, conda, docker, …) to a
//! [`Shell`]. Resolution is an explicit registry lookup, not attribute
//! interception: `resolve("docker")` hands back a [`BoundCommand`] builder,
//! and the typed accessors (`git()`, `pip()`, …) cover the defaults.
//!
//! ```no_run
//! use shoal::{Executor, OptionValue, Shell};
//!
//! # fn main() -> Result<(), shoal::ExecError> {
//! let exec = Executor::new(Shell::new());
//! let (stdout, _stderr) = exec
//!     .git()
//!     .subcommand("commit")
//!     .opt("message", OptionValue::eq("fix the flux capacitor"))
//!     .batch()?;
//! # Ok(()) }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Child;

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::shell::{ExecResult, OutputMode, RunArgs, RunOutput, Shell};
use crate::value::OptionValue;

/// Commands every executor knows out of the box.
pub const DEFAULT_COMMANDS: [&str; 4] = ["git", "pip", "conda", "docker"];

/// Executes named commands against a shell.
#[derive(Debug, Clone)]
pub struct Executor {
    shell: Shell,
    pypi: Option<String>,
    commands: BTreeSet<String>,
}

impl Executor {
    /// An executor over the given shell, with the default commands
    /// registered.
    pub fn new(shell: Shell) -> Self {
        Executor {
            shell,
            pypi: None,
            commands: DEFAULT_COMMANDS.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Set the fallback extra index URL for [`Executor::pip_install`].
    pub fn with_pypi(mut self, index_url: impl Into<String>) -> Self {
        self.pypi = Some(index_url.into());
        self
    }

    /// Register another command name (`_` normalized to `-`).
    ///
    /// The known-command set is the executor's only mutable state; wrap the
    /// executor in a lock if it is shared across threads.
    pub fn add_command(&mut self, name: impl Into<String>) {
        self.commands.insert(name.into().replace('_', "-"));
    }

    /// The registered command names.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    /// Look up a command name and bind it to this executor's shell.
    ///
    /// The name is normalized (`_`→`-`) before lookup. Unknown names are
    /// [`ExecError::UnknownCommand`].
    pub fn resolve(&self, name: &str) -> Result<BoundCommand<'_>, ExecError> {
        let name = name.replace('_', "-");
        if !self.commands.contains(&name) {
            return Err(ExecError::UnknownCommand(name));
        }
        Ok(self.bind(name))
    }

    pub fn git(&self) -> BoundCommand<'_> {
        self.bind("git")
    }

    pub fn pip(&self) -> BoundCommand<'_> {
        self.bind("pip")
    }

    pub fn conda(&self) -> BoundCommand<'_> {
        self.bind("conda")
    }

    pub fn docker(&self) -> BoundCommand<'_> {
        self.bind("docker")
    }

    fn bind(&self, name: impl Into<String>) -> BoundCommand<'_> {
        BoundCommand {
            shell: &self.shell,
            name: name.into(),
            spec: CommandSpec::new(),
        }
    }

    /// Prepare a raw, pre-flattened argument vector (binary name first)
    /// for execution under this executor's shell.
    pub fn command<I, S>(&self, argv: I) -> PreparedCommand<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PreparedCommand {
            shell: &self.shell,
            argv: argv.into_iter().map(Into::into).collect(),
            run_args: RunArgs::default(),
        }
    }

    /// A new executor with the shell's environment patched.
    pub fn patch_env<I, K, V>(&self, patch: I) -> Executor
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        Executor {
            shell: self.shell.with_env(patch),
            ..self.clone()
        }
    }

    /// A new executor with the working directory changed (shell `cd`
    /// composition).
    pub fn chdir(&self, path: impl AsRef<Path>) -> Executor {
        Executor {
            shell: self.shell.chdir(path),
            ..self.clone()
        }
    }

    /// A new executor pointed into a Python virtual environment.
    pub fn in_virtual_env(&self, env_path: impl AsRef<Path>) -> Executor {
        Executor {
            shell: self.shell.in_virtual_env(env_path),
            ..self.clone()
        }
    }

    /// `pip install` the given packages in batch mode.
    ///
    /// `index_url` (or the executor-level pypi default) becomes
    /// `--extra-index-url`.
    pub fn pip_install<I, S>(
        &self,
        packages: I,
        index_url: Option<&str>,
    ) -> Result<(String, String), ExecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cmd = self.pip().subcommand("install").args(packages);
        if let Some(url) = index_url.or(self.pypi.as_deref()) {
            cmd = cmd.opt("extra_index_url", url);
        }
        cmd.batch()
    }

    /// `conda install` the given packages in batch mode, quietly, from the
    /// given channels.
    pub fn conda_install<I, S>(
        &self,
        packages: I,
        channels: &[&str],
    ) -> Result<(String, String), ExecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conda()
            .subcommand("install")
            .opt("quiet", OptionValue::Flag)
            .opt("yes", OptionValue::Flag)
            .opt("show_channel_urls", OptionValue::Flag)
            .opt("channel", channels.to_vec())
            .args(packages)
            .batch()
    }
}

/// A [`CommandSpec`] bound to a binary name and a shell.
///
/// Forwards the spec builders, then runs with one of the output-mode
/// accessors: `batch` captures, `interactive` inherits, `redirect` logs to
/// files, `popen` hands back the raw child.
#[derive(Debug, Clone)]
pub struct BoundCommand<'a> {
    shell: &'a Shell,
    name: String,
    spec: CommandSpec,
}

impl<'a> BoundCommand<'a> {
    pub fn subcommand(mut self, segment: impl Into<String>) -> Self {
        self.spec = self.spec.subcommand(segment);
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.spec = self.spec.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec = self.spec.args(args);
        self
    }

    pub fn opt(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.spec = self.spec.opt(name, value);
        self
    }

    pub fn text(mut self, text: bool) -> Self {
        self.spec = self.spec.text(text);
        self
    }

    pub fn check(mut self, check: bool) -> Self {
        self.spec = self.spec.check(check);
        self
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Flatten into the prepared form: binary name plus the spec's argv.
    pub fn prepare(&self) -> Result<PreparedCommand<'a>, ExecError> {
        let mut argv = vec![self.name.clone()];
        argv.extend(self.spec.to_argv()?);
        Ok(PreparedCommand {
            shell: self.shell,
            argv,
            run_args: self.spec.run_args().clone(),
        })
    }

    /// Run with captured output; returns the `(stdout, stderr)` text pair.
    pub fn batch(&self) -> Result<(String, String), ExecError> {
        self.prepare()?.batch()
    }

    /// Run with the caller's own streams.
    pub fn interactive(&self) -> Result<ExecResult, ExecError> {
        self.prepare()?.interactive()
    }

    /// Run with output logged to files; returns the `(stdout, stderr)`
    /// paths.
    pub fn redirect(&self) -> Result<(PathBuf, PathBuf), ExecError> {
        self.prepare()?.redirect()
    }

    /// Run with explicit run options.
    pub fn run(&self, run_args: &RunArgs) -> Result<ExecResult, ExecError> {
        self.prepare()?.run(run_args)
    }

    /// Spawn and hand back the raw child handle without waiting.
    pub fn popen(&self) -> Result<Child, ExecError> {
        self.prepare()?.popen()
    }
}

/// A flattened argument vector ready to run under a shell.
#[derive(Debug, Clone)]
pub struct PreparedCommand<'a> {
    shell: &'a Shell,
    argv: Vec<String>,
    run_args: RunArgs,
}

impl PreparedCommand<'_> {
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn batch(&self) -> Result<(String, String), ExecError> {
        let run_args = RunArgs {
            output: OutputMode::Capture,
            ..self.run_args.clone()
        };
        let result = self.shell.run_command(&self.argv, &run_args)?;
        result.captured_text().ok_or_else(|| missing_output(&run_args))
    }

    pub fn interactive(&self) -> Result<ExecResult, ExecError> {
        let run_args = RunArgs {
            output: OutputMode::Inherit,
            ..self.run_args.clone()
        };
        self.shell.run_command(&self.argv, &run_args)
    }

    pub fn redirect(&self) -> Result<(PathBuf, PathBuf), ExecError> {
        let run_args = RunArgs {
            output: OutputMode::LogToFile,
            ..self.run_args.clone()
        };
        let result = self.shell.run_command(&self.argv, &run_args)?;
        match result.output {
            RunOutput::Files { stdout, stderr } => Ok((stdout, stderr)),
            _ => Err(missing_output(&run_args)),
        }
    }

    pub fn run(&self, run_args: &RunArgs) -> Result<ExecResult, ExecError> {
        self.shell.run_command(&self.argv, run_args)
    }

    pub fn popen(&self) -> Result<Child, ExecError> {
        self.shell.popen(&self.argv)
    }
}

/// A run came back without the output shape its mode guarantees.
fn missing_output(run_args: &RunArgs) -> ExecError {
    ExecError::Internal(format!("no output for mode {:?}", run_args.output))
}
