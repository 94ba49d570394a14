//! Immutable command descriptions.
//!
//! A [`CommandSpec`] describes a command line before execution: subcommand
//! path, positional arguments, keyword options, and the run options that
//! will govern it. Every builder method consumes and returns a new value;
//! `Clone` gives copy-with-override for free.
//!
//! The binary name is *not* part of the spec: it is supplied where the spec
//! is bound to an executor (see [`crate::executor`]), so the same spec can be
//! replayed under different binaries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::shell::{OutputMode, RunArgs};
use crate::value::{encode, OptionValue};

/// An immutable description of a command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    subcommand: Vec<String>,
    args: Vec<String>,
    /// Keyword options in insertion order, raw names as given.
    options: Vec<(String, OptionValue)>,
    run_args: RunArgs,
}

/// `message` → `--message`, `extra_index_url` → `--extra-index-url`.
fn normalize_option(name: &str) -> String {
    format!("--{}", name.replace('_', "-"))
}

/// Subcommand segments get the same hyphenation, without the prefix.
fn normalize_segment(segment: &str) -> String {
    segment.replace('_', "-")
}

impl CommandSpec {
    pub fn new() -> Self {
        CommandSpec::default()
    }

    /// Append a subcommand segment (`_` normalized to `-`).
    pub fn subcommand(mut self, segment: impl Into<String>) -> Self {
        self.subcommand.push(normalize_segment(&segment.into()));
        self
    }

    /// Append one positional argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append positional arguments. An empty iterator is an identity.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a keyword option.
    ///
    /// A name that normalizes equal to an existing entry replaces that
    /// entry in place: later values win, original position kept.
    pub fn opt(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        let name = name.into();
        let value = value.into();
        let normalized = normalize_option(&name);
        match self
            .options
            .iter_mut()
            .find(|(existing, _)| normalize_option(existing) == normalized)
        {
            Some(entry) => *entry = (name, value),
            None => self.options.push((name, value)),
        }
        self
    }

    /// Set several keyword options. An empty iterator is an identity.
    pub fn opts<I, S>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, OptionValue)>,
        S: Into<String>,
    {
        pairs
            .into_iter()
            .fold(self, |spec, (name, value)| spec.opt(name, value))
    }

    /// Decode captured output as text (default) or keep raw bytes.
    pub fn text(mut self, text: bool) -> Self {
        self.run_args.text = text;
        self
    }

    /// Raise on non-zero exit (default) or report the code in the result.
    pub fn check(mut self, check: bool) -> Self {
        self.run_args.check = check;
        self
    }

    /// Choose where the process's output goes.
    pub fn output(mut self, output: OutputMode) -> Self {
        self.run_args.output = output;
        self
    }

    /// The run options this spec resolved to.
    pub fn run_args(&self) -> &RunArgs {
        &self.run_args
    }

    /// Flatten into the literal argument vector: subcommand segments, then
    /// positional arguments, then each option in insertion order through
    /// the encoder. The binary name is not included.
    pub fn to_argv(&self) -> Result<Vec<String>, EncodeError> {
        let mut argv = Vec::new();
        for segment in &self.subcommand {
            if segment.is_empty() {
                return Err(EncodeError::EmptySegment);
            }
            argv.push(segment.clone());
        }
        for arg in &self.args {
            if arg.is_empty() {
                return Err(EncodeError::EmptyArg);
            }
            argv.push(arg.clone());
        }
        let mut seen = BTreeSet::new();
        for (name, value) in &self.options {
            if name.is_empty() {
                return Err(EncodeError::EmptyOptionName);
            }
            let normalized = normalize_option(name);
            if !seen.insert(normalized.clone()) {
                return Err(EncodeError::DuplicateOption(normalized));
            }
            encode(&normalized, value, &mut argv);
        }
        Ok(argv)
    }
}
