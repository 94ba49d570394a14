//! Option values and their argument encoding.
//!
//! An [`OptionValue`] is the typed payload bound to a named command-line
//! option. Encoding is a closed match over the variants: every value has
//! exactly one defined token sequence, so `encode` is total. Adding a new
//! shape of option means adding a variant here, not registering a handler.

use serde::{Deserialize, Serialize};

/// A typed option payload.
///
/// Each variant maps to one encoding rule:
///
/// - `Flag`: the bare option name (`--quiet`)
/// - `Eq`: forced `--name=value` form, for tools that reject the
///   two-token spelling (`git show --format=%H`)
/// - `Str` / `Int`: `--name value`
/// - `List`: the option repeated once per element
/// - `Map`: the option repeated once per entry as `--name KEY=VALUE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionValue {
    /// A naked option with no value.
    Flag,
    /// A value that must be attached with `=`.
    Eq(String),
    /// A plain string value.
    Str(String),
    /// An integer value, rendered in decimal.
    Int(i64),
    /// The option repeated for each element, encoded per the element's
    /// own variant.
    List(Vec<OptionValue>),
    /// The option repeated for each `KEY=VALUE` entry, in insertion order.
    Map(Vec<(String, String)>),
}

impl OptionValue {
    /// Shorthand for the forced `--name=value` form.
    pub fn eq(content: impl Into<String>) -> Self {
        OptionValue::Eq(content.into())
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        OptionValue::Int(i64::from(i))
    }
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionValue {
    fn from(items: Vec<T>) -> Self {
        OptionValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<&[(&str, &str)]> for OptionValue {
    fn from(pairs: &[(&str, &str)]) -> Self {
        OptionValue::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Append the token sequence for one option to `out`.
///
/// `name` must already be in its final spelling (`--` prefix, hyphens);
/// normalization is the caller's job, applied once per option entry.
pub fn encode(name: &str, value: &OptionValue, out: &mut Vec<String>) {
    match value {
        OptionValue::Flag => out.push(name.to_string()),
        OptionValue::Eq(content) => out.push(format!("{name}={content}")),
        OptionValue::Str(s) => {
            out.push(name.to_string());
            out.push(s.clone());
        }
        OptionValue::Int(i) => {
            out.push(name.to_string());
            out.push(i.to_string());
        }
        OptionValue::List(items) => {
            for item in items {
                encode(name, item, out);
            }
        }
        OptionValue::Map(pairs) => {
            for (k, v) in pairs {
                out.push(name.to_string());
                out.push(format!("{k}={v}"));
            }
        }
    }
}
