//! Option declarations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of value an option takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// On/off switch (`--universal`, `--with-icu`, `--without-static`).
    Flag,
    /// Takes a value (`--layout=tagged`).
    Valued,
}

/// A resolved or default option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Text(_) => None,
        }
    }

    /// The value as text. Booleans render as `true`/`false`.
    pub fn as_text(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Text(s) => s.clone(),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// A declared build option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Unique key (`universal`, `icu`, `single`).
    pub key: String,
    /// Flag or valued.
    pub kind: OptionKind,
    /// Value used when the user does not mention the option.
    pub default: OptionValue,
    /// One-line description shown by `kiln info`.
    pub description: String,
}

impl OptionSpec {
    /// A switch that is off unless requested.
    pub fn flag(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: OptionKind::Flag,
            default: OptionValue::Bool(false),
            description: description.into(),
        }
    }

    /// A switch that is on unless declined with `--without-<key>`.
    pub fn flag_on(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            default: OptionValue::Bool(true),
            ..Self::flag(key, description)
        }
    }

    /// An option taking a value.
    pub fn valued(
        key: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            kind: OptionKind::Valued,
            default: OptionValue::Text(default.into()),
            description: description.into(),
        }
    }

    /// The flag users type to flip this option away from its default.
    pub fn toggle_flag(&self) -> String {
        match (&self.kind, &self.default) {
            (OptionKind::Flag, OptionValue::Bool(true)) => format!("--without-{}", self.key),
            (OptionKind::Flag, _) => format!("--{}", self.key),
            (OptionKind::Valued, _) => format!("--{}=<value>", self.key),
        }
    }
}
