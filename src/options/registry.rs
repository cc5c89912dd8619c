//! Option registry and command-line resolution.
//!
//! The registry holds a recipe's declared options in declaration order,
//! together with declared conflicts and renamed spellings, and turns raw
//! command-line tokens into a [`BuildSelection`].
//!
//! Accepted token forms:
//!
//! - `--<key>` turns a flag on
//! - `--with-<key>` turns a flag on
//! - `--without-<key>` turns a flag off
//! - `--<key>=<value>` sets a valued option (or `true`/`false` for a flag)

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{KilnError, Result};

use super::selection::BuildSelection;
use super::spec::{OptionKind, OptionSpec, OptionValue};

/// A declared set of option values that must not appear together.
///
/// The rule fires when every listed option resolves to the listed value,
/// whether the value was given explicitly or came from the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionConflict {
    pub when: Vec<(String, OptionValue)>,
    pub message: String,
}

impl OptionConflict {
    /// Create a conflict rule.
    pub fn new(when: Vec<(String, OptionValue)>, message: impl Into<String>) -> Self {
        Self {
            when,
            message: message.into(),
        }
    }

    fn matches(&self, values: &BTreeMap<String, OptionValue>) -> bool {
        !self.when.is_empty()
            && self
                .when
                .iter()
                .all(|(key, value)| values.get(key) == Some(value))
    }
}

/// Registry of a recipe's options.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: Vec<OptionSpec>,
    index: HashMap<String, usize>,
    conflicts: Vec<OptionConflict>,
    renamed: BTreeMap<String, String>,
}

impl OptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an option.
    ///
    /// Fails with [`KilnError::DuplicateOption`] if the key is taken.
    pub fn register(&mut self, spec: OptionSpec) -> Result<()> {
        if self.index.contains_key(&spec.key) {
            return Err(KilnError::DuplicateOption { key: spec.key });
        }
        self.index.insert(spec.key.clone(), self.options.len());
        self.options.push(spec);
        Ok(())
    }

    /// Declare a conflict between option values.
    ///
    /// Every key in the rule must already be registered.
    pub fn add_conflict(&mut self, conflict: OptionConflict) -> Result<()> {
        for (key, _) in &conflict.when {
            if !self.index.contains_key(key) {
                return Err(KilnError::UnknownOption {
                    flag: format!("--{}", key),
                });
            }
        }
        self.conflicts.push(conflict);
        Ok(())
    }

    /// Declare that `old` (a flag spelling without the leading `--`) was
    /// renamed to the option `new`.
    pub fn rename(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.renamed.insert(old.into(), new.into());
    }

    /// Look up an option by key.
    pub fn get(&self, key: &str) -> Option<&OptionSpec> {
        self.index.get(key).map(|&i| &self.options[i])
    }

    /// Whether a key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// All options in declaration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Declared conflicts.
    pub fn conflicts(&self) -> &[OptionConflict] {
        &self.conflicts
    }

    /// Number of registered options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether no options are registered.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Resolve command-line tokens into a selection.
    ///
    /// Every declared option receives a value: the explicit one when given,
    /// otherwise its default.
    pub fn resolve<S: AsRef<str>>(&self, args: &[S]) -> Result<BuildSelection> {
        let mut explicit: BTreeMap<String, (OptionValue, String)> = BTreeMap::new();

        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = self.parse_token(arg)?;

            if let Some((previous, previous_flag)) = explicit.get(&key) {
                if *previous != value {
                    return Err(KilnError::ConflictingOption {
                        message: format!(
                            "'{}' and '{}' both set option '{}'",
                            previous_flag, arg, key
                        ),
                    });
                }
                continue;
            }
            explicit.insert(key, (value, arg.to_string()));
        }

        let explicit_keys: BTreeSet<String> = explicit.keys().cloned().collect();
        let mut values = BTreeMap::new();
        for spec in &self.options {
            let value = match explicit.remove(&spec.key) {
                Some((value, _)) => value,
                None => spec.default.clone(),
            };
            values.insert(spec.key.clone(), value);
        }

        if let Some(conflict) = self.conflicts.iter().find(|c| c.matches(&values)) {
            return Err(KilnError::ConflictingOption {
                message: conflict.message.clone(),
            });
        }

        tracing::debug!("resolved {} options", values.len());
        Ok(BuildSelection::new(values, explicit_keys))
    }

    /// Turn one token into a (key, value) pair.
    fn parse_token(&self, arg: &str) -> Result<(String, OptionValue)> {
        let unknown = || KilnError::UnknownOption {
            flag: arg.to_string(),
        };

        let body = arg.strip_prefix("--").ok_or_else(unknown)?;
        let (name, raw_value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        if let Some(new) = self.renamed.get(name) {
            return Err(KilnError::RenamedOption {
                old: format!("--{}", name),
                new: new.clone(),
            });
        }

        if let Some(spec) = self.get(name) {
            let value = match (spec.kind, raw_value) {
                (OptionKind::Flag, None) => OptionValue::Bool(true),
                (OptionKind::Flag, Some(v)) => OptionValue::Bool(parse_bool(name, v)?),
                (OptionKind::Valued, Some(v)) if !v.is_empty() => OptionValue::Text(v.to_string()),
                (OptionKind::Valued, _) => {
                    return Err(KilnError::InvalidOptionValue {
                        key: name.to_string(),
                        message: format!("expected '--{}=<value>'", name),
                    })
                }
            };
            return Ok((spec.key.clone(), value));
        }

        if raw_value.is_none() {
            for (prefix, value) in [("with-", true), ("without-", false)] {
                if let Some(key) = name.strip_prefix(prefix) {
                    if let Some(spec) = self.get(key).filter(|s| s.kind == OptionKind::Flag) {
                        return Ok((spec.key.clone(), OptionValue::Bool(value)));
                    }
                }
            }
        }

        Err(unknown())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(KilnError::InvalidOptionValue {
            key: key.to_string(),
            message: format!("'{}' is not a boolean", value),
        }),
    }
}
