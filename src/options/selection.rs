//! Resolved option values for one build.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::spec::OptionValue;

/// The resolved set of option values for one build invocation.
///
/// Every declared option has exactly one value. A selection is never
/// mutated after resolution; [`BuildSelection::with`] returns a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSelection {
    values: BTreeMap<String, OptionValue>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    explicit: BTreeSet<String>,
}

impl BuildSelection {
    /// Create a selection from resolved values and the keys the user set.
    pub fn new(values: BTreeMap<String, OptionValue>, explicit: BTreeSet<String>) -> Self {
        Self { values, explicit }
    }

    /// A copy with one value replaced (or added).
    pub fn with(&self, key: &str, value: impl Into<OptionValue>) -> Self {
        let mut next = self.clone();
        next.values.insert(key.to_string(), value.into());
        next.explicit.insert(key.to_string());
        next
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Whether a boolean option is on. Unknown keys are off.
    pub fn enabled(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(OptionValue::Bool(true)))
    }

    /// Text of a valued option.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(OptionValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether the user set the key explicitly.
    pub fn is_explicit(&self, key: &str) -> bool {
        self.explicit.contains(key)
    }

    /// All values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }

    /// Number of resolved options.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the selection is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BuildSelection {
        let mut values = BTreeMap::new();
        values.insert("universal".to_string(), OptionValue::Bool(true));
        values.insert("static".to_string(), OptionValue::Bool(false));
        values.insert("layout".to_string(), OptionValue::from("tagged"));
        BuildSelection::new(values, BTreeSet::from(["universal".to_string()]))
    }

    #[test]
    fn enabled_reads_booleans() {
        let sel = sample();
        assert!(sel.enabled("universal"));
        assert!(!sel.enabled("static"));
        assert!(!sel.enabled("layout"));
        assert!(!sel.enabled("missing"));
    }

    #[test]
    fn text_reads_valued_options() {
        let sel = sample();
        assert_eq!(sel.text("layout"), Some("tagged"));
        assert_eq!(sel.text("universal"), None);
    }

    #[test]
    fn with_returns_modified_copy() {
        let sel = sample();
        let next = sel.with("static", true);
        assert!(next.enabled("static"));
        assert!(next.is_explicit("static"));
        assert!(!sel.enabled("static"));
    }

    #[test]
    fn explicit_tracks_user_set_keys() {
        let sel = sample();
        assert!(sel.is_explicit("universal"));
        assert!(!sel.is_explicit("layout"));
        assert_eq!(sel.len(), 3);
    }
}
