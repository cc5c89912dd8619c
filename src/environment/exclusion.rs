//! Component exclusion and incompatibility rules.

use serde::Serialize;

use crate::recipe::{Predicate, Scope};

/// Sub-components left out of the build.
///
/// Insertion ordered and deduplicated. There is no removal API: once a
/// component is excluded for a build it stays excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ComponentExclusionSet {
    components: Vec<String>,
}

impl ComponentExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a component. Returns false if it was already excluded.
    pub fn insert(&mut self, component: impl Into<String>) -> bool {
        let component = component.into();
        if self.contains(&component) {
            return false;
        }
        self.components.push(component);
        true
    }

    pub fn contains(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components joined with `separator`, in insertion order.
    pub fn join(&self, separator: &str) -> String {
        self.components.join(separator)
    }
}

impl<S: Into<String>> Extend<S> for ComponentExclusionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for component in iter {
            self.insert(component);
        }
    }
}

/// Excludes components when a condition holds.
#[derive(Debug, Clone)]
pub struct ExclusionRule {
    pub components: Vec<String>,
    pub when: Predicate,
    pub reason: String,
}

impl ExclusionRule {
    pub fn new(components: &[&str], when: Predicate, reason: impl Into<String>) -> Self {
        Self {
            components: components.iter().map(|c| c.to_string()).collect(),
            when,
            reason: reason.into(),
        }
    }

    /// Add this rule's components to `set` if it applies.
    pub fn apply(&self, scope: &Scope<'_>, set: &mut ComponentExclusionSet) -> bool {
        if !self.when.eval(scope) {
            return false;
        }
        tracing::debug!(
            "excluding {} ({})",
            self.components.join(", "),
            self.reason
        );
        set.extend(self.components.iter().cloned());
        true
    }
}

/// A combination known to always fail.
#[derive(Debug, Clone)]
pub struct IncompatibilityRule {
    pub when: Predicate,
    pub message: String,
}

impl IncompatibilityRule {
    pub fn new(when: Predicate, message: impl Into<String>) -> Self {
        Self {
            when,
            message: message.into(),
        }
    }
}
