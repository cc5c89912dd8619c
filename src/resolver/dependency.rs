//! Dependency declarations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::recipe::{Predicate, Scope};
use crate::requirements::RequirementSpec;

/// How strongly a recipe wants a dependency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DependencyLevel {
    /// Used unless declined with `--without-<name>`.
    Recommended,
    /// Only used when requested with `--with-<name>`.
    Optional,
    /// Always used when its activation predicate holds.
    #[default]
    Required,
}

impl DependencyLevel {
    /// Whether the level is controlled by an implicit option.
    pub fn has_option(&self) -> bool {
        !matches!(self, DependencyLevel::Required)
    }

    /// Rank for merging duplicate declarations; higher wins.
    pub fn strength(&self) -> u8 {
        match self {
            DependencyLevel::Optional => 0,
            DependencyLevel::Recommended => 1,
            DependencyLevel::Required => 2,
        }
    }
}

impl fmt::Display for DependencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyLevel::Required => "required",
            DependencyLevel::Recommended => "recommended",
            DependencyLevel::Optional => "optional",
        };
        f.write_str(s)
    }
}

/// A dependency on another recipe.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// Target recipe name.
    pub name: String,
    /// Requirement level.
    pub level: DependencyLevel,
    /// Named build configuration of the dependency (an option enabled on
    /// the dependency's own recipe).
    pub variant: Option<String>,
    /// Activation predicate over the selection.
    pub when: Predicate,
    /// Requirements checked when the dependency is active.
    pub requirements: Vec<RequirementSpec>,
}

impl DependencySpec {
    fn with_level(name: impl Into<String>, level: DependencyLevel) -> Self {
        Self {
            name: name.into(),
            level,
            variant: None,
            when: Predicate::always(),
            requirements: Vec::new(),
        }
    }

    /// A dependency that is always used.
    pub fn required(name: impl Into<String>) -> Self {
        Self::with_level(name, DependencyLevel::Required)
    }

    /// A dependency used unless declined.
    pub fn recommended(name: impl Into<String>) -> Self {
        Self::with_level(name, DependencyLevel::Recommended)
    }

    /// A dependency used only on request.
    pub fn optional(name: impl Into<String>) -> Self {
        Self::with_level(name, DependencyLevel::Optional)
    }

    /// Request a variant of the dependency.
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Only activate when `when` holds.
    pub fn when(mut self, when: Predicate) -> Self {
        self.when = when;
        self
    }

    /// Attach a requirement.
    pub fn requires(mut self, requirement: RequirementSpec) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Whether the dependency is active under the scope.
    ///
    /// Recommended and optional dependencies also need their implicit
    /// option (named after the dependency) to be on.
    pub fn is_active(&self, scope: &Scope<'_>) -> bool {
        let level_on = !self.level.has_option() || scope.enabled(&self.name);
        level_on && self.when.eval(scope)
    }
}
