//! First-class predicates over build state.
//!
//! Activation conditions, requirement checks, exclusion rules and
//! incompatibility rules are all [`Predicate`]s: shareable closures
//! evaluated lazily against a [`Scope`]. A predicate built from a recipe
//! file and one written in Rust behave identically.

use std::fmt;
use std::sync::Arc;

use crate::options::BuildSelection;
use crate::requirements::{Compiler, HostFacts};
use crate::resolver::InstallPlan;

/// What a predicate can see.
///
/// Fields become available as the pipeline advances: dependency activation
/// only has the selection and host; environment compilation also has the
/// install plan and the chosen compiler.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub selection: &'a BuildSelection,
    pub host: &'a dyn HostFacts,
    pub plan: Option<&'a InstallPlan>,
    pub compiler: Option<Compiler>,
}

impl<'a> Scope<'a> {
    /// A scope with only the selection and host.
    pub fn new(selection: &'a BuildSelection, host: &'a dyn HostFacts) -> Self {
        Self {
            selection,
            host,
            plan: None,
            compiler: None,
        }
    }

    /// Add the install plan.
    pub fn with_plan(mut self, plan: &'a InstallPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Add the chosen compiler.
    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Whether a boolean option is on.
    pub fn enabled(&self, key: &str) -> bool {
        self.selection.enabled(key)
    }

    /// Whether a dependency made it into the plan. False before planning.
    pub fn planned(&self, name: &str) -> bool {
        self.plan.is_some_and(|p| p.contains(name))
    }

    /// The compiler in effect: the chosen one, else the host default.
    pub fn effective_compiler(&self) -> Compiler {
        self.compiler
            .unwrap_or_else(|| self.host.default_compiler())
    }
}

type PredicateFn = dyn Fn(&Scope<'_>) -> bool + Send + Sync;

/// A named, shareable boolean function of a [`Scope`].
#[derive(Clone)]
pub struct Predicate {
    label: String,
    f: Arc<PredicateFn>,
}

impl Predicate {
    /// Wrap a closure.
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Scope<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }

    /// Always true.
    pub fn always() -> Self {
        Self::new("always", |_| true)
    }

    /// Always false.
    pub fn never() -> Self {
        Self::new("never", |_| false)
    }

    /// True when the boolean option `key` is on.
    pub fn enabled(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(format!("with {}", key), move |s| s.enabled(&key))
    }

    /// True when the boolean option `key` is off.
    pub fn disabled(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(format!("without {}", key), move |s| !s.enabled(&key))
    }

    /// True when both predicates are.
    pub fn and(self, other: Predicate) -> Self {
        let label = format!("({} and {})", self.label, other.label);
        Self::new(label, move |s| self.eval(s) && other.eval(s))
    }

    /// True when either predicate is.
    pub fn or(self, other: Predicate) -> Self {
        let label = format!("({} or {})", self.label, other.label);
        Self::new(label, move |s| self.eval(s) || other.eval(s))
    }

    /// Logical negation.
    pub fn negate(self) -> Self {
        let label = format!("not {}", self.label);
        Self::new(label, move |s| !self.eval(s))
    }

    /// Evaluate against a scope.
    pub fn eval(&self, scope: &Scope<'_>) -> bool {
        (self.f)(scope)
    }

    /// Human-readable description.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.label)
    }
}
