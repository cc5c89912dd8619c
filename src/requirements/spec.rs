//! Requirement declarations.
//!
//! A requirement is a named predicate over host facts with a failure
//! message that explains what the user must change. Requirements are
//! attached to dependencies or to the recipe itself, and each has its own
//! activation predicate so it is only checked when relevant (a universal
//! interpreter is only required for universal builds).

use crate::recipe::{Predicate, Scope};

/// The result of checking one requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementStatus {
    /// The predicate held.
    Satisfied,

    /// The activation predicate was false; nothing was checked.
    Inactive,

    /// The predicate was false.
    Unsatisfied {
        /// Explanation for the user.
        message: String,
    },
}

impl RequirementStatus {
    /// Whether the build may proceed past this requirement.
    pub fn can_proceed(&self) -> bool {
        matches!(
            self,
            RequirementStatus::Satisfied | RequirementStatus::Inactive
        )
    }
}

/// A named requirement.
#[derive(Debug, Clone)]
pub struct RequirementSpec {
    pub name: String,
    pub satisfied: Predicate,
    pub message: String,
    pub when: Predicate,
}

impl RequirementSpec {
    /// Create a requirement that is always active.
    pub fn new(name: impl Into<String>, satisfied: Predicate, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            satisfied,
            message: message.into(),
            when: Predicate::always(),
        }
    }

    /// Only check the requirement when `when` holds.
    pub fn when(mut self, when: Predicate) -> Self {
        self.when = when;
        self
    }

    /// The tool must be a universal (multi-architecture) binary.
    pub fn universal_tool(tool: &str) -> Self {
        let probe = tool.to_string();
        Self::new(
            format!("universal-{}", tool),
            Predicate::new(format!("{} is universal", tool), move |s| {
                s.host.tool_is_universal(&probe)
            }),
            format!(
                "A universal build was requested, but {tool} is not a universal build.\n\n\
                 The build compiles against the {tool} it finds in the path; if this\n\
                 {tool} is not a universal build then linking will likely fail."
            ),
        )
    }

    /// The tool must be on the search path.
    pub fn tool_present(tool: &str) -> Self {
        let probe = tool.to_string();
        Self::new(
            tool,
            Predicate::new(format!("{} is installed", tool), move |s| {
                s.host.tool_present(&probe)
            }),
            format!("{tool} was not found on PATH. Install {tool} and try again."),
        )
    }

    /// Evaluate the requirement.
    pub fn check(&self, scope: &Scope<'_>) -> RequirementStatus {
        if !self.when.eval(scope) {
            return RequirementStatus::Inactive;
        }
        if self.satisfied.eval(scope) {
            RequirementStatus::Satisfied
        } else {
            RequirementStatus::Unsatisfied {
                message: self.message.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{BuildSelection, OptionRegistry, OptionSpec};
    use crate::requirements::{Arch, StaticHostFacts};

    fn selection(args: &[&str]) -> BuildSelection {
        let mut reg = OptionRegistry::new();
        reg.register(OptionSpec::flag("universal", "")).unwrap();
        reg.resolve(args).unwrap()
    }

    #[test]
    fn satisfied_can_proceed() {
        assert!(RequirementStatus::Satisfied.can_proceed());
        assert!(RequirementStatus::Inactive.can_proceed());
        assert!(!RequirementStatus::Unsatisfied {
            message: "no".into()
        }
        .can_proceed());
    }

    #[test]
    fn universal_tool_fails_for_thin_binary() {
        let host = StaticHostFacts::new().with_tool("python", vec![Arch::X86_64]);
        let sel = selection(&["--universal"]);
        let req = RequirementSpec::universal_tool("python");

        match req.check(&Scope::new(&sel, &host)) {
            RequirementStatus::Unsatisfied { message } => {
                assert!(message.contains("python is not a universal build"));
            }
            other => panic!("expected Unsatisfied, got {other:?}"),
        }
    }

    #[test]
    fn universal_tool_passes_for_fat_binary() {
        let host = StaticHostFacts::new().with_tool("python", vec![Arch::I386, Arch::X86_64]);
        let sel = selection(&[]);
        let req = RequirementSpec::universal_tool("python");
        assert_eq!(
            req.check(&Scope::new(&sel, &host)),
            RequirementStatus::Satisfied
        );
    }

    #[test]
    fn inactive_requirement_is_not_checked() {
        let host = StaticHostFacts::new();
        let sel = selection(&[]);
        let req = RequirementSpec::universal_tool("python").when(Predicate::enabled("universal"));
        assert_eq!(
            req.check(&Scope::new(&sel, &host)),
            RequirementStatus::Inactive
        );
    }

    #[test]
    fn tool_present_reads_host() {
        let host = StaticHostFacts::new().with_tool("mpicc", vec![]);
        let sel = selection(&[]);
        let scope = Scope::new(&sel, &host);
        assert!(RequirementSpec::tool_present("mpicc").check(&scope).can_proceed());
        assert!(!RequirementSpec::tool_present("python").check(&scope).can_proceed());
    }
}
