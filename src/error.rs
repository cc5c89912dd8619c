//! Error types for kiln operations.
//!
//! This module defines [`KilnError`], the primary error type used throughout
//! the engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every pipeline stage fails with a dedicated `KilnError` variant
//! - Nothing is retried; errors surface to the caller unrecovered
//! - Use `anyhow::Error` (via `KilnError::Other`) for unexpected errors
//! - All messages must be actionable without reading the recipe source

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a successful build.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failures outside the pipeline stages (I/O, recipe loading).
pub const EXIT_GENERAL: i32 = 1;
/// Exit code for option resolution failures.
pub const EXIT_OPTIONS: i32 = 2;
/// Exit code for dependency resolution failures.
pub const EXIT_DEPENDENCIES: i32 = 3;
/// Exit code for incompatible option combinations.
pub const EXIT_INCOMPATIBLE: i32 = 4;
/// Exit code for subprocess and patch failures.
pub const EXIT_SUBPROCESS: i32 = 5;
/// Exit code for cancelled builds.
pub const EXIT_CANCELLED: i32 = 6;

/// Core error type for kiln operations.
#[derive(Debug, Error)]
pub enum KilnError {
    /// An option key was registered twice.
    #[error("Option '{key}' is declared more than once")]
    DuplicateOption { key: String },

    /// A command-line flag does not match any declared option.
    #[error("Unknown option '{flag}'. Run 'kiln info <recipe>' to list the available options")]
    UnknownOption { flag: String },

    /// A flag uses a spelling that was renamed.
    #[error("Option '{old}' has been renamed to '--{new}'")]
    RenamedOption { old: String, new: String },

    /// A flag was given a value its option cannot take.
    #[error("Invalid value for option '{key}': {message}")]
    InvalidOptionValue { key: String, message: String },

    /// Two option values cannot be used together.
    #[error("Conflicting options: {message}")]
    ConflictingOption { message: String },

    /// An activated requirement predicate evaluated to false.
    #[error("Unsatisfied requirement '{name}':\n{message}")]
    UnsatisfiableRequirement { name: String, message: String },

    /// Dependency declarations form a cycle.
    #[error("Circular dependency detected: {cycle}")]
    CyclicDependency { cycle: String },

    /// A dependency edge points at a name the graph does not know.
    #[error("'{dependent}' depends on unknown dependency '{dependency}'")]
    UnknownDependency {
        dependent: String,
        dependency: String,
    },

    /// A combination of options is known to always fail.
    #[error("Incompatible option combination:\n{message}")]
    IncompatibleOptionCombination { message: String },

    /// No usable compiler is available for the recipe.
    #[error("No compatible compiler: {message}")]
    UnsupportedToolchain { message: String },

    /// A file substitution did not find its search string.
    #[error("Patch target not found in {}: expected to find {search:?}", file.display())]
    PatchTargetNotFound { file: PathBuf, search: String },

    /// The build was cancelled or timed out.
    #[error("Build cancelled during {step}: {reason}")]
    BuildCancelled { step: String, reason: String },

    /// An external build step exited unsuccessfully.
    #[error("{step} step failed with exit code {exit_code:?}: {command}")]
    SubprocessFailed {
        step: String,
        exit_code: Option<i32>,
        command: String,
    },

    /// An argument template references a value the environment lacks.
    #[error("Unresolved placeholder '{{{name}}}' in argument '{template}'")]
    UnresolvedPlaceholder { name: String, template: String },

    /// No recipe by that name or path.
    #[error("Recipe not found: {name}")]
    RecipeNotFound { name: String },

    /// A recipe file could not be parsed.
    #[error("Failed to parse recipe at {}: {message}", path.display())]
    RecipeParse { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KilnError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            KilnError::DuplicateOption { .. }
            | KilnError::UnknownOption { .. }
            | KilnError::RenamedOption { .. }
            | KilnError::InvalidOptionValue { .. }
            | KilnError::ConflictingOption { .. } => EXIT_OPTIONS,
            KilnError::UnsatisfiableRequirement { .. }
            | KilnError::CyclicDependency { .. }
            | KilnError::UnknownDependency { .. } => EXIT_DEPENDENCIES,
            KilnError::IncompatibleOptionCombination { .. }
            | KilnError::UnsupportedToolchain { .. } => EXIT_INCOMPATIBLE,
            KilnError::PatchTargetNotFound { .. } | KilnError::SubprocessFailed { .. } => {
                EXIT_SUBPROCESS
            }
            KilnError::BuildCancelled { .. } => EXIT_CANCELLED,
            KilnError::UnresolvedPlaceholder { .. }
            | KilnError::RecipeNotFound { .. }
            | KilnError::RecipeParse { .. }
            | KilnError::Io(_)
            | KilnError::Other(_) => EXIT_GENERAL,
        }
    }
}

/// Result type alias for kiln operations.
pub type Result<T> = std::result::Result<T, KilnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_option_displays_flag() {
        let err = KilnError::UnknownOption {
            flag: "--with-nonsense".into(),
        };
        assert!(err.to_string().contains("--with-nonsense"));
    }

    #[test]
    fn renamed_option_names_replacement() {
        let err = KilnError::RenamedOption {
            old: "--with-c++11".into(),
            new: "c++11".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("--with-c++11"));
        assert!(msg.contains("--c++11"));
    }

    #[test]
    fn unsatisfiable_requirement_displays_name_and_message() {
        let err = KilnError::UnsatisfiableRequirement {
            name: "universal-python".into(),
            message: "Python is not a universal build".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("universal-python"));
        assert!(msg.contains("not a universal build"));
    }

    #[test]
    fn cyclic_dependency_displays_cycle() {
        let err = KilnError::CyclicDependency {
            cycle: "a -> b -> a".into(),
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn patch_target_displays_file_and_search() {
        let err = KilnError::PatchTargetNotFound {
            file: PathBuf::from("tools/build.sh"),
            search: "CC=cc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tools/build.sh"));
        assert!(msg.contains("CC=cc"));
    }

    #[test]
    fn subprocess_failed_displays_step_code_and_command() {
        let err = KilnError::SubprocessFailed {
            step: "build".into(),
            exit_code: Some(2),
            command: "./b2 install".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("build"));
        assert!(msg.contains("2"));
        assert!(msg.contains("./b2 install"));
    }

    #[test]
    fn exit_codes_are_distinct_per_failure_class() {
        let codes = [
            KilnError::UnknownOption { flag: "x".into() }.exit_code(),
            KilnError::CyclicDependency { cycle: "x".into() }.exit_code(),
            KilnError::IncompatibleOptionCombination { message: "x".into() }.exit_code(),
            KilnError::SubprocessFailed {
                step: "x".into(),
                exit_code: Some(1),
                command: "x".into(),
            }
            .exit_code(),
            KilnError::BuildCancelled {
                step: "x".into(),
                reason: "x".into(),
            }
            .exit_code(),
        ];
        let mut unique = codes.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
        assert!(codes.iter().all(|c| *c != EXIT_SUCCESS));
    }

    #[test]
    fn unresolved_placeholder_shows_braces() {
        let err = KilnError::UnresolvedPlaceholder {
            name: "opt:icu4c".into(),
            template: "--with-icu={opt:icu4c}".into(),
        };
        assert!(err.to_string().contains("'{opt:icu4c}'"));
        assert_eq!(err.exit_code(), EXIT_GENERAL);
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: KilnError = io_err.into();
        assert!(matches!(err, KilnError::Io(_)));
        assert_eq!(err.exit_code(), EXIT_GENERAL);
    }
}
