//! Build environment compilation.
//!
//! Turns a resolved selection and install plan into the read-only
//! [`BuildEnvironment`] every later stage works from:
//!
//! 1. Toolchain selection (declared compiler failures, strict modes)
//! 2. Incompatibility rules, rejected before any subprocess runs
//! 3. Exclusion rules populating the [`ComponentExclusionSet`]
//! 4. Dependency prefixes, architecture flags and scoped variables

pub mod compiler;
pub mod exclusion;
pub mod toolchain;

pub use compiler::{BuildEnvironment, EnvironmentCompiler};
pub use exclusion::{ComponentExclusionSet, ExclusionRule, IncompatibilityRule};
pub use toolchain::{CompilerFailure, StrictMode, Toolchain};
