//! Build options.
//!
//! - [`spec`] - Option declarations and values
//! - [`selection`] - Resolved option values for one build
//! - [`registry`] - Registration, conflict rules and command-line resolution

pub mod registry;
pub mod selection;
pub mod spec;

pub use registry::{OptionConflict, OptionRegistry};
pub use selection::BuildSelection;
pub use spec::{OptionKind, OptionSpec, OptionValue};
