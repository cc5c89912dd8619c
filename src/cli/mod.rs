//! Command-line interface for kiln.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{BuildArgs, Cli, Commands, CompletionsArgs, EngineArgs, InfoArgs, PlanArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
