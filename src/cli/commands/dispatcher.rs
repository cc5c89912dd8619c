//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::PathBuf;

use crate::cli::args::{Cli, Commands};
use crate::error::{Result, EXIT_SUCCESS};
use crate::shell::CancellationToken;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Process exit code.
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    recipes: PathBuf,
    cancel: CancellationToken,
}

impl CommandDispatcher {
    /// Create a dispatcher reading recipes from `recipes`.
    pub fn new(recipes: PathBuf, cancel: CancellationToken) -> Self {
        Self { recipes, cancel }
    }

    /// Route the subcommand to its implementation and run it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Build(args) => {
                let cmd = super::build::BuildCommand::new(&self.recipes, args.clone(), self.cancel.clone());
                cmd.execute(ui)
            }
            Commands::Plan(args) => {
                let cmd = super::plan::PlanCommand::new(&self.recipes, args.clone());
                cmd.execute(ui)
            }
            Commands::Info(args) => {
                let cmd = super::info::InfoCommand::new(&self.recipes, args.clone());
                cmd.execute(ui)
            }
            Commands::Schema => super::schema::SchemaCommand.execute(ui),
            Commands::Completions(args) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
        }
    }
}
