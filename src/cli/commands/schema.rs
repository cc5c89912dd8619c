//! The `kiln schema` command.

use crate::config::recipe_schema;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Prints the recipe file JSON Schema to stdout.
pub struct SchemaCommand;

impl SchemaCommand {
    pub fn render(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&recipe_schema()).map_err(anyhow::Error::from)?)
    }
}

impl Command for SchemaCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", self.render()?);
        Ok(CommandResult::success())
    }
}
