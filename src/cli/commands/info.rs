//! The `kiln info` command.

use std::path::{Path, PathBuf};

use crate::cli::args::InfoArgs;
use crate::config::{find_recipe, load_catalog};
use crate::error::Result;
use crate::options::{OptionKind, OptionSpec};
use crate::recipe::Recipe;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Shows a recipe's options, dependencies and requirements.
pub struct InfoCommand {
    recipes: PathBuf,
    args: InfoArgs,
}

impl InfoCommand {
    pub fn new(recipes: &Path, args: InfoArgs) -> Self {
        Self {
            recipes: recipes.to_path_buf(),
            args,
        }
    }
}

impl Command for InfoCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let catalog = load_catalog(&self.recipes)?;
        let recipe = find_recipe(&catalog, &self.args.recipe)?;
        show_recipe(recipe, ui);
        Ok(CommandResult::success())
    }
}

fn option_usage(spec: &OptionSpec) -> String {
    match spec.kind {
        OptionKind::Flag => spec.toggle_flag(),
        OptionKind::Valued => format!("--{}=<value> (default {})", spec.key, spec.default),
    }
}

/// Write a recipe summary.
pub fn show_recipe(recipe: &Recipe, ui: &mut dyn UserInterface) {
    let title = match recipe.version() {
        Some(version) => format!("{} {}", recipe.name(), version),
        None => recipe.name().to_string(),
    };
    ui.show_header(&title);
    if let Some(description) = recipe.description() {
        ui.message(description);
    }
    if let Some(homepage) = recipe.homepage() {
        ui.show_entry("homepage", homepage);
    }

    if !recipe.options().is_empty() {
        ui.show_header("Options");
        for spec in recipe.options().options() {
            ui.show_entry(&option_usage(spec), &spec.description);
        }
    }

    if !recipe.dependencies().is_empty() {
        ui.show_header("Dependencies");
        for dep in recipe.dependencies() {
            let mut detail = dep.level.to_string();
            if let Some(variant) = &dep.variant {
                detail.push_str(&format!(", with {}", variant));
            }
            ui.show_entry(&dep.name, &detail);
        }
    }

    if !recipe.requirements().is_empty() {
        ui.show_header("Requirements");
        for requirement in recipe.requirements() {
            ui.show_entry(&requirement.name, requirement.when.label());
        }
    }
}
