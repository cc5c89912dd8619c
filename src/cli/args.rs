//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Settings;

/// Kiln - build recipes from source.
#[derive(Debug, Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Recipe file or directory of recipe files
    #[arg(long, global = true, env = "KILN_RECIPES", default_value = "recipes")]
    pub recipes: PathBuf,

    /// Show subprocess output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build and install a recipe
    Build(BuildArgs),

    /// Show what a build would do without running anything
    Plan(PlanArgs),

    /// Show a recipe's options and dependencies
    Info(InfoArgs),

    /// Print the JSON Schema of the recipe file format
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Engine settings shared by `build` and `plan`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EngineArgs {
    /// Install prefix
    #[arg(long, env = "KILN_PREFIX")]
    pub prefix: Option<PathBuf>,

    /// Directory linking installed dependencies [default: <prefix>/opt]
    #[arg(long, env = "KILN_OPT_ROOT")]
    pub opt_root: Option<PathBuf>,

    /// Parallel jobs for the build tool
    #[arg(short, long, env = "KILN_JOBS")]
    pub jobs: Option<usize>,

    /// Host description file used instead of probing this machine
    #[arg(long, env = "KILN_HOST_FACTS")]
    pub host_facts: Option<PathBuf>,
}

/// Arguments for the `build` command.
///
/// Engine flags go before the recipe name; everything after it is passed
/// to the recipe's option registry.
#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Kill a step that runs longer than this many seconds
    #[arg(long, env = "KILN_TIMEOUT", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Directory holding the source tree
    #[arg(short = 'C', long, default_value = ".")]
    pub workdir: PathBuf,

    /// Recipe name
    pub recipe: String,

    /// Recipe options (`--universal`, `--with-icu`, `--layout=tagged`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub options: Vec<String>,
}

impl BuildArgs {
    pub fn settings(&self) -> Settings {
        Settings {
            prefix: self.engine.prefix.clone(),
            opt_root: self.engine.opt_root.clone(),
            jobs: self.engine.jobs,
            timeout: self.timeout.map(Duration::from_secs),
            host_facts: self.engine.host_facts.clone(),
            workdir: self.workdir.clone(),
        }
    }
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Recipe name
    pub recipe: String,

    /// Recipe options
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub options: Vec<String>,
}

impl PlanArgs {
    pub fn settings(&self) -> Settings {
        Settings {
            prefix: self.engine.prefix.clone(),
            opt_root: self.engine.opt_root.clone(),
            jobs: self.engine.jobs,
            host_facts: self.engine.host_facts.clone(),
            ..Default::default()
        }
    }
}

/// Arguments for the `info` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InfoArgs {
    /// Recipe name
    pub recipe: String,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_passes_recipe_options_through() {
        let cli = Cli::try_parse_from([
            "kiln",
            "build",
            "--prefix",
            "/opt/boost",
            "boost",
            "--universal",
            "--without-single",
            "--layout=tagged",
        ])
        .unwrap();

        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.recipe, "boost");
                assert_eq!(
                    args.options,
                    vec!["--universal", "--without-single", "--layout=tagged"]
                );
                assert_eq!(args.settings().prefix, Some(PathBuf::from("/opt/boost")));
            }
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn plan_json_flag() {
        let cli = Cli::try_parse_from(["kiln", "plan", "--json", "boost"]).unwrap();
        assert!(matches!(cli.command, Commands::Plan(PlanArgs { json: true, .. })));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["kiln", "info", "boost", "--debug"]).unwrap();
        assert!(cli.debug);
    }

    #[test]
    fn timeout_becomes_duration() {
        let cli = Cli::try_parse_from(["kiln", "build", "--timeout", "30", "boost"]).unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.settings().timeout, Some(Duration::from_secs(30)))
            }
            other => panic!("expected build, got {other:?}"),
        }
    }
}
