//! The `kiln build` command.

use std::path::{Path, PathBuf};

use crate::caveats::FsArtifactProbe;
use crate::cli::args::BuildArgs;
use crate::config::{find_recipe, load_catalog};
use crate::error::Result;
use crate::runner::{BuildPipeline, PipelineOptions};
use crate::shell::{CancellationToken, SystemRunner};
use crate::ui::{format_duration, SpinnerHandle, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// Builds and installs a recipe.
pub struct BuildCommand {
    recipes: PathBuf,
    args: BuildArgs,
    cancel: CancellationToken,
}

impl BuildCommand {
    pub fn new(recipes: &Path, args: BuildArgs, cancel: CancellationToken) -> Self {
        Self {
            recipes: recipes.to_path_buf(),
            args,
            cancel,
        }
    }
}

impl Command for BuildCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let catalog = load_catalog(&self.recipes)?;
        let recipe = find_recipe(&catalog, &self.args.recipe)?;
        let settings = self.args.settings();
        let host = settings.host()?;

        ui.show_header(&format!("Building {}", recipe.name()));

        let runner = SystemRunner::new().inherit_output(ui.output_mode().shows_command_output());
        let options = PipelineOptions {
            workdir: settings.workdir.clone(),
            timeout: settings.timeout,
            cancel: self.cancel.clone(),
        };
        let pipeline = BuildPipeline::new(&catalog, host.as_ref());

        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;
        let result = pipeline.build_with_progress(
            recipe,
            &self.args.options,
            &runner,
            &FsArtifactProbe,
            &options,
            |stage| {
                if let Some(mut previous) = spinner.take() {
                    previous.finish_clear();
                }
                spinner = Some(ui.start_spinner(stage.label()));
            },
        );

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                if let Some(mut current) = spinner.take() {
                    current.finish_error("Failed");
                }
                return Err(e);
            }
        };

        let elapsed = report.duration().to_std().unwrap_or_default();
        if let Some(mut current) = spinner.take() {
            current.finish_success(&format!("Built {}", report.recipe));
        }

        if report.plan.len() > 1 {
            ui.show_entry("dependencies", &report.plan[..report.plan.len() - 1].join(", "));
        }
        for step in &report.drive.steps {
            ui.show_entry(&step.step, &format_duration(step.duration));
        }
        ui.success(&format!("{} installed in {}", report.recipe, format_duration(elapsed)));
        for caveat in &report.caveats {
            ui.caveat(caveat);
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KilnError;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn setup(recipe: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("recipes")).unwrap();
        fs::write(temp.path().join("recipes/demo.yml"), recipe).unwrap();
        let prefix = temp.path().join("prefix");
        fs::write(
            temp.path().join("host.yml"),
            format!("os: linux\nprefix: {}\n", prefix.display()),
        )
        .unwrap();
        temp
    }

    fn args(temp: &TempDir, options: &[&str]) -> BuildArgs {
        BuildArgs {
            engine: crate::cli::args::EngineArgs {
                host_facts: Some(temp.path().join("host.yml")),
                ..Default::default()
            },
            timeout: None,
            workdir: temp.path().to_path_buf(),
            recipe: "demo".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn unknown_recipe_is_an_error() {
        let temp = setup("name: demo\nbuild:\n  program: \"true\"\n");
        let mut cmd_args = args(&temp, &[]);
        cmd_args.recipe = "nope".to_string();
        let cmd = BuildCommand::new(&temp.path().join("recipes"), cmd_args, CancellationToken::new());

        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert!(matches!(err, KilnError::RecipeNotFound { name } if name == "nope"));
    }

    #[test]
    fn unknown_option_fails_before_any_stage_spawns() {
        let temp = setup("name: demo\nbuild:\n  program: \"true\"\n");
        let cmd = BuildCommand::new(
            &temp.path().join("recipes"),
            args(&temp, &["--with-nothing"]),
            CancellationToken::new(),
        );
        let mut ui = MockUI::new();

        let err = cmd.execute(&mut ui).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_OPTIONS);
        assert_eq!(ui.spinner_results(), vec!["error: Failed"]);
    }

    #[cfg(unix)]
    #[test]
    fn successful_build_reports_caveats() {
        let temp = setup(
            r#"
name: demo
version: "1.0"
build:
  program: env
  prefix_flag: "PREFIX={prefix}"
  libdir_flag: "LIBDIR={libdir}"
  args: [sh, "-c", "touch built"]
caveats:
  - message: Python bindings were not built.
    missing_artifact: "python*"
"#,
        );
        let cmd = BuildCommand::new(&temp.path().join("recipes"), args(&temp, &[]), CancellationToken::new());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 0);
        assert!(temp.path().join("built").exists());
        assert_eq!(ui.spinners().last().map(String::as_str), Some("Checking caveats"));
        assert_eq!(ui.caveats(), ["Python bindings were not built."]);
        assert!(ui.successes()[0].starts_with("demo installed in"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_step_maps_to_subprocess_exit_code() {
        let temp = setup("name: demo\nbuild:\n  program: \"false\"\n");
        let cmd = BuildCommand::new(&temp.path().join("recipes"), args(&temp, &[]), CancellationToken::new());

        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_SUBPROCESS);
    }

    #[test]
    fn cancelled_build_runs_nothing() {
        let temp = setup("name: demo\nbuild:\n  program: sh\n  args: [\"-c\", \"touch built\"]\n");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let cmd = BuildCommand::new(&temp.path().join("recipes"), args(&temp, &[]), cancel);

        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CANCELLED);
        assert!(!temp.path().join("built").exists());
    }
}
