//! The `kiln plan` command.
//!
//! Runs option resolution, dependency resolution, environment compilation
//! and argument assembly, then prints the result. Nothing is spawned and
//! no file is touched.

use std::path::{Path, PathBuf};

use crate::cli::args::PlanArgs;
use crate::config::{find_recipe, load_catalog};
use crate::error::Result;
use crate::runner::{BuildPipeline, PlannedBuild};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct PlanCommand {
    recipes: PathBuf,
    args: PlanArgs,
}

impl PlanCommand {
    pub fn new(recipes: &Path, args: PlanArgs) -> Self {
        Self {
            recipes: recipes.to_path_buf(),
            args,
        }
    }

    fn planned(&self) -> Result<PlannedBuild> {
        let catalog = load_catalog(&self.recipes)?;
        let recipe = find_recipe(&catalog, &self.args.recipe)?;
        let host = self.args.settings().host()?;
        BuildPipeline::new(&catalog, host.as_ref()).plan(recipe, &self.args.options)
    }
}

impl Command for PlanCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let planned = self.planned()?;
        if self.args.json {
            let json = serde_json::to_string_pretty(&planned).map_err(anyhow::Error::from)?;
            println!("{}", json);
        } else {
            show_plan(&planned, ui);
        }
        Ok(CommandResult::success())
    }
}

/// Write a human-readable plan.
pub fn show_plan(planned: &PlannedBuild, ui: &mut dyn UserInterface) {
    let env = &planned.environment;
    ui.show_header(&format!("Plan for {}", planned.recipe));

    let options: Vec<String> = planned
        .selection
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    if !options.is_empty() {
        ui.show_entry("options", &options.join(" "));
    }
    ui.show_entry("install order", &planned.plan.names().join(", "));
    ui.show_entry(
        "toolchain",
        &format!("{} ({} / {})", env.toolchain.compiler, env.toolchain.cc, env.toolchain.cxx),
    );
    if let Some(standard) = &env.toolchain.standard {
        ui.show_entry("standard", standard);
    }
    if !env.exclusions.is_empty() {
        ui.show_entry("excluded", &env.exclusions.join(", "));
    }
    if env.multi_arch {
        let archs: Vec<String> = env.archs.iter().map(|a| a.to_string()).collect();
        ui.show_entry("architectures", &archs.join(", "));
    }
    ui.show_entry("prefix", &env.prefix.display().to_string());

    let commands = &planned.commands;
    for patch in &commands.patches {
        ui.show_entry("patch", &patch.file.display().to_string());
    }
    for append in &commands.appends {
        ui.show_entry("append", &append.file.display().to_string());
    }
    if let Some(configure) = &commands.configure {
        ui.show_entry("configure", &configure.to_string());
    }
    ui.show_entry("build", &commands.build.to_string());
    ui.show_entry("fingerprint", &commands.build.args.fingerprint());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::EngineArgs;
    use crate::error::KilnError;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    const ZLIB: &str = r#"
name: zlib
version: "1.2.8"
configure:
  program: ./configure
  prefix_flag: "--install-root={prefix}"
build:
  program: make
  args: [install]
"#;

    const PNG: &str = r#"
name: libpng
version: "1.6.10"
dependencies:
  - name: zlib
build:
  program: make
  args:
    - install
    - when: { planned: zlib }
      then: ["ZLIB={opt:zlib}"]
"#;

    fn setup() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("recipes")).unwrap();
        fs::write(temp.path().join("recipes/zlib.yml"), ZLIB).unwrap();
        fs::write(temp.path().join("recipes/libpng.yml"), PNG).unwrap();
        fs::write(temp.path().join("host.yml"), "prefix: /opt/kiln\nmake_jobs: 4\n").unwrap();
        temp
    }

    fn args(temp: &TempDir, recipe: &str) -> PlanArgs {
        PlanArgs {
            engine: EngineArgs {
                host_facts: Some(temp.path().join("host.yml")),
                ..Default::default()
            },
            json: false,
            recipe: recipe.to_string(),
            options: Vec::new(),
        }
    }

    #[test]
    fn shows_dependencies_before_root() {
        let temp = setup();
        let cmd = PlanCommand::new(&temp.path().join("recipes"), args(&temp, "libpng"));
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert_eq!(ui.entry("install order"), Some("zlib, libpng"));
        assert_eq!(
            ui.entry("build"),
            Some("make --prefix=/opt/kiln --libdir=/opt/kiln/lib install ZLIB=/opt/kiln/opt/zlib")
        );
        assert_eq!(ui.entry("configure"), None);
    }

    #[test]
    fn configure_step_uses_its_prefix_flag() {
        let temp = setup();
        let cmd = PlanCommand::new(&temp.path().join("recipes"), args(&temp, "zlib"));
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert_eq!(
            ui.entry("configure"),
            Some("./configure --install-root=/opt/kiln --libdir=/opt/kiln/lib")
        );
    }

    #[test]
    fn unknown_option_is_rejected() {
        let temp = setup();
        let mut plan_args = args(&temp, "zlib");
        plan_args.options = vec!["--universal".to_string()];

        let err = PlanCommand::new(&temp.path().join("recipes"), plan_args)
            .execute(&mut MockUI::new())
            .unwrap_err();
        assert!(matches!(err, KilnError::UnknownOption { .. }));
    }
}
