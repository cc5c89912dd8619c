//! Build pipeline orchestration.
//!
//! Stages run strictly in order: options, dependency resolution,
//! environment compilation, argument assembly, process driving, caveats.
//! Everything up to assembly is pure; the first error stops the pipeline
//! before any subprocess is spawned.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::assemble::{ArgumentAssembler, AssembledCommands};
use crate::caveats::{ArtifactProbe, CaveatEmitter};
use crate::environment::{BuildEnvironment, EnvironmentCompiler};
use crate::error::Result;
use crate::options::BuildSelection;
use crate::recipe::{Recipe, RecipeCatalog};
use crate::requirements::HostFacts;
use crate::resolver::{DependencyResolver, InstallPathCache, InstallPlan};
use crate::shell::{CancellationToken, CommandRunner, DriveReport, ProcessDriver};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Options,
    Resolve,
    Compile,
    Assemble,
    Drive,
    Caveats,
}

impl BuildStage {
    pub fn label(&self) -> &'static str {
        match self {
            BuildStage::Options => "Resolving options",
            BuildStage::Resolve => "Resolving dependencies",
            BuildStage::Compile => "Compiling build environment",
            BuildStage::Assemble => "Assembling arguments",
            BuildStage::Drive => "Building",
            BuildStage::Caveats => "Checking caveats",
        }
    }
}

/// Options for running a build.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Directory holding the unpacked source tree.
    pub workdir: PathBuf,
    /// Per-step wall-clock limit.
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

/// Everything computed before the first subprocess runs.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedBuild {
    pub recipe: String,
    pub selection: BuildSelection,
    pub plan: InstallPlan,
    pub environment: BuildEnvironment,
    pub commands: AssembledCommands,
}

/// Result of a completed build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub recipe: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub plan: Vec<String>,
    pub drive: DriveReport,
    pub caveats: Vec<String>,
}

impl BuildReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs recipes through every stage.
pub struct BuildPipeline<'a> {
    catalog: &'a RecipeCatalog,
    host: &'a dyn HostFacts,
    cache: InstallPathCache,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(catalog: &'a RecipeCatalog, host: &'a dyn HostFacts) -> Self {
        Self {
            catalog,
            host,
            cache: InstallPathCache::new(),
        }
    }

    /// Run every stage up to assembly. Spawns nothing.
    pub fn plan<S: AsRef<str>>(&self, recipe: &Recipe, args: &[S]) -> Result<PlannedBuild> {
        self.plan_with_progress(recipe, args, |_| {})
    }

    fn plan_with_progress<S: AsRef<str>>(
        &self,
        recipe: &Recipe,
        args: &[S],
        mut on_stage: impl FnMut(BuildStage),
    ) -> Result<PlannedBuild> {
        let start = Instant::now();

        on_stage(BuildStage::Options);
        let selection = recipe.options().resolve(args)?;
        info!("{}: resolved {} option(s)", recipe.name(), selection.len());

        on_stage(BuildStage::Resolve);
        let plan = DependencyResolver::new(self.catalog).resolve(&selection, recipe, self.host)?;
        info!("{}: install plan {}", recipe.name(), plan.names().join(", "));

        on_stage(BuildStage::Compile);
        let environment =
            EnvironmentCompiler::new(recipe, &self.cache).compile(&selection, &plan, self.host)?;
        info!(
            "{}: toolchain {} ({} exclusion(s){})",
            recipe.name(),
            environment.toolchain.compiler,
            environment.exclusions.len(),
            if environment.multi_arch { ", multi-arch" } else { "" }
        );
        debug!("environment variables: {:?}", environment.vars);

        on_stage(BuildStage::Assemble);
        let commands = ArgumentAssembler::new(recipe).assemble(&environment)?;
        debug!("planned in {:?}", start.elapsed());

        Ok(PlannedBuild {
            recipe: recipe.name().to_string(),
            selection,
            plan,
            environment,
            commands,
        })
    }

    /// Run the whole pipeline.
    pub fn build<S: AsRef<str>>(
        &self,
        recipe: &Recipe,
        args: &[S],
        runner: &dyn CommandRunner,
        probe: &dyn ArtifactProbe,
        options: &PipelineOptions,
    ) -> Result<BuildReport> {
        self.build_with_progress(recipe, args, runner, probe, options, |_| {})
    }

    /// Run the whole pipeline, reporting each stage as it starts.
    pub fn build_with_progress<S: AsRef<str>>(
        &self,
        recipe: &Recipe,
        args: &[S],
        runner: &dyn CommandRunner,
        probe: &dyn ArtifactProbe,
        options: &PipelineOptions,
        mut on_stage: impl FnMut(BuildStage),
    ) -> Result<BuildReport> {
        let started_at = Utc::now();
        let planned = self.plan_with_progress(recipe, args, &mut on_stage)?;

        on_stage(BuildStage::Drive);
        let workdir = source_dir(&options.workdir, recipe);
        info!("{}: building in {}", recipe.name(), workdir.display());
        let drive = ProcessDriver::new(runner, workdir)
            .timeout(options.timeout)
            .cancellation(options.cancel.clone())
            .drive(&planned.commands, &planned.environment)?;

        on_stage(BuildStage::Caveats);
        let caveats = CaveatEmitter::new(recipe.caveats()).emit(&planned.environment, probe);
        for caveat in &caveats {
            info!("caveat: {}", caveat);
        }

        Ok(BuildReport {
            recipe: planned.recipe,
            started_at,
            finished_at: Utc::now(),
            plan: planned.plan.names().iter().map(|n| n.to_string()).collect(),
            drive,
            caveats,
        })
    }
}

fn source_dir(workdir: &Path, recipe: &Recipe) -> PathBuf {
    match recipe.source_dir() {
        Some(dir) => workdir.join(dir),
        None => workdir.to_path_buf(),
    }
}
