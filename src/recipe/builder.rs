//! Recipe construction.
//!
//! A [`Recipe`] is assembled by ordered calls on a [`RecipeBuilder`] and is
//! immutable once built. Builder calls never fail on their own; the first
//! problem is reported by [`RecipeBuilder::build`].
//!
//! ```
//! use kiln::assemble::ArgumentTemplate;
//! use kiln::options::OptionSpec;
//! use kiln::recipe::{Predicate, Recipe};
//! use kiln::resolver::DependencySpec;
//!
//! let recipe = Recipe::builder("boost")
//!     .version("1.54.0")
//!     .universal()
//!     .option(OptionSpec::flag("icu", "Build regexp engine with icu support"))
//!     .depends_on(DependencySpec::recommended("python"))
//!     .depends_on(DependencySpec::required("icu4c").when(Predicate::enabled("icu")))
//!     .build_step(ArgumentTemplate::new("./b2").arg("install"))
//!     .build()
//!     .unwrap();
//!
//! assert!(recipe.options().contains("python"));
//! assert_eq!(recipe.dependencies().len(), 2);
//! ```

use std::path::{Path, PathBuf};

use crate::assemble::ArgumentTemplate;
use crate::caveats::CaveatRule;
use crate::environment::{CompilerFailure, ExclusionRule, IncompatibilityRule, StrictMode};
use crate::error::{KilnError, Result};
use crate::options::{BuildSelection, OptionConflict, OptionRegistry, OptionSpec};
use crate::requirements::RequirementSpec;
use crate::resolver::{DependencyLevel, DependencySpec};
use crate::shell::{AppendSpec, Patch};

/// Option key that turns on a multi-architecture build.
pub const MULTI_ARCH_OPTION: &str = "universal";

/// An immutable recipe.
#[derive(Debug, Clone)]
pub struct Recipe {
    name: String,
    version: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
    source_dir: Option<PathBuf>,
    options: OptionRegistry,
    dependencies: Vec<DependencySpec>,
    requirements: Vec<RequirementSpec>,
    compiler_failures: Vec<CompilerFailure>,
    strict_mode: Option<StrictMode>,
    exclusions: Vec<ExclusionRule>,
    incompatibilities: Vec<IncompatibilityRule>,
    configure: Option<ArgumentTemplate>,
    build: ArgumentTemplate,
    patches: Vec<Patch>,
    appends: Vec<AppendSpec>,
    caveats: Vec<CaveatRule>,
}

impl Recipe {
    /// Start building a recipe.
    pub fn builder(name: impl Into<String>) -> RecipeBuilder {
        RecipeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Directory the build steps run in, when the recipe names one.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    /// Dependencies in declaration order.
    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    /// Requirements on the recipe itself.
    pub fn requirements(&self) -> &[RequirementSpec] {
        &self.requirements
    }

    pub fn compiler_failures(&self) -> &[CompilerFailure] {
        &self.compiler_failures
    }

    pub fn strict_mode(&self) -> Option<&StrictMode> {
        self.strict_mode.as_ref()
    }

    pub fn exclusions(&self) -> &[ExclusionRule] {
        &self.exclusions
    }

    pub fn incompatibilities(&self) -> &[IncompatibilityRule] {
        &self.incompatibilities
    }

    /// Configuration step template, if the recipe has one.
    pub fn configure_step(&self) -> Option<&ArgumentTemplate> {
        self.configure.as_ref()
    }

    pub fn build_step(&self) -> &ArgumentTemplate {
        &self.build
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn appends(&self) -> &[AppendSpec] {
        &self.appends
    }

    pub fn caveats(&self) -> &[CaveatRule] {
        &self.caveats
    }

    /// Selection with every option at its default.
    pub fn default_selection(&self) -> Result<BuildSelection> {
        self.options.resolve::<&str>(&[])
    }
}

/// Builder for [`Recipe`].
#[derive(Debug)]
pub struct RecipeBuilder {
    name: String,
    version: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
    source_dir: Option<PathBuf>,
    options: OptionRegistry,
    conflicts: Vec<OptionConflict>,
    renames: Vec<(String, String)>,
    dependencies: Vec<DependencySpec>,
    requirements: Vec<RequirementSpec>,
    compiler_failures: Vec<CompilerFailure>,
    strict_mode: Option<StrictMode>,
    exclusions: Vec<ExclusionRule>,
    incompatibilities: Vec<IncompatibilityRule>,
    configure: Option<ArgumentTemplate>,
    build: Option<ArgumentTemplate>,
    patches: Vec<Patch>,
    appends: Vec<AppendSpec>,
    caveats: Vec<CaveatRule>,
    error: Option<KilnError>,
}

impl RecipeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            homepage: None,
            source_dir: None,
            options: OptionRegistry::new(),
            conflicts: Vec::new(),
            renames: Vec::new(),
            dependencies: Vec::new(),
            requirements: Vec::new(),
            compiler_failures: Vec::new(),
            strict_mode: None,
            exclusions: Vec::new(),
            incompatibilities: Vec::new(),
            configure: None,
            build: None,
            patches: Vec::new(),
            appends: Vec::new(),
            caveats: Vec::new(),
            error: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Declare an option.
    pub fn option(mut self, spec: OptionSpec) -> Self {
        if let Err(e) = self.options.register(spec) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Declare the multi-architecture option.
    pub fn universal(self) -> Self {
        self.option(OptionSpec::flag(MULTI_ARCH_OPTION, "Build a universal binary"))
    }

    /// Declare a conflict between option values. Checked at build time, so
    /// it may name options declared later, including implicit ones.
    pub fn conflict(mut self, conflict: OptionConflict) -> Self {
        self.conflicts.push(conflict);
        self
    }

    /// Reject the spelling `--<old>` with a pointer to `--<new>`.
    pub fn rename(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.renames.push((old.into(), new.into()));
        self
    }

    /// Declare a dependency.
    pub fn depends_on(mut self, dependency: DependencySpec) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Declare a requirement on the recipe itself.
    pub fn requires(mut self, requirement: RequirementSpec) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Declare a compiler the recipe does not build with.
    pub fn fails_with(mut self, failure: CompilerFailure) -> Self {
        self.compiler_failures.push(failure);
        self
    }

    pub fn strict_mode(mut self, mode: StrictMode) -> Self {
        self.strict_mode = Some(mode);
        self
    }

    pub fn exclude(mut self, rule: ExclusionRule) -> Self {
        self.exclusions.push(rule);
        self
    }

    pub fn incompatible(mut self, rule: IncompatibilityRule) -> Self {
        self.incompatibilities.push(rule);
        self
    }

    pub fn configure_step(mut self, template: ArgumentTemplate) -> Self {
        self.configure = Some(template);
        self
    }

    pub fn build_step(mut self, template: ArgumentTemplate) -> Self {
        self.build = Some(template);
        self
    }

    pub fn patch(mut self, patch: Patch) -> Self {
        self.patches.push(patch);
        self
    }

    pub fn append(mut self, append: AppendSpec) -> Self {
        self.appends.push(append);
        self
    }

    pub fn caveat(mut self, rule: CaveatRule) -> Self {
        self.caveats.push(rule);
        self
    }

    /// Finish the recipe.
    ///
    /// Recommended and optional dependencies get an option named after
    /// them unless one was declared explicitly. Fails with the first
    /// recorded declaration error, on conflicts naming unknown options, on
    /// a strict mode whose option is undeclared, and when no build step was
    /// given.
    pub fn build(mut self) -> Result<Recipe> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        for dep in &self.dependencies {
            if !dep.level.has_option() || self.options.contains(&dep.name) {
                continue;
            }
            let description = format!("Build with {} support", dep.name);
            let spec = match dep.level {
                DependencyLevel::Recommended => OptionSpec::flag_on(&dep.name, description),
                _ => OptionSpec::flag(&dep.name, description),
            };
            self.options.register(spec)?;
        }

        for conflict in self.conflicts {
            self.options.add_conflict(conflict)?;
        }
        for (old, new) in self.renames {
            self.options.rename(old, new);
        }

        if let Some(mode) = &self.strict_mode {
            if !self.options.contains(&mode.option) {
                return Err(KilnError::UnknownOption {
                    flag: format!("--{}", mode.option),
                });
            }
        }

        let build = self.build.ok_or_else(|| {
            KilnError::Other(anyhow::anyhow!("recipe '{}' has no build step", self.name))
        })?;

        Ok(Recipe {
            name: self.name,
            version: self.version,
            description: self.description,
            homepage: self.homepage,
            source_dir: self.source_dir,
            options: self.options,
            dependencies: self.dependencies,
            requirements: self.requirements,
            compiler_failures: self.compiler_failures,
            strict_mode: self.strict_mode,
            exclusions: self.exclusions,
            incompatibilities: self.incompatibilities,
            configure: self.configure,
            build,
            patches: self.patches,
            appends: self.appends,
            caveats: self.caveats,
        })
    }
}
