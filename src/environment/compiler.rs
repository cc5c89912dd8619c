//! Build environment compilation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{KilnError, Result};
use crate::options::BuildSelection;
use crate::recipe::{Recipe, Scope, MULTI_ARCH_OPTION};
use crate::requirements::{Arch, Compiler, CpuFamily, HostFacts, HostSnapshot, Os, UNIVERSAL_ARCHS};
use crate::resolver::{InstallPathCache, InstallPlan};

use super::exclusion::ComponentExclusionSet;
use super::toolchain::Toolchain;

/// Everything the later stages need to know about one build.
///
/// Computed once per build and never mutated. Later stages evaluate
/// predicates through [`BuildEnvironment::scope`], which presents this
/// frozen view as the host: scalar facts come from the snapshot and
/// dependency locations from the resolved prefixes. Tool probes are not
/// part of the frozen view and report nothing.
#[derive(Debug, Clone, Serialize)]
pub struct BuildEnvironment {
    pub recipe: String,
    pub selection: BuildSelection,
    pub host: HostSnapshot,
    pub plan: InstallPlan,
    pub toolchain: Toolchain,
    /// Install prefix of each planned dependency.
    pub dependencies: BTreeMap<String, PathBuf>,
    pub exclusions: ComponentExclusionSet,
    pub multi_arch: bool,
    /// Architectures of a multi-architecture build; empty for a native one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub archs: Vec<Arch>,
    pub prefix: PathBuf,
    pub libdir: PathBuf,
    pub jobs: usize,
    /// Variables set on every build subprocess.
    pub vars: BTreeMap<String, String>,
}

impl BuildEnvironment {
    /// Predicate scope over the frozen environment.
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(&self.selection, self)
            .with_plan(&self.plan)
            .with_compiler(self.toolchain.compiler)
    }

    /// Install prefix of a planned dependency.
    pub fn dependency(&self, name: &str) -> Option<&Path> {
        self.dependencies.get(name).map(PathBuf::as_path)
    }
}

impl HostFacts for BuildEnvironment {
    fn os(&self) -> Os {
        self.host.os
    }

    fn cpu_family(&self) -> CpuFamily {
        self.host.cpu_family
    }

    fn word_width(&self) -> u8 {
        self.host.word_width
    }

    fn default_compiler(&self) -> Compiler {
        self.host.default_compiler
    }

    fn available_compilers(&self) -> Vec<Compiler> {
        self.host.available_compilers.clone()
    }

    fn prefix(&self) -> PathBuf {
        self.prefix.clone()
    }

    fn opt_root(&self) -> PathBuf {
        self.host.opt_root.clone()
    }

    fn make_jobs(&self) -> usize {
        self.jobs
    }

    fn dependency_prefix(&self, name: &str) -> Option<PathBuf> {
        self.dependencies.get(name).cloned()
    }

    fn tool_present(&self, _tool: &str) -> bool {
        false
    }

    fn tool_archs(&self, _tool: &str) -> Vec<Arch> {
        Vec::new()
    }
}

/// Turns a selection and plan into a [`BuildEnvironment`].
pub struct EnvironmentCompiler<'a> {
    recipe: &'a Recipe,
    cache: &'a InstallPathCache,
}

impl<'a> EnvironmentCompiler<'a> {
    pub fn new(recipe: &'a Recipe, cache: &'a InstallPathCache) -> Self {
        Self { recipe, cache }
    }

    /// Compile the environment.
    ///
    /// Picks the toolchain, rejects known-broken combinations, and
    /// populates the exclusion set. Performs no I/O beyond the memoized
    /// dependency path lookups.
    pub fn compile(
        &self,
        selection: &BuildSelection,
        plan: &InstallPlan,
        host: &dyn HostFacts,
    ) -> Result<BuildEnvironment> {
        let snapshot = HostSnapshot::capture(host);
        let toolchain = Toolchain::select(
            &snapshot,
            self.recipe.compiler_failures(),
            self.recipe.strict_mode(),
            selection,
        )?;

        let scope = Scope::new(selection, host)
            .with_plan(plan)
            .with_compiler(toolchain.compiler);

        if let Some(rule) = self
            .recipe
            .incompatibilities()
            .iter()
            .find(|rule| rule.when.eval(&scope))
        {
            return Err(KilnError::IncompatibleOptionCombination {
                message: rule.message.clone(),
            });
        }

        let mut exclusions = ComponentExclusionSet::new();
        for rule in self.recipe.exclusions() {
            rule.apply(&scope, &mut exclusions);
        }

        let multi_arch = selection.enabled(MULTI_ARCH_OPTION);
        let archs = if multi_arch {
            UNIVERSAL_ARCHS.to_vec()
        } else {
            Vec::new()
        };

        let dependencies = plan
            .dependencies()
            .map(|entry| {
                let path = self
                    .cache
                    .get_or_resolve(&entry.name, host)
                    .unwrap_or_else(|| snapshot.opt_root.join(&entry.name));
                (entry.name.clone(), path)
            })
            .collect();

        let prefix = snapshot.prefix.clone();
        let libdir = prefix.join("lib");
        let jobs = snapshot.make_jobs;
        let vars = scoped_vars(&toolchain, &archs, jobs);

        tracing::debug!(
            "environment for {}: compiler={} multi_arch={} exclusions=[{}]",
            self.recipe.name(),
            toolchain.compiler,
            multi_arch,
            exclusions.join(",")
        );

        Ok(BuildEnvironment {
            recipe: self.recipe.name().to_string(),
            selection: selection.clone(),
            host: snapshot,
            plan: plan.clone(),
            toolchain,
            dependencies,
            exclusions,
            multi_arch,
            archs,
            prefix,
            libdir,
            jobs,
            vars,
        })
    }
}

/// Compiler and flag variables for the build subprocesses.
fn scoped_vars(toolchain: &Toolchain, archs: &[Arch], jobs: usize) -> BTreeMap<String, String> {
    let arch_flags: Vec<String> = archs
        .iter()
        .flat_map(|a| ["-arch".to_string(), a.to_string()])
        .collect();

    let join = |extra: &[String]| -> String {
        arch_flags
            .iter()
            .chain(extra)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut vars = BTreeMap::new();
    vars.insert("CC".to_string(), toolchain.cc.clone());
    vars.insert("CXX".to_string(), toolchain.cxx.clone());
    vars.insert("MAKEFLAGS".to_string(), format!("-j{}", jobs));
    for (key, value) in [
        ("CFLAGS", arch_flags.join(" ")),
        ("CXXFLAGS", join(&toolchain.cxxflags)),
        ("LDFLAGS", join(&toolchain.ldflags)),
    ] {
        if !value.is_empty() {
            vars.insert(key.to_string(), value);
        }
    }
    vars
}
