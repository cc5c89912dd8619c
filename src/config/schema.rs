//! Recipe file schema.
//!
//! These structs map one-to-one onto the YAML recipe format and convert
//! into a [`Recipe`] through the same [`RecipeBuilder`] the Rust API uses,
//! so both surfaces are validated identically.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::assemble::{ArgSpec, ArgumentTemplate, ToggleVariant};
use crate::caveats::CaveatRule;
use crate::environment::{CompilerFailure, ExclusionRule, IncompatibilityRule, StrictMode};
use crate::error::Result;
use crate::options::{OptionConflict, OptionSpec, OptionValue};
use crate::recipe::{Recipe, RecipeBuilder};
use crate::requirements::{Compiler, RequirementSpec};
use crate::resolver::{DependencyLevel, DependencySpec};
use crate::shell::{AppendSpec, Patch};

use super::condition::Condition;

/// Root of a recipe file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RecipeFile {
    /// Recipe name, unique within a catalog.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Source tree directory, relative to the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    /// Declare the `universal` multi-architecture option.
    #[serde(default)]
    pub universal: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionFile>,

    /// Old option spellings mapped to their replacement key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renamed: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<RequirementFile>,

    /// Compilers the recipe is known not to build with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fails_with: Vec<CompilerFailureFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<StrictModeFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<ExclusionFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incompatible: Vec<IncompatibleFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configure: Option<TemplateFile>,

    pub build: TemplateFile,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<PatchFile>,

    /// Lines appended to generated configuration files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<AppendFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caveats: Vec<CaveatFile>,
}

/// A declared option.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OptionFile {
    pub key: String,

    #[serde(default)]
    pub description: String,

    /// `true`/`false` for a flag (default `false`), a string for a valued
    /// option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<OptionValue>,
}

impl OptionFile {
    fn to_spec(&self) -> OptionSpec {
        match &self.default {
            Some(OptionValue::Text(value)) => {
                OptionSpec::valued(&self.key, value.clone(), &self.description)
            }
            Some(OptionValue::Bool(true)) => OptionSpec::flag_on(&self.key, &self.description),
            _ => OptionSpec::flag(&self.key, &self.description),
        }
    }
}

/// Option values that must not occur together.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConflictFile {
    pub when: BTreeMap<String, OptionValue>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DependencyFile {
    pub name: String,

    #[serde(default)]
    pub level: DependencyLevel,

    /// Option enabled on the dependency's own recipe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    #[serde(default)]
    pub when: Condition,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequirementFile>,
}

impl DependencyFile {
    fn to_spec(&self) -> DependencySpec {
        let mut spec = match self.level {
            DependencyLevel::Required => DependencySpec::required(&self.name),
            DependencyLevel::Recommended => DependencySpec::recommended(&self.name),
            DependencyLevel::Optional => DependencySpec::optional(&self.name),
        }
        .when(self.when.to_predicate());
        if let Some(variant) = &self.variant {
            spec = spec.variant(variant.clone());
        }
        for requirement in &self.requires {
            spec = spec.requires(requirement.to_spec());
        }
        spec
    }
}

/// What a requirement checks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    /// The tool's binary must hold every universal architecture.
    UniversalTool(String),
    /// The tool must be on the search path.
    ToolPresent(String),
    /// An arbitrary condition with its own failure message.
    Custom {
        name: String,
        satisfied: Condition,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RequirementFile {
    #[serde(flatten)]
    pub kind: RequirementKind,

    #[serde(default)]
    pub when: Condition,
}

impl RequirementFile {
    fn to_spec(&self) -> RequirementSpec {
        let spec = match &self.kind {
            RequirementKind::UniversalTool(tool) => RequirementSpec::universal_tool(tool),
            RequirementKind::ToolPresent(tool) => RequirementSpec::tool_present(tool),
            RequirementKind::Custom {
                name,
                satisfied,
                message,
            } => RequirementSpec::new(name, satisfied.to_predicate(), message),
        };
        spec.when(self.when.to_predicate())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CompilerFailureFile {
    pub compiler: Compiler,
    pub cause: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StrictModeFile {
    /// Option key that turns the mode on.
    pub option: String,
    /// Language standard, e.g. `c++11`.
    pub standard: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compilers: Vec<Compiler>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clang_cxxflags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExclusionFile {
    pub components: Vec<String>,
    #[serde(default)]
    pub when: Condition,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct IncompatibleFile {
    pub when: Condition,
    pub message: String,
}

/// A build step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TemplateFile {
    pub program: String,

    /// Overrides `--prefix={prefix}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_flag: Option<String>,

    /// Overrides `--libdir={libdir}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libdir_flag: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgFile>,
}

impl TemplateFile {
    fn to_template(&self) -> ArgumentTemplate {
        let mut template = ArgumentTemplate::new(&self.program);
        if let Some(flag) = &self.prefix_flag {
            template = template.prefix_flag(flag.clone());
        }
        if let Some(flag) = &self.libdir_flag {
            template = template.libdir_flag(flag.clone());
        }
        for arg in &self.args {
            template = template.item(arg.to_spec());
        }
        template
    }
}

fn default_separator() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ToggleVariantFile {
    pub option: String,
    pub value: String,
}

/// The excluded components as one token: `exclusions` + joined names.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExclusionsArg {
    pub exclusions: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

/// Base values plus enabled variants as one token.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ToggleArg {
    pub toggle: String,
    #[serde(default)]
    pub base: Vec<String>,
    #[serde(default)]
    pub variants: Vec<ToggleVariantFile>,
}

/// Items emitted only when the condition holds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WhenArg {
    pub when: Condition,
    #[serde(default)]
    pub then: Vec<ArgFile>,
    #[serde(default, rename = "else")]
    pub otherwise: Vec<ArgFile>,
}

/// Items emitted only for multi-architecture builds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MultiArchArg {
    pub multi_arch: Vec<ArgFile>,
}

/// One argument item.
///
/// Each map form rejects keys it does not know, so a misspelled `then:` or
/// `variants:` fails to load instead of producing an empty branch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ArgFile {
    /// A literal argument; may hold placeholders.
    Literal(String),
    Exclusions(ExclusionsArg),
    Toggle(ToggleArg),
    When(WhenArg),
    MultiArch(MultiArchArg),
}

impl ArgFile {
    fn to_spec(&self) -> ArgSpec {
        match self {
            ArgFile::Literal(arg) => ArgSpec::Literal(arg.clone()),
            ArgFile::Exclusions(arg) => ArgSpec::Exclusions {
                flag: arg.exclusions.clone(),
                separator: arg.separator.clone(),
            },
            ArgFile::Toggle(arg) => ArgSpec::Toggle {
                flag: arg.toggle.clone(),
                base: arg.base.clone(),
                variants: arg
                    .variants
                    .iter()
                    .map(|v| ToggleVariant {
                        option: v.option.clone(),
                        value: v.value.clone(),
                    })
                    .collect(),
            },
            ArgFile::When(arg) => ArgSpec::When {
                condition: arg.when.to_predicate(),
                then: arg.then.iter().map(ArgFile::to_spec).collect(),
                otherwise: arg.otherwise.iter().map(ArgFile::to_spec).collect(),
            },
            ArgFile::MultiArch(arg) => {
                ArgSpec::MultiArch(arg.multi_arch.iter().map(ArgFile::to_spec).collect())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PatchFile {
    pub file: PathBuf,
    pub search: String,
    pub replace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AppendFile {
    pub file: PathBuf,
    pub line: String,
    #[serde(default)]
    pub when: Condition,
}

/// A post-install advisory.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CaveatFile {
    pub message: String,

    /// Emit when nothing under the library directory matches this glob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_artifact: Option<String>,

    #[serde(default)]
    pub when: Condition,
}

impl CaveatFile {
    fn to_rule(&self) -> CaveatRule {
        let when = self.when.to_predicate();
        match &self.missing_artifact {
            Some(pattern) => CaveatRule::missing_artifact(pattern, &self.message).when(when),
            None => CaveatRule::condition(when, &self.message),
        }
    }
}

impl RecipeFile {
    /// Build the recipe.
    pub fn into_recipe(self) -> Result<Recipe> {
        let mut builder = RecipeBuilder::new(&self.name);
        if let Some(version) = self.version {
            builder = builder.version(version);
        }
        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        if let Some(homepage) = self.homepage {
            builder = builder.homepage(homepage);
        }
        if let Some(dir) = self.source_dir {
            builder = builder.source_dir(dir);
        }
        if self.universal {
            builder = builder.universal();
        }

        for option in &self.options {
            builder = builder.option(option.to_spec());
        }
        for (old, new) in self.renamed {
            builder = builder.rename(old, new);
        }
        for conflict in self.conflicts {
            builder = builder.conflict(OptionConflict::new(
                conflict.when.into_iter().collect(),
                conflict.message,
            ));
        }
        for dependency in &self.dependencies {
            builder = builder.depends_on(dependency.to_spec());
        }
        for requirement in &self.requirements {
            builder = builder.requires(requirement.to_spec());
        }
        for failure in self.fails_with {
            builder = builder.fails_with(CompilerFailure::new(failure.compiler, failure.cause));
        }
        if let Some(mode) = self.strict_mode {
            builder = builder.strict_mode(
                StrictMode::new(mode.option, mode.standard)
                    .compilers(mode.compilers)
                    .clang_cxxflags(mode.clang_cxxflags),
            );
        }
        for exclusion in &self.exclusions {
            let components: Vec<&str> = exclusion.components.iter().map(String::as_str).collect();
            builder = builder.exclude(ExclusionRule::new(
                &components,
                exclusion.when.to_predicate(),
                exclusion.reason.clone(),
            ));
        }
        for rule in &self.incompatible {
            builder = builder.incompatible(IncompatibilityRule::new(
                rule.when.to_predicate(),
                rule.message.clone(),
            ));
        }
        if let Some(configure) = &self.configure {
            builder = builder.configure_step(configure.to_template());
        }
        builder = builder.build_step(self.build.to_template());
        for patch in self.patches {
            builder = builder.patch(Patch::new(patch.file, patch.search, patch.replace));
        }
        for append in self.append {
            builder = builder.append(AppendSpec::new(append.file, append.line).when(append.when.to_predicate()));
        }
        for caveat in &self.caveats {
            builder = builder.caveat(caveat.to_rule());
        }

        builder.build()
    }
}
