//! Argument assembly.
//!
//! Renders a recipe's step templates, patches and generated lines against
//! a [`BuildEnvironment`]. Assembly is deterministic: the same environment
//! always yields byte-identical argument vectors.
//!
//! - [`template`] - Template items
//! - [`placeholder`] - `{name}` expansion
//! - [`vector`] - Assembled vectors, fingerprints and display quoting

pub mod placeholder;
pub mod template;
pub mod vector;

pub use template::{ArgSpec, ArgumentTemplate, ToggleVariant};
pub use vector::{shell_quote, ArgumentVector, CommandLine};

use serde::Serialize;

use crate::environment::BuildEnvironment;
use crate::error::Result;
use crate::recipe::{Recipe, Scope};
use crate::shell::{FileAppend, Patch};

use placeholder::render;

/// Everything the process driver needs for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledCommands {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure: Option<CommandLine>,
    pub build: CommandLine,
    #[serde(skip)]
    pub patches: Vec<Patch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appends: Vec<FileAppend>,
}

/// Renders a recipe's templates.
pub struct ArgumentAssembler<'a> {
    recipe: &'a Recipe,
}

impl<'a> ArgumentAssembler<'a> {
    pub fn new(recipe: &'a Recipe) -> Self {
        Self { recipe }
    }

    /// Assemble the configure and build commands, patches and appends.
    pub fn assemble(&self, env: &BuildEnvironment) -> Result<AssembledCommands> {
        let configure = self
            .recipe
            .configure_step()
            .map(|t| assemble_command(t, env))
            .transpose()?;
        let build = assemble_command(self.recipe.build_step(), env)?;

        let patches = self
            .recipe
            .patches()
            .iter()
            .map(|p| {
                Ok(Patch {
                    file: p.file.clone(),
                    search: p.search.clone(),
                    replace: render(&p.replace, env)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let scope = env.scope();
        let mut appends = Vec::new();
        for spec in self.recipe.appends() {
            if spec.when.eval(&scope) {
                appends.push(FileAppend {
                    file: spec.file.clone(),
                    line: render(&spec.line, env)?,
                });
            }
        }

        if let Some(cmd) = &configure {
            tracing::debug!("configure: {}", cmd);
        }
        tracing::debug!("build: {}", build);

        Ok(AssembledCommands {
            configure,
            build,
            patches,
            appends,
        })
    }
}

/// Render one template into a command line.
pub fn assemble_command(template: &ArgumentTemplate, env: &BuildEnvironment) -> Result<CommandLine> {
    let mut args = vec![
        render(&template.prefix_flag, env)?,
        render(&template.libdir_flag, env)?,
    ];
    let scope = env.scope();
    push_items(&template.items, env, &scope, &mut args)?;
    Ok(CommandLine::new(template.program.clone(), ArgumentVector::new(args)))
}

fn push_items(
    items: &[ArgSpec],
    env: &BuildEnvironment,
    scope: &Scope<'_>,
    out: &mut Vec<String>,
) -> Result<()> {
    for item in items {
        match item {
            ArgSpec::Literal(arg) => out.push(render(arg, env)?),
            ArgSpec::Exclusions { flag, separator } => {
                if !env.exclusions.is_empty() {
                    out.push(format!("{}{}", render(flag, env)?, env.exclusions.join(separator)));
                }
            }
            ArgSpec::Toggle {
                flag,
                base,
                variants,
            } => {
                let values: Vec<&str> = base
                    .iter()
                    .map(String::as_str)
                    .chain(
                        variants
                            .iter()
                            .filter(|v| env.selection.enabled(&v.option))
                            .map(|v| v.value.as_str()),
                    )
                    .collect();
                if !values.is_empty() {
                    out.push(format!("{}{}", render(flag, env)?, values.join(",")));
                }
            }
            ArgSpec::When {
                condition,
                then,
                otherwise,
            } => {
                let branch = if condition.eval(scope) { then } else { otherwise };
                push_items(branch, env, scope, out)?;
            }
            ArgSpec::MultiArch(group) => {
                if env.multi_arch {
                    push_items(group, env, scope, out)?;
                }
            }
        }
    }
    Ok(())
}
