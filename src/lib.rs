//! Kiln - build recipes from source.
//!
//! A recipe declares build options, dependencies, host requirements and
//! argument templates. Kiln turns a recipe plus the user's option flags into
//! exact configure and build command lines and runs them.
//!
//! # Modules
//!
//! - [`options`] - Option declarations and flag resolution
//! - [`recipe`] - Recipes, the recipe catalog and predicates
//! - [`requirements`] - Host facts and requirement checks
//! - [`resolver`] - Dependency resolution into an install plan
//! - [`environment`] - Toolchain selection, exclusions and the build environment
//! - [`assemble`] - Argument templates and assembled command lines
//! - [`shell`] - Patching, subprocess execution and cancellation
//! - [`caveats`] - Post-install notices
//! - [`runner`] - The end-to-end build pipeline
//! - [`config`] - YAML recipe files and engine settings
//! - [`cli`] - Command-line interface
//! - [`ui`] - Terminal output and spinners
//! - [`error`] - Error types and exit codes
//!
//! # Example
//!
//! ```
//! use kiln::assemble::ArgumentTemplate;
//! use kiln::options::OptionSpec;
//! use kiln::recipe::{Recipe, RecipeCatalog};
//! use kiln::requirements::StaticHostFacts;
//! use kiln::runner::BuildPipeline;
//!
//! let mut catalog = RecipeCatalog::new();
//! catalog.insert(
//!     Recipe::builder("zlib")
//!         .option(OptionSpec::flag("static", "Build static libraries"))
//!         .build_step(ArgumentTemplate::new("make").arg("install"))
//!         .build()?,
//! );
//! let recipe = catalog.get("zlib").unwrap();
//!
//! let host = StaticHostFacts::new().with_prefix("/opt/kiln");
//! let planned = BuildPipeline::new(&catalog, &host).plan(recipe, &["--static"])?;
//! assert_eq!(
//!     planned.commands.build.to_string(),
//!     "make --prefix=/opt/kiln --libdir=/opt/kiln/lib install"
//! );
//! # Ok::<(), kiln::KilnError>(())
//! ```

pub mod assemble;
pub mod caveats;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod options;
pub mod recipe;
pub mod requirements;
pub mod resolver;
pub mod runner;
pub mod shell;
pub mod ui;

pub use error::{KilnError, Result};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::assemble::ArgumentTemplate;
    use crate::environment::{BuildEnvironment, EnvironmentCompiler};
    use crate::recipe::{Recipe, RecipeCatalog};
    use crate::requirements::StaticHostFacts;
    use crate::resolver::{DependencyResolver, InstallPathCache};

    /// Environment of a dependency-free recipe on the default static host.
    pub fn environment() -> BuildEnvironment {
        let recipe = Recipe::builder("demo")
            .version("1.0")
            .build_step(ArgumentTemplate::new("make").arg("install"))
            .build()
            .unwrap();
        let host = StaticHostFacts::new();
        let selection = recipe.default_selection().unwrap();
        let plan = DependencyResolver::new(&RecipeCatalog::new())
            .resolve(&selection, &recipe, &host)
            .unwrap();
        EnvironmentCompiler::new(&recipe, &InstallPathCache::new())
            .compile(&selection, &plan, &host)
            .unwrap()
    }
}
