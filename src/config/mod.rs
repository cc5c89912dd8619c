//! Recipe files and engine settings.
//!
//! - [`schema`] - YAML recipe file structure and conversion to [`Recipe`](crate::recipe::Recipe)
//! - [`condition`] - Data form of predicates
//! - [`loader`] - Loading recipe files into a catalog
//! - [`settings`] - Prefix, jobs, timeout and host facts for a run
//!
//! # Example
//!
//! ```
//! use kiln::config::parse_recipe;
//! use std::path::Path;
//!
//! let yaml = r#"
//! name: zlib
//! build:
//!   program: make
//!   args: [install]
//! "#;
//! let recipe = parse_recipe(yaml, Path::new("zlib.yml")).unwrap();
//! assert_eq!(recipe.name(), "zlib");
//! ```

pub mod condition;
pub mod loader;
pub mod schema;
pub mod settings;

pub use condition::Condition;
pub use loader::{find_recipe, load_catalog, load_recipe_file, parse_recipe, recipe_paths};
pub use schema::RecipeFile;
pub use settings::{Settings, DEFAULT_PREFIX};

/// JSON Schema of the recipe file format.
pub fn recipe_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(RecipeFile)).unwrap_or_default()
}
