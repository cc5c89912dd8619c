//! Recipes.
//!
//! - [`builder`] - Immutable [`Recipe`] and its [`RecipeBuilder`]
//! - [`predicate`] - Conditions over selection, host and plan
//! - [`catalog`] - Recipes available for transitive resolution

pub mod builder;
pub mod catalog;
pub mod predicate;

pub use builder::{Recipe, RecipeBuilder, MULTI_ARCH_OPTION};
pub use catalog::RecipeCatalog;
pub use predicate::{Predicate, Scope};
