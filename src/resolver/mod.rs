//! Dependency resolution.
//!
//! - [`dependency`] - Dependency declarations and levels
//! - [`graph`] - Dependency graph with cycle detection and ordering
//! - [`plan`] - Install plans and the resolver
//! - [`cache`] - Memoized dependency install paths

pub mod cache;
pub mod dependency;
pub mod graph;
pub mod plan;

pub use cache::InstallPathCache;
pub use dependency::{DependencyLevel, DependencySpec};
pub use graph::{DependencyGraph, DependencyGraphBuilder};
pub use plan::{DependencyResolver, InstallPlan, PlanEntry};
