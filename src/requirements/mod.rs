//! Requirements and host facts.
//!
//! This module describes what the engine needs to know about the host and
//! how recipes state preconditions on it.
//!
//! # Modules
//!
//! - [`host`] - The [`HostFacts`] trait, host snapshots and static hosts
//! - [`probe`] - Host facts probed from the running system
//! - [`spec`] - Requirement declarations and check results

pub mod host;
pub mod probe;
pub mod spec;

pub use host::{
    Arch, Compiler, CpuFamily, HostFacts, HostSnapshot, Os, StaticHostFacts, UNIVERSAL_ARCHS,
};
pub use probe::SystemHostFacts;
pub use spec::{RequirementSpec, RequirementStatus};
