//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed to by the
//! [`CommandDispatcher`]. Commands report through a
//! [`UserInterface`](crate::ui::UserInterface) so they can run against a
//! terminal, a CI log or a test double.

pub mod build;
pub mod completions;
pub mod dispatcher;
pub mod info;
pub mod plan;
pub mod schema;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
