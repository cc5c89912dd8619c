//! User-facing output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI, pipes and redirected output
//! - [`MockUI`] capturing everything for tests
//!
//! # Example
//!
//! ```
//! use kiln::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("boost 1.54.0");
//! ui.success("Installed");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use non_interactive::NonInteractiveUI;
pub use output::{format_duration, OutputMode};
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, is_ci, TerminalUI};
pub use theme::{should_use_colors, KilnTheme};

/// Trait for user interface interactions.
///
/// Commands write through this trait so tests can capture output.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Display a plain line.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Display an error. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Display a post-install caveat.
    fn caveat(&mut self, msg: &str);

    /// A `key: value` line in a listing.
    fn show_entry(&mut self, key: &str, value: &str);

    fn show_header(&mut self, title: &str);

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    fn set_message(&mut self, msg: &str);

    fn finish_success(&mut self, msg: &str);

    fn finish_error(&mut self, msg: &str);

    /// Remove the spinner without a final line.
    fn finish_clear(&mut self);
}
