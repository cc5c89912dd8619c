//! Mock UI implementation for testing.
//!
//! `MockUI` implements [`UserInterface`] and records every call for later
//! assertion.
//!
//! # Example
//!
//! ```
//! use kiln::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Resolving options");
//! ui.caveat("Boost.Python was not built");
//!
//! assert_eq!(ui.messages(), ["Resolving options"]);
//! assert_eq!(ui.caveats(), ["Boost.Python was not built"]);
//! ```

use std::sync::{Arc, Mutex};

use super::{OutputMode, SpinnerHandle, UserInterface};

/// Records all UI interactions.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    caveats: Vec<String>,
    entries: Vec<(String, String)>,
    headers: Vec<String>,
    spinners: Vec<String>,
    spinner_results: Arc<Mutex<Vec<String>>>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn caveats(&self) -> &[String] {
        &self.caveats
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Messages spinners were started with.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Final spinner states, as `success: <msg>` or `error: <msg>`.
    pub fn spinner_results(&self) -> Vec<String> {
        self.spinner_results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Value of the first entry with this key.
    pub fn entry(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn caveat(&mut self, msg: &str) {
        self.caveats.push(msg.to_string());
    }

    fn show_entry(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            results: Arc::clone(&self.spinner_results),
        })
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner handed out by [`MockUI`].
pub struct MockSpinner {
    results: Arc<Mutex<Vec<String>>>,
}

impl MockSpinner {
    fn record(&self, line: String) {
        if let Ok(mut results) = self.results.lock() {
            results.push(line);
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.record(format!("success: {}", msg));
    }

    fn finish_error(&mut self, msg: &str) {
        self.record(format!("error: {}", msg));
    }

    fn finish_clear(&mut self) {}
}
