//! Plain line-oriented UI for CI and redirected output.

use super::{OutputMode, SpinnerHandle, UserInterface};

/// UI without colors or redraws. Each spinner becomes one line.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        println!("✓ {}", msg);
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn caveat(&mut self, msg: &str) {
        println!("==> Caveat: {}", msg);
    }

    fn show_entry(&mut self, key: &str, value: &str) {
        println!("  {}: {}", key, value);
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("==> {}", title);
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("{}...", message);
        }
        Box::new(LineSpinner {
            quiet: !self.mode.shows_status(),
        })
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Prints only the final state.
struct LineSpinner {
    quiet: bool,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if !self.quiet {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn finish_clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Verbose);
        assert!(!ui.is_interactive());
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }

    #[test]
    fn spinner_lifecycle() {
        let mut ui = NonInteractiveUI::new(OutputMode::Quiet);
        let mut spinner = ui.start_spinner("Building");
        spinner.set_message("still building");
        spinner.finish_success("Built");
    }
}
