//! Visual theme and styling.

use console::Style;

/// Terminal styles.
#[derive(Debug, Clone)]
pub struct KilnTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Spinners and running elements.
    pub info: Style,
    pub dim: Style,
    pub highlight: Style,
    pub header: Style,
    /// Labels in key-value listings.
    pub key: Style,
    /// Post-install caveats.
    pub caveat: Style,
}

impl Default for KilnTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl KilnTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().yellow(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().yellow(),
            key: Style::new().bold(),
            caveat: Style::new().cyan(),
        }
    }

    /// A theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            key: Style::new(),
            caveat: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_caveat(&self, msg: &str) -> String {
        format!("{} {}", self.caveat.apply_to("==> Caveat:"), msg)
    }

    pub fn format_entry(&self, key: &str, value: &str) -> String {
        format!("  {} {}", self.key.apply_to(format!("{}:", key)), value)
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{} {}", self.header.apply_to("==>"), self.highlight.apply_to(title))
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    console::Term::stdout().is_term()
}
