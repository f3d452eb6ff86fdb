//! Terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Renderings go to stdout; messages go to stderr.
pub(crate) struct Output {
    out: Term,
    err: Term,
    red: Style,
    yellow: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            red: Style::new().red(),
            yellow: Style::new().yellow(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Write extracted text to stdout.
    pub(crate) fn text(&self, text: &str) -> std::io::Result<()> {
        self.out.write_line(text)
    }

    /// Write a section heading to stdout (cyan bold on a terminal).
    pub(crate) fn section(&self, title: &str) -> std::io::Result<()> {
        self.out
            .write_line(&self.cyan_bold.apply_to(format!("== {title} ==")).to_string())
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.err.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err.write_line(&self.red.apply_to(msg).to_string());
    }
}
