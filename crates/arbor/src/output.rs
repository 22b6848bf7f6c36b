//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Command results go to stdout so they can be piped; everything else
/// (progress, headings, errors) goes to stderr.
pub(crate) struct Output {
    results: Term,
    status: Term,
    green: Style,
    red: Style,
    heading: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            results: Term::stdout(),
            status: Term::stderr(),
            green: Style::new().green(),
            red: Style::new().red(),
            heading: Style::new().cyan().bold(),
        }
    }

    fn status_line(&self, style: Option<&Style>, msg: &str) {
        let line = match style {
            Some(style) => style.apply_to(msg).to_string(),
            None => msg.to_owned(),
        };
        let _ = self.status.write_line(&line);
    }

    /// Print a command result line (stdout, unstyled).
    pub(crate) fn result(&self, line: &str) {
        let _ = self.results.write_line(line);
    }

    pub(crate) fn info(&self, msg: &str) {
        self.status_line(None, msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.status_line(Some(&self.green), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.status_line(Some(&self.red), msg);
    }

    /// Print a tree section heading.
    pub(crate) fn highlight(&self, msg: &str) {
        self.status_line(Some(&self.heading), msg);
    }
}
