//! Structured diagnostics.

use std::fmt;

use rill_ir::Span;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labeled span within the diagnosed source.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
        }
    }
}

/// A structured diagnostic: code, headline, labeled spans, help lines.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub labels: Vec<Label>,
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Start an error diagnostic with the code's standard summary.
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            message: code.summary().to_string(),
            labels: Vec::new(),
            help: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(span, message));
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Plain one-expression rendering: headline, a caret line under the
    /// primary span, then help lines. Hosts wanting richer output render
    /// from the structured fields themselves.
    pub fn render(&self, source: &str) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "{}[{}]: {}", self.severity, self.code, self.message);
        if let Some(primary) = self.labels.first() {
            let _ = writeln!(out, "  {source}");
            let start = (primary.span.start as usize).min(source.len());
            let width = primary.span.len().max(1);
            let _ = writeln!(
                out,
                "  {}{} {}",
                " ".repeat(start),
                "^".repeat(width),
                primary.message
            );
        }
        for help in &self.help {
            let _ = writeln!(out, "help: {help}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_points_at_span() {
        let diag = Diagnostic::error(ErrorCode::P001)
            .with_message("expected `)`, found end of input")
            .with_label(Span::new(4, 5), "here")
            .with_help("close the parenthesis");
        let rendered = diag.render("(1+2");
        assert!(rendered.contains("error[P001]"));
        assert!(rendered.contains("(1+2"));
        assert!(rendered.contains("help: close the parenthesis"));
    }
}
