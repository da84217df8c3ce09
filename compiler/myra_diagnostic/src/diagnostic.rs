//! Diagnostic records.

use crate::ErrorCode;
use myra_ir::Pos;
use std::fmt;

/// Severity level for diagnostics.
///
/// Warnings never abort; errors accumulate toward the bag's cap; a fatal
/// aborts the current compile immediately.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// A severity-tagged message with its source location and stable code.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported to the bag, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            file: String::new(),
            line: 0,
            column: 0,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    /// Create a new fatal diagnostic.
    pub fn fatal(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Fatal)
    }

    /// Set the main message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the source location.
    pub fn at(mut self, file: impl Into<String>, pos: Pos) -> Self {
        self.file = file.into();
        self.line = pos.line;
        self.column = pos.column;
        self
    }

    /// Check if this is an error or fatal (vs warning).
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Diagnostic {
    /// Rendered as `file(line,column): severity code: message` for IDE
    /// problem matchers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}): {} {}: {}",
            self.file, self.line, self.column, self.severity, self.code, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myra_ir::{Pos, Span};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder() {
        let diag = Diagnostic::error(ErrorCode::E203)
            .with_message("type mismatch: expected Integer, found String")
            .at("src/Main.myra", Pos::new(12, 5, Span::new(100, 110)));

        assert_eq!(diag.code, ErrorCode::E203);
        assert!(diag.is_error());
        assert_eq!(diag.line, 12);
        assert_eq!(diag.column, 5);
    }

    #[test]
    fn test_display_format() {
        let diag = Diagnostic::error(ErrorCode::E100)
            .with_message("expected ';'")
            .at("Main.myra", Pos::new(3, 14, Span::DUMMY));

        assert_eq!(diag.to_string(), "Main.myra(3,14): error E100: expected ';'");
    }

    #[test]
    fn test_warning_is_not_error() {
        let diag = Diagnostic::warning(ErrorCode::E107).with_message("ignored");
        assert!(!diag.is_error());
    }
}
