//! Diagnostic bag: ordered collection with a hard error cap.

use crate::{Diagnostic, ErrorCode, Severity};
use thiserror::Error;

/// Maximum number of errors before the pipeline is aborted so downstream
/// phases never run on a severely broken AST.
pub const ERROR_LIMIT: usize = 10;

/// Abnormal termination of a compilation.
///
/// Raised (as an `Err` propagated through every phase boundary) by a fatal
/// diagnostic or by reaching the error cap. The driver catches it at the
/// top level and reports "build failed" instead of cascading noise.
#[derive(Debug, Error)]
pub enum FatalError {
    /// A fatal diagnostic aborted the compile.
    #[error("{0}")]
    Fatal(Box<Diagnostic>),
    /// The error cap was reached.
    #[error("too many errors")]
    TooManyErrors,
}

/// Collects diagnostics in source order and enforces the abort rules.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic.
    ///
    /// Returns `Err` when the diagnostic is fatal or when this report
    /// pushed the error count past [`ERROR_LIMIT`]; callers propagate the
    /// error with `?` so the pipeline unwinds.
    pub fn report(&mut self, diagnostic: Diagnostic) -> Result<(), FatalError> {
        match diagnostic.severity {
            Severity::Warning => {
                self.warning_count += 1;
                self.diagnostics.push(diagnostic);
                Ok(())
            }
            Severity::Error => {
                self.error_count += 1;
                self.diagnostics.push(diagnostic);
                if self.error_count >= ERROR_LIMIT {
                    let last = self
                        .diagnostics
                        .last()
                        .map(|d| (d.file.clone(), d.line, d.column))
                        .unwrap_or_default();
                    let mut cap = Diagnostic::error(ErrorCode::E217)
                        .with_message("too many errors, stopping");
                    cap.file = last.0;
                    cap.line = last.1;
                    cap.column = last.2;
                    self.diagnostics.push(cap);
                    Err(FatalError::TooManyErrors)
                } else {
                    Ok(())
                }
            }
            Severity::Fatal => {
                self.error_count += 1;
                self.diagnostics.push(diagnostic.clone());
                Err(FatalError::Fatal(Box::new(diagnostic)))
            }
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Whether any error (or fatal) has been reported. Consulted at phase
    /// boundaries: semantic analysis runs unless a fatal unwound the
    /// pipeline, but emission is skipped when any error is present.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// All diagnostics in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn error(msg: &str) -> Diagnostic {
        Diagnostic::error(ErrorCode::E101).with_message(msg)
    }

    #[test]
    fn test_warnings_never_abort() {
        let mut bag = DiagnosticBag::new();
        for _ in 0..100 {
            bag.report(Diagnostic::warning(ErrorCode::E107).with_message("w"))
                .expect("warnings must not abort");
        }
        assert_eq!(bag.warning_count(), 100);
        assert!(!bag.has_errors());
    }

    #[test]
    fn test_error_cap_aborts() {
        let mut bag = DiagnosticBag::new();
        for i in 0..ERROR_LIMIT - 1 {
            bag.report(error(&format!("e{i}"))).expect("below the cap");
        }
        let result = bag.report(error("the last straw"));
        assert!(matches!(result, Err(FatalError::TooManyErrors)));
        // The cap diagnostic itself is appended with a stable code.
        let last = bag.diagnostics().last().expect("cap diagnostic");
        assert_eq!(last.code, ErrorCode::E217);
    }

    #[test]
    fn test_fatal_aborts_immediately() {
        let mut bag = DiagnosticBag::new();
        let result = bag.report(Diagnostic::fatal(ErrorCode::E001).with_message("no such file"));
        assert!(matches!(result, Err(FatalError::Fatal(_))));
        assert!(bag.has_errors());
    }

    #[test]
    fn test_order_preserved() {
        let mut bag = DiagnosticBag::new();
        bag.report(error("first")).expect("ok");
        bag.report(error("second")).expect("ok");
        let messages: Vec<_> = bag.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
