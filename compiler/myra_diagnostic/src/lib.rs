//! Diagnostic and error reporting for the Myra compiler.
//!
//! Diagnostics are values built with a fluent API, collected into a
//! [`DiagnosticBag`]. Abnormal termination (a fatal diagnostic or the
//! error cap) is a [`FatalError`] propagated through phase boundaries
//! with `?`.

mod bag;
mod diagnostic;
mod error_code;

pub use bag::{DiagnosticBag, FatalError, ERROR_LIMIT};
pub use diagnostic::{Diagnostic, Severity};
pub use error_code::ErrorCode;

/// Result type threaded through every compiler phase.
pub type CompileResult<T> = Result<T, FatalError>;
