//! Stable error codes for all compiler diagnostics.
//!
//! Each code is a short stable identifier so tests and IDE matchers can
//! assert on the kind of a diagnostic rather than its prose. The first
//! digit group indicates the phase:
//! - E0xx: driver / file system
//! - E01x: lexer
//! - E1xx: parser
//! - E2xx: semantic analysis
//! - E3xx: import resolution
//! - E4xx: emission-blocking semantic conditions

use std::fmt;

/// Error codes for all compiler diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Driver (E0xx)
    /// Source file not found or unreadable
    E001,

    // Lexer (E01x)
    /// Unterminated string literal
    E010,
    /// Unterminated block comment
    E011,
    /// Line break inside string literal
    E012,
    /// Unterminated foreign code block
    E013,

    // Parser (E1xx)
    /// Expected a specific token
    E100,
    /// Unexpected token in context
    E101,
    /// Malformed declaration
    E102,
    /// Expected identifier
    E103,
    /// Expected type
    E104,
    /// Malformed module header
    E105,
    /// Body block not allowed in non-executable module
    E106,
    /// Test block without unit-test mode
    E107,
    /// Test block in shared-library module
    E108,
    /// Unknown directive argument
    E109,

    // Semantic (E2xx)
    /// Duplicate identifier
    E200,
    /// Unknown type
    E201,
    /// Unknown identifier
    E202,
    /// Type mismatch
    E203,
    /// Condition must be Boolean
    E204,
    /// Loop bound must be Integer
    E205,
    /// Loop variable not declared
    E206,
    /// Return with value in a routine without a return type
    E207,
    /// Return without value in a routine with a return type
    E208,
    /// Return type mismatch
    E209,
    /// Method's first parameter must be `var Self`
    E210,
    /// Method receiver type unknown
    E211,
    /// `inherited` outside a method
    E212,
    /// `inherited` on a type with no parent
    E213,
    /// Constant expression required
    E214,
    /// Unknown field
    E216,
    /// Too many errors (pipeline aborted)
    E217,
    /// Record inheritance cycle
    E218,

    // Imports (E3xx)
    /// Imported module not found
    E300,

    // Emission-blocking (E4xx)
    /// `new` target type cannot be inferred
    E400,
}

impl ErrorCode {
    /// Short human description used by `--explain`-style output.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::E001 => "source file not found or unreadable",
            ErrorCode::E010 => "unterminated string literal",
            ErrorCode::E011 => "unterminated block comment",
            ErrorCode::E012 => "line break inside string literal",
            ErrorCode::E013 => "unterminated foreign code block",
            ErrorCode::E100 => "expected a specific token",
            ErrorCode::E101 => "unexpected token",
            ErrorCode::E102 => "malformed declaration",
            ErrorCode::E103 => "expected identifier",
            ErrorCode::E104 => "expected type",
            ErrorCode::E105 => "malformed module header",
            ErrorCode::E106 => "body block not allowed in this module kind",
            ErrorCode::E107 => "test block without unit-test mode",
            ErrorCode::E108 => "test block in shared-library module",
            ErrorCode::E109 => "unknown directive argument",
            ErrorCode::E200 => "duplicate identifier",
            ErrorCode::E201 => "unknown type",
            ErrorCode::E202 => "unknown identifier",
            ErrorCode::E203 => "type mismatch",
            ErrorCode::E204 => "condition must be Boolean",
            ErrorCode::E205 => "loop bound must be Integer",
            ErrorCode::E206 => "loop variable not declared",
            ErrorCode::E207 => "return value in void routine",
            ErrorCode::E208 => "return value expected",
            ErrorCode::E209 => "return type mismatch",
            ErrorCode::E210 => "method must take 'var Self' first",
            ErrorCode::E211 => "method receiver type unknown",
            ErrorCode::E212 => "'inherited' outside a method",
            ErrorCode::E213 => "'inherited' on a type with no parent",
            ErrorCode::E214 => "constant expression required",
            ErrorCode::E216 => "unknown field",
            ErrorCode::E217 => "too many errors",
            ErrorCode::E218 => "record inheritance cycle",
            ErrorCode::E300 => "imported module not found",
            ErrorCode::E400 => "cannot infer allocation type for 'new'",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_stable_name() {
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E218.to_string(), "E218");
    }

    #[test]
    fn test_description_nonempty() {
        assert!(!ErrorCode::E203.description().is_empty());
    }
}
