//! Foreign-passthrough capture.
//!
//! When the token stream does not match any native production, the parser
//! records the current token's byte offset, advances while tracking
//! balanced `()`, `[]`, and `{}` depths, and halts at the first depth-zero
//! terminator from a caller-supplied set. The captured node's text is the
//! exact source slice from the recorded start to the end of the last
//! consumed token — operators, whitespace, and unrecognised characters
//! are preserved bit-for-bit because the emitter writes this slice back
//! out verbatim.

use crate::Parser;
use myra_ir::{Pos, Span, TokenKind};

/// A set of depth-zero stop tokens for passthrough capture.
pub(crate) struct TerminatorSet {
    kinds: &'static [TokenKind],
    /// Halt on Myra binary operators too (sub-expression capture, so a
    /// foreign operand can participate in a native binary expression).
    stop_on_binary_op: bool,
}

impl TerminatorSet {
    pub(crate) const fn new(kinds: &'static [TokenKind]) -> Self {
        TerminatorSet {
            kinds,
            stop_on_binary_op: false,
        }
    }

    pub(crate) const fn with_binary_ops(kinds: &'static [TokenKind]) -> Self {
        TerminatorSet {
            kinds,
            stop_on_binary_op: true,
        }
    }

    pub(crate) fn contains(&self, kind: &TokenKind) -> bool {
        if self.stop_on_binary_op && kind.is_binary_operator() {
            return true;
        }
        self.kinds.iter().any(|k| k == kind)
    }
}

/// Statement-level stops: statement separators and block closers.
pub(crate) static STMT_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::Semicolon,
    TokenKind::KwEnd,
    TokenKind::KwElse,
    TokenKind::KwUntil,
    TokenKind::KwExcept,
    TokenKind::KwFinally,
]);

/// Sub-expression stops: everything that can legally follow an operand,
/// plus binary operators.
pub(crate) static PRIMARY_TERMS: TerminatorSet = TerminatorSet::with_binary_ops(&[
    TokenKind::Semicolon,
    TokenKind::Comma,
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::RBrace,
    TokenKind::KwEnd,
    TokenKind::KwElse,
    TokenKind::KwUntil,
    TokenKind::KwExcept,
    TokenKind::KwFinally,
    TokenKind::KwThen,
    TokenKind::KwDo,
    TokenKind::KwOf,
    TokenKind::KwTo,
    TokenKind::KwDownto,
    TokenKind::DotDot,
    TokenKind::Colon,
    TokenKind::Assign,
]);

impl<'a> Parser<'a> {
    /// Capture tokens as a raw foreign slice until a depth-zero terminator.
    ///
    /// Returns the verbatim source text and the position of the first
    /// captured token. The text is empty when the cursor already sat on a
    /// terminator.
    pub(crate) fn capture_foreign(&mut self, terms: &TerminatorSet) -> (String, Pos) {
        let first = self.cursor.current();
        let start_pos = first.pos;
        let start = first.pos.span.start;
        let mut end = start;

        let mut paren = 0u32;
        let mut bracket = 0u32;
        let mut brace = 0u32;

        loop {
            let kind = self.cursor.kind();
            if matches!(kind, TokenKind::Eof) {
                break;
            }
            let balanced = paren == 0 && bracket == 0 && brace == 0;
            if balanced && terms.contains(kind) {
                break;
            }
            match kind {
                TokenKind::LParen => paren += 1,
                TokenKind::RParen => {
                    if paren == 0 {
                        break;
                    }
                    paren -= 1;
                }
                TokenKind::LBracket => bracket += 1,
                TokenKind::RBracket => {
                    if bracket == 0 {
                        break;
                    }
                    bracket -= 1;
                }
                TokenKind::LBrace => brace += 1,
                TokenKind::RBrace => {
                    if brace == 0 {
                        break;
                    }
                    brace -= 1;
                }
                _ => {}
            }
            end = self.cursor.current().pos.span.end;
            self.cursor.advance();
        }

        let text = self.src[start as usize..end as usize].to_string();
        let pos = Pos::new(start_pos.line, start_pos.column, Span::new(start, end));
        (text, pos)
    }

    /// Capture the raw remainder of `line`, consuming every token on it.
    /// Returns the raw text and the end offset of the last consumed token
    /// (0 when the line held nothing further).
    ///
    /// Used for directive arguments and for unrecognised `#directive`
    /// lines, which pass through as foreign statements captured to
    /// end-of-line.
    pub(crate) fn capture_rest_of_line(&mut self, line: u32) -> (String, u32) {
        if self.cursor.at_eof() || self.cursor.current().pos.line != line {
            return (String::new(), 0);
        }
        let start = self.cursor.current().pos.span.start;
        let mut end = start;
        while !self.cursor.at_eof() && self.cursor.current().pos.line == line {
            end = self.cursor.current().pos.span.end;
            self.cursor.advance();
        }
        (self.src[start as usize..end as usize].to_string(), end)
    }
}
