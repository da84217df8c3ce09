//! Token cursor for navigating the token stream.
//!
//! Provides one-token lookahead, arbitrary peek, and snapshot/restore for
//! the speculative parses behind the passthrough fallback.

use myra_ir::{Token, TokenKind};

/// Cursor over a token stream. The last token is always EOF, and the
/// cursor never advances past it.
pub(crate) struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "token stream must end in EOF"
        );
        Cursor { tokens, pos: 0 }
    }

    /// Current position, for progress checks and snapshots.
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Restore a position taken with [`Cursor::position`].
    pub(crate) fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.pos, "cursor may only rewind");
        self.pos = pos;
    }

    /// The current token.
    #[inline]
    pub(crate) fn current(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// The current token's kind.
    #[inline]
    pub(crate) fn kind(&self) -> &'a TokenKind {
        &self.current().kind
    }

    /// Peek `n` tokens ahead (0 = current).
    #[inline]
    pub(crate) fn peek(&self, n: usize) -> &'a TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    /// The most recently consumed token, if any.
    #[inline]
    pub(crate) fn previous(&self) -> Option<&'a Token> {
        self.pos.checked_sub(1).map(|i| &self.tokens[i])
    }

    /// Whether the current token is EOF.
    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Whether the current token matches `kind` exactly (payload kinds
    /// compare by variant only where that is meaningful).
    #[inline]
    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consume and return the current token. At EOF, returns the EOF
    /// token without moving.
    pub(crate) fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myra_ir::TokenKind;

    fn stream(kinds: Vec<TokenKind>) -> Vec<Token> {
        kinds.into_iter().map(Token::dummy).collect()
    }

    #[test]
    fn test_advance_stops_at_eof() {
        let tokens = stream(vec![TokenKind::Semicolon, TokenKind::Eof]);
        let mut cursor = Cursor::new(&tokens);
        cursor.advance();
        cursor.advance();
        cursor.advance();
        assert!(cursor.at_eof());
    }

    #[test]
    fn test_peek_clamps() {
        let tokens = stream(vec![TokenKind::KwBegin, TokenKind::Eof]);
        let cursor = Cursor::new(&tokens);
        assert_eq!(cursor.peek(0), &TokenKind::KwBegin);
        assert_eq!(cursor.peek(10), &TokenKind::Eof);
    }

    #[test]
    fn test_snapshot_rewind() {
        let tokens = stream(vec![TokenKind::Plus, TokenKind::Minus, TokenKind::Eof]);
        let mut cursor = Cursor::new(&tokens);
        let snap = cursor.position();
        cursor.advance();
        cursor.advance();
        cursor.set_position(snap);
        assert_eq!(cursor.kind(), &TokenKind::Plus);
    }
}
