//! Lexer for the Myra compiler.
//!
//! A single forward scan over a UTF-8 source buffer. The main dispatch
//! matches on the current byte and calls a focused method per token
//! class. Unrecognised characters are deliberately lexed as one-char
//! identifier tokens rather than errors — that tolerance is what feeds
//! the parser's foreign-passthrough rule.
//!
//! Every token records the 1-based line and column of its first byte and
//! the byte span of its text, so downstream phases can slice the original
//! buffer verbatim.

mod keywords;

#[cfg(test)]
mod tests;

use myra_diagnostic::{CompileResult, Diagnostic, DiagnosticBag, ErrorCode};
use myra_ir::{ForeignTarget, Pos, Span, Token, TokenKind};

/// Tokenize a whole source buffer.
///
/// The returned stream always ends in an [`TokenKind::Eof`] token, for any
/// input. Lex errors are reported to `bag` and scanning continues; only
/// the bag's error cap aborts.
pub fn tokenize(src: &str, file: &str, bag: &mut DiagnosticBag) -> CompileResult<Vec<Token>> {
    Lexer::new(src, file, bag).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    file: &'a str,
    bag: &'a mut DiagnosticBag,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, file: &'a str, bag: &'a mut DiagnosticBag) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            file,
            bag,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    fn current(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    #[inline]
    fn peek(&self, n: usize) -> u8 {
        self.bytes.get(self.pos + n).copied().unwrap_or(0)
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Advance one byte, maintaining line and column. CR does not advance
    /// the column; LF resets it and bumps the line; UTF-8 continuation
    /// bytes do not advance the column.
    fn bump(&mut self) {
        let b = self.current();
        self.pos += 1;
        match b {
            b'\n' => {
                self.line += 1;
                self.column = 1;
            }
            b'\r' => {}
            0x80..=0xBF => {}
            _ => self.column += 1,
        }
    }

    /// Line/column/offset of the next byte to be read.
    fn mark(&self) -> (u32, u32, u32) {
        (self.line, self.column, self.pos as u32)
    }

    fn pos_from(&self, mark: (u32, u32, u32)) -> Pos {
        Pos::new(mark.0, mark.1, Span::new(mark.2, self.pos as u32))
    }

    fn run(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.is_eof() {
                break;
            }
            let mark = self.mark();
            let kind = self.next_kind(mark)?;
            tokens.push(Token::new(kind, self.pos_from(mark)));
        }
        let mark = self.mark();
        tokens.push(Token::new(TokenKind::Eof, self.pos_from(mark)));
        Ok(tokens)
    }

    /// Skip whitespace and both comment forms.
    fn skip_trivia(&mut self) -> CompileResult<()> {
        loop {
            match self.current() {
                b' ' | b'\t' | b'\r' | b'\n' => self.bump(),
                b'/' if self.peek(1) == b'/' => {
                    while !self.is_eof() && self.current() != b'\n' {
                        self.bump();
                    }
                }
                b'(' if self.peek(1) == b'*' => self.block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn block_comment(&mut self) -> CompileResult<()> {
        let mark = self.mark();
        self.bump(); // (
        self.bump(); // *
        loop {
            if self.is_eof() {
                let pos = Pos::new(mark.0, mark.1, Span::point(mark.2));
                self.bag.report(
                    Diagnostic::error(ErrorCode::E011)
                        .with_message("unterminated block comment")
                        .at(self.file, pos),
                )?;
                return Ok(());
            }
            if self.current() == b'*' && self.peek(1) == b')' {
                self.bump();
                self.bump();
                return Ok(());
            }
            self.bump();
        }
    }

    fn next_kind(&mut self, mark: (u32, u32, u32)) -> CompileResult<TokenKind> {
        match self.current() {
            b'L' if self.peek(1) == b'\'' || self.peek(1) == b'"' => self.wide_literal(mark),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => Ok(self.identifier()),
            b'0'..=b'9' => Ok(self.number()),
            b'\'' => self.string_literal(mark, b'\'', false),
            b'#' => self.directive(mark),
            b':' => Ok(self.two_char(b'=', TokenKind::Assign, TokenKind::Colon)),
            b'<' => {
                self.bump();
                match self.current() {
                    b'=' => {
                        self.bump();
                        Ok(TokenKind::LtEq)
                    }
                    b'>' => {
                        self.bump();
                        Ok(TokenKind::NotEq)
                    }
                    _ => Ok(TokenKind::Lt),
                }
            }
            b'>' => Ok(self.two_char(b'=', TokenKind::GtEq, TokenKind::Gt)),
            b'.' => {
                self.bump();
                if self.current() == b'.' {
                    self.bump();
                    if self.current() == b'.' {
                        self.bump();
                        Ok(TokenKind::Ellipsis)
                    } else {
                        Ok(TokenKind::DotDot)
                    }
                } else {
                    Ok(TokenKind::Dot)
                }
            }
            b'=' => Ok(self.single(TokenKind::Eq)),
            b'+' => Ok(self.single(TokenKind::Plus)),
            b'-' => Ok(self.single(TokenKind::Minus)),
            b'*' => Ok(self.single(TokenKind::Star)),
            b'/' => Ok(self.single(TokenKind::Slash)),
            b'(' => Ok(self.single(TokenKind::LParen)),
            b')' => Ok(self.single(TokenKind::RParen)),
            b'[' => Ok(self.single(TokenKind::LBracket)),
            b']' => Ok(self.single(TokenKind::RBracket)),
            b'{' => Ok(self.single(TokenKind::LBrace)),
            b'}' => Ok(self.single(TokenKind::RBrace)),
            b',' => Ok(self.single(TokenKind::Comma)),
            b';' => Ok(self.single(TokenKind::Semicolon)),
            b'^' => Ok(self.single(TokenKind::Caret)),
            b'@' => Ok(self.single(TokenKind::At)),
            _ => {
                // Unknown character: pass through as a bare one-char
                // identifier so passthrough capture can preserve it.
                let start = self.pos;
                self.bump();
                // Consume any continuation bytes of a multi-byte char.
                while matches!(self.current(), 0x80..=0xBF) {
                    self.bump();
                }
                Ok(TokenKind::Ident(self.src[start..self.pos].to_string()))
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn two_char(&mut self, second: u8, matched: TokenKind, single: TokenKind) -> TokenKind {
        self.bump();
        if self.current() == second {
            self.bump();
            matched
        } else {
            single
        }
    }

    fn identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.current(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        keywords::lookup(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }

    fn number(&mut self) -> TokenKind {
        let start = self.pos;

        // Oberon hex: a run of hex digits terminated by H/h, starting with
        // a decimal digit. Committed only when the terminator is present.
        let mut i = self.pos;
        while self.bytes.get(i).is_some_and(u8::is_ascii_hexdigit) {
            i += 1;
        }
        if i > self.pos && matches!(self.bytes.get(i).copied(), Some(b'H' | b'h')) {
            while self.pos < i {
                self.bump();
            }
            self.bump(); // H
            let value = u64::from_str_radix(&self.src[start..i], 16).unwrap_or(0);
            return TokenKind::Int(value as i64);
        }

        while self.current().is_ascii_digit() {
            self.bump();
        }
        let mut is_float = false;
        if self.current() == b'.' && self.peek(1).is_ascii_digit() {
            self.bump();
            while self.current().is_ascii_digit() {
                self.bump();
            }
            is_float = true;
        }
        if matches!(self.current(), b'e' | b'E') {
            let (sign, first_digit) = (self.peek(1), self.peek(2));
            if sign.is_ascii_digit() || (matches!(sign, b'+' | b'-') && first_digit.is_ascii_digit())
            {
                self.bump();
                if matches!(self.current(), b'+' | b'-') {
                    self.bump();
                }
                while self.current().is_ascii_digit() {
                    self.bump();
                }
                is_float = true;
            }
        }

        let text = &self.src[start..self.pos];
        if is_float {
            let value: f64 = text.parse().unwrap_or(0.0);
            TokenKind::Float(value.to_bits())
        } else {
            TokenKind::Int(text.parse().unwrap_or(0))
        }
    }

    /// Single- or double-quoted literal with doubled-delimiter escape.
    /// Content of unescaped length 1 classifies as a character literal.
    fn string_literal(
        &mut self,
        mark: (u32, u32, u32),
        delim: u8,
        wide: bool,
    ) -> CompileResult<TokenKind> {
        self.bump(); // opening quote
        let mut content = String::new();
        loop {
            if self.is_eof() {
                let pos = Pos::new(mark.0, mark.1, Span::point(mark.2));
                self.bag.report(
                    Diagnostic::error(ErrorCode::E010)
                        .with_message("unterminated string literal")
                        .at(self.file, pos),
                )?;
                break;
            }
            let b = self.current();
            if b == delim {
                if self.peek(1) == delim {
                    content.push(delim as char);
                    self.bump();
                    self.bump();
                } else {
                    self.bump();
                    break;
                }
            } else if b == b'\r' || b == b'\n' {
                let pos = self.pos_from(self.mark());
                self.bag.report(
                    Diagnostic::error(ErrorCode::E012)
                        .with_message("string literal spans a line break")
                        .at(self.file, pos),
                )?;
                break;
            } else {
                let char_start = self.pos;
                self.bump();
                while matches!(self.current(), 0x80..=0xBF) {
                    self.bump();
                }
                content.push_str(&self.src[char_start..self.pos]);
            }
        }

        let is_char = content.chars().count() == 1;
        Ok(match (wide, is_char) {
            (false, true) => TokenKind::Char(content),
            (false, false) => TokenKind::Str(content),
            (true, true) => TokenKind::WideChar(content),
            (true, false) => TokenKind::WideStr(content),
        })
    }

    fn wide_literal(&mut self, mark: (u32, u32, u32)) -> CompileResult<TokenKind> {
        self.bump(); // L
        let delim = self.current();
        self.string_literal(mark, delim, true)
    }

    /// `#name` directive, or the `#startcpp .. #endcpp` foreign block.
    fn directive(&mut self, mark: (u32, u32, u32)) -> CompileResult<TokenKind> {
        self.bump(); // #
        let start = self.pos;
        while matches!(self.current(), b'a'..=b'z' | b'A'..=b'Z' | b'_') {
            self.bump();
        }
        let name = self.src[start..self.pos].to_string();
        // The block markers are exact literals, unlike keywords.
        if name == "startcpp" {
            return self.foreign_block(mark);
        }
        Ok(TokenKind::Directive(name))
    }

    fn foreign_block(&mut self, mark: (u32, u32, u32)) -> CompileResult<TokenKind> {
        // Optional `header` / `source` target selector.
        let mut target = None;
        let mut i = self.pos;
        while matches!(self.bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let word_start = i;
        while self.bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
            i += 1;
        }
        let word = &self.src[word_start..i];
        if word.eq_ignore_ascii_case("header") {
            target = Some(ForeignTarget::Header);
        } else if word.eq_ignore_ascii_case("source") {
            target = Some(ForeignTarget::Source);
        }
        if target.is_some() {
            while self.pos < i {
                self.bump();
            }
        }

        const END_MARKER: &str = "#endcpp";
        let interior_start = self.pos;
        match self.src[self.pos..].find(END_MARKER) {
            Some(rel) => {
                let interior_end = self.pos + rel;
                while self.pos < interior_end {
                    self.bump();
                }
                let text = self.src[interior_start..interior_end].to_string();
                for _ in 0..END_MARKER.len() {
                    self.bump();
                }
                Ok(TokenKind::ForeignBlock { target, text })
            }
            None => {
                let pos = Pos::new(mark.0, mark.1, Span::point(mark.2));
                self.bag.report(
                    Diagnostic::error(ErrorCode::E013)
                        .with_message("foreign code block is missing '#endcpp'")
                        .at(self.file, pos),
                )?;
                let text = self.src[interior_start..].to_string();
                while !self.is_eof() {
                    self.bump();
                }
                Ok(TokenKind::ForeignBlock { target, text })
            }
        }
    }
}
