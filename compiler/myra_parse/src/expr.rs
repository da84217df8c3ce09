//! Expression productions.
//!
//! Precedence ladder: relational (incl. `is`/`as`) → additive (incl.
//! `or`) → multiplicative (incl. `and`) → unary → primary/postfix.
//! Primary expressions carry one of the passthrough trigger points: an
//! identifier followed by `::` or a template-style `<Ident>(` is re-read
//! as a foreign sub-expression.

use crate::passthrough::{TerminatorSet, PRIMARY_TERMS};
use crate::Parser;
use myra_diagnostic::{CompileResult, ErrorCode};
use myra_ir::{BinOp, CallBinding, ExprId, ExprKind, TokenKind, UnOp};

static PAREN_TERMS: TerminatorSet = TerminatorSet::new(&[TokenKind::RParen]);
static INDEX_TERMS: TerminatorSet = TerminatorSet::new(&[TokenKind::RBracket]);
static ARG_TERMS: TerminatorSet = TerminatorSet::new(&[TokenKind::Comma, TokenKind::RParen]);
static SET_ELEM_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::Comma,
    TokenKind::RBrace,
    TokenKind::DotDot,
]);

impl<'a> Parser<'a> {
    /// Native parse first; if it did not land on one of `terms`, rewind
    /// and re-read the whole region as foreign passthrough.
    pub(crate) fn expr_or_passthrough(&mut self, terms: &TerminatorSet) -> CompileResult<ExprId> {
        let snap = self.snapshot();
        let parsed = self.speculative(Parser::parse_expression);
        match parsed {
            Some(id) if terms.contains(self.cursor.kind()) => Ok(id),
            _ => {
                self.restore(snap);
                let (text, pos) = self.capture_foreign(terms);
                Ok(self.module.arena.alloc(ExprKind::Foreign(text), pos))
            }
        }
    }

    pub(crate) fn parse_expression(&mut self) -> CompileResult<ExprId> {
        self.parse_relational()
    }

    fn parse_relational(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                TokenKind::KwIn => BinOp::In,
                TokenKind::KwIs => {
                    let pos = self.cursor.current().pos;
                    self.cursor.advance();
                    let type_name = self.expect_ident()?;
                    lhs = self.module.arena.alloc(
                        ExprKind::TypeTest {
                            operand: lhs,
                            type_name,
                        },
                        pos,
                    );
                    continue;
                }
                TokenKind::KwAs => {
                    let pos = self.cursor.current().pos;
                    self.cursor.advance();
                    let type_name = self.expect_ident()?;
                    lhs = self.module.arena.alloc(
                        ExprKind::Cast {
                            operand: lhs,
                            type_name,
                        },
                        pos,
                    );
                    continue;
                }
                _ => return Ok(lhs),
            };
            let pos = self.cursor.current().pos;
            self.cursor.advance();
            let rhs = self.parse_additive()?;
            lhs = self.module.arena.alloc(ExprKind::Binary { op, lhs, rhs }, pos);
        }
    }

    fn parse_additive(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::KwOr => BinOp::Or,
                _ => return Ok(lhs),
            };
            let pos = self.cursor.current().pos;
            self.cursor.advance();
            let rhs = self.parse_term()?;
            lhs = self.module.arena.alloc(ExprKind::Binary { op, lhs, rhs }, pos);
        }
    }

    fn parse_term(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Divide,
                TokenKind::KwDiv => BinOp::IntDiv,
                TokenKind::KwMod => BinOp::Modulo,
                TokenKind::KwAnd => BinOp::And,
                _ => return Ok(lhs),
            };
            let pos = self.cursor.current().pos;
            self.cursor.advance();
            let rhs = self.parse_unary()?;
            lhs = self.module.arena.alloc(ExprKind::Binary { op, lhs, rhs }, pos);
        }
    }

    fn parse_unary(&mut self) -> CompileResult<ExprId> {
        let op = match self.cursor.kind() {
            TokenKind::KwNot => UnOp::Not,
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Plus => UnOp::Plus,
            _ => return self.parse_postfix(),
        };
        let pos = self.cursor.current().pos;
        self.cursor.advance();
        let operand = self.parse_unary()?;
        Ok(self.module.arena.alloc(ExprKind::Unary { op, operand }, pos))
    }

    fn parse_postfix(&mut self) -> CompileResult<ExprId> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.cursor.kind() {
                TokenKind::Dot => {
                    let pos = self.cursor.current().pos;
                    self.cursor.advance();
                    let name = self.parse_field_name()?;
                    expr = self
                        .module
                        .arena
                        .alloc(ExprKind::Field { base: expr, name }, pos);
                }
                TokenKind::LBracket => {
                    let pos = self.cursor.current().pos;
                    self.cursor.advance();
                    let index = self.expr_or_passthrough(&INDEX_TERMS)?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = self
                        .module
                        .arena
                        .alloc(ExprKind::Index { base: expr, index }, pos);
                }
                TokenKind::Caret => {
                    let pos = self.cursor.current().pos;
                    self.cursor.advance();
                    expr = self.module.arena.alloc(ExprKind::Deref { base: expr }, pos);
                }
                TokenKind::LParen => {
                    let pos = self.cursor.current().pos;
                    let args = self.parse_call_args()?;
                    expr = self.module.arena.alloc(
                        ExprKind::Call {
                            callee: expr,
                            args,
                            binding: CallBinding::Plain,
                        },
                        pos,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Field selector after `.`. Unknown keywords are accepted as field
    /// names so foreign-language members stay addressable.
    fn parse_field_name(&mut self) -> CompileResult<String> {
        if let TokenKind::Ident(name) = self.cursor.kind() {
            let name = name.clone();
            self.cursor.advance();
            return Ok(name);
        }
        if let Some(text) = self.cursor.kind().keyword_text() {
            self.cursor.advance();
            return Ok(text.to_string());
        }
        self.expect_ident()
    }

    fn parse_call_args(&mut self) -> CompileResult<Vec<ExprId>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.cursor.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr_or_passthrough(&ARG_TERMS)?);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> CompileResult<ExprId> {
        let token = self.cursor.current();
        let pos = token.pos;
        let kind = match &token.kind {
            TokenKind::Int(v) => {
                self.cursor.advance();
                ExprKind::Int(*v)
            }
            TokenKind::Float(bits) => {
                self.cursor.advance();
                ExprKind::Float(*bits)
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.cursor.advance();
                ExprKind::Str(s)
            }
            TokenKind::Char(s) => {
                let s = s.clone();
                self.cursor.advance();
                ExprKind::Char(s)
            }
            TokenKind::WideStr(s) => {
                let s = s.clone();
                self.cursor.advance();
                ExprKind::WideStr(s)
            }
            TokenKind::WideChar(s) => {
                let s = s.clone();
                self.cursor.advance();
                ExprKind::WideChar(s)
            }
            TokenKind::KwTrue => {
                self.cursor.advance();
                ExprKind::Bool(true)
            }
            TokenKind::KwFalse => {
                self.cursor.advance();
                ExprKind::Bool(false)
            }
            TokenKind::KwNil => {
                self.cursor.advance();
                ExprKind::Nil
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.expr_or_passthrough(&PAREN_TERMS)?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBrace => return self.parse_set_literal(),
            TokenKind::Ident(name) => return self.parse_ident_primary(name.clone()),
            _ => {
                // No native production matches: foreign sub-expression.
                let (text, fpos) = self.capture_foreign(&PRIMARY_TERMS);
                if text.is_empty() {
                    self.error(
                        ErrorCode::E101,
                        format!("expected expression, found {}", self.cursor.kind().describe()),
                        fpos,
                    )?;
                }
                return Ok(self.module.arena.alloc(ExprKind::Foreign(text), fpos));
            }
        };
        Ok(self.module.arena.alloc(kind, pos))
    }

    fn parse_ident_primary(&mut self, name: String) -> CompileResult<ExprId> {
        let pos = self.cursor.current().pos;

        // Passthrough triggers: `Ident::...` and template-style `Ident<T>(`.
        let scope_op = matches!(self.cursor.peek(1), TokenKind::Colon)
            && matches!(self.cursor.peek(2), TokenKind::Colon);
        let template_call = matches!(self.cursor.peek(1), TokenKind::Lt)
            && matches!(self.cursor.peek(2), TokenKind::Ident(_))
            && matches!(self.cursor.peek(3), TokenKind::Gt)
            && matches!(self.cursor.peek(4), TokenKind::LParen);
        if scope_op || template_call {
            let (text, fpos) = self.capture_foreign(&PRIMARY_TERMS);
            return Ok(self.module.arena.alloc(ExprKind::Foreign(text), fpos));
        }

        // Intrinsics, recognised by name.
        if name.eq_ignore_ascii_case("length") && matches!(self.cursor.peek(1), TokenKind::LParen) {
            self.cursor.advance();
            self.expect(&TokenKind::LParen)?;
            let operand = self.expr_or_passthrough(&PAREN_TERMS)?;
            self.expect(&TokenKind::RParen)?;
            return Ok(self.module.arena.alloc(ExprKind::LengthOf(operand), pos));
        }
        if name.eq_ignore_ascii_case("paramstr") && matches!(self.cursor.peek(1), TokenKind::LParen)
        {
            self.cursor.advance();
            self.expect(&TokenKind::LParen)?;
            let index = self.expr_or_passthrough(&PAREN_TERMS)?;
            self.expect(&TokenKind::RParen)?;
            return Ok(self.module.arena.alloc(ExprKind::ParamStr(index), pos));
        }
        if name.eq_ignore_ascii_case("paramcount") {
            self.cursor.advance();
            if self.cursor.eat(&TokenKind::LParen) {
                self.expect(&TokenKind::RParen)?;
            }
            return Ok(self.module.arena.alloc(ExprKind::ParamCount, pos));
        }

        self.cursor.advance();
        Ok(self.module.arena.alloc(ExprKind::Ident(name), pos))
    }

    /// `{ elem, lo..hi, ... }` set constructor.
    fn parse_set_literal(&mut self) -> CompileResult<ExprId> {
        let pos = self.cursor.current().pos;
        self.expect(&TokenKind::LBrace)?;
        let mut elements = Vec::new();
        if self.cursor.eat(&TokenKind::RBrace) {
            return Ok(self.module.arena.alloc(ExprKind::SetLit(elements), pos));
        }
        loop {
            let elem_pos = self.cursor.current().pos;
            let lo = self.expr_or_passthrough(&SET_ELEM_TERMS)?;
            if self.cursor.eat(&TokenKind::DotDot) {
                let hi = self.expr_or_passthrough(&SET_ELEM_TERMS)?;
                elements.push(self.module.arena.alloc(ExprKind::Range { lo, hi }, elem_pos));
            } else {
                elements.push(lo);
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(self.module.arena.alloc(ExprKind::SetLit(elements), pos))
    }
}
