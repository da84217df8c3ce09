//! Statement productions.
//!
//! This is where the passthrough rule earns its keep: an identifier
//! followed by anything that is not a recognised Myra statement
//! continuation (`++`, `::`, template-style `<T>(...)`) is re-read as a
//! foreign statement, and an expression statement that parses natively
//! but does not land on a legal terminator is rewound and captured raw.

use crate::passthrough::{TerminatorSet, STMT_TERMS};
use crate::Parser;
use myra_diagnostic::{CompileResult, ErrorCode};
use myra_ir::{Block, CaseArm, ExprId, ExprKind, Stmt, StmtKind, TokenKind};

// Condition/header sets include the statement stops so a malformed
// header cannot swallow the rest of the unit during capture.
static THEN_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::KwThen,
    TokenKind::Semicolon,
    TokenKind::KwEnd,
    TokenKind::KwElse,
    TokenKind::KwUntil,
]);
static DO_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::KwDo,
    TokenKind::Semicolon,
    TokenKind::KwEnd,
    TokenKind::KwElse,
    TokenKind::KwUntil,
]);
static OF_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::KwOf,
    TokenKind::Semicolon,
    TokenKind::KwEnd,
]);
static FOR_START_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::KwTo,
    TokenKind::KwDownto,
    TokenKind::Semicolon,
    TokenKind::KwEnd,
]);
static NEW_TARGET_TERMS: TerminatorSet =
    TerminatorSet::new(&[TokenKind::KwAs, TokenKind::RParen]);
static RHS_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::Semicolon,
    TokenKind::KwEnd,
    TokenKind::KwElse,
    TokenKind::KwUntil,
    TokenKind::KwExcept,
    TokenKind::KwFinally,
]);
static CASE_LABEL_TERMS: TerminatorSet = TerminatorSet::new(&[
    TokenKind::Comma,
    TokenKind::Colon,
    TokenKind::DotDot,
]);
static ARG_TERMS: TerminatorSet = TerminatorSet::new(&[TokenKind::Comma, TokenKind::RParen]);
static PAREN_TERMS: TerminatorSet = TerminatorSet::new(&[TokenKind::RParen]);

impl<'a> Parser<'a> {
    /// Parse statements until one of `stop` (or EOF). Semicolons between
    /// statements are consumed here.
    pub(crate) fn parse_stmt_list(&mut self, stop: &[TokenKind]) -> CompileResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            while self.cursor.eat(&TokenKind::Semicolon) {}
            if self.cursor.at_eof() || stop.iter().any(|k| self.cursor.at(k)) {
                return Ok(stmts);
            }
            let before = self.cursor.position();
            if let Some(stmt) = self.parse_statement()? {
                stmts.push(stmt);
            }
            if self.cursor.position() == before {
                // No progress: drop the offending token to guarantee
                // termination, then resync.
                let found = self.cursor.current();
                self.error(
                    ErrorCode::E101,
                    format!("unexpected {}", found.kind.describe()),
                    found.pos,
                )?;
                self.cursor.advance();
            }
        }
    }

    /// Parse the single statement (or `begin..end` sequence) a control
    /// header allows, wrapped as a block.
    fn parse_branch(&mut self) -> CompileResult<Block> {
        if self.cursor.at(&TokenKind::KwBegin) {
            self.cursor.advance();
            let stmts = self.parse_stmt_list(&[TokenKind::KwEnd])?;
            self.expect(&TokenKind::KwEnd)?;
            return Ok(Block::new(stmts));
        }
        match self.parse_statement()? {
            Some(stmt) => Ok(Block::new(vec![stmt])),
            None => Ok(Block::default()),
        }
    }

    /// One statement. Returns `None` for directives that were interpreted
    /// into configuration rather than kept in the tree.
    pub(crate) fn parse_statement(&mut self) -> CompileResult<Option<Stmt>> {
        let pos = self.cursor.current().pos;
        let kind = match self.cursor.kind() {
            TokenKind::KwBegin => {
                self.cursor.advance();
                let stmts = self.parse_stmt_list(&[TokenKind::KwEnd])?;
                self.expect(&TokenKind::KwEnd)?;
                StmtKind::Block(Block::new(stmts))
            }
            TokenKind::KwIf => {
                self.cursor.advance();
                let cond = self.expr_or_passthrough(&THEN_TERMS)?;
                self.expect(&TokenKind::KwThen)?;
                let then_branch = self.parse_branch()?;
                let else_branch = if self.cursor.eat(&TokenKind::KwElse) {
                    Some(self.parse_branch()?)
                } else {
                    None
                };
                StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                }
            }
            TokenKind::KwWhile => {
                self.cursor.advance();
                let cond = self.expr_or_passthrough(&DO_TERMS)?;
                self.expect(&TokenKind::KwDo)?;
                let body = self.parse_branch()?;
                StmtKind::While { cond, body }
            }
            TokenKind::KwRepeat => {
                self.cursor.advance();
                let stmts = self.parse_stmt_list(&[TokenKind::KwUntil])?;
                self.expect(&TokenKind::KwUntil)?;
                let cond = self.expr_or_passthrough(&RHS_TERMS)?;
                StmtKind::Repeat {
                    body: Block::new(stmts),
                    cond,
                }
            }
            TokenKind::KwFor => {
                self.cursor.advance();
                let var = self.expect_ident()?;
                self.expect(&TokenKind::Assign)?;
                let start = self.expr_or_passthrough(&FOR_START_TERMS)?;
                let descending = if self.cursor.eat(&TokenKind::KwDownto) {
                    true
                } else {
                    self.expect(&TokenKind::KwTo)?;
                    false
                };
                let end = self.expr_or_passthrough(&DO_TERMS)?;
                self.expect(&TokenKind::KwDo)?;
                let body = self.parse_branch()?;
                StmtKind::For {
                    var,
                    start,
                    end,
                    descending,
                    body,
                }
            }
            TokenKind::KwCase => return self.parse_case(pos),
            TokenKind::KwReturn => {
                self.cursor.advance();
                let value = if STMT_TERMS.contains(self.cursor.kind()) || self.cursor.at_eof() {
                    None
                } else {
                    Some(self.expr_or_passthrough(&RHS_TERMS)?)
                };
                StmtKind::Return { value }
            }
            TokenKind::KwNew => {
                self.cursor.advance();
                self.expect(&TokenKind::LParen)?;
                let target = self.expr_or_passthrough(&NEW_TARGET_TERMS)?;
                let as_type = if self.cursor.eat(&TokenKind::KwAs) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                self.expect(&TokenKind::RParen)?;
                StmtKind::New { target, as_type }
            }
            TokenKind::KwDispose => {
                self.cursor.advance();
                self.expect(&TokenKind::LParen)?;
                let target = self.expr_or_passthrough(&PAREN_TERMS)?;
                self.expect(&TokenKind::RParen)?;
                StmtKind::Dispose { target }
            }
            TokenKind::KwSetLength => {
                self.cursor.advance();
                self.expect(&TokenKind::LParen)?;
                let target = self.expr_or_passthrough(&ARG_TERMS)?;
                self.expect(&TokenKind::Comma)?;
                let length = self.expr_or_passthrough(&PAREN_TERMS)?;
                self.expect(&TokenKind::RParen)?;
                StmtKind::SetLength { target, length }
            }
            TokenKind::KwTry => {
                self.cursor.advance();
                let body = Block::new(self.parse_stmt_list(&[
                    TokenKind::KwExcept,
                    TokenKind::KwFinally,
                    TokenKind::KwEnd,
                ])?);
                let except = if self.cursor.eat(&TokenKind::KwExcept) {
                    Some(Block::new(
                        self.parse_stmt_list(&[TokenKind::KwFinally, TokenKind::KwEnd])?,
                    ))
                } else {
                    None
                };
                let finally = if self.cursor.eat(&TokenKind::KwFinally) {
                    Some(Block::new(self.parse_stmt_list(&[TokenKind::KwEnd])?))
                } else {
                    None
                };
                self.expect(&TokenKind::KwEnd)?;
                StmtKind::Try {
                    body,
                    except,
                    finally,
                }
            }
            TokenKind::KwInherited => {
                self.cursor.advance();
                let name = if let TokenKind::Ident(n) = self.cursor.kind() {
                    let n = n.clone();
                    self.cursor.advance();
                    Some(n)
                } else {
                    None
                };
                let mut args = Vec::new();
                if self.cursor.eat(&TokenKind::LParen) {
                    if !self.cursor.at(&TokenKind::RParen) {
                        loop {
                            args.push(self.expr_or_passthrough(&ARG_TERMS)?);
                            if !self.cursor.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                }
                StmtKind::Inherited {
                    name,
                    args,
                    resolved_parent: None,
                }
            }
            TokenKind::ForeignBlock { text, .. } => {
                let text = text.clone();
                self.cursor.advance();
                StmtKind::Foreign(text)
            }
            TokenKind::Directive(_) => return self.parse_stmt_directive(),
            _ => return self.parse_expr_statement(),
        };
        Ok(Some(Stmt { kind, pos }))
    }

    /// `case expr of label[, label]: stmt; .. [else ..] end`
    fn parse_case(&mut self, pos: myra_ir::Pos) -> CompileResult<Option<Stmt>> {
        self.cursor.advance();
        let scrutinee = self.expr_or_passthrough(&OF_TERMS)?;
        self.expect(&TokenKind::KwOf)?;
        let mut arms = Vec::new();
        let mut else_arm = None;
        loop {
            match self.cursor.kind() {
                TokenKind::KwEnd | TokenKind::Eof => break,
                TokenKind::KwElse => {
                    self.cursor.advance();
                    else_arm = Some(Block::new(self.parse_stmt_list(&[TokenKind::KwEnd])?));
                    break;
                }
                _ => {
                    let arm_pos = self.cursor.current().pos;
                    let mut labels = Vec::new();
                    loop {
                        labels.push(self.parse_case_label()?);
                        if !self.cursor.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::Colon)?;
                    let body = self.parse_branch()?;
                    self.cursor.eat(&TokenKind::Semicolon);
                    arms.push(CaseArm {
                        labels,
                        body,
                        pos: arm_pos,
                    });
                }
            }
        }
        self.expect(&TokenKind::KwEnd)?;
        Ok(Some(Stmt {
            kind: StmtKind::Case {
                scrutinee,
                arms,
                else_arm,
            },
            pos,
        }))
    }

    /// A case label: an expression or a `lo..hi` range.
    fn parse_case_label(&mut self) -> CompileResult<ExprId> {
        let pos = self.cursor.current().pos;
        let lo = self.expr_or_passthrough(&CASE_LABEL_TERMS)?;
        if self.cursor.eat(&TokenKind::DotDot) {
            let hi = self.expr_or_passthrough(&CASE_LABEL_TERMS)?;
            return Ok(self.module.arena.alloc(ExprKind::Range { lo, hi }, pos));
        }
        Ok(lo)
    }

    /// A `#directive` in statement position. Interpreted directives leave
    /// no statement; unrecognised ones pass through to end-of-line.
    fn parse_stmt_directive(&mut self) -> CompileResult<Option<Stmt>> {
        let token = self.cursor.advance();
        let TokenKind::Directive(name) = &token.kind else {
            return Ok(None);
        };
        let name = name.clone();
        let (arg, arg_end) = self.capture_rest_of_line(token.pos.line);
        if self.interpret_directive(&name, arg.trim(), token.pos)? {
            return Ok(None);
        }
        let end = arg_end.max(token.pos.span.end);
        let text = self.src[token.pos.span.start as usize..end as usize].to_string();
        Ok(Some(Stmt {
            kind: StmtKind::Foreign(text),
            pos: token.pos,
        }))
    }

    /// Assignment, call, or foreign passthrough.
    fn parse_expr_statement(&mut self) -> CompileResult<Option<Stmt>> {
        let pos = self.cursor.current().pos;

        // Fast triggers: constructs that can never continue as Myra.
        if matches!(self.cursor.kind(), TokenKind::Ident(_)) {
            let scope_op = matches!(self.cursor.peek(1), TokenKind::Colon)
                && matches!(self.cursor.peek(2), TokenKind::Colon);
            let increment = (matches!(self.cursor.peek(1), TokenKind::Plus)
                && matches!(self.cursor.peek(2), TokenKind::Plus))
                || (matches!(self.cursor.peek(1), TokenKind::Minus)
                    && matches!(self.cursor.peek(2), TokenKind::Minus));
            let template_call = matches!(self.cursor.peek(1), TokenKind::Lt)
                && matches!(self.cursor.peek(2), TokenKind::Ident(_))
                && matches!(self.cursor.peek(3), TokenKind::Gt)
                && matches!(self.cursor.peek(4), TokenKind::LParen);
            if scope_op || increment || template_call {
                let (text, fpos) = self.capture_foreign(&STMT_TERMS);
                return Ok(Some(Stmt {
                    kind: StmtKind::Foreign(text),
                    pos: fpos,
                }));
            }
        }

        let snap = self.snapshot();
        let parsed = self.speculative(|p| {
            let expr = p.parse_expression()?;
            if p.cursor.eat(&TokenKind::Assign) {
                let value = p.expr_or_passthrough(&RHS_TERMS)?;
                return Ok(Some(StmtKind::Assign {
                    target: expr,
                    value,
                }));
            }
            if matches!(p.module.arena.get(expr).kind, ExprKind::Call { .. }) {
                return Ok(Some(StmtKind::Call { call: expr }));
            }
            Ok(None)
        });

        match parsed {
            Some(Some(kind)) if STMT_TERMS.contains(self.cursor.kind()) || self.cursor.at_eof() => {
                Ok(Some(Stmt { kind, pos }))
            }
            _ => {
                self.restore(snap);
                let (text, fpos) = self.capture_foreign(&STMT_TERMS);
                if text.is_empty() {
                    // Nothing could be captured either; let the statement
                    // list's progress guard report and skip the token.
                    return Ok(None);
                }
                Ok(Some(Stmt {
                    kind: StmtKind::Foreign(text),
                    pos: fpos,
                }))
            }
        }
    }
}
