//! Recursive descent parser for Myra.
//!
//! One-token lookahead with arbitrary peek. Each production creates an
//! AST node carrying the position of its opening token and consumes its
//! terminator. At every decision point where the input does not match a
//! native production, the parser falls back to foreign passthrough: the
//! raw source slice is captured and will be emitted into the generated
//! C++ verbatim.

mod cursor;
mod decl;
mod directives;
mod expr;
mod passthrough;
mod stmt;


use cursor::Cursor;
use myra_diagnostic::{CompileResult, Diagnostic, DiagnosticBag, ErrorCode};
use myra_ir::{
    CompileOptions, DirectiveNode, ForeignBlockNode, Import, Module, ModuleKind, Pos, Token,
    TokenKind,
};
use tracing::debug;

/// Parse one translation unit into a module AST.
///
/// `src` must be the exact buffer the tokens were lexed from; passthrough
/// nodes slice it by byte offset. Interpreted directives mutate `options`.
pub fn parse_module(
    tokens: &[Token],
    src: &str,
    file: &str,
    options: &mut CompileOptions,
    bag: &mut DiagnosticBag,
) -> CompileResult<Module> {
    debug!(file, tokens = tokens.len(), "parsing module");
    let mut parser = Parser {
        cursor: Cursor::new(tokens),
        src,
        file,
        bag,
        options,
        module: Module::new(String::new(), ModuleKind::Executable, file.to_string(), Pos::DUMMY),
        quiet: 0,
        spec_failed: false,
    };
    parser.run()?;
    Ok(parser.module)
}

/// Parser state. Owns the module being built; everything else is borrowed
/// from the driver.
pub(crate) struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) src: &'a str,
    pub(crate) file: &'a str,
    bag: &'a mut DiagnosticBag,
    pub(crate) options: &'a mut CompileOptions,
    pub(crate) module: Module,
    /// Non-zero while speculatively parsing; suppresses diagnostics so a
    /// rewound attempt leaves no trace.
    quiet: u32,
    /// Set when a suppressed diagnostic fired during the current
    /// speculative parse; the attempt is then discarded.
    spec_failed: bool,
}

/// Rewind point for speculative parsing.
#[derive(Copy, Clone)]
pub(crate) struct Snapshot {
    cursor_pos: usize,
    arena_len: usize,
}

impl<'a> Parser<'a> {
    // ─── Diagnostics and recovery ─────────────────────────────────────

    /// Report a parse error. During a speculative parse the diagnostic is
    /// suppressed and the attempt is marked failed instead.
    pub(crate) fn error(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        pos: Pos,
    ) -> CompileResult<()> {
        if self.quiet > 0 {
            self.spec_failed = true;
            return Ok(());
        }
        self.bag
            .report(Diagnostic::error(code).with_message(message).at(self.file, pos))
    }

    /// Run `f` as a speculative parse: diagnostics are suppressed, and
    /// the result is `None` when any would-have-been diagnostic fired.
    /// The caller is responsible for rewinding via [`Parser::restore`].
    pub(crate) fn speculative<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> Option<T> {
        self.quiet += 1;
        let outer_failed = self.spec_failed;
        self.spec_failed = false;
        let result = f(self);
        let failed = self.spec_failed;
        self.spec_failed = outer_failed;
        self.quiet -= 1;
        match result {
            Ok(value) if !failed => Some(value),
            _ => None,
        }
    }

    /// Consume `kind` or report `E100` and leave the token in place so
    /// the next production gets a chance at it.
    pub(crate) fn expect(&mut self, kind: &TokenKind) -> CompileResult<()> {
        if self.cursor.eat(kind) {
            return Ok(());
        }
        let found = self.cursor.current();
        self.error(
            ErrorCode::E100,
            format!("expected {}, found {}", kind.describe(), found.kind.describe()),
            found.pos,
        )
    }

    /// Consume an identifier, returning its spelling. Reports `E103` and
    /// returns an empty name on mismatch.
    pub(crate) fn expect_ident(&mut self) -> CompileResult<String> {
        if let TokenKind::Ident(name) = self.cursor.kind() {
            let name = name.clone();
            self.cursor.advance();
            return Ok(name);
        }
        let found = self.cursor.current();
        self.error(
            ErrorCode::E103,
            format!("expected identifier, found {}", found.kind.describe()),
            found.pos,
        )?;
        Ok(String::new())
    }

    /// Panic-mode resync: skip to just past the next `;`, or stop before
    /// a declaration/block boundary.
    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.cursor.kind() {
                TokenKind::Eof
                | TokenKind::KwEnd
                | TokenKind::KwConst
                | TokenKind::KwType
                | TokenKind::KwVar
                | TokenKind::KwRoutine
                | TokenKind::KwMethod
                | TokenKind::KwImport
                | TokenKind::KwTest
                | TokenKind::KwBegin => return,
                TokenKind::Semicolon => {
                    self.cursor.advance();
                    return;
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor_pos: self.cursor.position(),
            arena_len: self.module.arena.len(),
        }
    }

    pub(crate) fn restore(&mut self, snap: Snapshot) {
        self.cursor.set_position(snap.cursor_pos);
        self.module.arena.truncate(snap.arena_len);
    }

    // ─── Module structure ─────────────────────────────────────────────

    fn run(&mut self) -> CompileResult<()> {
        // Directives and foreign blocks may precede the module header.
        self.parse_leading_trivia()?;
        self.parse_module_header()?;

        let mut body_pos: Option<Pos> = None;
        loop {
            match self.cursor.kind() {
                TokenKind::Eof => {
                    let pos = self.cursor.current().pos;
                    self.error(ErrorCode::E100, "expected 'end.' to close the module", pos)?;
                    break;
                }
                TokenKind::Directive(_) => self.parse_module_directive()?,
                TokenKind::ForeignBlock { .. } => self.parse_foreign_block(),
                TokenKind::KwImport => self.parse_imports()?,
                TokenKind::KwConst => self.parse_const_section()?,
                TokenKind::KwType => self.parse_type_section()?,
                TokenKind::KwVar => self.parse_var_section()?,
                TokenKind::KwRoutine => self.parse_routine(false)?,
                TokenKind::KwMethod => self.parse_routine(true)?,
                TokenKind::KwTest => self.parse_test_block()?,
                TokenKind::KwBegin => {
                    let pos = self.cursor.current().pos;
                    self.cursor.advance();
                    body_pos = Some(pos);
                    let stmts = self.parse_stmt_list(&[TokenKind::KwEnd])?;
                    self.module.body = Some(myra_ir::Block::new(stmts));
                    self.expect(&TokenKind::KwEnd)?;
                    self.expect(&TokenKind::Dot)?;
                    break;
                }
                TokenKind::KwEnd => {
                    self.cursor.advance();
                    self.expect(&TokenKind::Dot)?;
                    break;
                }
                _ => {
                    let found = self.cursor.current();
                    self.error(
                        ErrorCode::E101,
                        format!("unexpected {} at module level", found.kind.describe()),
                        found.pos,
                    )?;
                    self.synchronize();
                }
            }
        }

        // Trailing test tail blocks after `end.`.
        loop {
            match self.cursor.kind() {
                TokenKind::KwTest => self.parse_test_block()?,
                TokenKind::Directive(_) => self.parse_module_directive()?,
                _ => break,
            }
        }

        if !self.cursor.at_eof() {
            let found = self.cursor.current();
            self.error(
                ErrorCode::E101,
                format!("unexpected {} after module end", found.kind.describe()),
                found.pos,
            )?;
        }

        if self.module.kind != ModuleKind::Executable {
            if let Some(pos) = body_pos {
                self.error(
                    ErrorCode::E106,
                    "only executable modules may have a body block",
                    pos,
                )?;
            }
        }
        self.check_test_blocks()?;
        Ok(())
    }

    fn parse_leading_trivia(&mut self) -> CompileResult<()> {
        loop {
            match self.cursor.kind() {
                TokenKind::Directive(_) => self.parse_module_directive()?,
                TokenKind::ForeignBlock { .. } => self.parse_foreign_block(),
                _ => return Ok(()),
            }
        }
    }

    /// `module (exe|lib|dll) Ident ;`
    fn parse_module_header(&mut self) -> CompileResult<()> {
        let pos = self.cursor.current().pos;
        self.expect(&TokenKind::KwModule)?;
        let kind = match self.cursor.kind() {
            TokenKind::KwExe => {
                self.cursor.advance();
                ModuleKind::Executable
            }
            TokenKind::KwLib => {
                self.cursor.advance();
                ModuleKind::StaticLib
            }
            TokenKind::KwDll => {
                self.cursor.advance();
                ModuleKind::SharedLib
            }
            other => {
                let found_pos = self.cursor.current().pos;
                self.error(
                    ErrorCode::E105,
                    format!("expected 'exe', 'lib' or 'dll', found {}", other.describe()),
                    found_pos,
                )?;
                ModuleKind::Executable
            }
        };
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Semicolon)?;
        self.module.name = name;
        self.module.kind = kind;
        self.module.pos = pos;
        debug!(module = %self.module.name, ?kind, "parsed module header");
        Ok(())
    }

    /// `import A, B;`
    fn parse_imports(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        loop {
            let pos = self.cursor.current().pos;
            let name = self.expect_ident()?;
            if name.is_empty() {
                self.synchronize();
                return Ok(());
            }
            self.module.imports.push(Import { name, pos });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon)
    }

    /// A `#directive` at module level: interpret it, or keep it verbatim.
    fn parse_module_directive(&mut self) -> CompileResult<()> {
        let token = self.cursor.advance();
        let TokenKind::Directive(name) = &token.kind else {
            return Ok(());
        };
        let name = name.clone();
        let line = token.pos.line;
        let (arg, arg_end) = self.capture_rest_of_line(line);
        if self.interpret_directive(&name, arg.trim(), token.pos)? {
            return Ok(());
        }
        let end = arg_end.max(token.pos.span.end);
        let text = self.src[token.pos.span.start as usize..end as usize].to_string();
        self.module.directives.push(DirectiveNode {
            name,
            text,
            pos: token.pos,
        });
        Ok(())
    }

    /// A `#startcpp .. #endcpp` token at module level.
    fn parse_foreign_block(&mut self) {
        let token = self.cursor.advance();
        if let TokenKind::ForeignBlock { target, text } = &token.kind {
            self.module.foreign_blocks.push(ForeignBlockNode {
                target: target.unwrap_or(self.options.emit_target),
                text: text.clone(),
                pos: token.pos,
            });
        }
    }

    /// `test 'description'; .. end;`
    fn parse_test_block(&mut self) -> CompileResult<()> {
        let pos = self.cursor.current().pos;
        self.cursor.advance();
        let description = match self.cursor.kind() {
            TokenKind::Str(s) | TokenKind::Char(s) => {
                let s = s.clone();
                self.cursor.advance();
                s
            }
            other => {
                let found_pos = self.cursor.current().pos;
                self.error(
                    ErrorCode::E100,
                    format!("expected test description string, found {}", other.describe()),
                    found_pos,
                )?;
                String::new()
            }
        };
        self.expect(&TokenKind::Semicolon)?;
        let stmts = self.parse_stmt_list(&[TokenKind::KwEnd])?;
        self.expect(&TokenKind::KwEnd)?;
        self.expect(&TokenKind::Semicolon)?;
        self.module.tests.push(myra_ir::TestBlock {
            description,
            body: myra_ir::Block::new(stmts),
            pos,
        });
        Ok(())
    }

    /// Test blocks require the project-wide unit-test flag and are
    /// rejected in shared-library modules.
    fn check_test_blocks(&mut self) -> CompileResult<()> {
        if self.module.tests.is_empty() {
            return Ok(());
        }
        if self.module.kind == ModuleKind::SharedLib {
            let pos = self.module.tests[0].pos;
            return self.error(
                ErrorCode::E108,
                "test blocks are not allowed in shared-library modules",
                pos,
            );
        }
        if !self.options.unit_test_mode {
            let pos = self.module.tests[0].pos;
            return self.error(
                ErrorCode::E107,
                "test blocks require '#unittestmode on'",
                pos,
            );
        }
        Ok(())
    }
}
