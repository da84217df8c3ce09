//! Declaration productions: const/type/var sections, type forms, and
//! routine/method declarations.

use crate::passthrough::TerminatorSet;
use crate::Parser;
use myra_diagnostic::{CompileResult, ErrorCode};
use myra_ir::{
    Abi, CallingConvention, ConstDecl, FieldDecl, Param, ParamMode, Routine, RoutineFlags,
    TypeDecl, TypeForm, VarDecl,
};
use myra_ir::TokenKind;

static INIT_TERMS: TerminatorSet = TerminatorSet::new(&[TokenKind::Semicolon]);
static BOUND_TERMS: TerminatorSet =
    TerminatorSet::new(&[TokenKind::DotDot, TokenKind::RBracket, TokenKind::Semicolon]);

impl<'a> Parser<'a> {
    /// `const` section: `Name [: T] = expr;` items until the next section.
    pub(crate) fn parse_const_section(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        while let TokenKind::Ident(_) = self.cursor.kind() {
            let pos = self.cursor.current().pos;
            let name = self.expect_ident()?;
            let declared_type = if self.cursor.eat(&TokenKind::Colon) {
                Some(self.parse_type_form()?)
            } else {
                None
            };
            self.expect(&TokenKind::Eq)?;
            let value = self.expr_or_passthrough(&INIT_TERMS)?;
            self.expect(&TokenKind::Semicolon)?;
            self.module.consts.push(ConstDecl {
                name,
                declared_type,
                value,
                pos,
            });
        }
        Ok(())
    }

    /// `type` section: `Name = <form>;` items until the next section.
    pub(crate) fn parse_type_section(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        while let TokenKind::Ident(_) = self.cursor.kind() {
            let pos = self.cursor.current().pos;
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Eq)?;
            let form = self.parse_type_form()?;
            self.expect(&TokenKind::Semicolon)?;
            self.module.types.push(TypeDecl { name, form, pos });
        }
        Ok(())
    }

    /// `var` section at module level (public by default, `private;`
    /// trailing modifier opts out).
    pub(crate) fn parse_var_section(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        while let TokenKind::Ident(_) = self.cursor.kind() {
            let mut items = self.parse_var_items()?;
            let public = !self.eat_private_modifier();
            for item in &mut items {
                item.public = public;
            }
            self.module.vars.append(&mut items);
        }
        Ok(())
    }

    /// One `a, b: T [= init];` group.
    fn parse_var_items(&mut self) -> CompileResult<Vec<VarDecl>> {
        let mut names = Vec::new();
        loop {
            let pos = self.cursor.current().pos;
            let name = self.expect_ident()?;
            if name.is_empty() {
                self.synchronize();
                return Ok(Vec::new());
            }
            names.push((name, pos));
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Colon)?;
        let ty = self.parse_type_form()?;
        let init = if self.cursor.eat(&TokenKind::Eq) || self.cursor.eat(&TokenKind::Assign) {
            Some(self.expr_or_passthrough(&INIT_TERMS)?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon)?;
        Ok(names
            .into_iter()
            .map(|(name, pos)| VarDecl {
                name,
                ty: ty.clone(),
                init,
                public: true,
                pos,
            })
            .collect())
    }

    /// Consume a trailing `private;` (or no-op `public;`) modifier.
    /// Returns `true` when the item was marked private.
    fn eat_private_modifier(&mut self) -> bool {
        if self.cursor.at(&TokenKind::KwPrivate) {
            self.cursor.advance();
            self.cursor.eat(&TokenKind::Semicolon);
            return true;
        }
        if self.cursor.at(&TokenKind::KwPublic) {
            self.cursor.advance();
            self.cursor.eat(&TokenKind::Semicolon);
        }
        false
    }

    /// Any type position: a name, or one of the constructor forms.
    pub(crate) fn parse_type_form(&mut self) -> CompileResult<TypeForm> {
        match self.cursor.kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.cursor.advance();
                Ok(TypeForm::Named(name))
            }
            TokenKind::KwRecord => self.parse_record_form(),
            TokenKind::KwArray => self.parse_array_form(),
            TokenKind::KwPointer => {
                self.cursor.advance();
                if self.cursor.eat(&TokenKind::KwTo) {
                    let to = self.expect_ident()?;
                    Ok(TypeForm::Pointer { to: Some(to) })
                } else {
                    Ok(TypeForm::Pointer { to: None })
                }
            }
            TokenKind::KwSet => self.parse_set_form(),
            TokenKind::KwRoutine => self.parse_routine_type_form(),
            other => {
                let pos = self.cursor.current().pos;
                self.error(
                    ErrorCode::E104,
                    format!("expected a type, found {}", other.describe()),
                    pos,
                )?;
                Ok(TypeForm::Named(String::new()))
            }
        }
    }

    /// `record [( Parent )] fields end`
    fn parse_record_form(&mut self) -> CompileResult<TypeForm> {
        self.cursor.advance();
        let parent = if self.cursor.eat(&TokenKind::LParen) {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::RParen)?;
            Some(name)
        } else {
            None
        };
        let mut fields = Vec::new();
        while let TokenKind::Ident(_) = self.cursor.kind() {
            let mut names = Vec::new();
            loop {
                let pos = self.cursor.current().pos;
                let name = self.expect_ident()?;
                names.push((name, pos));
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type_form()?;
            self.expect(&TokenKind::Semicolon)?;
            for (name, pos) in names {
                fields.push(FieldDecl {
                    name,
                    ty: ty.clone(),
                    pos,
                });
            }
        }
        self.expect(&TokenKind::KwEnd)?;
        Ok(TypeForm::Record { parent, fields })
    }

    /// `array [lo..hi] of T`, `array [] of T`, or `array of T`.
    fn parse_array_form(&mut self) -> CompileResult<TypeForm> {
        self.cursor.advance();
        if self.cursor.eat(&TokenKind::KwOf) {
            let elem = self.parse_type_form()?;
            return Ok(TypeForm::ArrayDynamic { elem: Box::new(elem) });
        }
        self.expect(&TokenKind::LBracket)?;
        if self.cursor.eat(&TokenKind::RBracket) {
            self.expect(&TokenKind::KwOf)?;
            let elem = self.parse_type_form()?;
            return Ok(TypeForm::ArrayDynamic { elem: Box::new(elem) });
        }
        let lo = self.expr_or_passthrough(&BOUND_TERMS)?;
        self.expect(&TokenKind::DotDot)?;
        let hi = self.expr_or_passthrough(&BOUND_TERMS)?;
        self.expect(&TokenKind::RBracket)?;
        self.expect(&TokenKind::KwOf)?;
        let elem = self.parse_type_form()?;
        Ok(TypeForm::ArrayStatic {
            lo,
            hi,
            elem: Box::new(elem),
        })
    }

    /// `set of lo..hi` or `set of TypeName`.
    fn parse_set_form(&mut self) -> CompileResult<TypeForm> {
        self.cursor.advance();
        self.expect(&TokenKind::KwOf)?;
        // A bare type name not followed by `..` is `set of T`.
        if let TokenKind::Ident(name) = self.cursor.kind() {
            if !matches!(self.cursor.peek(1), TokenKind::DotDot) {
                let name = name.clone();
                self.cursor.advance();
                return Ok(TypeForm::SetOf { name });
            }
        }
        let lo = self.expr_or_passthrough(&BOUND_TERMS)?;
        self.expect(&TokenKind::DotDot)?;
        let hi = self.expr_or_passthrough(&BOUND_TERMS)?;
        Ok(TypeForm::SetRange { lo, hi })
    }

    /// `routine (params) [: T]` with an optional `; cdecl`/`; stdcall`.
    fn parse_routine_type_form(&mut self) -> CompileResult<TypeForm> {
        self.cursor.advance();
        let (params, _variadic) = self.parse_params()?;
        let ret = if self.cursor.eat(&TokenKind::Colon) {
            Some(Box::new(self.parse_type_form()?))
        } else {
            None
        };
        let mut convention = CallingConvention::Default;
        if self.cursor.at(&TokenKind::Semicolon) {
            match self.cursor.peek(1) {
                TokenKind::KwCdecl => {
                    self.cursor.advance();
                    self.cursor.advance();
                    convention = CallingConvention::Cdecl;
                }
                TokenKind::KwStdcall => {
                    self.cursor.advance();
                    self.cursor.advance();
                    convention = CallingConvention::Stdcall;
                }
                _ => {}
            }
        }
        Ok(TypeForm::RoutineType {
            params,
            ret,
            convention,
        })
    }

    /// `( [var|const] a, b: T; ... [...] )`. Returns the parameters and
    /// whether a `...` variadic marker closed the list.
    pub(crate) fn parse_params(&mut self) -> CompileResult<(Vec<Param>, bool)> {
        let mut params = Vec::new();
        let mut variadic = false;
        if !self.cursor.eat(&TokenKind::LParen) {
            return Ok((params, variadic));
        }
        if self.cursor.eat(&TokenKind::RParen) {
            return Ok((params, variadic));
        }
        loop {
            if self.cursor.eat(&TokenKind::Ellipsis) {
                variadic = true;
                break;
            }
            let mode = if self.cursor.eat(&TokenKind::KwVar) {
                ParamMode::Var
            } else if self.cursor.eat(&TokenKind::KwConst) {
                ParamMode::Const
            } else {
                ParamMode::Value
            };
            let mut names = Vec::new();
            loop {
                let pos = self.cursor.current().pos;
                let name = self.expect_ident()?;
                names.push((name, pos));
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type_form()?;
            for (name, pos) in names {
                params.push(Param {
                    name,
                    mode,
                    ty: ty.clone(),
                    pos,
                });
            }
            if !self.cursor.eat(&TokenKind::Semicolon) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok((params, variadic))
    }

    /// `routine Name(params) [: T]; [modifiers] [var locals] begin .. end;`
    ///
    /// The `method` keyword parses identically; the analyzer enforces the
    /// `var Self` receiver shape for it.
    pub(crate) fn parse_routine(&mut self, declared_method: bool) -> CompileResult<()> {
        let pos = self.cursor.current().pos;
        self.cursor.advance();
        let name = self.expect_ident()?;
        if name.is_empty() {
            self.synchronize();
            return Ok(());
        }
        let (params, variadic) = self.parse_params()?;
        let ret = if self.cursor.eat(&TokenKind::Colon) {
            Some(self.parse_type_form()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon)?;

        let mut flags = RoutineFlags::PUBLIC;
        if variadic {
            flags |= RoutineFlags::VARIADIC;
        }
        if self.options.abi == Abi::C {
            flags |= RoutineFlags::ABI_C;
        }
        let mut convention = CallingConvention::Default;
        let mut external_lib = None;

        loop {
            match self.cursor.kind() {
                TokenKind::KwPublic => {
                    self.cursor.advance();
                    self.expect(&TokenKind::Semicolon)?;
                }
                TokenKind::KwPrivate => {
                    self.cursor.advance();
                    self.expect(&TokenKind::Semicolon)?;
                    flags -= RoutineFlags::PUBLIC;
                }
                TokenKind::KwCdecl => {
                    self.cursor.advance();
                    self.expect(&TokenKind::Semicolon)?;
                    convention = CallingConvention::Cdecl;
                }
                TokenKind::KwStdcall => {
                    self.cursor.advance();
                    self.expect(&TokenKind::Semicolon)?;
                    convention = CallingConvention::Stdcall;
                }
                TokenKind::KwExternal => {
                    self.cursor.advance();
                    flags |= RoutineFlags::EXTERNAL;
                    if let TokenKind::Str(lib) | TokenKind::Char(lib) = self.cursor.kind() {
                        external_lib = Some(lib.clone());
                        self.cursor.advance();
                    }
                    self.expect(&TokenKind::Semicolon)?;
                }
                _ => break,
            }
        }

        let mut locals = Vec::new();
        let mut body = None;
        if !flags.contains(RoutineFlags::EXTERNAL) {
            if self.cursor.eat(&TokenKind::KwVar) {
                while let TokenKind::Ident(_) = self.cursor.kind() {
                    let mut items = self.parse_var_items()?;
                    locals.append(&mut items);
                }
            }
            if self.cursor.at(&TokenKind::KwBegin) {
                self.cursor.advance();
                let stmts = self.parse_stmt_list(&[TokenKind::KwEnd])?;
                self.expect(&TokenKind::KwEnd)?;
                self.expect(&TokenKind::Semicolon)?;
                body = Some(myra_ir::Block::new(stmts));
            } else {
                let found = self.cursor.current();
                self.error(
                    ErrorCode::E102,
                    format!("expected routine body, found {}", found.kind.describe()),
                    found.pos,
                )?;
                self.synchronize();
            }
        }

        self.module.routines.push(Routine {
            name,
            params,
            ret,
            locals,
            body,
            flags,
            convention,
            external_lib,
            declared_method,
            bound_type: None,
            pos,
        });
        Ok(())
    }
}
