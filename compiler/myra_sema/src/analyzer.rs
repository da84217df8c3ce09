//! Two-phase semantic analysis of a module AST.
//!
//! Phase 1 registers declarations: imports, types (installed before their
//! fields resolve, so self-referential pointers and mutually recursive
//! records work), constants, variables, and routines with method-binding
//! detection. Phase 2 walks routine/test/module bodies, checks statement
//! contracts, classifies call receivers, and annotates every expression
//! with its resolved type. A `None` annotation marks a foreign expression
//! that is never type-checked.

use crate::compat::{arithmetic_result, compatible};
use crate::symbol::{BuiltinType, RoutineInfo, Symbol, SymbolId, SymbolKind, TypeDef, TypeInfo};
use crate::SymbolTable;
use myra_diagnostic::{CompileResult, Diagnostic, DiagnosticBag, ErrorCode};
use myra_ir::{
    BinOp, Block, CallBinding, CompileOptions, ExprArena, ExprId, ExprKind, Module, ParamMode,
    Pos, Routine, RoutineFlags, Stmt, StmtKind, TypeForm, TypeId, UnOp,
};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Analyze a module in place: installs its symbols into `table` and
/// annotates its AST.
pub fn analyze(
    module: &mut Module,
    table: &mut SymbolTable,
    options: &CompileOptions,
    bag: &mut DiagnosticBag,
) -> CompileResult<()> {
    debug!(module = %module.name, "semantic analysis");
    let mut analyzer = Analyzer {
        table,
        bag,
        _options: options,
        file: module.file.clone(),
        current_routine: None,
    };
    analyzer.run(module)
}

struct Analyzer<'a> {
    table: &'a mut SymbolTable,
    bag: &'a mut DiagnosticBag,
    _options: &'a CompileOptions,
    file: String,
    current_routine: Option<SymbolId>,
}

impl<'a> Analyzer<'a> {
    fn error(&mut self, code: ErrorCode, message: impl Into<String>, pos: Pos) -> CompileResult<()> {
        self.bag
            .report(Diagnostic::error(code).with_message(message).at(self.file.clone(), pos))
    }

    fn run(&mut self, module: &mut Module) -> CompileResult<()> {
        self.table.enter_module_scope(&module.name);
        self.table
            .set_imports(module.imports.iter().map(|i| i.name.clone()).collect());

        let routine_ids = self.register_declarations(module)?;
        self.analyze_bodies(module, &routine_ids)?;

        self.table.leave_module_scope();
        Ok(())
    }

    // ─── Phase 1: declaration registration ────────────────────────────

    fn register_declarations(&mut self, module: &mut Module) -> CompileResult<Vec<SymbolId>> {
        // Types: install shells first so fields and pointers may refer to
        // any type of the module, including the one being defined.
        let types = std::mem::take(&mut module.types);
        let mut type_ids = Vec::with_capacity(types.len());
        for decl in &types {
            if self.table.lookup_local(&decl.name).is_some() {
                self.error(
                    ErrorCode::E200,
                    format!("duplicate identifier '{}'", decl.name),
                    decl.pos,
                )?;
            }
            let mut symbol = Symbol::new(decl.name.clone(), SymbolKind::Type).public();
            symbol.type_info = Some(TypeInfo::new(TypeDef::Record));
            type_ids.push(self.table.declare(symbol));
        }
        for (decl, &id) in types.iter().zip(&type_ids) {
            self.resolve_type_decl(&module.arena, decl, id)?;
        }
        self.check_inheritance_cycles(&types, &type_ids)?;
        module.types = types;

        // Constants.
        let consts = std::mem::take(&mut module.consts);
        for decl in &consts {
            let value_ty = self.analyze_expr(&mut module.arena, decl.value)?;
            let declared = match &decl.declared_type {
                Some(form) => self.resolve_type_form(&module.arena, form, decl.pos)?,
                None => None,
            };
            if declared.is_some() && !compatible(self.table, declared, value_ty) {
                self.type_mismatch(declared, value_ty, decl.pos)?;
            }
            if self.table.lookup_local(&decl.name).is_some() {
                self.error(
                    ErrorCode::E200,
                    format!("duplicate identifier '{}'", decl.name),
                    decl.pos,
                )?;
            }
            let mut symbol = Symbol::new(decl.name.clone(), SymbolKind::Constant)
                .with_ty(declared.or(value_ty))
                .public();
            symbol.const_value = self.eval_const_int(&module.arena, decl.value);
            self.table.declare(symbol);
        }
        module.consts = consts;

        // Variables.
        let vars = std::mem::take(&mut module.vars);
        for decl in &vars {
            let ty = self.resolve_type_form(&module.arena, &decl.ty, decl.pos)?;
            if let Some(init) = decl.init {
                let init_ty = self.analyze_expr(&mut module.arena, init)?;
                if !compatible(self.table, ty, init_ty) {
                    self.type_mismatch(ty, init_ty, decl.pos)?;
                }
            }
            if self.table.lookup_local(&decl.name).is_some() {
                self.error(
                    ErrorCode::E200,
                    format!("duplicate identifier '{}'", decl.name),
                    decl.pos,
                )?;
            }
            let mut symbol = Symbol::new(decl.name.clone(), SymbolKind::Variable).with_ty(ty);
            symbol.public = decl.public;
            self.table.declare(symbol);
        }
        module.vars = vars;

        // Routines and methods.
        let mut routines = std::mem::take(&mut module.routines);
        let mut routine_ids = Vec::with_capacity(routines.len());
        for routine in &mut routines {
            routine_ids.push(self.register_routine(&module.arena, routine)?);
        }
        module.routines = routines;
        Ok(routine_ids)
    }

    fn resolve_type_decl(
        &mut self,
        arena: &ExprArena,
        decl: &myra_ir::TypeDecl,
        id: SymbolId,
    ) -> CompileResult<()> {
        match &decl.form {
            TypeForm::Record { parent, fields } => {
                let base = match parent {
                    Some(name) => self.resolve_type_name(name, decl.pos)?,
                    None => None,
                };
                let mut field_ids = Vec::with_capacity(fields.len());
                for field in fields {
                    let field_ty = self.resolve_type_form(arena, &field.ty, field.pos)?;
                    let symbol =
                        Symbol::new(field.name.clone(), SymbolKind::Field).with_ty(field_ty);
                    field_ids.push(self.table.add(symbol));
                }
                if let Some(info) = self.table.symbol_mut(id).type_info.as_mut() {
                    info.def = TypeDef::Record;
                    info.base = base;
                    info.fields = field_ids;
                }
            }
            TypeForm::Named(name) => {
                let of = self.resolve_type_name(name, decl.pos)?;
                if let Some(info) = self.table.symbol_mut(id).type_info.as_mut() {
                    info.def = match of {
                        Some(of) => TypeDef::Alias { of },
                        // Unknown alias target was already reported; keep
                        // an untyped pointer shape so lookups stay sane.
                        None => TypeDef::Pointer { to: None },
                    };
                }
            }
            form => {
                let resolved = self.resolve_type_form(arena, form, decl.pos)?;
                let def = resolved
                    .and_then(|t| self.table.type_symbol(t).type_info().map(|i| i.def.clone()))
                    .unwrap_or(TypeDef::Pointer { to: None });
                if let Some(info) = self.table.symbol_mut(id).type_info.as_mut() {
                    info.def = def;
                }
            }
        }
        Ok(())
    }

    /// Resolve a syntactic type form to a type symbol, creating anonymous
    /// type symbols for inline composite forms.
    fn resolve_type_form(
        &mut self,
        arena: &ExprArena,
        form: &TypeForm,
        pos: Pos,
    ) -> CompileResult<Option<TypeId>> {
        match form {
            TypeForm::Named(name) => self.resolve_type_name(name, pos),
            TypeForm::Record { .. } => {
                // Inline record forms only appear in `type` declarations;
                // anywhere else they have no name to emit.
                self.error(ErrorCode::E104, "record types must be declared in a 'type' section", pos)?;
                Ok(None)
            }
            TypeForm::Pointer { to } => {
                let to = match to {
                    Some(name) => self.resolve_type_name(name, pos)?,
                    None => None,
                };
                let mut symbol = Symbol::new(String::new(), SymbolKind::Type);
                symbol.type_info = Some(TypeInfo::new(TypeDef::Pointer { to }));
                Ok(Some(self.table.add(symbol).as_type()))
            }
            TypeForm::SetRange { lo, hi } => {
                let lo = self.require_const_int(arena, *lo, pos)?.unwrap_or(0);
                let hi = self.require_const_int(arena, *hi, pos)?.unwrap_or(63);
                let mut symbol = Symbol::new(String::new(), SymbolKind::Type);
                symbol.type_info = Some(TypeInfo::new(TypeDef::SetRange { lo, hi }));
                Ok(Some(self.table.add(symbol).as_type()))
            }
            TypeForm::SetOf { name } => {
                self.resolve_type_name(name, pos)?;
                let mut symbol = Symbol::new(String::new(), SymbolKind::Type);
                symbol.type_info = Some(TypeInfo::new(TypeDef::SetRange { lo: 0, hi: 63 }));
                Ok(Some(self.table.add(symbol).as_type()))
            }
            TypeForm::ArrayStatic { lo, hi, elem } => {
                let lo = self.require_const_int(arena, *lo, pos)?.unwrap_or(0);
                let hi = self.require_const_int(arena, *hi, pos)?.unwrap_or(0);
                let elem = self
                    .resolve_type_form(arena, elem, pos)?
                    .unwrap_or_else(|| self.table.builtin(BuiltinType::Integer));
                let mut symbol = Symbol::new(String::new(), SymbolKind::Type);
                symbol.type_info = Some(TypeInfo::new(TypeDef::ArrayStatic { lo, hi, elem }));
                Ok(Some(self.table.add(symbol).as_type()))
            }
            TypeForm::ArrayDynamic { elem } => {
                let elem = self
                    .resolve_type_form(arena, elem, pos)?
                    .unwrap_or_else(|| self.table.builtin(BuiltinType::Integer));
                let mut symbol = Symbol::new(String::new(), SymbolKind::Type);
                symbol.type_info = Some(TypeInfo::new(TypeDef::ArrayDynamic { elem }));
                Ok(Some(self.table.add(symbol).as_type()))
            }
            TypeForm::RoutineType {
                params,
                ret,
                convention,
            } => {
                let mut param_tys = Vec::with_capacity(params.len());
                for param in params {
                    let ty = self
                        .resolve_type_form(arena, &param.ty, param.pos)?
                        .unwrap_or_else(|| self.table.builtin(BuiltinType::Integer));
                    param_tys.push((param.mode, ty));
                }
                let ret = match ret {
                    Some(form) => self.resolve_type_form(arena, form, pos)?,
                    None => None,
                };
                let mut symbol = Symbol::new(String::new(), SymbolKind::Type);
                symbol.type_info = Some(TypeInfo::new(TypeDef::RoutineType {
                    params: param_tys,
                    ret,
                    convention: *convention,
                }));
                Ok(Some(self.table.add(symbol).as_type()))
            }
        }
    }

    fn resolve_type_name(&mut self, name: &str, pos: Pos) -> CompileResult<Option<TypeId>> {
        if name.is_empty() {
            // The parser already reported the malformed type.
            return Ok(None);
        }
        let found = self
            .table
            .lookup_all(name)
            .into_iter()
            .find(|&id| self.table.symbol(id).kind == SymbolKind::Type);
        match found {
            Some(id) => Ok(Some(id.as_type())),
            None => {
                self.error(ErrorCode::E201, format!("unknown type '{name}'"), pos)?;
                Ok(None)
            }
        }
    }

    /// Detect cycles along `BaseType` edges and sever them.
    fn check_inheritance_cycles(
        &mut self,
        types: &[myra_ir::TypeDecl],
        type_ids: &[SymbolId],
    ) -> CompileResult<()> {
        for (decl, &id) in types.iter().zip(type_ids) {
            let mut seen = FxHashSet::default();
            let mut current = Some(id.as_type());
            while let Some(ty) = current {
                if !seen.insert(ty) {
                    self.error(
                        ErrorCode::E218,
                        format!("record inheritance cycle involving '{}'", decl.name),
                        decl.pos,
                    )?;
                    if let Some(info) = self.table.symbol_mut(id).type_info.as_mut() {
                        info.base = None;
                    }
                    break;
                }
                current = self.table.type_symbol(ty).type_info().and_then(|i| i.base);
            }
        }
        Ok(())
    }

    /// Register a routine symbol, detecting method binding.
    ///
    /// A routine is a method when its first parameter is pass-by-reference
    /// and named `Self` (legacy spelling `ASelf` accepted). The `method`
    /// keyword makes the shape mandatory.
    fn register_routine(
        &mut self,
        arena: &ExprArena,
        routine: &mut Routine,
    ) -> CompileResult<SymbolId> {
        let mut param_ids = Vec::with_capacity(routine.params.len());
        for param in &routine.params {
            let ty = self.resolve_type_form(arena, &param.ty, param.pos)?;
            let mut symbol = Symbol::new(param.name.clone(), SymbolKind::Parameter).with_ty(ty);
            symbol.mode = param.mode;
            param_ids.push(self.table.add(symbol));
        }
        let ret = match &routine.ret {
            Some(form) => self.resolve_type_form(arena, form, routine.pos)?,
            None => None,
        };

        let receiver_shape = routine.params.first().is_some_and(|p| {
            p.mode == ParamMode::Var
                && (p.name.eq_ignore_ascii_case("self") || p.name.eq_ignore_ascii_case("aself"))
        });
        let mut bound_to = None;
        if receiver_shape {
            match param_ids.first().and_then(|&p| self.table.symbol(p).ty) {
                Some(receiver_ty) => {
                    routine.flags |= RoutineFlags::METHOD;
                    routine.bound_type = Some(self.table.type_name(receiver_ty).to_string());
                    bound_to = Some(receiver_ty);
                }
                None if routine.declared_method => {
                    self.error(
                        ErrorCode::E211,
                        format!("cannot resolve receiver type of method '{}'", routine.name),
                        routine.pos,
                    )?;
                }
                None => {}
            }
        } else if routine.declared_method {
            self.error(
                ErrorCode::E210,
                format!(
                    "method '{}' must take 'var Self: <Type>' as its first parameter",
                    routine.name
                ),
                routine.pos,
            )?;
        }

        let mut symbol = Symbol::new(routine.name.clone(), SymbolKind::Routine).with_ty(ret);
        symbol.public = routine.is_public();
        symbol.routine_info = Some(RoutineInfo {
            params: param_ids,
            ret,
            flags: routine.flags,
            convention: routine.convention,
            bound_to,
            external_lib: routine.external_lib.clone(),
        });
        let id = self.table.declare(symbol);
        if let Some(receiver) = bound_to {
            if let Some(info) = self
                .table
                .symbol_mut(SymbolId::from_type(receiver))
                .type_info
                .as_mut()
            {
                info.methods.push(id);
            }
        }
        Ok(id)
    }

    // ─── Phase 2: bodies ──────────────────────────────────────────────

    fn analyze_bodies(&mut self, module: &mut Module, routine_ids: &[SymbolId]) -> CompileResult<()> {
        let mut routines = std::mem::take(&mut module.routines);
        for (routine, &id) in routines.iter_mut().zip(routine_ids) {
            if let Some(mut body) = routine.body.take() {
                self.table.push_scope();
                let params = self
                    .table
                    .symbol(id)
                    .routine_info()
                    .map(|info| info.params.clone())
                    .unwrap_or_default();
                for param in params {
                    self.table.bind(param);
                }
                self.declare_locals(&mut module.arena, &routine.locals)?;
                self.current_routine = Some(id);
                self.analyze_block(&mut module.arena, &mut body)?;
                self.current_routine = None;
                self.table.pop_scope();
                routine.body = Some(body);
            }
        }
        module.routines = routines;

        if let Some(mut body) = module.body.take() {
            self.analyze_block(&mut module.arena, &mut body)?;
            module.body = Some(body);
        }

        let mut tests = std::mem::take(&mut module.tests);
        for test in &mut tests {
            self.table.push_scope();
            self.analyze_block(&mut module.arena, &mut test.body)?;
            self.table.pop_scope();
        }
        module.tests = tests;
        Ok(())
    }

    fn declare_locals(
        &mut self,
        arena: &mut ExprArena,
        locals: &[myra_ir::VarDecl],
    ) -> CompileResult<()> {
        for local in locals {
            let ty = self.resolve_type_form(arena, &local.ty, local.pos)?;
            if let Some(init) = local.init {
                let init_ty = self.analyze_expr(arena, init)?;
                if !compatible(self.table, ty, init_ty) {
                    self.type_mismatch(ty, init_ty, local.pos)?;
                }
            }
            if self.table.lookup_local(&local.name).is_some() {
                self.error(
                    ErrorCode::E200,
                    format!("duplicate identifier '{}'", local.name),
                    local.pos,
                )?;
            }
            self.table
                .declare(Symbol::new(local.name.clone(), SymbolKind::Variable).with_ty(ty));
        }
        Ok(())
    }

    fn analyze_block(&mut self, arena: &mut ExprArena, block: &mut Block) -> CompileResult<()> {
        for stmt in &mut block.stmts {
            self.analyze_stmt(arena, stmt)?;
        }
        Ok(())
    }

    fn analyze_stmt(&mut self, arena: &mut ExprArena, stmt: &mut Stmt) -> CompileResult<()> {
        let pos = stmt.pos;
        match &mut stmt.kind {
            StmtKind::Block(block) => {
                let mut block = std::mem::take(block);
                self.analyze_block(arena, &mut block)?;
                stmt.kind = StmtKind::Block(block);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = *cond;
                let mut then_branch = std::mem::take(then_branch);
                let mut else_branch = else_branch.take();
                self.check_boolean(arena, cond, pos)?;
                self.analyze_block(arena, &mut then_branch)?;
                if let Some(block) = else_branch.as_mut() {
                    self.analyze_block(arena, block)?;
                }
                stmt.kind = StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                };
            }
            StmtKind::While { cond, body } => {
                let cond = *cond;
                let mut body = std::mem::take(body);
                self.check_boolean(arena, cond, pos)?;
                self.analyze_block(arena, &mut body)?;
                stmt.kind = StmtKind::While { cond, body };
            }
            StmtKind::Repeat { body, cond } => {
                let cond = *cond;
                let mut body = std::mem::take(body);
                self.analyze_block(arena, &mut body)?;
                self.check_boolean(arena, cond, pos)?;
                stmt.kind = StmtKind::Repeat { body, cond };
            }
            StmtKind::For {
                var,
                start,
                end,
                descending,
                body,
            } => {
                let (var, start, end, descending) = (var.clone(), *start, *end, *descending);
                let mut body = std::mem::take(body);
                if self.table.lookup(&var).is_none() {
                    self.error(
                        ErrorCode::E206,
                        format!("for-loop variable '{var}' is not declared"),
                        pos,
                    )?;
                }
                for bound in [start, end] {
                    let ty = self.analyze_expr(arena, bound)?;
                    if let Some(ty) = ty {
                        if !self.table.is_builtin(ty, BuiltinType::Integer) {
                            self.error(
                                ErrorCode::E205,
                                format!(
                                    "for-loop bound must be Integer, found '{}'",
                                    self.table.type_name(ty)
                                ),
                                pos,
                            )?;
                        }
                    }
                }
                self.analyze_block(arena, &mut body)?;
                stmt.kind = StmtKind::For {
                    var,
                    start,
                    end,
                    descending,
                    body,
                };
            }
            StmtKind::Case {
                scrutinee,
                arms,
                else_arm,
            } => {
                let scrutinee = *scrutinee;
                let mut arms = std::mem::take(arms);
                let mut else_arm = else_arm.take();
                self.analyze_expr(arena, scrutinee)?;
                for arm in &mut arms {
                    for &label in &arm.labels {
                        self.analyze_expr(arena, label)?;
                    }
                    self.analyze_block(arena, &mut arm.body)?;
                }
                if let Some(block) = else_arm.as_mut() {
                    self.analyze_block(arena, block)?;
                }
                stmt.kind = StmtKind::Case {
                    scrutinee,
                    arms,
                    else_arm,
                };
            }
            StmtKind::Return { value } => {
                let value = *value;
                let ret = self
                    .current_routine
                    .and_then(|id| self.table.symbol(id).routine_info())
                    .and_then(|info| info.ret);
                match value {
                    Some(expr) => {
                        let ty = self.analyze_expr(arena, expr)?;
                        if ret.is_none() {
                            self.error(
                                ErrorCode::E207,
                                "return with a value in a routine without a return type",
                                pos,
                            )?;
                        } else if !compatible(self.table, ret, ty) {
                            self.error(
                                ErrorCode::E209,
                                format!(
                                    "return type mismatch: expected '{}', found '{}'",
                                    self.describe(ret),
                                    self.describe(ty)
                                ),
                                pos,
                            )?;
                        }
                    }
                    None => {
                        if ret.is_some() {
                            self.error(ErrorCode::E208, "return value expected", pos)?;
                        }
                    }
                }
            }
            StmtKind::Assign { target, value } => {
                let (target, value) = (*target, *value);
                let target_ty = self.analyze_expr(arena, target)?;
                let value_ty = self.analyze_expr(arena, value)?;
                if !compatible(self.table, target_ty, value_ty) {
                    self.type_mismatch(target_ty, value_ty, pos)?;
                }
                // A character value assigned to a string re-annotates as
                // String so the emitter picks the string literal form.
                let is = |ty: Option<TypeId>, b| ty.is_some_and(|t| self.table.is_builtin(t, b));
                if is(target_ty, BuiltinType::String) && is(value_ty, BuiltinType::Char) {
                    arena.set_ty(value, Some(self.table.builtin(BuiltinType::String)));
                }
            }
            StmtKind::Call { call } => {
                let call = *call;
                self.analyze_expr(arena, call)?;
            }
            StmtKind::New { target, as_type } => {
                let target = *target;
                let as_type = as_type.clone();
                let target_ty = self.analyze_expr(arena, target)?;
                match as_type {
                    Some(name) => {
                        self.resolve_type_name(&name, pos)?;
                    }
                    None => {
                        let pointee = target_ty.map(|t| self.table.resolve_alias(t)).and_then(|t| {
                            self.table.type_symbol(t).type_info().and_then(|info| {
                                match info.def {
                                    TypeDef::Pointer { to } => to,
                                    _ => None,
                                }
                            })
                        });
                        if pointee.is_none() {
                            self.error(
                                ErrorCode::E400,
                                "cannot infer the allocation type for 'new'; use 'new(p as T)'",
                                pos,
                            )?;
                        }
                    }
                }
            }
            StmtKind::Dispose { target } => {
                let target = *target;
                self.analyze_expr(arena, target)?;
            }
            StmtKind::SetLength { target, length } => {
                let (target, length) = (*target, *length);
                self.analyze_expr(arena, target)?;
                self.analyze_expr(arena, length)?;
            }
            StmtKind::Try {
                body,
                except,
                finally,
            } => {
                let mut body = std::mem::take(body);
                let mut except = except.take();
                let mut finally = finally.take();
                self.analyze_block(arena, &mut body)?;
                if let Some(block) = except.as_mut() {
                    self.analyze_block(arena, block)?;
                }
                if let Some(block) = finally.as_mut() {
                    self.analyze_block(arena, block)?;
                }
                stmt.kind = StmtKind::Try {
                    body,
                    except,
                    finally,
                };
            }
            StmtKind::Inherited {
                name,
                args,
                resolved_parent,
            } => {
                let args = args.clone();
                let name = name.clone();
                let routine = self.current_routine;
                let info = routine.and_then(|id| self.table.symbol(id).routine_info().cloned());
                let is_method = info
                    .as_ref()
                    .is_some_and(|i| i.flags.contains(RoutineFlags::METHOD));
                if !is_method {
                    self.error(ErrorCode::E212, "'inherited' is only valid inside a method", pos)?;
                } else {
                    let bound = info.as_ref().and_then(|i| i.bound_to);
                    let base = bound.and_then(|t| {
                        self.table
                            .type_symbol(self.table.resolve_alias(t))
                            .type_info()
                            .and_then(|i| i.base)
                    });
                    match base {
                        Some(base) => {
                            *resolved_parent = Some(self.table.type_name(base).to_string());
                            let method_name = name.clone().unwrap_or_else(|| {
                                routine
                                    .map(|id| self.table.symbol(id).name.clone())
                                    .unwrap_or_default()
                            });
                            if self.table.find_method(base, &method_name).is_none() {
                                self.error(
                                    ErrorCode::E202,
                                    format!(
                                        "no method '{}' on parent type '{}'",
                                        method_name,
                                        self.table.type_name(base)
                                    ),
                                    pos,
                                )?;
                            }
                        }
                        None => {
                            self.error(
                                ErrorCode::E213,
                                "'inherited' requires the receiver type to have a parent",
                                pos,
                            )?;
                        }
                    }
                }
                for arg in args {
                    self.analyze_expr(arena, arg)?;
                }
            }
            StmtKind::Foreign(_) => {}
        }
        Ok(())
    }

    fn check_boolean(&mut self, arena: &mut ExprArena, cond: ExprId, pos: Pos) -> CompileResult<()> {
        let ty = self.analyze_expr(arena, cond)?;
        if let Some(ty) = ty {
            if !self.table.is_builtin(ty, BuiltinType::Boolean) {
                self.error(
                    ErrorCode::E204,
                    format!(
                        "condition must be Boolean, found '{}'",
                        self.table.type_name(ty)
                    ),
                    pos,
                )?;
            }
        }
        Ok(())
    }

    fn describe(&self, ty: Option<TypeId>) -> String {
        match ty {
            Some(ty) => {
                let name = self.table.type_name(ty);
                if name.is_empty() {
                    "<anonymous>".to_string()
                } else {
                    name.to_string()
                }
            }
            None => "<foreign>".to_string(),
        }
    }

    fn type_mismatch(
        &mut self,
        expected: Option<TypeId>,
        found: Option<TypeId>,
        pos: Pos,
    ) -> CompileResult<()> {
        self.error(
            ErrorCode::E203,
            format!(
                "type mismatch: expected '{}', found '{}'",
                self.describe(expected),
                self.describe(found)
            ),
            pos,
        )
    }

    // ─── Expression typing ────────────────────────────────────────────

    /// Annotate `id` (and its children) with resolved types; returns the
    /// type, `None` meaning foreign / unchecked.
    fn analyze_expr(
        &mut self,
        arena: &mut ExprArena,
        id: ExprId,
    ) -> CompileResult<Option<TypeId>> {
        let kind = arena.get(id).kind.clone();
        let pos = arena.get(id).pos;
        let ty = match kind {
            ExprKind::Int(_) => Some(self.table.builtin(BuiltinType::Integer)),
            ExprKind::Float(_) => Some(self.table.builtin(BuiltinType::Float)),
            ExprKind::Str(_) => Some(self.table.builtin(BuiltinType::String)),
            ExprKind::Char(_) => Some(self.table.builtin(BuiltinType::Char)),
            ExprKind::WideStr(_) => Some(self.table.builtin(BuiltinType::String)),
            ExprKind::WideChar(_) => Some(self.table.builtin(BuiltinType::Char)),
            ExprKind::Bool(_) => Some(self.table.builtin(BuiltinType::Boolean)),
            ExprKind::Nil => Some(self.table.builtin(BuiltinType::Pointer)),
            ExprKind::SetLit(elements) => {
                for element in elements {
                    self.analyze_expr(arena, element)?;
                }
                Some(self.table.builtin(BuiltinType::Set))
            }
            ExprKind::Range { lo, hi } => {
                let lo_ty = self.analyze_expr(arena, lo)?;
                self.analyze_expr(arena, hi)?;
                lo_ty
            }
            ExprKind::Ident(name) => self
                .table
                .lookup(&name)
                .and_then(|sym| match self.table.symbol(sym).kind {
                    SymbolKind::Constant
                    | SymbolKind::Variable
                    | SymbolKind::Parameter
                    | SymbolKind::Field => self.table.symbol(sym).ty,
                    _ => None,
                }),
            ExprKind::Field { base, name } => {
                let base_ty = self.analyze_expr(arena, base)?;
                match base_ty {
                    Some(base_ty) => {
                        if let Some(field) = self.table.find_field(base_ty, &name) {
                            self.table.symbol(field).ty
                        } else if self.table.find_method(base_ty, &name).is_some() {
                            None
                        } else if self.is_record(base_ty) {
                            self.error(
                                ErrorCode::E216,
                                format!(
                                    "type '{}' has no field '{}'",
                                    self.table.type_name(base_ty),
                                    name
                                ),
                                pos,
                            )?;
                            None
                        } else {
                            // Foreign member on a non-record value.
                            None
                        }
                    }
                    None => None,
                }
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.analyze_expr(arena, base)?;
                self.analyze_expr(arena, index)?;
                base_ty
                    .map(|t| self.table.resolve_alias(t))
                    .and_then(|t| match self.table.type_symbol(t).type_info() {
                        Some(info) => match info.def {
                            TypeDef::ArrayStatic { elem, .. }
                            | TypeDef::ArrayDynamic { elem } => Some(elem),
                            TypeDef::Builtin(BuiltinType::String) => {
                                Some(self.table.builtin(BuiltinType::Char))
                            }
                            _ => None,
                        },
                        None => None,
                    })
            }
            ExprKind::Deref { base } => {
                let base_ty = self.analyze_expr(arena, base)?;
                base_ty
                    .map(|t| self.table.resolve_alias(t))
                    .and_then(|t| match self.table.type_symbol(t).type_info() {
                        Some(info) => match info.def {
                            TypeDef::Pointer { to } => to,
                            _ => None,
                        },
                        None => None,
                    })
            }
            ExprKind::Cast { operand, type_name } => {
                self.analyze_expr(arena, operand)?;
                self.resolve_type_name(&type_name, pos)?
            }
            ExprKind::TypeTest { operand, type_name } => {
                self.analyze_expr(arena, operand)?;
                self.resolve_type_name(&type_name, pos)?;
                Some(self.table.builtin(BuiltinType::Boolean))
            }
            ExprKind::Call { callee, args, .. } => {
                return self.analyze_call(arena, id, callee, args);
            }
            ExprKind::LengthOf(operand) => {
                self.analyze_expr(arena, operand)?;
                Some(self.table.builtin(BuiltinType::Integer))
            }
            ExprKind::ParamCount => Some(self.table.builtin(BuiltinType::Integer)),
            ExprKind::ParamStr(index) => {
                self.analyze_expr(arena, index)?;
                Some(self.table.builtin(BuiltinType::String))
            }
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.analyze_expr(arena, operand)?;
                match op {
                    UnOp::Not => Some(self.table.builtin(BuiltinType::Boolean)),
                    UnOp::Neg | UnOp::Plus => operand_ty,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.analyze_expr(arena, lhs)?;
                let rhs_ty = self.analyze_expr(arena, rhs)?;
                match op {
                    BinOp::Add => Some(arithmetic_result(self.table, lhs_ty, rhs_ty, true)),
                    BinOp::Sub | BinOp::Mul => {
                        Some(arithmetic_result(self.table, lhs_ty, rhs_ty, false))
                    }
                    BinOp::Divide | BinOp::IntDiv | BinOp::Modulo => {
                        Some(arithmetic_result(self.table, lhs_ty, rhs_ty, false))
                    }
                    BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt
                    | BinOp::GtEq => {
                        self.promote_char_string(arena, lhs, rhs)?;
                        Some(self.table.builtin(BuiltinType::Boolean))
                    }
                    BinOp::And | BinOp::Or | BinOp::In => {
                        Some(self.table.builtin(BuiltinType::Boolean))
                    }
                }
            }
            ExprKind::Foreign(_) => None,
        };
        arena.set_ty(id, ty);
        Ok(ty)
    }

    fn is_record(&self, ty: TypeId) -> bool {
        matches!(
            self.table
                .type_symbol(self.table.resolve_alias(ty))
                .type_info(),
            Some(info) if info.def == TypeDef::Record
        )
    }

    /// A `Char` operand compared against a `String` operand is promoted
    /// to `String` so the emitter picks a string-aware comparison.
    fn promote_char_string(
        &mut self,
        arena: &mut ExprArena,
        lhs: ExprId,
        rhs: ExprId,
    ) -> CompileResult<()> {
        let lhs_ty = arena.ty(lhs);
        let rhs_ty = arena.ty(rhs);
        let is = |ty: Option<TypeId>, b| ty.is_some_and(|t| self.table.is_builtin(t, b));
        if is(lhs_ty, BuiltinType::Char) && is(rhs_ty, BuiltinType::String) {
            arena.set_ty(lhs, Some(self.table.builtin(BuiltinType::String)));
        } else if is(rhs_ty, BuiltinType::Char) && is(lhs_ty, BuiltinType::String) {
            arena.set_ty(rhs, Some(self.table.builtin(BuiltinType::String)));
        }
        Ok(())
    }

    /// Analyze a call, classifying its receiver.
    fn analyze_call(
        &mut self,
        arena: &mut ExprArena,
        id: ExprId,
        callee: ExprId,
        args: Vec<ExprId>,
    ) -> CompileResult<Option<TypeId>> {
        let callee_kind = arena.get(callee).kind.clone();
        let (binding, routine) = match callee_kind {
            ExprKind::Field { base, name } => {
                let base_ty = self.analyze_expr(arena, base)?;
                let method = base_ty.and_then(|t| self.table.find_method(t, &name));
                if let Some(method) = method {
                    let canonical = self.table.symbol(method).name.clone();
                    (CallBinding::Method { name: canonical }, Some(method))
                } else {
                    let module_receiver = match &arena.get(base).kind {
                        ExprKind::Ident(n)
                            if self.table.is_imported_module(n) =>
                        {
                            Some(n.clone())
                        }
                        _ => None,
                    };
                    match module_receiver {
                        Some(module) => {
                            let target = self.table.lookup_qualified(&module, &name);
                            (
                                CallBinding::ModuleQualified {
                                    module,
                                    name: name.clone(),
                                },
                                target,
                            )
                        }
                        None => (CallBinding::ForeignMember { name }, None),
                    }
                }
            }
            ExprKind::Ident(name) => {
                let target = self
                    .table
                    .lookup_all(&name)
                    .into_iter()
                    .find(|&s| self.table.symbol(s).kind == SymbolKind::Routine);
                (CallBinding::Plain, target)
            }
            _ => {
                self.analyze_expr(arena, callee)?;
                (CallBinding::Plain, None)
            }
        };

        // Analyze arguments, then overwrite each argument's annotation
        // with the declared parameter type where the target is known.
        let param_tys: Vec<Option<TypeId>> = routine
            .and_then(|r| self.table.symbol(r).routine_info())
            .map(|info| {
                let skip = usize::from(matches!(binding, CallBinding::Method { .. }));
                info.params
                    .iter()
                    .skip(skip)
                    .map(|&p| self.table.symbol(p).ty)
                    .collect()
            })
            .unwrap_or_default();
        for (i, &arg) in args.iter().enumerate() {
            self.analyze_expr(arena, arg)?;
            if let Some(Some(param_ty)) = param_tys.get(i) {
                arena.set_ty(arg, Some(*param_ty));
            }
        }

        let ret = routine.and_then(|r| self.table.symbol(r).routine_info()).and_then(|i| i.ret);
        if let ExprKind::Call { binding: slot, .. } = &mut arena.get_mut(id).kind {
            *slot = binding;
        }
        arena.set_ty(id, ret);
        Ok(ret)
    }

    fn eval_const_int(&self, arena: &ExprArena, id: ExprId) -> Option<i64> {
        crate::eval_const_int(self.table, arena, id)
    }

    fn require_const_int(
        &mut self,
        arena: &ExprArena,
        id: ExprId,
        pos: Pos,
    ) -> CompileResult<Option<i64>> {
        match self.eval_const_int(arena, id) {
            Some(value) => Ok(Some(value)),
            None => {
                self.error(
                    ErrorCode::E214,
                    "constant integer expression required",
                    pos,
                )?;
                Ok(None)
            }
        }
    }
}
