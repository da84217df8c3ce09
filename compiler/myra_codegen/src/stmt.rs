//! Statement emission.

use crate::writer::Writer;
use crate::Emitter;
use myra_ir::{Block, CaseArm, ExprId, ExprKind, Stmt, StmtKind};
use myra_sema::TypeDef;

impl<'a> Emitter<'a> {
    pub(crate) fn emit_block(&self, w: &mut Writer, block: &Block) {
        for stmt in &block.stmts {
            self.emit_stmt(w, stmt);
        }
    }

    /// Conditions that are already parenthesised binary/unary/deref
    /// expressions are not wrapped again, to keep compilers from warning
    /// about redundant parentheses.
    fn cond_text(&self, cond: ExprId) -> String {
        let text = self.emit_expr(cond);
        match &self.module.arena.get(cond).kind {
            ExprKind::Binary { .. }
            | ExprKind::Unary { .. }
            | ExprKind::Deref { .. }
            | ExprKind::TypeTest { .. } => text,
            _ => format!("({text})"),
        }
    }

    pub(crate) fn emit_stmt(&self, w: &mut Writer, stmt: &Stmt) {
        if stmt.pos.line > 0 {
            w.line_directive(stmt.pos.line, &self.path);
        }
        match &stmt.kind {
            StmtKind::Block(block) => {
                w.open("{");
                self.emit_block(w, block);
                w.close("}");
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                w.open(&format!("if {} {{", self.cond_text(*cond)));
                self.emit_block(w, then_branch);
                match else_branch {
                    Some(else_branch) => {
                        w.reopen("} else {");
                        self.emit_block(w, else_branch);
                        w.close("}");
                    }
                    None => w.close("}"),
                }
            }
            StmtKind::While { cond, body } => {
                w.open(&format!("while {} {{", self.cond_text(*cond)));
                self.emit_block(w, body);
                w.close("}");
            }
            StmtKind::Repeat { body, cond } => {
                w.open("do {");
                self.emit_block(w, body);
                w.close(&format!("}} while (!{});", self.cond_text(*cond)));
            }
            StmtKind::For {
                var,
                start,
                end,
                descending,
                body,
            } => {
                let start = self.emit_expr(*start);
                let end = self.emit_expr(*end);
                let (cmp, step) = if *descending { (">=", "--") } else { ("<=", "++") };
                w.open(&format!(
                    "for ({var} = {start}; {var} {cmp} {end}; {var}{step}) {{"
                ));
                self.emit_block(w, body);
                w.close("}");
            }
            StmtKind::Case {
                scrutinee,
                arms,
                else_arm,
            } => self.emit_case(w, *scrutinee, arms, else_arm.as_ref()),
            StmtKind::Return { value } => match value {
                Some(value) => w.line(&format!("return {};", self.emit_expr(*value))),
                None => w.line("return;"),
            },
            StmtKind::Assign { target, value } => {
                w.line(&format!(
                    "{} = {};",
                    self.emit_expr(*target),
                    self.emit_expr(*value)
                ));
            }
            StmtKind::Call { call } => {
                w.line(&format!("{};", self.emit_expr(*call)));
            }
            StmtKind::New { target, as_type } => {
                let target_text = self.emit_expr(*target);
                let ty = self.new_target_type(*target, as_type.as_deref());
                w.line(&format!("{target_text} = new {ty}();"));
            }
            StmtKind::Dispose { target } => {
                w.line(&format!("delete {};", self.emit_expr(*target)));
            }
            StmtKind::SetLength { target, length } => {
                w.line(&format!(
                    "{}.resize({});",
                    self.emit_expr(*target),
                    self.emit_expr(*length)
                ));
            }
            StmtKind::Try {
                body,
                except,
                finally,
            } => self.emit_try(w, body, except.as_ref(), finally.as_ref()),
            StmtKind::Inherited {
                name,
                args,
                resolved_parent,
            } => {
                let parent = resolved_parent.as_deref().unwrap_or("auto");
                let receiver = self.current_receiver.as_deref().unwrap_or("Self");
                let method = name
                    .clone()
                    .or_else(|| self.current_routine_name.clone())
                    .unwrap_or_default();
                let mut all = vec![format!("static_cast<{parent}&>({receiver})")];
                all.extend(args.iter().map(|&a| self.emit_expr(a)));
                w.line(&format!("{method}({});", all.join(", ")));
            }
            StmtKind::Foreign(text) => {
                let trimmed = text.trim_end();
                if trimmed.starts_with('#')
                    || trimmed.ends_with(';')
                    || trimmed.ends_with('}')
                    || trimmed.is_empty()
                {
                    w.line(trimmed);
                } else {
                    w.line(&format!("{trimmed};"));
                }
            }
        }
    }

    /// `new` target type, read through three layers: an explicit `as T`
    /// cast, the resolved pointer type of the target, or the declared
    /// `pointer to T` of a simple identifier target. Analysis rejects the
    /// case where none yields a name.
    fn new_target_type(&self, target: ExprId, as_type: Option<&str>) -> String {
        if let Some(name) = as_type {
            return self.cpp_of_name(name);
        }
        let pointee = self
            .module
            .arena
            .ty(target)
            .map(|t| self.table.resolve_alias(t))
            .and_then(|t| {
                self.table
                    .type_symbol(t)
                    .type_info()
                    .and_then(|info| match info.def {
                        TypeDef::Pointer { to } => to,
                        _ => None,
                    })
            });
        match pointee {
            Some(pointee) => crate::types::cpp_type(self.table, pointee),
            None => "auto".to_string(),
        }
    }

    fn emit_case(
        &self,
        w: &mut Writer,
        scrutinee: ExprId,
        arms: &[CaseArm],
        else_arm: Option<&Block>,
    ) {
        let arena = &self.module.arena;
        w.open(&format!("switch ({}) {{", self.emit_expr(scrutinee)));
        for arm in arms {
            for &label in &arm.labels {
                match &arena.get(label).kind {
                    ExprKind::Range { lo, hi } => {
                        let lo_lit = myra_sema::eval_const_int(self.table, arena, *lo);
                        let hi_lit = myra_sema::eval_const_int(self.table, arena, *hi);
                        match (lo_lit, hi_lit) {
                            (Some(lo), Some(hi)) if lo <= hi => {
                                // Integer-literal ranges unroll into
                                // consecutive labels.
                                for value in lo..=hi {
                                    w.line(&format!("case {value}:"));
                                }
                            }
                            _ => {
                                w.line(&format!(
                                    "// case {}..{}: range requires constant bounds",
                                    self.emit_expr(*lo),
                                    self.emit_expr(*hi)
                                ));
                            }
                        }
                    }
                    _ => w.line(&format!("case {}:", self.emit_expr(label))),
                }
            }
            w.open("{");
            self.emit_block(w, &arm.body);
            w.line("break;");
            w.close("}");
        }
        if let Some(else_arm) = else_arm {
            w.line("default:");
            w.open("{");
            self.emit_block(w, else_arm);
            w.line("break;");
            w.close("}");
        }
        w.close("}");
    }

    /// `try/except/finally`. `except` catches `std::exception&` and then
    /// `...`; `finally` wraps the tried region, re-throws, and repeats
    /// the finally body for normal exit. Both combine by nesting.
    fn emit_try(
        &self,
        w: &mut Writer,
        body: &Block,
        except: Option<&Block>,
        finally: Option<&Block>,
    ) {
        match (except, finally) {
            (Some(except), Some(finally)) => {
                w.open("try {");
                self.emit_try(w, body, Some(except), None);
                w.reopen("} catch (...) {");
                self.emit_block(w, finally);
                w.line("throw;");
                w.close("}");
                self.emit_block(w, finally);
            }
            (Some(except), None) => {
                w.open("try {");
                self.emit_block(w, body);
                w.reopen("} catch (const std::exception&) {");
                self.emit_block(w, except);
                w.reopen("} catch (...) {");
                self.emit_block(w, except);
                w.close("}");
            }
            (None, Some(finally)) => {
                w.open("try {");
                self.emit_block(w, body);
                w.reopen("} catch (...) {");
                self.emit_block(w, finally);
                w.line("throw;");
                w.close("}");
                self.emit_block(w, finally);
            }
            (None, None) => {
                // try with no handlers: emit the tried body bare.
                self.emit_block(w, body);
            }
        }
    }
}
