//! Expression emission.
//!
//! Every function returns the C++ expression text. Foreign nodes emit
//! their captured source slice byte-for-byte.

use crate::Emitter;
use myra_ir::{BinOp, CallBinding, ExprId, ExprKind, UnOp};
use myra_sema::{BuiltinType, TypeDef};

/// Escape string content for a C++ double-quoted literal.
///
/// Double quotes and lone backslashes are escaped; `\x` and `\0`..`\7`
/// sequences are preserved so deliberate byte escapes survive.
pub(crate) fn escape_cpp_string(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => match chars.peek() {
                Some('x' | '0'..='7') => out.push('\\'),
                _ => out.push_str("\\\\"),
            },
            other => out.push(other),
        }
    }
    out
}

/// Escape content for a C++ single-quoted character literal.
fn escape_cpp_char(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => match chars.peek() {
                Some('x' | '0'..='7') => out.push('\\'),
                _ => out.push_str("\\\\"),
            },
            other => out.push(other),
        }
    }
    out
}

impl<'a> Emitter<'a> {
    pub(crate) fn emit_expr(&self, id: ExprId) -> String {
        let arena = &self.module.arena;
        match &arena.get(id).kind {
            ExprKind::Int(v) => v.to_string(),
            ExprKind::Float(bits) => {
                let value = f64::from_bits(*bits);
                format!("{value:?}")
            }
            ExprKind::Str(s) => {
                // A string literal whose resolved type is Char emits as a
                // character literal.
                if self.is_ty(id, BuiltinType::Char) && s.chars().count() == 1 {
                    format!("'{}'", escape_cpp_char(s))
                } else {
                    format!("\"{}\"", escape_cpp_string(s))
                }
            }
            ExprKind::Char(s) => {
                // A char literal whose resolved type is String emits as a
                // string literal.
                if self.is_ty(id, BuiltinType::String) {
                    format!("\"{}\"", escape_cpp_string(s))
                } else {
                    format!("'{}'", escape_cpp_char(s))
                }
            }
            ExprKind::WideStr(s) => format!("L\"{}\"", escape_cpp_string(s)),
            ExprKind::WideChar(s) => format!("L'{}'", escape_cpp_char(s)),
            ExprKind::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            ExprKind::Nil => "nullptr".to_string(),
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Field { base, name } => {
                format!("{}.{}", self.emit_expr(*base), name)
            }
            ExprKind::Index { base, index } => {
                format!("{}[{}]", self.emit_expr(*base), self.emit_expr(*index))
            }
            ExprKind::Deref { base } => format!("(*{})", self.emit_expr(*base)),
            ExprKind::Cast { operand, type_name } => self.emit_cast(*operand, type_name),
            ExprKind::TypeTest { operand, type_name } => format!(
                "(dynamic_cast<{}*>({}) != nullptr)",
                self.cpp_of_name(type_name),
                self.emit_expr(*operand)
            ),
            ExprKind::Call {
                callee,
                args,
                binding,
            } => self.emit_call(*callee, args, binding),
            ExprKind::SetLit(elements) => self.emit_set_literal(elements),
            ExprKind::Range { lo, hi: _ } => {
                // Ranges are lowered by their set/case context; a bare
                // range degrades to its low bound.
                self.emit_expr(*lo)
            }
            ExprKind::LengthOf(operand) => {
                format!("static_cast<int64_t>(std::size({}))", self.emit_expr(*operand))
            }
            ExprKind::ParamCount => "ParamCount()".to_string(),
            ExprKind::ParamStr(index) => format!("ParamStr({})", self.emit_expr(*index)),
            ExprKind::Unary { op, operand } => {
                let operand = self.emit_expr(*operand);
                match op {
                    UnOp::Not => format!("(!{operand})"),
                    UnOp::Neg => format!("(-{operand})"),
                    UnOp::Plus => format!("(+{operand})"),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.emit_binary(*op, *lhs, *rhs),
            ExprKind::Foreign(text) => text.clone(),
        }
    }

    fn is_ty(&self, id: ExprId, builtin: BuiltinType) -> bool {
        self.module
            .arena
            .ty(id)
            .is_some_and(|t| self.table.is_builtin(t, builtin))
    }

    fn is_set_operand(&self, id: ExprId) -> bool {
        self.module.arena.ty(id).is_some_and(|t| self.table.is_set_type(t))
    }

    fn emit_binary(&self, op: BinOp, lhs: ExprId, rhs: ExprId) -> String {
        let left = self.emit_expr(lhs);
        let right = self.emit_expr(rhs);

        // Set membership: ((set & (1ULL << x)) != 0)
        if op == BinOp::In {
            return format!("(({right} & (1ULL << {left})) != 0)");
        }
        // Set algebra when either operand is a set.
        if self.is_set_operand(lhs) || self.is_set_operand(rhs) {
            match op {
                BinOp::Add => return format!("({left} | {right})"),
                BinOp::Mul => return format!("({left} & {right})"),
                BinOp::Sub => return format!("({left} & ~{right})"),
                _ => {}
            }
        }
        let op = match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Divide | BinOp::IntDiv => "/",
            BinOp::Modulo => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::In => unreachable!("handled above"),
        };
        format!("({left} {op} {right})")
    }

    /// Type casts. Casts to `String` have dedicated lowerings by source
    /// type; everything else is a `static_cast`.
    fn emit_cast(&self, operand: ExprId, type_name: &str) -> String {
        let value = self.emit_expr(operand);
        let target = self.lookup_type(type_name);
        let target_is_string = target
            .is_some_and(|t| self.table.is_builtin(t, BuiltinType::String));
        if target_is_string {
            let source_ty = self.module.arena.ty(operand);
            let is = |b| source_ty.is_some_and(|t| self.table.is_builtin(t, b));
            if is(BuiltinType::Integer)
                || is(BuiltinType::UInteger)
                || is(BuiltinType::Float)
                || is(BuiltinType::Boolean)
            {
                return format!("std::to_string({value})");
            }
            let is_pointer = source_ty
                .map(|t| self.table.resolve_alias(t))
                .and_then(|t| self.table.type_symbol(t).type_info().map(|i| i.def.clone()))
                .is_some_and(|def| {
                    matches!(
                        def,
                        TypeDef::Pointer { .. } | TypeDef::Builtin(BuiltinType::Pointer)
                    )
                });
            if is_pointer {
                return format!("std::string(reinterpret_cast<const char*>({value}))");
            }
            if is(BuiltinType::Char) {
                return format!("std::string({value})");
            }
        }
        format!("static_cast<{}>({})", self.cpp_of_name(type_name), value)
    }

    fn emit_call(&self, callee: ExprId, args: &[ExprId], binding: &CallBinding) -> String {
        let arena = &self.module.arena;
        let arg_list: Vec<String> = args.iter().map(|&a| self.emit_expr(a)).collect();
        match binding {
            CallBinding::Method { name } => {
                let receiver = match &arena.get(callee).kind {
                    ExprKind::Field { base, .. } => self.emit_expr(*base),
                    _ => self.emit_expr(callee),
                };
                let mut all = vec![receiver];
                all.extend(arg_list);
                format!("{name}({})", all.join(", "))
            }
            CallBinding::ModuleQualified { module, name } => {
                format!("{module}::{name}({})", arg_list.join(", "))
            }
            CallBinding::ForeignMember { name } => {
                let receiver = match &arena.get(callee).kind {
                    ExprKind::Field { base, .. } => self.emit_expr(*base),
                    _ => self.emit_expr(callee),
                };
                format!("{receiver}.{name}({})", arg_list.join(", "))
            }
            CallBinding::Plain => {
                format!("{}({})", self.emit_expr(callee), arg_list.join(", "))
            }
        }
    }

    /// Sets are `uint64_t` bitmasks built from shifted-one terms OR'd
    /// together. A contiguous literal range folds into a shifted mask,
    /// special-cased to `~0ULL` at width 64 to avoid an undefined shift.
    fn emit_set_literal(&self, elements: &[ExprId]) -> String {
        if elements.is_empty() {
            return "(uint64_t)0".to_string();
        }
        let arena = &self.module.arena;
        let terms: Vec<String> = elements
            .iter()
            .map(|&element| match &arena.get(element).kind {
                ExprKind::Range { lo, hi } => {
                    let lo_lit = myra_sema::eval_const_int(self.table, arena, *lo);
                    let hi_lit = myra_sema::eval_const_int(self.table, arena, *hi);
                    match (lo_lit, hi_lit) {
                        (Some(lo), Some(hi)) => {
                            let width = hi - lo + 1;
                            if width >= 64 {
                                "~0ULL".to_string()
                            } else if width <= 0 {
                                "0ULL".to_string()
                            } else {
                                format!("(((1ULL << {width}) - 1) << {lo})")
                            }
                        }
                        _ => {
                            let lo = self.emit_expr(*lo);
                            let hi = self.emit_expr(*hi);
                            format!("((((1ULL << (({hi}) - ({lo}) + 1)) - 1)) << ({lo}))")
                        }
                    }
                }
                _ => format!("(1ULL << {})", self.emit_expr(element)),
            })
            .collect();
        if terms.len() == 1 {
            format!("(uint64_t){}", terms[0])
        } else {
            format!("(uint64_t)({})", terms.join(" | "))
        }
    }
}
