//! Symbol table and semantic analysis for the Myra compiler.
//!
//! The symbol table persists across imports for a whole translation unit;
//! each module AST is analyzed in place, annotating expressions with
//! [`myra_ir::TypeId`] handles into the table.

mod analyzer;
mod compat;
mod symbol;
mod table;

#[cfg(test)]
mod tests;

pub use analyzer::analyze;
pub use compat::{arithmetic_result, compatible};
pub use symbol::{
    BuiltinType, RoutineInfo, Symbol, SymbolId, SymbolKind, TypeDef, TypeInfo,
};
pub use table::{ScopeId, SymbolTable};

use myra_ir::{BinOp, ExprArena, ExprId, ExprKind, UnOp};

/// Fold a constant integer expression: literals, unary `+`/`-`, simple
/// arithmetic, and references to registered constants. Used for array
/// and set bounds during analysis and again by the emitter when
/// computing static array extents.
pub fn eval_const_int(table: &SymbolTable, arena: &ExprArena, id: ExprId) -> Option<i64> {
    match &arena.get(id).kind {
        ExprKind::Int(v) => Some(*v),
        ExprKind::Unary { op, operand } => {
            let value = eval_const_int(table, arena, *operand)?;
            match op {
                UnOp::Neg => Some(value.wrapping_neg()),
                UnOp::Plus => Some(value),
                UnOp::Not => None,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = eval_const_int(table, arena, *lhs)?;
            let rhs = eval_const_int(table, arena, *rhs)?;
            match op {
                BinOp::Add => Some(lhs.wrapping_add(rhs)),
                BinOp::Sub => Some(lhs.wrapping_sub(rhs)),
                BinOp::Mul => Some(lhs.wrapping_mul(rhs)),
                _ => None,
            }
        }
        ExprKind::Ident(name) => {
            let sym = table.lookup(name)?;
            match table.symbol(sym).kind {
                SymbolKind::Constant => table.symbol(sym).const_value,
                _ => None,
            }
        }
        _ => None,
    }
}
