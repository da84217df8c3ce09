//! Abstract syntax tree for Myra modules.
//!
//! The tree is a closed set of tagged variants. Every node carries a
//! [`crate::Pos`] whose byte span indexes the original source buffer;
//! foreign-passthrough nodes additionally carry the verbatim source slice
//! the emitter writes back out.

mod decl;
mod expr;
mod stmt;

pub use decl::{
    CallingConvention, ConstDecl, DirectiveNode, FieldDecl, ForeignBlockNode, Import, Module,
    ModuleKind, Param, ParamMode, Routine, RoutineFlags, TestBlock, TypeDecl, TypeForm, VarDecl,
};
pub use expr::{BinOp, CallBinding, Expr, ExprArena, ExprId, ExprKind, UnOp};
pub use stmt::{Block, CaseArm, Stmt, StmtKind};
