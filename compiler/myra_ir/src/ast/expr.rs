//! Expression nodes and the flat expression arena.
//!
//! Expressions are stored in a per-module [`ExprArena`] and referenced by
//! [`ExprId`]. Resolved types live in a side table parallel to the nodes:
//! the analyzer writes them, the emitter reads them, and a `None` entry
//! means the expression is foreign and was never type-checked.

use crate::span::Pos;
use crate::type_id::TypeId;
use std::fmt;

/// Index of an expression in its module's [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr#{}", self.0)
    }
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// `/`
    Divide,
    /// `div`
    IntDiv,
    /// `mod`
    Modulo,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    /// Set membership.
    In,
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnOp {
    Not,
    Neg,
    Plus,
}

/// How the analyzer classified a dotted call's receiver.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CallBinding {
    /// Not yet classified, or a plain (undotted) call.
    #[default]
    Plain,
    /// `instance.Method(args)` bound to a record method; emitted as
    /// `Method(instance, args)`.
    Method { name: String },
    /// `Module.Func(args)` where the receiver named an imported module;
    /// emitted as `Module::Func(args)`.
    ModuleQualified { module: String, name: String },
    /// Unknown receiver; emitted as `receiver.Method(args)` verbatim.
    ForeignMember { name: String },
}

/// Expression node.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Pos,
}

/// Expression variants.
#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unary {
        op: UnOp,
        operand: ExprId,
    },
    /// Plain identifier reference.
    Ident(String),
    /// `base.name` field access. Keywords are accepted as `name` so
    /// foreign-language members remain addressable.
    Field {
        base: ExprId,
        name: String,
    },
    Index {
        base: ExprId,
        index: ExprId,
    },
    /// `base^` pointer dereference.
    Deref {
        base: ExprId,
    },
    /// `expr as TypeName`.
    Cast {
        operand: ExprId,
        type_name: String,
    },
    /// `expr is TypeName`.
    TypeTest {
        operand: ExprId,
        type_name: String,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
        binding: CallBinding,
    },

    // Literals
    Int(i64),
    /// Bits of an `f64`.
    Float(u64),
    Str(String),
    Char(String),
    WideStr(String),
    WideChar(String),
    Bool(bool),
    Nil,
    /// `{a, b, x..y}` set constructor.
    SetLit(Vec<ExprId>),
    /// `lo..hi`, inside set constructors and case labels.
    Range {
        lo: ExprId,
        hi: ExprId,
    },

    /// `Length(x)` intrinsic.
    LengthOf(ExprId),
    /// `ParamCount` intrinsic (command-line argument count).
    ParamCount,
    /// `ParamStr(i)` intrinsic (command-line argument by index).
    ParamStr(ExprId),

    /// Raw source slice captured by the passthrough rule; emitted verbatim.
    Foreign(String),
}

/// Flat arena owning a module's expressions plus the resolved-type side
/// table the analyzer fills in.
#[derive(Clone, Default, Debug)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    types: Vec<Option<TypeId>>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression, returning its id.
    pub fn alloc(&mut self, kind: ExprKind, pos: Pos) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(Expr { kind, pos });
        self.types.push(None);
        id
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    /// Resolved type of an expression; `None` means foreign / unchecked.
    #[inline]
    pub fn ty(&self, id: ExprId) -> Option<TypeId> {
        self.types[id.index()]
    }

    /// Record the resolved type of an expression.
    #[inline]
    pub fn set_ty(&mut self, id: ExprId, ty: Option<TypeId>) {
        self.types[id.index()] = ty;
    }

    /// Roll back to a previous length. Used by the parser to discard
    /// nodes allocated during a speculative parse that is being replayed
    /// as passthrough.
    pub fn truncate(&mut self, len: usize) {
        self.exprs.truncate(len);
        self.types.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Pos;

    #[test]
    fn test_arena_alloc_and_annotate() {
        let mut arena = ExprArena::new();
        let id = arena.alloc(ExprKind::Int(7), Pos::DUMMY);
        assert_eq!(arena.ty(id), None);
        arena.set_ty(id, Some(TypeId(3)));
        assert_eq!(arena.ty(id), Some(TypeId(3)));
        assert!(matches!(arena.get(id).kind, ExprKind::Int(7)));
    }

    #[test]
    fn test_arena_ids_are_dense() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(ExprKind::Nil, Pos::DUMMY);
        let b = arena.alloc(ExprKind::Bool(true), Pos::DUMMY);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.len(), 2);
    }
}
