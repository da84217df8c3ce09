//! Opaque handle to a resolved type.
//!
//! The semantic analyzer annotates expressions with `TypeId`s that index
//! into its symbol table; the emitter hands them back to the table to
//! obtain type names. The AST never owns type data, so the symbol table
//! can outlive any single module's AST (and does, across imports).

use std::fmt;

/// Non-owning reference to a type symbol in the symbol table.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ty#{}", self.0)
    }
}
