//! Shared representation types for the Myra compiler.
//!
//! Holds everything that crosses crate boundaries: source positions,
//! tokens, the module AST with its expression arena, the opaque
//! [`TypeId`] handle into the semantic analyzer's symbol table, and the
//! directive-driven [`CompileOptions`].

pub mod ast;
mod options;
mod span;
mod token;
mod type_id;

pub use ast::*;
pub use options::{Abi, AppType, Breakpoint, CompileOptions, OptimizationLevel, TargetTriple};
pub use span::{Pos, Span};
pub use token::{ForeignTarget, Token, TokenKind};
pub use type_id::TypeId;
