//! Declaration nodes and the module root.

use super::expr::{ExprArena, ExprId};
use super::stmt::Block;
use crate::span::Pos;
use crate::token::ForeignTarget;
use bitflags::bitflags;

/// Output artifact flavour declared in the module header.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ModuleKind {
    Executable,
    StaticLib,
    SharedLib,
}

impl ModuleKind {
    /// Static libraries wrap their output in a namespace; the other kinds
    /// keep `main` and exported symbols at file scope.
    pub fn wraps_namespace(self) -> bool {
        matches!(self, ModuleKind::StaticLib)
    }
}

bitflags! {
    /// Routine declaration flags.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct RoutineFlags: u8 {
        const PUBLIC = 1 << 0;
        const VARIADIC = 1 << 1;
        /// Declared while `#abi c` was active; shared-library output
        /// decorates it `extern "C"`.
        const ABI_C = 1 << 2;
        const EXTERNAL = 1 << 3;
        /// Detected or declared as a method (bound receiver).
        const METHOD = 1 << 4;
    }
}

/// Calling convention for routines and routine types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CallingConvention {
    #[default]
    Default,
    Cdecl,
    Stdcall,
}

/// Parameter passing mode. Absence of a modifier means by-value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ParamMode {
    #[default]
    Value,
    Var,
    Const,
}

/// A syntactic type form, as written in a `type` declaration or any type
/// position (parameter, variable, return).
#[derive(Clone, PartialEq, Debug)]
pub enum TypeForm {
    /// A plain type name (alias when used in a `type` declaration).
    Named(String),
    /// `record [(Parent)] fields end`.
    Record {
        parent: Option<String>,
        fields: Vec<FieldDecl>,
    },
    /// `pointer` (untyped) or `pointer to T`.
    Pointer { to: Option<String> },
    /// `set of lo..hi`.
    SetRange { lo: ExprId, hi: ExprId },
    /// `set of TypeName`.
    SetOf { name: String },
    /// `array [lo..hi] of T`.
    ArrayStatic {
        lo: ExprId,
        hi: ExprId,
        elem: Box<TypeForm>,
    },
    /// `array [] of T` or `array of T`.
    ArrayDynamic { elem: Box<TypeForm> },
    /// `routine (params) [: T]` with optional calling convention.
    RoutineType {
        params: Vec<Param>,
        ret: Option<Box<TypeForm>>,
        convention: CallingConvention,
    },
}

/// A record field.
#[derive(Clone, PartialEq, Debug)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeForm,
    pub pos: Pos,
}

/// A routine parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Param {
    pub name: String,
    pub mode: ParamMode,
    pub ty: TypeForm,
    pub pos: Pos,
}

/// `import Name;`
#[derive(Clone, PartialEq, Debug)]
pub struct Import {
    pub name: String,
    pub pos: Pos,
}

/// A constant item. The type annotation is optional; when absent the
/// analyzer takes the initializer's type.
#[derive(Clone, PartialEq, Debug)]
pub struct ConstDecl {
    pub name: String,
    pub declared_type: Option<TypeForm>,
    pub value: ExprId,
    pub pos: Pos,
}

/// `type Name = <form>;`
#[derive(Clone, PartialEq, Debug)]
pub struct TypeDecl {
    pub name: String,
    pub form: TypeForm,
    pub pos: Pos,
}

/// A module-level variable item.
#[derive(Clone, PartialEq, Debug)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeForm,
    pub init: Option<ExprId>,
    pub public: bool,
    pub pos: Pos,
}

/// A routine or method declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct Routine {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<TypeForm>,
    pub locals: Vec<VarDecl>,
    /// Absent for external routines.
    pub body: Option<Block>,
    pub flags: RoutineFlags,
    pub convention: CallingConvention,
    /// `external 'name'` import library.
    pub external_lib: Option<String>,
    /// Declared with the `method` keyword (enforces the `var Self` shape).
    pub declared_method: bool,
    /// Receiver type name, recorded by the analyzer for methods.
    pub bound_type: Option<String>,
    pub pos: Pos,
}

impl Routine {
    pub fn is_public(&self) -> bool {
        self.flags.contains(RoutineFlags::PUBLIC)
    }

    pub fn is_external(&self) -> bool {
        self.flags.contains(RoutineFlags::EXTERNAL)
    }

    pub fn is_variadic(&self) -> bool {
        self.flags.contains(RoutineFlags::VARIADIC)
    }
}

/// `test 'description'; .. end;`
#[derive(Clone, PartialEq, Debug)]
pub struct TestBlock {
    pub description: String,
    pub body: Block,
    pub pos: Pos,
}

/// An uninterpreted module-level directive, kept for verbatim emission.
#[derive(Clone, PartialEq, Debug)]
pub struct DirectiveNode {
    pub name: String,
    pub text: String,
    pub pos: Pos,
}

/// A module-level `#startcpp .. #endcpp` block with its resolved target.
#[derive(Clone, PartialEq, Debug)]
pub struct ForeignBlockNode {
    pub target: ForeignTarget,
    pub text: String,
    pub pos: Pos,
}

/// Root of a parsed translation unit. Exclusively owns all declaration and
/// statement children plus the expression arena.
#[derive(Clone, Debug)]
pub struct Module {
    pub name: String,
    pub kind: ModuleKind,
    pub pos: Pos,
    /// Absolute path of the source file, forward slashes.
    pub file: String,
    pub imports: Vec<Import>,
    pub consts: Vec<ConstDecl>,
    pub types: Vec<TypeDecl>,
    pub vars: Vec<VarDecl>,
    pub routines: Vec<Routine>,
    pub tests: Vec<TestBlock>,
    pub directives: Vec<DirectiveNode>,
    pub foreign_blocks: Vec<ForeignBlockNode>,
    pub body: Option<Block>,
    pub arena: ExprArena,
}

impl Module {
    pub fn new(name: String, kind: ModuleKind, file: String, pos: Pos) -> Self {
        Module {
            name,
            kind,
            pos,
            file,
            imports: Vec::new(),
            consts: Vec::new(),
            types: Vec::new(),
            vars: Vec::new(),
            routines: Vec::new(),
            tests: Vec::new(),
            directives: Vec::new(),
            foreign_blocks: Vec::new(),
            body: None,
            arena: ExprArena::new(),
        }
    }
}
