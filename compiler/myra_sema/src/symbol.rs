//! Symbol model.
//!
//! Symbols live in one arena owned by the [`crate::SymbolTable`]; scopes
//! and type annotations refer to them by index. Type symbols double as
//! the targets of [`TypeId`] handles used to annotate the AST.

use myra_ir::{CallingConvention, ParamMode, RoutineFlags, TypeId};

/// Index of a symbol in the table's arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// View this symbol as a type handle. Only meaningful for symbols of
    /// kind [`SymbolKind::Type`].
    #[inline]
    pub const fn as_type(self) -> TypeId {
        TypeId(self.0)
    }

    #[inline]
    pub const fn from_type(ty: TypeId) -> SymbolId {
        SymbolId(ty.0)
    }
}

/// What a symbol names.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    Constant,
    Variable,
    Type,
    Routine,
    Parameter,
    Field,
}

/// The nine built-in types pre-populated into the global scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BuiltinType {
    Boolean,
    Char,
    UChar,
    Integer,
    UInteger,
    Float,
    String,
    Set,
    Pointer,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 9] = [
        BuiltinType::Boolean,
        BuiltinType::Char,
        BuiltinType::UChar,
        BuiltinType::Integer,
        BuiltinType::UInteger,
        BuiltinType::Float,
        BuiltinType::String,
        BuiltinType::Set,
        BuiltinType::Pointer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Boolean => "Boolean",
            BuiltinType::Char => "Char",
            BuiltinType::UChar => "UChar",
            BuiltinType::Integer => "Integer",
            BuiltinType::UInteger => "UInteger",
            BuiltinType::Float => "Float",
            BuiltinType::String => "String",
            BuiltinType::Set => "Set",
            BuiltinType::Pointer => "Pointer",
        }
    }
}

/// Resolved structure of a type symbol.
#[derive(Clone, PartialEq, Debug)]
pub enum TypeDef {
    Builtin(BuiltinType),
    Record,
    Pointer { to: Option<TypeId> },
    /// `set of lo..hi`; bounds are constant-folded element indices.
    SetRange { lo: i64, hi: i64 },
    ArrayStatic { lo: i64, hi: i64, elem: TypeId },
    ArrayDynamic { elem: TypeId },
    RoutineType {
        params: Vec<(ParamMode, TypeId)>,
        ret: Option<TypeId>,
        convention: CallingConvention,
    },
    Alias { of: TypeId },
}

/// Extra data carried by type symbols.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub def: TypeDef,
    /// Parent type (single inheritance), records only.
    pub base: Option<TypeId>,
    /// Field symbols in declaration order, owned by the table.
    pub fields: Vec<SymbolId>,
    /// Methods bound to this type. The routine symbols themselves are
    /// owned by the scope that declared them; these are references.
    pub methods: Vec<SymbolId>,
}

impl TypeInfo {
    pub fn new(def: TypeDef) -> Self {
        TypeInfo {
            def,
            base: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// Extra data carried by routine symbols.
#[derive(Clone, Debug)]
pub struct RoutineInfo {
    /// Parameter symbols, owned by the table, in declaration order.
    pub params: Vec<SymbolId>,
    pub ret: Option<TypeId>,
    pub flags: RoutineFlags,
    pub convention: CallingConvention,
    /// Receiver type for methods.
    pub bound_to: Option<TypeId>,
    pub external_lib: Option<String>,
}

/// One named entity.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared or resolved type: the value type for constants, variables,
    /// parameters and fields; `None` for types and void routines.
    pub ty: Option<TypeId>,
    pub public: bool,
    /// Passing mode, parameters only.
    pub mode: ParamMode,
    /// Folded integer value, constants only; used for array/set bounds.
    pub const_value: Option<i64>,
    pub type_info: Option<TypeInfo>,
    pub routine_info: Option<RoutineInfo>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Symbol {
            name: name.into(),
            kind,
            ty: None,
            public: false,
            mode: ParamMode::Value,
            const_value: None,
            type_info: None,
            routine_info: None,
        }
    }

    pub fn with_ty(mut self, ty: Option<TypeId>) -> Self {
        self.ty = ty;
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    pub fn routine_info(&self) -> Option<&RoutineInfo> {
        self.routine_info.as_ref()
    }
}
