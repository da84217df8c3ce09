//! Type mapping: Myra types → C++ types.
//!
//! The built-in map is closed: `Boolean→bool, Char→char, UChar→uint8_t,
//! Integer→int64_t, UInteger→uint64_t, Float→double, String→std::string,
//! Set→uint64_t, Pointer→void*`. Declared types are referenced by their
//! own name (the header emits a `struct` or `using` for each), and type
//! names the table does not know pass through unchanged so foreign C++
//! types remain usable in native positions.

use crate::Emitter;
use myra_ir::{CallingConvention, ParamMode, TypeForm, TypeId};
use myra_sema::{BuiltinType, SymbolTable, TypeDef};

/// C++ spelling of a built-in type.
pub(crate) fn builtin_cpp(builtin: BuiltinType) -> &'static str {
    match builtin {
        BuiltinType::Boolean => "bool",
        BuiltinType::Char => "char",
        BuiltinType::UChar => "uint8_t",
        BuiltinType::Integer => "int64_t",
        BuiltinType::UInteger => "uint64_t",
        BuiltinType::Float => "double",
        BuiltinType::String => "std::string",
        BuiltinType::Set => "uint64_t",
        BuiltinType::Pointer => "void*",
    }
}

/// C++ spelling of a resolved type.
pub(crate) fn cpp_type(table: &SymbolTable, ty: TypeId) -> String {
    let symbol = table.type_symbol(ty);
    let Some(info) = symbol.type_info() else {
        return "void*".to_string();
    };
    match &info.def {
        TypeDef::Builtin(builtin) => builtin_cpp(*builtin).to_string(),
        _ if !symbol.name.is_empty() => symbol.name.clone(),
        TypeDef::Pointer { to } => match to {
            Some(to) => format!("{}*", cpp_type(table, *to)),
            None => "void*".to_string(),
        },
        TypeDef::SetRange { .. } => "uint64_t".to_string(),
        TypeDef::ArrayDynamic { elem } => format!("std::vector<{}>", cpp_type(table, *elem)),
        TypeDef::ArrayStatic { lo, hi, elem } => {
            format!("{}[{}]", cpp_type(table, *elem), (hi - lo + 1).max(0))
        }
        TypeDef::RoutineType {
            params,
            ret,
            convention,
        } => routine_pointer(table, params, *ret, *convention),
        TypeDef::Record | TypeDef::Alias { .. } => symbol.name.clone(),
    }
}

fn routine_pointer(
    table: &SymbolTable,
    params: &[(ParamMode, TypeId)],
    ret: Option<TypeId>,
    convention: CallingConvention,
) -> String {
    let ret = ret.map_or_else(|| "void".to_string(), |t| cpp_type(table, t));
    let params: Vec<String> = params
        .iter()
        .map(|&(mode, ty)| {
            let base = cpp_type(table, ty);
            match mode {
                ParamMode::Var => format!("{base}&"),
                ParamMode::Const => format!("const {base}&"),
                ParamMode::Value => base,
            }
        })
        .collect();
    let conv = convention_cpp(convention);
    format!("{ret} ({conv}*)({})", params.join(", "))
}

pub(crate) fn convention_cpp(convention: CallingConvention) -> &'static str {
    match convention {
        CallingConvention::Default => "",
        CallingConvention::Cdecl => "__cdecl ",
        CallingConvention::Stdcall => "__stdcall ",
    }
}

impl<'a> Emitter<'a> {
    /// C++ spelling of a syntactic type form, resolved against the
    /// current module scope. Unknown names pass through verbatim.
    pub(crate) fn cpp_of_form(&self, form: &TypeForm) -> String {
        match form {
            TypeForm::Named(name) => self.cpp_of_name(name),
            TypeForm::Pointer { to } => match to {
                Some(name) => format!("{}*", self.cpp_of_name(name)),
                None => "void*".to_string(),
            },
            TypeForm::SetRange { .. } | TypeForm::SetOf { .. } => "uint64_t".to_string(),
            TypeForm::ArrayDynamic { elem } => {
                format!("std::vector<{}>", self.cpp_of_form(elem))
            }
            TypeForm::ArrayStatic { lo, hi, elem } => {
                format!("{}[{}]", self.cpp_of_form(elem), self.array_extent(*lo, *hi))
            }
            TypeForm::RoutineType {
                params,
                ret,
                convention,
            } => {
                let ret = ret
                    .as_deref()
                    .map_or_else(|| "void".to_string(), |r| self.cpp_of_form(r));
                let params: Vec<String> = params
                    .iter()
                    .map(|p| match p.mode {
                        ParamMode::Var => format!("{}&", self.cpp_of_form(&p.ty)),
                        ParamMode::Const => format!("const {}&", self.cpp_of_form(&p.ty)),
                        ParamMode::Value => self.cpp_of_form(&p.ty),
                    })
                    .collect();
                let conv = convention_cpp(*convention);
                format!("{ret} ({conv}*)({})", params.join(", "))
            }
            TypeForm::Record { .. } => "auto".to_string(),
        }
    }

    pub(crate) fn cpp_of_name(&self, name: &str) -> String {
        if name.is_empty() {
            return "auto".to_string();
        }
        match self.lookup_type(name) {
            Some(ty) => cpp_type(self.table, ty),
            // A type name the table does not know: assume it is a
            // foreign C++ type and pass the spelling through.
            None => name.to_string(),
        }
    }

    pub(crate) fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.table
            .lookup_all(name)
            .into_iter()
            .find(|&id| self.table.symbol(id).kind == myra_sema::SymbolKind::Type)
            .map(myra_sema::SymbolId::as_type)
    }

    /// `array[l..h]` extent `h-l+1`; constant bounds fold, anything else
    /// stays symbolic.
    pub(crate) fn array_extent(&self, lo: myra_ir::ExprId, hi: myra_ir::ExprId) -> String {
        let arena = &self.module.arena;
        match (
            myra_sema::eval_const_int(self.table, arena, lo),
            myra_sema::eval_const_int(self.table, arena, hi),
        ) {
            (Some(lo), Some(hi)) => ((hi - lo + 1).max(0)).to_string(),
            _ => format!(
                "({}) - ({}) + 1",
                self.emit_expr(hi),
                self.emit_expr(lo)
            ),
        }
    }

    /// A declarator for variables and fields: static arrays need the
    /// C array suffix after the name.
    pub(crate) fn declarator(&self, form: &TypeForm, name: &str) -> String {
        match form {
            TypeForm::ArrayStatic { lo, hi, elem } => format!(
                "{} {}[{}]",
                self.cpp_of_form(elem),
                name,
                self.array_extent(*lo, *hi)
            ),
            _ => format!("{} {}", self.cpp_of_form(form), name),
        }
    }
}
