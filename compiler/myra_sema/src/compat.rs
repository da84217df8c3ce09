//! Type compatibility and arithmetic promotion rules.

use crate::symbol::{BuiltinType, TypeDef};
use crate::SymbolTable;
use myra_ir::TypeId;

/// Assignment/argument compatibility, left = target, right = source.
///
/// The rule is asymmetric on purpose: `Float := Integer` widens, the
/// reverse does not. Any side with no resolved type (foreign surface) is
/// accepted.
pub fn compatible(table: &SymbolTable, left: Option<TypeId>, right: Option<TypeId>) -> bool {
    let (Some(left), Some(right)) = (left, right) else {
        return true;
    };
    if left == right {
        return true;
    }
    let left_sym = table.type_symbol(left);
    let right_sym = table.type_symbol(right);
    if left_sym.name.eq_ignore_ascii_case(&right_sym.name) {
        return true;
    }
    // nil literal (typed as the Pointer builtin) assigns to anything.
    if table.is_builtin(right, BuiltinType::Pointer) {
        return true;
    }
    if table.is_builtin(left, BuiltinType::Float)
        && (table.is_builtin(right, BuiltinType::Integer)
            || table.is_builtin(right, BuiltinType::UInteger))
    {
        return true;
    }
    let integers = |ty| {
        table.is_builtin(ty, BuiltinType::Integer) || table.is_builtin(ty, BuiltinType::UInteger)
    };
    if integers(left) && integers(right) {
        return true;
    }
    // A character widens into a string.
    if table.is_builtin(left, BuiltinType::String) && table.is_builtin(right, BuiltinType::Char) {
        return true;
    }
    // An alias on the left defers to what it aliases.
    if let Some(info) = left_sym.type_info() {
        if let TypeDef::Alias { of } = info.def {
            return compatible(table, Some(of), Some(right));
        }
    }
    // A brace literal types as the `Set` builtin and may initialise any
    // set or array type.
    if table.is_builtin(right, BuiltinType::Set) {
        let resolved = table.resolve_alias(left);
        if let Some(info) = table.type_symbol(resolved).type_info() {
            if matches!(
                info.def,
                TypeDef::SetRange { .. }
                    | TypeDef::ArrayStatic { .. }
                    | TypeDef::ArrayDynamic { .. }
                    | TypeDef::Builtin(BuiltinType::Set)
            ) {
                return true;
            }
        }
    }
    // Derived-to-base: the source is the same nominal type or extends it.
    if table.inherits_from(right, left) {
        return true;
    }
    false
}

/// Result type of an arithmetic binary operation.
///
/// Float contaminates; two unsigned operands stay unsigned; `+` on a
/// `String` operand is concatenation; a set operand makes the whole
/// expression a set operation; everything else is `Integer`.
pub fn arithmetic_result(
    table: &SymbolTable,
    lhs: Option<TypeId>,
    rhs: Option<TypeId>,
    allow_string_concat: bool,
) -> TypeId {
    let is = |ty: Option<TypeId>, b| ty.is_some_and(|t| table.is_builtin(t, b));
    if let Some(set) = [lhs, rhs]
        .into_iter()
        .flatten()
        .find(|&t| table.is_set_type(t))
    {
        return set;
    }
    if allow_string_concat && (is(lhs, BuiltinType::String) || is(rhs, BuiltinType::String)) {
        return table.builtin(BuiltinType::String);
    }
    if is(lhs, BuiltinType::Float) || is(rhs, BuiltinType::Float) {
        return table.builtin(BuiltinType::Float);
    }
    if is(lhs, BuiltinType::UInteger) && is(rhs, BuiltinType::UInteger) {
        return table.builtin(BuiltinType::UInteger);
    }
    table.builtin(BuiltinType::Integer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin(table: &SymbolTable, b: BuiltinType) -> Option<TypeId> {
        Some(table.builtin(b))
    }

    #[test]
    fn test_numeric_promotion_is_asymmetric() {
        let table = SymbolTable::new();
        let float = builtin(&table, BuiltinType::Float);
        let int = builtin(&table, BuiltinType::Integer);
        assert!(compatible(&table, float, int));
        // Integer/UInteger mix freely, but Float does not narrow back.
        assert!(!compatible(
            &table,
            builtin(&table, BuiltinType::Integer),
            float
        ));
        assert!(compatible(
            &table,
            int,
            builtin(&table, BuiltinType::UInteger)
        ));
    }

    #[test]
    fn test_nil_assigns_to_pointers() {
        let table = SymbolTable::new();
        assert!(compatible(
            &table,
            builtin(&table, BuiltinType::String),
            builtin(&table, BuiltinType::Pointer)
        ));
    }

    #[test]
    fn test_null_type_is_accepted() {
        let table = SymbolTable::new();
        assert!(compatible(&table, None, builtin(&table, BuiltinType::Integer)));
        assert!(compatible(&table, builtin(&table, BuiltinType::Integer), None));
    }

    #[test]
    fn test_arithmetic_float_contaminates() {
        let table = SymbolTable::new();
        let result = arithmetic_result(
            &table,
            builtin(&table, BuiltinType::Integer),
            builtin(&table, BuiltinType::Float),
            true,
        );
        assert!(table.is_builtin(result, BuiltinType::Float));
    }

    #[test]
    fn test_arithmetic_uinteger_pair() {
        let table = SymbolTable::new();
        let result = arithmetic_result(
            &table,
            builtin(&table, BuiltinType::UInteger),
            builtin(&table, BuiltinType::UInteger),
            true,
        );
        assert!(table.is_builtin(result, BuiltinType::UInteger));
    }

    #[test]
    fn test_string_concatenation() {
        let table = SymbolTable::new();
        let result = arithmetic_result(
            &table,
            builtin(&table, BuiltinType::String),
            builtin(&table, BuiltinType::Char),
            true,
        );
        assert!(table.is_builtin(result, BuiltinType::String));
    }
}
