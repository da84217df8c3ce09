//! Symbol table: a tree of scopes over one symbol arena.
//!
//! Scopes own their symbols (by arena index); parent links are
//! non-owning. Module scopes persist for the whole translation unit and
//! are keyed by module name; routine scopes stack and are popped after
//! each body. Name lookup is case-insensitive, and each scope keeps an
//! ordered-duplicate map so overloaded routine names are preserved.

use crate::symbol::{BuiltinType, Symbol, SymbolId, SymbolKind, TypeDef, TypeInfo};
use myra_ir::TypeId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Index of a scope in the table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    entries: FxHashMap<String, SmallVec<[SymbolId; 2]>>,
}

/// Symbol table for one translation unit.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    global: ScopeId,
    current: ScopeId,
    stack: Vec<ScopeId>,
    /// Persistent module scopes, keyed by lowercased module name.
    module_scopes: FxHashMap<String, ScopeId>,
    /// Imported module names of the module currently being analyzed.
    imports: Vec<String>,
    builtins: [TypeId; 9],
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table with the built-in types pre-populated (all public).
    pub fn new() -> Self {
        let mut table = SymbolTable {
            symbols: Vec::new(),
            scopes: vec![Scope::default()],
            global: ScopeId(0),
            current: ScopeId(0),
            stack: Vec::new(),
            module_scopes: FxHashMap::default(),
            imports: Vec::new(),
            builtins: [TypeId(0); 9],
        };
        for (i, builtin) in BuiltinType::ALL.into_iter().enumerate() {
            let mut symbol = Symbol::new(builtin.name(), SymbolKind::Type).public();
            symbol.type_info = Some(TypeInfo::new(TypeDef::Builtin(builtin)));
            let id = table.declare(symbol);
            table.builtins[i] = id.as_type();
        }
        // Float spellings accepted by the surface syntax. Installed as
        // builtins so they map straight to `double` in generated code.
        for alias in ["Double", "Real"] {
            let mut symbol = Symbol::new(alias, SymbolKind::Type).public();
            symbol.type_info = Some(TypeInfo::new(TypeDef::Builtin(BuiltinType::Float)));
            table.declare(symbol);
        }
        table
    }

    /// The pre-interned handle for a built-in type.
    #[inline]
    pub fn builtin(&self, builtin: BuiltinType) -> TypeId {
        self.builtins[BuiltinType::ALL
            .iter()
            .position(|b| *b == builtin)
            .unwrap_or_default()]
    }

    // ─── Scopes ───────────────────────────────────────────────────────

    /// Create or re-enter the persistent scope for `module`.
    pub fn enter_module_scope(&mut self, module: &str) {
        let key = module.to_ascii_lowercase();
        let scope = match self.module_scopes.get(&key) {
            Some(&scope) => scope,
            None => {
                let scope = self.push_child_of(self.global);
                self.module_scopes.insert(key, scope);
                scope
            }
        };
        self.stack.push(self.current);
        self.current = scope;
    }

    /// Return to the scope active before [`Self::enter_module_scope`].
    pub fn leave_module_scope(&mut self) {
        self.current = self.stack.pop().unwrap_or(self.global);
    }

    /// Push a transient scope (routine bodies, test blocks).
    pub fn push_scope(&mut self) {
        let scope = self.push_child_of(self.current);
        self.stack.push(self.current);
        self.current = scope;
    }

    /// Pop a transient scope. Its symbols stay in the arena (annotations
    /// may still reference them) but are no longer reachable by lookup.
    pub fn pop_scope(&mut self) {
        self.current = self.stack.pop().unwrap_or(self.global);
    }

    fn push_child_of(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope {
            parent: Some(parent),
            entries: FxHashMap::default(),
        });
        id
    }

    /// Replace the import list consulted by unqualified lookup.
    pub fn set_imports(&mut self, imports: Vec<String>) {
        self.imports = imports;
    }

    /// Whether `name` is an imported module of the current unit.
    pub fn is_imported_module(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.eq_ignore_ascii_case(name))
    }

    /// Whether a module scope exists for `name`.
    pub fn is_module(&self, name: &str) -> bool {
        self.module_scopes.contains_key(&name.to_ascii_lowercase())
    }

    // ─── Declarations ─────────────────────────────────────────────────

    /// Install a symbol in the current scope. Duplicates are preserved in
    /// declaration order; the caller decides whether a duplicate is an
    /// error (it is not for routines).
    pub fn declare(&mut self, symbol: Symbol) -> SymbolId {
        let key = symbol.name.to_ascii_lowercase();
        let id = self.add(symbol);
        self.scopes[self.current.index()]
            .entries
            .entry(key)
            .or_default()
            .push(id);
        id
    }

    /// Add a symbol to the arena without making it name-addressable.
    /// Used for fields, parameters, and anonymous composite types.
    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX));
        self.symbols.push(symbol);
        id
    }

    /// Make an existing arena symbol addressable in the current scope.
    /// Used when routine parameters enter the body scope in phase 2.
    pub fn bind(&mut self, id: SymbolId) {
        let key = self.symbol(id).name.to_ascii_lowercase();
        self.scopes[self.current.index()]
            .entries
            .entry(key)
            .or_default()
            .push(id);
    }

    // ─── Lookup ───────────────────────────────────────────────────────

    /// Unqualified lookup: the current scope chain first, then the public
    /// symbols of each imported module.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let key = name.to_ascii_lowercase();
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(ids) = self.scopes[id.index()].entries.get(&key) {
                if let Some(&first) = ids.first() {
                    return Some(first);
                }
            }
            scope = self.scopes[id.index()].parent;
        }
        for module in &self.imports {
            if let Some(found) = self.lookup_qualified(module, name) {
                return Some(found);
            }
        }
        None
    }

    /// Lookup restricted to the current scope (duplicate detection).
    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        let key = name.to_ascii_lowercase();
        self.scopes[self.current.index()]
            .entries
            .get(&key)
            .and_then(|ids| ids.first().copied())
    }

    /// Qualified lookup: a public symbol of one module's scope.
    pub fn lookup_qualified(&self, module: &str, name: &str) -> Option<SymbolId> {
        let scope = *self.module_scopes.get(&module.to_ascii_lowercase())?;
        let ids = self.scopes[scope.index()]
            .entries
            .get(&name.to_ascii_lowercase())?;
        ids.iter().copied().find(|&id| self.symbol(id).public)
    }

    /// All symbols sharing `name` in the current scope chain, nearest
    /// scope first (overload candidates).
    pub fn lookup_all(&self, name: &str) -> Vec<SymbolId> {
        let key = name.to_ascii_lowercase();
        let mut out = Vec::new();
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(ids) = self.scopes[id.index()].entries.get(&key) {
                out.extend(ids.iter().copied());
            }
            scope = self.scopes[id.index()].parent;
        }
        out
    }

    // ─── Symbols and types ────────────────────────────────────────────

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    #[inline]
    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    #[inline]
    pub fn type_symbol(&self, ty: TypeId) -> &Symbol {
        self.symbol(SymbolId::from_type(ty))
    }

    pub fn type_name(&self, ty: TypeId) -> &str {
        &self.type_symbol(ty).name
    }

    /// Follow alias links to the underlying type. Bounded by the arena
    /// size so a malformed alias chain cannot loop.
    pub fn resolve_alias(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..self.symbols.len() {
            match self.type_symbol(current).type_info() {
                Some(info) => match info.def {
                    TypeDef::Alias { of } => current = of,
                    _ => return current,
                },
                None => return current,
            }
        }
        current
    }

    /// Whether `ty` resolves to the given builtin.
    pub fn is_builtin(&self, ty: TypeId, builtin: BuiltinType) -> bool {
        matches!(
            self.type_symbol(self.resolve_alias(ty)).type_info(),
            Some(info) if info.def == TypeDef::Builtin(builtin)
        )
    }

    /// Whether `ty` is a set type (the `Set` builtin or a `set of` form).
    pub fn is_set_type(&self, ty: TypeId) -> bool {
        matches!(
            self.type_symbol(self.resolve_alias(ty)).type_info(),
            Some(info) if matches!(
                info.def,
                TypeDef::Builtin(BuiltinType::Set) | TypeDef::SetRange { .. }
            )
        )
    }

    /// Find a record field on `ty` or any ancestor.
    pub fn find_field(&self, ty: TypeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(self.resolve_alias(ty));
        let mut hops = 0;
        while let Some(t) = current {
            let info = self.type_symbol(t).type_info()?;
            if let Some(&found) = info
                .fields
                .iter()
                .find(|&&f| self.symbol(f).name.eq_ignore_ascii_case(name))
            {
                return Some(found);
            }
            current = info.base;
            hops += 1;
            if hops > self.symbols.len() {
                return None;
            }
        }
        None
    }

    /// Find a method on `ty` or any ancestor, walking the parent chain.
    pub fn find_method(&self, ty: TypeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(self.resolve_alias(ty));
        let mut hops = 0;
        while let Some(t) = current {
            let info = self.type_symbol(t).type_info()?;
            if let Some(&found) = info
                .methods
                .iter()
                .find(|&&m| self.symbol(m).name.eq_ignore_ascii_case(name))
            {
                return Some(found);
            }
            current = info.base;
            hops += 1;
            if hops > self.symbols.len() {
                return None;
            }
        }
        None
    }

    /// Whether `ty` equals `ancestor` or inherits from it.
    pub fn inherits_from(&self, ty: TypeId, ancestor: TypeId) -> bool {
        let ancestor = self.resolve_alias(ancestor);
        let mut current = Some(self.resolve_alias(ty));
        let mut hops = 0;
        while let Some(t) = current {
            if t == ancestor {
                return true;
            }
            current = self.type_symbol(t).type_info().and_then(|i| i.base);
            hops += 1;
            if hops > self.symbols.len() {
                return false;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtins_prepopulated() {
        let table = SymbolTable::new();
        let int = table.lookup("integer").expect("Integer is pre-populated");
        assert_eq!(table.symbol(int).kind, SymbolKind::Type);
        assert!(table.symbol(int).public);
        assert!(table.is_builtin(int.as_type(), BuiltinType::Integer));
    }

    #[test]
    fn test_float_aliases() {
        let table = SymbolTable::new();
        let double = table.lookup("DOUBLE").expect("Double alias");
        assert!(table.is_builtin(double.as_type(), BuiltinType::Float));
    }

    #[test]
    fn test_module_scope_persists() {
        let mut table = SymbolTable::new();
        table.enter_module_scope("Shapes");
        let id = table.declare(Symbol::new("Area", SymbolKind::Routine).public());
        table.leave_module_scope();

        assert!(table.lookup("Area").is_none());
        assert_eq!(table.lookup_qualified("shapes", "area"), Some(id));

        // Re-entering finds the same scope.
        table.enter_module_scope("SHAPES");
        assert_eq!(table.lookup("Area"), Some(id));
        table.leave_module_scope();
    }

    #[test]
    fn test_import_fallback_lookup() {
        let mut table = SymbolTable::new();
        table.enter_module_scope("Console");
        let println = table.declare(Symbol::new("PrintLn", SymbolKind::Routine).public());
        table.declare(Symbol::new("hidden", SymbolKind::Variable));
        table.leave_module_scope();

        table.enter_module_scope("Main");
        table.set_imports(vec!["Console".to_string()]);
        assert_eq!(table.lookup("printLn"), Some(println));
        // Non-public symbols are not visible through imports.
        assert!(table.lookup("hidden").is_none());
        table.leave_module_scope();
    }

    #[test]
    fn test_ordered_duplicates_preserved() {
        let mut table = SymbolTable::new();
        table.enter_module_scope("M");
        let first = table.declare(Symbol::new("Write", SymbolKind::Routine));
        let second = table.declare(Symbol::new("write", SymbolKind::Routine));
        assert_eq!(table.lookup("Write"), Some(first));
        assert_eq!(table.lookup_all("Write"), vec![first, second]);
        table.leave_module_scope();
    }

    #[test]
    fn test_routine_scope_shadows_and_pops() {
        let mut table = SymbolTable::new();
        table.enter_module_scope("M");
        let outer = table.declare(Symbol::new("X", SymbolKind::Variable));
        table.push_scope();
        let inner = table.declare(Symbol::new("X", SymbolKind::Parameter));
        assert_eq!(table.lookup("x"), Some(inner));
        table.pop_scope();
        assert_eq!(table.lookup("x"), Some(outer));
        table.leave_module_scope();
    }

    #[test]
    fn test_find_method_walks_parent_chain() {
        let mut table = SymbolTable::new();
        table.enter_module_scope("M");

        let mut parent = Symbol::new("TA", SymbolKind::Type);
        parent.type_info = Some(TypeInfo::new(TypeDef::Record));
        let parent_id = table.declare(parent);

        let get = table.add(Symbol::new("Get", SymbolKind::Routine));
        if let Some(info) = table.symbol_mut(parent_id).type_info.as_mut() {
            info.methods.push(get);
        }

        let mut child = Symbol::new("TB", SymbolKind::Type);
        let mut info = TypeInfo::new(TypeDef::Record);
        info.base = Some(parent_id.as_type());
        child.type_info = Some(info);
        let child_id = table.declare(child);

        assert_eq!(table.find_method(child_id.as_type(), "get"), Some(get));
        assert!(table.inherits_from(child_id.as_type(), parent_id.as_type()));
        assert!(!table.inherits_from(parent_id.as_type(), child_id.as_type()));
        table.leave_module_scope();
    }
}
