//! Symbol registry for one VCL compilation unit.
//!
//! VCL has no nested lexical scopes: imports, object instances, and
//! backends all live in one flat namespace spanning the whole unit. The
//! table tracks what name means what, so the analyzer passes can tell a
//! module apart from a backend apart from a built-in variable.
//!
//! Symbols are a closed sum — each kind carries exactly the fields it
//! needs, so there are no optional-metadata checks downstream.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use vcl_metadata::VariableInfo;
use vcl_vcc::VccModule;

/// One named thing in the compilation unit.
#[derive(Debug, Clone)]
pub enum Symbol {
    /// An imported VMOD, registered under its binding name (the alias when
    /// one was given). Carries the full descriptor so member lookups on
    /// the module resolve without another registry round-trip.
    Module {
        /// The module's own name, which may differ from the binding
        name: String,
        descriptor: Arc<VccModule>,
    },
    /// An instance created by `new`, bound to a module + object type.
    ObjectInstance {
        name: String,
        module: String,
        type_name: String,
    },
    /// A declared backend with a snapshot of its property names.
    Backend {
        name: String,
        properties: Vec<String>,
    },
    /// A built-in variable record cached from the language metadata.
    Variable { name: String, info: VariableInfo },
}

impl Symbol {
    /// The name the symbol is registered under.
    pub fn binding(&self) -> &str {
        match self {
            Symbol::Module { name, .. }
            | Symbol::ObjectInstance { name, .. }
            | Symbol::Backend { name, .. }
            | Symbol::Variable { name, .. } => name,
        }
    }
}

/// Flat, insertion-ordered symbol table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: FxHashMap<String, Symbol>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Register an imported module under `binding` (its alias, or its own
    /// name when unaliased).
    pub fn insert_module(&mut self, binding: impl Into<String>, descriptor: Arc<VccModule>) {
        let binding = binding.into();
        self.insert(
            binding,
            Symbol::Module {
                name: descriptor.name.clone(),
                descriptor,
            },
        );
    }

    /// Register an object instance created by `new`.
    pub fn insert_object_instance(
        &mut self,
        name: impl Into<String>,
        module: impl Into<String>,
        type_name: impl Into<String>,
    ) {
        let name = name.into();
        self.insert(
            name.clone(),
            Symbol::ObjectInstance {
                name,
                module: module.into(),
                type_name: type_name.into(),
            },
        );
    }

    /// Register a declared backend.
    pub fn insert_backend(&mut self, name: impl Into<String>, properties: Vec<String>) {
        let name = name.into();
        self.insert(name.clone(), Symbol::Backend { name, properties });
    }

    /// Cache a metadata variable record under its qualified name.
    pub fn insert_variable(&mut self, name: impl Into<String>, info: VariableInfo) {
        let name = name.into();
        self.insert(name.clone(), Symbol::Variable { name, info });
    }

    fn insert(&mut self, key: String, symbol: Symbol) {
        if self.symbols.insert(key.clone(), symbol).is_none() {
            self.order.push(key);
        }
    }

    /// Look up any symbol by binding name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// The module bound to `name`, when there is one.
    pub fn module(&self, name: &str) -> Option<&Arc<VccModule>> {
        match self.symbols.get(name) {
            Some(Symbol::Module { descriptor, .. }) => Some(descriptor),
            _ => None,
        }
    }

    /// The `(module, type_name)` pair of an object instance.
    pub fn object_instance(&self, name: &str) -> Option<(&str, &str)> {
        match self.symbols.get(name) {
            Some(Symbol::ObjectInstance { module, type_name, .. }) => {
                Some((module.as_str(), type_name.as_str()))
            }
            _ => None,
        }
    }

    pub fn is_module(&self, name: &str) -> bool {
        matches!(self.symbols.get(name), Some(Symbol::Module { .. }))
    }

    pub fn is_object_instance(&self, name: &str) -> bool {
        matches!(self.symbols.get(name), Some(Symbol::ObjectInstance { .. }))
    }

    pub fn is_backend(&self, name: &str) -> bool {
        matches!(self.symbols.get(name), Some(Symbol::Backend { .. }))
    }

    /// Iterate over all symbols in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(|name| self.symbols.get(name))
    }

    /// Binding names of imported modules, in insertion order.
    pub fn modules(&self) -> Vec<&str> {
        self.iter()
            .filter(|s| matches!(s, Symbol::Module { .. }))
            .map(Symbol::binding)
            .collect()
    }

    /// Names of object instances, in insertion order.
    pub fn object_instances(&self) -> Vec<&str> {
        self.iter()
            .filter(|s| matches!(s, Symbol::ObjectInstance { .. }))
            .map(Symbol::binding)
            .collect()
    }

    /// Names of declared backends, in insertion order.
    pub fn backends(&self) -> Vec<&str> {
        self.iter()
            .filter(|s| matches!(s, Symbol::Backend { .. }))
            .map(Symbol::binding)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    fn module(name: &str) -> Arc<VccModule> {
        Arc::new(VccModule {
            name: name.to_string(),
            version: 1,
            description: None,
            abi: None,
            functions: Vec::new(),
            objects: Vec::new(),
            events: Vec::new(),
        })
    }

    #[test]
    fn kinds_do_not_shadow_semantics() {
        let mut table = SymbolTable::new();
        table.insert_module("std", module("std"));
        table.insert_backend("origin", vec!["host".to_string(), "port".to_string()]);
        table.insert_object_instance("lb", "directors", "round_robin");

        assert!(table.is_module("std"));
        assert!(!table.is_module("origin"));
        assert!(table.is_backend("origin"));
        assert!(table.is_object_instance("lb"));
        assert_eq!(table.object_instance("lb"), Some(("directors", "round_robin")));
        assert_eq!(table.object_instance("std"), None);
    }

    #[test]
    fn aliased_imports_bind_under_the_alias() {
        let mut table = SymbolTable::new();
        table.insert_module("lb", module("directors"));

        assert!(table.is_module("lb"));
        assert!(!table.is_module("directors"));
        assert_eq!(&table.module("lb").unwrap().name, "directors");
    }

    #[test]
    fn enumeration_preserves_insertion_order() {
        let mut table = SymbolTable::new();
        table.insert_backend("b", Vec::new());
        table.insert_backend("a", Vec::new());
        table.insert_module("std", module("std"));
        table.insert_backend("c", Vec::new());

        assert_eq!(table.backends(), vec!["b", "a", "c"]);
        assert_eq!(table.modules(), vec!["std"]);
    }

    #[test]
    fn reinsertion_replaces_without_duplicating() {
        let mut table = SymbolTable::new();
        table.insert_backend("x", Vec::new());
        table.insert_backend("x", vec!["host".to_string()]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.backends(), vec!["x"]);
    }
}
