use crate::frontend::ast::DataType;
use crate::frontend::token::Pos;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub ty: DataType,
    pub is_array: bool,
    /// -1 while the size is unknown or irrelevant.
    pub array_size: i32,
    pub is_typedef: bool,
    pub declared_at: Pos,
}

type Scope = HashMap<String, Symbol>;

/// A stack of lexical scopes. The global scope is created on construction and
/// can never be popped.
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn leave_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Inserts into the innermost scope. Callers check uniqueness first.
    pub fn declare(&mut self, name: impl Into<String>, symbol: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), symbol);
        }
    }

    pub fn is_unique_in_current_scope(&self, name: &str) -> bool {
        match self.scopes.last() {
            Some(scope) => !scope.contains_key(name),
            None => false,
        }
    }

    /// Searches innermost to outermost, returning the first hit.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
