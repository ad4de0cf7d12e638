//! Scope stack for declaration resolution.
//!
//! Struct tags and variables live in separate namespaces, so `struct s s;`
//! is legal and the two `s` bindings never interfere.

use std::collections::HashMap;

use crate::context::Symbol;
use crate::types::TypeId;

use super::table::VarId;

/// Stack of lexical frames, innermost last.
#[derive(Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

/// A single frame holding this block's bindings.
#[derive(Default)]
pub struct Scope {
    /// Struct tags declared in this frame.
    pub tags: HashMap<Symbol, TypeId>,
    /// Variables and parameters declared in this frame.
    pub vars: HashMap<Symbol, VarId>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Drops the innermost frame; bindings shadowed by it become visible
    /// again.
    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Looks up a tag from the innermost frame outwards.
    pub fn lookup_tag(&self, tag: Symbol) -> Option<TypeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.tags.get(&tag).copied())
    }

    /// Looks up a variable from the innermost frame outwards.
    pub fn lookup_var(&self, name: Symbol) -> Option<VarId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.vars.get(&name).copied())
    }

    /// Tag lookup restricted to the innermost frame. `struct s;` and tag
    /// definitions only care about bindings in their own frame.
    pub fn lookup_tag_current(&self, tag: Symbol) -> Option<TypeId> {
        self.scopes.last().and_then(|s| s.tags.get(&tag).copied())
    }

    /// Variable lookup restricted to the innermost frame.
    pub fn lookup_var_current(&self, name: Symbol) -> Option<VarId> {
        self.scopes.last().and_then(|s| s.vars.get(&name).copied())
    }

    pub fn bind_tag(&mut self, tag: Symbol, id: TypeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.tags.insert(tag, id);
        }
    }

    pub fn bind_var(&mut self, name: Symbol, id: VarId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.vars.insert(name, id);
        }
    }

    /// Every visible variable name, for did-you-mean candidates.
    pub fn visible_vars(&self) -> Vec<Symbol> {
        self.scopes
            .iter()
            .flat_map(|s| s.vars.keys().copied())
            .collect()
    }

    /// Every visible tag, for did-you-mean candidates.
    pub fn visible_tags(&self) -> Vec<Symbol> {
        self.scopes
            .iter()
            .flat_map(|s| s.tags.keys().copied())
            .collect()
    }
}
