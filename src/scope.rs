//! Lexical scope tracking for the view compiler.
//!
//! The transformer needs three questions answered at any node: are we inside a
//! view, are we directly in the view body, and does a nested scope shadow a
//! view-level name.

use std::collections::HashSet;

use crate::ast::{Pattern, Statement, VariableKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    File,
    View,
    Function,
    Block,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub names: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind, names: HashSet<String>) {
        self.frames.push(Scope { kind, names });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn in_view(&self) -> bool {
        self.frames.iter().any(|frame| frame.kind == ScopeKind::View)
    }

    /// True directly in a view body, outside any nested block or function.
    pub fn at_view_level(&self) -> bool {
        matches!(self.frames.last(), Some(frame) if frame.kind == ScopeKind::View)
    }

    /// True when a scope between the current position and the view body
    /// declares `name`, hiding the view-level binding.
    pub fn is_shadowed(&self, name: &str) -> bool {
        for frame in self.frames.iter().rev() {
            if frame.kind == ScopeKind::View {
                return false;
            }
            if frame.names.contains(name) {
                return true;
            }
        }
        false
    }

    /// Every name bound by an open scope.
    pub fn bound_names(&self) -> impl Iterator<Item = &String> {
        self.frames.iter().flat_map(|frame| frame.names.iter())
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.names.contains(name))
    }

    /// Bound at file level and not redeclared by any inner scope.
    pub fn is_file_binding(&self, name: &str) -> bool {
        for frame in self.frames.iter().rev() {
            if frame.kind == ScopeKind::File {
                return frame.names.contains(name);
            }
            if frame.names.contains(name) {
                return false;
            }
        }
        false
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINDING COLLECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Names a statement list declares at its own level: variables, functions and
/// imports. Nested blocks and functions are not entered.
pub fn collect_declared_names(statements: &[Statement]) -> HashSet<String> {
    let mut names = HashSet::new();
    for statement in statements {
        collect_statement_names(statement, &mut names);
    }
    names
}

fn collect_statement_names(statement: &Statement, names: &mut HashSet<String>) {
    match statement {
        Statement::Variable(declaration) => {
            for declarator in &declaration.declarations {
                names.extend(pattern_names(&declarator.id));
            }
        }
        Statement::Function(function) => {
            if let Some(id) = &function.id {
                names.insert(id.clone());
            }
        }
        Statement::Import(import) => {
            for specifier in &import.specifiers {
                names.insert(specifier.local().to_string());
            }
        }
        Statement::Export { declaration, .. } => collect_statement_names(declaration, names),
        _ => {}
    }
}

pub fn collect_param_names(params: &[Pattern]) -> HashSet<String> {
    params.iter().flat_map(pattern_names).collect()
}

pub fn pattern_names(pattern: &Pattern) -> Vec<String> {
    let mut names = Vec::new();
    pattern.bound_names(&mut names);
    names
}

/// Mutable bindings declared directly in a view body, in source order.
/// These become the view's tracked state.
pub fn collect_view_state(body: &[Statement]) -> Vec<String> {
    let mut names = Vec::new();
    for statement in body {
        if let Statement::Variable(declaration) = statement {
            if matches!(declaration.kind, VariableKind::Let | VariableKind::Var) {
                for declarator in &declaration.declarations {
                    declarator.id.bound_names(&mut names);
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_shadowing_stops_at_view_boundary() {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::File, names(&["count"]));
        scopes.push(ScopeKind::View, names(&["count"]));
        assert!(scopes.at_view_level());
        assert!(!scopes.is_shadowed("count"));

        scopes.push(ScopeKind::Function, names(&["count"]));
        assert!(!scopes.at_view_level());
        assert!(scopes.is_shadowed("count"));

        scopes.pop();
        scopes.push(ScopeKind::Block, names(&["other"]));
        assert!(!scopes.is_shadowed("count"));
        assert!(scopes.in_view());
    }

    #[test]
    fn test_file_binding_respects_inner_declarations() {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::File, names(&["theme", "Card"]));
        scopes.push(ScopeKind::View, names(&["theme"]));
        assert!(!scopes.is_file_binding("theme"));
        assert!(scopes.is_file_binding("Card"));
        assert!(!scopes.is_file_binding("missing"));
    }
}
