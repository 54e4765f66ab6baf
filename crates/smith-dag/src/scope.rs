// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Declaration scope seam.
//!
//! The generator never owns the program's declarations; it asks a
//! [`DeclScope`] for candidates and registers each finished table back into it.
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::ir::{ActionDecl, Expr, TableDecl, Type};

/// A declared, assignable location and its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredVar {
    /// Reference expression (`meta.f0`, `x`, ...).
    pub expr: Expr,
    /// Declared type.
    pub ty: Type,
}

/// Registry of names and types currently available to the generator.
pub trait DeclScope {
    /// Every declared variable whose type is `bit<W>` or `int<W>`.
    fn bit_typed_vars(&self) -> Vec<&DeclaredVar>;

    /// Every declared action, in declaration order.
    fn actions(&self) -> &[ActionDecl];

    /// Looks up a declared action by name.
    fn action(&self, name: &str) -> Option<&ActionDecl> {
        self.actions().iter().find(|a| a.name == name)
    }

    /// `true` when `expr` denotes an assignable location declared in scope.
    fn has_lval(&self, expr: &Expr) -> bool;

    /// `true` when `name` is already taken by any declaration.
    fn is_declared(&self, name: &str) -> bool;

    /// Registers a finished table declaration.
    fn declare_table(&mut self, table: &TableDecl);
}

/// In-memory [`DeclScope`] backed by flat vectors.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: Vec<DeclaredVar>,
    actions: Vec<ActionDecl>,
    tables: Vec<TableDecl>,
    names: FxHashSet<String>,
    lvals: FxHashSet<String>,
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an assignable location. Returns `false` if it was already declared.
    pub fn declare_var(&mut self, expr: Expr, ty: Type) -> bool {
        let rendered = expr.to_string();
        if !self.lvals.insert(rendered) {
            return false;
        }
        if let Some(root) = expr.root_name() {
            self.names.insert(root.to_owned());
        }
        self.vars.push(DeclaredVar { expr, ty });
        true
    }

    /// Declares an action. Returns `false` if its name is already taken.
    pub fn declare_action(&mut self, action: ActionDecl) -> bool {
        if !self.names.insert(action.name.clone()) {
            return false;
        }
        self.actions.push(action);
        true
    }

    /// All declared variables, bit-typed or not.
    pub fn vars(&self) -> &[DeclaredVar] {
        &self.vars
    }

    /// Tables registered so far, in registration order.
    pub fn tables(&self) -> &[TableDecl] {
        &self.tables
    }
}

impl DeclScope for Scope {
    fn bit_typed_vars(&self) -> Vec<&DeclaredVar> {
        self.vars.iter().filter(|v| v.ty.is_bit_typed()).collect()
    }

    fn actions(&self) -> &[ActionDecl] {
        &self.actions
    }

    /// A declared location, or a member, slice or element of one.
    fn has_lval(&self, expr: &Expr) -> bool {
        let mut current = expr;
        loop {
            if self.lvals.contains(&current.to_string()) {
                return true;
            }
            match current {
                Expr::Member { base, .. } | Expr::Slice { base, .. } | Expr::Index { base, .. } => {
                    current = base;
                }
                _ => return false,
            }
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn declare_table(&mut self, table: &TableDecl) {
        self.names.insert(table.name.clone());
        self.tables.push(table.clone());
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_bit_typed_vars_are_key_candidates() {
        let mut scope = Scope::new();
        scope.declare_var(Expr::member(Expr::path("meta"), "a"), Type::Bit { width: 8 });
        scope.declare_var(Expr::member(Expr::path("meta"), "flag"), Type::Bool);
        scope.declare_var(Expr::path("x"), Type::Int { width: 16 });
        let names: Vec<String> = scope
            .bit_typed_vars()
            .iter()
            .map(|v| v.expr.to_string())
            .collect();
        assert_eq!(names, vec!["meta.a".to_owned(), "x".to_owned()]);
    }

    #[test]
    fn duplicate_declarations_are_refused() {
        let mut scope = Scope::new();
        assert!(scope.declare_var(Expr::path("x"), Type::Bit { width: 8 }));
        assert!(!scope.declare_var(Expr::path("x"), Type::Bit { width: 8 }));
        let action = ActionDecl {
            name: "a0".into(),
            params: vec![],
            body: vec![],
        };
        assert!(scope.declare_action(action.clone()));
        assert!(!scope.declare_action(action));
        assert_eq!(scope.actions().len(), 1);
    }

    #[test]
    fn lvals_resolve_to_a_declared_location() {
        let mut scope = Scope::new();
        scope.declare_var(Expr::member(Expr::path("meta"), "a"), Type::Bit { width: 8 });
        scope.declare_var(Expr::path("stack"), Type::Named("h_t[4]".into()));
        assert!(scope.has_lval(&Expr::member(Expr::path("meta"), "a")));
        assert!(scope.has_lval(&Expr::slice(Expr::member(Expr::path("meta"), "a"), 3, 0)));
        assert!(scope.has_lval(&Expr::index(Expr::path("stack"), Expr::constant(0, 32))));
        assert!(!scope.has_lval(&Expr::path("undeclared")));
        assert!(!scope.has_lval(&Expr::constant(1, 8)));
    }

    #[test]
    fn undeclared_members_of_a_declared_root_are_not_lvals() {
        let mut scope = Scope::new();
        scope.declare_var(Expr::member(Expr::path("meta"), "a"), Type::Bit { width: 8 });
        assert!(!scope.has_lval(&Expr::member(Expr::path("meta"), "zzz")));
        assert!(!scope.has_lval(&Expr::slice(Expr::member(Expr::path("meta"), "zzz"), 3, 0)));
        assert!(!scope.has_lval(&Expr::path("meta")));
        assert!(scope.is_declared("meta"));
    }

    #[test]
    fn declared_tables_take_their_names() {
        let mut scope = Scope::new();
        scope.declare_table(&TableDecl {
            name: "table0".into(),
            keys: vec![],
            actions: vec![],
            size: 512,
        });
        assert!(scope.is_declared("table0"));
        assert_eq!(scope.tables().len(), 1);
    }
}
