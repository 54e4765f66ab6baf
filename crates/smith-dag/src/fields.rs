// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Written-field extraction from action bodies.
use serde::Serialize;
use tracing::debug;

use crate::ir::{Expr, Statement};
use crate::scope::DeclScope;

/// A field identified by name, together with the expression that reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRef {
    /// Base identifier the left-hand side resolved to.
    pub name: String,
    /// Full reference expression, reused verbatim as a key expression downstream.
    pub expr: Expr,
}

/// Insertion-ordered set of fields, unique by name.
///
/// The key is the bare resolved identifier, not the full path: `hdr.ipv4.ttl`
/// and `meta.ttl` share the entry `ttl`, and the expression inserted first is
/// the one kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldSet {
    fields: Vec<FieldRef>,
}

impl FieldSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `field` unless a field with the same name is present.
    /// Returns `true` when the set grew.
    pub fn insert(&mut self, field: FieldRef) -> bool {
        if self.contains(&field.name) {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Inserts every field of `other` not already present.
    pub fn union_with(&mut self, other: &FieldSet) {
        for field in &other.fields {
            self.insert(field.clone());
        }
    }

    /// `true` when a field named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Field at position `index`.
    pub fn get(&self, index: usize) -> Option<&FieldRef> {
        self.fields.get(index)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldRef> {
        self.fields.iter()
    }
}

impl FromIterator<FieldRef> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldRef>>(iter: I) -> Self {
        let mut set = Self::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

/// Resolves an assignment target to the identifier it writes.
///
/// A path yields its name, a member selection yields the selected field,
/// and slices and indexed accesses resolve through their base.
pub fn written_identifier(lhs: &Expr) -> Option<&str> {
    match lhs {
        Expr::Path(name) => Some(name),
        Expr::Member { field, .. } => Some(field),
        Expr::Slice { base, .. } | Expr::Index { base, .. } => written_identifier(base),
        Expr::Constant { .. } | Expr::Bool(_) | Expr::Binary { .. } => None,
    }
}

/// Collects the in-scope fields written by top-level assignments of `body`.
///
/// Nested blocks and conditionals are not descended into. Re-assigning a
/// field does not duplicate it.
pub fn collect_written_fields(body: &[Statement], scope: &dyn DeclScope) -> FieldSet {
    let mut written = FieldSet::new();
    for stmt in body {
        let Statement::Assign { lhs, .. } = stmt else {
            continue;
        };
        if !scope.has_lval(lhs) {
            continue;
        }
        let Some(name) = written_identifier(lhs) else {
            continue;
        };
        if written.insert(FieldRef {
            name: name.to_owned(),
            expr: lhs.clone(),
        }) {
            debug!(field = name, "recorded written field");
        }
    }
    written
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ir::Type;
    use crate::scope::Scope;

    fn meta(field: &str) -> Expr {
        Expr::member(Expr::path("meta"), field)
    }

    fn scope() -> Scope {
        let mut scope = Scope::new();
        scope.declare_var(meta("a"), Type::Bit { width: 8 });
        scope.declare_var(Expr::path("x"), Type::Bit { width: 16 });
        scope.declare_var(Expr::path("stack"), Type::Named("h_t[4]".into()));
        scope
    }

    #[test]
    fn resolves_every_lvalue_shape() {
        assert_eq!(written_identifier(&Expr::path("x")), Some("x"));
        assert_eq!(written_identifier(&meta("a")), Some("a"));
        assert_eq!(written_identifier(&Expr::slice(Expr::path("x"), 3, 0)), Some("x"));
        assert_eq!(
            written_identifier(&Expr::index(Expr::path("stack"), Expr::constant(0, 32))),
            Some("stack")
        );
        assert_eq!(written_identifier(&Expr::constant(1, 8)), None);
    }

    #[test]
    fn collects_top_level_assignments_once() {
        let body = vec![
            Statement::assign(meta("a"), Expr::constant(1, 8)),
            Statement::assign(Expr::slice(Expr::path("x"), 7, 0), Expr::constant(2, 8)),
            Statement::assign(meta("a"), Expr::constant(3, 8)),
        ];
        let written = collect_written_fields(&body, &scope());
        let names: Vec<&str> = written.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "x"]);
        assert_eq!(written.get(0).map(|f| &f.expr), Some(&meta("a")));
    }

    #[test]
    fn ignores_out_of_scope_and_nested_writes() {
        let body = vec![
            Statement::assign(Expr::path("local"), Expr::constant(1, 8)),
            Statement::Block(vec![Statement::assign(Expr::path("x"), Expr::constant(1, 16))]),
            Statement::If {
                cond: Expr::Bool(true),
                then_branch: vec![Statement::assign(meta("a"), Expr::constant(1, 8))],
                else_branch: vec![],
            },
            Statement::Call {
                callee: "mark_to_drop".into(),
                args: vec![],
            },
        ];
        assert!(collect_written_fields(&body, &scope()).is_empty());
    }

    #[test]
    fn ignores_undeclared_members_of_declared_roots() {
        let body = vec![
            Statement::assign(meta("zzz"), Expr::constant(1, 8)),
            Statement::assign(Expr::slice(meta("zzz"), 3, 0), Expr::constant(1, 4)),
            Statement::assign(Expr::path("meta"), Expr::constant(1, 8)),
        ];
        assert!(collect_written_fields(&body, &scope()).is_empty());

        let body = vec![
            Statement::assign(Expr::slice(meta("a"), 3, 0), Expr::constant(1, 4)),
            Statement::assign(
                Expr::index(Expr::path("stack"), Expr::constant(1, 32)),
                Expr::constant(0, 8),
            ),
        ];
        let written = collect_written_fields(&body, &scope());
        let names: Vec<&str> = written.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "stack"]);
    }

    #[test]
    fn fields_with_the_same_name_share_an_entry() {
        let ipv4_ttl = Expr::member(Expr::member(Expr::path("hdr"), "ipv4"), "ttl");
        let mut scope = scope();
        scope.declare_var(meta("ttl"), Type::Bit { width: 8 });
        scope.declare_var(ipv4_ttl.clone(), Type::Bit { width: 8 });
        let body = vec![
            Statement::assign(ipv4_ttl.clone(), Expr::constant(64, 8)),
            Statement::assign(meta("ttl"), Expr::constant(1, 8)),
        ];
        let written = collect_written_fields(&body, &scope);
        assert_eq!(written.len(), 1);
        assert!(written.contains("ttl"));
        assert_eq!(written.get(0).map(|f| &f.expr), Some(&ipv4_ttl));
    }

    #[test]
    fn union_keeps_first_occurrence() {
        let mut a: FieldSet = [FieldRef {
            name: "a".into(),
            expr: meta("a"),
        }]
        .into_iter()
        .collect();
        let b: FieldSet = [
            FieldRef {
                name: "a".into(),
                expr: Expr::path("a"),
            },
            FieldRef {
                name: "x".into(),
                expr: Expr::path("x"),
            },
        ]
        .into_iter()
        .collect();
        a.union_with(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(0).map(|f| &f.expr), Some(&meta("a")));
    }
}
