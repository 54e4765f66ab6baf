// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Declaration scope construction for tests.
//!
//! ```
//! use smith_dry_tests::{ActionBuilder, ScopeBuilder};
//! use smith_dag::DeclScope;
//!
//! let scope = ScopeBuilder::new()
//!     .field("a", 8)
//!     .field("b", 16)
//!     .action(ActionBuilder::new("set_a").writes_field("a", 8).build())
//!     .build();
//! assert_eq!(scope.bit_typed_vars().len(), 2);
//! assert_eq!(scope.actions().len(), 1);
//! ```

use smith_dag::{ActionDecl, Expr, Scope, Type};

/// `meta.<field>`.
pub fn meta(field: &str) -> Expr {
    Expr::member(Expr::path("meta"), field)
}

/// Builder for [`Scope`] values in tests.
#[derive(Debug, Clone, Default)]
pub struct ScopeBuilder {
    scope: Scope,
}

impl ScopeBuilder {
    /// Starts from an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `meta.<name>` as `bit<width>`.
    pub fn field(self, name: &str, width: u16) -> Self {
        self.var(meta(name), Type::Bit { width })
    }

    /// Declares `meta.f0 .. meta.f<count-1>`, all `bit<width>`.
    pub fn fields(mut self, count: usize, width: u16) -> Self {
        for i in 0..count {
            self = self.field(&format!("f{i}"), width);
        }
        self
    }

    /// Declares an arbitrary location.
    pub fn var(mut self, expr: Expr, ty: Type) -> Self {
        self.scope.declare_var(expr, ty);
        self
    }

    /// Declares an action.
    pub fn action(mut self, action: ActionDecl) -> Self {
        self.scope.declare_action(action);
        self
    }

    /// Finishes the scope.
    pub fn build(self) -> Scope {
        self.scope
    }
}
