// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ergonomic action construction for tests.
//!
//! ```
//! use smith_dry_tests::ActionBuilder;
//! use smith_dag::Direction;
//!
//! let action = ActionBuilder::new("set_a")
//!     .param("v", Direction::In, 8)
//!     .writes_field("a", 8)
//!     .build();
//! assert_eq!(action.params.len(), 1);
//! assert_eq!(action.body.len(), 1);
//! ```

use smith_dag::{ActionDecl, Direction, Expr, Param, Statement, Type};

use crate::scope::meta;

/// Builder for [`ActionDecl`] values in tests.
#[derive(Debug, Clone)]
pub struct ActionBuilder {
    name: String,
    params: Vec<Param>,
    body: Vec<Statement>,
}

impl ActionBuilder {
    /// Starts an action with no parameters and an empty body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a `bit<width>` parameter.
    pub fn param(mut self, name: &str, direction: Direction, width: u16) -> Self {
        self.params.push(Param {
            name: name.to_owned(),
            direction,
            ty: Type::Bit { width },
        });
        self
    }

    /// Appends a parameter of an arbitrary type.
    pub fn typed_param(mut self, name: &str, direction: Direction, ty: Type) -> Self {
        self.params.push(Param {
            name: name.to_owned(),
            direction,
            ty,
        });
        self
    }

    /// Appends `meta.<field> = <width>w1;`.
    pub fn writes_field(self, field: &str, width: u16) -> Self {
        self.assigns(meta(field), Expr::constant(1, width))
    }

    /// Appends `lhs = rhs;`.
    pub fn assigns(mut self, lhs: Expr, rhs: Expr) -> Self {
        self.body.push(Statement::assign(lhs, rhs));
        self
    }

    /// Appends an arbitrary statement.
    pub fn statement(mut self, stmt: Statement) -> Self {
        self.body.push(stmt);
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> ActionDecl {
        ActionDecl {
            name: self.name,
            params: self.params,
            body: self.body,
        }
    }
}
