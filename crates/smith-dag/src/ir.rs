// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal program model for the pieces the table generator touches.
//!
//! Parsing, type checking and full pretty-printing belong to the host
//! toolchain; these types only carry what key synthesis, action-call
//! synthesis and field-write collection need.
use std::fmt;

use serde::Serialize;

/// Value types visible to key and argument synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// Unsigned fixed-width bit vector `bit<width>`.
    Bit {
        /// Width in bits.
        width: u16,
    },
    /// Signed fixed-width integer `int<width>`.
    Int {
        /// Width in bits.
        width: u16,
    },
    /// Boolean.
    Bool,
    /// Named header, struct or typedef.
    Named(String),
}

impl Type {
    /// `true` for `bit<W>` and `int<W>`, the only types a table key may read.
    pub fn is_bit_typed(&self) -> bool {
        matches!(self, Self::Bit { .. } | Self::Int { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit { width } => write!(f, "bit<{width}>"),
            Self::Int { width } => write!(f, "int<{width}>"),
            Self::Bool => f.write_str("bool"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Parameter direction of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Directionless: supplied by the control plane at runtime.
    None,
    /// `in`: read-only, must be compile-time known inside a table action list.
    In,
    /// `out`: written by the action.
    Out,
    /// `inout`: read and written by the action.
    InOut,
}

/// Binary operators the model keeps for generated right-hand sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }
}

/// Expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Expr {
    /// Reference to a declared name.
    Path(String),
    /// Field selection `base.field`.
    Member {
        /// Selected-from value.
        base: Box<Expr>,
        /// Field name.
        field: String,
    },
    /// Bit slice `base[hi:lo]`.
    Slice {
        /// Sliced value.
        base: Box<Expr>,
        /// High bit (inclusive).
        hi: u16,
        /// Low bit (inclusive).
        lo: u16,
    },
    /// Indexed access `base[index]`.
    Index {
        /// Indexed value (header stack or array).
        base: Box<Expr>,
        /// Index expression.
        index: Box<Expr>,
    },
    /// Integer literal, optionally width-annotated (`8w3`).
    Constant {
        /// Literal value.
        value: u128,
        /// Width prefix, if any.
        width: Option<u16>,
    },
    /// Boolean literal.
    Bool(bool),
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Shorthand for [`Expr::Path`].
    pub fn path(name: impl Into<String>) -> Self {
        Self::Path(name.into())
    }

    /// Shorthand for [`Expr::Member`].
    pub fn member(base: Expr, field: impl Into<String>) -> Self {
        Self::Member {
            base: Box::new(base),
            field: field.into(),
        }
    }

    /// Shorthand for [`Expr::Slice`].
    pub fn slice(base: Expr, hi: u16, lo: u16) -> Self {
        Self::Slice {
            base: Box::new(base),
            hi,
            lo,
        }
    }

    /// Shorthand for [`Expr::Index`].
    pub fn index(base: Expr, index: Expr) -> Self {
        Self::Index {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    /// Shorthand for a width-annotated [`Expr::Constant`].
    pub fn constant(value: u128, width: u16) -> Self {
        Self::Constant {
            value,
            width: Some(width),
        }
    }

    /// Returns the outermost declared name this expression is rooted at.
    ///
    /// `hdr.eth.dst[7:0]` is rooted at `hdr`. Literals and operators have no root.
    pub fn root_name(&self) -> Option<&str> {
        match self {
            Self::Path(name) => Some(name),
            Self::Member { base, .. } | Self::Slice { base, .. } | Self::Index { base, .. } => {
                base.root_name()
            }
            Self::Constant { .. } | Self::Bool(_) | Self::Binary { .. } => None,
        }
    }

    /// `true` when the expression is built only from literals.
    pub fn is_compile_time_known(&self) -> bool {
        match self {
            Self::Constant { .. } | Self::Bool(_) => true,
            Self::Binary { lhs, rhs, .. } => {
                lhs.is_compile_time_known() && rhs.is_compile_time_known()
            }
            Self::Path(_) | Self::Member { .. } | Self::Slice { .. } | Self::Index { .. } => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(name) => f.write_str(name),
            Self::Member { base, field } => write!(f, "{base}.{field}"),
            Self::Slice { base, hi, lo } => write!(f, "{base}[{hi}:{lo}]"),
            Self::Index { base, index } => write!(f, "{base}[{index}]"),
            Self::Constant {
                value,
                width: Some(width),
            } => write!(f, "{width}w{value}"),
            Self::Constant { value, width: None } => write!(f, "{value}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

/// Statement forms an action body may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Statement {
    /// `lhs = rhs;`
    Assign {
        /// Assigned location.
        lhs: Expr,
        /// Assigned value.
        rhs: Expr,
    },
    /// Call statement `name(args);`
    Call {
        /// Callee name.
        callee: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
    /// Nested block.
    Block(Vec<Statement>),
    /// Conditional.
    If {
        /// Condition.
        cond: Expr,
        /// Taken branch.
        then_branch: Vec<Statement>,
        /// Untaken branch.
        else_branch: Vec<Statement>,
    },
}

impl Statement {
    /// Shorthand for [`Statement::Assign`].
    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        Self::Assign { lhs, rhs }
    }
}

/// Declared action parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Direction.
    pub direction: Direction,
    /// Parameter type.
    pub ty: Type,
}

/// Declared action: name, parameter list and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDecl {
    /// Action name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Body statements.
    pub body: Vec<Statement>,
}

/// Comparison semantics of a table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Exact match.
    Exact,
    /// Longest-prefix match.
    Lpm,
    /// Masked match.
    Ternary,
}

impl MatchKind {
    /// All kinds, in the order their weights are configured.
    pub const ALL: [MatchKind; 3] = [MatchKind::Exact, MatchKind::Lpm, MatchKind::Ternary];

    /// Surface keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Lpm => "lpm",
            Self::Ternary => "ternary",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a table's `key` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyElement {
    /// Matched expression.
    pub expr: Expr,
    /// Match kind.
    pub match_kind: MatchKind,
    /// Text of the `@name` annotation (the rendered expression).
    pub annotation: String,
}

impl KeyElement {
    /// Builds a key whose `@name` annotation is the rendered expression.
    pub fn new(expr: Expr, match_kind: MatchKind) -> Self {
        let annotation = expr.to_string();
        Self {
            expr,
            match_kind,
            annotation,
        }
    }
}

/// One entry of a table's `actions` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCall {
    /// Called action.
    pub action: String,
    /// Arguments for non-directionless parameters, in parameter order.
    pub args: Vec<Expr>,
}

/// Synthesized table declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDecl {
    /// Declared table name.
    pub name: String,
    /// Key list.
    pub keys: Vec<KeyElement>,
    /// Action list.
    pub actions: Vec<ActionCall>,
    /// `size` property.
    pub size: u32,
}
