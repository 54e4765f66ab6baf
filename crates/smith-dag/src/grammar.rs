// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Expression grammar seam used for action-call arguments.
use crate::ir::{Expr, Param, Type};
use crate::prng::Prng;
use crate::scope::DeclScope;

/// Constraints the caller places on a generated expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExprRequirements {
    /// The expression must have a fixed-width scalar type.
    pub require_scalar: bool,
    /// The expression must be evaluable at compile time.
    pub compile_time_known: bool,
    /// Method calls may appear inside the expression.
    pub allow_method_calls: bool,
}

impl ExprRequirements {
    /// Requirements for an `in` argument of a table action call.
    pub const IN_ARG: Self = Self {
        require_scalar: false,
        compile_time_known: true,
        allow_method_calls: false,
    };
}

/// Grammar-based expression synthesizer owned by the host generator.
///
/// Every method may return `None` when no suitable expression exists; callers
/// treat that as scarcity and degrade the table instead of failing.
pub trait ExprGrammar {
    /// Generates an expression of type `ty` satisfying `req`.
    fn gen_expression(
        &mut self,
        ty: &Type,
        req: ExprRequirements,
        scope: &dyn DeclScope,
        prng: &mut Prng,
    ) -> Option<Expr>;

    /// Picks an assignable location (or a slice of one) of type `ty`.
    fn pick_lval_or_slice(
        &mut self,
        ty: &Type,
        scope: &dyn DeclScope,
        prng: &mut Prng,
    ) -> Option<Expr>;

    /// `false` when the grammar cannot produce any argument for `param`.
    fn check_input_arg(&self, param: &Param) -> bool;
}
