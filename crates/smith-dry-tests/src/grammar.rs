// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Grammar fakes.

use std::cell::Cell;

use smith_dag::demo::BasicGrammar;
use smith_dag::{DeclScope, Expr, ExprGrammar, ExprRequirements, Param, Prng, Type};

/// Delegates to [`BasicGrammar`] and counts every call.
#[derive(Debug, Default)]
pub struct RecordingGrammar {
    inner: BasicGrammar,
    expressions: usize,
    compile_time_requests: usize,
    lvals: usize,
    arg_checks: Cell<usize>,
}

impl RecordingGrammar {
    /// Creates a fresh recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `gen_expression` calls.
    pub fn expressions(&self) -> usize {
        self.expressions
    }

    /// Number of `gen_expression` calls that required a compile-time-known value.
    pub fn compile_time_requests(&self) -> usize {
        self.compile_time_requests
    }

    /// Number of `pick_lval_or_slice` calls.
    pub fn lvals(&self) -> usize {
        self.lvals
    }

    /// Number of `check_input_arg` calls.
    pub fn arg_checks(&self) -> usize {
        self.arg_checks.get()
    }
}

impl ExprGrammar for RecordingGrammar {
    fn gen_expression(
        &mut self,
        ty: &Type,
        req: ExprRequirements,
        scope: &dyn DeclScope,
        prng: &mut Prng,
    ) -> Option<Expr> {
        self.expressions += 1;
        if req.compile_time_known {
            self.compile_time_requests += 1;
        }
        self.inner.gen_expression(ty, req, scope, prng)
    }

    fn pick_lval_or_slice(
        &mut self,
        ty: &Type,
        scope: &dyn DeclScope,
        prng: &mut Prng,
    ) -> Option<Expr> {
        self.lvals += 1;
        self.inner.pick_lval_or_slice(ty, scope, prng)
    }

    fn check_input_arg(&self, param: &Param) -> bool {
        self.arg_checks.set(self.arg_checks.get() + 1);
        self.inner.check_input_arg(param)
    }
}

/// Grammar that can never produce anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct StarvedGrammar;

impl ExprGrammar for StarvedGrammar {
    fn gen_expression(
        &mut self,
        _ty: &Type,
        _req: ExprRequirements,
        _scope: &dyn DeclScope,
        _prng: &mut Prng,
    ) -> Option<Expr> {
        None
    }

    fn pick_lval_or_slice(
        &mut self,
        _ty: &Type,
        _scope: &dyn DeclScope,
        _prng: &mut Prng,
    ) -> Option<Expr> {
        None
    }

    fn check_input_arg(&self, _param: &Param) -> bool {
        true
    }
}
