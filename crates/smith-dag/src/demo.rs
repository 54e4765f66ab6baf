// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Self-contained scope and grammar so the generator runs end to end without a
//! host program generator.
use crate::grammar::{ExprGrammar, ExprRequirements};
use crate::ir::{ActionDecl, Direction, Expr, Param, Statement, Type};
use crate::prng::Prng;
use crate::scope::{DeclScope, Scope};

/// Widths synthetic metadata fields are drawn from.
pub const FIELD_WIDTHS: [u16; 4] = [8, 16, 32, 48];

const MAX_PARAMS: u64 = 2;
const MAX_BODY_LEN: u64 = 3;
const DIRECTIONS: [Direction; 4] = [Direction::None, Direction::In, Direction::Out, Direction::InOut];

/// Builds a scope with `vars` metadata fields `meta.f<i>` and `actions`
/// actions `a<i>` whose bodies assign those fields.
pub fn synthetic_scope(prng: &mut Prng, vars: usize, actions: usize) -> Scope {
    let mut scope = Scope::new();
    let mut fields = Vec::with_capacity(vars);
    for i in 0..vars {
        let width = prng.choose(&FIELD_WIDTHS).copied().unwrap_or(8);
        let expr = Expr::member(Expr::path("meta"), format!("f{i}"));
        scope.declare_var(expr.clone(), Type::Bit { width });
        fields.push((expr, width));
    }

    for i in 0..actions {
        let params: Vec<Param> = (0..prng.next_int(0, MAX_PARAMS))
            .map(|p| Param {
                name: format!("p{p}"),
                direction: prng.choose(&DIRECTIONS).copied().unwrap_or(Direction::None),
                ty: Type::Bit {
                    width: prng.choose(&FIELD_WIDTHS).copied().unwrap_or(8),
                },
            })
            .collect();
        let mut body = Vec::new();
        for _ in 0..prng.next_int(1, MAX_BODY_LEN) {
            let Some((lhs, width)) = prng.choose(&fields).cloned() else {
                break;
            };
            let rhs = params
                .iter()
                .find(|p| p.ty == Type::Bit { width } && p.direction != Direction::Out)
                .map_or_else(
                    || Expr::constant(u128::from(prng.next_u64()) & mask(width), width),
                    |p| Expr::path(p.name.clone()),
                );
            body.push(Statement::assign(lhs, rhs));
        }
        scope.declare_action(ActionDecl {
            name: format!("a{i}"),
            params,
            body,
        });
    }
    scope
}

fn mask(width: u16) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// Minimal grammar: literals for compile-time-known requests, declared
/// variables of the exact type otherwise, and slices of wider variables for
/// assignable locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicGrammar;

impl BasicGrammar {
    fn literal(ty: &Type, prng: &mut Prng) -> Option<Expr> {
        match *ty {
            Type::Bit { width } | Type::Int { width } => Some(Expr::constant(
                u128::from(prng.next_u64()) & mask(width),
                width,
            )),
            Type::Bool => Some(Expr::Bool(prng.chance(0.5))),
            Type::Named(_) => None,
        }
    }
}

impl ExprGrammar for BasicGrammar {
    fn gen_expression(
        &mut self,
        ty: &Type,
        req: ExprRequirements,
        scope: &dyn DeclScope,
        prng: &mut Prng,
    ) -> Option<Expr> {
        if req.compile_time_known {
            return Self::literal(ty, prng);
        }
        let candidates: Vec<&Expr> = scope
            .bit_typed_vars()
            .into_iter()
            .filter(|v| &v.ty == ty)
            .map(|v| &v.expr)
            .collect();
        match prng.choose(&candidates) {
            Some(expr) => Some((*expr).clone()),
            None => Self::literal(ty, prng),
        }
    }

    fn pick_lval_or_slice(
        &mut self,
        ty: &Type,
        scope: &dyn DeclScope,
        prng: &mut Prng,
    ) -> Option<Expr> {
        let Type::Bit { width } = *ty else {
            return None;
        };
        let vars = scope.bit_typed_vars();
        let exact: Vec<&Expr> = vars
            .iter()
            .filter(|v| v.ty == Type::Bit { width })
            .map(|v| &v.expr)
            .collect();
        if let Some(expr) = prng.choose(&exact) {
            return Some((*expr).clone());
        }
        let wider: Vec<&Expr> = vars
            .iter()
            .filter(|v| matches!(v.ty, Type::Bit { width: w } if w > width))
            .map(|v| &v.expr)
            .collect();
        let base = prng.choose(&wider)?;
        Some(Expr::slice((*base).clone(), width.checked_sub(1)?, 0))
    }

    fn check_input_arg(&self, param: &Param) -> bool {
        param.direction == Direction::None || !matches!(param.ty, Type::Named(_))
    }
}
