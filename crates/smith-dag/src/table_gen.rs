// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table synthesis constrained by the scheduling state of the active node.
//!
//! Keys may be forced to read a field an ancestor table writes, which is what
//! turns a scheduled edge into an observable read-after-write hazard. Missing
//! candidates never fail generation: the slot is dropped and the table ends
//! up smaller.
use std::collections::BTreeSet;

use tracing::debug;

use crate::config::{LenRange, TableConfig, DEFAULT_TABLE_SIZE, SIZE_BUCKETS};
use crate::error::GenError;
use crate::fields::{FieldRef, FieldSet};
use crate::grammar::{ExprGrammar, ExprRequirements};
use crate::graph::TableNode;
use crate::ir::{ActionCall, ActionDecl, Direction, Expr, KeyElement, MatchKind, TableDecl};
use crate::prng::Prng;
use crate::scope::{DeclScope, DeclaredVar};

/// Table-local match-kind bookkeeping.
///
/// `lpm` is legal only while neither flag is set, `ternary` only while no
/// `lpm` key exists, and `exact` always. Reset before every key list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    lpm_used: bool,
    ternary_used: bool,
}

impl MatchPolicy {
    /// Clears both flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `true` once an `lpm` key was emitted for the current table.
    pub fn lpm_used(&self) -> bool {
        self.lpm_used
    }

    /// `true` once a `ternary` key was emitted for the current table.
    pub fn ternary_used(&self) -> bool {
        self.ternary_used
    }

    /// Maps a requested kind to the kind actually allowed, falling back to `exact`.
    pub fn admit(&self, requested: MatchKind) -> MatchKind {
        match requested {
            MatchKind::Lpm if !self.lpm_used && !self.ternary_used => MatchKind::Lpm,
            MatchKind::Ternary if !self.lpm_used => MatchKind::Ternary,
            _ => MatchKind::Exact,
        }
    }

    /// Notes that a key of `kind` was emitted.
    pub fn record(&mut self, kind: MatchKind) {
        match kind {
            MatchKind::Lpm => self.lpm_used = true,
            MatchKind::Ternary => self.ternary_used = true,
            MatchKind::Exact => {}
        }
    }
}

/// Borrowed view of everything table synthesis reads or mutates.
pub struct GenContext<'a> {
    /// Shared random stream.
    pub prng: &'a mut Prng,
    /// Declaration scope.
    pub scope: &'a mut dyn DeclScope,
    /// Expression grammar.
    pub grammar: &'a mut dyn ExprGrammar,
    /// Match-kind flags of the table being generated.
    pub policy: &'a mut MatchPolicy,
    /// Synthesis settings.
    pub config: &'a TableConfig,
}

fn draw_len(prng: &mut Prng, range: LenRange) -> usize {
    prng.next_int(range.min as u64, range.max as u64) as usize
}

/// Synthesizes the full declaration for the active `node`: keys, then actions,
/// then size, then a scope-unique name.
pub fn gen_table(ctx: &mut GenContext<'_>, node: &mut TableNode) -> Result<TableDecl, GenError> {
    let keys = gen_key_list(ctx, node)?;
    let actions = gen_action_list(ctx, node);
    let size = gen_size(ctx);
    let name = unique_name(&*ctx.scope, node.name());
    Ok(TableDecl {
        name,
        keys,
        actions,
        size,
    })
}

/// Returns `base`, or `base_<k>` for the smallest `k` not yet declared.
pub fn unique_name(scope: &dyn DeclScope, base: &str) -> String {
    if !scope.is_declared(base) {
        return base.to_owned();
    }
    let mut k = 1usize;
    loop {
        let candidate = format!("{base}_{k}");
        if !scope.is_declared(&candidate) {
            return candidate;
        }
        k += 1;
    }
}

/// Draws a match kind by weight and filters it through the table policy.
pub fn gen_match_kind(ctx: &mut GenContext<'_>) -> MatchKind {
    let requested = ctx
        .prng
        .pick_weighted(&ctx.config.match_weights())
        .and_then(|i| MatchKind::ALL.get(i).copied())
        .unwrap_or(MatchKind::Exact);
    ctx.policy.admit(requested)
}

/// Builds a key over `expr` with a policy-checked match kind.
pub fn gen_key_element(ctx: &mut GenContext<'_>, expr: Expr) -> KeyElement {
    let kind = gen_match_kind(ctx);
    ctx.policy.record(kind);
    KeyElement::new(expr, kind)
}

/// Generates the key list of the active node.
///
/// Each slot first decides whether to enforce an upstream dependency. An
/// enforced slot matches a field some finalized ancestor writes and records it
/// in the node's matched set; one enforced key per table is enough to carry the
/// hazard. Other slots get a free key over an unused bit-typed variable, or are
/// dropped when none is left.
pub fn gen_key_list(
    ctx: &mut GenContext<'_>,
    node: &mut TableNode,
) -> Result<Vec<KeyElement>, GenError> {
    ctx.policy.reset();
    let len = draw_len(ctx.prng, ctx.config.key_len);
    let mut keys = Vec::with_capacity(len);
    let mut keyed: Vec<String> = Vec::new();
    let mut enforced = false;

    for _ in 0..len {
        if !enforced && ctx.config.dependency_aware && wants_dependency(ctx) {
            if let Some(field) = pick_parent_field(ctx.prng, node.parents_written(), &keyed) {
                keyed.push(field.expr.to_string());
                let key = gen_key_element(ctx, field.expr.clone());
                debug!(table = node.name(), field = %field.name, "enforced dependency key");
                node.record_matched(field)?;
                keys.push(key);
                enforced = true;
                continue;
            }
        }
        match gen_free_key(ctx, &mut keyed) {
            Some(key) => keys.push(key),
            None => debug!(table = node.name(), "no bit-typed variable left for key slot"),
        }
    }
    Ok(keys)
}

fn wants_dependency(ctx: &mut GenContext<'_>) -> bool {
    let weights = [
        ctx.config.dependency_enforce,
        ctx.config.dependency_not_enforce,
    ];
    ctx.prng.pick_weighted(&weights) == Some(0)
}

/// Picks a non-empty ancestor entry uniformly, then a field from it uniformly.
///
/// Fields whose expression is already keyed in this table are not candidates.
pub fn pick_parent_field(
    prng: &mut Prng,
    parents: &[FieldSet],
    keyed: &[String],
) -> Option<FieldRef> {
    let eligible: Vec<Vec<&FieldRef>> = parents
        .iter()
        .map(|set| {
            set.iter()
                .filter(|f| !keyed.contains(&f.expr.to_string()))
                .collect::<Vec<_>>()
        })
        .filter(|fields| !fields.is_empty())
        .collect();
    let entry = prng.choose(&eligible)?;
    prng.choose(entry).map(|f| (*f).clone())
}

fn gen_free_key(ctx: &mut GenContext<'_>, keyed: &mut Vec<String>) -> Option<KeyElement> {
    let kind = gen_match_kind(ctx);
    let candidates: Vec<DeclaredVar> = ctx
        .scope
        .bit_typed_vars()
        .into_iter()
        .filter(|v| !keyed.contains(&v.expr.to_string()))
        .cloned()
        .collect();
    let var = ctx.prng.choose(&candidates)?;
    keyed.push(var.expr.to_string());
    ctx.policy.record(kind);
    Some(KeyElement::new(var.expr.clone(), kind))
}

/// Generates the action list of the active node.
///
/// Pre-assigned actions come first; the remaining slots draw uniformly from
/// every declared action, skipping names already listed. A draw that hits a
/// duplicate consumes its slot.
pub fn gen_action_list(ctx: &mut GenContext<'_>, node: &TableNode) -> Vec<ActionCall> {
    let len = draw_len(ctx.prng, ctx.config.action_len);
    let mut calls = Vec::new();
    let mut used: BTreeSet<String> = BTreeSet::new();

    if ctx.config.dependency_aware {
        for action in node.actions_to_use() {
            used.insert(action.name.clone());
            if let Some(call) = gen_action_call(ctx, action) {
                calls.push(call);
            }
        }
    }

    let available: Vec<ActionDecl> = ctx.scope.actions().to_vec();
    if available.is_empty() {
        return calls;
    }
    for _ in calls.len()..len {
        let Some(action) = ctx.prng.choose(&available) else {
            break;
        };
        if !used.insert(action.name.clone()) {
            continue;
        }
        if let Some(call) = gen_action_call(ctx, action) {
            calls.push(call);
        }
    }
    calls
}

/// Synthesizes arguments for a call to `action` inside a table action list.
///
/// Directionless parameters are left to the control plane, `in` parameters
/// get a compile-time-known expression, everything else an assignable
/// location. Returns `None` when any argument cannot be produced.
pub fn gen_action_call(ctx: &mut GenContext<'_>, action: &ActionDecl) -> Option<ActionCall> {
    let mut args = Vec::new();
    for param in &action.params {
        if !ctx.grammar.check_input_arg(param) {
            return None;
        }
        let arg = match param.direction {
            Direction::None => continue,
            Direction::In => ctx.grammar.gen_expression(
                &param.ty,
                ExprRequirements::IN_ARG,
                &*ctx.scope,
                ctx.prng,
            )?,
            Direction::Out | Direction::InOut => {
                ctx.grammar
                    .pick_lval_or_slice(&param.ty, &*ctx.scope, ctx.prng)?
            }
        };
        args.push(arg);
    }
    Some(ActionCall {
        action: action.name.clone(),
        args,
    })
}

/// Draws the `size` property: `512 << bucket` by configured weight, 512 otherwise.
///
/// Weights past the last bucket are ignored, so sizes stay within 512..=65536.
pub fn gen_size(ctx: &mut GenContext<'_>) -> u32 {
    ctx.config
        .size_weights
        .as_deref()
        .map(|weights| &weights[..weights.len().min(SIZE_BUCKETS)])
        .and_then(|weights| ctx.prng.pick_weighted(weights))
        .map_or(DEFAULT_TABLE_SIZE, |bucket| DEFAULT_TABLE_SIZE << bucket)
}
