// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed dependency graph over table nodes.
//!
//! The graph is an arena: it owns every [`TableNode`], nodes are addressed by
//! [`TableId`], and edges are plain [`Dependency`] records referring to ids.
use std::fmt;

use serde::Serialize;

use crate::error::GenError;
use crate::fields::{FieldRef, FieldSet};
use crate::ir::{ActionDecl, TableDecl};
use crate::matrix::AdjacencyMatrix;

/// Arena index of a table node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct TableId(pub usize);

impl TableId {
    /// Deterministic node name derived from the index.
    pub fn name(self) -> String {
        format!("table{}", self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table{}", self.0)
    }
}

/// Hazard class carried by an edge.
///
/// Only [`DependencyKind::Raw`] is produced; the other kinds are reserved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum DependencyKind {
    /// Write-after-write.
    Waw,
    /// Read-after-write: the target matches a field the source writes.
    Raw,
    /// Write-after-read.
    War,
    /// Ordering only.
    Flow,
}

/// One directed edge; parallel edges are separate records.
///
/// Invariant: `source.0 > target.0`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Dependency {
    /// Upstream table (scheduled first, writes).
    pub source: TableId,
    /// Downstream table (scheduled later, matches).
    pub target: TableId,
    /// Hazard class.
    pub kind: DependencyKind,
}

/// Scheduling state of a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum TableState {
    /// Waiting on at least one inbound edge.
    Unscheduled,
    /// In-degree reached zero; sitting in the ready queue.
    Ready,
    /// Popped from the queue; generation is running against it.
    Active,
    /// Appended to the output order. Terminal.
    Finalized,
}

/// A logical table and the field bookkeeping that links it to its ancestors.
#[derive(Debug, Clone)]
pub struct TableNode {
    id: TableId,
    name: String,
    state: TableState,
    /// Indices into [`DependencyGraph::dependencies`] of edges leaving this node.
    pub(crate) outbound: Vec<usize>,
    /// Indices into [`DependencyGraph::dependencies`] of edges entering this node.
    pub(crate) inbound: Vec<usize>,
    pub(crate) table: Option<TableDecl>,
    pub(crate) fields_matched: FieldSet,
    pub(crate) fields_written: FieldSet,
    pub(crate) parents_matched: Vec<FieldSet>,
    pub(crate) parents_written: Vec<FieldSet>,
    pub(crate) actions_to_use: Vec<ActionDecl>,
}

impl TableNode {
    fn new(id: TableId) -> Self {
        Self {
            id,
            name: id.name(),
            state: TableState::Unscheduled,
            outbound: Vec::new(),
            inbound: Vec::new(),
            table: None,
            fields_matched: FieldSet::new(),
            fields_written: FieldSet::new(),
            parents_matched: Vec::new(),
            parents_written: Vec::new(),
            actions_to_use: Vec::new(),
        }
    }

    /// Arena id.
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Node name (`table<index>`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current scheduling state.
    pub fn state(&self) -> TableState {
        self.state
    }

    /// Synthesized declaration, once the node has been generated.
    pub fn table(&self) -> Option<&TableDecl> {
        self.table.as_ref()
    }

    /// Number of inbound edges, counting parallels.
    pub fn in_degree(&self) -> usize {
        self.inbound.len()
    }

    /// Number of outbound edges, counting parallels.
    pub fn out_degree(&self) -> usize {
        self.outbound.len()
    }

    /// Fields this table's keys reference.
    pub fn fields_matched(&self) -> &FieldSet {
        &self.fields_matched
    }

    /// Union of fields written by this table's chosen actions.
    pub fn fields_written(&self) -> &FieldSet {
        &self.fields_written
    }

    /// One matched-field set per finalized inbound edge.
    pub fn parents_matched(&self) -> &[FieldSet] {
        &self.parents_matched
    }

    /// One written-field set per finalized inbound edge.
    pub fn parents_written(&self) -> &[FieldSet] {
        &self.parents_written
    }

    /// Actions pre-assigned to this table.
    pub fn actions_to_use(&self) -> &[ActionDecl] {
        &self.actions_to_use
    }

    pub(crate) fn set_state(&mut self, state: TableState) {
        self.state = state;
    }

    fn ensure_active(&self) -> Result<(), GenError> {
        match self.state {
            TableState::Active => Ok(()),
            TableState::Finalized => Err(GenError::TableFinalized(self.id)),
            TableState::Unscheduled | TableState::Ready => Err(GenError::NoActiveTable),
        }
    }

    /// Records a field referenced by one of this table's keys.
    pub(crate) fn record_matched(&mut self, field: FieldRef) -> Result<(), GenError> {
        self.ensure_active()?;
        self.fields_matched.insert(field);
        Ok(())
    }

    /// Merges fields written by one of this table's actions.
    pub(crate) fn record_written(&mut self, fields: &FieldSet) -> Result<(), GenError> {
        self.ensure_active()?;
        self.fields_written.union_with(fields);
        Ok(())
    }
}

/// Arena of table nodes plus the flat edge list.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<TableNode>,
    dependencies: Vec<Dependency>,
}

impl DependencyGraph {
    /// Builds one node per matrix row and `matrix[i][j]` RAW edges `i -> j`.
    pub fn from_matrix(matrix: &AdjacencyMatrix) -> Self {
        let mut nodes: Vec<TableNode> = (0..matrix.dim()).map(|i| TableNode::new(TableId(i))).collect();
        let mut dependencies = Vec::new();
        for (row, col, count) in matrix.edges() {
            for _ in 0..count {
                let index = dependencies.len();
                dependencies.push(Dependency {
                    source: TableId(row),
                    target: TableId(col),
                    kind: DependencyKind::Raw,
                });
                nodes[row].outbound.push(index);
                nodes[col].inbound.push(index);
            }
        }
        Self {
            nodes,
            dependencies,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> &[TableNode] {
        &self.nodes
    }

    /// All edges, ordered by source row then target column.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Node lookup.
    pub fn node(&self, id: TableId) -> Option<&TableNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: TableId) -> Result<&mut TableNode, GenError> {
        self.nodes.get_mut(id.0).ok_or(GenError::UnknownTable(id))
    }

    /// Edges leaving `id`.
    pub fn outbound(&self, id: TableId) -> impl Iterator<Item = &Dependency> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.outbound.iter())
            .filter_map(|&i| self.dependencies.get(i))
    }

    /// Edges entering `id`.
    pub fn inbound(&self, id: TableId) -> impl Iterator<Item = &Dependency> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.inbound.iter())
            .filter_map(|&i| self.dependencies.get(i))
    }

    /// Pre-assigns `action` to `id` so its action list includes a call to it.
    ///
    /// Duplicate names are ignored.
    pub fn assign_action(&mut self, id: TableId, action: ActionDecl) -> Result<(), GenError> {
        let node = self.node_mut(id)?;
        if node.state == TableState::Finalized {
            return Err(GenError::TableFinalized(id));
        }
        if !node.actions_to_use.iter().any(|a| a.name == action.name) {
            node.actions_to_use.push(action);
        }
        Ok(())
    }

    /// Copies the finalized source's matched and written sets onto the
    /// target of `dep`, as one more ancestor entry each.
    pub(crate) fn propagate_along(&mut self, dep: Dependency) -> Result<(), GenError> {
        let (matched, written) = {
            let source = self.node(dep.source).ok_or(GenError::UnknownTable(dep.source))?;
            (source.fields_matched.clone(), source.fields_written.clone())
        };
        let target = self.node_mut(dep.target)?;
        if target.state == TableState::Finalized {
            return Err(GenError::TableFinalized(dep.target));
        }
        target.parents_matched.push(matched);
        target.parents_written.push(written);
        Ok(())
    }
}
