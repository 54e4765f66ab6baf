// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Incremental topological scheduler (Kahn's algorithm).
//!
//! Ordering invariant:
//! - Roots are seeded in ascending index order.
//! - A node enters the ready queue exactly once, when its last inbound edge is
//!   released by a finalized source.
//! - The queue is FIFO, so the resulting order is fully determined by the graph.
//!
//! Unlike a plain topological sort, the scheduler hands out one node at a time
//! and waits for the caller to finalize it, so generation for the active node
//! can observe everything its ancestors produced.
use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::GenError;
use crate::graph::{DependencyGraph, TableId, TableState};

/// Ready-queue scheduler over a [`DependencyGraph`].
#[derive(Debug, Default)]
pub struct TopoScheduler {
    /// Remaining in-degree of nodes that are not yet ready.
    pending: FxHashMap<TableId, usize>,
    ready: VecDeque<TableId>,
    current: Option<TableId>,
    order: Vec<TableId>,
}

impl TopoScheduler {
    /// Seeds the ready queue with every zero in-degree node, in index order,
    /// and records the in-degree of all others.
    pub fn new(graph: &mut DependencyGraph) -> Self {
        let mut scheduler = Self::default();
        let ids: Vec<(TableId, usize)> = graph
            .nodes()
            .iter()
            .map(|n| (n.id(), n.in_degree()))
            .collect();
        for (id, in_degree) in ids {
            let state = if in_degree == 0 {
                scheduler.ready.push_back(id);
                TableState::Ready
            } else {
                scheduler.pending.insert(id, in_degree);
                TableState::Unscheduled
            };
            if let Ok(node) = graph.node_mut(id) {
                node.set_state(state);
            }
        }
        scheduler
    }

    /// The node currently being generated, if any.
    pub fn current(&self) -> Option<TableId> {
        self.current
    }

    /// Nodes waiting in the ready queue, head first.
    pub fn ready(&self) -> impl Iterator<Item = TableId> + '_ {
        self.ready.iter().copied()
    }

    /// Remaining in-degree of a node that is not yet ready.
    pub fn pending_in_degree(&self, id: TableId) -> Option<usize> {
        self.pending.get(&id).copied()
    }

    /// Finalized nodes in the order they were finalized.
    pub fn tables_in_order(&self) -> &[TableId] {
        &self.order
    }

    /// `true` once the queue is empty and nothing is active.
    pub fn is_drained(&self) -> bool {
        self.ready.is_empty() && self.current.is_none()
    }

    /// Pops the head of the ready queue and makes it the active node.
    ///
    /// Returns `Ok(None)` when the queue is empty. Fails if a node is already
    /// active.
    pub fn activate(&mut self, graph: &mut DependencyGraph) -> Result<Option<TableId>, GenError> {
        if let Some(active) = self.current {
            return Err(GenError::AlreadyActive(active));
        }
        let Some(id) = self.ready.pop_front() else {
            return Ok(None);
        };
        graph.node_mut(id)?.set_state(TableState::Active);
        self.current = Some(id);
        Ok(Some(id))
    }

    /// Finalizes the active node, propagates its field sets along every outbound
    /// edge and enqueues the targets whose in-degree drops to zero.
    pub fn finalize(&mut self, graph: &mut DependencyGraph) -> Result<TableId, GenError> {
        let id = self.current.take().ok_or(GenError::NoActiveTable)?;
        graph.node_mut(id)?.set_state(TableState::Finalized);
        self.order.push(id);

        let outbound: Vec<_> = graph.outbound(id).copied().collect();
        for dep in outbound {
            graph.propagate_along(dep)?;
            let remaining = self
                .pending
                .get_mut(&dep.target)
                .ok_or_else(|| GenError::ResidualInDegree(vec![dep.target]))?;
            *remaining -= 1;
            if *remaining == 0 {
                self.pending.remove(&dep.target);
                graph.node_mut(dep.target)?.set_state(TableState::Ready);
                self.ready.push_back(dep.target);
                debug!(table = %dep.target, "no more inbound edges, enqueued");
            }
        }
        Ok(id)
    }

    /// Consumes the drained scheduler and returns the finalized order.
    ///
    /// Fails if a node is still active, still queued, or never reached zero
    /// in-degree.
    pub fn finish(self) -> Result<Vec<TableId>, GenError> {
        if let Some(active) = self.current {
            return Err(GenError::AlreadyActive(active));
        }
        let mut residual: Vec<TableId> = self
            .pending
            .keys()
            .copied()
            .chain(self.ready.iter().copied())
            .collect();
        if !residual.is_empty() {
            residual.sort_unstable();
            return Err(GenError::ResidualInDegree(residual));
        }
        Ok(self.order)
    }
}

/// Runs the scheduler to completion without generating anything, returning the
/// order tables would be finalized in.
pub fn topological_order(graph: &mut DependencyGraph) -> Result<Vec<TableId>, GenError> {
    let mut scheduler = TopoScheduler::new(graph);
    while scheduler.activate(graph)?.is_some() {
        scheduler.finalize(graph)?;
    }
    scheduler.finish()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::matrix::AdjacencyMatrix;

    fn graph(rows: &[Vec<u32>]) -> DependencyGraph {
        DependencyGraph::from_matrix(&AdjacencyMatrix::from_rows(rows).expect("valid matrix"))
    }

    #[test]
    fn seeds_roots_in_index_order() {
        let mut g = graph(&[vec![0, 0, 0], vec![0, 0, 0], vec![0, 0, 0]]);
        let s = TopoScheduler::new(&mut g);
        let ready: Vec<TableId> = s.ready().collect();
        assert_eq!(ready, vec![TableId(0), TableId(1), TableId(2)]);
    }

    #[test]
    fn chain_with_parallel_edges_drains_from_the_source() {
        // 1 -> 0 once, 2 -> 1 twice.
        let mut g = graph(&[vec![0, 0, 0], vec![1, 0, 0], vec![0, 2, 0]]);
        let mut s = TopoScheduler::new(&mut g);
        assert_eq!(s.ready().collect::<Vec<_>>(), vec![TableId(2)]);
        assert_eq!(s.pending_in_degree(TableId(1)), Some(2));

        assert_eq!(s.activate(&mut g), Ok(Some(TableId(2))));
        s.finalize(&mut g).expect("finalize table2");
        assert_eq!(s.pending_in_degree(TableId(1)), None);
        assert_eq!(s.ready().collect::<Vec<_>>(), vec![TableId(1)]);
        // Two parallel edges give table1 two ancestor entries.
        assert_eq!(g.node(TableId(1)).map(|n| n.parents_written().len()), Some(2));

        assert_eq!(s.activate(&mut g), Ok(Some(TableId(1))));
        s.finalize(&mut g).expect("finalize table1");
        assert_eq!(s.activate(&mut g), Ok(Some(TableId(0))));
        s.finalize(&mut g).expect("finalize table0");
        assert_eq!(s.activate(&mut g), Ok(None));

        assert_eq!(
            s.finish(),
            Ok(vec![TableId(2), TableId(1), TableId(0)])
        );
    }

    #[test]
    fn double_activation_is_rejected() {
        let mut g = graph(&[vec![0, 0], vec![0, 0]]);
        let mut s = TopoScheduler::new(&mut g);
        assert_eq!(s.activate(&mut g), Ok(Some(TableId(0))));
        assert_eq!(s.activate(&mut g), Err(GenError::AlreadyActive(TableId(0))));
    }

    #[test]
    fn finalize_without_activation_is_rejected() {
        let mut g = graph(&[vec![0]]);
        let mut s = TopoScheduler::new(&mut g);
        assert_eq!(s.finalize(&mut g), Err(GenError::NoActiveTable));
    }

    #[test]
    fn finishing_early_reports_residual_nodes() {
        let mut g = graph(&[vec![0, 0], vec![1, 0]]);
        let s = TopoScheduler::new(&mut g);
        assert_eq!(
            s.finish(),
            Err(GenError::ResidualInDegree(vec![TableId(0), TableId(1)]))
        );
    }

    #[test]
    fn states_follow_the_lifecycle() {
        let mut g = graph(&[vec![0, 0], vec![1, 0]]);
        let mut s = TopoScheduler::new(&mut g);
        let state = |g: &DependencyGraph, i| g.node(TableId(i)).map(|n| n.state());
        assert_eq!(state(&g, 0), Some(TableState::Unscheduled));
        assert_eq!(state(&g, 1), Some(TableState::Ready));
        s.activate(&mut g).expect("activate");
        assert_eq!(state(&g, 1), Some(TableState::Active));
        s.finalize(&mut g).expect("finalize");
        assert_eq!(state(&g, 1), Some(TableState::Finalized));
        assert_eq!(state(&g, 0), Some(TableState::Ready));
    }

    #[test]
    fn empty_graph_finishes_immediately() {
        let mut g = DependencyGraph::default();
        assert_eq!(topological_order(&mut g), Ok(vec![]));
    }
}
