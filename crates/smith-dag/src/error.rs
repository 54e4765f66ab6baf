// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for matrix construction and generation bookkeeping.
use thiserror::Error;

use crate::graph::TableId;

/// Rejections raised while building or importing an adjacency matrix.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatrixError {
    /// A row does not have exactly `expected` columns.
    #[error("matrix row {row} has {len} columns, expected {expected}")]
    NotSquare {
        /// Offending row index.
        row: usize,
        /// Number of columns found in that row.
        len: usize,
        /// Number of rows (and therefore required columns).
        expected: usize,
    },
    /// A non-zero entry sits on or above the diagonal, which could close a cycle.
    #[error("matrix entry ({row},{col}) = {value} is not strictly below the diagonal")]
    UpperEntry {
        /// Row (source) index.
        row: usize,
        /// Column (target) index.
        col: usize,
        /// Offending multiplicity.
        value: u32,
    },
    /// Edge density must be a finite probability.
    #[error("edge density {0} is outside [0, 1]")]
    InvalidDensity(f64),
    /// The parallel-edge cap must allow at least one edge.
    #[error("parallel-edge cap must be at least 1")]
    ZeroMultiplicity,
}

/// Failures of a generation run.
///
/// Apart from [`GenError::InvalidConfig`] and [`GenError::Matrix`], every
/// variant indicates a bookkeeping defect in the scheduler or the generator;
/// callers abort the run rather than retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenError {
    /// A table was activated while another table generation context was still open.
    #[error("cannot activate a table while {0} is still active")]
    AlreadyActive(TableId),
    /// Finalization was requested with no active table.
    #[error("no active table to finalize")]
    NoActiveTable,
    /// The ready queue drained while some tables still had inbound edges.
    #[error("tables never reached zero in-degree: {0:?}")]
    ResidualInDegree(Vec<TableId>),
    /// A finalized table was asked to change its generation inputs or outputs.
    #[error("{0} is already finalized")]
    TableFinalized(TableId),
    /// A table id outside the graph was referenced.
    #[error("{0} is not part of the dependency graph")]
    UnknownTable(TableId),
    /// The run was asked for again after it already completed.
    #[error("generation session has already run")]
    SessionFinished,
    /// The generation config failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Matrix construction failed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
