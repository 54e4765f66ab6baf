// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Strictly lower-triangular adjacency matrices describing random table DAGs.
//!
//! Entry `(i, j)` with `j < i` is the number of parallel edges `i -> j`.
//! Entries on or above the diagonal are always zero, so every edge strictly
//! decreases the node index and the induced relation is acyclic for any size.
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MatrixError;
use crate::prng::Prng;

/// Construction parameters for [`random_lower_triangular`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagShape {
    /// Number of table nodes.
    pub nodes: usize,
    /// Probability that a given pair `(i, j)` with `j < i` is connected.
    pub density: f64,
    /// Upper bound on parallel edges between the same ordered pair.
    pub max_parallel: u32,
}

impl Default for DagShape {
    fn default() -> Self {
        Self {
            nodes: 4,
            density: 0.6,
            max_parallel: 2,
        }
    }
}

impl DagShape {
    /// Checks that the density is a probability and the parallel cap is positive.
    pub fn validate(&self) -> Result<(), MatrixError> {
        if !self.density.is_finite() || !(0.0..=1.0).contains(&self.density) {
            return Err(MatrixError::InvalidDensity(self.density));
        }
        if self.max_parallel == 0 {
            return Err(MatrixError::ZeroMultiplicity);
        }
        Ok(())
    }
}

/// Square matrix of edge multiplicities, stored row-major.
///
/// Invariants
/// - `cells.len() == dim * dim`.
/// - `cells[i * dim + j] == 0` whenever `j >= i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacencyMatrix {
    dim: usize,
    cells: Vec<u32>,
}

impl AdjacencyMatrix {
    /// Returns an all-zero `dim x dim` matrix.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            cells: vec![0; dim * dim],
        }
    }

    /// Imports a caller-supplied matrix, rejecting anything that is not square
    /// or carries a non-zero entry at `j >= i`.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, MatrixError> {
        let dim = rows.len();
        let mut matrix = Self::zeros(dim);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != dim {
                return Err(MatrixError::NotSquare {
                    row,
                    len: values.len(),
                    expected: dim,
                });
            }
            for (col, &value) in values.iter().enumerate() {
                matrix.set(row, col, value)?;
            }
        }
        Ok(matrix)
    }

    /// Number of nodes the matrix describes.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Multiplicity of edge `row -> col`; zero outside the matrix.
    pub fn get(&self, row: usize, col: usize) -> u32 {
        if row >= self.dim || col >= self.dim {
            return 0;
        }
        self.cells[row * self.dim + col]
    }

    /// Sets the multiplicity of edge `row -> col`.
    ///
    /// Zero may be written anywhere inside the matrix; non-zero values are only
    /// accepted strictly below the diagonal.
    pub fn set(&mut self, row: usize, col: usize, value: u32) -> Result<(), MatrixError> {
        if value != 0 && (col >= row || row >= self.dim) {
            return Err(MatrixError::UpperEntry { row, col, value });
        }
        if row < self.dim && col < self.dim {
            self.cells[row * self.dim + col] = value;
        }
        Ok(())
    }

    /// Iterates over non-zero entries as `(source, target, multiplicity)`,
    /// row by row and column by column.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        (0..self.dim).flat_map(move |row| {
            (0..row).filter_map(move |col| {
                let value = self.get(row, col);
                (value > 0).then_some((row, col, value))
            })
        })
    }

    /// Sum of all entries, i.e. the total number of edges including parallels.
    pub fn total_edges(&self) -> u64 {
        self.cells.iter().map(|v| u64::from(*v)).sum()
    }

    /// Returns the matrix as nested rows.
    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.cells
            .chunks(self.dim.max(1))
            .take(self.dim)
            .map(<[u32]>::to_vec)
            .collect()
    }

    /// Renders the matrix as a Graphviz `digraph`, one line per parallel edge.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph G {\n");
        for (row, col, count) in self.edges() {
            for _ in 0..count {
                out.push_str(&format!("    {row} -> {col};\n"));
            }
        }
        out.push_str("}\n");
        out
    }
}

impl fmt::Display for AdjacencyMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lower Triangular Adjacency Matrix:")?;
        for row in 0..self.dim {
            let line: Vec<String> = (0..self.dim)
                .map(|col| self.get(row, col).to_string())
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// Draws a random DAG matrix.
///
/// For every pair `(i, j)` with `j < i`, visited row-major, the pair is
/// connected with probability `shape.density`; a connected pair receives a
/// multiplicity drawn uniformly from `[1, shape.max_parallel]`. The
/// multiplicity is only drawn for connected pairs, so the stream consumption
/// depends on the outcome of each density roll.
pub fn random_lower_triangular(
    shape: &DagShape,
    prng: &mut Prng,
) -> Result<AdjacencyMatrix, MatrixError> {
    shape.validate()?;
    let mut matrix = AdjacencyMatrix::zeros(shape.nodes);
    for row in 0..shape.nodes {
        for col in 0..row {
            if prng.chance(shape.density) {
                let count = prng.next_int(1, u64::from(shape.max_parallel)) as u32;
                matrix.set(row, col, count)?;
            }
        }
    }
    debug!(
        nodes = shape.nodes,
        edges = matrix.total_edges(),
        "generated adjacency matrix"
    );
    Ok(matrix)
}
