// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canned adjacency matrices.
//!
//! All fixtures are valid by construction; the `expect` calls only guard
//! against typos in the literal rows below.
#![allow(clippy::expect_used)]

use smith_dag::AdjacencyMatrix;

fn rows(rows: &[Vec<u32>]) -> AdjacencyMatrix {
    AdjacencyMatrix::from_rows(rows).expect("fixture matrix is lower triangular")
}

/// Three nodes: `1 -> 0` once, `2 -> 1` twice.
pub fn chain3() -> AdjacencyMatrix {
    rows(&[vec![0, 0, 0], vec![1, 0, 0], vec![0, 2, 0]])
}

/// Four nodes: `3 -> 1`, `3 -> 2`, `1 -> 0`, `2 -> 0`.
pub fn diamond() -> AdjacencyMatrix {
    rows(&[
        vec![0, 0, 0, 0],
        vec![1, 0, 0, 0],
        vec![1, 0, 0, 0],
        vec![0, 1, 1, 0],
    ])
}

/// `n` nodes with no edges.
pub fn disconnected(n: usize) -> AdjacencyMatrix {
    AdjacencyMatrix::zeros(n)
}

/// `n` nodes where every `i -> j` with `j < i` is present once.
pub fn full_chain(n: usize) -> AdjacencyMatrix {
    let mut m = AdjacencyMatrix::zeros(n);
    for i in 0..n {
        for j in 0..i {
            m.set(i, j, 1).expect("below the diagonal");
        }
    }
    m
}
