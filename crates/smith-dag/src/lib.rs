// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! smith-dag: dependency-constrained random table program generator.
//!
//! A seeded random DAG decides which tables depend on which. The scheduler
//! walks it in topological order, one table at a time, and the generator
//! forces each table's keys to read fields that its already-finalized
//! ancestors write. Applying the tables in the recorded order therefore
//! embeds real read-after-write hazards in the emitted program, which is
//! what stresses a compiler's table placement and dependency analysis.
//!
//! Same config and seed, same program.
#![forbid(unsafe_code)]

pub mod config;
pub mod demo;
pub mod error;
pub mod fields;
pub mod grammar;
pub mod graph;
pub mod ir;
pub mod matrix;
pub mod prng;
pub mod scheduler;
pub mod scope;
pub mod session;
pub mod table_gen;

// Re-exports for stable public API
pub use config::{ConfigError, GenConfig, LenRange, TableConfig};
pub use error::{GenError, MatrixError};
pub use fields::{collect_written_fields, FieldRef, FieldSet};
pub use grammar::{ExprGrammar, ExprRequirements};
pub use graph::{Dependency, DependencyGraph, DependencyKind, TableId, TableNode, TableState};
pub use ir::{ActionCall, ActionDecl, Direction, Expr, KeyElement, MatchKind, Param, Statement, TableDecl, Type};
pub use matrix::{random_lower_triangular, AdjacencyMatrix, DagShape};
pub use prng::Prng;
pub use scheduler::{topological_order, TopoScheduler};
pub use scope::{DeclScope, DeclaredVar, Scope};
pub use session::{generate, Digest, GeneratedTable, GenerationOutcome, GenerationSession};
pub use table_gen::MatchPolicy;
