// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One generation pass: schedule the DAG, synthesize each table against its
//! ancestors, and record the order tables must be applied in.
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigError, GenConfig, TableConfig};
use crate::error::GenError;
use crate::fields::{collect_written_fields, FieldSet};
use crate::grammar::ExprGrammar;
use crate::graph::{Dependency, DependencyGraph, TableId};
use crate::ir::{ActionDecl, TableDecl};
use crate::matrix::{random_lower_triangular, AdjacencyMatrix};
use crate::prng::Prng;
use crate::scheduler::TopoScheduler;
use crate::scope::DeclScope;
use crate::table_gen::{gen_table, GenContext, MatchPolicy};

/// 32-byte digest of a generated schedule.
pub type Digest = [u8; 32];

/// A finalized table as it leaves the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedTable {
    /// Node the table was generated for.
    pub id: TableId,
    /// Synthesized declaration.
    pub decl: TableDecl,
    /// Fields the table's keys reference.
    pub fields_matched: FieldSet,
    /// Fields the table's actions write.
    pub fields_written: FieldSet,
}

/// Result of a completed generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutcome {
    /// Seed the run was driven from.
    pub seed: u64,
    /// Matrix the graph was built from.
    pub matrix: AdjacencyMatrix,
    /// Every edge, parallels included.
    pub dependencies: Vec<Dependency>,
    /// Tables in finalization order. Applying them in this order exposes the
    /// intended data dependencies.
    pub tables_in_order: Vec<GeneratedTable>,
}

impl GenerationOutcome {
    /// Node ids in finalization order.
    pub fn order(&self) -> Vec<TableId> {
        self.tables_in_order.iter().map(|t| t.id).collect()
    }

    /// The `name.apply();` statements a block populator appends, in order.
    pub fn apply_order(&self) -> Vec<String> {
        self.tables_in_order
            .iter()
            .map(|t| format!("{}.apply();", t.decl.name))
            .collect()
    }

    /// BLAKE3 digest over the matrix, the schedule, and every declaration.
    ///
    /// The seed is not hashed, so two seeds producing the same program agree.
    pub fn digest(&self) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"smith-dag:outcome:v1");
        hasher.update(&(self.matrix.dim() as u64).to_le_bytes());
        for row in self.matrix.rows() {
            for cell in row {
                hasher.update(&cell.to_le_bytes());
            }
        }
        hasher.update(&(self.tables_in_order.len() as u64).to_le_bytes());
        for table in &self.tables_in_order {
            hasher.update(&(table.id.0 as u64).to_le_bytes());
            hash_str(&mut hasher, &table.decl.name);
            hasher.update(&(table.decl.keys.len() as u64).to_le_bytes());
            for key in &table.decl.keys {
                hash_str(&mut hasher, &key.expr.to_string());
                hash_str(&mut hasher, key.match_kind.as_str());
            }
            hasher.update(&(table.decl.actions.len() as u64).to_le_bytes());
            for call in &table.decl.actions {
                hash_str(&mut hasher, &call.action);
                hasher.update(&(call.args.len() as u64).to_le_bytes());
                for arg in &call.args {
                    hash_str(&mut hasher, &arg.to_string());
                }
            }
            hasher.update(&table.decl.size.to_le_bytes());
        }
        hasher.finalize().into()
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Explicit generation context for one pass over one DAG.
///
/// Owns the graph, the scheduler, the random stream, the declaration scope,
/// the grammar and the match-kind flags. Nodes are processed one at a time:
/// activate, synthesize, collect writes, finalize.
pub struct GenerationSession<S, G> {
    seed: u64,
    matrix: AdjacencyMatrix,
    graph: DependencyGraph,
    scheduler: TopoScheduler,
    prng: Prng,
    scope: S,
    grammar: G,
    policy: MatchPolicy,
    config: TableConfig,
    generated: Vec<GeneratedTable>,
    finished: bool,
}

impl<S: DeclScope, G: ExprGrammar> GenerationSession<S, G> {
    /// Builds a session over `matrix` with a stream seeded from `seed`.
    pub fn new(matrix: AdjacencyMatrix, scope: S, grammar: G, config: TableConfig, seed: u64) -> Self {
        Self::with_prng(matrix, scope, grammar, config, seed, Prng::from_seed(seed))
    }

    /// Builds a session that continues an existing stream. `seed` is only
    /// reported in the outcome.
    pub fn with_prng(
        matrix: AdjacencyMatrix,
        scope: S,
        grammar: G,
        config: TableConfig,
        seed: u64,
        prng: Prng,
    ) -> Self {
        let mut graph = DependencyGraph::from_matrix(&matrix);
        let scheduler = TopoScheduler::new(&mut graph);
        Self {
            seed,
            matrix,
            graph,
            scheduler,
            prng,
            scope,
            grammar,
            policy: MatchPolicy::default(),
            config,
            generated: Vec::new(),
            finished: false,
        }
    }

    /// The dependency graph in its current state.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The scheduler in its current state.
    pub fn scheduler(&self) -> &TopoScheduler {
        &self.scheduler
    }

    /// The declaration scope, including every table declared so far.
    pub fn scope(&self) -> &S {
        &self.scope
    }

    /// The expression grammar.
    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    /// Tables finalized so far.
    pub fn generated(&self) -> &[GeneratedTable] {
        &self.generated
    }

    /// Pre-assigns `action` to a node that is not yet finalized.
    pub fn assign_action(&mut self, id: TableId, action: ActionDecl) -> Result<(), GenError> {
        self.graph.assign_action(id, action)
    }

    /// Processes the head of the ready queue.
    ///
    /// Returns the finalized node, or `None` once the queue is empty.
    pub fn step(&mut self) -> Result<Option<TableId>, GenError> {
        let Some(id) = self.scheduler.activate(&mut self.graph)? else {
            return Ok(None);
        };
        let node = self.graph.node_mut(id)?;
        let mut ctx = GenContext {
            prng: &mut self.prng,
            scope: &mut self.scope,
            grammar: &mut self.grammar,
            policy: &mut self.policy,
            config: &self.config,
        };
        let decl = gen_table(&mut ctx, node)?;

        for call in &decl.actions {
            let action = node
                .actions_to_use()
                .iter()
                .find(|a| a.name == call.action)
                .or_else(|| self.scope.action(&call.action));
            if let Some(action) = action {
                let written = collect_written_fields(&action.body, &self.scope);
                node.record_written(&written)?;
            }
        }

        debug!(
            table = %id,
            name = %decl.name,
            keys = decl.keys.len(),
            actions = decl.actions.len(),
            size = decl.size,
            matched = node.fields_matched().len(),
            written = node.fields_written().len(),
            "table generated"
        );
        self.scope.declare_table(&decl);
        self.generated.push(GeneratedTable {
            id,
            decl: decl.clone(),
            fields_matched: node.fields_matched().clone(),
            fields_written: node.fields_written().clone(),
        });
        node.table = Some(decl);
        self.scheduler.finalize(&mut self.graph)?;
        Ok(Some(id))
    }

    /// Drains the ready queue and checks that every node was finalized.
    ///
    /// A session runs once; later calls fail with [`GenError::SessionFinished`].
    pub fn run(&mut self) -> Result<GenerationOutcome, GenError> {
        if self.finished {
            return Err(GenError::SessionFinished);
        }
        while self.step()?.is_some() {}
        self.finished = true;
        let order = std::mem::take(&mut self.scheduler).finish()?;
        info!(
            seed = self.seed,
            tables = order.len(),
            dependencies = self.graph.dependencies().len(),
            "generation complete"
        );
        Ok(GenerationOutcome {
            seed: self.seed,
            matrix: self.matrix.clone(),
            dependencies: self.graph.dependencies().to_vec(),
            tables_in_order: self.generated.clone(),
        })
    }
}

/// Builds a random matrix from `config` and generates every table, drawing
/// both from one stream seeded with `seed`.
///
/// `config` is validated first; a rejected config yields
/// [`GenError::InvalidConfig`].
pub fn generate<S: DeclScope, G: ExprGrammar>(
    config: &GenConfig,
    seed: u64,
    scope: S,
    grammar: G,
) -> Result<GenerationOutcome, GenError> {
    config.validate().map_err(|e| match e {
        ConfigError::Invalid(reason) => GenError::InvalidConfig(reason),
        other => GenError::InvalidConfig(other.to_string()),
    })?;
    let mut prng = Prng::from_seed(seed);
    let matrix = random_lower_triangular(&config.dag, &mut prng)?;
    info!(
        seed,
        nodes = matrix.dim(),
        edges = matrix.total_edges(),
        "random dag built"
    );
    let mut session =
        GenerationSession::with_prng(matrix, scope, grammar, config.tables.clone(), seed, prng);
    session.run()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::LenRange;
    use crate::demo::{synthetic_scope, BasicGrammar};
    use crate::ir::{Expr, Statement, Type};
    use crate::scope::Scope;

    fn chain() -> AdjacencyMatrix {
        AdjacencyMatrix::from_rows(&[vec![0, 0, 0], vec![1, 0, 0], vec![0, 2, 0]])
            .expect("valid matrix")
    }

    #[test]
    fn chain_is_generated_from_the_source_down() {
        let mut session =
            GenerationSession::new(chain(), Scope::new(), BasicGrammar, TableConfig::default(), 7);
        let outcome = session.run().expect("run");
        assert_eq!(outcome.order(), vec![TableId(2), TableId(1), TableId(0)]);
        assert_eq!(outcome.dependencies.len(), 3);
        assert_eq!(
            outcome.apply_order(),
            vec!["table2.apply();", "table1.apply();", "table0.apply();"]
        );
        assert_eq!(session.scope().tables().len(), 3);
    }

    #[test]
    fn preassigned_writes_reach_descendants() {
        let meta_a = Expr::member(Expr::path("meta"), "a");
        let mut scope = Scope::new();
        scope.declare_var(meta_a.clone(), Type::Bit { width: 8 });
        let writer = ActionDecl {
            name: "write_a".into(),
            params: vec![],
            body: vec![Statement::assign(meta_a.clone(), Expr::constant(1, 8))],
        };
        let config = TableConfig {
            key_len: LenRange::new(1, 1),
            dependency_enforce: 1,
            dependency_not_enforce: 0,
            ..TableConfig::default()
        };

        let matrix = AdjacencyMatrix::from_rows(&[vec![0, 0], vec![1, 0]]).expect("valid matrix");
        let mut session = GenerationSession::new(matrix, scope, BasicGrammar, config, 3);
        session.assign_action(TableId(1), writer).expect("assign");
        let outcome = session.run().expect("run");

        let upstream = &outcome.tables_in_order[0];
        assert_eq!(upstream.id, TableId(1));
        assert!(upstream.fields_written.contains("a"));
        let downstream = &outcome.tables_in_order[1];
        assert_eq!(downstream.decl.keys.len(), 1);
        assert_eq!(downstream.decl.keys[0].expr, meta_a);
        assert!(downstream.fields_matched.contains("a"));
    }

    #[test]
    fn finalized_nodes_refuse_new_actions() {
        let mut session = GenerationSession::new(
            AdjacencyMatrix::zeros(1),
            Scope::new(),
            BasicGrammar,
            TableConfig::default(),
            1,
        );
        session.step().expect("step");
        let action = ActionDecl {
            name: "late".into(),
            params: vec![],
            body: vec![],
        };
        assert_eq!(
            session.assign_action(TableId(0), action),
            Err(GenError::TableFinalized(TableId(0)))
        );
    }

    #[test]
    fn table_names_avoid_existing_declarations() {
        let mut scope = Scope::new();
        scope.declare_var(Expr::path("table0"), Type::Bit { width: 8 });
        let mut session = GenerationSession::new(
            AdjacencyMatrix::zeros(1),
            scope,
            BasicGrammar,
            TableConfig::default(),
            1,
        );
        let outcome = session.run().expect("run");
        assert_eq!(outcome.apply_order(), vec!["table0_1.apply();"]);
    }

    #[test]
    fn same_seed_same_digest() {
        let config = GenConfig::default();
        let run = |seed: u64| {
            let mut prng = Prng::from_seed(seed ^ 0xff);
            generate(&config, seed, synthetic_scope(&mut prng, 6, 4), BasicGrammar).expect("run")
        };
        let a = run(42);
        let b = run(42);
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn a_session_runs_once() {
        let mut session =
            GenerationSession::new(chain(), Scope::new(), BasicGrammar, TableConfig::default(), 5);
        let first = session.run().expect("run");
        assert_eq!(first.order(), vec![TableId(2), TableId(1), TableId(0)]);
        assert_eq!(session.run(), Err(GenError::SessionFinished));
        assert_eq!(session.step(), Ok(None));
        assert_eq!(session.generated(), first.tables_in_order.as_slice());
    }

    #[test]
    fn generate_rejects_invalid_configs() {
        let mut weights = vec![0; 41];
        weights[40] = 1;
        let config = GenConfig {
            tables: TableConfig {
                size_weights: Some(weights),
                ..TableConfig::default()
            },
            ..GenConfig::default()
        };
        let mut prng = Prng::from_seed(3);
        let err = generate(&config, 3, synthetic_scope(&mut prng, 4, 2), BasicGrammar);
        assert!(matches!(err, Err(GenError::InvalidConfig(_))));

        let inverted = GenConfig {
            tables: TableConfig {
                key_len: LenRange::new(3, 1),
                ..TableConfig::default()
            },
            ..GenConfig::default()
        };
        let err = generate(&inverted, 3, Scope::new(), BasicGrammar);
        assert!(matches!(err, Err(GenError::InvalidConfig(_))));
    }

    #[test]
    fn outcome_serializes_to_json() {
        let mut session =
            GenerationSession::new(chain(), Scope::new(), BasicGrammar, TableConfig::default(), 9);
        let json = session.run().expect("run").to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["seed"], 9);
        assert_eq!(value["tables_in_order"][0]["id"], 2);
        assert_eq!(value["dependencies"].as_array().map(Vec::len), Some(3));
    }
}
