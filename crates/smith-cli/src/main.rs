// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! smith-dag CLI
//!
//! Builds a random dependency DAG, generates one table per node against a
//! synthetic declaration scope, and prints the order the tables must be
//! applied in. Logs go to stderr so stdout stays machine-readable.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use smith_dag::demo::{synthetic_scope, BasicGrammar};
use smith_dag::{generate, GenConfig, Prng};

/// Salt separating the scope stream from the generation stream.
const SCOPE_STREAM_SALT: u64 = 0x5c0f_e5c0_f35c_0f3e;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Number of table nodes (overrides the config file)
    #[clap(long)]
    nodes: Option<usize>,

    /// Probability that a lower-triangular pair is connected
    #[clap(long)]
    density: Option<f64>,

    /// Upper bound on parallel edges per pair
    #[clap(long)]
    max_parallel: Option<u32>,

    /// Seed; drawn from the OS and logged when absent
    #[clap(long)]
    seed: Option<u64>,

    /// JSON generation config
    #[clap(long)]
    config: Option<PathBuf>,

    /// Write the DAG as Graphviz to this path
    #[clap(long)]
    dot: Option<PathBuf>,

    /// Write the full outcome as JSON to this path
    #[clap(long)]
    json: Option<PathBuf>,

    /// Number of synthetic metadata fields in scope
    #[clap(long, default_value_t = 8)]
    vars: usize,

    /// Number of synthetic actions in scope
    #[clap(long, default_value_t = 4)]
    actions: usize,

    /// Print the adjacency matrix before the apply list
    #[clap(long)]
    print_matrix: bool,

    /// Maximum log level (error, warn, info, debug, trace)
    #[clap(long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = resolve_config(&args)?;
    let seed = args.seed.unwrap_or_else(|| {
        let seed = rand::random();
        info!(seed, "no --seed given, drew one from the OS");
        seed
    });

    let mut scope_prng = Prng::from_seed(seed ^ SCOPE_STREAM_SALT);
    let scope = synthetic_scope(&mut scope_prng, args.vars, args.actions);
    let outcome = generate(&config, seed, scope, BasicGrammar).context("generation failed")?;

    let mut out = io::stdout().lock();
    if args.print_matrix {
        write!(out, "{}", outcome.matrix)?;
    }
    for line in outcome.apply_order() {
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    if let Some(path) = &args.dot {
        write_file(path, &outcome.matrix.to_dot())?;
    }
    if let Some(path) = &args.json {
        write_file(path, &outcome.to_json()?)?;
    }

    let digest: String = outcome.digest().iter().map(|b| format!("{b:02x}")).collect();
    info!(seed, tables = outcome.tables_in_order.len(), %digest, "done");
    Ok(())
}

fn resolve_config(args: &Args) -> Result<GenConfig> {
    let mut config = match &args.config {
        Some(path) => GenConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GenConfig::default(),
    };
    if let Some(nodes) = args.nodes {
        config.dag.nodes = nodes;
    }
    if let Some(density) = args.density {
        config.dag.density = density;
    }
    if let Some(max_parallel) = args.max_parallel {
        config.dag.max_parallel = max_parallel;
    }
    config.validate()?;
    Ok(config)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote");
    Ok(())
}
