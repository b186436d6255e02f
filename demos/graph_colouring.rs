use std::sync::Arc;

use clap::Parser;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use spargo::solver::{
    constraint::CostFunction,
    constraints::not_equal::NotEqualCost,
    cost::ObjectiveSense,
    engine::{DcopConfig, Problem, SamplingEngine, VariableId},
    semantics::DomainSemantics,
    stats::render_run_table,
    value::StandardValue,
};

// 1. Define the problem-specific types
#[derive(Debug, Clone)]
pub enum ColouringConstraint {
    NotEqual(VariableId, VariableId),
}

#[derive(Debug, Clone)]
pub struct ColouringSemantics;

// 2. Implement DomainSemantics
impl DomainSemantics for ColouringSemantics {
    type Value = StandardValue;
    type ConstraintDefinition = ColouringConstraint;

    fn build_constraint(&self, def: &Self::ConstraintDefinition) -> Box<dyn CostFunction<Self>> {
        match def {
            ColouringConstraint::NotEqual(a, b) => Box::new(NotEqualCost::new(*a, *b)),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of regions in the random map.
    #[arg(long, default_value_t = 8)]
    num_regions: u32,

    /// Number of colours available to every region.
    #[arg(long, default_value_t = 3)]
    num_colours: i64,

    /// Probability of an edge between any two regions.
    #[arg(long, default_value_t = 0.3)]
    edge_density: f64,

    /// Seed for both instance generation and the sampling policies.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Convergence half-width.
    #[arg(long, default_value_t = 0.1)]
    error: f64,

    /// Convergence confidence parameter.
    #[arg(long, default_value_t = 0.1)]
    delta: f64,

    /// Print the full report as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn generate_problem(args: &Args) -> Problem<ColouringSemantics> {
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let domains = (0..args.num_regions)
        .map(|region| {
            (
                region,
                (0..args.num_colours).map(StandardValue::Int).collect(),
            )
        })
        .collect();

    let mut constraints = Vec::new();
    for a in 0..args.num_regions {
        for b in (a + 1)..args.num_regions {
            if rng.gen_bool(args.edge_density) {
                constraints.push(ColouringConstraint::NotEqual(a, b));
            }
        }
    }

    Problem {
        domains,
        constraints,
        semantics: Arc::new(ColouringSemantics),
    }
}

pub fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    println!(
        "Colouring {} regions with {} colours (edge density {})...",
        args.num_regions, args.num_colours, args.edge_density
    );

    let problem = generate_problem(&args);
    let config = DcopConfig {
        error: args.error,
        delta: args.delta,
        sense: ObjectiveSense::Minimize,
        seed: args.seed,
        ..DcopConfig::default()
    };

    let engine = SamplingEngine::default();
    match engine.solve(&problem, &config) {
        Ok(report) => {
            if args.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(e) => eprintln!("Failed to serialise the report: {e}"),
                }
            } else {
                println!("{}", render_run_table(&report));
            }
        }
        Err(e) => eprintln!("The run failed: {e}"),
    }
}
