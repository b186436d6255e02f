use std::sync::Arc;

use clap::Parser;
use spargo::solver::{
    constraint::CostFunction,
    constraints::{not_equal::NotEqualCost, table::TableCost},
    cost::Cost,
    engine::{DcopConfig, Problem, SamplingEngine, VariableId},
    semantics::DomainSemantics,
    stats::render_run_table,
    value::StandardValue,
};

// Each variable is one meeting; its value is the time slot it lands in.
// Meetings sharing an attendee cannot overlap, and every participant has
// per-slot inconvenience costs expressed as unary tables.

#[derive(Debug, Clone)]
pub enum SchedulingConstraint {
    NoOverlap(VariableId, VariableId),
    SlotCost(VariableId, Vec<(i64, f64)>),
}

#[derive(Debug, Clone)]
pub struct SchedulingSemantics;

impl DomainSemantics for SchedulingSemantics {
    type Value = StandardValue;
    type ConstraintDefinition = SchedulingConstraint;

    fn build_constraint(&self, def: &Self::ConstraintDefinition) -> Box<dyn CostFunction<Self>> {
        match def {
            SchedulingConstraint::NoOverlap(a, b) => Box::new(NotEqualCost::new(*a, *b)),
            SchedulingConstraint::SlotCost(meeting, costs) => Box::new(TableCost::new(
                vec![*meeting],
                costs
                    .iter()
                    .map(|(slot, cost)| (vec![StandardValue::Int(*slot)], Cost::Feasible(*cost)))
                    .collect(),
                Cost::Infeasible,
            )),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Convergence half-width.
    #[arg(long, default_value_t = 0.1)]
    error: f64,

    /// Convergence confidence parameter.
    #[arg(long, default_value_t = 0.1)]
    delta: f64,

    /// Seed for the sampling policies.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Three meetings over three slots. Alice attends meetings 0 and 1, Bob
/// attends 1 and 2, so those pairs must not overlap; slot preferences make
/// the morning cheap for meeting 0 and expensive for meeting 2.
fn create_problem() -> Problem<SchedulingSemantics> {
    let standup: VariableId = 0;
    let review: VariableId = 1;
    let retro: VariableId = 2;

    let slots: Vec<StandardValue> = (0..3).map(StandardValue::Int).collect();
    let domains = [standup, review, retro]
        .into_iter()
        .map(|meeting| (meeting, slots.clone()))
        .collect();

    let constraints = vec![
        SchedulingConstraint::NoOverlap(standup, review),
        SchedulingConstraint::NoOverlap(review, retro),
        SchedulingConstraint::SlotCost(standup, vec![(0, 0.0), (1, 2.0), (2, 4.0)]),
        SchedulingConstraint::SlotCost(review, vec![(0, 3.0), (1, 1.0), (2, 2.0)]),
        SchedulingConstraint::SlotCost(retro, vec![(0, 5.0), (1, 3.0), (2, 0.0)]),
    ];

    Problem {
        domains,
        constraints,
        semantics: Arc::new(SchedulingSemantics),
    }
}

pub fn main() {
    tracing_subscriber::fmt::init();
    println!("Scheduling three meetings over three slots...");

    let args = Args::parse();
    let problem = create_problem();
    let config = DcopConfig {
        error: args.error,
        delta: args.delta,
        seed: args.seed,
        ..DcopConfig::default()
    };

    let engine = SamplingEngine::default();
    match engine.solve(&problem, &config) {
        Ok(report) => {
            for (meeting, slot) in report.assignments.iter() {
                println!("Meeting {} -> slot {:?}", meeting, slot);
            }
            println!("{}", render_run_table(&report));
        }
        Err(e) => eprintln!("The run failed: {e}"),
    }
}
