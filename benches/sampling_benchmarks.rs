use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spargo::solver::{
    constraint::CostFunction,
    constraints::not_equal::NotEqualCost,
    engine::{DcopConfig, Problem, SamplingEngine, VariableId},
    semantics::DomainSemantics,
    value::StandardValue,
};

// Chain-colouring problem definition shared by the benchmarks.

#[derive(Debug, Clone)]
pub enum ChainConstraint {
    NotEqual(VariableId, VariableId),
}

#[derive(Debug, Clone)]
pub struct ChainSemantics;

impl DomainSemantics for ChainSemantics {
    type Value = StandardValue;
    type ConstraintDefinition = ChainConstraint;

    fn build_constraint(&self, def: &Self::ConstraintDefinition) -> Box<dyn CostFunction<Self>> {
        match def {
            ChainConstraint::NotEqual(a, b) => Box::new(NotEqualCost::new(*a, *b)),
        }
    }
}

fn chain_problem(length: u32, colours: i64) -> Problem<ChainSemantics> {
    let domains = (0..length)
        .map(|variable| {
            (
                variable,
                (0..colours).map(StandardValue::Int).collect::<Vec<_>>(),
            )
        })
        .collect();
    let constraints = (1..length)
        .map(|variable| ChainConstraint::NotEqual(variable - 1, variable))
        .collect();

    Problem {
        domains,
        constraints,
        semantics: Arc::new(ChainSemantics),
    }
}

fn chain_length_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Chain Colouring");
    let config = DcopConfig::default();
    let engine = SamplingEngine::default();

    for length in [3, 5, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, &length| {
            let problem = chain_problem(length, 3);
            b.iter(|| {
                let report = engine
                    .solve(black_box(&problem), black_box(&config))
                    .unwrap();
                assert_eq!(report.assignments.len(), length as usize);
            });
        });
    }
    group.finish();
}

fn convergence_strictness_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Convergence Strictness");
    let engine = SamplingEngine::default();
    let problem = chain_problem(4, 3);

    for error in [0.2, 0.1, 0.05].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(error), error, |b, &error| {
            let config = DcopConfig {
                error,
                ..DcopConfig::default()
            };
            b.iter(|| {
                let report = engine
                    .solve(black_box(&problem), black_box(&config))
                    .unwrap();
                assert!(report.bound.is_some());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, chain_length_benchmark, convergence_strictness_benchmark);
criterion_main!(benches);
