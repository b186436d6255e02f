use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, ProtocolError, Result},
    solver::{
        agent::VariableAgent,
        constraint::Assignment,
        cost::{Cost, ObjectiveSense},
        heuristics::{
            sampling::{ConfidenceBoundPolicy, SamplingPolicy},
            termination::{ConfidenceTermination, TerminationTest},
        },
        message::{Envelope, Message, Recipient},
        normalize::Normalizer,
        router::Router,
        semantics::DomainSemantics,
        tree::PseudoTree,
        value::ValueEquality,
    },
};

pub type VariableId = u32;

/// Numeric parameters and behavioural switches for one run, consumed at
/// agent-construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcopConfig {
    /// Half-width the per-value confidence interval must shrink to before
    /// an estimate is accepted. Smaller means stricter, more samples.
    pub error: f64,
    /// Confidence parameter of the stopping rule. Smaller means stricter.
    pub delta: f64,
    pub sense: ObjectiveSense,
    /// Raw cost charged for an outright-infeasible subtree, scaled down by
    /// the normalizer's factor before use.
    pub penalty: f64,
    /// Seed for the stochastic sampling policies; runs are reproducible
    /// for a fixed seed.
    pub seed: u64,
    /// Whether poisoned rounds short-circuit instead of waiting for every
    /// child to report.
    pub pruning: bool,
    /// Optional cap on delivered messages; exceeding it makes the run
    /// inconclusive rather than wrong.
    pub message_budget: Option<u64>,
    /// Overrides the pseudo-tree root choice.
    pub root: Option<VariableId>,
}

impl Default for DcopConfig {
    fn default() -> Self {
        Self {
            error: 0.1,
            delta: 0.1,
            sense: ObjectiveSense::Minimize,
            penalty: 1_000.0,
            seed: 0,
            pruning: true,
            message_budget: None,
            root: None,
        }
    }
}

/// A DCOP instance: each variable's ordered domain, the declarative cost
/// functions, and the semantics that build them.
pub struct Problem<S: DomainSemantics> {
    pub domains: BTreeMap<VariableId, Vec<S::Value>>,
    pub constraints: Vec<S::ConstraintDefinition>,
    pub semantics: Arc<S>,
}

/// The one piece of genuinely shared state in a run: the count of variables
/// that have not yet committed. Agents see it only through this handle's
/// explicit report call; the orchestrator watches it reach zero.
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    active: Arc<AtomicUsize>,
}

impl CompletionHandle {
    pub fn new(active_variables: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(active_variables)),
        }
    }

    /// Atomically decrements the active count. Returns `true` for the call
    /// that brings it to zero — the whole computation is complete.
    pub fn report_committed(&self) -> bool {
        self.active.fetch_sub(1, Ordering::SeqCst) == 1
    }

    pub fn remaining(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Per-variable statistics surfaced in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct VariableRunStats<V> {
    pub variable: VariableId,
    pub value: Option<V>,
    pub visits: u64,
    pub infeasible_rounds: u64,
    pub is_leaf: bool,
}

/// The outcome of a completed run: one committed value per variable, the
/// root's aggregated solution-quality bound, and the true global cost of
/// the committed assignment re-evaluated against the full constraint set.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "V: Serialize"))]
pub struct RunReport<V: ValueEquality> {
    pub assignments: im::HashMap<VariableId, V>,
    pub bound: Option<f64>,
    pub global_cost: Cost,
    pub variables: Vec<VariableRunStats<V>>,
    pub deliveries: u64,
}

pub type PolicyFactory = Box<dyn Fn(u64) -> Box<dyn SamplingPolicy>>;
pub type TerminationFactory = Box<dyn Fn() -> Box<dyn TerminationTest>>;

/// The run orchestrator.
///
/// Owns the router, the agents and the active-variable counter; seeds the
/// agents with the pseudo-tree and normalization feeds, then pumps the
/// queue until every variable has committed. The engine is generic over
/// the injected strategies: a factory for the per-agent sampling policy
/// (keyed by a derived seed) and one for the termination test.
pub struct SamplingEngine<S: DomainSemantics> {
    policy_factory: PolicyFactory,
    termination_factory: TerminationFactory,
    _semantics: std::marker::PhantomData<S>,
}

impl<S: DomainSemantics> SamplingEngine<S> {
    pub fn new(policy_factory: PolicyFactory, termination_factory: TerminationFactory) -> Self {
        Self {
            policy_factory,
            termination_factory,
            _semantics: std::marker::PhantomData,
        }
    }

    /// Runs the distributed sampling search to completion.
    ///
    /// Returns a [`RunReport`] once every agent has committed, or an error
    /// for protocol violations, a stalled queue, or an exhausted message
    /// budget.
    pub fn solve(&self, problem: &Problem<S>, config: &DcopConfig) -> Result<RunReport<S::Value>> {
        let variables: Vec<VariableId> = problem.domains.keys().copied().collect();
        let built: Vec<_> = problem
            .constraints
            .iter()
            .map(|definition| problem.semantics.build_constraint(definition))
            .collect();
        let scopes: Vec<Vec<VariableId>> = built
            .iter()
            .map(|constraint| constraint.variables().to_vec())
            .collect();

        let tree = PseudoTree::from_scopes(&variables, &scopes, config.root);
        let mut payloads = Normalizer::distribute(
            problem.semantics.as_ref(),
            &problem.constraints,
            &tree,
            config.penalty,
        );

        let completion = CompletionHandle::new(variables.len());
        let mut agents: BTreeMap<VariableId, VariableAgent<S>> = variables
            .iter()
            .map(|&variable| {
                let domain = problem.domains[&variable].clone();
                let policy = (self.policy_factory)(config.seed.wrapping_add(variable as u64));
                let termination = (self.termination_factory)();
                (
                    variable,
                    VariableAgent::new(
                        variable,
                        domain,
                        config.sense,
                        config.error,
                        config.delta,
                        config.pruning,
                        policy,
                        termination,
                        completion.clone(),
                    ),
                )
            })
            .collect();

        let mut router: Router<S> = Router::new();
        for view in tree.views() {
            router.send(Envelope::setup(
                view.variable,
                Message::TreeNotify { view: view.clone() },
            ));
        }
        for &variable in &variables {
            let payload = payloads
                .remove(&variable)
                .expect("normalizer covers every variable");
            router.send(Envelope::setup(
                variable,
                Message::NormalizeNotify {
                    constraints: payload.constraints,
                    separator: payload.separator,
                    penalty: payload.penalty,
                    scaling_factor: payload.scaling_factor,
                },
            ));
        }

        let mut assignments: Assignment<S::Value> = im::HashMap::new();
        let mut bound: Option<f64> = None;
        while let Some(envelope) = router.deliver() {
            if let Some(budget) = config.message_budget {
                if router.delivered() > budget {
                    return Err(Error::Inconclusive { budget });
                }
            }
            match envelope.receiver {
                Recipient::Agent(variable) => {
                    let agent = agents
                        .get_mut(&variable)
                        .ok_or(ProtocolError::UnknownVariable(variable))?;
                    let outbound = agent.handle(envelope.sender, envelope.message)?;
                    router.send_all(outbound);
                }
                Recipient::StatsSink => {
                    let variable = envelope.sender.expect("sink reports carry a sender");
                    match envelope.message {
                        Message::AssignmentReport { value } => {
                            debug!(variable, value = ?value, "assignment reported");
                            assignments.insert(variable, value);
                        }
                        Message::BoundReport { bound: contribution } => {
                            // Bound contributions aggregate additively.
                            bound = Some(bound.unwrap_or(0.0) + contribution);
                        }
                        _ => {
                            return Err(ProtocolError::MisroutedReport { variable }.into());
                        }
                    }
                }
            }
        }

        if completion.remaining() != 0 {
            return Err(Error::Stalled {
                remaining: completion.remaining(),
            });
        }

        // The original's stats monitor prints the true cost of the final
        // assignment once every report is in; we fold the same re-evaluation
        // into the report.
        let global_cost = if assignments.len() == variables.len() {
            built
                .iter()
                .fold(Cost::ZERO, |acc, constraint| acc + constraint.cost(&assignments))
        } else {
            Cost::Infeasible
        };

        let variables_stats = agents
            .values()
            .map(|agent| VariableRunStats {
                variable: agent.id(),
                value: agent.committed_value().cloned(),
                visits: agent.node().total_visits(),
                infeasible_rounds: agent.node().infeasible_rounds(),
                is_leaf: agent.is_leaf(),
            })
            .collect();

        Ok(RunReport {
            assignments,
            bound,
            global_cost,
            variables: variables_stats,
            deliveries: router.delivered(),
        })
    }
}

impl<S: DomainSemantics> Default for SamplingEngine<S> {
    /// Confidence-bound sampling with Hoeffding termination — the stock
    /// strategy pair.
    fn default() -> Self {
        Self::new(
            Box::new(|_seed| Box::new(ConfidenceBoundPolicy::new())),
            Box::new(|| Box::new(ConfidenceTermination::new())),
        )
    }
}
