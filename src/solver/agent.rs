use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::{
    error::{ProtocolError, Result},
    solver::{
        constraint::CostFunction,
        context::Context,
        cost::{Cost, ObjectiveSense},
        engine::{CompletionHandle, VariableId},
        heuristics::{sampling::SamplingPolicy, termination::TerminationTest},
        message::{Envelope, Message},
        node::SearchNode,
        semantics::DomainSemantics,
        tree::TreeView,
    },
};

/// Lifecycle of a variable agent. Transitions only ever move rightwards:
/// `AwaitingTree → AwaitingNormalize → Sampling → Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    AwaitingTree,
    AwaitingNormalize,
    Sampling,
    Committed,
}

/// Bookkeeping for one sampling round: the value being tried, its local
/// cost, and which children have reported so far.
struct CostRound {
    value_index: usize,
    local_cost: Cost,
    total: Cost,
    reported: BTreeSet<VariableId>,
}

/// The per-variable state machine driving the distributed sampling search.
///
/// One agent exists per variable; its state is mutated exclusively by its
/// own message handlers (single-writer), and handlers never block — each
/// returns the envelopes to enqueue and the next transition happens when
/// the next message is delivered. The sampling policy and termination test
/// are injected at construction; the pruning flag decides whether poisoned
/// rounds short-circuit.
pub struct VariableAgent<S: DomainSemantics> {
    id: VariableId,
    domain: Vec<S::Value>,
    sense: ObjectiveSense,
    error: f64,
    delta: f64,
    pruning: bool,

    state: AgentState,
    parent: Option<VariableId>,
    children: Vec<VariableId>,

    context: Context<S::Value>,
    constraints: Vec<Box<dyn CostFunction<S>>>,
    penalty: f64,
    scaling_factor: f64,

    node: SearchNode,
    policy: Box<dyn SamplingPolicy>,
    termination: Box<dyn TerminationTest>,

    current_value_index: Option<usize>,
    round: Option<CostRound>,
    stale_costs: BTreeMap<VariableId, u32>,
    parent_finished: bool,
    infeasible_path: bool,
    buffered_value: Option<Vec<(VariableId, S::Value)>>,
    committed_value: Option<S::Value>,
    completion: CompletionHandle,
}

impl<S: DomainSemantics> VariableAgent<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: VariableId,
        domain: Vec<S::Value>,
        sense: ObjectiveSense,
        error: f64,
        delta: f64,
        pruning: bool,
        policy: Box<dyn SamplingPolicy>,
        termination: Box<dyn TerminationTest>,
        completion: CompletionHandle,
    ) -> Self {
        let node = SearchNode::new(domain.len(), sense);
        Self {
            id,
            domain,
            sense,
            error,
            delta,
            pruning,
            state: AgentState::AwaitingTree,
            parent: None,
            children: Vec::new(),
            context: Context::empty(),
            constraints: Vec::new(),
            penalty: 0.0,
            scaling_factor: 1.0,
            node,
            policy,
            termination,
            current_value_index: None,
            round: None,
            stale_costs: BTreeMap::new(),
            parent_finished: false,
            infeasible_path: false,
            buffered_value: None,
            committed_value: None,
            completion,
        }
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn committed_value(&self) -> Option<&S::Value> {
        self.committed_value.as_ref()
    }

    pub fn context(&self) -> &Context<S::Value> {
        &self.context
    }

    pub fn node(&self) -> &SearchNode {
        &self.node
    }

    /// Whether the round in progress is already known to be poisoned.
    pub fn on_infeasible_path(&self) -> bool {
        self.infeasible_path
    }

    /// Dispatches one inbound message, returning the envelopes to enqueue.
    pub fn handle(
        &mut self,
        sender: Option<VariableId>,
        message: Message<S>,
    ) -> Result<Vec<Envelope<S>>> {
        trace!(variable = self.id, kind = message.kind(), "handling message");
        match message {
            Message::TreeNotify { view } => self.on_tree(view),
            Message::NormalizeNotify {
                constraints,
                separator,
                penalty,
                scaling_factor,
            } => self.on_normalize(constraints, separator, penalty, scaling_factor),
            Message::Value { pairs } => self.on_value(sender, pairs),
            Message::ValueFin { pairs } => self.on_value_fin(sender, pairs),
            Message::Cost { cost } => self.on_cost(sender, cost),
            Message::AssignmentReport { .. } | Message::BoundReport { .. } => {
                Err(ProtocolError::MisroutedReport { variable: self.id }.into())
            }
        }
    }

    fn on_tree(&mut self, view: TreeView) -> Result<Vec<Envelope<S>>> {
        if self.state != AgentState::AwaitingTree {
            return Err(ProtocolError::DuplicateTreeNotify(self.id).into());
        }
        debug_assert_eq!(view.variable, self.id);

        self.parent = view.parent;
        self.children = view.children;
        // The root answers to nobody; its own convergence is the trigger.
        self.parent_finished = self.parent.is_none();
        self.state = AgentState::AwaitingNormalize;
        Ok(Vec::new())
    }

    fn on_normalize(
        &mut self,
        constraints: Vec<Box<dyn CostFunction<S>>>,
        separator: Vec<VariableId>,
        penalty: f64,
        scaling_factor: f64,
    ) -> Result<Vec<Envelope<S>>> {
        match self.state {
            AgentState::AwaitingTree => {
                return Err(ProtocolError::MessageBeforeTree { variable: self.id }.into())
            }
            AgentState::AwaitingNormalize => {}
            _ => return Err(ProtocolError::DuplicateNormalize(self.id).into()),
        }

        self.context = Context::new(separator.into_iter().collect());
        self.constraints = constraints;
        self.scaling_factor = scaling_factor;
        self.penalty = penalty / scaling_factor;
        self.state = AgentState::Sampling;

        let mut out = Vec::new();
        if self.is_root() {
            if self.is_leaf() {
                // An isolated variable: solve alone and commit on the spot.
                self.commit(&mut out);
            } else {
                self.begin_sampling_round(&mut out);
            }
        } else if let Some(pairs) = self.buffered_value.take() {
            // Replay the VALUE that arrived before normalization.
            self.process_value(pairs, &mut out)?;
        }
        Ok(out)
    }

    fn on_value(
        &mut self,
        sender: Option<VariableId>,
        pairs: Vec<(VariableId, S::Value)>,
    ) -> Result<Vec<Envelope<S>>> {
        match self.state {
            AgentState::AwaitingTree => {
                return Err(ProtocolError::MessageBeforeTree { variable: self.id }.into())
            }
            AgentState::Committed => {
                return Err(ProtocolError::MessageAfterCommit {
                    variable: self.id,
                    kind: "VALUE",
                }
                .into())
            }
            _ => {}
        }
        self.require_parent(sender)?;

        if self.state == AgentState::AwaitingNormalize {
            // A variable has at most one parent, so at most one VALUE can be
            // in flight before normalization.
            if self.buffered_value.is_some() {
                return Err(ProtocolError::ValueBufferOverflow { variable: self.id }.into());
            }
            self.buffered_value = Some(pairs);
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        self.process_value(pairs, &mut out)?;
        Ok(out)
    }

    fn process_value(
        &mut self,
        pairs: Vec<(VariableId, S::Value)>,
        out: &mut Vec<Envelope<S>>,
    ) -> Result<()> {
        // A new VALUE can supersede a round still waiting on child costs
        // (the parent short-circuited). Answer the superseded round so the
        // parent's per-child accounting stays aligned, then start afresh.
        if self.round.is_some() {
            self.abandon_round();
            if let Some(parent) = self.parent {
                out.push(Envelope::to_agent(
                    self.id,
                    parent,
                    Message::Cost {
                        cost: Cost::Infeasible,
                    },
                ));
            }
        }

        let changed = self.context.merge(&pairs, false)?;
        if changed {
            self.node.reset_feasibility();
        }

        if self.is_leaf() {
            // Leaves never sample: evaluate exactly and report immediately.
            let (index, cost) = self.solve_exact();
            self.current_value_index = Some(index);
            if let Some(parent) = self.parent {
                out.push(Envelope::to_agent(self.id, parent, Message::Cost { cost }));
            }
        } else {
            self.begin_sampling_round(out);
        }
        Ok(())
    }

    fn on_value_fin(
        &mut self,
        sender: Option<VariableId>,
        pairs: Vec<(VariableId, S::Value)>,
    ) -> Result<Vec<Envelope<S>>> {
        match self.state {
            AgentState::AwaitingTree => {
                return Err(ProtocolError::MessageBeforeTree { variable: self.id }.into())
            }
            AgentState::AwaitingNormalize => {
                return Err(ProtocolError::ValueFinBeforeNormalize { variable: self.id }.into())
            }
            AgentState::Committed => {
                return Err(ProtocolError::MessageAfterCommit {
                    variable: self.id,
                    kind: "VALUE_FIN",
                }
                .into())
            }
            AgentState::Sampling => {}
        }
        self.require_parent(sender)?;

        let changed = self.context.merge(&pairs, true)?;
        if changed {
            self.node.reset_feasibility();
        }
        self.parent_finished = true;

        // Any round still in flight is superseded; the parent has committed
        // and no longer counts replies.
        if self.round.is_some() {
            self.abandon_round();
        }

        let mut out = Vec::new();
        if self.is_leaf() || self.termination.converged(&self.node, self.error, self.delta) {
            self.commit(&mut out);
        } else {
            self.begin_sampling_round(&mut out);
        }
        Ok(out)
    }

    fn on_cost(&mut self, sender: Option<VariableId>, cost: Cost) -> Result<Vec<Envelope<S>>> {
        if self.state == AgentState::AwaitingTree {
            return Err(ProtocolError::MessageBeforeTree { variable: self.id }.into());
        }
        let sender = match sender {
            Some(sender) if self.children.contains(&sender) => sender,
            Some(sender) => {
                return Err(ProtocolError::CostFromNonChild {
                    variable: self.id,
                    sender,
                }
                .into())
            }
            None => {
                return Err(ProtocolError::CostFromNonChild {
                    variable: self.id,
                    sender: self.id,
                }
                .into())
            }
        };

        // Replies to rounds this agent abandoned arrive first on the
        // per-child FIFO channel; drop them against the stale debt.
        if let Some(debt) = self.stale_costs.get_mut(&sender) {
            if *debt > 0 {
                *debt -= 1;
                trace!(variable = self.id, child = sender, "dropping stale cost");
                return Ok(Vec::new());
            }
        }

        if self.state == AgentState::Committed {
            // A child's reply to the round that was in flight when our own
            // parent finalised us. Nothing left to fold it into.
            trace!(variable = self.id, child = sender, "cost after commit");
            return Ok(Vec::new());
        }

        let value_index = {
            let Some(round) = self.round.as_mut() else {
                return Err(ProtocolError::UnexpectedCost {
                    variable: self.id,
                    sender,
                }
                .into());
            };
            if !round.reported.insert(sender) {
                return Err(ProtocolError::UnexpectedCost {
                    variable: self.id,
                    sender,
                }
                .into());
            }
            round.total += cost;
            round.value_index
        };

        let mut out = Vec::new();
        if cost.is_infeasible() {
            self.infeasible_path = true;
            if self.pruning {
                // Pruning short-circuit: the round is poisoned, so abandon
                // it without waiting for the remaining children and move
                // straight to the next sample.
                self.node.record_sample(value_index, Cost::Infeasible);
                self.abandon_round();
                debug!(
                    variable = self.id,
                    value_index, "short-circuiting poisoned round"
                );
                self.begin_sampling_round(&mut out);
                return Ok(out);
            }
        }

        let complete = self
            .round
            .as_ref()
            .is_some_and(|round| round.reported.len() >= self.children.len());
        if !complete {
            return Ok(out);
        }

        // Round complete: fold the children's total plus the local cost
        // into the statistics, then either keep sampling, finalise, or pass
        // the aggregate upward depending on the parent's state.
        let round = self.round.take().expect("round is outstanding");
        let observed = round.total + round.local_cost;
        self.node.record_sample(round.value_index, observed);
        if self.node.was_random_pick() {
            self.policy.record_round(&self.node);
        }

        if self.parent_finished {
            if self.termination.converged(&self.node, self.error, self.delta) {
                self.commit(&mut out);
            } else {
                self.begin_sampling_round(&mut out);
            }
        } else if let Some(parent) = self.parent {
            let upward = if observed.is_feasible() {
                observed
            } else if self.node.has_feasible_value() {
                Cost::Feasible(self.penalty)
            } else {
                Cost::Infeasible
            };
            out.push(Envelope::to_agent(
                self.id,
                parent,
                Message::Cost { cost: upward },
            ));
        }
        Ok(out)
    }

    /// Picks the next value to try and opens a round: VALUE to every child.
    ///
    /// With no feasible value left the node is exhausted for this context:
    /// a variable still answering its parent reports the penalty upward,
    /// while one whose parent has finished commits degenerately (the
    /// termination test treats an empty feasible set as converged, and the
    /// run must still terminate).
    fn begin_sampling_round(&mut self, out: &mut Vec<Envelope<S>>) {
        match self.sample() {
            Some((index, local_cost)) => {
                self.current_value_index = Some(index);
                let pairs = self
                    .context
                    .pairs_with(self.id, self.domain[index].clone());
                self.round = Some(CostRound {
                    value_index: index,
                    local_cost,
                    total: Cost::ZERO,
                    reported: BTreeSet::new(),
                });
                for child in &self.children {
                    out.push(Envelope::to_agent(
                        self.id,
                        *child,
                        Message::Value {
                            pairs: pairs.clone(),
                        },
                    ));
                }
            }
            None => {
                if self.parent_finished {
                    self.commit(out);
                } else if let Some(parent) = self.parent {
                    out.push(Envelope::to_agent(
                        self.id,
                        parent,
                        Message::Cost {
                            cost: Cost::Feasible(self.penalty),
                        },
                    ));
                }
            }
        }
    }

    /// Selects a value for the next round, pre-pruning values the local
    /// constraints already rule out under the current context (when pruning
    /// is enabled). A single remaining value is a forced pick; only
    /// policy-selected picks are flagged as random.
    fn sample(&mut self) -> Option<(usize, Cost)> {
        self.infeasible_path = false;
        loop {
            let feasible = self.node.feasible_indices();
            if feasible.is_empty() {
                return None;
            }
            let (index, random) = if feasible.len() == 1 {
                (feasible[0], false)
            } else {
                (self.policy.select_next(&self.node)?, true)
            };
            self.node.set_random_pick(random);

            let local = self.local_cost(index);
            if local.is_infeasible() {
                if self.pruning {
                    self.node.record_sample(index, Cost::Infeasible);
                    continue;
                }
                // Still sample and propagate; the round folds as poisoned.
                self.infeasible_path = true;
            }
            return Some((index, local));
        }
    }

    /// The scaled cost of this variable's own constraints under the current
    /// context extended with one candidate value.
    fn local_cost(&self, index: usize) -> Cost {
        let assignment = self
            .context
            .assignment()
            .update(self.id, self.domain[index].clone());
        let mut total = Cost::ZERO;
        for constraint in &self.constraints {
            total += constraint.cost(&assignment);
        }
        total.scaled(self.scaling_factor)
    }

    /// Exact resolution over the whole domain — the leaf path, and the
    /// isolated-variable path. Deterministic for a fixed context.
    fn solve_exact(&self) -> (usize, Cost) {
        let mut best: Option<(usize, Cost)> = None;
        for index in 0..self.domain.len() {
            let cost = self.local_cost(index);
            match &best {
                Some((_, incumbent)) if !cost.improves(incumbent, self.sense) => {}
                _ => best = Some((index, cost)),
            }
        }
        best.unwrap_or((0, Cost::Infeasible))
    }

    /// Finalises this agent exactly once: pick the committed value, report
    /// it, cascade VALUE_FIN to the children, and decrement the global
    /// active-variable counter.
    fn commit(&mut self, out: &mut Vec<Envelope<S>>) {
        if self.state == AgentState::Committed {
            return;
        }

        let index = if self.is_leaf() {
            self.solve_exact().0
        } else {
            self.node
                .best_estimate()
                .map(|(index, _)| index)
                .or(self.current_value_index)
                .unwrap_or(0)
        };
        let value = self.domain[index].clone();
        self.committed_value = Some(value.clone());
        self.current_value_index = Some(index);
        self.state = AgentState::Committed;
        self.round = None;
        debug!(variable = self.id, value = ?value, "committed");

        out.push(Envelope::to_sink(
            self.id,
            Message::AssignmentReport {
                value: value.clone(),
            },
        ));
        if self.is_root() {
            // The estimate was accepted within `error` in scaled units;
            // translated back to raw cost units that is the root's bound
            // contribution.
            out.push(Envelope::to_sink(
                self.id,
                Message::BoundReport {
                    bound: self.error * self.scaling_factor,
                },
            ));
        }

        let pairs = self.context.pairs_with(self.id, value);
        for child in &self.children {
            out.push(Envelope::to_agent(
                self.id,
                *child,
                Message::ValueFin {
                    pairs: pairs.clone(),
                },
            ));
        }
        self.completion.report_committed();
    }

    /// Drops the in-flight round, recording one unit of stale debt for
    /// every child that had not yet reported: their eventual replies belong
    /// to the dead round and must be ignored when they arrive.
    fn abandon_round(&mut self) {
        let Some(round) = self.round.take() else {
            return;
        };
        for child in &self.children {
            if !round.reported.contains(child) {
                *self.stale_costs.entry(*child).or_insert(0) += 1;
            }
        }
    }

    fn require_parent(&self, sender: Option<VariableId>) -> Result<()> {
        match (sender, self.parent) {
            (Some(sender), Some(parent)) if sender == parent => Ok(()),
            (sender, _) => Err(ProtocolError::ValueFromNonParent {
                variable: self.id,
                sender: sender.unwrap_or(self.id),
            }
            .into()),
        }
    }
}
