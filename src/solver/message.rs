use crate::solver::{
    constraint::CostFunction, cost::Cost, engine::VariableId, semantics::DomainSemantics,
    tree::TreeView,
};

/// Where an envelope is headed: a variable agent, or the run's statistics
/// sink (the external observer that collects assignment and bound reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Agent(VariableId),
    StatsSink,
}

/// The closed set of messages exchanged during a run, matched exhaustively
/// by every handler — adding a variant is a compile-time event, not a
/// stringly-typed one.
#[derive(Debug)]
pub enum Message<S: DomainSemantics> {
    /// One-shot pseudo-tree feed: this variable's (parent, children) view.
    TreeNotify { view: TreeView },

    /// One-shot normalization feed: the cost functions this variable alone
    /// evaluates, its separator, the raw violation penalty and the global
    /// scaling factor.
    NormalizeNotify {
        constraints: Vec<Box<dyn CostFunction<S>>>,
        separator: Vec<VariableId>,
        penalty: f64,
        scaling_factor: f64,
    },

    /// Parent → child: the sender's context extended with its freshly
    /// sampled value.
    Value {
        pairs: Vec<(VariableId, S::Value)>,
    },

    /// Parent → child: like `Value`, but final — the sender has committed,
    /// and every pair is frozen for the rest of the run.
    ValueFin {
        pairs: Vec<(VariableId, S::Value)>,
    },

    /// Child → parent: the sampled cost of the child's subtree under the
    /// parent's reported context. `Cost::Infeasible` is the poisoned /
    /// "null" report.
    Cost { cost: Cost },

    /// Agent → stats sink: the value this variable committed to.
    AssignmentReport { value: S::Value },

    /// Root → stats sink: the solution-quality bound contribution.
    BoundReport { bound: f64 },
}

impl<S: DomainSemantics> Message<S> {
    /// Short tag for trace logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::TreeNotify { .. } => "TREE",
            Message::NormalizeNotify { .. } => "NORMALIZE",
            Message::Value { .. } => "VALUE",
            Message::ValueFin { .. } => "VALUE_FIN",
            Message::Cost { .. } => "COST",
            Message::AssignmentReport { .. } => "ASSIGNMENT",
            Message::BoundReport { .. } => "BOUND",
        }
    }
}

/// A routed message: sender (`None` for the setup feeds), recipient, and
/// payload.
#[derive(Debug)]
pub struct Envelope<S: DomainSemantics> {
    pub sender: Option<VariableId>,
    pub receiver: Recipient,
    pub message: Message<S>,
}

impl<S: DomainSemantics> Envelope<S> {
    pub fn to_agent(
        sender: VariableId,
        receiver: VariableId,
        message: Message<S>,
    ) -> Self {
        Self {
            sender: Some(sender),
            receiver: Recipient::Agent(receiver),
            message,
        }
    }

    pub fn to_sink(sender: VariableId, message: Message<S>) -> Self {
        Self {
            sender: Some(sender),
            receiver: Recipient::StatsSink,
            message,
        }
    }

    pub fn setup(receiver: VariableId, message: Message<S>) -> Self {
        Self {
            sender: None,
            receiver: Recipient::Agent(receiver),
            message,
        }
    }
}
