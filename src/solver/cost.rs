use serde::{Deserialize, Serialize};

/// Whether the solver is minimising cost or maximising utility.
///
/// The sense is configuration consumed at agent-construction time; every
/// comparison of sampled estimates goes through [`Cost::improves`] so that
/// the same engine serves both kinds of problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// The cost of a (partial) assignment under a set of constraints.
///
/// `Infeasible` is a sentinel, not an error: it is the normal control data
/// used to signal that a candidate value violates a hard constraint under
/// the current context. It propagates up the pseudo-tree in COST messages
/// and poisons any sum it participates in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cost {
    Feasible(f64),
    Infeasible,
}

impl Cost {
    /// The additive identity for cost accumulation.
    pub const ZERO: Cost = Cost::Feasible(0.0);

    pub fn is_feasible(&self) -> bool {
        matches!(self, Cost::Feasible(_))
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, Cost::Infeasible)
    }

    /// Returns the numeric cost, or `None` for the infeasible sentinel.
    pub fn value(&self) -> Option<f64> {
        match self {
            Cost::Feasible(v) => Some(*v),
            Cost::Infeasible => None,
        }
    }

    /// Divides a feasible cost by the global scaling factor. Infeasibility
    /// is preserved; it has no magnitude to scale.
    pub fn scaled(&self, scaling_factor: f64) -> Cost {
        match self {
            Cost::Feasible(v) => Cost::Feasible(v / scaling_factor),
            Cost::Infeasible => Cost::Infeasible,
        }
    }

    /// Whether `self` is a strictly better outcome than `other` under the
    /// given objective sense. Infeasible never improves on anything, and
    /// any feasible cost improves on infeasible.
    pub fn improves(&self, other: &Cost, sense: ObjectiveSense) -> bool {
        match (self, other) {
            (Cost::Infeasible, _) => false,
            (Cost::Feasible(_), Cost::Infeasible) => true,
            (Cost::Feasible(a), Cost::Feasible(b)) => match sense {
                ObjectiveSense::Minimize => a < b,
                ObjectiveSense::Maximize => a > b,
            },
        }
    }
}

impl std::ops::Add for Cost {
    type Output = Cost;

    /// Saturating addition: any infeasible operand poisons the sum.
    fn add(self, rhs: Cost) -> Cost {
        match (self, rhs) {
            (Cost::Feasible(a), Cost::Feasible(b)) => Cost::Feasible(a + b),
            _ => Cost::Infeasible,
        }
    }
}

impl std::ops::AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cost::Feasible(v) => write!(f, "{v}"),
            Cost::Infeasible => write!(f, "infeasible"),
        }
    }
}
