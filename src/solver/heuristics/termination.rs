use crate::solver::node::SearchNode;

/// A statistical stopping criterion for one variable's estimation.
///
/// `error` and `delta` are caller-supplied positive reals; smaller values
/// mean stricter convergence and more samples. Implementations must be
/// monotone in accumulated samples: once `converged` returns `true` for a
/// fixed `(error, delta)` and a given node, it must keep returning `true`
/// as further samples accumulate.
pub trait TerminationTest {
    fn converged(&self, node: &SearchNode, error: f64, delta: f64) -> bool;
}

/// Hoeffding-style convergence: estimation has converged once every
/// feasible value has been sampled and every feasible value's confidence
/// radius `sqrt(ln(2/delta) / 2n)` has shrunk to at most `error`.
///
/// The radius depends only on a value's sample count, so it shrinks
/// monotonically as samples accumulate, which gives the required
/// monotonicity. A node with no feasible value left is trivially converged
/// — there is nothing to estimate, and the agent's degenerate-commit path
/// still has to terminate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceTermination;

impl ConfidenceTermination {
    pub fn new() -> Self {
        Self
    }

    fn radius(samples: u64, delta: f64) -> f64 {
        ((2.0 / delta).ln() / (2.0 * samples as f64)).sqrt()
    }
}

impl TerminationTest for ConfidenceTermination {
    fn converged(&self, node: &SearchNode, error: f64, delta: f64) -> bool {
        let feasible = node.feasible_indices();
        if feasible.is_empty() {
            return true;
        }

        feasible.iter().all(|&index| {
            let samples = node.estimate_samples(index);
            samples > 0 && Self::radius(samples, delta) <= error
        })
    }
}
