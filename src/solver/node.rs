use crate::solver::cost::{Cost, ObjectiveSense};

/// Per-domain-value sampling statistics for one variable.
///
/// Each entry accumulates the visit count and summed sampled cost for one
/// domain value; the point estimate is the running mean. Visit counts are
/// monotone — history is never discarded. Feasibility flags are per-context
/// only: an infeasible observation clears the flag for the current context
/// round, and [`SearchNode::reset_feasibility`] re-arms every flag when the
/// context changes, so no value is ever pruned permanently.
#[derive(Debug, Clone)]
pub struct SearchNode {
    stats: Vec<ValueStats>,
    sense: ObjectiveSense,
    total_visits: u64,
    infeasible_rounds: u64,
    last_pick_random: bool,
}

#[derive(Debug, Clone, Default)]
struct ValueStats {
    visits: u64,
    cost_samples: u64,
    total_cost: f64,
    feasible: bool,
}

impl SearchNode {
    pub fn new(domain_size: usize, sense: ObjectiveSense) -> Self {
        Self {
            stats: vec![
                ValueStats {
                    visits: 0,
                    cost_samples: 0,
                    total_cost: 0.0,
                    feasible: true,
                };
                domain_size
            ],
            sense,
            total_visits: 0,
            infeasible_rounds: 0,
            last_pick_random: false,
        }
    }

    pub fn domain_size(&self) -> usize {
        self.stats.len()
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Records one sampled observation for a value.
    ///
    /// A feasible cost folds into the value's running mean. An infeasible
    /// observation still counts as a visit, but clears the value's
    /// feasibility flag until the next context change and leaves the mean
    /// untouched — poisoned rounds carry no cost information.
    pub fn record_sample(&mut self, value_index: usize, observed: Cost) {
        let entry = &mut self.stats[value_index];
        entry.visits += 1;
        self.total_visits += 1;
        match observed {
            Cost::Feasible(cost) => {
                entry.cost_samples += 1;
                entry.total_cost += cost;
            }
            Cost::Infeasible => {
                entry.feasible = false;
                self.infeasible_rounds += 1;
            }
        }
    }

    /// The value with the best current mean estimate among feasible values,
    /// ties broken by lowest index for determinism. `None` when no visited
    /// value is feasible under the current context.
    pub fn best_estimate(&self) -> Option<(usize, Cost)> {
        let mut best: Option<(usize, Cost)> = None;
        for (index, entry) in self.stats.iter().enumerate() {
            if !entry.feasible || entry.cost_samples == 0 {
                continue;
            }
            let estimate = Cost::Feasible(entry.total_cost / entry.cost_samples as f64);
            match &best {
                Some((_, incumbent)) if !estimate.improves(incumbent, self.sense) => {}
                _ => best = Some((index, estimate)),
            }
        }
        best
    }

    /// The running mean for one value, if any feasible sample has landed
    /// on it.
    pub fn mean(&self, value_index: usize) -> Option<f64> {
        let entry = &self.stats[value_index];
        (entry.cost_samples > 0).then(|| entry.total_cost / entry.cost_samples as f64)
    }

    /// The number of feasible observations informing a value's mean. This
    /// is the sample count the termination test's confidence radius is
    /// computed from.
    pub fn estimate_samples(&self, value_index: usize) -> u64 {
        self.stats[value_index].cost_samples
    }

    pub fn visits(&self, value_index: usize) -> u64 {
        self.stats[value_index].visits
    }

    pub fn total_visits(&self) -> u64 {
        self.total_visits
    }

    pub fn infeasible_rounds(&self) -> u64 {
        self.infeasible_rounds
    }

    pub fn is_feasible(&self, value_index: usize) -> bool {
        self.stats[value_index].feasible
    }

    /// Indices of the values still feasible under the current context.
    pub fn feasible_indices(&self) -> Vec<usize> {
        self.stats
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.feasible)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn has_feasible_value(&self) -> bool {
        self.stats.iter().any(|entry| entry.feasible)
    }

    /// Re-arms every feasibility flag. Called on each context change: an
    /// ancestor picking a new value can make previously-violating values
    /// consistent again, so only samples, never values, are pruned.
    pub fn reset_feasibility(&mut self) {
        for entry in &mut self.stats {
            entry.feasible = true;
        }
    }

    /// Marks whether the pick being sampled this round came from the
    /// sampling policy (exploratory) or was forced (single remaining
    /// value). Only policy picks feed back into the policy's statistics.
    pub fn set_random_pick(&mut self, random: bool) {
        self.last_pick_random = random;
    }

    pub fn was_random_pick(&self) -> bool {
        self.last_pick_random
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn node(domain_size: usize) -> SearchNode {
        SearchNode::new(domain_size, ObjectiveSense::Minimize)
    }

    #[test]
    fn best_estimate_tracks_the_running_mean() {
        let mut node = node(2);
        node.record_sample(0, Cost::Feasible(4.0));
        node.record_sample(0, Cost::Feasible(2.0));
        node.record_sample(1, Cost::Feasible(5.0));

        assert_eq!(node.best_estimate(), Some((0, Cost::Feasible(3.0))));
        assert_eq!(node.mean(1), Some(5.0));
    }

    #[test]
    fn ties_break_towards_the_lowest_index() {
        let mut node = node(3);
        node.record_sample(2, Cost::Feasible(1.0));
        node.record_sample(1, Cost::Feasible(1.0));

        assert_eq!(node.best_estimate(), Some((1, Cost::Feasible(1.0))));
    }

    #[test]
    fn maximisation_flips_the_comparison() {
        let mut node = SearchNode::new(2, ObjectiveSense::Maximize);
        node.record_sample(0, Cost::Feasible(1.0));
        node.record_sample(1, Cost::Feasible(9.0));

        assert_eq!(node.best_estimate(), Some((1, Cost::Feasible(9.0))));
    }

    #[test]
    fn infeasible_observations_count_visits_but_disarm_the_value() {
        let mut node = node(2);
        node.record_sample(0, Cost::Feasible(1.0));
        node.record_sample(0, Cost::Infeasible);

        assert_eq!(node.visits(0), 2);
        assert_eq!(node.estimate_samples(0), 1);
        assert!(!node.is_feasible(0));
        assert_eq!(node.best_estimate(), None);
        assert_eq!(node.infeasible_rounds(), 1);
    }

    #[test]
    fn resetting_feasibility_keeps_history() {
        let mut node = node(2);
        node.record_sample(0, Cost::Feasible(4.0));
        node.record_sample(0, Cost::Infeasible);
        node.reset_feasibility();

        assert!(node.is_feasible(0));
        assert_eq!(node.visits(0), 2);
        // The poisoned round contributed a visit but no cost information.
        assert_eq!(node.mean(0), Some(4.0));
        assert_eq!(node.feasible_indices(), vec![0, 1]);
    }
}
