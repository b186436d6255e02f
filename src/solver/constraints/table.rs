use crate::solver::{
    constraint::{Assignment, ConstraintDescriptor, CostFunction},
    cost::Cost,
    engine::VariableId,
    semantics::DomainSemantics,
};

/// An extensional (table) cost function: an explicit list of tuples, each
/// with its own cost, plus a default cost for every unlisted tuple.
///
/// This is the workhorse representation for weighted DCOP instances — any
/// finite cost function over a small scope can be written as a table. Use
/// [`Cost::Infeasible`] as the default to express a hard constraint with
/// listed exceptions.
#[derive(Debug, Clone)]
pub struct TableCost<S: DomainSemantics> {
    vars: Vec<VariableId>,
    rows: Vec<(Vec<S::Value>, Cost)>,
    default: Cost,
}

impl<S: DomainSemantics> TableCost<S> {
    /// Creates a new table over `vars`. Each row pairs one value per scope
    /// variable (in scope order) with the cost of that tuple.
    pub fn new(vars: Vec<VariableId>, rows: Vec<(Vec<S::Value>, Cost)>, default: Cost) -> Self {
        debug_assert!(rows.iter().all(|(tuple, _)| tuple.len() == vars.len()));
        Self {
            vars,
            rows,
            default,
        }
    }
}

impl<S: DomainSemantics> CostFunction<S> for TableCost<S> {
    fn variables(&self) -> &[VariableId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        let vars_str = self
            .vars
            .iter()
            .map(|v| format!("?{}", v))
            .collect::<Vec<_>>()
            .join(", ");
        ConstraintDescriptor {
            name: "TableCost".to_string(),
            description: format!("Table({}) with {} rows", vars_str, self.rows.len()),
        }
    }

    fn cost(&self, assignment: &Assignment<S::Value>) -> Cost {
        let mut tuple = Vec::with_capacity(self.vars.len());
        for var in &self.vars {
            let Some(value) = assignment.get(var) else {
                return Cost::Infeasible;
            };
            tuple.push(value);
        }

        self.rows
            .iter()
            .find(|(row, _)| row.iter().zip(tuple.iter()).all(|(a, b)| a == *b))
            .map(|(_, cost)| *cost)
            .unwrap_or(self.default)
    }

    fn cost_bound(&self) -> Option<f64> {
        self.rows
            .iter()
            .map(|(_, cost)| cost)
            .chain(std::iter::once(&self.default))
            .filter_map(|cost| cost.value())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::solver::{constraint::CostFunction, value::StandardValue};

    #[derive(Debug, Clone)]
    struct TestSemantics;

    impl DomainSemantics for TestSemantics {
        type Value = StandardValue;
        type ConstraintDefinition = ();

        fn build_constraint(
            &self,
            _definition: &Self::ConstraintDefinition,
        ) -> Box<dyn CostFunction<Self>> {
            unimplemented!("Not needed for cost function unit tests")
        }
    }

    fn int_val(i: i64) -> StandardValue {
        StandardValue::Int(i)
    }

    fn sample_table() -> TableCost<TestSemantics> {
        TableCost::new(
            vec![0, 1],
            vec![
                (vec![int_val(1), int_val(1)], Cost::Feasible(5.0)),
                (vec![int_val(1), int_val(2)], Cost::Feasible(1.0)),
            ],
            Cost::Feasible(10.0),
        )
    }

    #[test]
    fn listed_tuples_use_their_row_cost() {
        let table = sample_table();
        let assignment = im::hashmap! { 0 => int_val(1), 1 => int_val(2) };
        assert_eq!(table.cost(&assignment), Cost::Feasible(1.0));
    }

    #[test]
    fn unlisted_tuples_use_the_default() {
        let table = sample_table();
        let assignment = im::hashmap! { 0 => int_val(2), 1 => int_val(2) };
        assert_eq!(table.cost(&assignment), Cost::Feasible(10.0));
    }

    #[test]
    fn infeasible_default_makes_a_hard_table() {
        let table = TableCost::<TestSemantics>::new(
            vec![0, 1],
            vec![(vec![int_val(1), int_val(2)], Cost::ZERO)],
            Cost::Infeasible,
        );
        let allowed = im::hashmap! { 0 => int_val(1), 1 => int_val(2) };
        let forbidden = im::hashmap! { 0 => int_val(2), 1 => int_val(1) };
        assert_eq!(table.cost(&allowed), Cost::ZERO);
        assert_eq!(table.cost(&forbidden), Cost::Infeasible);
    }

    #[test]
    fn bound_is_the_largest_finite_cost() {
        let table = sample_table();
        assert_eq!(table.cost_bound(), Some(10.0));

        let hard = TableCost::<TestSemantics>::new(
            vec![0],
            vec![(vec![int_val(1)], Cost::Feasible(2.0))],
            Cost::Infeasible,
        );
        assert_eq!(hard.cost_bound(), Some(2.0));
    }
}
