use im::HashSet;

use crate::solver::{
    constraint::{Assignment, ConstraintDescriptor, CostFunction},
    cost::Cost,
    engine::VariableId,
    semantics::DomainSemantics,
};

/// A hard constraint requiring all variables in a set to take unique values.
///
/// The distributed rendition of the classic global constraint: the whole
/// scope is evaluated by the single agent that owns the deepest variable of
/// the scope in the pseudo-tree, against its context plus its own candidate
/// value.
#[derive(Debug, Clone)]
pub struct AllDifferentCost<S: DomainSemantics> {
    pub vars: Vec<VariableId>,
    _phantom: std::marker::PhantomData<S>,
}

impl<S: DomainSemantics> AllDifferentCost<S> {
    /// Creates a new `AllDifferentCost` over the given set of variables.
    pub fn new(vars: Vec<VariableId>) -> Self {
        Self {
            vars,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<S: DomainSemantics> CostFunction<S> for AllDifferentCost<S> {
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
            name: "AllDifferentCost".to_string(),
            description: format!("AllDifferent({})", vars_str),
        }
    }

    fn cost(&self, assignment: &Assignment<S::Value>) -> Cost {
        let mut seen = HashSet::new();
        for var in &self.vars {
            let Some(value) = assignment.get(var) else {
                return Cost::Infeasible;
            };
            if seen.insert(value.clone()).is_some() {
                return Cost::Infeasible;
            }
        }
        Cost::ZERO
    }

    fn cost_bound(&self) -> Option<f64> {
        Some(0.0)
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

    #[test]
    fn all_unique_costs_nothing() {
        let c = AllDifferentCost::<TestSemantics>::new(vec![0, 1, 2]);
        let assignment = im::hashmap! {
            0 => int_val(1),
            1 => int_val(2),
            2 => int_val(3),
        };
        assert_eq!(c.cost(&assignment), Cost::ZERO);
    }

    #[test]
    fn a_repeated_value_is_infeasible() {
        let c = AllDifferentCost::<TestSemantics>::new(vec![0, 1, 2]);
        let assignment = im::hashmap! {
            0 => int_val(1),
            1 => int_val(2),
            2 => int_val(1),
        };
        assert_eq!(c.cost(&assignment), Cost::Infeasible);
    }

    #[test]
    fn a_missing_scope_variable_is_infeasible() {
        let c = AllDifferentCost::<TestSemantics>::new(vec![0, 1, 2]);
        let assignment = im::hashmap! {
            0 => int_val(1),
            1 => int_val(2),
        };
        assert_eq!(c.cost(&assignment), Cost::Infeasible);
    }
}
