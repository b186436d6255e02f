use crate::solver::{
    constraint::{Assignment, ConstraintDescriptor, CostFunction},
    cost::Cost,
    engine::VariableId,
    semantics::DomainSemantics,
};

/// A hard binary constraint requiring two variables to take different values.
#[derive(Debug, Clone)]
pub struct NotEqualCost<S: DomainSemantics> {
    pub vars: [VariableId; 2],
    _phantom: std::marker::PhantomData<S>,
}

impl<S: DomainSemantics> NotEqualCost<S> {
    pub fn new(a: VariableId, b: VariableId) -> Self {
        Self {
            vars: [a, b],
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<S: DomainSemantics> CostFunction<S> for NotEqualCost<S> {
    fn variables(&self) -> &[VariableId] {
        &self.vars
    }

    fn descriptor(&self) -> ConstraintDescriptor {
        ConstraintDescriptor {
            name: "NotEqualCost".to_string(),
            description: format!("?{} != ?{}", self.vars[0], self.vars[1]),
        }
    }

    fn cost(&self, assignment: &Assignment<S::Value>) -> Cost {
        let (Some(a), Some(b)) = (
            assignment.get(&self.vars[0]),
            assignment.get(&self.vars[1]),
        ) else {
            return Cost::Infeasible;
        };

        if a == b {
            Cost::Infeasible
        } else {
            Cost::ZERO
        }
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

    #[test]
    fn equal_values_are_infeasible() {
        let c = NotEqualCost::<TestSemantics>::new(0, 1);
        let assignment = im::hashmap! {
            0 => StandardValue::Int(3),
            1 => StandardValue::Int(3),
        };
        assert_eq!(c.cost(&assignment), Cost::Infeasible);
    }

    #[test]
    fn different_values_cost_nothing() {
        let c = NotEqualCost::<TestSemantics>::new(0, 1);
        let assignment = im::hashmap! {
            0 => StandardValue::Int(3),
            1 => StandardValue::Int(4),
        };
        assert_eq!(c.cost(&assignment), Cost::ZERO);
    }

    #[test]
    fn uncovered_scope_is_infeasible() {
        let c = NotEqualCost::<TestSemantics>::new(0, 1);
        let assignment = im::hashmap! { 0 => StandardValue::Int(3) };
        assert_eq!(c.cost(&assignment), Cost::Infeasible);
    }
}
