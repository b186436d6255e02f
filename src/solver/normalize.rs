use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::solver::{
    constraint::CostFunction,
    engine::VariableId,
    semantics::DomainSemantics,
    tree::PseudoTree,
};

/// The one-shot normalization payload for a single variable: the cost
/// functions it alone is responsible for evaluating, its separator, the raw
/// violation penalty and the global scaling factor.
pub struct NormalizePayload<S: DomainSemantics> {
    pub constraints: Vec<Box<dyn CostFunction<S>>>,
    pub separator: Vec<VariableId>,
    pub penalty: f64,
    pub scaling_factor: f64,
}

/// Partitions the problem's cost functions among the variables of a
/// pseudo-tree and computes the global cost-scaling factor.
///
/// Each cost function is owned by the deepest variable of its scope, which
/// is the unique variable that sees the whole scope assigned (its separator
/// plus its own value) when it evaluates. Separators are accumulated bottom
/// up so that the invariant `sep(child) ⊆ sep(parent) ∪ {parent}` holds —
/// exactly what VALUE propagation relies on.
///
/// This is a stand-in for an external normalization protocol; the search
/// engine only ever consumes the per-variable [`NormalizePayload`].
pub struct Normalizer;

impl Normalizer {
    pub fn distribute<S: DomainSemantics>(
        semantics: &S,
        definitions: &[S::ConstraintDefinition],
        tree: &PseudoTree,
        penalty: f64,
    ) -> BTreeMap<VariableId, NormalizePayload<S>> {
        let built: Vec<Box<dyn CostFunction<S>>> = definitions
            .iter()
            .map(|definition| semantics.build_constraint(definition))
            .collect();

        // Costs across the tree are compared after division by a single
        // global factor; deriving it from the largest finite cost any one
        // function can report keeps scaled local costs in a comparable
        // range. Hard constraints bound at zero and contribute nothing.
        let scaling_factor = built
            .iter()
            .filter_map(|constraint| constraint.cost_bound())
            .fold(1.0f64, f64::max);

        let mut owned: BTreeMap<VariableId, Vec<Box<dyn CostFunction<S>>>> = BTreeMap::new();
        for view in tree.views() {
            owned.insert(view.variable, Vec::new());
        }
        for constraint in built {
            let owner = tree
                .deepest(constraint.variables())
                .expect("constraint scope references unknown variables");
            debug!(
                owner,
                constraint = %constraint.descriptor().description,
                "assigning cost function"
            );
            owned.entry(owner).or_default().push(constraint);
        }

        // Bottom-up accumulation of each subtree's external references:
        // ext(v) = (ext over children ∪ scopes owned by v) \ {v}. By the
        // pseudo-tree property every remaining reference is an ancestor of
        // v, so ext(v) is exactly v's separator.
        let mut external: BTreeMap<VariableId, BTreeSet<VariableId>> = BTreeMap::new();
        for variable in tree.bottom_up() {
            let view = tree.view(variable).expect("variable missing from tree");
            let mut refs: BTreeSet<VariableId> = BTreeSet::new();
            for child in &view.children {
                if let Some(child_refs) = external.get(child) {
                    refs.extend(child_refs.iter().copied());
                }
            }
            if let Some(constraints) = owned.get(&variable) {
                for constraint in constraints {
                    refs.extend(constraint.variables().iter().copied());
                }
            }
            refs.remove(&variable);
            external.insert(variable, refs);
        }

        let mut payloads = BTreeMap::new();
        for view in tree.views() {
            let variable = view.variable;
            let separator: Vec<VariableId> = external
                .remove(&variable)
                .map(|refs| refs.into_iter().collect())
                .unwrap_or_default();
            payloads.insert(
                variable,
                NormalizePayload {
                    constraints: owned.remove(&variable).unwrap_or_default(),
                    separator,
                    penalty,
                    scaling_factor,
                },
            );
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::solver::{
        constraints::{not_equal::NotEqualCost, table::TableCost},
        cost::Cost,
        value::StandardValue,
    };

    #[derive(Debug, Clone)]
    enum TestConstraint {
        NotEqual(VariableId, VariableId),
        Soft(VariableId, VariableId, f64),
    }

    #[derive(Debug, Clone)]
    struct TestSemantics;

    impl DomainSemantics for TestSemantics {
        type Value = StandardValue;
        type ConstraintDefinition = TestConstraint;

        fn build_constraint(
            &self,
            definition: &Self::ConstraintDefinition,
        ) -> Box<dyn CostFunction<Self>> {
            match definition {
                TestConstraint::NotEqual(a, b) => Box::new(NotEqualCost::new(*a, *b)),
                TestConstraint::Soft(a, b, cost) => Box::new(TableCost::new(
                    vec![*a, *b],
                    vec![],
                    Cost::Feasible(*cost),
                )),
            }
        }
    }

    #[test]
    fn each_constraint_lands_on_its_deepest_scope_variable() {
        let definitions = vec![
            TestConstraint::NotEqual(0, 1),
            TestConstraint::NotEqual(1, 2),
            TestConstraint::NotEqual(0, 2),
        ];
        let tree = PseudoTree::from_scopes(
            &[0, 1, 2],
            &[vec![0, 1], vec![1, 2], vec![0, 2]],
            None,
        );
        let payloads = Normalizer::distribute(&TestSemantics, &definitions, &tree, 100.0);

        assert_eq!(payloads[&0].constraints.len(), 0);
        assert_eq!(payloads[&1].constraints.len(), 1);
        assert_eq!(payloads[&2].constraints.len(), 2);
    }

    #[test]
    fn separators_cover_back_edges_through_intermediate_variables() {
        // Chain 0 - 1 - 2 plus a back edge 0 - 2. Variable 1's separator
        // must include 0 even though no constraint of its own mentions it,
        // because its child's does.
        let definitions = vec![
            TestConstraint::NotEqual(0, 1),
            TestConstraint::NotEqual(1, 2),
            TestConstraint::NotEqual(0, 2),
        ];
        let tree = PseudoTree::from_scopes(
            &[0, 1, 2],
            &[vec![0, 1], vec![1, 2], vec![0, 2]],
            None,
        );
        let payloads = Normalizer::distribute(&TestSemantics, &definitions, &tree, 100.0);

        assert_eq!(payloads[&0].separator, Vec::<VariableId>::new());
        assert_eq!(payloads[&1].separator, vec![0]);
        assert_eq!(payloads[&2].separator, vec![0, 1]);
    }

    #[test]
    fn the_scaling_factor_tracks_the_largest_finite_bound() {
        let definitions = vec![
            TestConstraint::NotEqual(0, 1),
            TestConstraint::Soft(1, 2, 7.5),
            TestConstraint::Soft(0, 2, 3.0),
        ];
        let tree = PseudoTree::from_scopes(
            &[0, 1, 2],
            &[vec![0, 1], vec![1, 2], vec![0, 2]],
            None,
        );
        let payloads = Normalizer::distribute(&TestSemantics, &definitions, &tree, 100.0);

        for payload in payloads.values() {
            assert_eq!(payload.scaling_factor, 7.5);
            assert_eq!(payload.penalty, 100.0);
        }
    }

    #[test]
    fn hard_only_problems_scale_by_one() {
        let definitions = vec![TestConstraint::NotEqual(0, 1)];
        let tree = PseudoTree::from_scopes(&[0, 1], &[vec![0, 1]], None);
        let payloads = Normalizer::distribute(&TestSemantics, &definitions, &tree, 100.0);

        assert_eq!(payloads[&0].scaling_factor, 1.0);
    }
}
