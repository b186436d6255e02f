use crate::solver::{cost::Cost, engine::VariableId, semantics::DomainSemantics};

/// A full or partial assignment of values to variables.
///
/// Backed by a persistent map so that contexts can be cheaply extended with
/// a candidate value without mutating the original.
pub type Assignment<V> = im::HashMap<VariableId, V>;

#[derive(Debug, Clone)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub description: String,
}

/// A cost (or utility) function over a fixed set of variables.
///
/// This is the unit the normalizer distributes: each cost function ends up
/// owned by exactly one variable agent, which evaluates it against its
/// context plus its own candidate value. Evaluation must be total — a hard
/// constraint violation is reported as [`Cost::Infeasible`], never as an
/// error. Callers guarantee that the assignment covers the function's scope;
/// an uncovered scope variable evaluates to `Infeasible`.
pub trait CostFunction<S: DomainSemantics>: std::fmt::Debug {
    fn variables(&self) -> &[VariableId];

    fn descriptor(&self) -> ConstraintDescriptor;

    fn cost(&self, assignment: &Assignment<S::Value>) -> Cost;

    /// An upper bound on the finite costs this function can produce, if one
    /// is cheaply known. The normalizer folds these into the global scaling
    /// factor; `None` means the function contributes no bound.
    fn cost_bound(&self) -> Option<f64> {
        None
    }
}
