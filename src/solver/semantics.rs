use crate::solver::{constraint::CostFunction, value::ValueEquality};

/// A trait that defines the "frontend" for a specific problem domain.
///
/// This is the primary interface for connecting a concrete problem (like
/// distributed graph colouring or meeting scheduling) to the generic
/// sampling engine. By implementing this trait, you provide the solver with
/// all the necessary information about your problem's specific types and
/// cost structure.
pub trait DomainSemantics: 'static + Clone + std::fmt::Debug {
    /// The concrete type for a value in a variable's domain.
    ///
    /// For graph colouring this could be an enum of colours; for scheduling,
    /// a time slot.
    type Value: ValueEquality;

    /// A structure that defines a single cost function in the problem domain.
    ///
    /// This is typically an enum where each variant represents a different
    /// kind of constraint (e.g., `AllDifferent`, `Table`).
    type ConstraintDefinition: std::fmt::Debug;

    /// A factory method that constructs an evaluable [`CostFunction`] from
    /// its definition.
    ///
    /// The normalizer calls this to turn declarative constraint definitions
    /// into the executable cost functions it distributes across the
    /// pseudo-tree.
    fn build_constraint(
        &self,
        definition: &Self::ConstraintDefinition,
    ) -> Box<dyn CostFunction<Self>>;
}
