/// The base trait for any value that can appear in a variable's domain.
///
/// This trait establishes the minimum requirements for a value: it must be
/// cloneable, debuggable, equatable, and hashable. This is a marker trait,
/// so any type that satisfies these bounds implements `ValueEquality`.
pub trait ValueEquality: Clone + std::fmt::Debug + Eq + std::hash::Hash + 'static {}
impl<T> ValueEquality for T where T: Clone + std::fmt::Debug + Eq + std::hash::Hash + 'static {}

/// A concrete enum providing standard, reusable value types.
///
/// Problem-specific value types can wrap or compose `StandardValue` so that
/// the stock cost functions (like [`NotEqualCost`](crate::solver::constraints::not_equal::NotEqualCost))
/// can be used without reimplementing comparison logic.
///
/// # Example
///
/// ```no_run
/// use spargo::solver::value::StandardValue;
///
/// // A custom value type for a hypothetical problem.
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// pub enum MyProblemValue {
///     DomainSpecificValue(String),
///     Standard(StandardValue),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum StandardValue {
    /// A 64-bit integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
}
