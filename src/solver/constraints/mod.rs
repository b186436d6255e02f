//! A standard library of reusable cost functions.
//!
//! Hard constraints evaluate to zero cost when satisfied and
//! [`Cost::Infeasible`](crate::solver::cost::Cost) when violated; soft
//! constraints report a finite cost per assignment. All of them are built
//! through [`DomainSemantics::build_constraint`](crate::solver::semantics::DomainSemantics::build_constraint).

pub mod all_different;
pub mod not_equal;
pub mod table;
