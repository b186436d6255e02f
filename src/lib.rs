//! Spargo is a sampling-based solver for distributed constraint
//! optimization problems (DCOP).
//!
//! Each variable is owned by an autonomous agent; agents are arranged on a
//! pseudo-tree over the constraint graph and cooperate purely through
//! message exchange — VALUE messages flow down the tree, COST messages flow
//! up — discovering a near-optimal global assignment by Monte-Carlo value
//! sampling with a statistical stopping rule. No agent ever sees the whole
//! problem, and the full search space is never enumerated: the algorithm is
//! anytime and approximate, not exact.
//!
//! # Core Concepts
//!
//! - **[`DomainSemantics`]**: A trait you implement to define the "what" of
//!   your problem: the value type and the cost functions over it.
//! - **[`CostFunction`]**: A cost or utility function over a fixed scope of
//!   variables. The crate provides a standard library of common functions
//!   like [`NotEqualCost`] and [`TableCost`].
//! - **[`SamplingEngine`]**: The run orchestrator that seeds the agents,
//!   pumps the message queue, and returns the committed assignment.
//!
//! # Example: A Simple 2-Variable Problem
//!
//! Here is a simple example solving `?A != ?B` where `?A` can be `1` or
//! `2`, and `?B` can only be `1`. The agents must settle on `?A = 2`.
//!
//! ```
//! use std::sync::Arc;
//! use spargo::solver::constraint::CostFunction;
//! use spargo::solver::constraints::not_equal::NotEqualCost;
//! use spargo::solver::engine::{DcopConfig, Problem, SamplingEngine, VariableId};
//! use spargo::solver::semantics::DomainSemantics;
//! use spargo::solver::value::StandardValue;
//!
//! // 1. Define the problem-specific types
//! #[derive(Debug, Clone)]
//! pub enum MyConstraint {
//!     NotEqual(VariableId, VariableId),
//! }
//!
//! #[derive(Debug, Clone)]
//! pub struct MySemantics;
//!
//! // 2. Implement DomainSemantics to bridge the gap
//! impl DomainSemantics for MySemantics {
//!     type Value = StandardValue;
//!     type ConstraintDefinition = MyConstraint;
//!     fn build_constraint(&self, def: &Self::ConstraintDefinition) -> Box<dyn CostFunction<Self>> {
//!         match def {
//!             MyConstraint::NotEqual(a, b) => Box::new(NotEqualCost::new(*a, *b)),
//!         }
//!     }
//! }
//!
//! // 3. Define the problem instance
//! let a: VariableId = 0;
//! let b: VariableId = 1;
//! let problem = Problem {
//!     domains: [
//!         (a, vec![StandardValue::Int(1), StandardValue::Int(2)]),
//!         (b, vec![StandardValue::Int(1)]),
//!     ]
//!     .into_iter()
//!     .collect(),
//!     constraints: vec![MyConstraint::NotEqual(a, b)],
//!     semantics: Arc::new(MySemantics),
//! };
//!
//! // 4. Solve!
//! let engine = SamplingEngine::default();
//! let report = engine.solve(&problem, &DcopConfig::default()).unwrap();
//!
//! assert_eq!(report.assignments.get(&a), Some(&StandardValue::Int(2)));
//! assert_eq!(report.assignments.get(&b), Some(&StandardValue::Int(1)));
//! ```
//!
//! [`DomainSemantics`]: solver::semantics::DomainSemantics
//! [`CostFunction`]: solver::constraint::CostFunction
//! [`NotEqualCost`]: solver::constraints::not_equal::NotEqualCost
//! [`TableCost`]: solver::constraints::table::TableCost
//! [`SamplingEngine`]: solver::engine::SamplingEngine

pub mod error;
pub mod solver;
