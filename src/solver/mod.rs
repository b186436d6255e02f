//! The sampling-based distributed search engine: per-variable agents on a
//! pseudo-tree, typed messages between them, and the statistics that drive
//! convergence.

pub mod agent;
pub mod constraint;
pub mod constraints;
pub mod context;
pub mod cost;
pub mod engine;
pub mod heuristics;
pub mod message;
pub mod node;
pub mod normalize;
pub mod router;
pub mod semantics;
pub mod stats;
pub mod tree;
pub mod value;
