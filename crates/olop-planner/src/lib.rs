//! Open-Loop Optimistic Planning.
//!
//! Candidate action sequences are arms of a structured bandit: the planner
//! spends a fixed sample budget rolling out the sequence with the highest
//! optimistic bound on its discounted return, then recommends the most
//! sampled sequence.

pub mod agent;
pub mod bounds;
pub mod budget;
pub mod env;
pub mod error;
pub mod node;
pub mod planner;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_util;

pub use agent::OlopAgent;
pub use bounds::{bernoulli_kl, hoeffding_upper_bound, kl_upper_bound, ConfidenceBound, UpperBound};
pub use budget::{allocate_budget, horizon, Allocation};
pub use env::{action_set, Action, Environment, Transition};
pub use error::{OlopError, Result};
pub use node::{Node, NodeArena, NodeIndex, UpdateRule};
pub use planner::{Olop, OlopConfig};
pub use tree::LookAheadTree;
