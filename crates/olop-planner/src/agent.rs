use crate::env::{Action, Environment};
use crate::error::Result;
use crate::planner::{Olop, OlopConfig};

/// Owner of a planner, acting in a receding-horizon loop.
///
/// Every call plans from scratch on a new tree.
#[derive(Clone, Debug)]
pub struct OlopAgent {
    planner: Olop,
}

impl OlopAgent {
    pub fn new(config: OlopConfig) -> Result<Self> {
        Ok(Self {
            planner: Olop::new(config)?,
        })
    }

    pub fn planner(&self) -> &Olop {
        &self.planner
    }

    /// Full recommended action sequence from `state`.
    pub fn plan<E: Environment>(&mut self, state: &E, observation: &E::Observation) -> Result<Vec<Action>> {
        self.planner.plan(state, observation)
    }

    /// First action of the plan, for single-step execution.
    pub fn act<E: Environment>(&mut self, state: &E, observation: &E::Observation) -> Result<Option<Action>> {
        Ok(self.plan(state, observation)?.first().copied())
    }

    pub fn reset(&mut self) {
        self.planner.reset();
    }
}
