use thiserror::Error;

/// Failures that abort a planning call. Nothing here is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OlopError {
    /// No `(episodes, horizon)` split fits inside the budget.
    #[error("could not split budget {budget} with gamma {gamma}")]
    BudgetAllocation { budget: usize, gamma: f64 },

    /// The environment produced a reward the bounds are not valid for.
    #[error("reward {reward} is outside [0, 1]; this planner assumes normalized rewards")]
    RewardOutOfRange { reward: f64 },

    /// A node was expanded without a live environment state.
    #[error("the state should be set before expanding a node")]
    MissingState,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, OlopError>;
