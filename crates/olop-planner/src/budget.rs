//! Split a sample budget into `episodes` rollouts of a fixed `horizon`.
//!
//! The horizon grows like `ln(M) / (2 ln(1/gamma))`: just deep enough that
//! the discounted tail past it is of the same order as the estimation error
//! after `M` episodes.

use log::debug;

use crate::error::{OlopError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub episodes: usize,
    pub horizon: usize,
}

/// `ceil(ln(episodes) / (2 ln(1/gamma)))`. One episode needs no look-ahead.
pub fn horizon(episodes: usize, gamma: f64) -> usize {
    debug_assert!(episodes >= 1, "horizon: episodes must be positive");
    debug_assert!(gamma > 0.0 && gamma < 1.0, "horizon: gamma={gamma} outside (0, 1)");
    let raw = (episodes as f64).ln() / (2.0 * (1.0 / gamma).ln());
    raw.ceil().max(0.0) as usize
}

/// Largest `M` in `[1, budget)` with `M * horizon(M, gamma) <= budget`.
///
/// `M * horizon(M)` is non-decreasing, so the scan stops at the first
/// overshoot. `M = 1` needs no look-ahead and always fits; only an empty
/// range fails.
pub fn allocate_budget(budget: usize, gamma: f64) -> Result<Allocation> {
    if !(gamma > 0.0 && gamma < 1.0) {
        return Err(OlopError::InvalidConfig(format!("gamma={gamma} outside (0, 1)")));
    }
    let mut best = None;
    for episodes in 1..budget {
        let length = horizon(episodes, gamma);
        if episodes * length > budget {
            break;
        }
        best = Some(Allocation {
            episodes,
            horizon: length,
        });
    }
    let allocation = best.ok_or(OlopError::BudgetAllocation { budget, gamma })?;
    debug!(
        "budget {budget} with gamma {gamma}: {} episodes of horizon {}",
        allocation.episodes, allocation.horizon
    );
    Ok(allocation)
}
