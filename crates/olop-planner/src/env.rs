use std::collections::BTreeSet;

/// Action identifier. Dense action spaces use `0..action_space_size()`.
pub type Action = usize;

/// Outcome of one environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O> {
    pub observation: O,
    pub reward: f64,
    pub done: bool,
}

/// Simulated environment the planner rolls out against.
///
/// `Clone` must produce an independent copy that replays deterministically:
/// every rollout and every child sample runs on its own clone, so the
/// caller's state is never stepped.
pub trait Environment: Clone {
    type Observation;

    fn step(&mut self, action: Action) -> Transition<Self::Observation>;

    fn action_space_size(&self) -> usize;

    /// Actions legal in the current state. `None` means the whole dense
    /// action space is available.
    fn available_actions(&self) -> Option<Vec<Action>> {
        None
    }
}

/// Actions to expand a node with: the reported set, else the dense range.
///
/// Duplicates in the reported set are dropped, first occurrence kept.
pub fn action_set<E: Environment>(env: &E) -> Vec<Action> {
    match env.available_actions() {
        Some(mut actions) => {
            let mut seen = BTreeSet::new();
            actions.retain(|&a| seen.insert(a));
            actions
        }
        None => (0..env.action_space_size()).collect(),
    }
}
