use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::env::{Action, Environment, Transition};
use crate::node::NodeIndex;
use crate::tree::LookAheadTree;

/// Deterministic bandit: action `a` always pays `rewards[a]`, never terminates.
#[derive(Clone, Debug)]
pub struct ArmsEnv {
    rewards: Vec<f64>,
    steps: usize,
}

impl ArmsEnv {
    pub fn new(rewards: Vec<f64>) -> Self {
        Self { rewards, steps: 0 }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Environment for ArmsEnv {
    type Observation = usize;

    fn step(&mut self, action: Action) -> Transition<usize> {
        self.steps += 1;
        Transition {
            observation: self.steps,
            reward: self.rewards.get(action).copied().unwrap_or(0.0),
            done: false,
        }
    }

    fn action_space_size(&self) -> usize {
        self.rewards.len()
    }
}

/// Reports a fixed subset of a wider action space. Every step pays 0.5.
#[derive(Clone, Debug)]
pub struct NarrowEnv {
    actions: Vec<Action>,
}

impl NarrowEnv {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

impl Environment for NarrowEnv {
    type Observation = ();

    fn step(&mut self, _action: Action) -> Transition<()> {
        Transition {
            observation: (),
            reward: 0.5,
            done: false,
        }
    }

    fn action_space_size(&self) -> usize {
        self.actions.iter().max().map_or(0, |&a| a + 1)
    }

    fn available_actions(&self) -> Option<Vec<Action>> {
        Some(self.actions.clone())
    }
}

/// Two actions paying 0.5; the `done_at`-th step ends the episode.
#[derive(Clone, Debug)]
pub struct TerminalEnv {
    done_at: usize,
    steps: usize,
}

impl TerminalEnv {
    pub fn new(done_at: usize) -> Self {
        Self { done_at, steps: 0 }
    }
}

impl Environment for TerminalEnv {
    type Observation = usize;

    fn step(&mut self, _action: Action) -> Transition<usize> {
        self.steps += 1;
        Transition {
            observation: self.steps,
            reward: 0.5,
            done: self.steps >= self.done_at,
        }
    }

    fn action_space_size(&self) -> usize {
        2
    }
}

/// Bernoulli bandit. The RNG travels with the clone, so a cloned
/// environment replays the same draws.
#[derive(Clone, Debug)]
pub struct BernoulliEnv {
    probs: Vec<f64>,
    rng: SmallRng,
}

impl BernoulliEnv {
    pub fn new(probs: Vec<f64>, seed: u64) -> Self {
        Self {
            probs,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Environment for BernoulliEnv {
    type Observation = ();

    fn step(&mut self, action: Action) -> Transition<()> {
        let hit = self.rng.gen_bool(self.probs[action]);
        Transition {
            observation: (),
            reward: if hit { 1.0 } else { 0.0 },
            done: false,
        }
    }

    fn action_space_size(&self) -> usize {
        self.probs.len()
    }
}

/// Childless nodes found by walking the tree, independent of the frontier list.
pub fn reachable_leaves(tree: &LookAheadTree) -> Vec<NodeIndex> {
    tree.bfs_order()
        .into_iter()
        .filter(|&idx| tree.arena()[idx].is_leaf())
        .collect()
}
