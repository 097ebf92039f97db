use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::bounds::{ConfidenceBound, UpperBound};
use crate::budget::{allocate_budget, Allocation};
use crate::env::{Action, Environment};
use crate::error::{OlopError, Result};
use crate::node::{NodeIndex, UpdateRule};
use crate::tree::LookAheadTree;

/// Continuation used to pad sequences shorter than the horizon.
const DEFAULT_ACTION: Action = 0;

// ---------------------------------------------------------------------------
// OlopConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OlopConfig {
    /// Total number of environment steps available across all episodes.
    pub budget: usize,
    /// Discount factor, in (0, 1).
    pub gamma: f64,
    /// Explicit horizon. Skips budget allocation.
    pub horizon: Option<usize>,
    /// Episode count, only read alongside an explicit `horizon`.
    /// Defaults to `budget / horizon`.
    pub episodes: Option<usize>,
    pub upper_bound: UpperBound,
    /// Expand nodes along sampled paths instead of prebuilding the full tree.
    pub lazy_tree_construction: bool,
    /// A single terminal sample marks the node terminal for good.
    pub stop_on_any_terminal: bool,
}

impl Default for OlopConfig {
    fn default() -> Self {
        Self {
            budget: 500,
            gamma: 0.8,
            horizon: None,
            episodes: None,
            upper_bound: UpperBound::Hoeffding,
            lazy_tree_construction: false,
            stop_on_any_terminal: true,
        }
    }
}

impl OlopConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OlopError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.budget == 0 {
            return Err(OlopError::InvalidConfig("budget must be positive".into()));
        }
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(OlopError::InvalidConfig(format!(
                "gamma={} outside (0, 1)",
                self.gamma
            )));
        }
        if self.episodes == Some(0) {
            return Err(OlopError::InvalidConfig("episodes must be positive".into()));
        }
        Ok(())
    }

    /// `(episodes, horizon)` to plan with: explicit or allocated from the budget.
    pub fn allocation(&self) -> Result<Allocation> {
        self.validate()?;
        match self.horizon {
            Some(horizon) => Ok(Allocation {
                episodes: self
                    .episodes
                    .unwrap_or_else(|| (self.budget / horizon.max(1)).max(1)),
                horizon,
            }),
            None => allocate_budget(self.budget, self.gamma),
        }
    }
}

// ---------------------------------------------------------------------------
// Olop — episode runner and planning loop
// ---------------------------------------------------------------------------

/// Open-Loop Optimistic Planning.
///
/// Each `plan` call grows a fresh look-ahead tree. Every episode scores all
/// leaves by an optimistic bound on their discounted return, rolls out the
/// best sequence on a clone of the environment, and folds the rewards back
/// into the nodes along it.
#[derive(Clone, Debug)]
pub struct Olop {
    config: OlopConfig,
    allocation: Allocation,
    rule: UpdateRule,
    tree: LookAheadTree,
}

impl Olop {
    pub fn new(config: OlopConfig) -> Result<Self> {
        let allocation = config.allocation()?;
        let rule = UpdateRule {
            bound: config.upper_bound,
            total_episodes: allocation.episodes,
            stop_on_any_terminal: config.stop_on_any_terminal,
        };
        let tree = LookAheadTree::new(config.upper_bound.initial_bound());
        Ok(Self {
            config,
            allocation,
            rule,
            tree,
        })
    }

    pub fn config(&self) -> &OlopConfig {
        &self.config
    }

    pub fn episodes(&self) -> usize {
        self.allocation.episodes
    }

    pub fn horizon(&self) -> usize {
        self.allocation.horizon
    }

    pub fn tree(&self) -> &LookAheadTree {
        &self.tree
    }

    /// Drop the current tree.
    pub fn reset(&mut self) {
        self.tree = LookAheadTree::new(self.config.upper_bound.initial_bound());
    }

    /// Fresh root; the whole tree up front unless construction is lazy.
    pub fn make_root<E: Environment>(&mut self, state: &E) {
        self.reset();
        if !self.config.lazy_tree_construction {
            self.tree.prebuild(state.action_space_size(), self.allocation.horizon);
        }
    }

    /// Run all episodes from `state` and return the recommended sequence.
    ///
    /// `state` itself is never stepped; each episode works on a clone.
    pub fn plan<E: Environment>(&mut self, state: &E, _observation: &E::Observation) -> Result<Vec<Action>> {
        self.make_root(state);
        let episodes = self.allocation.episodes;
        for i in 0..episodes {
            if (i + 1) % 10 == 0 {
                debug!("{} / {}", i + 1, episodes);
            }
            self.run(state.clone())?;
        }
        Ok(self.tree.get_plan())
    }

    /// One episode: pick the leaf with the highest sharpened bound, play its
    /// sequence on `state` and update the visited nodes.
    pub fn run<E: Environment>(&mut self, mut state: E) -> Result<()> {
        let sequence = self.best_sequence();
        trace!("episode sequence {sequence:?}");

        let mut node = self.tree.root();
        for action in sequence {
            if self.tree.arena()[node].is_leaf() {
                self.tree.expand(node, Some(&state), false, &self.rule)?;
            }
            let Some((action, child)) = self.resolve_child(node, action) else {
                break;
            };
            let transition = state.step(action);
            self.tree.arena_mut()[child].update(transition.reward, transition.done, &self.rule)?;
            if transition.done {
                break;
            }
            node = child;
        }
        Ok(())
    }

    /// Recompute `value` on every node: the upper bound on the return of any
    /// trajectory starting with that node's sequence.
    ///
    /// `U = sum_t gamma^t mu_ucb(ancestor at depth t) + gamma^(d+1) / (1 - gamma)`,
    /// the tail dropped for terminal nodes. Breadth-first order lets each
    /// node extend its parent's discounted prefix sum.
    pub fn compute_u_values(&mut self) {
        let gamma = self.config.gamma;
        let order = self.tree.bfs_order();
        let arena = self.tree.arena_mut();
        let mut prefix = vec![0.0f64; arena.len()];

        for idx in order {
            let node = &arena[idx];
            let discount = gamma.powi(node.depth() as i32);
            // An unsampled Hoeffding node stays infinite even once the
            // discount underflows to zero.
            let term = if node.mu_ucb().is_infinite() {
                f64::INFINITY
            } else {
                discount * node.mu_ucb()
            };
            let sum = match node.parent() {
                Some(parent) => prefix[parent.as_usize()] + term,
                None => 0.0,
            };
            let tail = if node.is_done() {
                0.0
            } else {
                discount * gamma / (1.0 - gamma)
            };
            prefix[idx.as_usize()] = sum;
            arena[idx].set_value(sum + tail);
        }
    }

    /// Tightest bound over the prefixes of the leaf's sequence.
    ///
    /// The root's trivial bound is left out. Sharp bounds pass through.
    pub fn sharpen_b_value(&self, leaf: NodeIndex) -> f64 {
        let arena = self.tree.arena();
        if self.config.upper_bound.is_sharp() {
            return arena[leaf].value();
        }
        let mut min_value = arena[leaf].value();
        let mut cur = leaf;
        while let Some(parent) = arena[cur].parent() {
            min_value = min_value.min(arena[cur].value());
            cur = parent;
        }
        min_value
    }

    /// Sharpened score of every current leaf, in frontier order.
    pub fn leaf_scores(&self) -> Vec<(NodeIndex, f64)> {
        self.tree
            .leaves()
            .iter()
            .map(|&leaf| (leaf, self.sharpen_b_value(leaf)))
            .collect()
    }

    fn best_sequence(&mut self) -> Vec<Action> {
        self.compute_u_values();

        // First maximum wins.
        let mut best: Option<(NodeIndex, f64)> = None;
        for (leaf, score) in self.leaf_scores() {
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((leaf, score));
            }
        }
        let leaf = best.map_or(self.tree.root(), |(leaf, _)| leaf);
        let mut sequence = self.tree.path(leaf);

        if self.config.lazy_tree_construction {
            // Below a shallow leaf every continuation has the same bound.
            let horizon = self.allocation.horizon;
            sequence.truncate(horizon);
            sequence.resize(horizon, DEFAULT_ACTION);
        }
        sequence
    }

    /// Child reached by `action`, or the lowest available action when the
    /// node was expanded from a narrower action set.
    fn resolve_child(&self, node: NodeIndex, action: Action) -> Option<(Action, NodeIndex)> {
        let n = &self.tree.arena()[node];
        if let Some(child) = n.child(action) {
            return Some((action, child));
        }
        let (&fallback, &child) = n.children().iter().next()?;
        trace!("action {action} unavailable, falling back to {fallback}");
        Some((fallback, child))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
