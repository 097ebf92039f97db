use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use crate::bounds::{ConfidenceBound, UpperBound};
use crate::env::Action;
use crate::error::{OlopError, Result};

// ---------------------------------------------------------------------------
// NodeIndex — typed arena index
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Index of the next slot in an arena holding `len` nodes.
    fn next(len: usize) -> Self {
        debug_assert!(len < u32::MAX as usize, "alloc: arena full");
        Self(len as u32)
    }
}

// ---------------------------------------------------------------------------
// UpdateRule — how samples are folded into a node
// ---------------------------------------------------------------------------

/// Everything `Node::update` needs besides the sample itself.
///
/// Owned by the planner, so two planners with different terminal policies
/// never share state through the nodes.
#[derive(Clone, Copy, Debug)]
pub struct UpdateRule {
    pub bound: UpperBound,
    /// Horizon of samples the bound must hold uniformly over.
    pub total_episodes: usize,
    /// Mark a node terminal as soon as a single sampled transition ends the episode.
    pub stop_on_any_terminal: bool,
}

// ---------------------------------------------------------------------------
// Node — one action-sequence prefix
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Node {
    parent: Option<NodeIndex>,
    parent_action: Option<Action>,
    children: BTreeMap<Action, NodeIndex>,
    depth: usize,

    count: u32,
    cumulative_reward: f64,
    mu_ucb: f64,
    done: bool,

    // Scratch, rewritten by every value pass.
    value: f64,
}

impl Node {
    /// Root node: no parent, depth 0.
    pub fn root(initial_bound: f64) -> Self {
        Self {
            parent: None,
            parent_action: None,
            children: BTreeMap::new(),
            depth: 0,
            count: 0,
            cumulative_reward: 0.0,
            mu_ucb: initial_bound,
            done: false,
            value: 0.0,
        }
    }

    fn child_of(parent: NodeIndex, action: Action, depth: usize, initial_bound: f64) -> Self {
        Self {
            parent: Some(parent),
            parent_action: Some(action),
            depth,
            ..Self::root(initial_bound)
        }
    }

    // --- Getters ---

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }
    pub fn parent_action(&self) -> Option<Action> {
        self.parent_action
    }
    pub fn children(&self) -> &BTreeMap<Action, NodeIndex> {
        &self.children
    }
    pub fn child(&self, action: Action) -> Option<NodeIndex> {
        self.children.get(&action).copied()
    }
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
    pub fn depth(&self) -> usize {
        self.depth
    }
    pub fn count(&self) -> u32 {
        self.count
    }
    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }
    pub fn mu_ucb(&self) -> f64 {
        self.mu_ucb
    }
    pub fn is_done(&self) -> bool {
        self.done
    }
    pub fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    // --- Statistic update ---

    /// Fold one observed `(reward, done)` sample into this node.
    ///
    /// Rewards outside `[0, 1]` are rejected before anything is touched:
    /// clamping would silently void the bound guarantees.
    pub fn update(&mut self, reward: f64, done: bool, rule: &UpdateRule) -> Result<()> {
        if !(0.0..=1.0).contains(&reward) {
            return Err(OlopError::RewardOutOfRange { reward });
        }
        self.cumulative_reward += reward;
        self.count += 1;
        self.mu_ucb = rule
            .bound
            .compute_bound(self.cumulative_reward, self.count, rule.total_episodes);
        if done && rule.stop_on_any_terminal {
            self.done = true;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NodeArena — arena allocator
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(cap),
        }
    }

    pub fn alloc(&mut self, node: Node) -> NodeIndex {
        let idx = NodeIndex::next(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// Create a child of `parent` reached by `action` and wire it into the
    /// parent's child map.
    pub fn alloc_child(&mut self, parent: NodeIndex, action: Action, initial_bound: f64) -> NodeIndex {
        debug_assert!(
            self[parent].child(action).is_none(),
            "alloc_child: child already exists for action {action}"
        );
        let depth = self[parent].depth + 1;
        let child = self.alloc(Node::child_of(parent, action, depth, initial_bound));
        self[parent].children.insert(action, child);
        child
    }

    pub fn get(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.as_usize()]
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.nodes[idx.as_usize()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeIndex> for NodeArena {
    type Output = Node;
    fn index(&self, idx: NodeIndex) -> &Self::Output {
        self.get(idx)
    }
}

impl IndexMut<NodeIndex> for NodeArena {
    fn index_mut(&mut self, idx: NodeIndex) -> &mut Self::Output {
        self.get_mut(idx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hoeffding_rule(total_episodes: usize) -> UpdateRule {
        UpdateRule {
            bound: UpperBound::Hoeffding,
            total_episodes,
            stop_on_any_terminal: true,
        }
    }

    // ---- update ----

    #[test]
    fn fresh_node_is_maximally_optimistic() {
        assert_eq!(Node::root(UpperBound::Hoeffding.initial_bound()).mu_ucb(), f64::INFINITY);
        assert_eq!(Node::root(UpperBound::KullbackLeibler.initial_bound()).mu_ucb(), 1.0);
    }

    #[test]
    fn update_accumulates_exact_sum() {
        let mut node = Node::root(f64::INFINITY);
        let rule = hoeffding_rule(10);
        for r in [1.0, 1.0, 0.0] {
            node.update(r, false, &rule).unwrap();
        }

        assert_eq!(node.count(), 3);
        assert_eq!(node.cumulative_reward(), 2.0);
        assert!(node.mu_ucb() > 2.0 / 3.0);
        assert!(node.mu_ucb().is_finite());
        assert!(!node.is_done());
    }

    #[test]
    fn update_rejects_out_of_range_without_mutation() {
        let mut node = Node::root(f64::INFINITY);
        let rule = hoeffding_rule(10);
        node.update(0.5, false, &rule).unwrap();
        let before = (node.count(), node.cumulative_reward(), node.mu_ucb(), node.is_done());

        for bad in [-0.1, 1.0001, f64::NAN, f64::INFINITY] {
            let err = node.update(bad, true, &rule).unwrap_err();
            assert!(matches!(err, OlopError::RewardOutOfRange { .. }));
        }

        let after = (node.count(), node.cumulative_reward(), node.mu_ucb(), node.is_done());
        assert_eq!(before, after);
    }

    #[test]
    fn done_is_sticky() {
        let mut node = Node::root(1.0);
        let rule = UpdateRule {
            bound: UpperBound::KullbackLeibler,
            total_episodes: 10,
            stop_on_any_terminal: true,
        };
        node.update(0.0, true, &rule).unwrap();
        node.update(1.0, false, &rule).unwrap();
        assert!(node.is_done());
    }

    #[test]
    fn done_ignored_when_policy_disabled() {
        let mut node = Node::root(f64::INFINITY);
        let rule = UpdateRule {
            stop_on_any_terminal: false,
            ..hoeffding_rule(10)
        };
        node.update(0.3, true, &rule).unwrap();
        assert!(!node.is_done());
        assert_eq!(node.count(), 1);
    }

    #[test]
    fn mu_ucb_tightens_at_fixed_mean() {
        for bound in [UpperBound::Hoeffding, UpperBound::KullbackLeibler] {
            let rule = UpdateRule {
                bound,
                total_episodes: 100,
                stop_on_any_terminal: true,
            };
            let mut node = Node::root(bound.initial_bound());
            let mut prev = node.mu_ucb();
            for i in 0..40 {
                // Alternating 1, 0 keeps the mean at 0.5 after every even step.
                node.update((i % 2) as f64, false, &rule).unwrap();
                if i % 2 == 1 {
                    assert!(node.mu_ucb() <= prev + 1e-12, "{bound:?} step {i}");
                    prev = node.mu_ucb();
                }
            }
        }
    }

    // ---- NodeArena ----

    #[test]
    fn arena_alloc_child_wires_parent() {
        let mut arena = NodeArena::new();
        assert!(arena.is_empty());

        let root = arena.alloc(Node::root(1.0));
        let c0 = arena.alloc_child(root, 0, 1.0);
        let c3 = arena.alloc_child(root, 3, 1.0);

        assert_eq!(arena.len(), 3);
        assert_eq!(arena[root].child(0), Some(c0));
        assert_eq!(arena[root].child(3), Some(c3));
        assert_eq!(arena[root].child(1), None);
        assert_eq!(arena[c3].parent(), Some(root));
        assert_eq!(arena[c3].parent_action(), Some(3));
        assert_eq!(arena[c3].depth(), 1);
        assert!(!arena[root].is_leaf());
        assert!(arena[c0].is_leaf());
    }

    #[test]
    fn children_iterate_in_action_order() {
        let mut arena = NodeArena::with_capacity(8);
        let root = arena.alloc(Node::root(1.0));
        for a in [4, 1, 3] {
            arena.alloc_child(root, a, 1.0);
        }
        let actions: Vec<Action> = arena[root].children().keys().copied().collect();
        assert_eq!(actions, vec![1, 3, 4]);
    }

    #[test]
    fn index_space_reaches_last_slot() {
        let last = NodeIndex::next(u32::MAX as usize - 1);
        assert_eq!(last.as_usize(), u32::MAX as usize - 1);
    }

    #[test]
    #[should_panic(expected = "alloc: arena full")]
    fn index_space_exhaustion_panics() {
        NodeIndex::next(u32::MAX as usize);
    }

    #[test]
    #[should_panic(expected = "alloc_child: child already exists for action 2")]
    fn alloc_child_twice_panics() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::root(1.0));
        arena.alloc_child(root, 2, 1.0);
        arena.alloc_child(root, 2, 1.0);
    }
}
