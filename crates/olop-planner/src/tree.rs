use std::collections::VecDeque;

use log::debug;

use crate::env::{action_set, Action, Environment};
use crate::error::{OlopError, Result};
use crate::node::{Node, NodeArena, NodeIndex, UpdateRule};

// ---------------------------------------------------------------------------
// LookAheadTree
// ---------------------------------------------------------------------------

/// Arena of action-sequence prefixes plus the current leaf frontier.
///
/// Nodes are only ever added; the tree lives for one planning call.
/// `leaves` always holds exactly the childless nodes reachable from the root.
#[derive(Clone, Debug)]
pub struct LookAheadTree {
    arena: NodeArena,
    root: NodeIndex,
    leaves: Vec<NodeIndex>,
    initial_bound: f64,
}

impl LookAheadTree {
    /// Single-node tree. Every node created later starts at `initial_bound`.
    pub fn new(initial_bound: f64) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::root(initial_bound));
        Self {
            arena,
            root,
            leaves: vec![root],
            initial_bound,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn leaves(&self) -> &[NodeIndex] {
        &self.leaves
    }

    /// Expand every leaf `horizon` times with children `0..branching_factor`.
    ///
    /// The leaves at depth `horizon` become the arms of the structured bandit.
    pub fn prebuild(&mut self, branching_factor: usize, horizon: usize) {
        for _ in 0..horizon {
            let mut next_leaves = Vec::with_capacity(self.leaves.len() * branching_factor);
            for &leaf in &self.leaves {
                for action in 0..branching_factor {
                    next_leaves.push(self.arena.alloc_child(leaf, action, self.initial_bound));
                }
            }
            self.leaves = next_leaves;
        }
        debug!(
            "prebuilt tree: branching {branching_factor}, depth {horizon}, {} nodes, {} leaves",
            self.arena.len(),
            self.leaves.len()
        );
    }

    /// Give `node` one child per action available in `state`.
    ///
    /// With `update_children`, each child is sampled once on its own clone of
    /// `state`. The frontier swaps `node` for its children in one step.
    pub fn expand<E: Environment>(
        &mut self,
        node: NodeIndex,
        state: Option<&E>,
        update_children: bool,
        rule: &UpdateRule,
    ) -> Result<()> {
        let state = state.ok_or(OlopError::MissingState)?;
        debug_assert!(self.arena[node].is_leaf(), "expand: node already has children");

        let actions = action_set(state);
        let children: Vec<(Action, NodeIndex)> = actions
            .iter()
            .map(|&action| (action, self.arena.alloc_child(node, action, self.initial_bound)))
            .collect();

        self.leaves = self
            .leaves
            .iter()
            .copied()
            .filter(|&leaf| leaf != node)
            .chain(children.iter().map(|&(_, child)| child))
            .collect();

        if update_children {
            for &(action, child) in &children {
                let transition = state.clone().step(action);
                self.arena[child].update(transition.reward, transition.done, rule)?;
            }
        }
        Ok(())
    }

    /// All nodes, breadth-first from the root; children in action order.
    ///
    /// Parents always precede their children.
    pub fn bfs_order(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.arena.len());
        let mut queue = VecDeque::from([self.root]);
        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            queue.extend(self.arena[idx].children().values().copied());
        }
        order
    }

    /// Actions leading from the root to `node`.
    pub fn path(&self, node: NodeIndex) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.arena[node].depth());
        let mut cur = node;
        while let (Some(parent), Some(action)) =
            (self.arena[cur].parent(), self.arena[cur].parent_action())
        {
            actions.push(action);
            cur = parent;
        }
        actions.reverse();
        actions
    }

    /// Most visited child of `node`, ties broken by value, then by lowest action.
    pub fn selection_rule(&self, node: NodeIndex) -> Option<Action> {
        let mut best: Option<(Action, &Node)> = None;
        for (&action, &child_idx) in self.arena[node].children() {
            let child = &self.arena[child_idx];
            let better = match best {
                None => true,
                Some((_, b)) => {
                    child.count() > b.count()
                        || (child.count() == b.count() && child.value() > b.value())
                }
            };
            if better {
                best = Some((action, child));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Recommended sequence: follow the selection rule from the root until
    /// a childless node.
    pub fn get_plan(&self) -> Vec<Action> {
        let mut plan = Vec::new();
        let mut cur = self.root;
        while let Some(action) = self.selection_rule(cur) {
            plan.push(action);
            match self.arena[cur].child(action) {
                Some(child) => cur = child,
                None => break,
            }
        }
        plan
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
