// Persistent search tree with re-rooting between decisions
//
// Nodes live in a flat arena and refer to each other by `NodeId`. Children
// lists own their handles; the parent link is a plain back-reference. Pruned
// subtrees return their slots to a free list.

use log::debug;
use serde::Serialize;

use crate::game::GameState;
use crate::layout::Walls;
use crate::node::{Node, NodeId, Rewards};
use crate::topology::{MacroEdge, MazeTopology};
use crate::types::{Direction, Position, Tactic};

/// What `update` managed to keep from the previous decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reuse {
    /// Agent did not move; the tree is kept as is
    Kept,
    /// Agent reached a junction that was a child of the root
    Promoted,
    /// Agent left a junction into a corridor; the tree was rebuilt around it
    Spliced,
    /// Agent moved along the corridor it was already in
    Slid,
    /// Nothing could be reused
    Reset,
}

/// Compact view of a root child, used in logs
#[derive(Debug, Clone, Serialize)]
pub struct ChildSummary {
    pub action: Option<Direction>,
    pub destination: Position,
    pub visits: f64,
    pub survival: f64,
    pub pill: f64,
    pub ghost: f64,
}

#[derive(Debug)]
pub struct SearchTree {
    topology: MazeTopology,
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: NodeId,
}

impl SearchTree {
    /// Creates a tree over a maze, rooted at `position`
    pub fn new(walls: Walls, position: Position) -> Self {
        let mut tree = SearchTree {
            topology: MazeTopology::new(walls),
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        tree.reset(position);
        tree
    }

    pub fn topology(&self) -> &MazeTopology {
        &self.topology
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards everything and starts over with an unexplored root
    pub fn reset(&mut self, position: Position) {
        self.nodes.clear();
        self.free.clear();
        self.root = self.allocate(Node::new(position, Vec::new()));
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                NodeId(slot)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Attaches a new node under `parent`
    pub fn add_child(&mut self, parent: NodeId, position: Position, actions: Vec<Direction>) -> NodeId {
        let mut node = Node::new(position, actions);
        node.parent = Some(parent);
        let id = self.allocate(node);
        self.node_mut(parent).children.push(id);
        id
    }

    /// Child of `id` whose macro-edge starts with `action`
    pub fn child_by_action(&self, id: NodeId, action: Direction) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.node(child).first_action() == Some(action))
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, actions: Vec<Direction>) {
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.actions = actions;
        }
        self.node_mut(parent).children.push(child);
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node(child).parent {
            self.node_mut(parent).children.retain(|&c| c != child);
        }
        self.node_mut(child).parent = None;
    }

    /// Releases a node and everything below it
    fn remove_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let children = std::mem::take(&mut self.node_mut(current).children);
            stack.extend(children);
            self.free.push(current.0);
        }
    }

    /// Adds one visit and the evaluated rewards to every node from `from` up to the root
    pub fn backpropagate(&mut self, from: NodeId, rewards: Rewards) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.node_mut(id);
            node.record(rewards);
            current = node.parent;
        }
    }

    /// Adds a terminal bonus or penalty straight onto one node's accumulator
    pub fn perturb(&mut self, id: NodeId, delta: Rewards) {
        self.node_mut(id).rewards += delta;
    }

    /// Scales visits, survival and pill by `factor` and clears ghost rewards on
    /// every node still in the tree
    pub fn apply_discount(&mut self, factor: f64) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node_mut(id);
            node.discount(factor);
            stack.extend(node.children.iter().copied());
        }
    }

    /// Re-roots the tree on the agent's current position, reusing statistics
    /// where the topology allows it
    pub fn update<S: GameState>(&mut self, state: &S, discount: f64) -> Reuse {
        self.reroot(state.pacman_position(), discount)
    }

    /// Position-only form of `update`
    pub fn reroot(&mut self, position: Position, discount: f64) -> Reuse {
        let old_position = self.root_node().position;

        let outcome = if position == old_position {
            Reuse::Kept
        } else if old_position.manhattan(position) != 1 {
            debug!("Agent jumped from {} to {}, resetting tree", old_position, position);
            Reuse::Reset
        } else if self.topology.is_junction(position) {
            self.promote(old_position, position)
        } else if self.topology.is_junction(old_position) {
            self.splice(old_position, position)
        } else {
            self.slide(position)
        };

        if outcome == Reuse::Reset {
            self.reset(position);
        } else {
            self.apply_discount(discount);
        }
        debug!("Tree reuse at {}: {:?} ({} nodes)", position, outcome, self.len());
        outcome
    }

    fn step_between(from: Position, to: Position) -> Option<Direction> {
        Direction::all().iter().copied().find(|d| d.apply(&from) == to)
    }

    /// New position is a junction: the matching root child becomes the root
    fn promote(&mut self, old_position: Position, position: Position) -> Reuse {
        let step = Self::step_between(old_position, position);
        let candidates: Vec<NodeId> = self
            .children(self.root)
            .iter()
            .copied()
            .filter(|&c| self.node(c).position == position)
            .collect();
        let chosen = candidates
            .iter()
            .copied()
            .find(|&c| self.node(c).first_action() == step)
            .or_else(|| candidates.first().copied());

        let child = match chosen {
            Some(child) => child,
            None => return Reuse::Reset,
        };

        let old_root = self.root;
        self.detach(child);
        self.remove_subtree(old_root);
        self.node_mut(child).actions.clear();
        self.root = child;
        Reuse::Promoted
    }

    /// Agent stepped off a junction into a corridor. The child it is heading
    /// towards and the old root both become children of a root at the new
    /// position, the old root reached through the path back.
    fn splice(&mut self, old_position: Position, position: Position) -> Reuse {
        let step = match Self::step_between(old_position, position) {
            Some(step) => step,
            None => return Reuse::Reset,
        };
        let promoted = match self.child_by_action(self.root, step) {
            Some(child) => child,
            None => return Reuse::Reset,
        };

        let old_root = self.root;
        self.detach(promoted);

        let new_root = if self.node(promoted).position == position {
            // The corridor dead-ends right here
            self.node_mut(promoted).actions.clear();
            promoted
        } else {
            self.allocate(Node::new(position, Vec::new()))
        };

        let successors = self.topology.macro_successors(position);
        let mut promoted_attached = new_root == promoted;
        let mut old_root_attached = false;

        for edge in successors.iter() {
            if !promoted_attached
                && edge.first_action() == step
                && edge.destination == self.node(promoted).position
            {
                self.attach(new_root, promoted, edge.actions.clone());
                promoted_attached = true;
            } else if !old_root_attached && edge.destination == old_position {
                self.attach(new_root, old_root, edge.actions.clone());
                old_root_attached = true;
            } else if let Some(sibling) = self.sibling_at(old_root, edge) {
                self.detach(sibling);
                self.attach(new_root, sibling, edge.actions.clone());
            }
        }

        if !promoted_attached {
            self.remove_subtree(promoted);
        }
        if !old_root_attached {
            self.remove_subtree(old_root);
        }
        self.root = new_root;
        self.absorb_children(new_root);
        Reuse::Spliced
    }

    /// Sets a node's totals to the sum over its children, so the root of a
    /// spliced tree counts every simulation below it
    fn absorb_children(&mut self, id: NodeId) {
        let mut visits = 0.0;
        let mut rewards = Rewards::default();
        for &child in self.children(id) {
            let child = self.node(child);
            visits += child.visits;
            rewards += child.rewards;
        }
        if visits > 0.0 {
            let node = self.node_mut(id);
            node.visits = visits;
            node.rewards = rewards;
        }
    }

    fn sibling_at(&self, old_root: NodeId, edge: &MacroEdge) -> Option<NodeId> {
        self.children(old_root)
            .iter()
            .copied()
            .find(|&c| self.node(c).position == edge.destination)
    }

    /// Agent moved within the corridor it was already in: keep the children if
    /// they are still exactly the reachable junctions
    fn slide(&mut self, position: Position) -> Reuse {
        let successors = self.topology.macro_successors(position);
        let children: Vec<NodeId> = self.children(self.root).to_vec();

        let mut wanted: Vec<Position> = successors.iter().map(|e| e.destination).collect();
        let mut have: Vec<Position> = children.iter().map(|&c| self.node(c).position).collect();
        wanted.sort();
        have.sort();
        if wanted != have {
            return Reuse::Reset;
        }

        let mut used = vec![false; successors.len()];
        for child in children {
            let destination = self.node(child).position;
            let slot = (0..successors.len())
                .find(|&i| !used[i] && successors[i].destination == destination);
            if let Some(i) = slot {
                used[i] = true;
                self.node_mut(child).actions = successors[i].actions.clone();
            }
        }

        let root = self.root;
        self.node_mut(root).position = position;
        Reuse::Slid
    }

    /// Value of a node under a tactic. Reads the best child means (or the node's
    /// own means when it has no children) and couples pill and ghost rewards
    /// multiplicatively with survival.
    pub fn tactic_value(&self, id: NodeId, tactic: Tactic) -> f64 {
        let node = self.node(id);
        let (best_survival, best_channel) = if node.children.is_empty() || node.visits <= 0.0 {
            (node.mean(Tactic::Survival), node.mean(tactic))
        } else {
            node.children.iter().fold((0.0f64, 0.0f64), |(s, c), &child| {
                let child = self.node(child);
                (
                    s.max(child.mean(Tactic::Survival)),
                    c.max(child.mean(tactic)),
                )
            })
        };

        match tactic {
            Tactic::Survival => best_survival,
            Tactic::Pill | Tactic::Ghost => best_survival * best_channel,
        }
    }

    /// Upper confidence score used while descending the tree
    pub fn uct_score(&self, id: NodeId, tactic: Tactic, exploration: f64) -> f64 {
        let node = self.node(id);
        let value = self.tactic_value(id, tactic);
        let parent_visits = match node.parent {
            Some(parent) => self.node(parent).visits,
            None => return value,
        };
        if node.visits <= 0.0 || parent_visits <= 0.0 {
            return value;
        }
        value + exploration * (parent_visits.ln().max(0.0) / node.visits).sqrt()
    }

    /// Longest root-to-leaf path, in nodes below the root
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for &child in self.children(id) {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Statistics of each root child
    pub fn summary(&self) -> Vec<ChildSummary> {
        self.children(self.root)
            .iter()
            .map(|&id| {
                let node = self.node(id);
                ChildSummary {
                    action: node.first_action(),
                    destination: node.position,
                    visits: node.visits,
                    survival: node.mean(Tactic::Survival),
                    pill: node.mean(Tactic::Pill),
                    ghost: node.mean(Tactic::Ghost),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    // Junctions at (2, 2) and (4, 2) joined by the one-cell corridor (3, 2).
    // Every other open cell is a dead end.
    const CROSS: &str = "\
%%%%%%%
%% % %%
%P    %
%% % %%
%%%%%%%
";

    // Long bent corridor from (3, 4) round to the junction at (6, 2)
    const BEND: &str = "\
%%%%%%%%%
%P  %   %
% %%%% %%
%       %
%%%%%%% %
%%%%%%%%%
";

    fn tree_in(maze: &str, position: Position) -> SearchTree {
        SearchTree::new(Layout::parse(maze).unwrap().walls, position)
    }

    fn expand_all(tree: &mut SearchTree, id: NodeId) -> Vec<NodeId> {
        let position = tree.node(id).position();
        let edges = tree.topology().macro_successors(position);
        edges
            .iter()
            .map(|e| tree.add_child(id, e.destination, e.actions.clone()))
            .collect()
    }

    fn expand_root(tree: &mut SearchTree) -> Vec<NodeId> {
        let root = tree.root();
        expand_all(tree, root)
    }

    fn assert_edges_valid(tree: &SearchTree) {
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            for &child in tree.children(id) {
                let node = tree.node(child);
                assert_eq!(node.parent(), Some(id));
                let mut pos = tree.node(id).position();
                for action in node.actions() {
                    pos = action.apply(&pos);
                    assert!(!tree.topology().is_wall(pos));
                }
                assert_eq!(pos, node.position(), "edge into {} is stale", node.position());
                stack.push(child);
            }
        }
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        expand_root(&mut tree);
        tree.reset(Position::new(2, 2));
        assert_eq!(tree.len(), 1);
        assert!(tree.root_node().children().is_empty());
        assert_eq!(tree.root_node().visits(), 0.0);

        tree.reset(Position::new(2, 2));
        assert_eq!(tree.len(), 1);
        assert!(tree.root_node().children().is_empty());
        assert!(tree.root_node().parent().is_none());
        assert!(tree.root_node().actions().is_empty());
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_backpropagate_updates_whole_path() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        expand_root(&mut tree);
        let east = tree.child_by_action(tree.root(), Direction::East).unwrap();
        let west = tree.child_by_action(tree.root(), Direction::West).unwrap();
        let below = expand_all(&mut tree, east);

        tree.backpropagate(below[0], Rewards::new(1.0, 0.5, 0.0));
        tree.backpropagate(below[0], Rewards::new(0.0, 0.0, 0.25));

        for id in [below[0], east, tree.root()] {
            assert_eq!(tree.node(id).visits(), 2.0);
            assert_eq!(tree.node(id).rewards(), Rewards::new(1.0, 0.5, 0.25));
        }
        assert_eq!(tree.node(west).visits(), 0.0);
        assert_eq!(tree.node(below[1]).visits(), 0.0);
    }

    #[test]
    fn test_promote_keeps_child_subtree() {
        let mut tree = tree_in(CROSS, Position::new(3, 2));
        expand_root(&mut tree);
        let east = tree.child_by_action(tree.root(), Direction::East).unwrap();
        assert_eq!(tree.node(east).position(), Position::new(4, 2));
        let below = expand_all(&mut tree, east);
        assert_eq!(below.len(), 4);
        tree.backpropagate(below[0], Rewards::new(1.0, 1.0, 1.0));

        let outcome = tree.reroot(Position::new(4, 2), 1.0);
        assert_eq!(outcome, Reuse::Promoted);
        assert_eq!(tree.root(), east);
        assert!(tree.root_node().parent().is_none());
        assert!(tree.root_node().actions().is_empty());
        assert_eq!(tree.root_node().children(), &below[..]);
        assert_eq!(tree.len(), 1 + below.len());
        assert_edges_valid(&tree);
    }

    #[test]
    fn test_junction_without_matching_child_resets() {
        let mut tree = tree_in(CROSS, Position::new(3, 2));
        tree.backpropagate(tree.root(), Rewards::new(1.0, 0.0, 0.0));

        let outcome = tree.reroot(Position::new(2, 2), 0.5);
        assert_eq!(outcome, Reuse::Reset);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_node().position(), Position::new(2, 2));
        assert_eq!(tree.root_node().visits(), 0.0);
    }

    #[test]
    fn test_jump_resets() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        expand_root(&mut tree);
        assert_eq!(tree.reroot(Position::new(4, 2), 0.5), Reuse::Reset);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_same_position_is_kept() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        let children = expand_root(&mut tree);
        tree.backpropagate(children[0], Rewards::new(1.0, 0.0, 1.0));
        assert_eq!(tree.reroot(Position::new(2, 2), 0.5), Reuse::Kept);
        assert_eq!(tree.len(), 1 + children.len());
        assert!((tree.root_node().visits() - 0.5).abs() < 1e-12);
        assert_eq!(tree.root_node().rewards().ghost, 0.0);
    }

    #[test]
    fn test_splice_into_corridor_keeps_both_ends() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        let children = expand_root(&mut tree);
        let old_root = tree.root();
        let east = tree.child_by_action(old_root, Direction::East).unwrap();
        let below = expand_all(&mut tree, east);
        for _ in 0..3 {
            tree.backpropagate(below[0], Rewards::new(1.0, 0.5, 0.0));
        }

        let outcome = tree.reroot(Position::new(3, 2), 1.0);
        assert_eq!(outcome, Reuse::Spliced);

        let root = tree.root();
        assert_eq!(tree.root_node().position(), Position::new(3, 2));
        assert!(tree.root_node().parent().is_none());
        // Both the heading child and the old root hang below the new root
        assert!((tree.root_node().visits() - 6.0).abs() < 1e-12);
        assert!((tree.root_node().rewards().pill - 3.0).abs() < 1e-12);

        // Forward: the junction the agent is heading to, one move away now
        let ahead = tree.child_by_action(root, Direction::East).unwrap();
        assert_eq!(ahead, east);
        assert_eq!(tree.node(ahead).actions(), &[Direction::East]);
        assert_eq!(tree.node(ahead).children(), &below[..]);

        // Back: the old root, reached through the cell just left
        let behind = tree.child_by_action(root, Direction::West).unwrap();
        assert_eq!(behind, old_root);
        assert_eq!(tree.node(behind).actions(), &[Direction::West]);
        assert_eq!(tree.node(behind).children().len(), children.len() - 1);

        assert_eq!(tree.len(), 2 + children.len() + below.len());
        assert_edges_valid(&tree);
    }

    #[test]
    fn test_spliced_root_counts_all_child_visits() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        let children = expand_root(&mut tree);
        assert_eq!(children.len(), 4);
        for &child in &children {
            for _ in 0..5 {
                tree.backpropagate(child, Rewards::new(1.0, 0.0, 0.0));
            }
        }
        assert_eq!(tree.root_node().visits(), 20.0);

        assert_eq!(tree.reroot(Position::new(3, 2), 1.0), Reuse::Spliced);
        let below: f64 = tree.root_node().children().iter().map(|&c| tree.node(c).visits()).sum();
        assert_eq!(below, 25.0);
        assert!(tree.root_node().visits() >= below);
        assert!((tree.root_node().mean(Tactic::Survival) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_splice_into_dead_end_roots_at_child() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        expand_root(&mut tree);
        let north = tree.child_by_action(tree.root(), Direction::North).unwrap();

        assert_eq!(tree.reroot(Position::new(2, 3), 1.0), Reuse::Spliced);
        assert_eq!(tree.root(), north);
        assert!(tree.root_node().actions().is_empty());
        assert_eq!(tree.root_node().children().len(), 1);
        assert_edges_valid(&tree);
    }

    #[test]
    fn test_splice_without_heading_child_resets() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        let west_edge = tree.topology().edge_towards(Position::new(2, 2), Direction::West).unwrap();
        tree.add_child(tree.root(), west_edge.destination, west_edge.actions);
        assert_eq!(tree.reroot(Position::new(3, 2), 0.5), Reuse::Reset);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_slide_along_corridor_rewrites_edges() {
        let mut tree = tree_in(BEND, Position::new(1, 2));
        let children = expand_root(&mut tree);
        assert_eq!(children.len(), 2);

        assert_eq!(tree.reroot(Position::new(2, 2), 1.0), Reuse::Slid);
        assert_eq!(tree.root_node().position(), Position::new(2, 2));
        assert_eq!(tree.root_node().children(), &children[..]);
        assert_edges_valid(&tree);

        let east = tree.child_by_action(tree.root(), Direction::East).unwrap();
        assert_eq!(tree.node(east).actions().len(), 4);
    }

    #[test]
    fn test_slide_with_partial_children_resets() {
        let mut tree = tree_in(BEND, Position::new(1, 2));
        let edge = tree.topology().edge_towards(Position::new(1, 2), Direction::East).unwrap();
        tree.add_child(tree.root(), edge.destination, edge.actions);
        assert_eq!(tree.reroot(Position::new(2, 2), 1.0), Reuse::Reset);
    }

    #[test]
    fn test_discount_applies_to_every_retained_node() {
        let mut tree = tree_in(CROSS, Position::new(3, 2));
        expand_root(&mut tree);
        let east = tree.child_by_action(tree.root(), Direction::East).unwrap();
        let below = expand_all(&mut tree, east);
        for &leaf in &below {
            for _ in 0..4 {
                tree.backpropagate(leaf, Rewards::new(1.0, 0.5, 0.75));
            }
        }

        let before: Vec<(f64, Rewards)> = below
            .iter()
            .chain(std::iter::once(&east))
            .map(|&id| (tree.node(id).visits(), tree.node(id).rewards()))
            .collect();
        assert_eq!(tree.reroot(Position::new(4, 2), 0.5), Reuse::Promoted);

        for (&id, (visits, rewards)) in below.iter().chain(std::iter::once(&east)).zip(before) {
            let node = tree.node(id);
            assert!((node.visits() - visits * 0.5).abs() < 1e-9);
            assert!((node.rewards().pill - rewards.pill * 0.5).abs() < 1e-9);
            assert!((node.rewards().survival - rewards.survival * 0.5).abs() < 1e-9);
            assert_eq!(node.rewards().ghost, 0.0);
        }
    }

    #[test]
    fn test_tactic_value_uses_best_child_means() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        let children = expand_root(&mut tree);
        tree.backpropagate(children[0], Rewards::new(1.0, 0.2, 0.0));
        tree.backpropagate(children[1], Rewards::new(0.5, 0.8, 0.4));

        let root = tree.root();
        assert!((tree.tactic_value(root, Tactic::Survival) - 1.0).abs() < 1e-12);
        assert!((tree.tactic_value(root, Tactic::Pill) - 0.8).abs() < 1e-12);
        assert!((tree.tactic_value(root, Tactic::Ghost) - 0.4).abs() < 1e-12);

        // Leaves fall back to their own means
        assert!((tree.tactic_value(children[1], Tactic::Pill) - 0.4).abs() < 1e-12);
        assert_eq!(tree.tactic_value(children[2], Tactic::Survival), 0.0);
    }

    #[test]
    fn test_uct_guards_unvisited_nodes() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        let children = expand_root(&mut tree);
        let c = std::f64::consts::SQRT_2;
        assert_eq!(tree.uct_score(children[0], Tactic::Survival, c), 0.0);

        for _ in 0..4 {
            tree.backpropagate(children[0], Rewards::new(1.0, 0.0, 0.0));
        }
        let expected = 1.0 + c * (4f64.ln() / 4.0).sqrt();
        let score = tree.uct_score(children[0], Tactic::Survival, c);
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_depth_and_summary() {
        let mut tree = tree_in(CROSS, Position::new(2, 2));
        let children = expand_root(&mut tree);
        expand_all(&mut tree, children[0]);
        assert_eq!(tree.depth(), 2);

        let summary = tree.summary();
        assert_eq!(summary.len(), children.len());
        assert_eq!(summary[0].action, Some(Direction::North));
        assert_eq!(summary[0].destination, Position::new(2, 3));
    }
}
