// Search tree nodes and their reward accumulators

use serde::Serialize;
use std::ops::AddAssign;

use crate::types::{Direction, Position, Tactic};

/// Handle of a node inside a `SearchTree` arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Per-channel reward totals. One field per tactic so every channel always exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rewards {
    pub survival: f64,
    pub pill: f64,
    pub ghost: f64,
}

impl Rewards {
    pub fn new(survival: f64, pill: f64, ghost: f64) -> Self {
        Rewards {
            survival,
            pill,
            ghost,
        }
    }

    /// Reward channel read by a tactic
    pub fn get(&self, tactic: Tactic) -> f64 {
        match tactic {
            Tactic::Survival => self.survival,
            Tactic::Pill => self.pill,
            Tactic::Ghost => self.ghost,
        }
    }

    pub fn total(&self) -> f64 {
        self.survival + self.pill + self.ghost
    }

    /// Ages statistics gathered against an older game state. Ghost captures do
    /// not carry over, since the edible window they relied on has moved on.
    pub fn discount(&mut self, factor: f64) {
        self.survival *= factor;
        self.pill *= factor;
        self.ghost = 0.0;
    }
}

impl AddAssign for Rewards {
    fn add_assign(&mut self, other: Rewards) {
        self.survival += other.survival;
        self.pill += other.pill;
        self.ghost += other.ghost;
    }
}

/// A junction (or the agent's own cell, for the root) reached through a macro-edge
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) position: Position,
    pub(crate) actions: Vec<Direction>,
    pub(crate) visits: f64,
    pub(crate) rewards: Rewards,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    /// A fresh, unvisited node
    pub fn new(position: Position, actions: Vec<Direction>) -> Self {
        Node {
            position,
            actions,
            visits: 0.0,
            rewards: Rewards::default(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Moves that lead here from the parent; empty for the root
    pub fn actions(&self) -> &[Direction] {
        &self.actions
    }

    pub fn first_action(&self) -> Option<Direction> {
        self.actions.first().copied()
    }

    pub fn last_action(&self) -> Option<Direction> {
        self.actions.last().copied()
    }

    pub fn visits(&self) -> f64 {
        self.visits
    }

    pub fn rewards(&self) -> Rewards {
        self.rewards
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Mean reward of one channel; zero for unvisited nodes
    pub fn mean(&self, tactic: Tactic) -> f64 {
        if self.visits <= 0.0 {
            0.0
        } else {
            self.rewards.get(tactic) / self.visits
        }
    }

    pub(crate) fn record(&mut self, rewards: Rewards) {
        self.visits += 1.0;
        self.rewards += rewards;
    }

    pub(crate) fn discount(&mut self, factor: f64) {
        self.visits *= factor;
        self.rewards.discount(factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_unvisited_node_is_zero() {
        let node = Node::new(Position::new(1, 1), vec![]);
        assert_eq!(node.mean(Tactic::Survival), 0.0);
        assert_eq!(node.mean(Tactic::Pill), 0.0);
    }

    #[test]
    fn test_record_accumulates_all_channels() {
        let mut node = Node::new(Position::new(1, 1), vec![Direction::East]);
        node.record(Rewards::new(1.0, 0.5, 0.0));
        node.record(Rewards::new(0.0, 0.25, 1.0));
        assert_eq!(node.visits(), 2.0);
        assert_eq!(node.rewards(), Rewards::new(1.0, 0.75, 1.0));
        assert!((node.mean(Tactic::Pill) - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_discount_twice_by_half() {
        let mut node = Node::new(Position::new(1, 1), vec![]);
        node.visits = 10.0;
        node.rewards = Rewards::new(7.0, 4.0, 3.0);
        node.discount(0.5);
        node.discount(0.5);
        assert!((node.visits() - 2.5).abs() < 1e-12);
        assert!((node.rewards().pill - 1.0).abs() < 1e-12);
        assert!((node.rewards().survival - 1.75).abs() < 1e-12);
        assert_eq!(node.rewards().ghost, 0.0);
    }
}
