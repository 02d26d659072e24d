//! Search tree node types.
//!
//! Uses arena allocation with indices for cache locality and simpler memory management.

use gomoku_board::{Color, Move};

/// Index into the node arena.
///
/// Using indices instead of pointers lets parent links coexist with child
/// lists without `Rc`/`RefCell`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Statistics for a single node.
///
/// Values are from the perspective of the player who made the node's move.
#[derive(Clone, Debug)]
pub struct NodeStats {
    /// Number of simulations routed through this node.
    pub visit_count: u32,

    /// Sum of backed-up values.
    pub value_sum: f32,

    /// `value_sum / visit_count`, refreshed on every update.
    pub mean: f32,

    /// Prior probability from the policy output.
    pub prior: f32,
}

impl NodeStats {
    pub fn new(prior: f32) -> Self {
        Self {
            visit_count: 0,
            value_sum: 0.0,
            mean: 0.0,
            prior,
        }
    }

    /// Mean value; 0.0 if never visited.
    pub fn mean_value(&self) -> f32 {
        self.mean
    }

    /// Record one backed-up value.
    pub fn record(&mut self, value: f32) {
        self.visit_count += 1;
        self.value_sum += value;
        self.mean = self.value_sum / self.visit_count as f32;
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// Move that led here; `Move::NONE` for the root.
    pub mv: Move,

    /// Player who made `mv`; `None` for the root.
    pub color: Option<Color>,

    pub parent: Option<NodeId>,

    /// Children in candidate order.
    pub children: Vec<NodeId>,

    pub stats: NodeStats,

    /// `mv` completed a winning line.
    pub terminal: bool,
}

impl Node {
    pub fn new(mv: Move, color: Color, parent: NodeId, prior: f32) -> Self {
        Self {
            mv,
            color: Some(color),
            parent: Some(parent),
            children: Vec::new(),
            stats: NodeStats::new(prior),
            terminal: false,
        }
    }

    pub fn root() -> Self {
        Self {
            mv: Move::NONE,
            color: None,
            parent: None,
            children: Vec::new(),
            stats: NodeStats::new(1.0),
            terminal: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The player to move in the position after this node's move.
    pub fn to_move(&self, root_to_move: Color) -> Color {
        self.color.map_or(root_to_move, Color::opposite)
    }
}
