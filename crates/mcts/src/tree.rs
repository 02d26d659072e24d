//! Arena-allocated search tree.
//!
//! A `Vec<Node>` with index links gives parent back-references without
//! shared ownership; the whole tree for one game is dropped as a unit.

use crate::node::{Node, NodeId};
use gomoku_board::{Color, Move};

#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a new tree with an empty root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root()],
        }
    }

    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Append a child of `parent`, returning its ID.
    pub fn add_child(&mut self, parent: NodeId, mv: Move, color: Color, prior: f32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(mv, color, parent, prior));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Child of `parent` reached by `mv`, if it exists.
    pub fn find_child(&self, parent: NodeId, mv: Move) -> Option<NodeId> {
        self.get(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).mv == mv)
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, mut id: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.get(id).parent {
            id = parent;
            depth += 1;
        }
        depth
    }

    /// Keep only the subtree under `keep`, which becomes the new root.
    ///
    /// Surviving nodes are re-indexed in breadth-first order.
    pub fn retain_subtree(&mut self, keep: NodeId) -> NodeId {
        if keep == NodeId::ROOT {
            return NodeId::ROOT;
        }
        let mut old = std::mem::take(&mut self.nodes);
        let mut order = vec![keep];
        let mut remap = vec![usize::MAX; old.len()];
        let mut i = 0;
        while i < order.len() {
            let id = order[i];
            remap[id.0] = i;
            order.extend(old[id.0].children.iter().copied());
            i += 1;
        }

        self.nodes = order
            .iter()
            .map(|&id| {
                let mut node = std::mem::replace(&mut old[id.0], Node::root());
                node.children.iter_mut().for_each(|c| *c = NodeId(remap[c.0]));
                node.parent = node.parent.map(|p| NodeId(remap[p.0]));
                node
            })
            .collect();
        self.nodes[0].parent = None;
        NodeId::ROOT
    }

    /// Clear the tree for reuse, keeping only a fresh root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::root());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists for the tree's whole life.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &Node {
        self.get(NodeId::ROOT)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
