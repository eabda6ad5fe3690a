//! Postorder index of a structure tree.
//!
//! # Overview
//! An `IndexedTree` is an immutable view of a [`Tree`] carrying everything
//! the Zhang-Shasha recurrence needs: postorder numbering, the leftmost leaf
//! descendant of every node and the sorted keyroots. It is built once per
//! structure and then shared read-only by all pairwise comparisons, so it can
//! be handed to any number of worker threads.
//!
//! # Example
//! ```text
//! "(.)."              postorder   node          leftmost   keyroot?
//!         Root(3)     0           Unpaired(1)   0          no  (first child)
//!        /     \      1           Pair(0,2)     0          no  (first child)
//!    Pair(1)    U(2)  2           Unpaired(3)   2          yes (second child)
//!      |              3           Root          0          yes (root)
//!     U(0)
//! ```

use crate::error::StructureError;
use crate::structure::{NodeId, NodeKind, Tree};

/// A tree with postorder, leftmost-leaf and keyroot indices.
#[derive(Debug, Clone)]
pub struct IndexedTree {
    tree: Tree,
    /// Node ids in postorder.
    postorder: Vec<NodeId>,
    /// Postorder position of each node, indexed by node id.
    position: Vec<usize>,
    /// Label of each postorder position, cached for the distance loop.
    kinds: Vec<NodeKind>,
    /// Leftmost leaf descendant of each postorder position.
    leftmost: Vec<usize>,
    /// Ascending postorder positions of all keyroots.
    keyroots: Vec<usize>,
}

impl IndexedTree {
    /// Index a tree.
    ///
    /// # Algorithm
    /// 1. Postorder walk (children left to right, then the node) with an
    ///    explicit stack, numbering nodes from 0; the root ends up at `n - 1`
    /// 2. Leftmost leaves in postorder order: a leaf maps to itself, an
    ///    internal node to the leftmost leaf of its first child, which has a
    ///    smaller postorder number and is therefore already known
    /// 3. Keyroots: the root and every node that is not the first child of
    ///    its parent, sorted ascending
    pub fn new(tree: Tree) -> Self {
        let postorder = Self::postorder_walk(&tree);

        let mut position = vec![0usize; tree.len()];
        for (pos, &id) in postorder.iter().enumerate() {
            position[id] = pos;
        }

        let kinds = postorder.iter().map(|&id| tree.node(id).kind()).collect();

        let mut leftmost = vec![0usize; postorder.len()];
        for (pos, &id) in postorder.iter().enumerate() {
            leftmost[pos] = match tree.node(id).children().first() {
                Some(&first) => leftmost[position[first]],
                None => pos,
            };
        }

        let mut keyroots: Vec<usize> = postorder
            .iter()
            .enumerate()
            .filter(|&(_, &id)| match tree.node(id).parent() {
                None => true,
                Some(parent) => tree.node(parent).children().first() != Some(&id),
            })
            .map(|(pos, _)| pos)
            .collect();
        keyroots.sort_unstable();

        IndexedTree { tree, postorder, position, kinds, leftmost, keyroots }
    }

    /// Parse and index a dot-bracket string in one step.
    pub fn from_dot_bracket(structure: &str) -> Result<Self, StructureError> {
        Tree::from_dot_bracket(structure).map(Self::new)
    }

    /// Children-before-parent order without recursion.
    ///
    /// Each stack frame holds a node and the index of the next child to
    /// visit; a node is emitted once all of its children have been.
    fn postorder_walk(tree: &Tree) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(tree.len());
        let mut stack: Vec<(NodeId, usize)> = vec![(Tree::ROOT, 0)];

        while let Some((id, next)) = stack.pop() {
            let children = tree.node(id).children();
            if next < children.len() {
                stack.push((id, next + 1));
                stack.push((children[next], 0));
            } else {
                order.push(id);
            }
        }
        order
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.postorder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postorder.is_empty()
    }

    pub fn postorder(&self) -> &[NodeId] {
        &self.postorder
    }

    /// Postorder position of a node id.
    pub fn position(&self, id: NodeId) -> usize {
        self.position[id]
    }

    /// Label at postorder position `i`.
    #[inline]
    pub fn kind(&self, i: usize) -> NodeKind {
        self.kinds[i]
    }

    pub fn leftmost(&self) -> &[usize] {
        &self.leftmost
    }

    pub fn keyroots(&self) -> &[usize] {
        &self.keyroots
    }
}

impl From<Tree> for IndexedTree {
    fn from(tree: Tree) -> Self {
        IndexedTree::new(tree)
    }
}
