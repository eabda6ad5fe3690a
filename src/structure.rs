//! Ordered labeled trees built from dot-bracket strings.
//!
//! # Overview
//! A secondary structure in dot-bracket notation is turned into a tree with
//! a synthetic root. Every base pair `( ... )` becomes a `Pair` node whose
//! children are the top-level elements between its brackets, and every `.`
//! becomes an `Unpaired` leaf.
//!
//! # Example
//! ```text
//! "(.)."          Root
//!                /    \
//!             Pair    Unpaired(3)
//!            (0,2)
//!              |
//!         Unpaired(1)
//! ```
//!
//! Nodes are stored in an arena (`Vec<Node>`) and refer to each other by
//! index, so the tree has no ownership cycles and traversals reduce to index
//! arithmetic.

use crate::error::StructureError;
use std::str::FromStr;

/// Index of a node inside a [`Tree`]'s arena.
pub type NodeId = usize;

/// Label of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Synthetic root, one per tree.
    Root,
    /// A base pair, one `(` with its matching `)`.
    Pair,
    /// A single `.` position.
    Unpaired,
}

/// A node of a structure tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Opening position (or the position of a `.`).
    start: usize,
    /// Closing position (equal to `start` for a `.`).
    end: usize,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>, start: usize, end: usize) -> Self {
        Node { kind, parent, children: Vec::new(), start, end }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Parent id, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in left-to-right order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Positions in the source string covered by this node.
    ///
    /// `(open, close)` for a pair, `(i, i)` for an unpaired position and
    /// `(0, len - 1)` for the root.
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// Ordered labeled tree of one secondary structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    structure: String,
    nodes: Vec<Node>,
}

impl Tree {
    /// Id of the synthetic root. The root is always the first arena entry.
    pub const ROOT: NodeId = 0;

    /// Parse a dot-bracket string into a tree.
    ///
    /// # Algorithm
    /// A single left-to-right scan with a stack of open pairs. The top of the
    /// stack is the parent of whatever comes next; an empty stack means the
    /// root.
    /// - `.` appends an `Unpaired` leaf to the current parent
    /// - `(` appends a `Pair` node to the current parent and pushes it
    /// - `)` pops the innermost open pair and records its closing position
    ///
    /// # Errors
    /// - `Empty` for the empty string
    /// - `UnmatchedClose` for a `)` with no open pair
    /// - `InvalidCharacter` for anything outside `{'.', '(', ')'}`
    /// - `Unbalanced` if the `(` and `)` counts differ at the end
    pub fn from_dot_bracket(structure: &str) -> Result<Self, StructureError> {
        if structure.is_empty() {
            return Err(StructureError::Empty);
        }

        let len = structure.chars().count();
        let mut nodes = vec![Node::new(NodeKind::Root, None, 0, len - 1)];
        let mut open: Vec<NodeId> = Vec::new();
        let (mut opened, mut closed) = (0usize, 0usize);

        for (pos, ch) in structure.chars().enumerate() {
            let parent = open.last().copied().unwrap_or(Self::ROOT);
            match ch {
                '.' => {
                    let id = nodes.len();
                    nodes.push(Node::new(NodeKind::Unpaired, Some(parent), pos, pos));
                    nodes[parent].children.push(id);
                }
                '(' => {
                    opened += 1;
                    let id = nodes.len();
                    nodes.push(Node::new(NodeKind::Pair, Some(parent), pos, pos));
                    nodes[parent].children.push(id);
                    open.push(id);
                }
                ')' => {
                    closed += 1;
                    let Some(id) = open.pop() else {
                        return Err(StructureError::UnmatchedClose {
                            structure: structure.to_string(),
                            position: pos,
                        });
                    };
                    nodes[id].end = pos;
                }
                other => {
                    return Err(StructureError::InvalidCharacter {
                        structure: structure.to_string(),
                        character: other,
                        position: pos,
                    });
                }
            }
        }

        // No unmatched ')' got through, so leftover opens show up here.
        if opened != closed {
            return Err(StructureError::Unbalanced {
                structure: structure.to_string(),
                open: opened,
                close: closed,
            });
        }

        Ok(Tree { structure: structure.to_string(), nodes })
    }

    /// The dot-bracket string this tree was built from.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    /// Node by arena id. Panics if `id` is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn num_pairs(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Pair).count()
    }

    /// `(open, close)` positions of all base pairs, in order of the opening
    /// bracket.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Pair)
            .map(Node::span)
            .collect()
    }
}

impl FromStr for Tree {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tree::from_dot_bracket(s)
    }
}
