//! Arena-backed syntax tree.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. Structures
//! keep a `NodeId` instead of a borrowed node, so they can outlive any parser
//! handle while still giving O(1) access back into the tree.
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Zero-based row/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: String,
    /// Field name this node occupies in its parent, if any.
    pub field: Option<String>,
    pub named: bool,
    /// Set for `ERROR` and missing nodes.
    pub is_error: bool,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<SyntaxNode>,
    line_starts: Vec<usize>,
}

impl SyntaxTree {
    /// Creates an empty tree over `source`. The first node added becomes the root.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            nodes: Vec::new(),
            line_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> &str {
        self.get(id).map(|n| n.kind.as_str()).unwrap_or("")
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// First child stored under `field`.
    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.get(*c).and_then(|n| n.field.as_deref()) == Some(field))
    }

    /// Source text covered by the node; empty for invalid ids or ranges that
    /// do not fall on char boundaries.
    pub fn text(&self, id: NodeId) -> &str {
        self.get(id)
            .and_then(|n| self.source.get(n.start_byte..n.end_byte))
            .unwrap_or("")
    }

    /// 1-based start and end lines of the node.
    pub fn line_span(&self, id: NodeId) -> Option<(usize, usize)> {
        self.get(id).map(|n| (n.start.row + 1, n.end.row + 1))
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.is_error)
    }

    pub fn error_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.nodes.iter().filter(|n| n.is_error)
    }

    /// Adds a node covering `bytes`, computing its row/column positions.
    ///
    /// `parent` must be an id previously returned by this tree; the node is
    /// appended to that parent's children.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        kind: &str,
        field: Option<&str>,
        bytes: Range<usize>,
    ) -> NodeId {
        let start = self.point_at(bytes.start);
        let end = self.point_at(bytes.end);
        let named = kind
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !kind.is_empty();
        self.push(SyntaxNode {
            kind: kind.to_string(),
            field: field.map(str::to_string),
            named,
            is_error: kind == "ERROR",
            start_byte: bytes.start,
            end_byte: bytes.end,
            start,
            end,
            parent,
            children: Vec::new(),
        })
    }

    pub(crate) fn push(&mut self, node: SyntaxNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            if let Some(p) = self.nodes.get_mut(parent.0) {
                p.children.push(id);
            }
        }
        self.nodes.push(node);
        id
    }

    fn point_at(&self, byte: usize) -> Point {
        let byte = byte.min(self.source.len());
        let row = match self.line_starts.binary_search(&byte) {
            Ok(row) => row,
            Err(next) => next - 1,
        };
        Point {
            row,
            column: byte - self.line_starts[row],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_from_bytes() {
        let mut tree = SyntaxTree::new("ab\ncd\nef");
        let root = tree.add_node(None, "program", None, 0..8);
        let child = tree.add_node(Some(root), "identifier", Some("name"), 3..5);

        let node = tree.get(child).unwrap();
        assert_eq!(node.start, Point { row: 1, column: 0 });
        assert_eq!(node.end, Point { row: 1, column: 2 });
        assert_eq!(tree.text(child), "cd");
        assert_eq!(tree.line_span(root), Some((1, 3)));
        assert_eq!(tree.child_by_field(root, "name"), Some(child));
        assert_eq!(tree.parent(child), Some(root));
    }

    #[test]
    fn test_invalid_ids_are_harmless() {
        let tree = SyntaxTree::new("x");
        assert!(tree.root().is_none());
        assert_eq!(tree.text(NodeId(42)), "");
        assert!(tree.children(NodeId(42)).is_empty());
    }

    #[test]
    fn test_named_and_error_flags() {
        let mut tree = SyntaxTree::new("{ ? }");
        let root = tree.add_node(None, "ERROR", None, 0..5);
        let brace = tree.add_node(Some(root), "{", None, 0..1);
        assert!(tree.has_errors());
        assert!(!tree.get(brace).unwrap().named);
    }
}
