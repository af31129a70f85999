//! Generic traversal helpers over the arena tree, shared by all extractors.
use super::tree::{NodeId, SyntaxTree};

/// Node kinds that hold a plain identifier across the supported grammars.
pub const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "property_identifier",
    "field_identifier",
    "private_property_identifier",
    "shorthand_property_identifier",
    "constant",
    "name",
    "simple_identifier",
    "word",
];

pub fn is_identifier_kind(kind: &str) -> bool {
    IDENTIFIER_KINDS.contains(&kind)
}

/// Every node under `start` (inclusive) whose kind is in `kinds`, in document order.
pub fn find_all_by_type(tree: &SyntaxTree, start: NodeId, kinds: &[&str]) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if kinds.contains(&tree.kind(id)) {
            found.push(id);
        }
        // reversed so the pop order stays in document order
        stack.extend(tree.children(id).iter().rev().copied());
    }
    found
}

/// First direct child of `node` whose kind is in `kinds`.
pub fn find_first_child_by_type(tree: &SyntaxTree, node: NodeId, kinds: &[&str]) -> Option<NodeId> {
    tree.children(node)
        .iter()
        .copied()
        .find(|c| kinds.contains(&tree.kind(*c)))
}

/// First descendant (breadth-first, bounded by `max_depth`) with an
/// identifier-like kind.
pub fn find_identifier_descendant(tree: &SyntaxTree, node: NodeId, max_depth: usize) -> Option<NodeId> {
    let mut frontier = vec![node];
    for _ in 0..=max_depth {
        let mut next = Vec::new();
        for id in frontier {
            if is_identifier_kind(tree.kind(id)) {
                return Some(id);
            }
            next.extend_from_slice(tree.children(id));
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    None
}

/// Resolves the identifier of a declaration node.
///
/// Each slot is a field name; the first slot present on the node wins, and if
/// the node in that slot is not itself an identifier the first identifier
/// below it is taken (this covers C declarators and generic Rust types).
/// Without a matching slot the first identifier-like direct child is used.
pub fn extract_identifier_name(tree: &SyntaxTree, node: NodeId, slots: &[&str]) -> Option<String> {
    for slot in slots {
        if let Some(child) = tree.child_by_field(node, slot) {
            if let Some(ident) = find_identifier_descendant(tree, child, 4) {
                let text = tree.text(ident).trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
    }

    find_first_child_by_type(tree, node, IDENTIFIER_KINDS)
        .map(|id| tree.text(id).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Walks ancestors of `node` (exclusive) and returns the first whose kind is in `kinds`.
pub fn find_ancestor_by_type(tree: &SyntaxTree, node: NodeId, kinds: &[&str]) -> Option<NodeId> {
    let mut current = tree.parent(node);
    while let Some(id) = current {
        if kinds.contains(&tree.kind(id)) {
            return Some(id);
        }
        current = tree.parent(id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SyntaxTree, NodeId) {
        // class Foo { bar() {} }
        let src = "class Foo { bar() {} }";
        let mut tree = SyntaxTree::new(src);
        let root = tree.add_node(None, "program", None, 0..src.len());
        let class = tree.add_node(Some(root), "class_declaration", None, 0..src.len());
        tree.add_node(Some(class), "class", None, 0..5);
        tree.add_node(Some(class), "type_identifier", Some("name"), 6..9);
        let body = tree.add_node(Some(class), "class_body", Some("body"), 10..src.len());
        let method = tree.add_node(Some(body), "method_definition", None, 12..20);
        tree.add_node(Some(method), "property_identifier", Some("name"), 12..15);
        (tree, root)
    }

    #[test]
    fn test_find_all_in_document_order() {
        let (tree, root) = sample();
        let ids = find_all_by_type(&tree, root, &["class_declaration", "method_definition"]);
        let kinds: Vec<&str> = ids.iter().map(|id| tree.kind(*id)).collect();
        assert_eq!(kinds, vec!["class_declaration", "method_definition"]);
    }

    #[test]
    fn test_extract_names_from_slots() {
        let (tree, root) = sample();
        let class = find_all_by_type(&tree, root, &["class_declaration"])[0];
        let method = find_all_by_type(&tree, root, &["method_definition"])[0];
        assert_eq!(extract_identifier_name(&tree, class, &["name"]).as_deref(), Some("Foo"));
        assert_eq!(extract_identifier_name(&tree, method, &["name"]).as_deref(), Some("bar"));
        assert_eq!(find_ancestor_by_type(&tree, method, &["class_declaration"]), Some(class));
    }

    #[test]
    fn test_missing_identifier_is_none() {
        let mut tree = SyntaxTree::new("{}");
        let root = tree.add_node(None, "statement_block", None, 0..2);
        assert_eq!(extract_identifier_name(&tree, root, &["name"]), None);
    }
}
