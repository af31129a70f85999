//! Syntax-tree extraction of top-level, nested and internal structures.
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::languages::{LanguageRegistry, LanguageRules};
use crate::models::{
    ExtractedStructures, ExtractionStrategy, Importance, InternalMetadata, InternalStructure,
    Location, NestedStructure, StructureKind, StructureMetadata, StructureRef, TopLevelStructure,
};
use crate::parser::walker::{extract_identifier_name, find_all_by_type, find_first_child_by_type};
use crate::parser::{NodeId, SyntaxTree};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("syntax tree is empty")]
    EmptyTree,

    #[error("syntax tree covers {tree} bytes but the content has {content}")]
    SourceMismatch { tree: usize, content: usize },
}

const NAMED_CONFIDENCE: f32 = 0.95;
const ANONYMOUS_CONFIDENCE: f32 = 0.75;
const INTERNAL_CONFIDENCE: f32 = 0.9;

/// Child nodes that carry the name of a declaration which has none itself
/// (`const x = ...`, Go `type T struct`, C `int x = 1`).
const DECLARATOR_KINDS: &[&str] = &[
    "variable_declarator",
    "type_spec",
    "const_spec",
    "var_spec",
    "assignment",
    "init_declarator",
    "function_declarator",
];

const IMPORT_FIELDS: &[&str] = &["source", "module_name", "argument", "path"];

const IMPORT_TARGET_KINDS: &[&str] = &[
    "interpreted_string_literal",
    "string_literal",
    "system_lib_string",
    "string",
    "dotted_name",
    "scoped_identifier",
    "qualified_name",
    "identifier",
];

/// Structure extraction over a syntax tree, dispatched through the node-type
/// registry.
pub struct AstExtractor {
    registry: Arc<LanguageRegistry>,
    max_depth: usize,
}

impl AstExtractor {
    pub fn new(registry: Arc<LanguageRegistry>, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    /// All three tiers. The returned value does not own the tree; the caller
    /// attaches it.
    pub fn extract(
        &self,
        content: &str,
        language: &str,
        tree: &SyntaxTree,
    ) -> Result<ExtractedStructures, ExtractError> {
        let top_level = self.extract_top_level(content, language, tree)?;
        let nested = self.extract_nested(content, language, tree, &top_level)?;
        let internal = self.extract_internal(content, language, tree, &top_level, &nested)?;
        debug!(
            "AST extraction for {language}: {} top-level, {} nested, {} internal",
            top_level.len(),
            nested.len(),
            internal.len()
        );

        Ok(ExtractedStructures {
            language: language.to_string(),
            strategy: ExtractionStrategy::Ast,
            top_level,
            nested,
            internal,
            tree: None,
        })
    }

    pub fn extract_top_level(
        &self,
        content: &str,
        language: &str,
        tree: &SyntaxTree,
    ) -> Result<Vec<TopLevelStructure>, ExtractError> {
        check_tree(content, tree)?;
        Ok(self.registry.get(language).extract_top_level(tree, language))
    }

    pub fn extract_nested(
        &self,
        content: &str,
        language: &str,
        tree: &SyntaxTree,
        top_level: &[TopLevelStructure],
    ) -> Result<Vec<NestedStructure>, ExtractError> {
        check_tree(content, tree)?;
        Ok(self
            .registry
            .get(language)
            .extract_nested(tree, top_level, language, self.max_depth))
    }

    pub fn extract_internal(
        &self,
        content: &str,
        language: &str,
        tree: &SyntaxTree,
        top_level: &[TopLevelStructure],
        nested: &[NestedStructure],
    ) -> Result<Vec<InternalStructure>, ExtractError> {
        check_tree(content, tree)?;
        let rules = self.registry.get(language);
        Ok(collect_internal(
            rules.as_ref(),
            tree,
            top_level,
            nested,
            self.max_depth,
        ))
    }
}

fn check_tree(content: &str, tree: &SyntaxTree) -> Result<(), ExtractError> {
    if tree.root().is_none() {
        return Err(ExtractError::EmptyTree);
    }
    if tree.source() != content {
        return Err(ExtractError::SourceMismatch {
            tree: tree.source().len(),
            content: content.len(),
        });
    }
    Ok(())
}

// ── Top level ────────────────────────────────────────────────────────

/// Pre-order walk recording nodes whose type is a top-level type. A matched
/// node is not descended into, except exports, whose declarations are
/// structures of their own.
pub(crate) fn collect_top_level<R: LanguageRules + ?Sized>(
    rules: &R,
    tree: &SyntaxTree,
    language: &str,
) -> Vec<TopLevelStructure> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    let mut found = Vec::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else { continue };
        if node.named && id != root {
            if let Some(kind) = rules.top_level_kind(&node.kind) {
                let kind = rules.refine_kind(tree, id, kind);
                if let Some(structure) = build_top_level(rules, tree, id, kind, language) {
                    found.push(structure);
                }
                if kind != StructureKind::Export {
                    continue;
                }
            }
        }
        stack.extend(tree.children(id).iter().rev().copied());
    }
    found
}

fn build_top_level<R: LanguageRules + ?Sized>(
    rules: &R,
    tree: &SyntaxTree,
    id: NodeId,
    kind: StructureKind,
    language: &str,
) -> Option<TopLevelStructure> {
    let content = tree.text(id);
    if content.trim().is_empty() {
        return None;
    }
    let (start, end) = tree.line_span(id)?;
    let name = structure_name(rules, tree, id, kind);
    let confidence = if name.is_some() {
        NAMED_CONFIDENCE
    } else {
        ANONYMOUS_CONFIDENCE
    };

    Some(TopLevelStructure {
        kind,
        name: name.unwrap_or_else(|| format!("{kind}_{start}")),
        content: content.to_string(),
        location: Location::new(start, end),
        node: Some(id),
        metadata: StructureMetadata {
            language: language.to_string(),
            confidence,
        },
    })
}

/// One document structure spanning the whole source.
pub(crate) fn document_structure(tree: &SyntaxTree, language: &str) -> Option<TopLevelStructure> {
    document_structure_for(tree.source(), language, tree.root())
}

pub(crate) fn document_structure_for(
    content: &str,
    language: &str,
    node: Option<NodeId>,
) -> Option<TopLevelStructure> {
    if content.trim().is_empty() {
        return None;
    }
    Some(TopLevelStructure {
        kind: StructureKind::Document,
        name: "document".to_string(),
        content: content.to_string(),
        location: Location::new(1, content.lines().count()),
        node,
        metadata: StructureMetadata {
            language: language.to_string(),
            confidence: 0.9,
        },
    })
}

// ── Names ────────────────────────────────────────────────────────────

pub(crate) fn structure_name<R: LanguageRules + ?Sized>(
    rules: &R,
    tree: &SyntaxTree,
    node: NodeId,
    kind: StructureKind,
) -> Option<String> {
    if kind == StructureKind::Import {
        if let Some(target) = import_target(tree, node) {
            return Some(target);
        }
    }
    extract_identifier_name(tree, node, rules.name_slot_for(tree.kind(node))).or_else(|| {
        find_first_child_by_type(tree, node, DECLARATOR_KINDS).and_then(|declarator| {
            extract_identifier_name(tree, declarator, &["name", "left", "declarator", "pattern"])
        })
    })
}

/// Module path of an import node, without quotes.
fn import_target(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    let clean = |text: &str| {
        text.trim()
            .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '<' | '>'))
            .to_string()
    };
    IMPORT_FIELDS
        .iter()
        .filter_map(|field| tree.child_by_field(node, field))
        .chain(
            find_all_by_type(tree, node, IMPORT_TARGET_KINDS)
                .into_iter()
                .filter(|id| *id != node),
        )
        .map(|id| clean(tree.text(id)))
        .find(|target| !target.is_empty())
}

// ── Nested ───────────────────────────────────────────────────────────

pub(crate) fn collect_nested<R: LanguageRules + ?Sized>(
    rules: &R,
    tree: &SyntaxTree,
    top_level: &[TopLevelStructure],
    language: &str,
    max_depth: usize,
) -> Vec<NestedStructure> {
    let mut walk = NestedWalk {
        rules,
        tree,
        language,
        max_depth,
        found: Vec::new(),
    };
    for parent in top_level.iter().filter(|s| s.kind.is_container()) {
        if let Some(node) = parent.node {
            walk.visit(node, &parent.to_ref(), 0, 1);
        }
    }
    walk.found
}

struct NestedWalk<'a, R: ?Sized> {
    rules: &'a R,
    tree: &'a SyntaxTree,
    language: &'a str,
    max_depth: usize,
    found: Vec<NestedStructure>,
}

impl<R: LanguageRules + ?Sized> NestedWalk<'_, R> {
    fn visit(&mut self, node: NodeId, parent: &StructureRef, level: usize, depth: usize) {
        if depth > self.max_depth {
            return;
        }
        let tree = self.tree;
        for &child in tree.children(node) {
            let Some(n) = tree.get(child) else { continue };
            let matched = if n.named {
                self.rules.nested_kind(&n.kind)
            } else {
                None
            };
            let Some(kind) = matched else {
                self.visit(child, parent, level, depth + 1);
                continue;
            };

            let kind = match self.rules.refine_kind(tree, child, kind) {
                StructureKind::Function if parent.kind.owns_methods() => StructureKind::Method,
                StructureKind::Method if !parent.kind.owns_methods() => StructureKind::Function,
                other => other,
            };
            match self.build(child, kind, parent, level) {
                Some(nested) => {
                    let as_parent = nested.to_ref();
                    self.found.push(nested);
                    self.visit(child, &as_parent, level + 1, depth + 1);
                }
                None => self.visit(child, parent, level, depth + 1),
            }
        }
    }

    fn build(
        &self,
        id: NodeId,
        kind: StructureKind,
        parent: &StructureRef,
        level: usize,
    ) -> Option<NestedStructure> {
        let top = build_top_level(self.rules, self.tree, id, kind, self.language)?;
        Some(NestedStructure {
            kind: top.kind,
            name: top.name,
            content: top.content,
            location: top.location,
            node: top.node,
            metadata: top.metadata,
            parent: parent.clone(),
            level,
        })
    }
}

// ── Internal ─────────────────────────────────────────────────────────

/// Statement-level structures inside every function-like structure. Nested
/// functions are not entered; their statements belong to them.
pub(crate) fn collect_internal<R: LanguageRules + ?Sized>(
    rules: &R,
    tree: &SyntaxTree,
    top_level: &[TopLevelStructure],
    nested: &[NestedStructure],
    max_depth: usize,
) -> Vec<InternalStructure> {
    let parents = top_level
        .iter()
        .map(TopLevelStructure::to_ref)
        .chain(nested.iter().map(NestedStructure::to_ref))
        .filter(|r| r.kind.is_function_like());

    let mut found = Vec::new();
    for parent in parents {
        if let Some(node) = parent.node {
            visit_internal(rules, tree, node, &parent, 1, max_depth, &mut found);
        }
    }
    found
}

fn visit_internal<R: LanguageRules + ?Sized>(
    rules: &R,
    tree: &SyntaxTree,
    node: NodeId,
    parent: &StructureRef,
    depth: usize,
    max_depth: usize,
    found: &mut Vec<InternalStructure>,
) {
    if depth > max_depth {
        return;
    }
    for &child in tree.children(node) {
        let Some(n) = tree.get(child) else { continue };
        if n.named {
            if is_function_boundary(rules, &n.kind) {
                continue;
            }
            if let Some((kind, importance)) = rules.internal_kind(&n.kind) {
                if let Some(internal) = build_internal(rules, tree, child, kind, importance, parent) {
                    found.push(internal);
                }
            }
        }
        visit_internal(rules, tree, child, parent, depth + 1, max_depth, found);
    }
}

fn is_function_boundary<R: LanguageRules + ?Sized>(rules: &R, node_type: &str) -> bool {
    rules
        .nested_kind(node_type)
        .is_some_and(|k| k.is_function_like())
        || rules
            .top_level_kind(node_type)
            .is_some_and(|k| k.is_function_like())
}

fn build_internal<R: LanguageRules + ?Sized>(
    rules: &R,
    tree: &SyntaxTree,
    id: NodeId,
    kind: StructureKind,
    importance: Importance,
    parent: &StructureRef,
) -> Option<InternalStructure> {
    let content = tree.text(id);
    if content.trim().is_empty() {
        return None;
    }
    let (start, end) = tree.line_span(id)?;
    let name = match kind {
        StructureKind::Variable | StructureKind::Constant => structure_name(rules, tree, id, kind),
        _ => None,
    };
    Some(InternalStructure {
        kind,
        name,
        content: content.to_string(),
        location: Location::new(start, end),
        parent: parent.clone(),
        importance,
        metadata: InternalMetadata {
            confidence: INTERNAL_CONFIDENCE,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParserService, TreeSitterParser};

    fn extract(source: &str, language: &str) -> ExtractedStructures {
        extract_with_depth(source, language, 10)
    }

    fn extract_with_depth(source: &str, language: &str, max_depth: usize) -> ExtractedStructures {
        let tree = TreeSitterParser::new().parse(source, language).unwrap();
        let extractor = AstExtractor::new(Arc::new(LanguageRegistry::builtin()), max_depth);
        extractor.extract(source, language, &tree).unwrap()
    }

    fn summary(top: &[TopLevelStructure]) -> Vec<(StructureKind, &str, usize, usize)> {
        top.iter()
            .map(|s| {
                (
                    s.kind,
                    s.name.as_str(),
                    s.location.start_line,
                    s.location.end_line,
                )
            })
            .collect()
    }

    const JS_SOURCE: &str = r#"import { readFile } from 'fs';

export function load(path) {
  const data = readFile(path);
  if (!data) {
    throw new Error('missing');
  }
  return data;
}

const double = (x) => x * 2;

class Store extends Base {
  get(key) {
    return this.items[key];
  }
}
"#;

    #[test]
    fn test_javascript_top_level() {
        let result = extract(JS_SOURCE, "javascript");
        assert_eq!(
            summary(&result.top_level),
            vec![
                (StructureKind::Import, "fs", 1, 1),
                (StructureKind::Export, "load", 3, 9),
                (StructureKind::Function, "load", 3, 9),
                (StructureKind::Function, "double", 11, 11),
                (StructureKind::Class, "Store", 13, 17),
            ]
        );
        assert!(result.top_level.iter().all(|s| s.node.is_some()));
        assert_eq!(result.strategy, ExtractionStrategy::Ast);
    }

    #[test]
    fn test_javascript_methods_and_internal() {
        let result = extract(JS_SOURCE, "javascript");

        assert_eq!(result.nested.len(), 1);
        let method = &result.nested[0];
        assert_eq!(method.kind, StructureKind::Method);
        assert_eq!(method.name, "get");
        assert_eq!(method.parent.name, "Store");
        assert_eq!(method.level, 0);
        assert_eq!((method.location.start_line, method.location.end_line), (14, 16));

        let in_load: Vec<(StructureKind, Importance, usize)> = result
            .internal
            .iter()
            .filter(|i| i.parent.name == "load")
            .map(|i| (i.kind, i.importance, i.location.start_line))
            .collect();
        assert_eq!(
            in_load,
            vec![
                (StructureKind::Variable, Importance::Low, 4),
                (StructureKind::ControlFlow, Importance::Medium, 5),
                (StructureKind::Throw, Importance::High, 6),
                (StructureKind::Return, Importance::High, 8),
            ]
        );
        let data = result
            .internal
            .iter()
            .find(|i| i.kind == StructureKind::Variable)
            .unwrap();
        assert_eq!(data.name.as_deref(), Some("data"));

        assert!(result
            .internal
            .iter()
            .any(|i| i.parent.name == "get" && i.kind == StructureKind::Return));
    }

    #[test]
    fn test_python_structures() {
        let source = "import os\nfrom typing import List\n\nMAX_SIZE = 10\n\nclass Cache:\n    def get(self, key):\n        if key in self.items:\n            return self.items[key]\n        raise KeyError(key)\n\ndef helper():\n    return 1\n";
        let result = extract(source, "python");

        assert_eq!(
            summary(&result.top_level),
            vec![
                (StructureKind::Import, "os", 1, 1),
                (StructureKind::Import, "typing", 2, 2),
                (StructureKind::Constant, "MAX_SIZE", 4, 4),
                (StructureKind::Class, "Cache", 6, 10),
                (StructureKind::Function, "helper", 12, 13),
            ]
        );

        let get = &result.nested[0];
        assert_eq!((get.kind, get.name.as_str()), (StructureKind::Method, "get"));
        assert_eq!(get.parent.kind, StructureKind::Class);

        let kinds: Vec<StructureKind> = result
            .internal
            .iter()
            .filter(|i| i.parent.name == "get")
            .map(|i| i.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                StructureKind::ControlFlow,
                StructureKind::Return,
                StructureKind::Throw
            ]
        );
    }

    #[test]
    fn test_rust_impl_methods() {
        let source = "use std::fmt;\n\npub struct Point {\n    x: i32,\n}\n\nimpl Point {\n    pub fn new(x: i32) -> Self {\n        let p = Point { x };\n        p\n    }\n}\n";
        let result = extract(source, "rust");

        assert_eq!(
            summary(&result.top_level),
            vec![
                (StructureKind::Import, "std::fmt", 1, 1),
                (StructureKind::Struct, "Point", 3, 5),
                (StructureKind::Impl, "Point", 7, 12),
            ]
        );
        let new = &result.nested[0];
        assert_eq!((new.kind, new.name.as_str()), (StructureKind::Method, "new"));
        assert_eq!(new.parent.kind, StructureKind::Impl);

        let let_p = result
            .internal
            .iter()
            .find(|i| i.kind == StructureKind::Variable)
            .unwrap();
        assert_eq!(let_p.name.as_deref(), Some("p"));
        assert_eq!(let_p.location.start_line, 9);
    }

    #[test]
    fn test_go_type_refinement() {
        let source = "package main\n\nimport \"fmt\"\n\ntype Shape interface {\n\tArea() float64\n}\n\ntype Rect struct {\n\tW, H float64\n}\n\nfunc (r Rect) Area() float64 {\n\treturn r.W * r.H\n}\n";
        let result = extract(source, "go");

        assert_eq!(
            summary(&result.top_level),
            vec![
                (StructureKind::Import, "fmt", 3, 3),
                (StructureKind::Interface, "Shape", 5, 7),
                (StructureKind::Struct, "Rect", 9, 11),
                (StructureKind::Method, "Area", 13, 15),
            ]
        );
        assert!(result
            .nested
            .iter()
            .any(|n| n.name == "Area" && n.kind == StructureKind::Method && n.parent.name == "Shape"));
    }

    #[test]
    fn test_depth_limit_stops_nested_search() {
        let result = extract_with_depth(JS_SOURCE, "javascript", 1);
        assert!(result.nested.is_empty());
    }

    #[test]
    fn test_content_must_match_tree() {
        let tree = TreeSitterParser::new().parse("fn a() {}", "rust").unwrap();
        let extractor = AstExtractor::new(Arc::new(LanguageRegistry::builtin()), 10);
        assert!(matches!(
            extractor.extract("fn b() {}", "rust", &tree),
            Err(ExtractError::SourceMismatch { .. })
        ));
        assert!(matches!(
            extractor.extract("", "rust", &SyntaxTree::new("")),
            Err(ExtractError::EmptyTree)
        ));
    }

    #[test]
    fn test_document_rules_cover_whole_file() {
        let source = "{\n  \"name\": \"demo\",\n  \"version\": 1\n}\n";
        let mut tree = SyntaxTree::new(source);
        let root = tree.add_node(None, "document", None, 0..source.len());
        tree.add_node(Some(root), "object", None, 0..source.len() - 1);

        let extractor = AstExtractor::new(Arc::new(LanguageRegistry::builtin()), 10);
        let top = extractor.extract_top_level(source, "json", &tree).unwrap();
        assert_eq!(summary(&top), vec![(StructureKind::Document, "document", 1, 4)]);
    }
}
