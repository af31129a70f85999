//! Tree-sitter backed [`ParserService`].
use std::path::Path;

use tree_sitter::{Language, Parser, Tree};

use super::tree::{NodeId, Point, SyntaxNode, SyntaxTree};
use super::{ParseError, ParserService};

pub struct GrammarConfig {
    pub name: &'static str,
    pub language: Language,
    pub extensions: &'static [&'static str],
}

impl GrammarConfig {
    pub fn get_all() -> Vec<GrammarConfig> {
        vec![
            GrammarConfig {
                name: "go",
                language: tree_sitter_go::LANGUAGE.into(),
                extensions: &["go"],
            },
            GrammarConfig {
                name: "python",
                language: tree_sitter_python::LANGUAGE.into(),
                extensions: &["py", "pyi"],
            },
            GrammarConfig {
                name: "typescript",
                language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                extensions: &["ts", "mts", "cts"],
            },
            GrammarConfig {
                name: "tsx",
                language: tree_sitter_typescript::LANGUAGE_TSX.into(),
                extensions: &["tsx"],
            },
            GrammarConfig {
                name: "javascript",
                language: tree_sitter_javascript::LANGUAGE.into(),
                extensions: &["js", "jsx", "mjs", "cjs"],
            },
            GrammarConfig {
                name: "rust",
                language: tree_sitter_rust::LANGUAGE.into(),
                extensions: &["rs"],
            },
        ]
    }

    pub fn get_by_extension(ext: &str) -> Option<GrammarConfig> {
        Self::get_all()
            .into_iter()
            .find(|c| c.extensions.contains(&ext))
    }

    pub fn get_by_name(name: &str) -> Option<GrammarConfig> {
        let name = canonical_name(name);
        Self::get_all().into_iter().find(|c| c.name == name)
    }
}

/// Maps common aliases onto grammar names.
fn canonical_name(name: &str) -> &str {
    match name {
        "js" | "jsx" | "node" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "rs" => "rust",
        "golang" => "go",
        other => other,
    }
}

/// Parses with tree-sitter and copies the result into a [`SyntaxTree`].
///
/// A fresh `tree_sitter::Parser` is created per call, so one instance can be
/// shared across threads.
#[derive(Debug, Default, Clone)]
pub struct TreeSitterParser;

impl TreeSitterParser {
    pub fn new() -> Self {
        Self
    }
}

impl ParserService for TreeSitterParser {
    fn parse(&self, content: &str, language: &str) -> Result<SyntaxTree, ParseError> {
        let config = GrammarConfig::get_by_name(&language.to_lowercase())
            .ok_or_else(|| ParseError::UnsupportedLanguage(language.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&config.language)
            .map_err(|e| ParseError::Grammar(e.to_string()))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ParseError::Failed(format!("no tree produced for {language}")))?;

        Ok(convert_tree(&tree, content))
    }

    fn detect_language(&self, path: &Path) -> Option<String> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        GrammarConfig::get_by_extension(&ext.to_lowercase()).map(|c| c.name.to_string())
    }

    fn is_language_supported(&self, language: &str) -> bool {
        GrammarConfig::get_by_name(&language.to_lowercase()).is_some()
    }
}

/// Iterative pre-order copy, so deep trees cannot overflow the stack.
fn convert_tree(tree: &Tree, source: &str) -> SyntaxTree {
    let mut arena = SyntaxTree::new(source);
    let mut cursor = tree.walk();
    let mut parents: Vec<NodeId> = Vec::new();

    loop {
        let node = cursor.node();
        let start = node.start_position();
        let end = node.end_position();
        let id = arena.push(SyntaxNode {
            kind: node.kind().to_string(),
            field: cursor.field_name().map(str::to_string),
            named: node.is_named(),
            is_error: node.is_error() || node.is_missing(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start: Point {
                row: start.row,
                column: start.column,
            },
            end: Point {
                row: end.row,
                column: end.column,
            },
            parent: parents.last().copied(),
            children: Vec::new(),
        });

        if cursor.goto_first_child() {
            parents.push(id);
            continue;
        }
        if cursor.goto_next_sibling() {
            continue;
        }
        // climb until a sibling is available or the root is reached
        loop {
            if !cursor.goto_parent() {
                return arena;
            }
            parents.pop();
            if cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::walker::find_all_by_type;

    #[test]
    fn test_parse_rust_into_arena() {
        let parser = TreeSitterParser::new();
        let source = "struct Point { x: i32 }\n\nfn origin() -> Point {\n    Point { x: 0 }\n}\n";
        let tree = parser.parse(source, "rust").expect("rust should parse");

        let root = tree.root().unwrap();
        assert_eq!(tree.kind(root), "source_file");

        let functions = find_all_by_type(&tree, root, &["function_item"]);
        assert_eq!(functions.len(), 1);
        assert_eq!(tree.line_span(functions[0]), Some((3, 5)));

        let name = tree.child_by_field(functions[0], "name").unwrap();
        assert_eq!(tree.text(name), "origin");
    }

    #[test]
    fn test_unsupported_language_is_error() {
        let parser = TreeSitterParser::new();
        assert!(matches!(
            parser.parse("x", "cobol"),
            Err(ParseError::UnsupportedLanguage(_))
        ));
        assert!(!parser.is_language_supported("cobol"));
        assert!(parser.is_language_supported("JS"));
    }

    #[test]
    fn test_detect_language() {
        let parser = TreeSitterParser::new();
        assert_eq!(parser.detect_language(Path::new("src/app.tsx")).as_deref(), Some("tsx"));
        assert_eq!(parser.detect_language(Path::new("main.py")).as_deref(), Some("python"));
        assert_eq!(parser.detect_language(Path::new("README")), None);
    }

    #[test]
    fn test_syntax_errors_are_flagged() {
        let parser = TreeSitterParser::new();
        let tree = parser.parse("function (( {", "javascript").unwrap();
        assert!(tree.has_errors());
    }
}
