//! Regex-driven extraction used when no syntax tree is available.
//!
//! Line numbers come from counting newlines before a match; end lines from
//! the block heuristics in [`super::lines`]. Everything here is total: bad
//! input yields fewer structures, never a panic.
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use regex::Captures;
use tracing::debug;

use super::code_parser::document_structure_for;
use super::languages::{is_reserved_word, BlockStyle, CompiledPattern, LanguageRegistry, Tier};
use super::lines::{has_unclosed_bracket, line_of_offset, resolve_end_line, slice_lines, split_lines};
use super::markdown;
use crate::models::{
    ExtractedStructures, ExtractionStrategy, InternalMetadata, InternalStructure, Location,
    NestedStructure, StructureKind, StructureMetadata, StructureRef, TopLevelStructure,
};

pub struct TextExtractor {
    registry: Arc<LanguageRegistry>,
}

/// First non-empty capture group, trimmed.
fn capture_name(caps: &Captures<'_>) -> Option<String> {
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

impl TextExtractor {
    pub fn new(registry: Arc<LanguageRegistry>) -> Self {
        Self { registry }
    }

    pub fn extract(&self, content: &str, language: &str) -> ExtractedStructures {
        let top_level = self.extract_top_level(content, language);
        let nested = self.extract_nested(content, language, &top_level);
        let internal = self.extract_internal(content, language, &top_level, &nested);
        debug!(
            "Text extraction for {language}: {} top-level, {} nested, {} internal",
            top_level.len(),
            nested.len(),
            internal.len()
        );

        ExtractedStructures {
            language: language.to_string(),
            strategy: ExtractionStrategy::Text,
            top_level,
            nested,
            internal,
            tree: None,
        }
    }

    pub fn extract_top_level(&self, content: &str, language: &str) -> Vec<TopLevelStructure> {
        let rules = self.registry.get(language);
        let lines = split_lines(content);
        if lines.is_empty() {
            return Vec::new();
        }

        let style = rules.block_style();
        match style {
            BlockStyle::Markdown => return markdown_sections(content, language, &lines),
            BlockStyle::Document => {
                return document_structure_for(content, language, None)
                    .into_iter()
                    .collect();
            }
            _ => {}
        }

        let mut seen_lines = HashSet::new();
        let mut found = Vec::new();
        for pattern in rules.patterns(Tier::TopLevel) {
            for caps in pattern.regex.captures_iter(content) {
                let Some(whole) = caps.get(0) else { continue };
                let start = line_of_offset(content, whole.start());
                let name = capture_name(&caps);
                if name.as_deref().is_some_and(is_reserved_word) || seen_lines.contains(&start) {
                    continue;
                }
                seen_lines.insert(start);

                let end = resolve_end_line(&lines, start - 1, style) + 1;
                found.push(TopLevelStructure {
                    kind: pattern.kind,
                    name: name.unwrap_or_else(|| format!("{}_{start}", pattern.kind)),
                    content: slice_lines(&lines, start - 1, end - 1),
                    location: Location::new(start, end),
                    node: None,
                    metadata: StructureMetadata {
                        language: language.to_string(),
                        confidence: pattern.confidence,
                    },
                });
            }
        }
        found.sort_by_key(|s| (s.location.start_line, s.location.end_line));
        found
    }

    /// Nested patterns are matched inside each container's content. When
    /// containers overlap, a line belongs to the innermost one.
    pub fn extract_nested(
        &self,
        content: &str,
        language: &str,
        top_level: &[TopLevelStructure],
    ) -> Vec<NestedStructure> {
        let rules = self.registry.get(language);
        let patterns = rules.patterns(Tier::Nested);
        if patterns.is_empty() {
            return Vec::new();
        }
        let lines = split_lines(content);
        let style = rules.block_style();
        let mut by_line: BTreeMap<usize, (usize, NestedStructure)> = BTreeMap::new();

        let parents = top_level
            .iter()
            .filter(|s| s.kind.is_container() || s.kind == StructureKind::Document);
        for parent in parents {
            let parent_ref = parent.to_ref();
            let span = parent.location.line_count();
            for pattern in patterns {
                for caps in pattern.regex.captures_iter(&parent.content) {
                    let Some(nested) =
                        nested_match(&caps, pattern, parent, &parent_ref, &lines, style, language)
                    else {
                        continue;
                    };
                    let line = nested.location.start_line;
                    if by_line.get(&line).is_some_and(|(held, _)| *held <= span) {
                        continue;
                    }
                    by_line.insert(line, (span, nested));
                }
            }
        }
        by_line.into_values().map(|(_, nested)| nested).collect()
    }

    /// Statement patterns inside function bodies. Each statement is credited
    /// to the innermost function-like structure whose body contains it.
    pub fn extract_internal(
        &self,
        content: &str,
        language: &str,
        top_level: &[TopLevelStructure],
        nested: &[NestedStructure],
    ) -> Vec<InternalStructure> {
        let rules = self.registry.get(language);
        let patterns = rules.patterns(Tier::Internal);
        let lines = split_lines(content);
        if patterns.is_empty() || lines.is_empty() {
            return Vec::new();
        }
        let style = rules.block_style();
        let parents: Vec<StructureRef> = top_level
            .iter()
            .map(TopLevelStructure::to_ref)
            .chain(nested.iter().map(NestedStructure::to_ref))
            .filter(|r| r.kind.is_function_like())
            .collect();

        let innermost = |line: usize| -> Option<usize> {
            parents
                .iter()
                .enumerate()
                .filter(|(_, p)| p.location.start_line < line && line <= p.location.end_line)
                .min_by_key(|(_, p)| p.location.line_count())
                .map(|(i, _)| i)
        };

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for (index, parent) in parents.iter().enumerate() {
            let Location {
                start_line,
                end_line,
            } = parent.location;
            if start_line >= end_line {
                continue;
            }
            // body lines only; the header line is skipped
            let body = slice_lines(&lines, start_line, end_line - 1);
            for pattern in patterns {
                for caps in pattern.regex.captures_iter(&body) {
                    let Some(whole) = caps.get(0) else { continue };
                    let line = start_line + line_of_offset(&body, whole.start());
                    if innermost(line) != Some(index) || !seen.insert((line, pattern.kind)) {
                        continue;
                    }
                    let line_text = lines.get(line - 1).copied().unwrap_or("");
                    let end = if pattern.kind == StructureKind::ControlFlow
                        || has_unclosed_bracket(line_text)
                    {
                        (resolve_end_line(&lines, line - 1, style) + 1).min(end_line)
                    } else {
                        line
                    };
                    let name = match pattern.kind {
                        StructureKind::Variable | StructureKind::Constant => capture_name(&caps),
                        _ => None,
                    };
                    found.push(InternalStructure {
                        kind: pattern.kind,
                        name,
                        content: slice_lines(&lines, line - 1, end - 1),
                        location: Location::new(line, end),
                        parent: parent.clone(),
                        importance: pattern.importance,
                        metadata: InternalMetadata {
                            confidence: pattern.confidence,
                        },
                    });
                }
            }
        }
        found.sort_by_key(|i| (i.location.start_line, i.location.end_line));
        found
    }
}

fn nested_match(
    caps: &Captures<'_>,
    pattern: &CompiledPattern,
    parent: &TopLevelStructure,
    parent_ref: &StructureRef,
    lines: &[&str],
    style: BlockStyle,
    language: &str,
) -> Option<NestedStructure> {
    let whole = caps.get(0)?;
    let line = parent.location.start_line + line_of_offset(&parent.content, whole.start()) - 1;
    if line == parent.location.start_line && parent.kind != StructureKind::Document {
        return None;
    }
    let name = capture_name(caps);
    if name.as_deref().is_some_and(is_reserved_word) {
        return None;
    }

    let kind = match pattern.kind {
        StructureKind::Function if parent.kind.owns_methods() => StructureKind::Method,
        StructureKind::Method if !parent.kind.owns_methods() => StructureKind::Function,
        other => other,
    };
    let end = (resolve_end_line(lines, line - 1, style) + 1).min(parent.location.end_line);

    Some(NestedStructure {
        kind,
        name: name.unwrap_or_else(|| format!("{kind}_{line}")),
        content: slice_lines(lines, line - 1, end - 1),
        location: Location::new(line, end),
        node: None,
        metadata: StructureMetadata {
            language: language.to_string(),
            confidence: pattern.confidence,
        },
        parent: parent_ref.clone(),
        level: 0,
    })
}

/// Markdown headings as sections; a file without headings is one document.
fn markdown_sections(content: &str, language: &str, lines: &[&str]) -> Vec<TopLevelStructure> {
    let sections = markdown::sections(content);
    if sections.is_empty() {
        return document_structure_for(content, language, None)
            .into_iter()
            .collect();
    }
    sections
        .into_iter()
        .map(|section| TopLevelStructure {
            kind: StructureKind::Section,
            name: if section.title.is_empty() {
                format!("section_{}", section.start_line)
            } else {
                section.title
            },
            content: slice_lines(lines, section.start_line - 1, section.end_line - 1),
            location: Location::new(section.start_line, section.end_line),
            node: None,
            metadata: StructureMetadata {
                language: language.to_string(),
                confidence: 0.9,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Importance;

    fn extractor() -> TextExtractor {
        TextExtractor::new(Arc::new(LanguageRegistry::builtin()))
    }

    #[test]
    fn test_brace_function_with_internal_statements() {
        let source = "function foo() {\n  if (x) {\n    return 1;\n  }\n}";
        let result = extractor().extract(source, "javascript");

        assert_eq!(result.strategy, ExtractionStrategy::Text);
        assert_eq!(result.top_level.len(), 1);
        let foo = &result.top_level[0];
        assert_eq!((foo.kind, foo.name.as_str()), (StructureKind::Function, "foo"));
        assert_eq!(foo.location, Location::new(1, 5));
        assert_eq!(foo.content, source);
        assert!(foo.node.is_none());

        let internal: Vec<(StructureKind, usize, usize, Importance)> = result
            .internal
            .iter()
            .map(|i| (i.kind, i.location.start_line, i.location.end_line, i.importance))
            .collect();
        assert_eq!(
            internal,
            vec![
                (StructureKind::ControlFlow, 2, 4, Importance::Medium),
                (StructureKind::Return, 3, 3, Importance::High),
            ]
        );
    }

    #[test]
    fn test_methods_skip_control_keywords() {
        let source = "class Store {\n  get(key) {\n    if (key) {\n      return 1;\n    }\n  }\n}\n";
        let result = extractor().extract(source, "javascript");

        assert_eq!(result.top_level[0].location, Location::new(1, 7));
        assert_eq!(result.nested.len(), 1);
        let get = &result.nested[0];
        assert_eq!((get.kind, get.name.as_str()), (StructureKind::Method, "get"));
        assert_eq!(get.location, Location::new(2, 6));
        assert_eq!(get.parent.name, "Store");
        assert!(result.internal.iter().all(|i| i.parent.name == "get"));
    }

    #[test]
    fn test_python_indentation_blocks() {
        let source = "class Cache:\n    def get(self, key):\n        if key in self.items:\n            return self.items[key]\n        return None\n\n    def put(self, key, value):\n        self.count = value\n";
        let result = extractor().extract(source, "python");

        assert_eq!(result.top_level[0].location, Location::new(1, 8));
        let methods: Vec<(&str, StructureKind, usize, usize)> = result
            .nested
            .iter()
            .map(|n| (n.name.as_str(), n.kind, n.location.start_line, n.location.end_line))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("get", StructureKind::Method, 2, 5),
                ("put", StructureKind::Method, 7, 8),
            ]
        );

        let internal: Vec<(StructureKind, usize, Option<&str>)> = result
            .internal
            .iter()
            .map(|i| (i.kind, i.location.start_line, i.name.as_deref()))
            .collect();
        assert_eq!(
            internal,
            vec![
                (StructureKind::ControlFlow, 3, None),
                (StructureKind::Return, 4, None),
                (StructureKind::Return, 5, None),
                (StructureKind::Variable, 8, Some("self.count")),
            ]
        );
        assert_eq!(result.internal[0].location.end_line, 4);
    }

    #[test]
    fn test_markdown_sections() {
        let source = "# Guide\n\nText.\n\n## Setup\n\nSteps.\n";
        let top = extractor().extract_top_level(source, "markdown");
        let spans: Vec<(&str, usize, usize)> = top
            .iter()
            .map(|s| (s.name.as_str(), s.location.start_line, s.location.end_line))
            .collect();
        assert_eq!(spans, vec![("Guide", 1, 7), ("Setup", 5, 7)]);
        assert!(top.iter().all(|s| s.kind == StructureKind::Section));
    }

    #[test]
    fn test_markdown_without_headings_is_a_document() {
        let top = extractor().extract_top_level("just some notes\n", "markdown");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].kind, StructureKind::Document);
    }

    #[test]
    fn test_json_document_and_keys() {
        let source = "{\n  \"name\": \"demo\",\n  \"deps\": {\n    \"a\": 1\n  }\n}\n";
        let result = extractor().extract(source, "json");

        assert_eq!(result.top_level.len(), 1);
        assert_eq!(result.top_level[0].kind, StructureKind::Document);
        assert_eq!(result.top_level[0].location, Location::new(1, 6));

        let keys: Vec<(&str, usize, usize)> = result
            .nested
            .iter()
            .map(|n| (n.name.as_str(), n.location.start_line, n.location.end_line))
            .collect();
        assert_eq!(keys, vec![("name", 2, 2), ("deps", 3, 5)]);
    }

    #[test]
    fn test_unknown_language_uses_generic_patterns() {
        let top = extractor().extract_top_level("def foo():\n    pass\n", "cobol");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "foo");
        assert_eq!(top[0].metadata.confidence, 0.7);
    }

    #[test]
    fn test_garbage_input_never_panics() {
        let inputs = ["", "\n\n\n", "}}}{{{\n\0\n", "fn", "class\n", "def (:\n\t\t", "é\u{301}\n}{"];
        let extractor = extractor();
        for language in ["javascript", "python", "rust", "ruby", "markdown", "json", "unknown"] {
            for input in inputs {
                let result = extractor.extract(input, language);
                for s in &result.top_level {
                    assert!(s.location.start_line >= 1);
                    assert!(s.location.start_line <= s.location.end_line);
                }
            }
        }
    }
}
