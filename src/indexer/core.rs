//! Extraction orchestration and the per-file pipeline.
//!
//! The orchestrator tries the syntax tree first and falls back to text
//! patterns whenever the parser is missing, refuses the language, fails,
//! finds nothing or panics. Callers never see those failures.
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, warn};

use super::code_parser::AstExtractor;
use super::complexity::ComplexityCalculator;
use super::languages::{BlockStyle, LanguageRegistry};
use super::relations::{RelationshipAnalysis, RelationshipAnalyzer};
use super::text_patterns::TextExtractor;
use crate::chunk::converter::merge_adjacent;
use crate::chunk::{Chunk, ChunkError, ChunkFactory, QueryResultConverter};
use crate::config::{Config, MAX_DEPTH_LIMIT};
use crate::models::{
    ComplexityResult, ExtractedStructures, ExtractionStrategy, InternalStructure, NestedStructure, StructureKind,
    TopLevelStructure,
};
use crate::parser::{ParserService, TreeSitterParser};

/// Languages whose single quotes delimit character literals rather than strings.
const CHAR_LITERAL_LANGUAGES: &[&str] = &["rust", "c", "cpp", "java", "csharp", "go", "kotlin"];
const HASH_COMMENT_LANGUAGES: &[&str] = &["python", "ruby", "yaml"];

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub language: String,
    pub strategy: ExtractionStrategy,
    pub total_lines: usize,
    pub top_level: usize,
    pub nested: usize,
    pub internal: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub complexity: ComplexityResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxIssue {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxReport {
    pub valid: bool,
    /// `Ast` when a parse tree was checked, `Text` for the bracket heuristic.
    pub strategy: ExtractionStrategy,
    pub issues: Vec<SyntaxIssue>,
}

pub struct ContentOrchestrator {
    parser: Option<Arc<dyn ParserService>>,
    registry: Arc<LanguageRegistry>,
    ast: AstExtractor,
    text: TextExtractor,
    complexity: ComplexityCalculator,
}

impl ContentOrchestrator {
    pub fn new(parser: Option<Arc<dyn ParserService>>, registry: Arc<LanguageRegistry>, max_depth: usize) -> Self {
        Self {
            ast: AstExtractor::new(registry.clone(), max_depth),
            text: TextExtractor::new(registry.clone()),
            complexity: ComplexityCalculator::new(&registry),
            parser,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    /// All three tiers, from the tree when possible.
    pub fn extract_all(&self, content: &str, language: &str) -> ExtractedStructures {
        match self.try_ast(content, language) {
            Some(found) => found,
            None => self.text.extract(content, language),
        }
    }

    pub fn extract_structures(&self, content: &str, language: &str) -> Vec<TopLevelStructure> {
        self.extract_all(content, language).top_level
    }

    pub fn extract_nested_structures(&self, content: &str, language: &str) -> Vec<NestedStructure> {
        self.extract_all(content, language).nested
    }

    pub fn extract_internal_structures(&self, content: &str, language: &str) -> Vec<InternalStructure> {
        self.extract_all(content, language).internal
    }

    fn try_ast(&self, content: &str, language: &str) -> Option<ExtractedStructures> {
        let parser = self.parser.as_ref()?;
        if !parser.is_language_supported(language) {
            debug!("No grammar for {language}, using text patterns");
            return None;
        }

        let attempt = catch_unwind(AssertUnwindSafe(|| -> anyhow::Result<ExtractedStructures> {
            let tree = parser.parse(content, language)?;
            let mut found = self.ast.extract(content, language, &tree)?;
            found.tree = Some(tree);
            Ok(found)
        }));

        match attempt {
            Ok(Ok(found)) if !found.top_level.is_empty() => Some(found),
            Ok(Ok(_)) => {
                debug!("AST extraction for {language} found nothing, using text patterns");
                None
            }
            Ok(Err(e)) => {
                debug!("AST extraction for {language} failed, using text patterns: {e}");
                None
            }
            Err(_) => {
                warn!("AST extraction for {language} panicked, using text patterns");
                None
            }
        }
    }

    /// Delegates to the parser service; `None` without one.
    pub fn detect_language(&self, path: &Path) -> Option<String> {
        self.parser.as_ref()?.detect_language(path)
    }

    pub fn compute_summary(&self, content: &str, language: &str) -> FileSummary {
        let found = self.extract_all(content, language);
        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        let kinds = found
            .top_level
            .iter()
            .map(|s| s.kind)
            .chain(found.nested.iter().map(|s| s.kind))
            .chain(found.internal.iter().map(|s| s.kind));
        for kind in kinds {
            *by_kind.entry(kind.to_string()).or_default() += 1;
        }

        let file_kind = match self.registry.get(language).block_style() {
            BlockStyle::Markdown => StructureKind::Document,
            BlockStyle::Document => StructureKind::Unknown,
            _ => StructureKind::Module,
        };
        let root = found.tree.as_ref().and_then(|t| t.root().map(|r| (t, r)));
        let complexity = self.complexity.calculate(content, file_kind, root);

        FileSummary {
            language: language.to_string(),
            strategy: found.strategy,
            total_lines: content.lines().count(),
            top_level: found.top_level.len(),
            nested: found.nested.len(),
            internal: found.internal.len(),
            by_kind,
            complexity,
        }
    }

    /// Error and missing nodes from the parse tree, or a bracket balance
    /// check when no tree can be built.
    pub fn validate_syntax(&self, content: &str, language: &str) -> SyntaxReport {
        if let Some(parser) = self.parser.as_ref().filter(|p| p.is_language_supported(language)) {
            match catch_unwind(AssertUnwindSafe(|| parser.parse(content, language))) {
                Ok(Ok(tree)) => {
                    let issues: Vec<SyntaxIssue> = tree
                        .error_nodes()
                        .map(|node| {
                            let message = if node.start_byte == node.end_byte {
                                format!("missing `{}`", node.kind)
                            } else {
                                let text = content.get(node.start_byte..node.end_byte).unwrap_or_default();
                                let snippet: String = text.lines().next().unwrap_or_default().chars().take(40).collect();
                                format!("unexpected `{}`", snippet.trim())
                            };
                            SyntaxIssue {
                                line: node.start.row + 1,
                                column: node.start.column + 1,
                                message,
                            }
                        })
                        .collect();
                    return SyntaxReport {
                        valid: issues.is_empty(),
                        strategy: ExtractionStrategy::Ast,
                        issues,
                    };
                }
                Ok(Err(e)) => debug!("Parse for validation failed, checking brackets instead: {e}"),
                Err(_) => warn!("Parse for validation of {language} panicked, checking brackets instead"),
            }
        }

        let rules = self.registry.get(language);
        let issues = if rules.block_style() == BlockStyle::Markdown {
            Vec::new()
        } else {
            let name = rules.name();
            bracket_issues(
                content,
                CHAR_LITERAL_LANGUAGES.contains(&name),
                HASH_COMMENT_LANGUAGES.contains(&name),
            )
        };
        SyntaxReport {
            valid: issues.is_empty(),
            strategy: ExtractionStrategy::Text,
            issues,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Length of a character literal starting at `chars[0]`, if there is one.
fn char_literal_len(chars: &[char]) -> Option<usize> {
    match chars {
        ['\'', '\\', _, '\'', ..] => Some(4),
        ['\'', c, '\'', ..] if *c != '\\' => Some(3),
        _ => None,
    }
}

/// Unbalanced `()[]{}` outside strings and comments.
fn bracket_issues(content: &str, char_literals: bool, hash_comments: bool) -> Vec<SyntaxIssue> {
    let chars: Vec<char> = content.chars().collect();
    let mut issues = Vec::new();
    let mut open: Vec<(char, usize, usize)> = Vec::new();
    let mut state = ScanState::Code;
    let (mut line, mut column) = (1usize, 0usize);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        column += 1;
        let mut skip = 0;

        match state {
            ScanState::Code => match c {
                '/' if next == Some('/') => state = ScanState::LineComment,
                '/' if next == Some('*') => {
                    state = ScanState::BlockComment;
                    skip = 1;
                }
                '#' if hash_comments => state = ScanState::LineComment,
                '"' | '`' => state = ScanState::Str(c),
                '\'' if char_literals => {
                    if let Some(len) = char_literal_len(&chars[i..]) {
                        skip = len - 1;
                    }
                }
                '\'' => state = ScanState::Str(c),
                '(' | '[' | '{' => open.push((c, line, column)),
                ')' | ']' | '}' => match open.pop() {
                    Some((opener, ..)) if closer_for(opener) == c => {}
                    Some((opener, open_line, _)) => issues.push(SyntaxIssue {
                        line,
                        column,
                        message: format!("`{c}` does not close `{opener}` from line {open_line}"),
                    }),
                    None => issues.push(SyntaxIssue {
                        line,
                        column,
                        message: format!("unexpected `{c}`"),
                    }),
                },
                _ => {}
            },
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = ScanState::Code;
                    skip = 1;
                }
            }
            ScanState::Str(quote) => {
                if c == '\\' && next.is_some_and(|n| n != '\n') {
                    skip = 1;
                } else if c == quote || (c == '\n' && quote != '`') {
                    // unterminated quotes end with the line
                    state = ScanState::Code;
                }
            }
        }

        if c == '\n' {
            line += 1;
            column = 0;
        }
        column += skip;
        i += 1 + skip;
    }

    issues.extend(open.into_iter().map(|(opener, line, column)| SyntaxIssue {
        line,
        column,
        message: format!("unclosed `{opener}`"),
    }));
    issues.sort_by_key(|issue| (issue.line, issue.column));
    issues
}

// ── File pipeline ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub file_path: String,
    pub language: String,
    pub strategy: ExtractionStrategy,
    pub chunks: Vec<Chunk>,
    pub relationships: RelationshipAnalysis,
}

/// Extraction, relationship analysis and chunking for one file at a time.
/// Shared immutably, so files can be processed in parallel.
pub struct FileProcessor {
    config: Config,
    orchestrator: ContentOrchestrator,
    analyzer: RelationshipAnalyzer,
    converter: QueryResultConverter,
}

impl FileProcessor {
    pub fn new(config: Config, parser: Option<Arc<dyn ParserService>>) -> Self {
        let registry = Arc::new(LanguageRegistry::builtin());
        let max_depth = config.max_depth.clamp(1, MAX_DEPTH_LIMIT);
        let factory = ChunkFactory::new(&registry, config.validate_required);
        Self {
            orchestrator: ContentOrchestrator::new(parser, registry.clone(), max_depth),
            analyzer: RelationshipAnalyzer::new(registry, config.strength_strategy),
            converter: QueryResultConverter::new(factory, config.include_internal),
            config,
        }
    }

    pub fn with_tree_sitter(config: Config) -> Self {
        Self::new(config, Some(Arc::new(TreeSitterParser::new())))
    }

    pub fn orchestrator(&self) -> &ContentOrchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parser detection first, then the registry's extension table.
    pub fn detect_language(&self, path: &Path) -> String {
        self.orchestrator
            .detect_language(path)
            .or_else(|| self.orchestrator.registry().language_for_path(path))
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn process(&self, content: &str, language: &str, file_path: &str) -> Result<FileAnalysis, ChunkError> {
        let structures = self.orchestrator.extract_all(content, language);
        let relationships = self.analyzer.analyze(&structures, content);

        let mut chunks = self.converter.to_chunks(&structures, file_path)?;
        if let Some(gap) = self.config.merge_max_gap {
            chunks = merge_adjacent(chunks, gap);
        }
        chunks.retain(|c| c.metadata.confidence >= self.config.min_confidence);

        debug!(
            "{file_path}: {} chunks via {} extraction, {} relationships",
            chunks.len(),
            structures.strategy.as_str(),
            relationships.nesting.len() + relationships.references.len() + relationships.dependencies.len()
        );

        Ok(FileAnalysis {
            file_path: file_path.to_string(),
            language: structures.language,
            strategy: structures.strategy,
            chunks,
            relationships,
        })
    }

    pub fn process_path(&self, path: &Path) -> anyhow::Result<FileAnalysis> {
        let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let language = self.detect_language(path);
        let file_path = path.to_string_lossy().replace('\\', "/");
        self.process(&content, &language, &file_path)
            .with_context(|| format!("failed to chunk {file_path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use crate::parser::{ParseError, SyntaxTree};
    use std::fs;
    use tempfile::tempdir;

    const FOO: &str = "function foo() {\n  if (x) {\n    return 1;\n  }\n}";

    struct FailingParser;

    impl ParserService for FailingParser {
        fn parse(&self, _content: &str, language: &str) -> Result<SyntaxTree, ParseError> {
            Err(ParseError::Failed(format!("refusing {language}")))
        }

        fn detect_language(&self, _path: &Path) -> Option<String> {
            None
        }

        fn is_language_supported(&self, _language: &str) -> bool {
            true
        }
    }

    struct PanickingParser;

    impl ParserService for PanickingParser {
        fn parse(&self, _content: &str, _language: &str) -> Result<SyntaxTree, ParseError> {
            panic!("grammar exploded")
        }

        fn detect_language(&self, _path: &Path) -> Option<String> {
            None
        }

        fn is_language_supported(&self, _language: &str) -> bool {
            true
        }
    }

    fn orchestrator(parser: Option<Arc<dyn ParserService>>) -> ContentOrchestrator {
        ContentOrchestrator::new(parser, Arc::new(LanguageRegistry::builtin()), 10)
    }

    fn tree_sitter() -> ContentOrchestrator {
        orchestrator(Some(Arc::new(TreeSitterParser::new())))
    }

    #[test]
    fn test_text_path_without_parser() {
        let found = orchestrator(None).extract_all(FOO, "javascript");
        assert_eq!(found.strategy, ExtractionStrategy::Text);
        assert!(found.tree.is_none());
        assert_eq!(found.top_level.len(), 1);
        assert_eq!(found.top_level[0].name, "foo");
        assert_eq!(found.top_level[0].location, Location::new(1, 5));
    }

    #[test]
    fn test_ast_path_attaches_tree() {
        let found = tree_sitter().extract_all(FOO, "javascript");
        assert_eq!(found.strategy, ExtractionStrategy::Ast);
        assert!(found.tree.is_some());
        assert_eq!(found.top_level[0].name, "foo");
        assert_eq!(found.top_level[0].location, Location::new(1, 5));
        assert!(found.top_level[0].node.is_some());
    }

    #[test]
    fn test_unsupported_language_uses_text() {
        let source = "public class Greeter {\n    void hi() {\n    }\n}\n";
        let found = tree_sitter().extract_all(source, "java");
        assert_eq!(found.strategy, ExtractionStrategy::Text);
        assert_eq!(found.top_level[0].kind, StructureKind::Class);
    }

    #[test]
    fn test_failures_fall_back_to_text_output() {
        let expected = orchestrator(None).extract_all(FOO, "javascript");
        for parser in [
            Arc::new(FailingParser) as Arc<dyn ParserService>,
            Arc::new(PanickingParser) as Arc<dyn ParserService>,
        ] {
            let found = orchestrator(Some(parser)).extract_all(FOO, "javascript");
            assert_eq!(found.strategy, ExtractionStrategy::Text);
            assert_eq!(found.top_level, expected.top_level);
            assert_eq!(found.nested, expected.nested);
            assert_eq!(found.internal, expected.internal);
        }
    }

    #[test]
    fn test_empty_ast_result_falls_back() {
        let found = tree_sitter().extract_all("// nothing here\n", "javascript");
        assert_eq!(found.strategy, ExtractionStrategy::Text);
        assert!(found.is_empty());
    }

    #[test]
    fn test_tier_helpers_agree_with_extract_all() {
        let orchestrator = tree_sitter();
        let all = orchestrator.extract_all(FOO, "javascript");
        assert_eq!(orchestrator.extract_structures(FOO, "javascript"), all.top_level);
        assert_eq!(orchestrator.extract_nested_structures(FOO, "javascript"), all.nested);
        assert_eq!(orchestrator.extract_internal_structures(FOO, "javascript"), all.internal);
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(orchestrator(None).detect_language(Path::new("a.rs")), None);
        assert_eq!(tree_sitter().detect_language(Path::new("src/a.rs")), Some("rust".to_string()));
        assert_eq!(tree_sitter().detect_language(Path::new("Makefile")), None);
    }

    #[test]
    fn test_compute_summary() {
        let summary = orchestrator(None).compute_summary(FOO, "javascript");
        assert_eq!(summary.strategy, ExtractionStrategy::Text);
        assert_eq!(summary.total_lines, 5);
        assert_eq!(summary.top_level, 1);
        assert_eq!(summary.by_kind["function"], 1);
        assert_eq!(summary.by_kind["control_flow"], 1);
        assert_eq!(summary.complexity.score, 2);
    }

    #[test]
    fn test_validate_syntax_with_tree() {
        let orchestrator = tree_sitter();
        let ok = orchestrator.validate_syntax("fn main() {}\n", "rust");
        assert!(ok.valid);
        assert_eq!(ok.strategy, ExtractionStrategy::Ast);

        let broken = orchestrator.validate_syntax("fn main() {\n    let x = ;\n", "rust");
        assert!(!broken.valid);
        assert!(!broken.issues.is_empty());
    }

    #[test]
    fn test_validate_syntax_bracket_heuristic() {
        let orchestrator = orchestrator(None);
        let ok = orchestrator.validate_syntax("const s = '(';\n/* { */\nfoo([1, 2]);\n", "javascript");
        assert!(ok.valid, "{:?}", ok.issues);
        assert_eq!(ok.strategy, ExtractionStrategy::Text);

        let report = orchestrator.validate_syntax("function f() {\n  (1 }\n", "javascript");
        assert!(!report.valid);
        let lines: Vec<(usize, &str)> = report
            .issues
            .iter()
            .map(|i| (i.line, i.message.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![(1, "unclosed `{`"), (2, "`}` does not close `(` from line 2")]
        );

        let unclosed = orchestrator.validate_syntax("def f(:\n    # )\n    pass\n", "python");
        assert_eq!(unclosed.issues.len(), 1);
        assert_eq!(unclosed.issues[0].message, "unclosed `(`");

        let rust = orchestrator.validate_syntax("fn f<'a>(c: char) -> bool { c == '{' }\n", "rust");
        assert!(rust.valid, "{:?}", rust.issues);

        assert!(orchestrator.validate_syntax("# Notes :)\n", "markdown").valid);
    }

    #[test]
    fn test_validate_syntax_survives_panicking_parser() {
        let orchestrator = orchestrator(Some(Arc::new(PanickingParser)));
        let ok = orchestrator.validate_syntax("function f() {}", "javascript");
        assert!(ok.valid);
        assert_eq!(ok.strategy, ExtractionStrategy::Text);

        let broken = orchestrator.validate_syntax("function f() {\n", "javascript");
        assert!(!broken.valid);
        assert_eq!(broken.strategy, ExtractionStrategy::Text);
    }

    #[test]
    fn test_file_processor_pipeline() {
        let processor = FileProcessor::new(Config::default(), None);
        let analysis = processor.process(FOO, "javascript", "src/foo.js").unwrap();
        assert_eq!(analysis.strategy, ExtractionStrategy::Text);
        assert_eq!(analysis.chunks[0].metadata.name.as_deref(), Some("foo"));
        assert_eq!(analysis.chunks[0].metadata.complexity, Some(2));
        assert!(analysis.chunks.iter().all(|c| c.metadata.file_path == "src/foo.js"));

        let strict = FileProcessor::new(
            Config {
                min_confidence: 0.85,
                include_internal: false,
                ..Config::default()
            },
            None,
        );
        let kept = strict.process(FOO, "javascript", "src/foo.js").unwrap();
        assert!(kept.chunks.iter().all(|c| c.metadata.confidence >= 0.85));
    }

    #[test]
    fn test_process_path_detects_language() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shapes.py");
        fs::write(&path, "class Shape:\n    def area(self):\n        return 0\n").unwrap();

        let processor = FileProcessor::with_tree_sitter(Config::default());
        let analysis = processor.process_path(&path).unwrap();
        assert_eq!(analysis.language, "python");
        assert_eq!(analysis.strategy, ExtractionStrategy::Ast);
        assert!(analysis.chunks.iter().any(|c| c.metadata.name.as_deref() == Some("area")));

        assert_eq!(processor.detect_language(Path::new("notes.md")), "markdown");
        assert_eq!(processor.detect_language(Path::new("data.bin")), "unknown");
        assert!(processor.process_path(&dir.path().join("missing.py")).is_err());
    }
}
