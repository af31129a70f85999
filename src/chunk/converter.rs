//! Chunk list operations and conversion of extracted structures into chunks.
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use super::factory::{ChunkFactory, ChunkParams, check_required};
use super::{Chunk, ChunkError, content_hash};
use crate::models::{ExtractedStructures, StructureKind};

/// Sorts, then folds each chunk into its predecessor in the same file when
/// `next.start - prev.end <= max_gap`. Later metadata wins except for the
/// start line, the widest end, the highest complexity and the lowest
/// confidence.
pub fn merge_adjacent(mut chunks: Vec<Chunk>, max_gap: usize) -> Vec<Chunk> {
    sort_by_location(&mut chunks);

    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if let Some(last) = merged.last_mut()
            && last.metadata.file_path == chunk.metadata.file_path
            && chunk.metadata.start_line <= last.metadata.end_line.saturating_add(max_gap)
        {
            absorb(last, chunk);
            continue;
        }
        merged.push(chunk);
    }
    merged
}

fn absorb(into: &mut Chunk, next: Chunk) {
    let Chunk { content, metadata } = next;
    into.content.push('\n');
    into.content.push_str(&content);

    let acc = &mut into.metadata;
    acc.kind = metadata.kind;
    if metadata.name.is_some() {
        acc.name = metadata.name;
    }
    acc.language = metadata.language;
    acc.strategy = metadata.strategy;
    acc.end_line = acc.end_line.max(metadata.end_line);
    acc.complexity = acc.complexity.max(metadata.complexity);
    acc.confidence = acc.confidence.min(metadata.confidence);
    acc.merged = true;
    acc.extra.extend(metadata.extra);
    into.refresh_identity();
}

pub fn filter_by_strategy(chunks: Vec<Chunk>, strategy: &str) -> Vec<Chunk> {
    chunks
        .into_iter()
        .filter(|c| c.metadata.strategy == strategy)
        .collect()
}

/// Orders by file, then start line, end line and id.
pub fn sort_by_location(chunks: &mut [Chunk]) {
    chunks.sort_by(|a, b| {
        (&a.metadata.file_path, a.metadata.start_line, a.metadata.end_line, &a.metadata.id).cmp(&(
            &b.metadata.file_path,
            b.metadata.start_line,
            b.metadata.end_line,
            &b.metadata.id,
        ))
    });
}

pub fn validate(chunk: &Chunk) -> Result<(), ChunkError> {
    let meta = &chunk.metadata;
    check_required(&chunk.content, meta.start_line, meta.end_line, &meta.language, meta.kind)?;
    if meta.id.is_empty() {
        return Err(ChunkError::InvalidInput("id is empty".into()));
    }
    if !(0.0..=1.0).contains(&meta.confidence) {
        return Err(ChunkError::InvalidInput(format!(
            "confidence {} is outside [0, 1]",
            meta.confidence
        )));
    }
    Ok(())
}

/// Clamps confidence, trims the content and moves the start line past any
/// blank lines that were trimmed off the front.
pub fn normalize(mut chunk: Chunk) -> Chunk {
    let trimmed_start = chunk.content.trim_start();
    let leading = chunk.content[..chunk.content.len() - trimmed_start.len()]
        .matches('\n')
        .count();
    chunk.content = chunk.content.trim().to_string();

    let meta = &mut chunk.metadata;
    meta.confidence = meta.confidence.clamp(0.0, 1.0);
    meta.start_line = (meta.start_line + leading).min(meta.end_line);
    meta.hash = Some(content_hash(&chunk.content));
    chunk
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkStatistics {
    pub total_chunks: usize,
    pub by_kind: BTreeMap<String, usize>,
    /// Mean content length in characters.
    pub average_size: f64,
    pub average_lines: f64,
    pub total_lines: usize,
}

pub fn statistics(chunks: &[Chunk]) -> ChunkStatistics {
    if chunks.is_empty() {
        return ChunkStatistics::default();
    }
    let mut stats = ChunkStatistics {
        total_chunks: chunks.len(),
        ..ChunkStatistics::default()
    };
    let mut total_size = 0usize;
    for chunk in chunks {
        *stats.by_kind.entry(chunk.metadata.kind.to_string()).or_default() += 1;
        total_size += chunk.content.chars().count();
        stats.total_lines += chunk.line_count();
    }
    stats.average_size = total_size as f64 / chunks.len() as f64;
    stats.average_lines = stats.total_lines as f64 / chunks.len() as f64;
    stats
}

/// Turns one file's extracted structures into chunks.
pub struct QueryResultConverter {
    factory: ChunkFactory,
    include_internal: bool,
}

impl QueryResultConverter {
    pub fn new(factory: ChunkFactory, include_internal: bool) -> Self {
        Self {
            factory,
            include_internal,
        }
    }

    /// Top-level, nested and (optionally) internal structures in that order.
    /// Unnamed internals are named `{kind}_{line}`, with an ordinal suffix
    /// after the first on a line. Blank structures and repeated ids are skipped.
    pub fn to_chunks(&self, structures: &ExtractedStructures, file_path: &str) -> Result<Vec<Chunk>, ChunkError> {
        let strategy = structures.strategy.as_str();
        let tree = structures.tree.as_ref();
        let calculator = self.factory.calculator();
        let mut params = Vec::new();

        for top in &structures.top_level {
            let complexity = calculator.calculate(&top.content, top.kind, tree.zip(top.node)).score;
            params.push(
                ChunkParams::new(&top.content, top.location.start_line, top.location.end_line, &structures.language, top.kind)
                    .name(&top.name)
                    .confidence(top.metadata.confidence)
                    .complexity(complexity)
                    .extra("tier", "top_level"),
            );
        }

        for nested in &structures.nested {
            let complexity = calculator.calculate(&nested.content, nested.kind, tree.zip(nested.node)).score;
            params.push(
                ChunkParams::new(
                    &nested.content,
                    nested.location.start_line,
                    nested.location.end_line,
                    &structures.language,
                    nested.kind,
                )
                .name(&nested.name)
                .confidence(nested.metadata.confidence)
                .complexity(complexity)
                .extra("tier", "nested")
                .extra("parent", nested.parent.name.as_str())
                .extra("parent_kind", nested.parent.kind.as_str())
                .extra("level", nested.level),
            );
        }

        if self.include_internal {
            // unnamed statements on one line are told apart by ordinal
            let mut unnamed: HashMap<(StructureKind, usize), usize> = HashMap::new();
            for internal in &structures.internal {
                let mut param = ChunkParams::new(
                    &internal.content,
                    internal.location.start_line,
                    internal.location.end_line,
                    &structures.language,
                    internal.kind,
                )
                .confidence(internal.metadata.confidence)
                .extra("tier", "internal")
                .extra("parent", internal.parent.name.as_str())
                .extra("parent_kind", internal.parent.kind.as_str())
                .extra("importance", internal.importance.as_str());
                param = match &internal.name {
                    Some(name) => param.name(name),
                    None => {
                        let line = internal.location.start_line;
                        let ordinal = unnamed.entry((internal.kind, line)).or_default();
                        *ordinal += 1;
                        match *ordinal {
                            1 => param.name(format!("{}_{line}", internal.kind)),
                            n => param.name(format!("{}_{line}_{n}", internal.kind)),
                        }
                    }
                };
                params.push(param);
            }
        }

        let mut seen = HashSet::new();
        let mut chunks = Vec::with_capacity(params.len());
        for param in params {
            if param.content.trim().is_empty() || param.kind == StructureKind::Unknown {
                continue;
            }
            let chunk = self
                .factory
                .create(param.file_path(file_path).strategy(strategy))?;
            if !seen.insert(chunk.metadata.id.clone()) {
                debug!("Skipping duplicate chunk {} in {file_path}", chunk.metadata.id);
                continue;
            }
            chunks.push(chunk);
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::languages::LanguageRegistry;
    use crate::indexer::text_patterns::TextExtractor;
    use crate::models::{Importance, InternalMetadata, InternalStructure, Location, StructureRef};
    use std::sync::Arc;

    fn factory() -> ChunkFactory {
        ChunkFactory::new(&LanguageRegistry::builtin(), true)
    }

    fn chunk(name: &str, start: usize, end: usize, file: &str) -> Chunk {
        let content = (start..=end).map(|l| format!("line {l}")).collect::<Vec<_>>().join("\n");
        factory()
            .create(
                ChunkParams::new(content, start, end, "javascript", StructureKind::Function)
                    .name(name)
                    .file_path(file),
            )
            .unwrap()
    }

    #[test]
    fn test_merge_respects_gap() {
        let chunks = vec![chunk("b", 7, 9, "a.js"), chunk("a", 1, 5, "a.js")];

        let separate = merge_adjacent(chunks.clone(), 1);
        assert_eq!(separate.len(), 2);
        assert!(separate.iter().all(|c| !c.metadata.merged));

        let merged = merge_adjacent(chunks, 2);
        assert_eq!(merged.len(), 1);
        let meta = &merged[0].metadata;
        assert_eq!((meta.start_line, meta.end_line), (1, 9));
        assert!(meta.merged);
        assert_eq!(meta.name.as_deref(), Some("b"));
        assert!(merged[0].content.starts_with("line 1\n"));
        assert_eq!(meta.hash.as_deref(), Some(content_hash(&merged[0].content).as_str()));
    }

    #[test]
    fn test_merge_with_unbounded_gap() {
        let merged = merge_adjacent(vec![chunk("a", 1, 5, "a.js"), chunk("b", 7, 9, "a.js")], usize::MAX);
        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].metadata.start_line, merged[0].metadata.end_line), (1, 9));
    }

    #[test]
    fn test_merge_keeps_files_apart() {
        let merged = merge_adjacent(vec![chunk("a", 1, 2, "a.js"), chunk("b", 3, 4, "b.js")], 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_is_associative() {
        let (a, b, c) = (chunk("a", 1, 2, "f.js"), chunk("b", 3, 4, "f.js"), chunk("c", 5, 6, "f.js"));
        let left = merge_adjacent(vec![merge_adjacent(vec![a.clone(), b.clone()], 1).remove(0), c.clone()], 1);
        let right = merge_adjacent(vec![a, merge_adjacent(vec![b, c], 1).remove(0)], 1);
        assert_eq!(left, right);
    }

    #[test]
    fn test_normalize_trims_and_shifts() {
        let mut raw = chunk("a", 1, 5, "a.js");
        raw.content = "\n\n  body\n  more  \n".to_string();
        raw.metadata.confidence = 3.0;
        let normalized = normalize(raw);
        assert_eq!(normalized.content, "body\n  more");
        assert_eq!(normalized.metadata.start_line, 3);
        assert_eq!(normalized.metadata.confidence, 1.0);
        assert_eq!(
            normalized.metadata.hash.as_deref(),
            Some(content_hash("body\n  more").as_str())
        );
        assert!(validate(&normalized).is_ok());
    }

    #[test]
    fn test_filter_sort_and_statistics() {
        let mut chunks = vec![chunk("b", 4, 6, "a.js"), chunk("a", 1, 2, "a.js")];
        chunks[1].metadata.strategy = "ast".to_string();
        sort_by_location(&mut chunks);
        assert_eq!(chunks[0].metadata.name.as_deref(), Some("a"));

        assert_eq!(filter_by_strategy(chunks.clone(), "ast").len(), 1);

        let stats = statistics(&chunks);
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.by_kind["function"], 2);
        assert_eq!(stats.total_lines, 5);
        assert_eq!(stats.average_lines, 2.5);
        assert_eq!(statistics(&[]), ChunkStatistics::default());
    }

    #[test]
    fn test_converter_tiers() {
        let source = "class Store {\n  get(key) {\n    if (key) {\n      return 1;\n    }\n  }\n}\n";
        let structures = TextExtractor::new(Arc::new(LanguageRegistry::builtin())).extract(source, "javascript");

        let chunks = QueryResultConverter::new(factory(), true)
            .to_chunks(&structures, "store.js")
            .unwrap();
        let tiers: Vec<(&str, &str)> = chunks
            .iter()
            .map(|c| (c.metadata.kind.as_str(), c.metadata.extra["tier"].as_str().unwrap_or_default()))
            .collect();
        assert_eq!(
            tiers,
            vec![
                ("class", "top_level"),
                ("method", "nested"),
                ("control_flow", "internal"),
                ("return", "internal"),
            ]
        );
        assert_eq!(chunks[1].metadata.extra["parent"], "Store");
        assert_eq!(chunks[1].metadata.extra["level"], 0);
        assert_eq!(chunks[2].metadata.extra["importance"], "medium");
        assert!(chunks.iter().all(|c| c.metadata.strategy == "text" && c.metadata.file_path == "store.js"));

        let without_internal = QueryResultConverter::new(factory(), false)
            .to_chunks(&structures, "store.js")
            .unwrap();
        assert_eq!(without_internal.len(), 2);
    }

    #[test]
    fn test_unnamed_internals_on_one_line_are_all_kept() {
        let source = "function a(x) { if (x) { return 1; } return 2; }";
        let parent = StructureRef {
            kind: StructureKind::Function,
            name: "a".to_string(),
            location: Location::new(1, 1),
            node: None,
        };
        let internal = |kind, content: &str| InternalStructure {
            kind,
            name: None,
            content: content.to_string(),
            location: Location::new(1, 1),
            parent: parent.clone(),
            importance: Importance::High,
            metadata: InternalMetadata { confidence: 0.8 },
        };
        let mut structures = TextExtractor::new(Arc::new(LanguageRegistry::builtin())).extract(source, "javascript");
        structures.internal = vec![
            internal(StructureKind::ControlFlow, "if (x) { return 1; }"),
            internal(StructureKind::Return, "return 1;"),
            internal(StructureKind::Return, "return 2;"),
        ];

        let chunks = QueryResultConverter::new(factory(), true)
            .to_chunks(&structures, "a.js")
            .unwrap();
        let internals: Vec<_> = chunks
            .iter()
            .filter(|c| c.metadata.extra["tier"] == "internal")
            .map(|c| c.metadata.name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(internals, vec!["control_flow_1", "return_1", "return_1_2"]);
        assert_eq!(chunks.len(), structures.top_level.len() + structures.nested.len() + 3);
    }
}
