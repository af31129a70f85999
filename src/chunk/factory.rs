use serde_json::{Map, Value};

use super::{Chunk, ChunkError, ChunkMetadata, content_hash, generate_chunk_id};
use crate::indexer::complexity::ComplexityCalculator;
use crate::indexer::languages::LanguageRegistry;
use crate::models::StructureKind;

/// Inputs for one chunk. Optional fields are filled in by the factory.
#[derive(Debug, Clone)]
pub struct ChunkParams {
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub language: String,
    pub kind: StructureKind,
    pub name: Option<String>,
    pub file_path: String,
    pub strategy: Option<String>,
    pub confidence: f32,
    pub complexity: Option<u32>,
    pub hash: Option<String>,
    pub extra: Map<String, Value>,
}

impl ChunkParams {
    pub fn new(
        content: impl Into<String>,
        start_line: usize,
        end_line: usize,
        language: impl Into<String>,
        kind: StructureKind,
    ) -> Self {
        Self {
            content: content.into(),
            start_line,
            end_line,
            language: language.into(),
            kind,
            name: None,
            file_path: String::new(),
            strategy: None,
            confidence: 1.0,
            complexity: None,
            hash: None,
            extra: Map::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn complexity(mut self, complexity: u32) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Checks shared by chunk creation and chunk validation.
pub(crate) fn check_required(
    content: &str,
    start_line: usize,
    end_line: usize,
    language: &str,
    kind: StructureKind,
) -> Result<(), ChunkError> {
    if content.trim().is_empty() {
        return Err(ChunkError::InvalidInput("content is empty".into()));
    }
    if start_line < 1 {
        return Err(ChunkError::InvalidInput(format!("start line {start_line} is before line 1")));
    }
    if end_line < start_line {
        return Err(ChunkError::InvalidInput(format!(
            "end line {end_line} is before start line {start_line}"
        )));
    }
    if language.trim().is_empty() {
        return Err(ChunkError::InvalidInput("language is empty".into()));
    }
    if kind == StructureKind::Unknown {
        return Err(ChunkError::InvalidInput("kind is unknown".into()));
    }
    Ok(())
}

/// Strategy recorded when the caller does not name one.
const DEFAULT_STRATEGY: &str = "text";

pub struct ChunkFactory {
    validate_required: bool,
    calculator: ComplexityCalculator,
}

impl ChunkFactory {
    pub fn new(registry: &LanguageRegistry, validate_required: bool) -> Self {
        Self {
            validate_required,
            calculator: ComplexityCalculator::new(registry),
        }
    }

    pub fn calculator(&self) -> &ComplexityCalculator {
        &self.calculator
    }

    /// Builds a chunk. With validation on, bad inputs are rejected; with it
    /// off, line numbers are clamped into `1 <= start <= end`.
    pub fn create(&self, params: ChunkParams) -> Result<Chunk, ChunkError> {
        let ChunkParams {
            content,
            mut start_line,
            mut end_line,
            language,
            kind,
            name,
            file_path,
            strategy,
            confidence,
            complexity,
            hash,
            extra,
        } = params;

        if self.validate_required {
            check_required(&content, start_line, end_line, &language, kind)?;
        } else {
            start_line = start_line.max(1);
            end_line = end_line.max(start_line);
        }

        let complexity = complexity.unwrap_or_else(|| self.calculator.calculate(&content, kind, None).score);
        let hash = hash.unwrap_or_else(|| content_hash(&content));
        let id = generate_chunk_id(kind, name.as_deref(), start_line, &file_path);

        Ok(Chunk {
            metadata: ChunkMetadata {
                id,
                kind,
                name,
                start_line,
                end_line,
                file_path,
                language,
                complexity: Some(complexity),
                hash: Some(hash),
                strategy: strategy.unwrap_or_else(|| DEFAULT_STRATEGY.to_string()),
                confidence: confidence.clamp(0.0, 1.0),
                merged: false,
                extra,
            },
            content,
        })
    }
}
