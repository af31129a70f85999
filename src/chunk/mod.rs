//! Index-ready chunks: one per structure, with a stable id and a content hash.
pub mod converter;
pub mod factory;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{Location, StructureKind};

pub use converter::{ChunkStatistics, QueryResultConverter};
pub use factory::{ChunkFactory, ChunkParams};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkError {
    #[error("invalid chunk input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub id: String,
    pub kind: StructureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub file_path: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub strategy: String,
    pub confidence: f32,
    #[serde(default)]
    pub merged: bool,
    /// Free-form attributes such as `parent`, `level` or `importance`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn location(&self) -> Location {
        Location::new(self.metadata.start_line, self.metadata.end_line)
    }

    pub fn line_count(&self) -> usize {
        self.location().line_count()
    }

    /// Recomputes the id and content hash after a field they depend on changed.
    pub(crate) fn refresh_identity(&mut self) {
        self.metadata.id = generate_chunk_id(
            self.metadata.kind,
            self.metadata.name.as_deref(),
            self.metadata.start_line,
            &self.metadata.file_path,
        );
        self.metadata.hash = Some(content_hash(&self.content));
    }
}

/// Hex MD5 of `{kind}:{name}:{start_line}:{file_path}`; a missing name is empty.
pub fn generate_chunk_id(kind: StructureKind, name: Option<&str>, start_line: usize, file_path: &str) -> String {
    let input = format!("{}:{}:{}:{}", kind, name.unwrap_or_default(), start_line, file_path);
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Hex SHA-256 of the content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_is_stable_and_path_sensitive() {
        let a = generate_chunk_id(StructureKind::Function, Some("foo"), 1, "a.js");
        let b = generate_chunk_id(StructureKind::Function, Some("foo"), 1, "a.js");
        let c = generate_chunk_id(StructureKind::Function, Some("foo"), 1, "b.js");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
        assert_eq!(a, format!("{:x}", md5::compute(b"function:foo:1:a.js")));
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_metadata_extra_is_flattened() {
        let mut extra = serde_json::Map::new();
        extra.insert("parent".into(), serde_json::json!("Store"));
        let chunk = Chunk {
            content: "get() {}".into(),
            metadata: ChunkMetadata {
                id: "x".into(),
                kind: StructureKind::Method,
                name: Some("get".into()),
                start_line: 2,
                end_line: 4,
                file_path: "a.js".into(),
                language: "javascript".into(),
                complexity: None,
                hash: None,
                strategy: "ast".into(),
                confidence: 0.95,
                merged: false,
                extra,
            },
        };
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["metadata"]["parent"], "Store");
        assert_eq!(value["metadata"]["kind"], "method");
        assert!(value["metadata"].get("hash").is_none());

        let back: Chunk = serde_json::from_value(value).unwrap();
        assert_eq!(back, chunk);
        assert_eq!(back.line_count(), 3);
    }
}
