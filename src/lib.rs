//! # codeshape: multi-language code structure extraction
//!
//! Turns a source file into structures (top-level, nested and internal),
//! relationships between them, complexity scores and index-ready chunks.
//! A syntax tree is used when a grammar is available; regex tables take over
//! otherwise, so every input yields a result.
//!
//! ## Architecture
//!
//! - **[`parser`]**: Parser service seam, tree-sitter grammars and the arena syntax tree
//! - **[`indexer`]**: Language registry, AST and text extractors, orchestration, relationships, complexity
//! - **[`chunk`]**: Chunk creation, validation, merging and structure-to-chunk conversion
//! - **[`models`]**: Structure, relationship and complexity records
//! - **[`config`]**: Extraction settings loaded from JSON

pub mod chunk;
pub mod config;
pub mod indexer;
pub mod models;
pub mod parser;
