//! Structure extraction: language rules, the tree and text extractors, the
//! orchestrator that picks between them, and the analyses built on top.
pub mod code_parser;
pub mod complexity;
pub mod core;
pub mod imports;
pub mod languages;
pub mod lines;
pub mod markdown;
pub mod relations;
pub mod text_patterns;
