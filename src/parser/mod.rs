//! Parser service seam and the arena syntax tree the extractors consume.
pub mod grammar;
pub mod tree;
pub mod walker;

use std::path::Path;

use thiserror::Error;

pub use grammar::TreeSitterParser;
pub use tree::{NodeId, Point, SyntaxNode, SyntaxTree};

/// Errors a parser service can report. Any of them means "no tree".
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("grammar setup failed: {0}")]
    Grammar(String),

    #[error("parse failed: {0}")]
    Failed(String),
}

/// Turns raw text into a syntax tree and detects languages.
///
/// Implementations must be `Send + Sync`; callers may invoke them from several
/// worker threads at once. A failure is always an `Err`, never a partially
/// built tree.
pub trait ParserService: Send + Sync {
    fn parse(&self, content: &str, language: &str) -> Result<SyntaxTree, ParseError>;

    fn detect_language(&self, path: &Path) -> Option<String>;

    fn is_language_supported(&self, language: &str) -> bool;
}
