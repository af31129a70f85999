//! Structure, relationship and complexity records shared by every stage.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::{NodeId, SyntaxTree};

/// 1-based, inclusive line span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub start_line: usize,
    pub end_line: usize,
}

impl Location {
    /// Builds a location, clamping it into the `1 <= start <= end` range.
    pub fn new(start_line: usize, end_line: usize) -> Self {
        let start_line = start_line.max(1);
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// Closed set of structure kinds. `Unknown` is the catch-all for strings that
/// do not name a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Enum,
    Trait,
    Impl,
    Type,
    Module,
    Namespace,
    Import,
    Export,
    Variable,
    Constant,
    ControlFlow,
    Return,
    Throw,
    Document,
    Section,
    Unknown,
}

impl StructureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureKind::Function => "function",
            StructureKind::Method => "method",
            StructureKind::Class => "class",
            StructureKind::Interface => "interface",
            StructureKind::Struct => "struct",
            StructureKind::Enum => "enum",
            StructureKind::Trait => "trait",
            StructureKind::Impl => "impl",
            StructureKind::Type => "type",
            StructureKind::Module => "module",
            StructureKind::Namespace => "namespace",
            StructureKind::Import => "import",
            StructureKind::Export => "export",
            StructureKind::Variable => "variable",
            StructureKind::Constant => "constant",
            StructureKind::ControlFlow => "control_flow",
            StructureKind::Return => "return",
            StructureKind::Throw => "throw",
            StructureKind::Document => "document",
            StructureKind::Section => "section",
            StructureKind::Unknown => "unknown",
        }
    }

    /// Parses the snake_case name; anything unrecognized is `Unknown`.
    pub fn from_name(s: &str) -> Self {
        match s {
            "function" => StructureKind::Function,
            "method" => StructureKind::Method,
            "class" => StructureKind::Class,
            "interface" => StructureKind::Interface,
            "struct" => StructureKind::Struct,
            "enum" => StructureKind::Enum,
            "trait" => StructureKind::Trait,
            "impl" => StructureKind::Impl,
            "type" => StructureKind::Type,
            "module" => StructureKind::Module,
            "namespace" => StructureKind::Namespace,
            "import" => StructureKind::Import,
            "export" => StructureKind::Export,
            "variable" => StructureKind::Variable,
            "constant" => StructureKind::Constant,
            "control_flow" => StructureKind::ControlFlow,
            "return" => StructureKind::Return,
            "throw" => StructureKind::Throw,
            "document" => StructureKind::Document,
            "section" => StructureKind::Section,
            _ => StructureKind::Unknown,
        }
    }

    pub fn is_function_like(&self) -> bool {
        matches!(self, StructureKind::Function | StructureKind::Method)
    }

    /// Kinds whose bodies are searched for nested structures.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            StructureKind::Class
                | StructureKind::Interface
                | StructureKind::Struct
                | StructureKind::Enum
                | StructureKind::Trait
                | StructureKind::Impl
                | StructureKind::Module
                | StructureKind::Namespace
        ) || self.is_function_like()
    }

    /// Functions declared directly inside these kinds are methods.
    pub fn owns_methods(&self) -> bool {
        matches!(
            self,
            StructureKind::Class
                | StructureKind::Interface
                | StructureKind::Struct
                | StructureKind::Enum
                | StructureKind::Trait
                | StructureKind::Impl
        )
    }

    /// Kinds that can be the target of a type reference or heritage clause.
    pub fn is_type_like(&self) -> bool {
        matches!(
            self,
            StructureKind::Class
                | StructureKind::Interface
                | StructureKind::Struct
                | StructureKind::Enum
                | StructureKind::Trait
                | StructureKind::Type
        )
    }

    pub fn is_prose(&self) -> bool {
        matches!(self, StructureKind::Document | StructureKind::Section)
    }

    pub fn is_code(&self) -> bool {
        self.is_function_like()
            || self.is_type_like()
            || matches!(
                self,
                StructureKind::Impl
                    | StructureKind::Module
                    | StructureKind::Namespace
                    | StructureKind::ControlFlow
            )
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Structures came from a syntax tree.
    Ast,
    /// Structures came from the regex fallback.
    Text,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::Ast => "ast",
            ExtractionStrategy::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureMetadata {
    pub language: String,
    pub confidence: f32,
}

/// Identity of a structure, cheap enough to copy into parent pointers and
/// relationship endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureRef {
    pub kind: StructureKind,
    pub name: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLevelStructure {
    pub kind: StructureKind,
    pub name: String,
    pub content: String,
    pub location: Location,
    /// Arena index into the tree the structure was extracted from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    pub metadata: StructureMetadata,
}

impl TopLevelStructure {
    pub fn to_ref(&self) -> StructureRef {
        StructureRef {
            kind: self.kind,
            name: self.name.clone(),
            location: self.location,
            node: self.node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedStructure {
    pub kind: StructureKind,
    pub name: String,
    pub content: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    pub metadata: StructureMetadata,
    pub parent: StructureRef,
    /// 0 for direct members of a top-level structure.
    pub level: usize,
}

impl NestedStructure {
    pub fn to_ref(&self) -> StructureRef {
        StructureRef {
            kind: self.kind,
            name: self.name.clone(),
            location: self.location,
            node: self.node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalMetadata {
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalStructure {
    pub kind: StructureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    pub location: Location,
    pub parent: StructureRef,
    pub importance: Importance,
    pub metadata: InternalMetadata,
}

/// Everything one orchestrated extraction produced. Owns the tree its node
/// ids point into.
#[derive(Debug, Clone)]
pub struct ExtractedStructures {
    pub language: String,
    pub strategy: ExtractionStrategy,
    pub top_level: Vec<TopLevelStructure>,
    pub nested: Vec<NestedStructure>,
    pub internal: Vec<InternalStructure>,
    pub tree: Option<SyntaxTree>,
}

impl ExtractedStructures {
    pub fn empty(language: &str, strategy: ExtractionStrategy) -> Self {
        Self {
            language: language.to_string(),
            strategy,
            top_level: Vec::new(),
            nested: Vec::new(),
            internal: Vec::new(),
            tree: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top_level.is_empty() && self.nested.is_empty() && self.internal.is_empty()
    }

    /// Top-level and nested structures as refs, in extraction order.
    pub fn named_refs(&self) -> Vec<StructureRef> {
        self.top_level
            .iter()
            .map(TopLevelStructure::to_ref)
            .chain(self.nested.iter().map(NestedStructure::to_ref))
            .collect()
    }
}

// ── Relationships ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingKind {
    Contains,
    Extends,
    Implements,
    Uses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestingRelationship {
    pub parent: StructureRef,
    pub child: StructureRef,
    pub kind: NestingKind,
    pub strength: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    FunctionCall,
    VariableReference,
    TypeReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeReference {
    pub from: StructureRef,
    /// `None` when the target is not declared in this file.
    pub to: Option<StructureRef>,
    pub kind: ReferenceKind,
    pub name: String,
    pub line: usize,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Import,
    Inheritance,
    Implementation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeDependency {
    /// `None` when no structure encloses the dependency's line.
    pub from: Option<StructureRef>,
    pub kind: DependencyKind,
    /// Free-text name as written in the source.
    pub target: String,
    pub line: usize,
    pub confidence: f32,
}

// ── Complexity ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityResult {
    pub score: u32,
    pub analysis: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_clamps() {
        let loc = Location::new(0, 0);
        assert_eq!(loc, Location { start_line: 1, end_line: 1 });
        let loc = Location::new(5, 3);
        assert_eq!(loc.end_line, 5);
        assert_eq!(Location::new(2, 6).line_count(), 5);
    }

    #[test]
    fn test_kind_name_roundtrip() {
        for kind in [
            StructureKind::Function,
            StructureKind::ControlFlow,
            StructureKind::Section,
            StructureKind::Impl,
        ] {
            assert_eq!(StructureKind::from_name(kind.as_str()), kind);
        }
        assert_eq!(StructureKind::from_name("widget"), StructureKind::Unknown);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&StructureKind::ControlFlow).unwrap();
        assert_eq!(json, "\"control_flow\"");
    }
}
