//! Node-type registry.
//!
//! Each supported language is described by a [`LanguageConfig`]: which syntax
//! node types map to which [`StructureKind`] at each tier, where a node keeps
//! its identifier, which node types count as control flow, and the regex
//! tables used when no tree is available. The tables are plain data; the
//! [`LanguageRules`] trait is the capability the extractors dispatch through,
//! and [`LanguageRegistry`] maps language names onto rule sets.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use crate::models::{Importance, NestedStructure, StructureKind, TopLevelStructure};
use crate::parser::walker::find_first_child_by_type;
use crate::parser::{NodeId, SyntaxTree};

use super::code_parser;

/// How a construct's last line is found when only text is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Braces,
    Indentation,
    EndKeyword,
    Document,
    Markdown,
}

/// Which inheritance syntax the language uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeritageFamily {
    /// `class A extends B implements C` (JS, TS, Java, PHP).
    BraceClause,
    /// `class A : B, C` (C#, C++, Kotlin, Swift).
    ColonBases,
    /// `class A(B, C):`
    PythonBases,
    /// `impl Trait for Type`
    RustImpl,
    /// `class A < B`
    RubyLt,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    TopLevel,
    Nested,
    Internal,
}

/// One text pattern. The first non-empty capture group is the name.
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub kind: StructureKind,
    pub pattern: &'static str,
    pub confidence: f32,
    pub importance: Importance,
}

// Struct literals rather than const fns, so tables written inside config
// functions are promoted to 'static.
macro_rules! pat {
    ($kind:expr, $pattern:expr, $confidence:expr $(,)?) => {
        PatternSpec {
            kind: $kind,
            pattern: $pattern,
            confidence: $confidence,
            importance: Importance::Medium,
        }
    };
}

macro_rules! ipat {
    ($kind:expr, $importance:expr, $pattern:expr, $confidence:expr $(,)?) => {
        PatternSpec {
            kind: $kind,
            pattern: $pattern,
            confidence: $confidence,
            importance: $importance,
        }
    };
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub kind: StructureKind,
    pub regex: Regex,
    pub confidence: f32,
    pub importance: Importance,
}

type KindTable = &'static [(StructureKind, &'static [&'static str])];
type InternalTable = &'static [(StructureKind, Importance, &'static [&'static str])];

pub struct LanguageConfig {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub extensions: &'static [&'static str],
    pub block_style: BlockStyle,
    pub heritage: HeritageFamily,
    pub top_level: KindTable,
    pub nested: KindTable,
    pub internal: InternalTable,
    /// Field names holding the identifier, per node type. Default is `name`.
    pub name_slots: &'static [(&'static str, &'static [&'static str])],
    pub control_flow: &'static [&'static str],
    pub nesting: &'static [&'static str],
    pub calls: &'static [&'static str],
    pub top_level_patterns: &'static [PatternSpec],
    pub nested_patterns: &'static [PatternSpec],
    pub internal_patterns: &'static [PatternSpec],
}

const DEFAULT_NAME_SLOTS: &[&str] = &["name"];

/// Capability every language entry provides to the extractors.
pub trait LanguageRules: Send + Sync {
    fn name(&self) -> &str;

    fn block_style(&self) -> BlockStyle;

    fn heritage(&self) -> HeritageFamily;

    fn top_level_kind(&self, node_type: &str) -> Option<StructureKind>;

    fn nested_kind(&self, node_type: &str) -> Option<StructureKind>;

    fn internal_kind(&self, node_type: &str) -> Option<(StructureKind, Importance)>;

    fn name_slot_for(&self, node_type: &str) -> &[&'static str];

    fn is_control_flow(&self, node_type: &str) -> bool;

    fn is_nesting(&self, node_type: &str) -> bool;

    fn is_call(&self, node_type: &str) -> bool;

    fn patterns(&self, tier: Tier) -> &[CompiledPattern];

    /// Language-specific correction of a table lookup, e.g. a JS
    /// `lexical_declaration` holding an arrow function is a function.
    fn refine_kind(&self, _tree: &SyntaxTree, _node: NodeId, kind: StructureKind) -> StructureKind {
        kind
    }

    fn extract_top_level(&self, tree: &SyntaxTree, language: &str) -> Vec<TopLevelStructure> {
        code_parser::collect_top_level(self, tree, language)
    }

    fn extract_nested(
        &self,
        tree: &SyntaxTree,
        top_level: &[TopLevelStructure],
        language: &str,
        max_depth: usize,
    ) -> Vec<NestedStructure> {
        code_parser::collect_nested(self, tree, top_level, language, max_depth)
    }
}

fn compile(specs: &[PatternSpec], language: &str) -> Vec<CompiledPattern> {
    specs
        .iter()
        .filter_map(|spec| match Regex::new(spec.pattern) {
            Ok(regex) => Some(CompiledPattern {
                kind: spec.kind,
                regex,
                confidence: spec.confidence.clamp(0.0, 1.0),
                importance: spec.importance,
            }),
            Err(e) => {
                warn!("Skipping invalid {language} pattern {:?}: {e}", spec.pattern);
                None
            }
        })
        .collect()
}

fn lookup_kind(table: KindTable, node_type: &str) -> Option<StructureKind> {
    table
        .iter()
        .find(|(_, types)| types.contains(&node_type))
        .map(|(kind, _)| *kind)
}

/// Rules driven entirely by a static [`LanguageConfig`].
pub struct TableRules {
    config: LanguageConfig,
    top_level_patterns: Vec<CompiledPattern>,
    nested_patterns: Vec<CompiledPattern>,
    internal_patterns: Vec<CompiledPattern>,
}

impl TableRules {
    pub fn new(config: LanguageConfig) -> Self {
        Self {
            top_level_patterns: compile(config.top_level_patterns, config.name),
            nested_patterns: compile(config.nested_patterns, config.name),
            internal_patterns: compile(config.internal_patterns, config.name),
            config,
        }
    }
}

impl LanguageRules for TableRules {
    fn name(&self) -> &str {
        self.config.name
    }

    fn block_style(&self) -> BlockStyle {
        self.config.block_style
    }

    fn heritage(&self) -> HeritageFamily {
        self.config.heritage
    }

    fn top_level_kind(&self, node_type: &str) -> Option<StructureKind> {
        lookup_kind(self.config.top_level, node_type)
    }

    fn nested_kind(&self, node_type: &str) -> Option<StructureKind> {
        lookup_kind(self.config.nested, node_type)
    }

    fn internal_kind(&self, node_type: &str) -> Option<(StructureKind, Importance)> {
        self.config
            .internal
            .iter()
            .find(|(_, _, types)| types.contains(&node_type))
            .map(|(kind, importance, _)| (*kind, *importance))
    }

    fn name_slot_for(&self, node_type: &str) -> &[&'static str] {
        self.config
            .name_slots
            .iter()
            .find(|(t, _)| *t == node_type)
            .map(|(_, slots)| *slots)
            .unwrap_or(DEFAULT_NAME_SLOTS)
    }

    fn is_control_flow(&self, node_type: &str) -> bool {
        self.config.control_flow.contains(&node_type)
    }

    fn is_nesting(&self, node_type: &str) -> bool {
        self.config.nesting.contains(&node_type)
    }

    fn is_call(&self, node_type: &str) -> bool {
        self.config.calls.contains(&node_type)
    }

    fn patterns(&self, tier: Tier) -> &[CompiledPattern] {
        match tier {
            Tier::TopLevel => &self.top_level_patterns,
            Tier::Nested => &self.nested_patterns,
            Tier::Internal => &self.internal_patterns,
        }
    }

    fn refine_kind(&self, tree: &SyntaxTree, node: NodeId, kind: StructureKind) -> StructureKind {
        match (self.config.name, tree.kind(node)) {
            ("javascript" | "typescript", "lexical_declaration" | "variable_declaration") => {
                refine_js_declaration(tree, node, kind)
            }
            ("go", "type_declaration") => refine_go_type(tree, node),
            ("python", "assignment") => {
                let is_constant = tree
                    .child_by_field(node, "left")
                    .map(|left| tree.text(left))
                    .is_some_and(|name| {
                        name.chars().any(|c| c.is_ascii_uppercase())
                            && name
                                .chars()
                                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
                    });
                if is_constant {
                    StructureKind::Constant
                } else {
                    kind
                }
            }
            _ => kind,
        }
    }
}

fn refine_js_declaration(tree: &SyntaxTree, node: NodeId, kind: StructureKind) -> StructureKind {
    let Some(declarator) = find_first_child_by_type(tree, node, &["variable_declarator"]) else {
        return kind;
    };
    let value_kind = tree
        .child_by_field(declarator, "value")
        .map(|v| tree.kind(v))
        .unwrap_or("");
    if matches!(
        value_kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    ) {
        return StructureKind::Function;
    }
    if tree.children(node).first().map(|c| tree.kind(*c)) == Some("const") {
        StructureKind::Constant
    } else {
        kind
    }
}

fn refine_go_type(tree: &SyntaxTree, node: NodeId) -> StructureKind {
    let body = find_first_child_by_type(tree, node, &["type_spec"])
        .and_then(|spec| tree.child_by_field(spec, "type"))
        .map(|t| tree.kind(t))
        .unwrap_or("");
    match body {
        "struct_type" => StructureKind::Struct,
        "interface_type" => StructureKind::Interface,
        _ => StructureKind::Type,
    }
}

/// Document-style languages (JSON, YAML, Markdown): the whole file is one
/// document structure; keys or headings come from text patterns.
pub struct DocumentRules {
    inner: TableRules,
}

impl DocumentRules {
    pub fn new(config: LanguageConfig) -> Self {
        Self {
            inner: TableRules::new(config),
        }
    }
}

impl LanguageRules for DocumentRules {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn block_style(&self) -> BlockStyle {
        self.inner.block_style()
    }

    fn heritage(&self) -> HeritageFamily {
        HeritageFamily::None
    }

    fn top_level_kind(&self, node_type: &str) -> Option<StructureKind> {
        self.inner.top_level_kind(node_type)
    }

    fn nested_kind(&self, node_type: &str) -> Option<StructureKind> {
        self.inner.nested_kind(node_type)
    }

    fn internal_kind(&self, _node_type: &str) -> Option<(StructureKind, Importance)> {
        None
    }

    fn name_slot_for(&self, node_type: &str) -> &[&'static str] {
        self.inner.name_slot_for(node_type)
    }

    fn is_control_flow(&self, _node_type: &str) -> bool {
        false
    }

    fn is_nesting(&self, _node_type: &str) -> bool {
        false
    }

    fn is_call(&self, _node_type: &str) -> bool {
        false
    }

    fn patterns(&self, tier: Tier) -> &[CompiledPattern] {
        self.inner.patterns(tier)
    }

    fn extract_top_level(&self, tree: &SyntaxTree, language: &str) -> Vec<TopLevelStructure> {
        code_parser::document_structure(tree, language)
            .into_iter()
            .collect()
    }
}

/// Fallback for languages without an entry: the union of every registered
/// language's node types, plus language-agnostic text patterns.
pub struct GenericRules {
    top_level: HashMap<&'static str, StructureKind>,
    nested: HashMap<&'static str, StructureKind>,
    internal: HashMap<&'static str, (StructureKind, Importance)>,
    name_slots: HashMap<&'static str, &'static [&'static str]>,
    control_flow: Vec<&'static str>,
    nesting: Vec<&'static str>,
    calls: Vec<&'static str>,
    text: TableRules,
}

impl GenericRules {
    fn from_configs(configs: &[&LanguageConfig]) -> Self {
        let mut rules = Self {
            top_level: HashMap::new(),
            nested: HashMap::new(),
            internal: HashMap::new(),
            name_slots: HashMap::new(),
            control_flow: Vec::new(),
            nesting: Vec::new(),
            calls: Vec::new(),
            text: TableRules::new(generic_config()),
        };
        for config in configs {
            // first registration wins when grammars disagree on a node type
            for (kind, types) in config.top_level {
                for t in *types {
                    rules.top_level.entry(*t).or_insert(*kind);
                }
            }
            for (kind, types) in config.nested {
                for t in *types {
                    rules.nested.entry(*t).or_insert(*kind);
                }
            }
            for (kind, importance, types) in config.internal {
                for t in *types {
                    rules.internal.entry(*t).or_insert((*kind, *importance));
                }
            }
            for (t, slots) in config.name_slots {
                rules.name_slots.entry(*t).or_insert(*slots);
            }
            for (target, source) in [
                (&mut rules.control_flow, config.control_flow),
                (&mut rules.nesting, config.nesting),
                (&mut rules.calls, config.calls),
            ] {
                for t in source {
                    if !target.contains(t) {
                        target.push(*t);
                    }
                }
            }
        }
        rules
    }
}

impl LanguageRules for GenericRules {
    fn name(&self) -> &str {
        "generic"
    }

    fn block_style(&self) -> BlockStyle {
        BlockStyle::Braces
    }

    fn heritage(&self) -> HeritageFamily {
        HeritageFamily::BraceClause
    }

    fn top_level_kind(&self, node_type: &str) -> Option<StructureKind> {
        self.top_level.get(node_type).copied()
    }

    fn nested_kind(&self, node_type: &str) -> Option<StructureKind> {
        self.nested.get(node_type).copied()
    }

    fn internal_kind(&self, node_type: &str) -> Option<(StructureKind, Importance)> {
        self.internal.get(node_type).copied()
    }

    fn name_slot_for(&self, node_type: &str) -> &[&'static str] {
        self.name_slots
            .get(node_type)
            .copied()
            .unwrap_or(DEFAULT_NAME_SLOTS)
    }

    fn is_control_flow(&self, node_type: &str) -> bool {
        self.control_flow.contains(&node_type)
    }

    fn is_nesting(&self, node_type: &str) -> bool {
        self.nesting.contains(&node_type)
    }

    fn is_call(&self, node_type: &str) -> bool {
        self.calls.contains(&node_type)
    }

    fn patterns(&self, tier: Tier) -> &[CompiledPattern] {
        self.text.patterns(tier)
    }
}

/// Language name → rules, populated once at startup and shared behind `Arc`.
pub struct LanguageRegistry {
    rules: Vec<Arc<dyn LanguageRules>>,
    by_name: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
    generic: Arc<dyn LanguageRules>,
}

impl LanguageRegistry {
    /// Registry with every built-in language.
    pub fn builtin() -> Self {
        let code = vec![
            javascript_config(),
            typescript_config(),
            python_config(),
            rust_config(),
            go_config(),
            java_config(),
            c_config(),
            cpp_config(),
            csharp_config(),
            ruby_config(),
            php_config(),
            kotlin_config(),
        ];
        let documents = vec![json_config(), yaml_config(), markdown_config()];

        let generic = {
            let refs: Vec<&LanguageConfig> = code.iter().collect();
            Arc::new(GenericRules::from_configs(&refs))
        };

        let mut registry = Self {
            rules: Vec::new(),
            by_name: HashMap::new(),
            by_extension: HashMap::new(),
            generic,
        };
        for config in code {
            let (names, exts) = (Self::names_of(&config), config.extensions);
            registry.register(Arc::new(TableRules::new(config)), &names, exts);
        }
        for config in documents {
            let (names, exts) = (Self::names_of(&config), config.extensions);
            registry.register(Arc::new(DocumentRules::new(config)), &names, exts);
        }
        registry
    }

    fn names_of(config: &LanguageConfig) -> Vec<&'static str> {
        std::iter::once(config.name)
            .chain(config.aliases.iter().copied())
            .collect()
    }

    /// Adds (or replaces) a language under each of `names`.
    pub fn register(&mut self, rules: Arc<dyn LanguageRules>, names: &[&str], extensions: &[&str]) {
        let index = self.rules.len();
        self.rules.push(rules);
        for name in names {
            self.by_name.insert(name.to_lowercase(), index);
        }
        for ext in extensions {
            self.by_extension.insert(ext.to_lowercase(), index);
        }
    }

    pub fn lookup(&self, language: &str) -> Option<Arc<dyn LanguageRules>> {
        self.by_name
            .get(&language.to_lowercase())
            .and_then(|i| self.rules.get(*i))
            .cloned()
    }

    /// Rules for `language`, or the generic union when it is unknown.
    pub fn get(&self, language: &str) -> Arc<dyn LanguageRules> {
        self.lookup(language).unwrap_or_else(|| self.generic.clone())
    }

    pub fn generic(&self) -> Arc<dyn LanguageRules> {
        self.generic.clone()
    }

    pub fn is_known(&self, language: &str) -> bool {
        self.by_name.contains_key(&language.to_lowercase())
    }

    pub fn language_for_path(&self, path: &Path) -> Option<String> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        self.by_extension
            .get(&ext)
            .and_then(|i| self.rules.get(*i))
            .map(|r| r.name().to_string())
    }

    pub fn languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.iter().map(|r| r.name().to_string()).collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Shared tables ────────────────────────────────────────────────────

use Importance::{High, Low, Medium};
use StructureKind as K;

const C_LIKE_RETURN: &[&str] = &["return_statement"];
const C_LIKE_THROW: &[&str] = &["throw_statement"];

const RESERVED_WORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "catch", "return", "function", "else", "do",
    "try", "with", "new", "typeof", "sizeof", "elif", "match", "loop", "yield", "await",
];

// JavaScript / TypeScript

const JS_TOP: KindTable = &[
    (K::Function, &["function_declaration", "generator_function_declaration"]),
    (K::Class, &["class_declaration"]),
    (K::Variable, &["lexical_declaration", "variable_declaration"]),
    (K::Import, &["import_statement"]),
    (K::Export, &["export_statement"]),
];

const TS_TOP: KindTable = &[
    (K::Function, &["function_declaration", "generator_function_declaration", "function_signature"]),
    (K::Class, &["class_declaration", "abstract_class_declaration"]),
    (K::Interface, &["interface_declaration"]),
    (K::Type, &["type_alias_declaration"]),
    (K::Enum, &["enum_declaration"]),
    (K::Namespace, &["internal_module"]),
    (K::Module, &["module"]),
    (K::Variable, &["lexical_declaration", "variable_declaration"]),
    (K::Import, &["import_statement"]),
    (K::Export, &["export_statement"]),
];

const JS_NESTED: KindTable = &[
    (K::Method, &["method_definition", "method_signature", "abstract_method_signature"]),
    (K::Function, &["function_declaration", "generator_function_declaration"]),
    (K::Class, &["class_declaration"]),
    (K::Variable, &["field_definition", "public_field_definition", "property_signature"]),
];

const JS_INTERNAL: InternalTable = &[
    (K::Variable, Low, &["lexical_declaration", "variable_declaration"]),
    (
        K::ControlFlow,
        Medium,
        &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
    ),
    (K::Return, High, C_LIKE_RETURN),
    (K::Throw, High, C_LIKE_THROW),
];

const JS_NAME_SLOTS: &[(&str, &[&str])] = &[
    ("export_statement", &["declaration"]),
    ("import_statement", &["source"]),
];

const JS_CONTROL: &[&str] = &[
    "if_statement",
    "while_statement",
    "for_statement",
    "for_in_statement",
    "do_statement",
    "switch_statement",
    "switch_case",
    "catch_clause",
    "ternary_expression",
];

const JS_NESTING: &[&str] = &[
    "if_statement",
    "while_statement",
    "for_statement",
    "for_in_statement",
    "do_statement",
    "switch_statement",
    "try_statement",
    "catch_clause",
];

const JS_CALLS: &[&str] = &["call_expression"];

const JS_TOP_PATTERNS: &[PatternSpec] = &[
    pat!(K::Function, r"(?m)^(?:export[ \t]+(?:default[ \t]+)?)?(?:async[ \t]+)?function[ \t]*\*?[ \t]*([A-Za-z_$][\w$]*)", 0.9),
    pat!(K::Function, r"(?m)^(?:export[ \t]+)?(?:const|let|var)[ \t]+([A-Za-z_$][\w$]*)[ \t]*(?::[^=\n]+)?=[ \t]*(?:async[ \t]+)?(?:function\b|\([^)\n]*\)[ \t]*(?::[^=\n]+)?=>|[A-Za-z_$][\w$]*[ \t]*=>)", 0.85),
    pat!(K::Class, r"(?m)^(?:export[ \t]+(?:default[ \t]+)?)?(?:abstract[ \t]+)?class[ \t]+([A-Za-z_$][\w$]*)", 0.9),
    pat!(K::Import, r#"(?m)^import[ \t]+(?:type[ \t]+)?(?:[^'"\n;]*?[ \t]+from[ \t]+)?['"]([^'"\n]+)['"]"#, 0.9),
    pat!(K::Constant, r"(?m)^(?:export[ \t]+)?const[ \t]+([A-Za-z_$][\w$]*)", 0.75),
    pat!(K::Variable, r"(?m)^(?:export[ \t]+)?(?:let|var)[ \t]+([A-Za-z_$][\w$]*)", 0.7),
];

const TS_TOP_PATTERNS: &[PatternSpec] = &[
    pat!(K::Function, r"(?m)^(?:export[ \t]+(?:default[ \t]+)?)?(?:declare[ \t]+)?(?:async[ \t]+)?function[ \t]*\*?[ \t]*([A-Za-z_$][\w$]*)", 0.9),
    pat!(K::Function, r"(?m)^(?:export[ \t]+)?(?:const|let|var)[ \t]+([A-Za-z_$][\w$]*)[ \t]*(?::[^=\n]+)?=[ \t]*(?:async[ \t]+)?(?:function\b|\([^)\n]*\)[ \t]*(?::[^=\n]+)?=>|[A-Za-z_$][\w$]*[ \t]*=>)", 0.85),
    pat!(K::Class, r"(?m)^(?:export[ \t]+(?:default[ \t]+)?)?(?:declare[ \t]+)?(?:abstract[ \t]+)?class[ \t]+([A-Za-z_$][\w$]*)", 0.9),
    pat!(K::Interface, r"(?m)^(?:export[ \t]+)?(?:declare[ \t]+)?interface[ \t]+([A-Za-z_$][\w$]*)", 0.9),
    pat!(K::Type, r"(?m)^(?:export[ \t]+)?(?:declare[ \t]+)?type[ \t]+([A-Za-z_$][\w$]*)[ \t]*(?:<[^>\n]*>)?[ \t]*=", 0.85),
    pat!(K::Enum, r"(?m)^(?:export[ \t]+)?(?:declare[ \t]+)?(?:const[ \t]+)?enum[ \t]+([A-Za-z_$][\w$]*)", 0.85),
    pat!(K::Namespace, r"(?m)^(?:export[ \t]+)?(?:declare[ \t]+)?namespace[ \t]+([A-Za-z_$][\w$.]*)", 0.85),
    pat!(K::Import, r#"(?m)^import[ \t]+(?:type[ \t]+)?(?:[^'"\n;]*?[ \t]+from[ \t]+)?['"]([^'"\n]+)['"]"#, 0.9),
    pat!(K::Constant, r"(?m)^(?:export[ \t]+)?const[ \t]+([A-Za-z_$][\w$]*)", 0.75),
    pat!(K::Variable, r"(?m)^(?:export[ \t]+)?(?:let|var)[ \t]+([A-Za-z_$][\w$]*)", 0.7),
];

const JS_NESTED_PATTERNS: &[PatternSpec] = &[
    pat!(K::Function, r"(?m)^[ \t]+(?:async[ \t]+)?function[ \t]*\*?[ \t]*([A-Za-z_$][\w$]*)", 0.8),
    pat!(K::Method, r"(?m)^[ \t]+(?:(?:public|private|protected|static|async|readonly|override|abstract|get|set)[ \t]+)*\*?([A-Za-z_$][\w$]*)[ \t]*(?:<[^>\n]*>)?[ \t]*\([^)\n]*\)[ \t]*(?::[^{;\n]+)?\{", 0.8),
];

const C_LIKE_INTERNAL_PATTERNS: &[PatternSpec] = &[
    ipat!(K::Variable, Low, r"(?m)^[ \t]+(?:const|let|var)[ \t]+([A-Za-z_$][\w$]*)", 0.7),
    ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]*(?:\}[ \t]*else[ \t]+)?(if|for|foreach|while|switch|try|do)\b", 0.75),
    ipat!(K::Return, High, r"(?m)^[ \t]*return\b", 0.8),
    ipat!(K::Throw, High, r"(?m)^[ \t]*throw\b", 0.8),
];

fn javascript_config() -> LanguageConfig {
    LanguageConfig {
        name: "javascript",
        aliases: &["js", "jsx", "node"],
        extensions: &["js", "jsx", "mjs", "cjs"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::BraceClause,
        top_level: JS_TOP,
        nested: JS_NESTED,
        internal: JS_INTERNAL,
        name_slots: JS_NAME_SLOTS,
        control_flow: JS_CONTROL,
        nesting: JS_NESTING,
        calls: JS_CALLS,
        top_level_patterns: JS_TOP_PATTERNS,
        nested_patterns: JS_NESTED_PATTERNS,
        internal_patterns: C_LIKE_INTERNAL_PATTERNS,
    }
}

fn typescript_config() -> LanguageConfig {
    LanguageConfig {
        name: "typescript",
        aliases: &["ts", "tsx"],
        extensions: &["ts", "tsx", "mts", "cts"],
        top_level: TS_TOP,
        top_level_patterns: TS_TOP_PATTERNS,
        ..javascript_config()
    }
}

// Python

const PY_CONTROL: &[&str] = &[
    "if_statement",
    "elif_clause",
    "while_statement",
    "for_statement",
    "except_clause",
    "conditional_expression",
    "match_statement",
    "case_clause",
];

fn python_config() -> LanguageConfig {
    LanguageConfig {
        name: "python",
        aliases: &["py", "python3"],
        extensions: &["py", "pyi"],
        block_style: BlockStyle::Indentation,
        heritage: HeritageFamily::PythonBases,
        top_level: &[
            (K::Function, &["function_definition"]),
            (K::Class, &["class_definition"]),
            (K::Import, &["import_statement", "import_from_statement"]),
            (K::Variable, &["assignment"]),
        ],
        nested: &[
            (K::Function, &["function_definition"]),
            (K::Class, &["class_definition"]),
        ],
        internal: &[
            (K::Variable, Low, &["assignment", "augmented_assignment"]),
            (
                K::ControlFlow,
                Medium,
                &[
                    "if_statement",
                    "for_statement",
                    "while_statement",
                    "try_statement",
                    "with_statement",
                    "match_statement",
                ],
            ),
            (K::Return, High, &["return_statement"]),
            (K::Throw, High, &["raise_statement"]),
        ],
        name_slots: &[
            ("assignment", &["left"]),
            ("augmented_assignment", &["left"]),
            ("import_from_statement", &["module_name"]),
        ],
        control_flow: PY_CONTROL,
        nesting: &[
            "if_statement",
            "for_statement",
            "while_statement",
            "try_statement",
            "with_statement",
            "match_statement",
        ],
        calls: &["call"],
        top_level_patterns: &[
            pat!(K::Function, r"(?m)^(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)", 0.9),
            pat!(K::Class, r"(?m)^class[ \t]+([A-Za-z_]\w*)", 0.9),
            pat!(K::Import, r"(?m)^(?:from[ \t]+([\w.]+)[ \t]+import\b|import[ \t]+([\w.]+))", 0.9),
            pat!(K::Constant, r"(?m)^([A-Z][A-Z0-9_]*)[ \t]*(?::[^=\n]+)?=[^=]", 0.75),
            pat!(K::Variable, r"(?m)^([a-z_]\w*)[ \t]*(?::[^=\n]+)?=[^=]", 0.7),
        ],
        nested_patterns: &[
            pat!(K::Function, r"(?m)^[ \t]+(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)", 0.85),
            pat!(K::Class, r"(?m)^[ \t]+class[ \t]+([A-Za-z_]\w*)", 0.8),
        ],
        internal_patterns: &[
            ipat!(K::Variable, Low, r"(?m)^[ \t]+([A-Za-z_][\w.]*)[ \t]*(?::[^=\n]+)?[+\-*/]?=[^=]", 0.7),
            ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]+(if|elif|for|while|try|with|match)\b", 0.75),
            ipat!(K::Return, High, r"(?m)^[ \t]+return\b", 0.8),
            ipat!(K::Throw, High, r"(?m)^[ \t]+raise\b", 0.8),
        ],
    }
}

// Rust

fn rust_config() -> LanguageConfig {
    LanguageConfig {
        name: "rust",
        aliases: &["rs"],
        extensions: &["rs"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::RustImpl,
        top_level: &[
            (K::Function, &["function_item"]),
            (K::Struct, &["struct_item", "union_item"]),
            (K::Enum, &["enum_item"]),
            (K::Trait, &["trait_item"]),
            (K::Impl, &["impl_item"]),
            (K::Type, &["type_item"]),
            (K::Module, &["mod_item"]),
            (K::Import, &["use_declaration"]),
            (K::Constant, &["const_item"]),
            (K::Variable, &["static_item"]),
        ],
        nested: &[
            (K::Function, &["function_item"]),
            (K::Method, &["function_signature_item"]),
            (K::Struct, &["struct_item"]),
            (K::Enum, &["enum_item"]),
            (K::Trait, &["trait_item"]),
            (K::Impl, &["impl_item"]),
            (K::Module, &["mod_item"]),
            (K::Constant, &["const_item"]),
        ],
        internal: &[
            (K::Variable, Low, &["let_declaration"]),
            (
                K::ControlFlow,
                Medium,
                &[
                    "if_expression",
                    "match_expression",
                    "for_expression",
                    "while_expression",
                    "loop_expression",
                ],
            ),
            (K::Return, High, &["return_expression"]),
        ],
        name_slots: &[
            ("impl_item", &["type"]),
            ("let_declaration", &["pattern"]),
            ("use_declaration", &["argument"]),
        ],
        control_flow: &[
            "if_expression",
            "while_expression",
            "for_expression",
            "match_expression",
            "match_arm",
        ],
        nesting: &[
            "if_expression",
            "while_expression",
            "for_expression",
            "loop_expression",
            "match_expression",
        ],
        calls: &["call_expression"],
        top_level_patterns: &[
            pat!(K::Function, r#"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?(?:const[ \t]+)?(?:async[ \t]+)?(?:unsafe[ \t]+)?(?:extern[ \t]+"[^"\n]*"[ \t]+)?fn[ \t]+([A-Za-z_]\w*)"#, 0.9),
            pat!(K::Struct, r"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?(?:struct|union)[ \t]+([A-Za-z_]\w*)", 0.9),
            pat!(K::Enum, r"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?enum[ \t]+([A-Za-z_]\w*)", 0.9),
            pat!(K::Trait, r"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?(?:unsafe[ \t]+)?trait[ \t]+([A-Za-z_]\w*)", 0.9),
            pat!(K::Impl, r"(?m)^(?:unsafe[ \t]+)?impl(?:[ \t]*<[^>\n]*>)?[ \t]+(?:[\w:<>, ]+[ \t]+for[ \t]+)?([A-Za-z_]\w*)", 0.85),
            pat!(K::Type, r"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?type[ \t]+([A-Za-z_]\w*)", 0.85),
            pat!(K::Module, r"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?mod[ \t]+([A-Za-z_]\w*)", 0.85),
            pat!(K::Import, r"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?use[ \t]+([\w:{}, *]+)", 0.9),
            pat!(K::Constant, r"(?m)^(?:pub(?:\([^)\n]*\))?[ \t]+)?(?:const|static)[ \t]+(?:mut[ \t]+)?([A-Za-z_]\w*)", 0.8),
        ],
        nested_patterns: &[pat!(
            K::Function,
            r#"(?m)^[ \t]+(?:pub(?:\([^)\n]*\))?[ \t]+)?(?:const[ \t]+)?(?:async[ \t]+)?(?:unsafe[ \t]+)?(?:extern[ \t]+"[^"\n]*"[ \t]+)?fn[ \t]+([A-Za-z_]\w*)"#,
            0.85,
        )],
        internal_patterns: &[
            ipat!(K::Variable, Low, r"(?m)^[ \t]+let[ \t]+(?:mut[ \t]+)?([A-Za-z_]\w*)", 0.75),
            ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]*(?:\}[ \t]*else[ \t]+)?(if|match|for|while|loop)\b", 0.75),
            ipat!(K::Return, High, r"(?m)^[ \t]*return\b", 0.8),
        ],
    }
}

// Go

fn go_config() -> LanguageConfig {
    LanguageConfig {
        name: "go",
        aliases: &["golang"],
        extensions: &["go"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::None,
        top_level: &[
            (K::Function, &["function_declaration"]),
            (K::Method, &["method_declaration"]),
            (K::Type, &["type_declaration"]),
            (K::Import, &["import_declaration"]),
            (K::Constant, &["const_declaration"]),
            (K::Variable, &["var_declaration"]),
        ],
        nested: &[
            (K::Method, &["method_elem", "method_spec"]),
            (K::Variable, &["field_declaration"]),
        ],
        internal: &[
            (K::Variable, Low, &["short_var_declaration", "var_declaration"]),
            (
                K::ControlFlow,
                Medium,
                &[
                    "if_statement",
                    "for_statement",
                    "expression_switch_statement",
                    "type_switch_statement",
                    "select_statement",
                ],
            ),
            (K::Return, High, C_LIKE_RETURN),
        ],
        name_slots: &[("short_var_declaration", &["left"])],
        control_flow: &[
            "if_statement",
            "for_statement",
            "expression_switch_statement",
            "type_switch_statement",
            "expression_case",
            "type_case",
            "communication_case",
        ],
        nesting: &[
            "if_statement",
            "for_statement",
            "expression_switch_statement",
            "type_switch_statement",
            "select_statement",
        ],
        calls: &["call_expression"],
        top_level_patterns: &[
            pat!(K::Method, r"(?m)^func[ \t]*\([^)\n]*\)[ \t]*([A-Za-z_]\w*)", 0.9),
            pat!(K::Function, r"(?m)^func[ \t]+([A-Za-z_]\w*)", 0.9),
            pat!(K::Struct, r"(?m)^type[ \t]+([A-Za-z_]\w*)[ \t]+struct\b", 0.9),
            pat!(K::Interface, r"(?m)^type[ \t]+([A-Za-z_]\w*)[ \t]+interface\b", 0.9),
            pat!(K::Type, r"(?m)^type[ \t]+([A-Za-z_]\w*)", 0.75),
            pat!(K::Import, r#"(?m)^import[ \t]*(?:\(|(?:\w+[ \t]+)?"([^"\n]+)")"#, 0.85),
            pat!(K::Constant, r"(?m)^const[ \t]+([A-Za-z_]\w*)", 0.8),
            pat!(K::Variable, r"(?m)^var[ \t]+([A-Za-z_]\w*)", 0.75),
        ],
        nested_patterns: &[
            pat!(K::Method, r"(?m)^[ \t]+([A-Z]\w*)[ \t]*\([^)\n]*\)", 0.7),
        ],
        internal_patterns: &[
            ipat!(K::Variable, Low, r"(?m)^[ \t]+([A-Za-z_]\w*)(?:[ \t]*,[ \t]*[A-Za-z_]\w*)*[ \t]*:=", 0.75),
            ipat!(K::Variable, Low, r"(?m)^[ \t]+var[ \t]+([A-Za-z_]\w*)", 0.75),
            ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]*(?:\}[ \t]*else[ \t]+)?(if|for|switch|select)\b", 0.75),
            ipat!(K::Return, High, r"(?m)^[ \t]*return\b", 0.8),
        ],
    }
}

// Java

fn java_config() -> LanguageConfig {
    LanguageConfig {
        name: "java",
        aliases: &[],
        extensions: &["java"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::BraceClause,
        top_level: &[
            (K::Class, &["class_declaration", "record_declaration"]),
            (K::Interface, &["interface_declaration", "annotation_type_declaration"]),
            (K::Enum, &["enum_declaration"]),
            (K::Import, &["import_declaration"]),
            (K::Module, &["package_declaration"]),
        ],
        nested: &[
            (K::Method, &["method_declaration", "constructor_declaration"]),
            (K::Class, &["class_declaration", "record_declaration"]),
            (K::Interface, &["interface_declaration"]),
            (K::Enum, &["enum_declaration"]),
            (K::Variable, &["field_declaration"]),
        ],
        internal: &[
            (K::Variable, Low, &["local_variable_declaration"]),
            (
                K::ControlFlow,
                Medium,
                &[
                    "if_statement",
                    "for_statement",
                    "enhanced_for_statement",
                    "while_statement",
                    "do_statement",
                    "switch_expression",
                    "try_statement",
                ],
            ),
            (K::Return, High, C_LIKE_RETURN),
            (K::Throw, High, C_LIKE_THROW),
        ],
        name_slots: &[("field_declaration", &["declarator"]), ("local_variable_declaration", &["declarator"])],
        control_flow: &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "while_statement",
            "do_statement",
            "switch_expression",
            "switch_label",
            "catch_clause",
            "ternary_expression",
        ],
        nesting: &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "while_statement",
            "do_statement",
            "switch_expression",
            "try_statement",
        ],
        calls: &["method_invocation"],
        top_level_patterns: &[
            pat!(K::Class, r"(?m)^(?:(?:public|private|protected|abstract|final|static|sealed|non-sealed|strictfp)[ \t]+)*class[ \t]+(\w+)", 0.9),
            pat!(K::Interface, r"(?m)^(?:(?:public|private|protected|abstract|sealed|static)[ \t]+)*(?:@)?interface[ \t]+(\w+)", 0.9),
            pat!(K::Enum, r"(?m)^(?:(?:public|private|protected|static)[ \t]+)*enum[ \t]+(\w+)", 0.9),
            pat!(K::Class, r"(?m)^(?:(?:public|private|protected|static|final)[ \t]+)*record[ \t]+(\w+)", 0.85),
            pat!(K::Import, r"(?m)^import[ \t]+(?:static[ \t]+)?([\w.]+(?:\.\*)?)[ \t]*;", 0.9),
            pat!(K::Module, r"(?m)^package[ \t]+([\w.]+)[ \t]*;", 0.9),
        ],
        nested_patterns: JAVA_LIKE_NESTED_PATTERNS,
        internal_patterns: JAVA_LIKE_INTERNAL_PATTERNS,
    }
}

const JAVA_LIKE_NESTED_PATTERNS: &[PatternSpec] = &[
    pat!(K::Method, r"(?m)^[ \t]+(?:(?:public|private|protected|internal|static|final|abstract|synchronized|native|default|virtual|override|async|sealed|partial|unsafe|extern|new)[ \t]+)*(?:<[^>\n]+>[ \t]+)?[\w<>\[\],.?]+(?:[ \t]*<[^>\n]*>)?[ \t]+(\w+)[ \t]*\([^)\n]*\)[ \t]*(?:throws[ \t]+[\w., \t]+)?\{?[ \t]*$", 0.75),
    pat!(K::Class, r"(?m)^[ \t]+(?:(?:public|private|protected|internal|static|final|abstract|sealed|partial)[ \t]+)*(?:class|record)[ \t]+(\w+)", 0.8),
    pat!(K::Interface, r"(?m)^[ \t]+(?:(?:public|private|protected|internal|static)[ \t]+)*interface[ \t]+(\w+)", 0.8),
];

const JAVA_LIKE_INTERNAL_PATTERNS: &[PatternSpec] = &[
    ipat!(K::Variable, Low, r"(?m)^[ \t]+(?:final[ \t]+)?(?:var|[A-Z][\w<>\[\],.?]*|int|long|double|float|boolean|char|byte|short|string|bool)[ \t]+([a-z_]\w*)[ \t]*(?:=|;)", 0.65),
    ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]*(?:\}[ \t]*else[ \t]+)?(if|for|foreach|while|switch|try|do)\b", 0.75),
    ipat!(K::Return, High, r"(?m)^[ \t]*return\b", 0.8),
    ipat!(K::Throw, High, r"(?m)^[ \t]*throw\b", 0.8),
];

// C / C++

const C_CONTROL: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
    "case_statement",
    "catch_clause",
    "conditional_expression",
];

const C_NESTING: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
    "try_statement",
];

const C_INTERNAL: InternalTable = &[
    (K::Variable, Low, &["declaration"]),
    (
        K::ControlFlow,
        Medium,
        &[
            "if_statement",
            "for_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
    ),
    (K::Return, High, C_LIKE_RETURN),
    (K::Throw, High, &["throw_statement"]),
];

const C_NAME_SLOTS: &[(&str, &[&str])] = &[
    ("function_definition", &["declarator"]),
    ("declaration", &["declarator"]),
    ("type_definition", &["declarator"]),
    ("field_declaration", &["declarator"]),
    ("preproc_include", &["path"]),
];

const C_TOP_PATTERNS: &[PatternSpec] = &[
    pat!(K::Import, r#"(?m)^#[ \t]*include[ \t]*[<"]([^>"\n]+)[>"]"#, 0.9),
    pat!(K::Struct, r"(?m)^(?:typedef[ \t]+)?struct[ \t]+(\w+)", 0.85),
    pat!(K::Enum, r"(?m)^(?:typedef[ \t]+)?enum[ \t]+(\w+)", 0.85),
    pat!(K::Function, r"(?m)^(?:(?:static|inline|extern|const|unsigned|signed)[ \t]+)*[A-Za-z_][\w]*(?:[ \t]*\*+[ \t]*|[ \t]+)\**([A-Za-z_]\w*)[ \t]*\([^;\n]*\)[ \t]*\{?[ \t]*$", 0.75),
];

fn c_config() -> LanguageConfig {
    LanguageConfig {
        name: "c",
        aliases: &["h"],
        extensions: &["c", "h"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::None,
        top_level: &[
            (K::Function, &["function_definition"]),
            (K::Struct, &["struct_specifier", "union_specifier"]),
            (K::Enum, &["enum_specifier"]),
            (K::Type, &["type_definition"]),
            (K::Import, &["preproc_include"]),
            (K::Variable, &["declaration"]),
        ],
        nested: &[(K::Variable, &["field_declaration"])],
        internal: C_INTERNAL,
        name_slots: C_NAME_SLOTS,
        control_flow: C_CONTROL,
        nesting: C_NESTING,
        calls: &["call_expression"],
        top_level_patterns: C_TOP_PATTERNS,
        nested_patterns: &[],
        internal_patterns: JAVA_LIKE_INTERNAL_PATTERNS,
    }
}

fn cpp_config() -> LanguageConfig {
    LanguageConfig {
        name: "cpp",
        aliases: &["c++", "cxx", "hpp"],
        extensions: &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
        heritage: HeritageFamily::ColonBases,
        top_level: &[
            (K::Function, &["function_definition"]),
            (K::Class, &["class_specifier"]),
            (K::Struct, &["struct_specifier", "union_specifier"]),
            (K::Enum, &["enum_specifier"]),
            (K::Namespace, &["namespace_definition"]),
            (K::Type, &["type_definition", "alias_declaration"]),
            (K::Import, &["preproc_include", "using_declaration"]),
            (K::Variable, &["declaration"]),
        ],
        nested: &[
            (K::Method, &["function_definition"]),
            (K::Class, &["class_specifier"]),
            (K::Struct, &["struct_specifier"]),
            (K::Variable, &["field_declaration"]),
        ],
        top_level_patterns: &[
            pat!(K::Import, r#"(?m)^#[ \t]*include[ \t]*[<"]([^>"\n]+)[>"]"#, 0.9),
            pat!(K::Namespace, r"(?m)^namespace[ \t]+(\w+)", 0.85),
            pat!(K::Class, r"(?m)^(?:template[ \t]*<[^>\n]*>[ \t]*)?class[ \t]+(\w+)", 0.85),
            pat!(K::Struct, r"(?m)^(?:typedef[ \t]+)?struct[ \t]+(\w+)", 0.85),
            pat!(K::Enum, r"(?m)^enum[ \t]+(?:class[ \t]+)?(\w+)", 0.85),
            pat!(K::Function, r"(?m)^(?:(?:static|inline|extern|const|virtual|constexpr|unsigned)[ \t]+)*[A-Za-z_][\w:<>]*(?:[ \t]*[\*&]+[ \t]*|[ \t]+)[\*&]*([A-Za-z_][\w:~]*)[ \t]*\([^;\n]*\)[ \t]*(?:const[ \t]*)?\{?[ \t]*$", 0.75),
        ],
        nested_patterns: JAVA_LIKE_NESTED_PATTERNS,
        ..c_config()
    }
}

// C#

fn csharp_config() -> LanguageConfig {
    LanguageConfig {
        name: "csharp",
        aliases: &["c#", "cs"],
        extensions: &["cs"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::ColonBases,
        top_level: &[
            (K::Namespace, &["namespace_declaration", "file_scoped_namespace_declaration"]),
            (K::Class, &["class_declaration", "record_declaration"]),
            (K::Interface, &["interface_declaration"]),
            (K::Struct, &["struct_declaration"]),
            (K::Enum, &["enum_declaration"]),
            (K::Import, &["using_directive"]),
        ],
        nested: &[
            (K::Method, &["method_declaration", "constructor_declaration"]),
            (K::Variable, &["property_declaration", "field_declaration"]),
            (K::Class, &["class_declaration"]),
            (K::Interface, &["interface_declaration"]),
            (K::Struct, &["struct_declaration"]),
            (K::Enum, &["enum_declaration"]),
        ],
        internal: &[
            (K::Variable, Low, &["local_declaration_statement"]),
            (
                K::ControlFlow,
                Medium,
                &[
                    "if_statement",
                    "for_statement",
                    "foreach_statement",
                    "while_statement",
                    "do_statement",
                    "switch_statement",
                    "try_statement",
                ],
            ),
            (K::Return, High, C_LIKE_RETURN),
            (K::Throw, High, &["throw_statement", "throw_expression"]),
        ],
        name_slots: &[],
        control_flow: &[
            "if_statement",
            "for_statement",
            "foreach_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "switch_section",
            "catch_clause",
            "conditional_expression",
        ],
        nesting: &[
            "if_statement",
            "for_statement",
            "foreach_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
        calls: &["invocation_expression"],
        top_level_patterns: &[
            pat!(K::Import, r"(?m)^using[ \t]+(?:static[ \t]+)?([\w.]+)[ \t]*;", 0.9),
            pat!(K::Namespace, r"(?m)^namespace[ \t]+([\w.]+)", 0.9),
            pat!(K::Class, r"(?m)^[ \t]*(?:(?:public|private|protected|internal|static|abstract|sealed|partial)[ \t]+)*(?:class|record)[ \t]+(\w+)", 0.85),
            pat!(K::Interface, r"(?m)^[ \t]*(?:(?:public|private|protected|internal|partial)[ \t]+)*interface[ \t]+(\w+)", 0.85),
            pat!(K::Struct, r"(?m)^[ \t]*(?:(?:public|private|protected|internal|readonly|partial)[ \t]+)*struct[ \t]+(\w+)", 0.85),
            pat!(K::Enum, r"(?m)^[ \t]*(?:(?:public|private|protected|internal)[ \t]+)*enum[ \t]+(\w+)", 0.85),
        ],
        nested_patterns: JAVA_LIKE_NESTED_PATTERNS,
        internal_patterns: JAVA_LIKE_INTERNAL_PATTERNS,
    }
}

// Ruby

fn ruby_config() -> LanguageConfig {
    LanguageConfig {
        name: "ruby",
        aliases: &["rb"],
        extensions: &["rb", "rake"],
        block_style: BlockStyle::EndKeyword,
        heritage: HeritageFamily::RubyLt,
        top_level: &[
            (K::Class, &["class"]),
            (K::Module, &["module"]),
            (K::Function, &["method", "singleton_method"]),
        ],
        nested: &[
            (K::Method, &["method", "singleton_method"]),
            (K::Class, &["class"]),
            (K::Module, &["module"]),
        ],
        internal: &[
            (K::Variable, Low, &["assignment"]),
            (
                K::ControlFlow,
                Medium,
                &["if", "unless", "while", "until", "for", "case", "begin"],
            ),
            (K::Return, High, &["return"]),
        ],
        name_slots: &[("assignment", &["left"])],
        control_flow: &["if", "elsif", "unless", "while", "until", "for", "when", "rescue", "conditional"],
        nesting: &["if", "unless", "while", "until", "for", "case", "begin"],
        calls: &["call"],
        top_level_patterns: &[
            pat!(K::Import, r#"(?m)^require(?:_relative)?[ \t]*\(?[ \t]*['"]([^'"\n]+)['"]"#, 0.9),
            pat!(K::Class, r"(?m)^class[ \t]+([A-Z][\w]*(?:::\w+)*)", 0.9),
            pat!(K::Module, r"(?m)^module[ \t]+([A-Z][\w]*(?:::\w+)*)", 0.9),
            pat!(K::Function, r"(?m)^def[ \t]+(?:self\.)?([\w?!=]+)", 0.85),
        ],
        nested_patterns: &[
            pat!(K::Function, r"(?m)^[ \t]+def[ \t]+(?:self\.)?([\w?!=]+)", 0.85),
            pat!(K::Class, r"(?m)^[ \t]+class[ \t]+([A-Z]\w*)", 0.8),
        ],
        internal_patterns: &[
            ipat!(K::Variable, Low, r"(?m)^[ \t]+(@{0,2}[a-z_]\w*)[ \t]*=[^=~]", 0.7),
            ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]+(if|unless|while|until|case|begin|for)\b", 0.75),
            ipat!(K::Return, High, r"(?m)^[ \t]+return\b", 0.8),
            ipat!(K::Throw, High, r"(?m)^[ \t]+raise\b", 0.8),
        ],
    }
}

// PHP

fn php_config() -> LanguageConfig {
    LanguageConfig {
        name: "php",
        aliases: &[],
        extensions: &["php"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::BraceClause,
        top_level: &[
            (K::Class, &["class_declaration"]),
            (K::Interface, &["interface_declaration"]),
            (K::Trait, &["trait_declaration"]),
            (K::Function, &["function_definition"]),
            (K::Namespace, &["namespace_definition"]),
            (K::Import, &["namespace_use_declaration"]),
        ],
        nested: &[
            (K::Method, &["method_declaration"]),
            (K::Variable, &["property_declaration"]),
        ],
        internal: &[
            (K::Variable, Low, &["assignment_expression"]),
            (
                K::ControlFlow,
                Medium,
                &[
                    "if_statement",
                    "for_statement",
                    "foreach_statement",
                    "while_statement",
                    "switch_statement",
                    "try_statement",
                ],
            ),
            (K::Return, High, C_LIKE_RETURN),
            (K::Throw, High, &["throw_expression"]),
        ],
        name_slots: &[],
        control_flow: &[
            "if_statement",
            "for_statement",
            "foreach_statement",
            "while_statement",
            "switch_statement",
            "case_statement",
            "catch_clause",
            "conditional_expression",
        ],
        nesting: C_NESTING,
        calls: &["function_call_expression", "member_call_expression"],
        top_level_patterns: &[
            pat!(K::Namespace, r"(?m)^namespace[ \t]+([\w\\]+)", 0.9),
            pat!(K::Import, r"(?m)^use[ \t]+([\w\\]+)", 0.85),
            pat!(K::Class, r"(?m)^(?:(?:abstract|final|readonly)[ \t]+)*class[ \t]+(\w+)", 0.9),
            pat!(K::Interface, r"(?m)^interface[ \t]+(\w+)", 0.9),
            pat!(K::Trait, r"(?m)^trait[ \t]+(\w+)", 0.9),
            pat!(K::Function, r"(?m)^function[ \t]+(\w+)", 0.9),
        ],
        nested_patterns: &[pat!(
            K::Method,
            r"(?m)^[ \t]+(?:(?:public|private|protected|static|abstract|final)[ \t]+)*function[ \t]+(\w+)",
            0.85,
        )],
        internal_patterns: &[
            ipat!(K::Variable, Low, r"(?m)^[ \t]+\$(\w+)[ \t]*=[^=]", 0.7),
            ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]*(?:\}[ \t]*else[ \t]*)?(if|for|foreach|while|switch|try)\b", 0.75),
            ipat!(K::Return, High, r"(?m)^[ \t]*return\b", 0.8),
            ipat!(K::Throw, High, r"(?m)^[ \t]*throw\b", 0.8),
        ],
    }
}

// Kotlin

fn kotlin_config() -> LanguageConfig {
    LanguageConfig {
        name: "kotlin",
        aliases: &["kt"],
        extensions: &["kt", "kts"],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::ColonBases,
        top_level: &[
            (K::Class, &["class_declaration", "object_declaration"]),
            (K::Function, &["function_declaration"]),
            (K::Type, &["type_alias"]),
            (K::Import, &["import_header", "import"]),
            (K::Module, &["package_header"]),
            (K::Variable, &["property_declaration"]),
        ],
        nested: &[
            (K::Function, &["function_declaration"]),
            (K::Class, &["class_declaration", "object_declaration", "companion_object"]),
            (K::Variable, &["property_declaration"]),
        ],
        internal: &[
            (K::Variable, Low, &["property_declaration"]),
            (
                K::ControlFlow,
                Medium,
                &["if_expression", "when_expression", "for_statement", "while_statement", "try_expression"],
            ),
            (K::Return, High, &["jump_expression"]),
        ],
        name_slots: &[],
        control_flow: &[
            "if_expression",
            "when_expression",
            "when_entry",
            "for_statement",
            "while_statement",
            "do_while_statement",
            "catch_block",
        ],
        nesting: &["if_expression", "when_expression", "for_statement", "while_statement", "do_while_statement", "try_expression"],
        calls: &["call_expression"],
        top_level_patterns: &[
            pat!(K::Module, r"(?m)^package[ \t]+([\w.]+)", 0.9),
            pat!(K::Import, r"(?m)^import[ \t]+([\w.*]+)", 0.9),
            pat!(K::Interface, r"(?m)^(?:(?:public|internal|private|sealed|fun)[ \t]+)*interface[ \t]+(\w+)", 0.9),
            pat!(K::Class, r"(?m)^(?:(?:data|sealed|abstract|open|enum|inner|annotation|value|private|internal|public)[ \t]+)*(?:class|object)[ \t]+(\w+)", 0.9),
            pat!(K::Function, r"(?m)^(?:(?:private|internal|public|suspend|inline|operator|infix|tailrec)[ \t]+)*fun[ \t]+(?:<[^>\n]*>[ \t]*)?(?:[\w.]+\.)?(\w+)", 0.9),
            pat!(K::Constant, r"(?m)^(?:(?:private|internal|public)[ \t]+)*const[ \t]+val[ \t]+(\w+)", 0.8),
            pat!(K::Variable, r"(?m)^(?:(?:private|internal|public)[ \t]+)*(?:val|var)[ \t]+(\w+)", 0.7),
        ],
        nested_patterns: &[
            pat!(K::Function, r"(?m)^[ \t]+(?:(?:private|internal|public|protected|override|open|suspend|inline|abstract)[ \t]+)*fun[ \t]+(?:<[^>\n]*>[ \t]*)?(?:[\w.]+\.)?(\w+)", 0.85),
            pat!(K::Class, r"(?m)^[ \t]+(?:(?:data|sealed|abstract|open|enum|inner|private|internal|public|companion)[ \t]+)*(?:class|object)[ \t]+(\w+)", 0.8),
        ],
        internal_patterns: &[
            ipat!(K::Variable, Low, r"(?m)^[ \t]+(?:val|var)[ \t]+(\w+)", 0.75),
            ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]*(?:\}[ \t]*else[ \t]+)?(if|when|for|while|try)\b", 0.75),
            ipat!(K::Return, High, r"(?m)^[ \t]*return\b", 0.8),
            ipat!(K::Throw, High, r"(?m)^[ \t]*throw\b", 0.8),
        ],
    }
}

// Documents

fn json_config() -> LanguageConfig {
    LanguageConfig {
        name: "json",
        aliases: &["jsonc"],
        extensions: &["json", "jsonc"],
        block_style: BlockStyle::Document,
        heritage: HeritageFamily::None,
        top_level: &[(K::Document, &["document"])],
        nested: &[(K::Variable, &["pair"])],
        internal: &[],
        name_slots: &[("pair", &["key"])],
        control_flow: &[],
        nesting: &[],
        calls: &[],
        top_level_patterns: &[],
        nested_patterns: &[pat!(K::Variable, r#"(?m)^(?: {2}|\t)"([^"\n]+)"[ \t]*:"#, 0.75)],
        internal_patterns: &[],
    }
}

fn yaml_config() -> LanguageConfig {
    LanguageConfig {
        name: "yaml",
        aliases: &["yml"],
        extensions: &["yaml", "yml"],
        top_level: &[(K::Document, &["stream", "document"])],
        nested: &[(K::Variable, &["block_mapping_pair"])],
        name_slots: &[("block_mapping_pair", &["key"])],
        nested_patterns: &[pat!(K::Variable, r"(?m)^([A-Za-z_][\w.\-]*)[ \t]*:", 0.75)],
        ..json_config()
    }
}

fn markdown_config() -> LanguageConfig {
    LanguageConfig {
        name: "markdown",
        aliases: &["md"],
        extensions: &["md", "markdown"],
        block_style: BlockStyle::Markdown,
        top_level: &[(K::Section, &["section"])],
        nested: &[],
        name_slots: &[],
        nested_patterns: &[],
        ..json_config()
    }
}

/// Language-agnostic patterns for files whose language has no entry.
fn generic_config() -> LanguageConfig {
    LanguageConfig {
        name: "generic",
        aliases: &[],
        extensions: &[],
        block_style: BlockStyle::Braces,
        heritage: HeritageFamily::BraceClause,
        top_level: &[],
        nested: &[],
        internal: &[],
        name_slots: &[],
        control_flow: &[],
        nesting: &[],
        calls: &[],
        top_level_patterns: &[
            pat!(K::Function, r"(?m)^(?:export[ \t]+)?(?:async[ \t]+)?function[ \t]+([A-Za-z_$][\w$]*)", 0.7),
            pat!(K::Function, r"(?m)^(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)", 0.7),
            pat!(K::Function, r"(?m)^(?:pub[ \t]+)?fn[ \t]+([A-Za-z_]\w*)", 0.7),
            pat!(K::Function, r"(?m)^func[ \t]+(?:\([^)\n]*\)[ \t]*)?([A-Za-z_]\w*)", 0.7),
            pat!(K::Class, r"(?m)^(?:export[ \t]+)?(?:public[ \t]+)?(?:abstract[ \t]+)?class[ \t]+([A-Za-z_$][\w$]*)", 0.7),
            pat!(K::Interface, r"(?m)^(?:export[ \t]+)?(?:public[ \t]+)?interface[ \t]+([A-Za-z_$][\w$]*)", 0.7),
        ],
        nested_patterns: &[],
        internal_patterns: &[
            ipat!(K::ControlFlow, Medium, r"(?m)^[ \t]*(?:\}[ \t]*else[ \t]+)?(if|for|while|switch|try)\b", 0.6),
            ipat!(K::Return, High, r"(?m)^[ \t]*return\b", 0.7),
        ],
    }
}

/// Names that a loose pattern may capture but that are never declarations.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_patterns_compile() {
        let configs = vec![
            javascript_config(),
            typescript_config(),
            python_config(),
            rust_config(),
            go_config(),
            java_config(),
            c_config(),
            cpp_config(),
            csharp_config(),
            ruby_config(),
            php_config(),
            kotlin_config(),
            json_config(),
            yaml_config(),
            markdown_config(),
            generic_config(),
        ];
        for config in configs {
            for spec in config
                .top_level_patterns
                .iter()
                .chain(config.nested_patterns)
                .chain(config.internal_patterns)
            {
                assert!(
                    Regex::new(spec.pattern).is_ok(),
                    "{} pattern failed to compile: {}",
                    config.name,
                    spec.pattern
                );
            }
        }
    }

    #[test]
    fn test_lookup_by_alias_and_extension() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.get("JS").name(), "javascript");
        assert_eq!(registry.get("tsx").name(), "typescript");
        assert_eq!(registry.get("brainfuck").name(), "generic");
        assert!(!registry.is_known("brainfuck"));
        let languages = registry.languages();
        assert_eq!(languages.len(), 15);
        assert!(languages.contains(&"kotlin".to_string()));
        assert_eq!(
            registry.language_for_path(Path::new("lib/app.py")).as_deref(),
            Some("python")
        );
        assert_eq!(
            registry.language_for_path(Path::new("README.md")).as_deref(),
            Some("markdown")
        );
    }

    #[test]
    fn test_generic_rules_union_node_types() {
        let registry = LanguageRegistry::builtin();
        let generic = registry.generic();
        assert_eq!(generic.top_level_kind("function_item"), Some(StructureKind::Function));
        assert_eq!(generic.top_level_kind("class_definition"), Some(StructureKind::Class));
        assert_eq!(generic.top_level_kind("interface_declaration"), Some(StructureKind::Interface));
        assert!(generic.is_control_flow("if_statement"));
    }

    #[test]
    fn test_name_slots() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.get("rust").name_slot_for("impl_item"), &["type"]);
        assert_eq!(registry.get("rust").name_slot_for("function_item"), &["name"]);
    }

    #[test]
    fn test_nested_member_patterns() {
        let rust = Regex::new(rust_config().nested_patterns[0].pattern).unwrap();
        let caps = rust.captures("impl Circle {\n    pub async fn area(&self) {}\n}").unwrap();
        assert_eq!(&caps[1], "area");
        assert_eq!(rust_config().nested_patterns[0].confidence, 0.85);

        let php = Regex::new(php_config().nested_patterns[0].pattern).unwrap();
        let caps = php.captures("class A {\n    public static function make() {}\n}").unwrap();
        assert_eq!(&caps[1], "make");
        assert_eq!(php_config().nested_patterns[0].kind, StructureKind::Method);

        let pattern = ipat!(StructureKind::Return, Importance::High, r"return", 0.8,);
        assert_eq!(pattern.importance, Importance::High);
    }

    #[test]
    fn test_reserved_words() {
        assert!(is_reserved_word("if"));
        assert!(is_reserved_word("return"));
        assert!(!is_reserved_word("iffy"));
    }
}
