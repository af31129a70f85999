//! Relationships between extracted structures: containment, heritage,
//! references and import dependencies.
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::imports::scan_imports;
use super::languages::{HeritageFamily, LanguageRegistry, LanguageRules, is_reserved_word};
use super::lines::split_lines;
use crate::models::{
    CodeDependency, CodeReference, DependencyKind, ExtractedStructures, Location, NestingKind,
    NestingRelationship, ReferenceKind, StructureKind, StructureRef,
};
use crate::parser::walker::{IDENTIFIER_KINDS, find_all_by_type, is_identifier_kind};
use crate::parser::{NodeId, Point, SyntaxTree};

static CALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Za-z_$][\w$]*)[ \t]*\(").unwrap());
static DECLARATION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bfunction[ \t]*\*?|\bdef|\bfn|\bfunc|\bclass|\binterface|\bstruct|\btrait|\benum|\bsub|\bproc)[ \t]*$")
        .unwrap()
});
static NEW_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bnew[ \t]+$").unwrap());
static TYPE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(?:->|:)[ \t]*|\bnew[ \t]+|<[ \t]*|\bas[ \t]+)([A-Z][A-Za-z0-9_]*)").unwrap()
});

static BRACE_EXTENDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bextends\s+([\w.$]+(?:\s*<[^{>]*>)?(?:\s*,\s*[\w.$]+(?:\s*<[^{>]*>)?)*)").unwrap()
});
static BRACE_IMPLEMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bimplements\s+([\w.$]+(?:\s*<[^{>]*>)?(?:\s*,\s*[\w.$]+(?:\s*<[^{>]*>)?)*)").unwrap()
});
static COLON_BASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:class|struct|interface|object|record|protocol|enum)\s+\w+(?:\s*<[^>{]*>)?(?:\s*\([^)]*\))?\s*:\s*([^{;]+)")
        .unwrap()
});
static WHERE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bwhere\b.*$").unwrap());
static PYTHON_BASES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+\w+\s*\(([^)]*)\)").unwrap());
static RUST_IMPL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bimpl(?:\s*<[^{]*?>)?\s+([\w:]+)(?:\s*<[^{]*?>)?\s+for\s+([\w:]+)").unwrap()
});
static RUST_SUPERTRAITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btrait\s+\w+(?:\s*<[^{]*?>)?\s*:\s*([^{]+)").unwrap());
static RUBY_SUPERCLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+[\w:]+\s*<\s*([\w:]+)").unwrap());
static GENERIC_ARGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());
static ACCESS_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:public|private|protected|virtual|internal|open)\s+)+").unwrap()
});

/// Words that look like calls in text but are not.
const CALL_STOPWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "func", "fn", "def", "lambda", "except", "when", "unless",
    "until", "elsif", "print", "super", "self", "this",
];

/// Fields that hold base types in grammars that expose them.
const HERITAGE_FIELDS: &[(&str, bool)] = &[("superclass", false), ("superclasses", false), ("interfaces", true)];

/// Name of the file-level scope in references and module dependencies.
pub const FILE_SCOPE: &str = "<module>";

/// Header lines scanned for heritage clauses.
const HEADER_LINES: usize = 5;
const HERITAGE_STRENGTH: f32 = 1.0;

/// How containment strength is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthStrategy {
    /// Child lines over parent lines.
    #[default]
    SizeRatio,
    /// Decays with the distance between the two start lines.
    DistanceDecay,
}

impl StrengthStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthStrategy::SizeRatio => "size_ratio",
            StrengthStrategy::DistanceDecay => "distance_decay",
        }
    }

    /// Always within `[0.1, 1.0]`.
    pub fn strength(&self, parent: &Location, child: &Location) -> f32 {
        let raw = match self {
            StrengthStrategy::SizeRatio => child.line_count() as f32 / parent.line_count() as f32,
            StrengthStrategy::DistanceDecay => {
                let distance = child.start_line.abs_diff(parent.start_line) as f32;
                1.0 / (1.0 + distance / 10.0)
            }
        };
        raw.clamp(0.1, 1.0)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelationshipAnalysis {
    pub nesting: Vec<NestingRelationship>,
    pub references: Vec<CodeReference>,
    pub dependencies: Vec<CodeDependency>,
}

impl RelationshipAnalysis {
    /// Caller name to the names it calls.
    pub fn call_graph(&self) -> BTreeMap<String, Vec<String>> {
        group(
            self.references
                .iter()
                .filter(|r| r.kind == ReferenceKind::FunctionCall)
                .map(|r| (r.from.name.clone(), r.name.clone())),
        )
    }

    /// Type name to the bases it extends or implements.
    pub fn inheritance_hierarchy(&self) -> BTreeMap<String, Vec<String>> {
        group(
            self.dependencies
                .iter()
                .filter(|d| d.kind != DependencyKind::Import)
                .filter_map(|d| d.from.as_ref().map(|from| (from.name.clone(), d.target.clone()))),
        )
    }

    /// Importing structure to import targets; file-level imports are keyed `<module>`.
    pub fn module_dependencies(&self) -> BTreeMap<String, Vec<String>> {
        group(
            self.dependencies
                .iter()
                .filter(|d| d.kind == DependencyKind::Import)
                .map(|d| {
                    let key = d
                        .from
                        .as_ref()
                        .map(|f| f.name.clone())
                        .unwrap_or_else(|| FILE_SCOPE.to_string());
                    (key, d.target.clone())
                }),
        )
    }
}

fn group(pairs: impl Iterator<Item = (String, String)>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().insert(value);
    }
    grouped
        .into_iter()
        .map(|(k, v)| (k, v.into_iter().collect()))
        .collect()
}

pub struct RelationshipAnalyzer {
    registry: Arc<LanguageRegistry>,
    strategy: StrengthStrategy,
}

impl RelationshipAnalyzer {
    pub fn new(registry: Arc<LanguageRegistry>, strategy: StrengthStrategy) -> Self {
        Self { registry, strategy }
    }

    pub fn analyze(&self, structures: &ExtractedStructures, content: &str) -> RelationshipAnalysis {
        let rules = self.registry.get(&structures.language);
        let named = structures.named_refs();
        let tree = structures.tree.as_ref();

        let mut nesting = self.containment(&named, tree);
        let (heritage_edges, mut dependencies) = heritage(rules.as_ref(), &named, content, tree);
        nesting.extend(heritage_edges);

        let references = find_references(rules.as_ref(), &named, content, tree);
        let mut used = HashSet::new();
        for reference in &references {
            if reference.kind != ReferenceKind::TypeReference {
                continue;
            }
            let Some(to) = &reference.to else { continue };
            if *to == reference.from || !used.insert((reference.from.clone(), to.clone())) {
                continue;
            }
            nesting.push(NestingRelationship {
                parent: reference.from.clone(),
                child: to.clone(),
                kind: NestingKind::Uses,
                strength: reference.confidence,
            });
        }

        let mut imports = find_dependencies(&named, content);
        imports.append(&mut dependencies);
        imports.sort_by_key(|d| d.line);

        RelationshipAnalysis {
            nesting,
            references,
            dependencies: imports,
        }
    }

    /// Every ordered pair where one structure's range encloses another's.
    /// Identical ranges yield only the edge from the earlier structure.
    pub fn containment(&self, structures: &[StructureRef], tree: Option<&SyntaxTree>) -> Vec<NestingRelationship> {
        let spans: Vec<(Point, Point)> = structures.iter().map(|s| span(s, tree)).collect();
        let mut edges = Vec::new();
        for (i, parent) in structures.iter().enumerate() {
            for (j, child) in structures.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (outer, inner) = (spans[i], spans[j]);
                if outer.0 > inner.0 || inner.1 > outer.1 || (outer == inner && i > j) {
                    continue;
                }
                edges.push(NestingRelationship {
                    parent: parent.clone(),
                    child: child.clone(),
                    kind: NestingKind::Contains,
                    strength: self.strategy.strength(&parent.location, &child.location),
                });
            }
        }
        edges
    }
}

/// Tree range when the structure has a node, otherwise its whole lines.
fn span(structure: &StructureRef, tree: Option<&SyntaxTree>) -> (Point, Point) {
    if let (Some(tree), Some(id)) = (tree, structure.node)
        && let Some(node) = tree.get(id)
    {
        return (node.start, node.end);
    }
    (
        Point {
            row: structure.location.start_line.saturating_sub(1),
            column: 0,
        },
        Point {
            row: structure.location.end_line.saturating_sub(1),
            column: usize::MAX,
        },
    )
}

/// Smallest structure containing `line`, skipping imports and exports. Ties go
/// to the later entry, which is the nested one.
fn innermost<'a>(
    structures: &'a [StructureRef],
    line: usize,
    exclude: Option<&StructureRef>,
) -> Option<&'a StructureRef> {
    structures
        .iter()
        .enumerate()
        .filter(|(_, s)| !matches!(s.kind, StructureKind::Import | StructureKind::Export))
        .filter(|(_, s)| Some(*s) != exclude && s.location.contains_line(line))
        .min_by_key(|(i, s)| (s.location.line_count(), std::cmp::Reverse(*i)))
        .map(|(_, s)| s)
}

fn find_type<'a>(structures: &'a [StructureRef], name: &str, exclude: &StructureRef) -> Option<&'a StructureRef> {
    structures
        .iter()
        .find(|s| s.kind.is_type_like() && s.name == name && *s != exclude)
}

// ── Heritage ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Heritage {
    extends: Vec<String>,
    implements: Vec<String>,
}

impl Heritage {
    fn is_empty(&self) -> bool {
        self.extends.is_empty() && self.implements.is_empty()
    }
}

fn heritage(
    rules: &dyn LanguageRules,
    structures: &[StructureRef],
    content: &str,
    tree: Option<&SyntaxTree>,
) -> (Vec<NestingRelationship>, Vec<CodeDependency>) {
    let family = rules.heritage();
    if family == HeritageFamily::None {
        return (Vec::new(), Vec::new());
    }
    let lines = split_lines(content);
    let mut edges = Vec::new();
    let mut dependencies = Vec::new();

    for structure in structures {
        if !structure.kind.is_type_like() && structure.kind != StructureKind::Impl {
            continue;
        }

        // `impl Trait for Type` relates the trait to the implementing type
        if family == HeritageFamily::RustImpl && structure.kind == StructureKind::Impl {
            let header = header_text(&lines, structure.location);
            let Some(caps) = RUST_IMPL.captures(&header) else { continue };
            let trait_name = base_name(&caps[1]);
            let type_name = base_name(&caps[2]);
            let child = find_type(structures, &type_name, structure).unwrap_or(structure);
            let parent = find_type(structures, &trait_name, child);
            push_heritage(
                &mut edges,
                &mut dependencies,
                structure,
                child,
                parent,
                trait_name,
                true,
            );
            continue;
        }

        let mut found = tree
            .zip(structure.node)
            .map(|(tree, node)| tree_heritage(tree, node))
            .unwrap_or_default();
        if found.is_empty() {
            found = text_heritage(family, rules.name(), structure, &header_text(&lines, structure.location));
        }

        for (names, implements) in [(found.extends, false), (found.implements, true)] {
            for name in names {
                let parent = find_type(structures, &name, structure);
                push_heritage(
                    &mut edges,
                    &mut dependencies,
                    structure,
                    structure,
                    parent,
                    name,
                    implements,
                );
            }
        }
    }
    (edges, dependencies)
}

fn push_heritage(
    edges: &mut Vec<NestingRelationship>,
    dependencies: &mut Vec<CodeDependency>,
    from: &StructureRef,
    child: &StructureRef,
    parent: Option<&StructureRef>,
    target: String,
    implements: bool,
) {
    let (dependency_kind, nesting_kind) = if implements {
        (DependencyKind::Implementation, NestingKind::Implements)
    } else {
        (DependencyKind::Inheritance, NestingKind::Extends)
    };
    dependencies.push(CodeDependency {
        from: Some(from.clone()),
        kind: dependency_kind,
        target,
        line: from.location.start_line,
        confidence: if parent.is_some() { 0.9 } else { 0.6 },
    });
    if let Some(parent) = parent {
        edges.push(NestingRelationship {
            parent: parent.clone(),
            child: child.clone(),
            kind: nesting_kind,
            strength: HERITAGE_STRENGTH,
        });
    }
}

/// Declaration text up to the opening brace, at most a few lines.
fn header_text(lines: &[&str], location: Location) -> String {
    let start = location.start_line.saturating_sub(1);
    let last = (start + HEADER_LINES - 1).min(location.end_line.saturating_sub(1));
    let mut header = String::new();
    for line in lines.iter().take(last + 1).skip(start) {
        if let Some(brace) = line.find('{') {
            header.push_str(&line[..brace]);
            break;
        }
        header.push_str(line);
        header.push(' ');
        if line.trim_end().ends_with(':') {
            break;
        }
    }
    header
}

/// Last path segment with generic arguments removed.
fn base_name(text: &str) -> String {
    let text = text.split(['<', '[', '(']).next().unwrap_or_default().trim();
    text.rsplit(['.', ':', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn is_identifier(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
}

/// Comma-separated base list; the flag records whether a base carried a
/// constructor call.
fn split_bases(text: &str) -> Vec<(String, bool)> {
    let mut text = text.to_string();
    while GENERIC_ARGS.is_match(&text) {
        text = GENERIC_ARGS.replace_all(&text, "").into_owned();
    }
    text.split(',')
        .filter_map(|part| {
            let part = ACCESS_PREFIX.replace(part.trim(), "");
            let name = base_name(&part);
            is_identifier(&name).then(|| (name, part.contains('(')))
        })
        .collect()
}

fn text_heritage(family: HeritageFamily, language: &str, structure: &StructureRef, header: &str) -> Heritage {
    let mut found = Heritage::default();
    match family {
        HeritageFamily::BraceClause => {
            if let Some(caps) = BRACE_EXTENDS.captures(header) {
                found.extends = split_bases(&caps[1]).into_iter().map(|(n, _)| n).collect();
            }
            if let Some(caps) = BRACE_IMPLEMENTS.captures(header) {
                found.implements = split_bases(&caps[1]).into_iter().map(|(n, _)| n).collect();
            }
        }
        HeritageFamily::ColonBases => {
            let Some(caps) = COLON_BASES.captures(header) else { return found };
            let bases = WHERE_CLAUSE.replace(&caps[1], "");
            let is_interface = structure.kind == StructureKind::Interface;
            for (position, (name, called)) in split_bases(&bases).into_iter().enumerate() {
                let implements = match language {
                    _ if is_interface => false,
                    "csharp" => {
                        let mut chars = name.chars();
                        chars.next() == Some('I') && chars.next().is_some_and(char::is_uppercase)
                    }
                    "kotlin" => !called,
                    "swift" => position > 0,
                    _ => false,
                };
                if implements {
                    found.implements.push(name);
                } else {
                    found.extends.push(name);
                }
            }
        }
        HeritageFamily::PythonBases => {
            if let Some(caps) = PYTHON_BASES.captures(header) {
                found.extends = caps[1]
                    .split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty() && !b.contains('=') && *b != "object")
                    .map(base_name)
                    .filter(|b| is_identifier(b))
                    .collect();
            }
        }
        HeritageFamily::RustImpl => {
            if structure.kind == StructureKind::Trait
                && let Some(caps) = RUST_SUPERTRAITS.captures(header)
            {
                found.extends = caps[1]
                    .split('+')
                    .map(str::trim)
                    .filter(|b| !b.starts_with('\'') && !b.starts_with('?'))
                    .map(base_name)
                    .filter(|b| is_identifier(b))
                    .collect();
            }
        }
        HeritageFamily::RubyLt => {
            if let Some(caps) = RUBY_SUPERCLASS.captures(header) {
                found.extends.push(base_name(&caps[1]));
            }
        }
        HeritageFamily::None => {}
    }
    found
}

fn tree_heritage(tree: &SyntaxTree, node: NodeId) -> Heritage {
    let mut found = Heritage::default();
    for (field, implements) in HERITAGE_FIELDS {
        let Some(child) = tree.child_by_field(node, field) else { continue };
        let names = heritage_names(tree, child);
        if *implements {
            found.implements.extend(names);
        } else {
            found.extends.extend(names);
        }
    }
    found
}

fn heritage_names(tree: &SyntaxTree, id: NodeId) -> Vec<String> {
    let kind = tree.kind(id);
    if matches!(kind, "keyword_argument" | "comment") {
        return Vec::new();
    }
    if is_identifier_kind(kind)
        || matches!(
            kind,
            "generic_type" | "scoped_type_identifier" | "scoped_identifier" | "attribute" | "subscript" | "member_expression"
        )
    {
        let name = base_name(tree.text(id));
        return if is_identifier(&name) { vec![name] } else { Vec::new() };
    }
    tree.children(id)
        .iter()
        .filter(|c| tree.get(**c).is_some_and(|n| n.named))
        .flat_map(|c| heritage_names(tree, *c))
        .collect()
}

// ── References ───────────────────────────────────────────────────────

fn find_references(
    rules: &dyn LanguageRules,
    structures: &[StructureRef],
    content: &str,
    tree: Option<&SyntaxTree>,
) -> Vec<CodeReference> {
    let module = file_scope(content);
    let mut references = match tree {
        Some(tree) => tree_calls(rules, structures, tree, &module),
        None => text_calls(structures, content, &module),
    };
    references.extend(type_references(structures, content, &module));
    references.extend(variable_references(structures, content, &module));

    let mut seen = HashSet::new();
    references.retain(|r| seen.insert((r.from.clone(), r.kind, r.name.clone(), r.line)));
    references.sort_by_key(|r| r.line);
    references
}

/// The whole file, credited with references made outside every structure.
pub fn file_scope(content: &str) -> StructureRef {
    StructureRef {
        kind: StructureKind::Module,
        name: FILE_SCOPE.to_string(),
        location: Location::new(1, content.lines().count().max(1)),
        node: None,
    }
}

fn is_call_stopword(name: &str) -> bool {
    is_reserved_word(name) || CALL_STOPWORDS.contains(&name)
}

/// Function-like declarations first, then types (constructor calls), then anything.
fn resolve_callee<'a>(structures: &'a [StructureRef], name: &str) -> Option<&'a StructureRef> {
    let named = || structures.iter().filter(move |s| s.name == name);
    named()
        .find(|s| s.kind.is_function_like())
        .or_else(|| named().find(|s| s.kind.is_type_like()))
        .or_else(|| named().find(|s| !matches!(s.kind, StructureKind::Import | StructureKind::Export)))
}

fn call_reference(structures: &[StructureRef], from: &StructureRef, name: String, line: usize) -> CodeReference {
    let to = resolve_callee(structures, &name).cloned();
    CodeReference {
        from: from.clone(),
        confidence: if to.is_some() { 0.9 } else { 0.5 },
        to,
        kind: ReferenceKind::FunctionCall,
        name,
        line,
    }
}

fn tree_calls(
    rules: &dyn LanguageRules,
    structures: &[StructureRef],
    tree: &SyntaxTree,
    module: &StructureRef,
) -> Vec<CodeReference> {
    let mut references = Vec::new();
    for id in (0..tree.len()).map(NodeId) {
        let Some(node) = tree.get(id) else { continue };
        if !node.named || !rules.is_call(&node.kind) {
            continue;
        }
        let line = node.start.row + 1;
        let Some(name) = callee_name(tree, id) else { continue };
        if is_call_stopword(&name) {
            continue;
        }
        let from = innermost(structures, line, None).unwrap_or(module);
        references.push(call_reference(structures, from, name, line));
    }
    references
}

/// Last identifier of the called expression, so `a.b.c()` is `c`.
fn callee_name(tree: &SyntaxTree, call: NodeId) -> Option<String> {
    let target = ["function", "name", "method", "macro"]
        .iter()
        .find_map(|field| tree.child_by_field(call, field))
        .or_else(|| {
            tree.children(call)
                .iter()
                .copied()
                .find(|c| tree.get(*c).is_some_and(|n| n.named))
        })?;
    if is_identifier_kind(tree.kind(target)) {
        return Some(tree.text(target).to_string());
    }
    find_all_by_type(tree, target, IDENTIFIER_KINDS)
        .last()
        .map(|id| tree.text(*id).to_string())
}

fn text_calls(structures: &[StructureRef], content: &str, module: &StructureRef) -> Vec<CodeReference> {
    let mut references = Vec::new();
    for (index, line_text) in content.lines().enumerate() {
        let line = index + 1;
        for caps in CALL.captures_iter(line_text) {
            let Some(m) = caps.get(1) else { continue };
            let name = m.as_str();
            let prefix = &line_text[..m.start()];
            if is_call_stopword(name) || DECLARATION_PREFIX.is_match(prefix) || NEW_PREFIX.is_match(prefix) {
                continue;
            }
            // the declaration itself, e.g. a method header
            if structures.iter().any(|s| s.location.start_line == line && s.name == name) {
                continue;
            }
            let from = innermost(structures, line, None).unwrap_or(module);
            references.push(call_reference(structures, from, name.to_string(), line));
        }
    }
    references
}

fn type_references(structures: &[StructureRef], content: &str, module: &StructureRef) -> Vec<CodeReference> {
    let mut references = Vec::new();
    for (index, line_text) in content.lines().enumerate() {
        let line = index + 1;
        // headers of type declarations carry heritage, not usage
        if structures
            .iter()
            .any(|s| s.location.start_line == line && (s.kind.is_type_like() || s.kind == StructureKind::Impl))
        {
            continue;
        }
        for caps in TYPE_REF.captures_iter(line_text) {
            let name = &caps[1];
            if name.len() < 2 || name == "Self" {
                continue;
            }
            let from = innermost(structures, line, None).unwrap_or(module);
            let to = structures
                .iter()
                .find(|s| s.kind.is_type_like() && s.name == name)
                .cloned();
            references.push(CodeReference {
                from: from.clone(),
                confidence: if to.is_some() { 0.8 } else { 0.4 },
                to,
                kind: ReferenceKind::TypeReference,
                name: name.to_string(),
                line,
            });
        }
    }
    references
}

/// Uses of top-level variables and constants outside their own declaration.
fn variable_references(structures: &[StructureRef], content: &str, module: &StructureRef) -> Vec<CodeReference> {
    let lines = split_lines(content);
    let mut references = Vec::new();
    let variables = structures.iter().filter(|s| {
        matches!(s.kind, StructureKind::Variable | StructureKind::Constant)
            && s.name.len() >= 2
            && s.name.chars().all(|c| c.is_alphanumeric() || c == '_')
    });
    for variable in variables {
        let Ok(pattern) = Regex::new(&format!(r"\b{}\b", regex::escape(&variable.name))) else {
            continue;
        };
        for (index, line_text) in lines.iter().enumerate() {
            let line = index + 1;
            if variable.location.contains_line(line) || !pattern.is_match(line_text) {
                continue;
            }
            let from = innermost(structures, line, Some(variable)).unwrap_or(module);
            references.push(CodeReference {
                from: from.clone(),
                to: Some(variable.clone()),
                kind: ReferenceKind::VariableReference,
                name: variable.name.clone(),
                line,
                confidence: 0.7,
            });
        }
    }
    references
}

// ── Dependencies ─────────────────────────────────────────────────────

fn find_dependencies(structures: &[StructureRef], content: &str) -> Vec<CodeDependency> {
    scan_imports(content)
        .into_iter()
        .map(|import| CodeDependency {
            from: innermost(structures, import.line, None).cloned(),
            kind: DependencyKind::Import,
            target: import.target,
            line: import.line,
            confidence: 0.95,
        })
        .collect()
}
