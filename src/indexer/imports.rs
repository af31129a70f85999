//! Language-agnostic import scanning.
//!
//! Kept separate from relationship analysis so it can be tested (and reused)
//! on plain strings. Line numbers are taken from the captured target, so a
//! pattern that starts on a preceding blank line still reports the right line.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::lines::line_of_offset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSyntax {
    EsModule,
    CommonJs,
    DynamicImport,
    Python,
    Use,
    Go,
    Java,
    Include,
    Using,
    Ruby,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawImportMatch {
    pub target: String,
    pub line: usize,
    pub syntax: ImportSyntax,
}

struct ImportPattern {
    syntax: ImportSyntax,
    regex: Regex,
    /// Whether the capture may hold several comma-separated targets.
    split_commas: bool,
}

static PATTERNS: LazyLock<Vec<ImportPattern>> = LazyLock::new(|| {
    let table: &[(ImportSyntax, &str, bool)] = &[
        (
            ImportSyntax::EsModule,
            r#"(?m)^[ \t]*(?:export|import)[ \t]+(?:type[ \t]+)?(?:[\w*{}$, \t\n]+?[ \t]+from[ \t]+)?['"]([^'"\n]+)['"]"#,
            false,
        ),
        (
            ImportSyntax::CommonJs,
            r#"\brequire[ \t]*\([ \t]*['"]([^'"\n]+)['"][ \t]*\)"#,
            false,
        ),
        (
            ImportSyntax::DynamicImport,
            r#"\bimport[ \t]*\([ \t]*['"]([^'"\n]+)['"]"#,
            false,
        ),
        (
            ImportSyntax::Python,
            r"(?m)^[ \t]*from[ \t]+([\w.]+)[ \t]+import\b",
            false,
        ),
        (
            ImportSyntax::Python,
            r"(?mR)^[ \t]*import[ \t]+([\w.]+(?:[ \t]*,[ \t]*[\w.]+)*)[ \t]*(?:#.*)?$",
            true,
        ),
        (
            ImportSyntax::Java,
            r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?([\w.]+(?:\.\*)?)[ \t]*;",
            false,
        ),
        (
            ImportSyntax::Use,
            r"(?m)^[ \t]*(?:pub(?:\([^)\n]*\))?[ \t]+)?use[ \t]+([\w:\\]+(?:::\{[^}]*\}|::\*)?)[ \t]*;",
            false,
        ),
        (
            ImportSyntax::Go,
            r#"(?m)^[ \t]*import[ \t]+(?:[\w.]+[ \t]+)?"([^"\n]+)""#,
            false,
        ),
        (
            ImportSyntax::Include,
            r#"(?m)^[ \t]*#[ \t]*include[ \t]*[<"]([^>"\n]+)[>"]"#,
            false,
        ),
        (
            ImportSyntax::Using,
            r"(?m)^[ \t]*using[ \t]+(?:static[ \t]+)?([\w.]+)[ \t]*;",
            false,
        ),
        (
            ImportSyntax::Ruby,
            r#"(?m)^[ \t]*require(?:_relative)?[ \t]*\(?[ \t]*['"]([^'"\n]+)['"]"#,
            false,
        ),
    ];
    table
        .iter()
        .map(|(syntax, pattern, split_commas)| ImportPattern {
            syntax: *syntax,
            regex: Regex::new(pattern).unwrap(),
            split_commas: *split_commas,
        })
        .collect()
});

static GO_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^[ \t]*import[ \t]*\((.*?)\)").unwrap());
static GO_BLOCK_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*(?:[\w.]+[ \t]+)?"([^"\n]+)""#).unwrap());

/// Every import-like statement in `content`, sorted by line, one entry per
/// (line, target).
pub fn scan_imports(content: &str) -> Vec<RawImportMatch> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    let mut push = |target: &str, offset: usize, syntax: ImportSyntax| {
        let target = target.trim();
        if target.is_empty() {
            return;
        }
        let line = line_of_offset(content, offset);
        if seen.insert((line, target.to_string())) {
            found.push(RawImportMatch {
                target: target.to_string(),
                line,
                syntax,
            });
        }
    };

    for pattern in PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(content) {
            let Some(target) = caps.get(1) else { continue };
            if pattern.split_commas {
                for part in target.as_str().split(',') {
                    push(part, target.start(), pattern.syntax);
                }
            } else {
                push(target.as_str(), target.start(), pattern.syntax);
            }
        }
    }

    for block in GO_BLOCK.captures_iter(content) {
        let Some(body) = block.get(1) else { continue };
        for entry in GO_BLOCK_ENTRY.captures_iter(body.as_str()) {
            if let Some(target) = entry.get(1) {
                push(target.as_str(), body.start() + target.start(), ImportSyntax::Go);
            }
        }
    }

    found.sort_by(|a, b| (a.line, &a.target).cmp(&(b.line, &b.target)));
    found
}
