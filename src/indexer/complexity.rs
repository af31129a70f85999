//! Complexity scoring, selected by structure kind: code, prose or generic.
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::languages::{LanguageRegistry, LanguageRules};
use super::lines::indent_width;
use super::markdown::ProseStats;
use crate::models::{ComplexityResult, StructureKind};
use crate::parser::{NodeId, SyntaxTree};

static DECISION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(if|elif|elsif|while|for|foreach|switch|match|case|when|catch|except|rescue)\b")
        .unwrap()
});
static TERNARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s\?\s").unwrap());

const INDENT_UNIT: usize = 4;

pub struct ComplexityCalculator {
    rules: Arc<dyn LanguageRules>,
}

impl ComplexityCalculator {
    /// Node types are checked against the union of every registered language.
    pub fn new(registry: &LanguageRegistry) -> Self {
        Self {
            rules: registry.generic(),
        }
    }

    /// Score for one structure. With a tree and node the control-flow nodes
    /// are counted; otherwise keywords in the text are.
    pub fn calculate(
        &self,
        content: &str,
        kind: StructureKind,
        node: Option<(&SyntaxTree, NodeId)>,
    ) -> ComplexityResult {
        if kind.is_code() {
            self.code_complexity(content, node)
        } else if kind.is_prose() {
            prose_complexity(content)
        } else {
            generic_complexity(content)
        }
    }

    fn code_complexity(&self, content: &str, node: Option<(&SyntaxTree, NodeId)>) -> ComplexityResult {
        let mut analysis = base_analysis(content);
        let (decisions, nesting_depth) = match node {
            Some((tree, id)) if tree.get(id).is_some() => {
                let (decisions, depth) = self.tree_counts(tree, id);
                analysis.insert("control_flow_nodes".into(), decisions as f64);
                (decisions, depth)
            }
            _ => {
                let mut keywords: HashMap<&str, usize> = HashMap::new();
                for m in DECISION_KEYWORD.find_iter(content) {
                    *keywords.entry(m.as_str()).or_default() += 1;
                }
                let ternaries = TERNARY.find_iter(content).count();
                for (keyword, count) in &keywords {
                    analysis.insert(format!("keyword_{keyword}"), *count as f64);
                }
                analysis.insert("ternaries".into(), ternaries as f64);
                (keywords.values().sum::<usize>() + ternaries, text_nesting_depth(content))
            }
        };

        let cyclomatic = 1 + decisions;
        analysis.insert("cyclomatic".into(), cyclomatic as f64);
        analysis.insert("cognitive".into(), cyclomatic as f64);
        analysis.insert("max_nesting_depth".into(), nesting_depth as f64);

        ComplexityResult {
            score: u32::try_from(cyclomatic).unwrap_or(u32::MAX),
            analysis,
        }
    }

    /// Control-flow node count and deepest nesting under `root`.
    fn tree_counts(&self, tree: &SyntaxTree, root: NodeId) -> (usize, usize) {
        let mut decisions = 0;
        let mut max_depth = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = tree.get(id) else { continue };
            let mut depth = depth;
            if node.named {
                if self.rules.is_control_flow(&node.kind) {
                    decisions += 1;
                }
                if self.rules.is_nesting(&node.kind) {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                }
            }
            stack.extend(tree.children(id).iter().map(|c| (*c, depth)));
        }
        (decisions, max_depth)
    }
}

fn base_analysis(content: &str) -> BTreeMap<String, f64> {
    let mut analysis = BTreeMap::new();
    analysis.insert("lines".into(), content.lines().count() as f64);
    analysis.insert("length".into(), content.chars().count() as f64);
    analysis.insert(
        "braces".into(),
        content.chars().filter(|c| matches!(c, '{' | '}')).count() as f64,
    );
    analysis.insert(
        "brackets".into(),
        content.chars().filter(|c| matches!(c, '[' | ']')).count() as f64,
    );
    analysis
}

/// Deepest brace nesting below the outermost block; for brace-less text,
/// indentation steps below the first line.
fn text_nesting_depth(content: &str) -> usize {
    if content.contains('{') {
        let mut depth: usize = 0;
        let mut max: usize = 0;
        for c in content.chars() {
            match c {
                '{' => {
                    depth += 1;
                    max = max.max(depth);
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        return max.saturating_sub(1);
    }

    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(first) = lines.next() else { return 0 };
    let base = indent_width(first);
    let deepest = lines.map(indent_width).max().unwrap_or(base);
    // the body of the header is one level in
    (deepest.saturating_sub(base) / INDENT_UNIT).saturating_sub(1)
}

fn prose_complexity(content: &str) -> ComplexityResult {
    let stats = ProseStats::from_markdown(content);
    let mut analysis = base_analysis(content);
    analysis.insert("headings".into(), stats.headings as f64);
    analysis.insert("code_blocks".into(), stats.code_blocks as f64);
    analysis.insert("tables".into(), stats.tables as f64);
    analysis.insert("list_items".into(), stats.list_items as f64);
    analysis.insert("links".into(), stats.links as f64);
    analysis.insert("paragraphs".into(), stats.paragraphs as f64);
    analysis.insert("words".into(), stats.words as f64);

    let score = 1
        + stats.headings
        + stats.code_blocks
        + stats.tables * 2
        + stats.list_items / 5
        + stats.links / 10
        + stats.words / 200;
    ComplexityResult {
        score: u32::try_from(score).unwrap_or(u32::MAX),
        analysis,
    }
}

fn generic_complexity(content: &str) -> ComplexityResult {
    let mut analysis = base_analysis(content);
    let length = content.chars().count();
    let lines = content.lines().count();
    let entropy = shannon_entropy(content);
    let unique = {
        let mut chars: Vec<char> = content.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        chars.len()
    };
    analysis.insert("entropy".into(), entropy);
    analysis.insert("unique_chars".into(), unique as f64);

    let score = 1 + lines / 25 + length / 500;
    ComplexityResult {
        score: u32::try_from(score).unwrap_or(u32::MAX),
        analysis,
    }
}

/// Bits per character.
fn shannon_entropy(content: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in content.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|n| {
            let p = *n as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParserService, TreeSitterParser};
    use crate::parser::walker::find_all_by_type;

    fn calculator() -> ComplexityCalculator {
        ComplexityCalculator::new(&LanguageRegistry::builtin())
    }

    #[test]
    fn test_text_cyclomatic_counts_branches() {
        let source = "function foo() {\n  if (x) {\n    return 1;\n  }\n}";
        let result = calculator().calculate(source, StructureKind::Function, None);
        assert_eq!(result.score, 2);
        assert_eq!(result.analysis["cyclomatic"], 2.0);
        assert_eq!(result.analysis["cognitive"], 2.0);
        assert_eq!(result.analysis["max_nesting_depth"], 1.0);
        assert_eq!(result.analysis["keyword_if"], 1.0);
    }

    #[test]
    fn test_ternary_and_python_keywords() {
        let source = "def f(x):\n    if x:\n        y = a if b else c\n    elif z:\n        pass\n    try:\n        g()\n    except E:\n        pass\n";
        let result = calculator().calculate(source, StructureKind::Function, None);
        // if, if, elif, except
        assert_eq!(result.score, 5);
        assert_eq!(result.analysis["max_nesting_depth"], 1.0);

        let js = calculator().calculate("const a = b ? 1 : 2;", StructureKind::Function, None);
        assert_eq!(js.score, 2);
    }

    #[test]
    fn test_tree_path_counts_nodes() {
        let source = "fn f(x: i32) -> i32 {\n    if x > 0 {\n        for i in 0..x {\n            if i == 2 { return i; }\n        }\n    }\n    match x { 1 => 1, _ => 0 }\n}\n";
        let tree = TreeSitterParser::new().parse(source, "rust").unwrap();
        let root = tree.root().unwrap();
        let function = find_all_by_type(&tree, root, &["function_item"])[0];

        let result = calculator().calculate(source, StructureKind::Function, Some((&tree, function)));
        // if, for, if, match, two arms
        assert_eq!(result.score, 7);
        assert_eq!(result.analysis["max_nesting_depth"], 3.0);
        assert_eq!(result.analysis["control_flow_nodes"], 6.0);
    }

    #[test]
    fn test_prose_and_generic_scores() {
        let calculator = calculator();
        let prose = calculator.calculate("# A\n\n## B\n\n```\nx\n```\n", StructureKind::Section, None);
        assert_eq!(prose.score, 4);
        assert_eq!(prose.analysis["headings"], 2.0);

        let generic = calculator.calculate("import x", StructureKind::Import, None);
        assert_eq!(generic.score, 1);
        assert!(generic.analysis["entropy"] > 0.0);

        let empty = calculator.calculate("", StructureKind::Variable, None);
        assert_eq!(empty.score, 1);
        assert_eq!(empty.analysis["entropy"], 0.0);
    }
}
