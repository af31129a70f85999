//! Line arithmetic for text-only extraction.
use std::sync::LazyLock;

use regex::Regex;

use super::languages::BlockStyle;

static END_KEYWORD_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:class|module|def|if|unless|case|while|until|for|begin)\b|\bdo\b\s*(?:\|[^|]*\|)?\s*$")
        .unwrap()
});
static END_KEYWORD_CLOSER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*end\b").unwrap());

/// 1-based line containing byte `offset`.
pub fn line_of_offset(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

pub fn split_lines(content: &str) -> Vec<&str> {
    content.lines().collect()
}

/// Joins lines `start..=end` (0-based, clamped).
pub fn slice_lines(lines: &[&str], start: usize, end: usize) -> String {
    if lines.is_empty() || start >= lines.len() {
        return String::new();
    }
    let end = end.min(lines.len() - 1).max(start);
    lines[start..=end].join("\n")
}

pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// 0-based index of the last line of the construct that starts at `start`.
pub fn resolve_end_line(lines: &[&str], start: usize, style: BlockStyle) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let start = start.min(lines.len() - 1);
    match style {
        BlockStyle::Braces => {
            brace_block_end(lines, start).unwrap_or_else(|| blank_line_end(lines, start))
        }
        BlockStyle::Indentation | BlockStyle::Document => indentation_block_end(lines, start),
        BlockStyle::EndKeyword => {
            end_keyword_block_end(lines, start).unwrap_or_else(|| blank_line_end(lines, start))
        }
        BlockStyle::Markdown => blank_line_end(lines, start),
    }
}

/// Tracks brace balance from the start line. A `;` before any `{` ends a
/// one-line declaration; a blank line before any `{` ends a header-only
/// construct. `None` when the braces never balance.
fn brace_block_end(lines: &[&str], start: usize) -> Option<usize> {
    let mut balance: i64 = 0;
    let mut in_block = false;

    for (i, line) in lines.iter().enumerate().skip(start) {
        if !in_block && i > start && is_blank(line) {
            return Some(i - 1);
        }
        for ch in line.chars() {
            match ch {
                '{' => {
                    balance += 1;
                    in_block = true;
                }
                '}' if in_block => balance -= 1,
                _ => {}
            }
        }
        if in_block && balance <= 0 {
            return Some(i);
        }
        if !in_block && line.trim_end().ends_with(';') {
            return Some(i);
        }
    }
    None
}

/// Last non-blank line before the first line indented no deeper than the header.
fn indentation_block_end(lines: &[&str], start: usize) -> usize {
    let header_indent = indent_width(lines[start]);
    let mut end = start;
    let mut bracket_depth = bracket_delta(lines[start]);

    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if is_blank(line) {
            continue;
        }
        // continuation lines of a multi-line signature or literal
        if bracket_depth > 0 {
            bracket_depth += bracket_delta(line);
            end = i;
            continue;
        }
        if indent_width(line) <= header_indent {
            break;
        }
        bracket_depth += bracket_delta(line);
        end = i;
    }
    end
}

/// True when the line opens more brackets than it closes.
pub fn has_unclosed_bracket(line: &str) -> bool {
    bracket_delta(line) > 0
}

fn bracket_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '(' | '[' | '{' => acc + 1,
        ')' | ']' | '}' => acc - 1,
        _ => acc,
    })
}

fn end_keyword_block_end(lines: &[&str], start: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    for (i, line) in lines.iter().enumerate().skip(start) {
        depth += END_KEYWORD_OPENER.find_iter(line).count() as i64;
        if END_KEYWORD_CLOSER.is_match(line) {
            depth -= 1;
        }
        // `def foo; end` opens and closes on one line
        if line.contains("; end") && i == start {
            depth -= 1;
        }
        if depth <= 0 {
            return Some(i);
        }
    }
    None
}

/// Line before the first blank line after `start`, or the last line.
fn blank_line_end(lines: &[&str], start: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, l)| is_blank(l))
        .map(|(i, _)| i - 1)
        .unwrap_or(lines.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of_offset() {
        let text = "a\nbb\nccc";
        assert_eq!(line_of_offset(text, 0), 1);
        assert_eq!(line_of_offset(text, 2), 2);
        assert_eq!(line_of_offset(text, 5), 3);
        assert_eq!(line_of_offset(text, 999), 3);
    }

    #[test]
    fn test_brace_block() {
        let lines = split_lines("function foo() {\n  if (x) {\n    return 1;\n  }\n}\nfoo();");
        assert_eq!(resolve_end_line(&lines, 0, BlockStyle::Braces), 4);
    }

    #[test]
    fn test_semicolon_before_brace_is_single_line() {
        let lines = split_lines("const add = (a, b) => a + b;\nconst x = { a: 1 };");
        assert_eq!(resolve_end_line(&lines, 0, BlockStyle::Braces), 0);
    }

    #[test]
    fn test_unbalanced_falls_back_to_blank_line() {
        let lines = split_lines("function broken() {\n  call(\n\nnext();");
        assert_eq!(resolve_end_line(&lines, 0, BlockStyle::Braces), 1);
    }

    #[test]
    fn test_unbalanced_without_blank_runs_to_eof() {
        let lines = split_lines("function broken() {\n  call(\n  more");
        assert_eq!(resolve_end_line(&lines, 0, BlockStyle::Braces), 2);
    }

    #[test]
    fn test_indentation_block() {
        let src = "def f(a,\n      b):\n    x = 1\n\n    return x\n\ndef g():\n    pass";
        let lines = split_lines(src);
        assert_eq!(resolve_end_line(&lines, 0, BlockStyle::Indentation), 4);
        assert_eq!(resolve_end_line(&lines, 6, BlockStyle::Indentation), 7);
    }

    #[test]
    fn test_end_keyword_block() {
        let src = "class Foo\n  def bar\n    if x\n      1\n    end\n  end\nend\nputs 1";
        let lines = split_lines(src);
        assert_eq!(resolve_end_line(&lines, 0, BlockStyle::EndKeyword), 6);
        assert_eq!(resolve_end_line(&lines, 1, BlockStyle::EndKeyword), 5);
    }

    #[test]
    fn test_slice_lines_clamps() {
        let lines = split_lines("a\nb\nc");
        assert_eq!(slice_lines(&lines, 1, 10), "b\nc");
        assert_eq!(slice_lines(&lines, 5, 6), "");
    }
}
