//! Markdown structure via pulldown-cmark: heading sections for the text
//! extractor and element counts for prose complexity.
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::lines::line_of_offset;

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

fn heading_level(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    pub line: usize,
}

/// A heading and the lines it governs, up to the next heading of the same
/// or a higher level.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub level: usize,
    pub title: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Headings in document order. Lines inside fenced code are never headings.
pub fn headings(content: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut current: Option<Heading> = None;

    for (event, range) in Parser::new_ext(content, options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level: heading_level(level),
                    title: String::new(),
                    line: line_of_offset(content, range.start),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.title = heading.title.trim().to_string();
                    found.push(heading);
                }
            }
            _ => {}
        }
    }
    found
}

pub fn sections(content: &str) -> Vec<Section> {
    let lines: Vec<&str> = content.lines().collect();
    let all = headings(content);

    all.iter()
        .enumerate()
        .map(|(i, heading)| {
            let next = all[i + 1..]
                .iter()
                .find(|h| h.level <= heading.level)
                .map(|h| h.line - 1)
                .unwrap_or(lines.len());
            // drop trailing blank lines
            let mut end = next.max(heading.line);
            while end > heading.line && lines.get(end - 1).is_some_and(|l| l.trim().is_empty()) {
                end -= 1;
            }
            Section {
                level: heading.level,
                title: heading.title.clone(),
                start_line: heading.line,
                end_line: end,
            }
        })
        .collect()
}

/// Element counts used to score prose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProseStats {
    pub headings: usize,
    pub code_blocks: usize,
    pub tables: usize,
    pub list_items: usize,
    pub links: usize,
    pub paragraphs: usize,
    pub words: usize,
}

impl ProseStats {
    pub fn from_markdown(content: &str) -> Self {
        let mut stats = Self {
            words: content.split_whitespace().count(),
            ..Self::default()
        };
        for event in Parser::new_ext(content, options()) {
            if let Event::Start(tag) = event {
                match tag {
                    Tag::Heading { .. } => stats.headings += 1,
                    Tag::CodeBlock(_) => stats.code_blocks += 1,
                    Tag::Table(_) => stats.tables += 1,
                    Tag::Item => stats.list_items += 1,
                    Tag::Link { .. } => stats.links += 1,
                    Tag::Paragraph => stats.paragraphs += 1,
                    _ => {}
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Title\n\nIntro text.\n\n## Install\n\n```sh\n# not a heading\ncargo install\n```\n\n## Usage\n\nSee [docs](https://example.com).\n\n# Appendix\n";

    #[test]
    fn test_headings_skip_code_fences() {
        let found = headings(DOC);
        let titles: Vec<(&str, usize, usize)> = found
            .iter()
            .map(|h| (h.title.as_str(), h.level, h.line))
            .collect();
        assert_eq!(
            titles,
            vec![("Title", 1, 1), ("Install", 2, 5), ("Usage", 2, 12), ("Appendix", 1, 16)]
        );
    }

    #[test]
    fn test_sections_end_before_peer_heading() {
        let found = sections(DOC);
        let spans: Vec<(&str, usize, usize)> = found
            .iter()
            .map(|s| (s.title.as_str(), s.start_line, s.end_line))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("Title", 1, 14),
                ("Install", 5, 10),
                ("Usage", 12, 14),
                ("Appendix", 16, 16)
            ]
        );
    }

    #[test]
    fn test_prose_stats() {
        let stats = ProseStats::from_markdown(
            "# A\n\n- one\n- two\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```\ncode\n```\n\n[x](y)\n",
        );
        assert_eq!(stats.headings, 1);
        assert_eq!(stats.list_items, 2);
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.code_blocks, 1);
        assert_eq!(stats.links, 1);
    }
}
