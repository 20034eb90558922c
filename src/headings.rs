use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::outline::HeadingRecord;

/// Markdown extensions shared by heading extraction and HTML export
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

pub fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Collect the headings of `content` in document order.
/// Lines inside code blocks are never headings; `{#id}` attributes are kept as ids.
pub fn extract_headings(content: &str) -> Vec<HeadingRecord> {
    let mut headings = Vec::new();
    let mut current: Option<HeadingRecord> = None;

    // Byte offset -> line number, computed incrementally since offsets only grow
    let mut scanned = 0;
    let mut line = 0;

    for (event, range) in Parser::new_ext(content, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                line += content[scanned..range.start].matches('\n').count();
                scanned = range.start;

                let mut record = HeadingRecord::new(heading_depth(level), String::new()).at_line(line);
                record.id = id.map(|id| id.to_string());
                current = Some(record);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut record) = current.take() {
                    record.text = record.text.trim().to_string();
                    headings.push(record);
                }
            }
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                if let Some(record) = current.as_mut() {
                    record.text.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(record) = current.as_mut() {
                    record.text.push(' ');
                }
            }
            _ => {}
        }
    }

    headings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(content: &str) -> Vec<(u8, String, usize)> {
        extract_headings(content)
            .into_iter()
            .map(|h| (h.level, h.text, h.line))
            .collect()
    }

    #[test]
    fn extracts_atx_headings_with_lines() {
        let content = "# Title\n\nIntro\n\n## Section\n\n### Sub\n";
        assert_eq!(
            summary(content),
            vec![
                (1, "Title".to_string(), 0),
                (2, "Section".to_string(), 4),
                (3, "Sub".to_string(), 6),
            ]
        );
    }

    #[test]
    fn ignores_headings_in_code_blocks() {
        let content = "# Real\n\n```markdown\n# Not a heading\n```\n\n## Also real\n";
        let texts: Vec<String> = extract_headings(content).into_iter().map(|h| h.text).collect();
        assert_eq!(texts, vec!["Real", "Also real"]);
    }

    #[test]
    fn flattens_inline_markup() {
        let headings = extract_headings("## The `build` step is **fast**\n");
        assert_eq!(headings[0].text, "The build step is fast");
    }

    #[test]
    fn setext_headings_are_found() {
        let headings = extract_headings("Top\n===\n\nNext\n---\n");
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].line, 3);
    }

    #[test]
    fn explicit_ids_are_preserved() {
        let headings = extract_headings("# Install {#setup}\n\n## Usage\n");
        assert_eq!(headings[0].id.as_deref(), Some("setup"));
        assert_eq!(headings[0].text, "Install");
        assert_eq!(headings[1].id, None);
    }

    #[test]
    fn no_headings() {
        assert!(extract_headings("just a paragraph\n\n- and a list\n").is_empty());
    }
}
