//! Standalone HTML rendering of a document, used for printing.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd};
use regex::Regex;

use crate::document::Document;
use crate::error::{Result, ViewerError};
use crate::headings::markdown_options;
use crate::highlight::{escape_html, language_display_name, CodeHighlighter};
use crate::outline::{Outline, OutlineNode, EMPTY_OUTLINE_MESSAGE};
use crate::prefs::Preferences;

/// Fence info of the form ```` ```rust title="main.rs" ````
static TITLED_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:([A-Za-z0-9#+\-]+)\s+)?title="([^"]+)"$"#).expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub dark_mode: bool,
    pub font_size: u32,
    pub highlight_style: String,
    pub include_outline: bool,
}

impl ExportOptions {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            dark_mode: prefs.dark_mode,
            font_size: prefs.font_size,
            highlight_style: prefs.effective_highlight_style().to_string(),
            include_outline: true,
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_preferences(&Preferences::default())
    }
}

/// Language and optional title from a fenced code block's info string
fn parse_fence_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if let Some(caps) = TITLED_FENCE.captures(info) {
        let lang = caps.get(1).map(|m| m.as_str().to_string());
        return (lang, Some(caps[2].to_string()));
    }
    let lang = info
        .split_whitespace()
        .next()
        .map(str::to_string);
    (lang, None)
}

fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

fn render_code_block(
    highlighter: &CodeHighlighter,
    code: &str,
    language: Option<&str>,
    title: Option<&str>,
) -> Result<String> {
    let mut out = String::from("<div class=\"code-block\">\n");
    if let Some(title) = title {
        out.push_str(&format!("<div class=\"code-title\">{}</div>\n", escape_html(title)));
    }
    if let Some(lang) = language {
        out.push_str(&format!(
            "<div class=\"code-language-tag\">{}</div>\n",
            escape_html(&language_display_name(lang))
        ));
    }
    out.push_str(&highlighter.highlight_html(code, language)?);
    out.push_str("</div>\n");
    Ok(out)
}

fn push_outline_list(out: &mut String, nodes: &[OutlineNode]) {
    out.push_str("<ul>\n");
    for node in nodes {
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape_attr(&node.id),
            escape_html(&node.label)
        ));
        if !node.children.is_empty() {
            out.push('\n');
            push_outline_list(out, &node.children);
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
}

/// The outline as a `<nav>` block, or a placeholder when there are no headings
pub fn render_outline_nav(outline: &Outline) -> String {
    let mut out = String::from("<nav class=\"toc\">\n");
    if outline.is_empty() {
        out.push_str(&format!("<p class=\"toc-empty-message\">{}</p>\n", EMPTY_OUTLINE_MESSAGE));
    } else {
        push_outline_list(&mut out, &outline.nodes);
    }
    out.push_str("</nav>\n");
    out
}

/// Render the document body. Headings carry the outline's anchor ids.
pub fn render_body(document: &Document, highlighter: &CodeHighlighter) -> Result<String> {
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut heading_ids = document.headings.iter().map(|h| h.id.clone());
    // (info, buffered code) while inside a code block
    let mut code_block: Option<(String, String)> = None;

    for event in Parser::new_ext(&document.content, markdown_options()) {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let id = heading_ids
                    .next()
                    .flatten()
                    .map(CowStr::from)
                    .or(id);
                events.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code_block = Some((info, String::new()));
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((info, code)) = code_block.take() {
                    let (language, title) = parse_fence_info(&info);
                    let rendered = render_code_block(
                        highlighter,
                        &code,
                        language.as_deref(),
                        title.as_deref(),
                    )?;
                    events.push(Event::Html(CowStr::from(rendered)));
                }
            }
            other => events.push(other),
        }
    }

    let mut body = String::with_capacity(document.content.len() * 3 / 2);
    html::push_html(&mut body, events.into_iter());
    Ok(body)
}

fn stylesheet(options: &ExportOptions, code_background: Option<&str>) -> String {
    let (text, background, muted, border) = if options.dark_mode {
        ("#e6edf3", "#0d1117", "#8b949e", "#30363d")
    } else {
        ("#1f2328", "#ffffff", "#656d76", "#d0d7de")
    };
    let code_background = code_background.unwrap_or(if options.dark_mode { "#161b22" } else { "#f6f8fa" });
    format!(
        r#":root {{ --content-font-size: {font}px; --text: {text}; --background: {background}; --text-muted: {muted}; --border: {border}; }}
body {{ margin: 0 auto; max-width: 900px; padding: 2em; color: var(--text); background: var(--background); font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; font-size: var(--content-font-size); line-height: 1.5; }}
nav.toc {{ border-bottom: 1px solid var(--border); margin-bottom: 2em; }}
nav.toc ul {{ list-style: none; padding-left: 1.2em; }}
nav.toc > ul {{ padding-left: 0; }}
.toc-empty-message {{ color: var(--text-muted); text-align: center; padding: 10px; }}
.code-block {{ position: relative; margin: 1em 0; }}
.code-block pre {{ padding: 1em; overflow-x: auto; border-radius: 6px; background: {code_background}; }}
.code-title {{ font-family: monospace; font-size: 0.85em; padding: 0.3em 1em; border: 1px solid var(--border); border-bottom: none; border-radius: 6px 6px 0 0; }}
.code-language-tag {{ position: absolute; right: 0.8em; top: 0.4em; font-size: 0.75em; color: var(--text-muted); }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid var(--border); padding: 6px 13px; }}
blockquote {{ color: var(--text-muted); border-left: 0.25em solid var(--border); margin: 0; padding: 0 1em; }}
img {{ max-width: 100%; }}
@media print {{ nav.toc {{ page-break-after: always; }} .code-block pre {{ white-space: pre-wrap; }} }}
"#,
        font = options.font_size,
    )
}

/// Render `document` as a complete HTML page
pub fn render_html(document: &Document, options: &ExportOptions) -> Result<String> {
    let highlighter = CodeHighlighter::new(&options.highlight_style);
    let body = render_body(document, &highlighter)?;
    let title = document
        .title
        .clone()
        .or_else(|| document.file_name())
        .unwrap_or_else(|| "Markdown Viewer".to_string());

    let mut page = String::with_capacity(body.len() + 4096);
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    page.push_str("<style>\n");
    page.push_str(&stylesheet(options, highlighter.background_css().as_deref()));
    page.push_str("</style>\n</head>\n<body>\n");
    if options.include_outline {
        page.push_str(&render_outline_nav(&document.outline));
    }
    page.push_str("<article class=\"markdown-content\">\n");
    page.push_str(&body);
    page.push_str("</article>\n</body>\n</html>\n");
    Ok(page)
}

pub fn export_to_file(document: &Document, options: &ExportOptions, path: &Path) -> Result<()> {
    let page = render_html(document, options)?;
    fs::write(path, page).map_err(|e| ViewerError::from_io(path, e))?;
    log::info!("Exported {:?} to {:?}", document.path, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        let document = Document::from_source(source, None);
        render_html(&document, &ExportOptions::default()).unwrap()
    }

    #[test]
    fn headings_carry_outline_ids() {
        let page = render("# Guide\n\n## Install {#install}\n\n## Usage\n");
        assert!(page.contains("<h1 id=\"heading-0\">Guide</h1>"));
        assert!(page.contains("<h2 id=\"install\">Install</h2>"));
        assert!(page.contains("<h2 id=\"heading-2\">Usage</h2>"));
        assert!(page.contains("<a href=\"#install\">Install</a>"));
        assert!(page.contains("<title>Guide</title>"));
    }

    #[test]
    fn nav_nests_like_the_outline() {
        let document = Document::from_source("# A\n## B\n# C\n", None);
        let nav = render_outline_nav(&document.outline);
        assert_eq!(
            nav,
            "<nav class=\"toc\">\n<ul>\n<li><a href=\"#heading-0\">A</a>\n<ul>\n\
             <li><a href=\"#heading-1\">B</a></li>\n</ul>\n</li>\n\
             <li><a href=\"#heading-2\">C</a></li>\n</ul>\n</nav>\n"
        );
    }

    #[test]
    fn empty_outline_shows_placeholder() {
        let page = render("no headings here\n");
        assert!(page.contains(EMPTY_OUTLINE_MESSAGE));
        assert!(!page.contains("<ul>"));
    }

    #[test]
    fn outline_can_be_left_out() {
        let document = Document::from_source("# A\n", None);
        let options = ExportOptions {
            include_outline: false,
            ..ExportOptions::default()
        };
        let page = render_html(&document, &options).unwrap();
        assert!(!page.contains("<nav"));
    }

    #[test]
    fn fence_info_parsing() {
        assert_eq!(parse_fence_info("rust"), (Some("rust".into()), None));
        assert_eq!(
            parse_fence_info("rust title=\"main.rs\""),
            (Some("rust".into()), Some("main.rs".into()))
        );
        assert_eq!(parse_fence_info(" title=\"notes\""), (None, Some("notes".into())));
        assert_eq!(parse_fence_info(""), (None, None));
    }

    #[test]
    fn code_blocks_get_title_and_language_tag() {
        let page = render("```py title=\"hello.py\"\nprint('hi')\n```\n");
        assert!(page.contains("<div class=\"code-title\">hello.py</div>"));
        assert!(page.contains("<div class=\"code-language-tag\">Python</div>"));
        assert!(page.contains("<span"));
    }

    #[test]
    fn unknown_language_stays_plain() {
        let page = render("```nonsense-lang\n<tag>\n```\n");
        assert!(page.contains("<pre><code>&lt;tag&gt;\n</code></pre>"));
    }

    #[test]
    fn task_lists_render_checkboxes() {
        let page = render("- [x] done\n- [ ] todo\n");
        assert!(page.contains("checked=\"\""));
        assert!(page.contains("type=\"checkbox\""));
    }

    #[test]
    fn font_size_and_theme_reach_the_stylesheet() {
        let document = Document::from_source("text\n", None);
        let options = ExportOptions {
            dark_mode: true,
            font_size: 20,
            highlight_style: "base16-ocean.dark".into(),
            include_outline: true,
        };
        let page = render_html(&document, &options).unwrap();
        assert!(page.contains("--content-font-size: 20px"));
        assert!(page.contains("--background: #0d1117"));
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        let document = Document::from_source("# Saved\n", None);
        export_to_file(&document, &ExportOptions::default(), &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains("id=\"heading-0\""));
    }
}
