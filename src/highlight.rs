//! Highlight styles and syntect-backed code highlighting for export.

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::error::Result;

pub const LIGHT_DEFAULT_STYLE: &str = "InspiredGitHub";
pub const DARK_DEFAULT_STYLE: &str = "base16-ocean.dark";

/// Styles offered in the UI, matching the themes bundled with syntect
pub const HIGHLIGHT_STYLES: &[&str] = &[
    "InspiredGitHub",
    "Solarized (light)",
    "base16-ocean.light",
    "base16-ocean.dark",
    "base16-eighties.dark",
    "base16-mocha.dark",
    "Solarized (dark)",
];

pub fn is_known_style(name: &str) -> bool {
    HIGHLIGHT_STYLES.contains(&name)
}

pub fn default_style(dark_mode: bool) -> &'static str {
    if dark_mode {
        DARK_DEFAULT_STYLE
    } else {
        LIGHT_DEFAULT_STYLE
    }
}

/// Pick the style for the current theme: a known explicit choice, else the theme default
pub fn resolve_style(dark_mode: bool, chosen: Option<&str>) -> &str {
    match chosen {
        Some(style) if is_known_style(style) => style,
        _ => default_style(dark_mode),
    }
}

/// Carry a chosen style across a switch to `dark_mode`.
///
/// The previous theme's default is swapped for the new theme's default;
/// any other choice is kept.
pub fn style_after_theme_change(dark_mode: bool, chosen: Option<&str>) -> Option<&'static str> {
    let chosen = chosen?;
    if chosen == default_style(!dark_mode) {
        Some(default_style(dark_mode))
    } else {
        HIGHLIGHT_STYLES.iter().copied().find(|style| *style == chosen)
    }
}

/// Human-readable name for a fenced code block's language tag
pub fn language_display_name(tag: &str) -> String {
    let lower = tag.to_lowercase();
    let known = match lower.as_str() {
        "c#" | "csharp" | "cs" => Some("C#"),
        "f#" | "fsharp" | "fs" => Some("F#"),
        "c++" | "cpp" | "cxx" => Some("C++"),
        "javascript" | "js" => Some("JavaScript"),
        "typescript" | "ts" => Some("TypeScript"),
        "python" | "py" => Some("Python"),
        "java" => Some("Java"),
        "html" => Some("HTML"),
        "css" => Some("CSS"),
        "sql" => Some("SQL"),
        "plaintext" => Some("Text"),
        "shell" => Some("Bash"),
        _ => None,
    };
    if let Some(name) = known {
        return name.to_string();
    }

    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct CodeHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl CodeHighlighter {
    pub fn new(style: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(style)
            .or_else(|| theme_set.themes.remove(LIGHT_DEFAULT_STYLE))
            .unwrap_or_default();
        Self { syntax_set, theme }
    }

    fn syntax_for(&self, language: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language))
    }

    /// Background colour of the theme as a CSS hex colour
    pub fn background_css(&self) -> Option<String> {
        self.theme
            .settings
            .background
            .map(|c| format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b))
    }

    /// Render `code` as an HTML `<pre>` block. Unknown languages are left unstyled.
    pub fn highlight_html(&self, code: &str, language: Option<&str>) -> Result<String> {
        match language.and_then(|lang| self.syntax_for(lang)) {
            Some(syntax) => Ok(highlighted_html_for_string(
                code,
                &self.syntax_set,
                syntax,
                &self.theme,
            )?),
            None => Ok(format!("<pre><code>{}</code></pre>\n", escape_html(code))),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    pulldown_cmark::html::push_html(&mut out, std::iter::once(pulldown_cmark::Event::Text(text.into())));
    out
}
