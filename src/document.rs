use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ViewerError};
use crate::headings::extract_headings;
use crate::outline::{assign_anchor_ids, build_outline, HeadingRecord, Outline};

/// Check if a path has a markdown extension
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "md" || ext == "markdown" || ext == "txt"
        })
        .unwrap_or(false)
}

/// A loaded markdown source with its headings and outline.
/// Everything is derived once on load; nothing is updated incrementally.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: Option<PathBuf>,
    pub content: String,
    pub line_count: usize,
    /// Headings with anchor ids filled in
    pub headings: Vec<HeadingRecord>,
    pub outline: Outline,
    /// Text of the first level-1 heading, if any
    pub title: Option<String>,
    /// Set when the file had bytes that were not valid UTF-8
    pub had_invalid_utf8: bool,
}

impl Document {
    pub fn from_source(content: impl Into<String>, path: Option<PathBuf>) -> Self {
        let content = content.into();
        let mut headings = extract_headings(&content);
        assign_anchor_ids(&mut headings);
        let outline = build_outline(&headings);
        let title = headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.text.clone());

        log::debug!(
            "Built outline with {} entries from {} headings",
            outline.len(),
            headings.len()
        );

        Self {
            path,
            line_count: content.lines().count(),
            content,
            headings,
            outline,
            title,
            had_invalid_utf8: false,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !is_markdown_file(path) {
            return Err(ViewerError::UnsupportedFile(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|e| ViewerError::from_io(path, e))?;

        // Lossy conversion so a stray byte does not make the file unreadable
        let content = String::from_utf8_lossy(&bytes);
        let had_invalid_utf8 = content.contains('\u{FFFD}');
        if had_invalid_utf8 {
            log::warn!("File {:?} contains invalid UTF-8", path);
        }

        let mut document = Self::from_source(content.into_owned(), Some(path.to_path_buf()));
        document.had_invalid_utf8 = had_invalid_utf8;
        log::info!("Loaded {:?} ({} lines)", path, document.line_count);
        Ok(document)
    }

    /// Source line of the heading anchored at `id`
    pub fn heading_line(&self, id: &str) -> Option<usize> {
        self.headings
            .iter()
            .find(|h| h.id.as_deref() == Some(id))
            .map(|h| h.line)
    }

    pub fn file_name(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}
