//! A lightweight markdown viewer with a navigable table of contents.

pub mod app;
pub mod document;
pub mod error;
pub mod export;
pub mod headings;
pub mod highlight;
pub mod outline;
pub mod prefs;

pub use document::{is_markdown_file, Document};
pub use error::{Result, ViewerError};
pub use outline::{assign_anchor_ids, build_outline, HeadingRecord, Outline, OutlineNode};
