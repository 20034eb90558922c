//! User preferences and the key-value store they persist to.

use std::collections::BTreeMap;

use crate::highlight;

pub const KEY_DARK_MODE: &str = "dark-mode";
pub const KEY_FONT_SIZE: &str = "font-size";
pub const KEY_HIGHLIGHT_STYLE: &str = "highlight-style";
pub const KEY_SHOW_OUTLINE: &str = "show-outline";

pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 24;

/// String key-value persistence surviving across sessions
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

impl<'a> PreferenceStore for dyn eframe::Storage + 'a {
    fn get(&self, key: &str) -> Option<String> {
        self.get_string(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.set_string(key, value);
    }
}

/// In-memory store, used headless and in tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub dark_mode: bool,
    /// Content font size in pixels, always within [MIN_FONT_SIZE, MAX_FONT_SIZE]
    pub font_size: u32,
    /// Highlight style picked by the user; `None` follows the theme
    pub highlight_style: Option<String>,
    pub show_outline: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            font_size: DEFAULT_FONT_SIZE,
            highlight_style: None,
            show_outline: true,
        }
    }
}

impl Preferences {
    /// Read preferences, falling back to `system_dark` when no theme was saved
    pub fn load<S: PreferenceStore + ?Sized>(store: &S, system_dark: bool) -> Self {
        let dark_mode = store
            .get(KEY_DARK_MODE)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(system_dark);

        let font_size = store
            .get(KEY_FONT_SIZE)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(clamp_font_size)
            .unwrap_or(DEFAULT_FONT_SIZE);

        let highlight_style = store
            .get(KEY_HIGHLIGHT_STYLE)
            .filter(|style| {
                let known = highlight::is_known_style(style);
                if !known {
                    log::warn!("Ignoring unknown highlight style {:?}", style);
                }
                known
            });

        let show_outline = store
            .get(KEY_SHOW_OUTLINE)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(true);

        Self {
            dark_mode,
            font_size,
            highlight_style,
            show_outline,
        }
    }

    pub fn persist<S: PreferenceStore + ?Sized>(&self, store: &mut S) {
        store.set(KEY_DARK_MODE, self.dark_mode.to_string());
        store.set(KEY_FONT_SIZE, self.font_size.to_string());
        if let Some(style) = &self.highlight_style {
            store.set(KEY_HIGHLIGHT_STYLE, style.clone());
        }
        store.set(KEY_SHOW_OUTLINE, self.show_outline.to_string());
    }

    /// Flip the theme. A highlight style equal to the old theme's default
    /// moves to the new theme's default; other picks are kept.
    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        self.highlight_style =
            highlight::style_after_theme_change(self.dark_mode, self.highlight_style.as_deref())
                .map(str::to_string);
    }

    pub fn increase_font(&mut self) {
        self.font_size = clamp_font_size(self.font_size + 1);
    }

    pub fn decrease_font(&mut self) {
        self.font_size = clamp_font_size(self.font_size.saturating_sub(1));
    }

    pub fn reset_font(&mut self) {
        self.font_size = DEFAULT_FONT_SIZE;
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.font_size = clamp_font_size(size);
    }

    /// The highlight style in effect for the current theme
    pub fn effective_highlight_style(&self) -> &str {
        highlight::resolve_style(self.dark_mode, self.highlight_style.as_deref())
    }

    /// Font scale relative to the default size
    pub fn font_scale(&self) -> f32 {
        self.font_size as f32 / DEFAULT_FONT_SIZE as f32
    }
}

pub fn clamp_font_size(size: u32) -> u32 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_uses_system_theme_and_defaults() {
        let store = MemoryStore::default();
        let prefs = Preferences::load(&store, true);
        assert!(prefs.dark_mode);
        assert_eq!(prefs.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(prefs.highlight_style, None);
        assert!(prefs.show_outline);

        assert!(!Preferences::load(&store, false).dark_mode);
    }

    #[test]
    fn saved_theme_overrides_system() {
        let mut store = MemoryStore::default();
        store.set(KEY_DARK_MODE, "false".into());
        assert!(!Preferences::load(&store, true).dark_mode);
    }

    #[test]
    fn stored_font_size_is_clamped() {
        let mut store = MemoryStore::default();
        store.set(KEY_FONT_SIZE, "40".into());
        assert_eq!(Preferences::load(&store, false).font_size, MAX_FONT_SIZE);
        store.set(KEY_FONT_SIZE, "3".into());
        assert_eq!(Preferences::load(&store, false).font_size, MIN_FONT_SIZE);
        store.set(KEY_FONT_SIZE, "big".into());
        assert_eq!(Preferences::load(&store, false).font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn font_steps_stay_in_range() {
        let mut prefs = Preferences::default();
        for _ in 0..20 {
            prefs.increase_font();
        }
        assert_eq!(prefs.font_size, MAX_FONT_SIZE);
        for _ in 0..20 {
            prefs.decrease_font();
        }
        assert_eq!(prefs.font_size, MIN_FONT_SIZE);
        prefs.reset_font();
        assert_eq!(prefs.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn unknown_highlight_style_is_dropped() {
        let mut store = MemoryStore::default();
        store.set(KEY_HIGHLIGHT_STYLE, "no-such-style".into());
        assert_eq!(Preferences::load(&store, false).highlight_style, None);
    }

    #[test]
    fn explicit_pick_applies_in_either_theme() {
        let prefs = Preferences {
            dark_mode: true,
            highlight_style: Some(highlight::LIGHT_DEFAULT_STYLE.into()),
            ..Preferences::default()
        };
        assert_eq!(prefs.effective_highlight_style(), "InspiredGitHub");

        let prefs = Preferences {
            dark_mode: false,
            highlight_style: Some(highlight::DARK_DEFAULT_STYLE.into()),
            ..Preferences::default()
        };
        assert_eq!(prefs.effective_highlight_style(), "base16-ocean.dark");
    }

    #[test]
    fn toggling_theme_moves_old_default_to_new_default() {
        let mut prefs = Preferences {
            dark_mode: false,
            highlight_style: Some(highlight::LIGHT_DEFAULT_STYLE.into()),
            ..Preferences::default()
        };
        prefs.toggle_theme();
        assert!(prefs.dark_mode);
        assert_eq!(prefs.highlight_style.as_deref(), Some(highlight::DARK_DEFAULT_STYLE));
        assert_eq!(prefs.effective_highlight_style(), highlight::DARK_DEFAULT_STYLE);

        prefs.toggle_theme();
        assert_eq!(prefs.highlight_style.as_deref(), Some(highlight::LIGHT_DEFAULT_STYLE));
    }

    #[test]
    fn toggling_theme_keeps_custom_style() {
        let mut prefs = Preferences {
            highlight_style: Some("base16-mocha.dark".into()),
            ..Preferences::default()
        };
        prefs.toggle_theme();
        assert_eq!(prefs.effective_highlight_style(), "base16-mocha.dark");
        prefs.toggle_theme();
        assert_eq!(prefs.effective_highlight_style(), "base16-mocha.dark");

        let mut unset = Preferences::default();
        unset.toggle_theme();
        assert_eq!(unset.highlight_style, None);
        assert_eq!(unset.effective_highlight_style(), highlight::DARK_DEFAULT_STYLE);
    }

    #[test]
    fn persist_then_load() {
        let prefs = Preferences {
            dark_mode: true,
            font_size: 20,
            highlight_style: Some("Solarized (dark)".into()),
            show_outline: false,
        };
        let mut store = MemoryStore::default();
        prefs.persist(&mut store);
        assert_eq!(store.get(KEY_FONT_SIZE).as_deref(), Some("20"));
        assert_eq!(Preferences::load(&store, false), prefs);
    }
}
