use std::collections::BTreeMap;
use std::path::Path;

use eframe::egui;
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};

use crate::document::{is_markdown_file, Document};
use crate::export::{export_to_file, ExportOptions};
use crate::highlight::HIGHLIGHT_STYLES;
use crate::outline::{OutlineNode, EMPTY_OUTLINE_MESSAGE};
use crate::prefs::{Preferences, DEFAULT_FONT_SIZE};

/// Scroll distance after which the back-to-top button appears
const BACK_TO_TOP_THRESHOLD: f32 = 300.0;
/// Below this width the outline sidebar is hidden; the dropdown stays available
const NARROW_LAYOUT_WIDTH: f32 = 768.0;
const MAX_LABEL_CHARS: usize = 40;

/// Shorten long outline labels on a char boundary
fn truncate_label(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        label.to_string()
    }
}

/// Approximate scroll offset of a source line from its share of the document
fn scroll_target(line: usize, line_count: usize, content_height: f32) -> Option<f32> {
    if line_count == 0 || content_height <= 0.0 {
        return None;
    }
    Some(line as f32 / line_count as f32 * content_height)
}

/// Draw `nodes` as a nested list. Returns the id of the entry clicked this frame.
fn outline_list(ui: &mut egui::Ui, nodes: &[OutlineNode]) -> Option<String> {
    let mut activated = None;
    for node in nodes {
        if ui.selectable_label(false, truncate_label(&node.label)).clicked() {
            activated = Some(node.id.clone());
        }
        if !node.children.is_empty() {
            let nested = ui.indent(&node.id, |ui| outline_list(ui, &node.children)).inner;
            activated = activated.or(nested);
        }
    }
    activated
}

/// Text styles for the document body, scaled from egui's defaults so repeated
/// frames do not compound
fn content_text_styles(scale: f32) -> BTreeMap<egui::TextStyle, egui::FontId> {
    let mut styles = egui::Style::default().text_styles;
    for font_id in styles.values_mut() {
        font_id.size *= scale;
    }
    styles
}

/// Per-frame input, gathered before any panel is drawn
#[derive(Default)]
struct Shortcuts {
    open_dialog: bool,
    export: bool,
    toggle_dark: bool,
    toggle_outline: bool,
    font_delta: i32,
    reset_font: bool,
    quit: bool,
}

impl Shortcuts {
    fn read(ctx: &egui::Context) -> Self {
        let mut s = Self::default();
        ctx.input(|i| {
            let ctrl = i.modifiers.ctrl;
            // Ctrl+O: Open file, Ctrl+Shift+O: Toggle outline
            if ctrl && i.key_pressed(egui::Key::O) {
                if i.modifiers.shift {
                    s.toggle_outline = true;
                } else {
                    s.open_dialog = true;
                }
            }
            if ctrl && i.key_pressed(egui::Key::P) {
                s.export = true;
            }
            if ctrl && i.key_pressed(egui::Key::D) {
                s.toggle_dark = true;
            }
            if ctrl && i.key_pressed(egui::Key::Q) {
                s.quit = true;
            }
            if ctrl && (i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals)) {
                s.font_delta = 1;
            }
            if ctrl && i.key_pressed(egui::Key::Minus) {
                s.font_delta = -1;
            }
            if ctrl && i.key_pressed(egui::Key::Num0) {
                s.reset_font = true;
            }
            // Ctrl + scroll wheel
            if ctrl && i.raw_scroll_delta.y != 0.0 {
                s.font_delta = if i.raw_scroll_delta.y > 0.0 { 1 } else { -1 };
            }
        });
        s
    }
}

pub struct MarkdownApp {
    cache: CommonMarkCache,
    document: Document,
    prefs: Preferences,
    /// Set whenever a preference changes; flushed to storage at the end of the frame
    prefs_changed: bool,
    error_message: Option<String>,
    is_dragging: bool,
    show_about: bool,
    scroll_offset: f32,
    pending_scroll_offset: Option<f32>,
    last_content_height: f32,
}

impl MarkdownApp {
    pub fn new(cc: &eframe::CreationContext<'_>, file: Option<std::path::PathBuf>) -> Self {
        let system_dark = cc.egui_ctx.style().visuals.dark_mode;
        let prefs = match cc.storage {
            Some(storage) => Preferences::load(storage, system_dark),
            None => Preferences {
                dark_mode: system_dark,
                ..Preferences::default()
            },
        };

        let mut app = Self::with_preferences(prefs);
        if let Some(path) = file {
            app.load_file(&path);
        }
        app
    }

    fn with_preferences(prefs: Preferences) -> Self {
        Self {
            cache: CommonMarkCache::default(),
            document: Document::from_source(WELCOME_MARKDOWN, None),
            prefs,
            prefs_changed: false,
            error_message: None,
            is_dragging: false,
            show_about: false,
            scroll_offset: 0.0,
            pending_scroll_offset: None,
            last_content_height: 0.0,
        }
    }

    fn load_file(&mut self, path: &Path) {
        match Document::load(path) {
            Ok(document) => {
                self.error_message = if document.had_invalid_utf8 {
                    Some("Warning: File contains invalid UTF-8 characters (replaced with �)".to_string())
                } else {
                    None
                };
                self.document = document;
                self.cache = CommonMarkCache::default();
                self.pending_scroll_offset = Some(0.0);
            }
            Err(e) => {
                log::error!("Failed to load file {:?}: {}", path, e);
                self.error_message = Some(e.to_string());
            }
        }
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Markdown", &["md", "markdown"])
            .add_filter("Text", &["txt"])
            .pick_file()
        {
            self.load_file(&path);
        }
    }

    fn export_dialog(&mut self) {
        let file_name = self
            .document
            .path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|stem| format!("{}.html", stem.to_string_lossy()))
            .unwrap_or_else(|| "document.html".to_string());

        let Some(target) = rfd::FileDialog::new()
            .add_filter("HTML", &["html", "htm"])
            .set_file_name(file_name)
            .save_file()
        else {
            return;
        };

        let options = ExportOptions::from_preferences(&self.prefs);
        if let Err(e) = export_to_file(&self.document, &options, &target) {
            log::error!("Export to {:?} failed: {}", target, e);
            self.error_message = Some(e.to_string());
        }
    }

    fn window_title(&self) -> String {
        match self.document.file_name() {
            Some(name) => format!("{} - Markdown Viewer", name),
            None => "Markdown Viewer".to_string(),
        }
    }

    fn scroll_to_heading(&mut self, id: &str) {
        let Some(line) = self.document.heading_line(id) else {
            log::warn!("No heading with id {:?}", id);
            return;
        };
        log::debug!("Scrolling to {:?} at line {}", id, line);
        self.pending_scroll_offset =
            scroll_target(line, self.document.line_count, self.last_content_height);
    }

    fn change_font_size(&mut self, delta: i32) {
        match delta.signum() {
            1 => self.prefs.increase_font(),
            -1 => self.prefs.decrease_font(),
            _ => return,
        }
        self.prefs_changed = true;
    }

    fn toggle_theme(&mut self) {
        self.prefs.toggle_theme();
        self.prefs_changed = true;
    }

    fn toggle_outline(&mut self) {
        self.prefs.show_outline = !self.prefs.show_outline;
        self.prefs_changed = true;
    }

    fn apply_shortcuts(&mut self, ctx: &egui::Context, shortcuts: Shortcuts) {
        if shortcuts.font_delta != 0 {
            self.change_font_size(shortcuts.font_delta);
        }
        if shortcuts.reset_font {
            self.prefs.reset_font();
            self.prefs_changed = true;
        }
        if shortcuts.open_dialog {
            self.open_file_dialog();
        }
        if shortcuts.export {
            self.export_dialog();
        }
        if shortcuts.toggle_dark {
            self.toggle_theme();
        }
        if shortcuts.toggle_outline {
            self.toggle_outline();
        }
        if shortcuts.quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            let dropped: Vec<_> = i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect();
            (!i.raw.hovered_files.is_empty(), dropped)
        });
        self.is_dragging = hovering;

        for path in dropped {
            if is_markdown_file(&path) {
                self.load_file(&path);
            } else {
                log::warn!("Rejected dropped file {:?}", path);
                self.error_message = Some(
                    "Unsupported file type. Please drop a markdown file (.md, .markdown, .txt)"
                        .to_string(),
                );
            }
        }
    }

    /// Menu bar, including the outline dropdown. Returns a clicked outline entry.
    fn menu_bar(&mut self, ctx: &egui::Context) -> Option<String> {
        let mut activated = None;

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.add(egui::Button::new("Open...").shortcut_text("Ctrl+O")).clicked() {
                        self.open_file_dialog();
                        ui.close();
                    }
                    if ui.add(egui::Button::new("Export HTML...").shortcut_text("Ctrl+P")).clicked() {
                        self.export_dialog();
                        ui.close();
                    }

                    ui.separator();

                    if ui.add(egui::Button::new("Quit").shortcut_text("Ctrl+Q")).clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    let theme_text = if self.prefs.dark_mode { "☀ Light Mode" } else { "🌙 Dark Mode" };
                    if ui.add(egui::Button::new(theme_text).shortcut_text("Ctrl+D")).clicked() {
                        self.toggle_theme();
                        ui.close();
                    }

                    let outline_text = if self.prefs.show_outline { "✓ Show Outline" } else { "Show Outline" };
                    if ui.add(egui::Button::new(outline_text).shortcut_text("Ctrl+Shift+O")).clicked() {
                        self.toggle_outline();
                        ui.close();
                    }

                    ui.separator();

                    if ui.add(egui::Button::new("Larger Text").shortcut_text("Ctrl++")).clicked() {
                        self.change_font_size(1);
                        ui.close();
                    }
                    if ui.add(egui::Button::new("Smaller Text").shortcut_text("Ctrl+-")).clicked() {
                        self.change_font_size(-1);
                        ui.close();
                    }
                    if ui.add(egui::Button::new("Reset Text Size").shortcut_text("Ctrl+0")).clicked() {
                        self.prefs.reset_font();
                        self.prefs_changed = true;
                        ui.close();
                    }

                    ui.separator();

                    ui.menu_button("Highlight Style", |ui| {
                        let current = self.prefs.effective_highlight_style().to_string();
                        for style in HIGHLIGHT_STYLES {
                            if ui.selectable_label(current == *style, *style).clicked() {
                                self.prefs.highlight_style = Some(style.to_string());
                                self.prefs_changed = true;
                                ui.close();
                            }
                        }
                    });
                });

                ui.menu_button("Contents", |ui| {
                    ui.set_min_width(220.0);
                    if self.document.outline.is_empty() {
                        ui.label(egui::RichText::new(EMPTY_OUTLINE_MESSAGE).color(ui.visuals().weak_text_color()));
                        return;
                    }
                    egui::ScrollArea::vertical().max_height(420.0).show(ui, |ui| {
                        if let Some(id) = outline_list(ui, &self.document.outline.nodes) {
                            activated = Some(id);
                            ui.close();
                        }
                    });
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                        ui.close();
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.prefs.font_size != DEFAULT_FONT_SIZE {
                        ui.label(
                            egui::RichText::new(format!("{}px", self.prefs.font_size))
                                .small()
                                .color(ui.visuals().weak_text_color()),
                        );
                        ui.separator();
                    }

                    if let Some(path) = &self.document.path {
                        ui.label(
                            egui::RichText::new(path.display().to_string())
                                .small()
                                .color(ui.visuals().weak_text_color()),
                        );
                    }
                });
            });
        });

        activated
    }

    /// Outline sidebar (left side). Returns a clicked outline entry.
    fn outline_sidebar(&mut self, ctx: &egui::Context) -> Option<String> {
        if !self.prefs.show_outline || ctx.available_rect().width() < NARROW_LAYOUT_WIDTH {
            return None;
        }

        // A pointer held down is likely a panel resize, not a click
        let resizing = ctx.input(|i| i.pointer.any_down());
        let title = self.document.title.as_deref().unwrap_or("Outline");
        let mut activated = None;

        egui::SidePanel::left("outline")
            .resizable(true)
            .default_width(220.0)
            .min_width(120.0)
            .max_width(400.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    ui.set_max_width(ui.available_width());
                    ui.add_space(6.0);
                    ui.add(egui::Label::new(egui::RichText::new(title).heading()).truncate());
                });
                ui.separator();

                if self.document.outline.is_empty() {
                    ui.vertical_centered(|ui| {
                        ui.label(egui::RichText::new(EMPTY_OUTLINE_MESSAGE).color(ui.visuals().weak_text_color()));
                    });
                    return;
                }

                egui::ScrollArea::vertical()
                    .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden)
                    .show(ui, |ui| {
                        let clicked = outline_list(ui, &self.document.outline.nodes);
                        if !resizing {
                            activated = clicked;
                        }
                    });
            });

        activated
    }

    fn content_panel(&mut self, ctx: &egui::Context) {
        let mut clear_error = false;
        let style = self.prefs.effective_highlight_style().to_string();
        let font_scale = self.prefs.font_scale();

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = &self.error_message {
                ui.horizontal(|ui| {
                    let color = egui::Color32::from_rgb(255, 200, 100);
                    ui.label(egui::RichText::new("⚠").color(color));
                    ui.label(egui::RichText::new(error).color(color));
                    if ui.small_button("✕").clicked() {
                        clear_error = true;
                    }
                });
                ui.separator();
            }

            let mut scroll_area = egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .scroll_source(egui::scroll_area::ScrollSource::SCROLL_BAR | egui::scroll_area::ScrollSource::MOUSE_WHEEL);

            if let Some(offset) = self.pending_scroll_offset.take() {
                scroll_area = scroll_area.vertical_scroll_offset(offset);
            }

            let scroll_output = scroll_area.show_viewport(ui, |ui, viewport| {
                self.scroll_offset = viewport.min.y;
                // Only the document follows the font size; menus and the sidebar keep egui's sizes
                ui.style_mut().text_styles = content_text_styles(font_scale);

                CommonMarkViewer::new()
                    .max_image_width(Some(800))
                    .indentation_spaces(2)
                    .show_alt_text_on_hover(true)
                    .syntax_theme_dark(style.as_str())
                    .syntax_theme_light(style.as_str())
                    .line_height(1.5)
                    .paragraph_spacing(1.5)
                    .heading_spacing_above(2.0)
                    .heading_spacing_below(0.5)
                    .show(ui, &mut self.cache, &self.document.content);
            });

            self.last_content_height = scroll_output.content_size.y;
        });

        if clear_error {
            self.error_message = None;
        }
    }

    fn back_to_top_button(&mut self, ctx: &egui::Context) {
        if self.scroll_offset <= BACK_TO_TOP_THRESHOLD {
            return;
        }
        egui::Area::new(egui::Id::new("back_to_top"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-24.0, -24.0])
            .show(ctx, |ui| {
                if ui.button("⬆").on_hover_text("Back to top").clicked() {
                    self.pending_scroll_offset = Some(0.0);
                }
            });
    }

    fn about_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("About")
            .open(&mut self.show_about)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.heading("Markdown Viewer");
                ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                ui.add_space(6.0);
                ui.label("Open or drop a markdown file to read it with a table of contents,");
                ui.label("syntax-highlighted code and printable HTML export.");
            });
    }

    fn drop_overlay(&self, ctx: &egui::Context) {
        if !self.is_dragging {
            return;
        }
        let screen_rect = ctx.available_rect();
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drop_overlay"),
        ));
        painter.rect_filled(screen_rect, 0.0, egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180));
        painter.text(
            screen_rect.center(),
            egui::Align2::CENTER_CENTER,
            "Drop markdown file here",
            egui::FontId::proportional(24.0),
            egui::Color32::WHITE,
        );
    }
}

impl eframe::App for MarkdownApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.prefs.persist(storage);
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.prefs.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        ctx.style_mut(|style| style.url_in_tooltip = true);
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title()));

        let shortcuts = Shortcuts::read(ctx);
        self.apply_shortcuts(ctx, shortcuts);
        self.handle_dropped_files(ctx);

        let from_dropdown = self.menu_bar(ctx);
        let from_sidebar = self.outline_sidebar(ctx);
        if let Some(id) = from_dropdown.or(from_sidebar) {
            self.scroll_to_heading(&id);
        }

        self.content_panel(ctx);
        self.back_to_top_button(ctx);
        self.about_window(ctx);
        self.drop_overlay(ctx);

        if self.prefs_changed {
            if let Some(storage) = frame.storage_mut() {
                self.prefs.persist(storage);
                log::debug!("Saved preferences: {:?}", self.prefs);
            }
            self.prefs_changed = false;
        }
    }
}

const WELCOME_MARKDOWN: &str = r#"# Markdown Viewer

Open a file with **Ctrl+O** or drop one onto this window.

## Reading

The outline on the left and the *Contents* menu are built from the
headings of the document. Click an entry to jump to it.

### Shortcuts

| Action | Keys |
|:-------|:-----|
| Open file | Ctrl+O |
| Toggle outline | Ctrl+Shift+O |
| Dark / light theme | Ctrl+D |
| Larger / smaller text | Ctrl+= / Ctrl+- |
| Export HTML for printing | Ctrl+P |

## Code

Code blocks are highlighted and have a copy button.

```rust
fn main() {
    println!("Hello, markdown!");
}
```

## Tasks

- [x] Render markdown
- [x] Build the outline
- [ ] Open your own file
"#;
