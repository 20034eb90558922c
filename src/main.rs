#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::builder::PossibleValuesParser;
use clap::Parser;
use eframe::egui;

use mdview::app::MarkdownApp;
use mdview::export::{export_to_file, ExportOptions};
use mdview::highlight::HIGHLIGHT_STYLES;
use mdview::prefs::{Preferences, DEFAULT_FONT_SIZE};
use mdview::Document;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "mdview")]
#[command(about = "A lightweight markdown viewer", long_about = None)]
struct Args {
    /// Markdown file to open
    file: Option<PathBuf>,

    /// Print the document outline as JSON and exit
    #[arg(long, requires = "file")]
    outline: bool,

    /// Write the document as a standalone HTML page and exit
    #[arg(long, value_name = "PATH", requires = "file")]
    export: Option<PathBuf>,

    /// Use the dark theme for the exported page
    #[arg(long)]
    dark: bool,

    /// Content font size in pixels for the exported page (12-24)
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: u32,

    /// Code highlight style for the exported page
    #[arg(long, value_parser = PossibleValuesParser::new(HIGHLIGHT_STYLES.iter().copied()))]
    highlight_style: Option<String>,
}

impl Args {
    fn export_preferences(&self) -> Preferences {
        let mut prefs = Preferences {
            dark_mode: self.dark,
            highlight_style: self.highlight_style.clone(),
            ..Preferences::default()
        };
        prefs.set_font_size(self.font_size);
        prefs
    }
}

/// Handle `--outline` and `--export` without opening a window
fn run_headless(args: &Args, path: &Path) -> mdview::Result<()> {
    let document = Document::load(path)?;

    if args.outline {
        println!("{}", document.outline.to_json()?);
    }

    if let Some(target) = &args.export {
        let options = ExportOptions::from_preferences(&args.export_preferences());
        export_to_file(&document, &options, target)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    if args.outline || args.export.is_some() {
        let Some(path) = args.file.clone() else {
            return ExitCode::FAILURE;
        };
        return match run_headless(&args, &path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{}", e);
                eprintln!("mdview: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 720.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title("Markdown Viewer")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let file = args.file;
    let result = eframe::run_native(
        "mdview",
        options,
        Box::new(move |cc| Ok(Box::new(MarkdownApp::new(cc, file)))),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Viewer exited with error: {}", e);
            ExitCode::FAILURE
        }
    }
}
