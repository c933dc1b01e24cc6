#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use clap::Parser;

use xtrim::session::Effect;
use xtrim::ui::XtrimApp;
use xtrim::{Session, Settings};

/// Interactive viewer for 1D spectra with quick equivalent width, flux and redshift
/// measurements.
#[derive(Parser, Debug)]
#[command(name = "xtrim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Spectrum files to open
    files: Vec<PathBuf>,

    /// Reference line list overlaid on the plot
    #[arg(short, long)]
    line_list: Option<PathBuf>,

    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let cli = Cli::parse();
    let mut startup = Vec::new();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path).unwrap_or_else(|e| {
            log::error!("{e}, using default settings");
            startup.push(Effect::Error(format!("{e}, using default settings")));
            Settings::default()
        }),
        None => Settings::default(),
    };
    if cli.line_list.is_some() {
        settings.line_list = cli.line_list;
    }

    let mut session = Session::new(settings);
    startup.extend(session.load_spectra(&cli.files));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_min_inner_size([500.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "xtrim",
        native_options,
        Box::new(|cc| Ok(Box::new(XtrimApp::new(cc, session, startup)))),
    )
}
