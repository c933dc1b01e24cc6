use std::path::PathBuf;

use super::plot::spectrum_plot;
use super::tables::{FileEdits, files_table, values_table};
use crate::session::session::{error, status};
use crate::session::{Effect, KeyInput, Session, help_text};

const SPECTRUM_EXTENSIONS: [&str; 7] = ["txt", "dat", "ascii", "spec", "csv", "parquet", "pq"];
const MAX_LOG_LINES: usize = 1000;

pub struct XtrimApp {
    session: Session,
    file_edits: FileEdits,
    status: String,
    logs: Vec<String>,
    show_logs: bool,
    show_help: bool,
    push_view: bool,
}

impl XtrimApp {
    /// `startup` carries the effects of whatever the session did before the window opened,
    /// such as loading files given on the command line.
    pub fn new(_cc: &eframe::CreationContext<'_>, session: Session, startup: Vec<Effect>) -> Self {
        let mut app = Self {
            session,
            file_edits: FileEdits::default(),
            status: String::new(),
            logs: Vec::new(),
            show_logs: false,
            show_help: false,
            push_view: true,
        };
        app.apply(startup);
        app
    }

    fn log_line(&mut self, line: String) {
        self.logs.push(line);
        if self.logs.len() > MAX_LOG_LINES {
            let excess = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..excess);
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Redraw => self.push_view = true,
                Effect::RefreshTables => self.file_edits.refresh(&self.session.summaries()),
                Effect::Status(message) => {
                    self.status.clone_from(&message);
                    self.log_line(message);
                }
                Effect::Error(message) => {
                    self.status = format!("Error: {message}");
                    self.log_line(self.status.clone());
                }
            }
        }
    }

    fn open_spectra(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .set_title("Open spectra")
            .add_filter("Spectra", &SPECTRUM_EXTENSIONS)
            .add_filter("All files", &["*"])
            .pick_files()
        else {
            return;
        };

        let effects = self.session.load_spectra(&paths);
        self.apply(effects);
    }

    fn open_line_list(&mut self) {
        let Some(path): Option<PathBuf> = rfd::FileDialog::new()
            .set_title("Open line list")
            .pick_file()
        else {
            return;
        };

        let effect = match self.session.load_line_list(&path) {
            Ok(()) => status(format!("line list loaded from {}", path.display())),
            Err(e) => error(e.to_string()),
        };
        self.apply(vec![effect, Effect::Redraw]);
    }

    /// Key events for the session, skipped while a widget such as a table cell has focus.
    fn key_inputs(ctx: &egui::Context) -> Vec<KeyInput> {
        if ctx.memory(|memory| memory.focused().is_some()) {
            return Vec::new();
        }

        ctx.input(|input| {
            input
                .events
                .iter()
                .flat_map(|event| match event {
                    egui::Event::Text(text) => text.chars().map(KeyInput::Char).collect(),
                    egui::Event::Key {
                        key, pressed: true, ..
                    } => match key {
                        egui::Key::Enter => vec![KeyInput::Enter],
                        egui::Key::Escape => vec![KeyInput::Escape],
                        egui::Key::Backspace => vec![KeyInput::Backspace],
                        _ => Vec::new(),
                    },
                    _ => Vec::new(),
                })
                .collect()
        })
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            egui::global_theme_preference_switch(ui);
            ui.heading("xtrim");
            ui.separator();

            ui.menu_button("File", |ui| {
                if ui.button("Open spectra...").clicked() {
                    ui.close();
                    self.open_spectra();
                }
                if ui.button("Open line list...").clicked() {
                    ui.close();
                    self.open_line_list();
                }
            });

            if ui.button("Logs").clicked() {
                self.show_logs = !self.show_logs;
            }
            if ui.button("Help").clicked() {
                self.show_help = !self.show_help;
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some([x, y]) = self.session.pointer() {
                    let rest = self.session.state().rest_wavelength(x);
                    ui.monospace(format!("(x, y) = {x:.4}, {y:.4}   rest = {rest:.4}"));
                }
            });
        });
    }

    fn windows(&mut self, ctx: &egui::Context) {
        egui::Window::new("Logs")
            .open(&mut self.show_logs)
            .default_height(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.logs {
                            ui.monospace(line);
                        }
                    });
            });

        egui::Window::new("Help")
            .open(&mut self.show_help)
            .show(ctx, |ui| {
                ui.monospace(help_text());
            });
    }
}

impl eframe::App for XtrimApp {
    fn ui(&mut self, ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
        let ctx = &ui.ctx().clone();
        for key in Self::key_inputs(ctx) {
            let effects = self.session.handle_key(key);
            self.apply(effects);
        }

        egui::TopBottomPanel::top("xtrim_top_panel").show(ctx, |ui| {
            self.menu_bar(ui);
        });

        egui::TopBottomPanel::bottom("xtrim_status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::SidePanel::right("xtrim_tables")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.heading("Values");
                values_table(ui, &self.session);
                ui.separator();
                ui.heading("Files");
                let effects = files_table(ui, &mut self.session, &mut self.file_edits);
                self.apply(effects);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let feedback = spectrum_plot(ui, &self.session, self.push_view);
            if !self.push_view {
                self.session.set_view(feedback.view);
            }
            self.push_view = false;
            self.session.set_pointer(feedback.pointer);
        });

        self.windows(ctx);
    }
}
