use egui_extras::{Column, TableBuilder};

use crate::session::session::{error, status};
use crate::session::{Effect, Session};
use crate::spectrum::{SpectrumSummary, TransformField};

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.6}")
    }
}

pub fn values_table(ui: &mut egui::Ui, session: &Session) {
    let rows = session.value_rows();

    TableBuilder::new(ui)
        .id_salt("values_table")
        .column(Column::auto()) // Name
        .column(Column::auto()) // Value
        .column(Column::remainder()) // Error
        .striped(true)
        .vscroll(false)
        .header(20.0, |mut header| {
            for title in ["", "Value", "Error"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in &rows {
                body.row(18.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(&row.name);
                    });
                    table_row.col(|ui| {
                        ui.monospace(format_value(row.value));
                    });
                    table_row.col(|ui| {
                        ui.monospace(format_value(row.uncertainty));
                    });
                });
            }
        });
}

fn field_text(summary: &SpectrumSummary, field: TransformField) -> String {
    match field {
        TransformField::RedshiftAdd => summary.redshift_add.to_string(),
        TransformField::SmoothWidth => summary.smooth_width.to_string(),
        TransformField::Mult => summary.mult.to_string(),
        TransformField::Add => summary.add.to_string(),
    }
}

/// Text being edited in the files table, one buffer per transform column.
#[derive(Debug, Default)]
pub struct FileEdits {
    rows: Vec<[String; 4]>,
}

impl FileEdits {
    pub fn refresh(&mut self, summaries: &[SpectrumSummary]) {
        self.rows = summaries
            .iter()
            .map(|summary| TransformField::ALL.map(|field| field_text(summary, field)))
            .collect();
    }
}

/// Editable table of open spectra. Edits are applied when a cell loses focus.
pub fn files_table(ui: &mut egui::Ui, session: &mut Session, edits: &mut FileEdits) -> Vec<Effect> {
    let summaries = session.summaries();
    if edits.rows.len() != summaries.len() {
        edits.refresh(&summaries);
    }

    let mut submitted: Vec<(usize, TransformField, String)> = Vec::new();
    let mut to_remove: Option<usize> = None;

    TableBuilder::new(ui)
        .id_salt("files_table")
        .column(Column::auto()) // Color
        .column(Column::auto().resizable(true)) // Filename
        .columns(Column::auto(), TransformField::ALL.len())
        .column(Column::remainder()) // Actions
        .striped(true)
        .vscroll(true)
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("");
            });
            header.col(|ui| {
                ui.strong("Filename");
            });
            for field in TransformField::ALL {
                header.col(|ui| {
                    ui.strong(field.column_name());
                });
            }
        })
        .body(|mut body| {
            for (index, (summary, texts)) in
                summaries.iter().zip(edits.rows.iter_mut()).enumerate()
            {
                body.row(20.0, |mut row| {
                    row.col(|ui| {
                        ui.colored_label(egui::Color32::from(summary.color), "■")
                            .on_hover_text(&summary.color_token);
                    });
                    row.col(|ui| {
                        ui.label(&summary.label);
                    });

                    for (field, text) in TransformField::ALL.into_iter().zip(texts.iter_mut()) {
                        row.col(|ui| {
                            let response =
                                ui.add(egui::TextEdit::singleline(text).desired_width(70.0));
                            if response.lost_focus() && *text != field_text(summary, field) {
                                submitted.push((index, field, text.clone()));
                            }
                        });
                    }

                    row.col(|ui| {
                        if ui.button("X").on_hover_text("Close this spectrum").clicked() {
                            to_remove = Some(index);
                        }
                    });
                });
            }
        });

    let mut effects = Vec::new();

    for (index, field, text) in submitted {
        match session.set_transform(index, field, &text) {
            Ok(()) => effects.push(Effect::Redraw),
            Err(e) => effects.push(error(e.to_string())),
        }
        effects.push(Effect::RefreshTables);
    }

    if let Some(index) = to_remove {
        if let Some(spectrum) = session.remove_spectrum(index) {
            effects.push(status(format!("closed {}", spectrum.label())));
        }
        effects.extend([Effect::Redraw, Effect::RefreshTables]);
    }

    effects
}
