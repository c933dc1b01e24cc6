use egui::{Align2, Color32, Stroke};
use egui_plot::{
    HLine, Legend, Line, LineStyle, Plot, PlotBounds, PlotPoint, PlotPoints, PlotUi, Text, VLine,
};

use crate::session::{PickSequence, PlotState, Session, ViewBox};
use crate::spectrum::DashStyle;

const CONTINUUM_COLOR: Color32 = Color32::from_rgb(220, 50, 50);
const MODEL_COLOR: Color32 = Color32::from_rgb(255, 140, 0);
const MARKER_COLOR: Color32 = Color32::from_rgb(120, 120, 120);

/// What the plot reports back after drawing.
pub struct PlotFeedback {
    pub pointer: Option<[f64; 2]>,
    pub view: ViewBox,
}

fn line_style(dash: DashStyle) -> LineStyle {
    match dash {
        DashStyle::Solid => LineStyle::Solid,
        DashStyle::Dashed => LineStyle::Dashed { length: 10.0 },
        DashStyle::Dotted => LineStyle::Dotted { spacing: 5.0 },
        DashStyle::DashDot => LineStyle::Dashed { length: 4.0 },
    }
}

/// Samples drawn as a histogram-like staircase, each step centered on its sample.
fn steps_mid(wave: &[f64], values: &[f64]) -> Vec<[f64; 2]> {
    let n = wave.len().min(values.len());
    let mut points = Vec::with_capacity(2 * n);

    for i in 0..n {
        let left = if i == 0 {
            wave[0]
        } else {
            0.5 * (wave[i - 1] + wave[i])
        };
        let right = if i + 1 == n {
            wave[i]
        } else {
            0.5 * (wave[i] + wave[i + 1])
        };
        points.push([left, values[i]]);
        points.push([right, values[i]]);
    }

    points
}

/// Flux shifted by `sign` times its 1-sigma error, one edge of the error band.
fn band_edge(flux: &[f64], error: &[f64], sign: f64) -> Vec<f64> {
    flux.iter().zip(error).map(|(f, e)| f + sign * e).collect()
}

/// Observed and rest wavelength labels of a trim line.
fn trim_labels(state: &PlotState, x: f64) -> (String, String) {
    (format!("{x:.4}"), format!("rest {:.4}", state.rest_wavelength(x)))
}

fn marker(plot_ui: &mut PlotUi<'_>, name: &str, x: f64, color: Color32, style: LineStyle) {
    if x.is_finite() {
        plot_ui.vline(VLine::new(name, x).stroke(Stroke::new(1.0, color)).style(style));
    }
}

fn draw_spectra(plot_ui: &mut PlotUi<'_>, session: &Session) {
    for spectrum in session.collection() {
        let view = spectrum.measurement_view();
        let color = Color32::from(spectrum.color);

        plot_ui.line(
            Line::new(spectrum.label(), PlotPoints::from(steps_mid(&view.wave, &view.flux)))
                .color(color)
                .width(1.0),
        );

        if let Some(error) = &view.error {
            let band = color.gamma_multiply(0.4);
            for (sign, edge) in [(1.0, "upper"), (-1.0, "lower")] {
                let values = band_edge(&view.flux, error, sign);
                plot_ui.line(
                    Line::new(
                        format!("{} error {edge}", spectrum.label()),
                        PlotPoints::from(steps_mid(&view.wave, &values)),
                    )
                    .color(band)
                    .width(0.5),
                );
            }
        }
    }
}

fn draw_measurements(plot_ui: &mut PlotUi<'_>, session: &Session) {
    let state = session.state();
    let dotted = LineStyle::Dotted { spacing: 4.0 };

    match &state.continuum {
        PickSequence::AwaitingSecond(first) => {
            marker(plot_ui, "continuum start", first[0], CONTINUUM_COLOR, dotted);
        }
        PickSequence::Done(continuum) => {
            plot_ui.line(
                Line::new("continuum", PlotPoints::from(vec![continuum.start, continuum.end]))
                    .color(CONTINUUM_COLOR)
                    .width(1.5),
            );
        }
        PickSequence::Idle => {}
    }

    match &state.gauss_window {
        PickSequence::AwaitingSecond(x0) => {
            marker(plot_ui, "fit window", *x0, MODEL_COLOR, dotted);
        }
        PickSequence::Done([x0, x1]) => {
            marker(plot_ui, "fit window", *x0, MODEL_COLOR, dotted);
            marker(plot_ui, "fit window", *x1, MODEL_COLOR, dotted);
        }
        PickSequence::Idle => {}
    }

    if let Some(model) = &state.gauss_model {
        plot_ui.line(
            Line::new("Gaussian model", PlotPoints::from(model.clone()))
                .color(MODEL_COLOR)
                .width(1.5),
        );
    }

    if let PickSequence::AwaitingSecond([x, y]) = state.zoom {
        marker(plot_ui, "zoom corner", x, MARKER_COLOR, dotted);
        plot_ui.hline(
            HLine::new("zoom corner", y)
                .stroke(Stroke::new(1.0, MARKER_COLOR))
                .style(dotted),
        );
    }

    marker(plot_ui, "redshift line", state.redshift_line, Color32::GREEN, LineStyle::Solid);

    let [_, bottom, _, top] = state.view;
    for &x in &state.trim_lines {
        let (observed, rest) = trim_labels(state, x);
        marker(plot_ui, "trim", x, MARKER_COLOR, LineStyle::Solid);
        plot_ui.text(
            Text::new("trim", PlotPoint::new(x, top), observed)
                .color(MARKER_COLOR)
                .anchor(Align2::LEFT_TOP),
        );
        plot_ui.text(
            Text::new("trim", PlotPoint::new(x, bottom), rest)
                .color(MARKER_COLOR)
                .anchor(Align2::LEFT_BOTTOM),
        );
    }
}

fn draw_line_list(plot_ui: &mut PlotUi<'_>, session: &Session) {
    let [x0, _, x1, y1] = session.state().view;

    for line in session.overlay_lines() {
        if line.observed < x0 || line.observed > x1 {
            continue;
        }

        let color = Color32::from(line.style.color);
        marker(plot_ui, "line list", line.observed, color, line_style(line.style.dash));
        plot_ui.text(
            Text::new("line list", PlotPoint::new(line.observed, y1), line.entry.label.clone())
                .color(color)
                .anchor(Align2::RIGHT_TOP),
        );
    }
}

/// Draws the session into the central plot. When `push_view` is set the session's view box
/// is applied to the plot; otherwise the plot's own bounds are reported back.
pub fn spectrum_plot(ui: &mut egui::Ui, session: &Session, push_view: bool) -> PlotFeedback {
    let response = Plot::new("xtrim_spectrum_plot")
        .legend(Legend::default())
        .x_axis_label("Wavelength")
        .y_axis_label("Flux")
        .allow_double_click_reset(false)
        .auto_bounds(egui::Vec2b::new(false, false))
        .show(ui, |plot_ui| {
            if push_view {
                let [x0, y0, x1, y1] = session.state().view;
                plot_ui.set_plot_bounds(PlotBounds::from_min_max([x0, y0], [x1, y1]));
            }

            plot_ui.hline(
                HLine::new("zero", 0.0)
                    .stroke(Stroke::new(0.5, MARKER_COLOR))
                    .style(LineStyle::Solid),
            );
            draw_line_list(plot_ui, session);
            draw_spectra(plot_ui, session);
            draw_measurements(plot_ui, session);

            let bounds = plot_ui.plot_bounds();
            let (min, max) = (bounds.min(), bounds.max());
            PlotFeedback {
                pointer: plot_ui.pointer_coordinate().map(|p| [p.x, p.y]),
                view: [min[0], min[1], max[0], max[1]],
            }
        });

    response.inner
}
