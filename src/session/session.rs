use std::path::{Path, PathBuf};

use super::plot_state::{DEFAULT_VIEW, PlotState, ViewBox};
use crate::config::Settings;
use crate::error::Result;
use crate::spectrum::loaders::{load_spectrum, loader_for_path};
use crate::spectrum::{
    LineList, LineListEntry, LineStyle, Spectrum, SpectrumCollection, SpectrumSummary,
    TransformField,
};

/// Fraction of the data extent left free on each side by [`Session::reset_view`].
const VIEW_MARGIN: f64 = 0.05;

/// What the view layer should do after the session handled an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Redraw,
    RefreshTables,
    Status(String),
    Error(String),
}

pub(crate) fn status(message: impl Into<String>) -> Effect {
    let message = message.into();
    log::info!("{message}");
    Effect::Status(message)
}

pub(crate) fn error(message: impl Into<String>) -> Effect {
    let message = message.into();
    log::warn!("{message}");
    Effect::Error(message)
}

/// One row of the values table.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRow {
    pub name: String,
    pub value: f64,
    pub uncertainty: f64,
}

impl ValueRow {
    fn new(name: impl Into<String>, value: f64, uncertainty: f64) -> Self {
        Self {
            name: name.into(),
            value,
            uncertainty,
        }
    }
}

/// Reference line placed at its observed wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLine<'a> {
    pub observed: f64,
    pub entry: &'a LineListEntry,
    pub style: LineStyle,
}

/// Open spectra, the shared plot state and the last pointer position. Every event handler
/// takes the session explicitly, so the whole interaction can run without a display.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub(super) collection: SpectrumCollection,
    pub(super) line_list: Option<LineList>,
    pub(super) state: PlotState,
    pub(super) pointer: Option<[f64; 2]>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            collection: SpectrumCollection::new(settings.color_cycle.clone()),
            settings,
            line_list: None,
            state: PlotState::default(),
            pointer: None,
        }
    }

    pub fn collection(&self) -> &SpectrumCollection {
        &self.collection
    }

    pub fn state(&self) -> &PlotState {
        &self.state
    }

    pub fn line_list(&self) -> Option<&LineList> {
        self.line_list.as_ref()
    }

    pub fn pointer(&self) -> Option<[f64; 2]> {
        self.pointer
    }

    /// Last known data coordinate of the pointer. `None` or a non-finite coordinate means the
    /// pointer left the plot.
    pub fn set_pointer(&mut self, pointer: Option<[f64; 2]>) {
        self.pointer = pointer.filter(|[x, y]| x.is_finite() && y.is_finite());
    }

    /// Follows view changes made directly on the plot (dragging, scrolling).
    pub fn set_view(&mut self, view: ViewBox) {
        if view.iter().all(|v| v.is_finite()) {
            self.state.view = view;
        }
    }

    pub fn add_spectrum(&mut self, spectrum: Spectrum) -> usize {
        self.collection.push(spectrum)
    }

    pub fn load_spectrum(&mut self, path: &Path) -> Result<usize> {
        let loader = loader_for_path(path);
        let spectrum = load_spectrum(path, loader.as_ref())?;
        log::info!("Loaded {} ({} samples)", path.display(), spectrum.len());
        Ok(self.add_spectrum(spectrum))
    }

    /// Loads each file in turn. A file that fails is reported and skipped; the others still
    /// load. The configured line list comes along with the first batch.
    pub fn load_spectra(&mut self, paths: &[PathBuf]) -> Vec<Effect> {
        let mut effects = Vec::new();

        for path in paths {
            match self.load_spectrum(path) {
                Ok(_) => effects.push(status(format!("loaded {}", path.display()))),
                Err(e) => effects.push(error(e.to_string())),
            }
        }

        if self.line_list.is_none() {
            if let Some(path) = self.settings.line_list.clone() {
                if let Err(e) = self.load_line_list(&path) {
                    effects.push(error(format!("line list overlay disabled: {e}")));
                }
            }
        }

        self.reset_view();
        effects.push(Effect::Redraw);
        effects.push(Effect::RefreshTables);
        effects
    }

    pub fn load_line_list(&mut self, path: &Path) -> Result<()> {
        let list = LineList::load(path)?;
        log::info!("Loaded {} reference lines from {}", list.len(), path.display());
        self.line_list = Some(list);
        Ok(())
    }

    pub fn remove_spectrum(&mut self, index: usize) -> Option<Spectrum> {
        let removed = self.collection.remove(index);
        if let Some(spectrum) = &removed {
            log::info!("Closed {}", spectrum.label());
        }
        removed
    }

    /// Edits one transform of one spectrum from its table text. Bad text changes nothing.
    pub fn set_transform(&mut self, index: usize, field: TransformField, text: &str) -> Result<()> {
        self.collection.set_transform(index, field, text)?;
        log::info!("Spectrum {index}: {} set to {text}", field.column_name());
        Ok(())
    }

    pub fn summaries(&self) -> Vec<SpectrumSummary> {
        self.collection.summaries()
    }

    pub fn value_rows(&self) -> Vec<ValueRow> {
        let state = &self.state;
        let mut rows = vec![
            ValueRow::new("Redshift", state.redshift, f64::NAN),
            ValueRow::new("EW", state.ew.value, state.ew.uncertainty),
            ValueRow::new("Flux", state.flux.value, state.flux.uncertainty),
            ValueRow::new(
                "Wgauss",
                state.gauss_center.value,
                state.gauss_center.uncertainty,
            ),
        ];

        rows.extend(
            state
                .trim_lines
                .iter()
                .enumerate()
                .map(|(i, &line)| ValueRow::new(format!("Trim{i}"), line, f64::NAN)),
        );

        rows
    }

    /// Reference lines shifted to the current redshift, with their resolved styles.
    pub fn overlay_lines(&self) -> Vec<OverlayLine<'_>> {
        let Some(list) = &self.line_list else {
            return Vec::new();
        };

        list.entries
            .iter()
            .map(|entry| OverlayLine {
                observed: self.state.observed_wavelength(entry.rest_wave),
                entry,
                style: entry.style(&self.settings.line_style),
            })
            .collect()
    }

    /// Fits the view to all displayed data with a small margin.
    pub fn reset_view(&mut self) {
        self.state.view = match self.collection.extent() {
            Some([x0, y0, x1, y1]) => {
                let pad = |low: f64, high: f64| {
                    let span = high - low;
                    if span > 0.0 {
                        VIEW_MARGIN * span
                    } else {
                        0.5
                    }
                };
                let (px, py) = (pad(x0, x1), pad(y0, y1));
                [x0 - px, y0 - py, x1 + px, y1 + py]
            }
            None => DEFAULT_VIEW,
        };
    }
}
