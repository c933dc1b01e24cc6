use std::path::{Path, PathBuf};

use crate::error::{Result, XtrimError};
use crate::measure::gaussian::DEFAULT_MAX_ITERATIONS;
use crate::spectrum::LineStyle;
use crate::spectrum::colors::{DEFAULT_CYCLE, Rgb};

/// Startup settings, read from a YAML file. Every field falls back to its default when
/// missing from the file.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Settings {
    /// Reference line list loaded with every batch of spectra.
    pub line_list: Option<PathBuf>,
    pub line_style: LineStyle,
    pub color_cycle: Vec<Rgb>,

    /// Fraction of the view width (or height) added on each side by zoom out.
    pub zoom_out_fraction: f64,
    /// Fraction of the view width (or height) removed on each side by zoom in.
    pub zoom_in_fraction: f64,
    pub pan_fraction: f64,

    pub fit_max_iterations: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_list: None,
            line_style: LineStyle::default(),
            color_cycle: DEFAULT_CYCLE.to_vec(),
            zoom_out_fraction: 0.1,
            zoom_in_fraction: 1.0 / 12.0,
            pan_fraction: 0.1,
            fit_max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            XtrimError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("zoom_out_fraction", self.zoom_out_fraction),
            ("zoom_in_fraction", self.zoom_in_fraction),
            ("pan_fraction", self.pan_fraction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(XtrimError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        // zooming in by half or more per side would collapse the view
        if self.zoom_in_fraction >= 0.5 {
            return Err(XtrimError::Config(format!(
                "zoom_in_fraction must be below 0.5, got {}",
                self.zoom_in_fraction
            )));
        }

        if self.fit_max_iterations == 0 {
            return Err(XtrimError::Config(
                "fit_max_iterations must be at least 1".to_owned(),
            ));
        }

        Ok(())
    }
}
