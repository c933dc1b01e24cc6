use std::path::{Path, PathBuf};

use super::colors::{DEFAULT_CYCLE, Rgb};
use super::smoothing::boxcar_smooth;
use crate::error::{Result, XtrimError};

/// Arrays handed over by a loader, before they become a [`Spectrum`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSpectrum {
    pub wave: Vec<f64>,
    pub flux: Vec<f64>,
    pub error: Option<Vec<f64>>,
}

impl RawSpectrum {
    pub fn new(wave: Vec<f64>, flux: Vec<f64>, error: Option<Vec<f64>>) -> Self {
        Self { wave, flux, error }
    }

    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.wave.is_empty() {
            return Err(XtrimError::invariant(path, "no samples"));
        }

        if self.wave.len() != self.flux.len() {
            return Err(XtrimError::invariant(
                path,
                format!(
                    "wavelength has {} samples but flux has {}",
                    self.wave.len(),
                    self.flux.len()
                ),
            ));
        }

        if let Some(error) = &self.error {
            if error.len() != self.flux.len() {
                return Err(XtrimError::invariant(
                    path,
                    format!(
                        "flux has {} samples but error has {}",
                        self.flux.len(),
                        error.len()
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Wavelength, flux and error with the per-spectrum display transforms applied.
/// This is what the plot shows and what measurements are made against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingSpectrum {
    pub wave: Vec<f64>,
    pub flux: Vec<f64>,
    pub error: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct Spectrum {
    path: PathBuf,
    label: String,

    wave: Vec<f64>,
    flux: Vec<f64>,
    error: Option<Vec<f64>>,

    spec_display: Vec<f64>,
    error_display: Option<Vec<f64>>,

    smooth_width: usize,
    pub redshift_add: f64,
    pub mult: f64,
    pub add: f64,
    pub color: Rgb,
}

impl Spectrum {
    pub fn new(path: impl Into<PathBuf>, raw: RawSpectrum) -> Result<Self> {
        let path = path.into();
        raw.validate(&path)?;

        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let RawSpectrum { wave, flux, error } = raw;

        Ok(Self {
            path,
            label,
            spec_display: flux.clone(),
            error_display: error.clone(),
            wave,
            flux,
            error,
            smooth_width: 0,
            redshift_add: 0.0,
            mult: 1.0,
            add: 0.0,
            color: DEFAULT_CYCLE[0],
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.wave.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wave.is_empty()
    }

    pub fn wave(&self) -> &[f64] {
        &self.wave
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn error(&self) -> Option<&[f64]> {
        self.error.as_deref()
    }

    pub fn spec_display(&self) -> &[f64] {
        &self.spec_display
    }

    pub fn error_display(&self) -> Option<&[f64]> {
        self.error_display.as_deref()
    }

    pub fn smooth_width(&self) -> usize {
        self.smooth_width
    }

    pub fn reset(&mut self) {
        self.smooth_width = 0;
        self.spec_display.clone_from(&self.flux);
        self.error_display.clone_from(&self.error);
    }

    /// Boxcar-smooths the display arrays. Widths of zero or less restore the raw arrays.
    ///
    /// The smoothed error is divided by `sqrt(width)`, which assumes uncorrelated pixel
    /// noise. That is an approximation: it underestimates the error once the kernel
    /// overlaps bins that were already averaged.
    pub fn smooth(&mut self, width: i64) {
        let Ok(width) = usize::try_from(width) else {
            self.reset();
            return;
        };
        if width == 0 {
            self.reset();
            return;
        }

        self.smooth_width = width;
        self.spec_display = boxcar_smooth(&self.flux, width);

        let scale = (width as f64).sqrt();
        self.error_display = self.error.as_ref().map(|error| {
            boxcar_smooth(error, width)
                .into_iter()
                .map(|e| e / scale)
                .collect()
        });
    }

    pub fn working(&self) -> WorkingSpectrum {
        let stretch = 1.0 + self.redshift_add;
        WorkingSpectrum {
            wave: self.wave.iter().map(|w| w * stretch).collect(),
            flux: self
                .spec_display
                .iter()
                .map(|f| f * self.mult + self.add)
                .collect(),
            error: self.error_display.as_ref().map(|error| {
                error.iter().map(|e| e * self.mult + self.add).collect()
            }),
        }
    }

    /// The working view with the error scaled by `|mult|` only. An additive offset moves the
    /// flux but not its uncertainty, so this is what direct integration and error bars use.
    pub fn measurement_view(&self) -> WorkingSpectrum {
        let WorkingSpectrum { wave, flux, .. } = self.working();
        WorkingSpectrum {
            wave,
            flux,
            error: self.error_display.as_ref().map(|error| {
                error.iter().map(|e| (e * self.mult).abs()).collect()
            }),
        }
    }

    /// Finite `[x_min, y_min, x_max, y_max]` of the displayed data, if any sample is finite.
    pub fn extent(&self) -> Option<[f64; 4]> {
        let working = self.working();
        let mut extent = [
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        ];

        for (&x, &y) in working.wave.iter().zip(&working.flux) {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            extent[0] = extent[0].min(x);
            extent[1] = extent[1].min(y);
            extent[2] = extent[2].max(x);
            extent[3] = extent[3].max(y);
        }

        (extent[0] <= extent[2]).then_some(extent)
    }
}
