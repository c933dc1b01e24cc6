use super::common::{Value, trapezoid};
use crate::spectrum::WorkingSpectrum;

/// Straight continuum through two picked points, stored in ascending x order.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Continuum {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

impl Continuum {
    /// Orders the two points by x, keeping each point's y with its x.
    pub fn new(a: [f64; 2], b: [f64; 2]) -> Self {
        if b[0] < a[0] {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn width(&self) -> f64 {
        self.end[0] - self.start[0]
    }

    pub fn level_at(&self, x: f64) -> f64 {
        let [x0, y0] = self.start;
        let [x1, y1] = self.end;
        (x - x0) / (x1 - x0) * (y1 - y0) + y0
    }
}

/// Equivalent width and line flux from the same measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineMeasurement {
    pub ew: Value,
    pub flux: Value,
}

/// Direct integration of the spectrum against a straight continuum over `x0 <= wave < x1`.
///
/// The uncertainties treat pixels as independent and are only exact for evenly spaced
/// samples: `sigma_ew = sqrt(trapz((err / ctm)^2) * (x1 - x0))` and
/// `sigma_flux = sqrt(trapz(err^2) * (x1 - x0))`. When the display is smoothed, neighbouring
/// pixels are correlated and these underestimate the true error. Without an error array both
/// uncertainties are NaN. An empty selection integrates to zero.
pub fn measure_equivalent_width(
    spectrum: &WorkingSpectrum,
    continuum: &Continuum,
) -> LineMeasurement {
    let (x0, x1) = (continuum.start[0], continuum.end[0]);

    let selected: Vec<usize> = spectrum
        .wave
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w >= x0 && w < x1)
        .map(|(i, _)| i)
        .collect();

    let wave: Vec<f64> = selected.iter().map(|&i| spectrum.wave[i]).collect();
    let flux: Vec<f64> = selected.iter().map(|&i| spectrum.flux[i]).collect();
    let level: Vec<f64> = wave.iter().map(|&w| continuum.level_at(w)).collect();

    let normalized: Vec<f64> = flux.iter().zip(&level).map(|(f, c)| f / c - 1.0).collect();
    let excess: Vec<f64> = flux.iter().zip(&level).map(|(f, c)| f - c).collect();

    let ew = trapezoid(&normalized, &wave);
    let line_flux = trapezoid(&excess, &wave);

    let (ew_sigma, flux_sigma) = match &spectrum.error {
        Some(error) => {
            let error: Vec<f64> = selected.iter().map(|&i| error[i]).collect();
            let relative: Vec<f64> = error
                .iter()
                .zip(&level)
                .map(|(e, c)| (e / c).powi(2))
                .collect();
            let squared: Vec<f64> = error.iter().map(|e| e * e).collect();
            (
                (trapezoid(&relative, &wave) * continuum.width()).sqrt(),
                (trapezoid(&squared, &wave) * continuum.width()).sqrt(),
            )
        }
        None => (f64::NAN, f64::NAN),
    };

    LineMeasurement {
        ew: Value::new(ew, ew_sigma),
        flux: Value::new(line_flux, flux_sigma),
    }
}
