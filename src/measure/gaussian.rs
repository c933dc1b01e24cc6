use levenberg_marquardt::LevenbergMarquardt;
use nalgebra::DVector;
use varpro::model::builder::SeparableModelBuilder;
use varpro::solvers::levmar::{LevMarProblemBuilder, LevMarSolver};

use super::common::{Value, median};
use crate::error::FitError;
use crate::spectrum::WorkingSpectrum;

const NUM_PARAMS: usize = 5;

pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Gaussian on a local linear continuum:
/// `area / sqrt(2 pi sigma^2) * exp(-0.5 ((x - center) / sigma)^2) + lin0 + lin1 (x - center)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    pub area: f64,
    pub center: f64,
    pub sigma: f64,
    pub lin0: f64,
    pub lin1: f64,
}

impl GaussianParams {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.area * unit_gaussian(x, self.center, self.sigma)
            + self.lin0
            + self.lin1 * (x - self.center)
    }

    fn is_finite(&self) -> bool {
        [self.area, self.center, self.sigma, self.lin0, self.lin1]
            .iter()
            .all(|v| v.is_finite())
    }
}

fn unit_gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let u = (x - center) / sigma;
    (-0.5 * u * u).exp() / (2.0 * std::f64::consts::PI * sigma * sigma).sqrt()
}

// Basis functions of the separable model. `area`, `lin0` and `lin1` are the linear
// coefficients; `center` and `sigma` are the nonlinear parameters.

fn gaussian(x: &DVector<f64>, center: f64, sigma: f64) -> DVector<f64> {
    x.map(|x_val| unit_gaussian(x_val, center, sigma))
}

fn gaussian_pd_center(x: &DVector<f64>, center: f64, sigma: f64) -> DVector<f64> {
    x.map(|x_val| unit_gaussian(x_val, center, sigma) * (x_val - center) / sigma.powi(2))
}

fn gaussian_pd_sigma(x: &DVector<f64>, center: f64, sigma: f64) -> DVector<f64> {
    x.map(|x_val| {
        let u = (x_val - center) / sigma;
        unit_gaussian(x_val, center, sigma) * (u * u - 1.0) / sigma
    })
}

fn constant(x: &DVector<f64>) -> DVector<f64> {
    DVector::from_element(x.len(), 1.0)
}

fn slope(x: &DVector<f64>, center: f64) -> DVector<f64> {
    x.map(|x_val| x_val - center)
}

fn slope_pd_center(x: &DVector<f64>, _center: f64) -> DVector<f64> {
    DVector::from_element(x.len(), -1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianLineFit {
    pub params: GaussianParams,
    /// 1-sigma uncertainty of each parameter.
    pub uncertainties: GaussianParams,
    pub flux: Value,
    pub ew: Value,
    pub center: Value,
    /// Model evaluated at each sample used in the fit.
    pub model: Vec<[f64; 2]>,
    pub chi_squared: f64,
}

/// Least-squares fit of [`GaussianParams`] to the samples of a spectrum inside a window.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianLineFitter {
    x: Vec<f64>,
    y: Vec<f64>,
    weights: Option<Vec<f64>>,
    pub max_iterations: usize,
}

impl GaussianLineFitter {
    /// Keeps the samples with `x0 <= wave < x1` whose flux (and error, if there is one) is
    /// finite, sorted by wavelength.
    pub fn new(spectrum: &WorkingSpectrum, window: [f64; 2]) -> Self {
        let [x0, x1] = window;

        let mut selected: Vec<usize> = (0..spectrum.wave.len())
            .filter(|&i| {
                let w = spectrum.wave[i];
                w >= x0
                    && w < x1
                    && spectrum.flux[i].is_finite()
                    && spectrum.error.as_ref().is_none_or(|e| e[i].is_finite())
            })
            .collect();
        selected.sort_by(|&a, &b| spectrum.wave[a].total_cmp(&spectrum.wave[b]));

        Self {
            x: selected.iter().map(|&i| spectrum.wave[i]).collect(),
            y: selected.iter().map(|&i| spectrum.flux[i]).collect(),
            weights: spectrum
                .error
                .as_ref()
                .map(|error| selected.iter().map(|&i| 1.0 / error[i]).collect()),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Patience of the Levenberg-Marquardt minimizer, in units of `parameters + 1` function
    /// evaluations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Peak-to-peak flux for the area, median wavelength for the center, half the window for
    /// sigma, median flux for the continuum and a flat slope.
    pub fn initial_guess(&self) -> GaussianParams {
        let (min, max) = self
            .y
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &y| {
                (min.min(y), max.max(y))
            });
        let n = self.x.len();
        let sigma = if n >= 2 {
            (self.x[n - 1] - self.x[1]) / 2.0
        } else {
            f64::NAN
        };

        GaussianParams {
            area: max - min,
            center: median(&self.x),
            sigma,
            lin0: median(&self.y),
            lin1: 0.0,
        }
    }

    /// Variable projection fit from [`Self::initial_guess`]. Only `center` and `sigma` are
    /// iterated; the linear coefficients are solved for at every step.
    ///
    /// With an error array the residuals are weighted by `1 / error` and the covariance is
    /// absolute. Without one the covariance is scaled by the reduced chi-squared.
    pub fn fit(&self) -> Result<GaussianLineFit, FitError> {
        let n = self.x.len();
        if n < NUM_PARAMS {
            return Err(FitError::InsufficientData {
                needed: NUM_PARAMS,
                found: n,
            });
        }
        if self
            .weights
            .as_ref()
            .is_some_and(|w| w.iter().any(|w| !w.is_finite()))
        {
            return Err(FitError::NonFinite);
        }

        let guess = self.initial_guess();
        if !guess.is_finite() || guess.sigma == 0.0 {
            return Err(FitError::NonFinite);
        }

        let model = SeparableModelBuilder::<f64>::new(&["center", "sigma"])
            .initial_parameters(vec![guess.center, guess.sigma])
            .independent_variable(DVector::from_vec(self.x.clone()))
            .function(&["center", "sigma"], gaussian)
            .partial_deriv("center", gaussian_pd_center)
            .partial_deriv("sigma", gaussian_pd_sigma)
            .invariant_function(constant)
            .function(&["center"], slope)
            .partial_deriv("center", slope_pd_center)
            .build()
            .map_err(|e| {
                log::error!("Failed to build Gaussian line model: {e:?}");
                FitError::Singular
            })?;

        let mut problem =
            LevMarProblemBuilder::new(model).observations(DVector::from_vec(self.y.clone()));
        if let Some(weights) = &self.weights {
            problem = problem.weights(DVector::from_vec(weights.clone()));
        }
        let problem = problem.build().map_err(|e| {
            log::error!("Failed to build Gaussian line problem: {e:?}");
            FitError::Singular
        })?;

        let minimizer = LevenbergMarquardt::new().with_patience(self.max_iterations);
        let (fit_result, fit_statistics) = LevMarSolver::with_solver(minimizer)
            .fit_with_statistics(problem)
            .map_err(|e| {
                log::debug!("Gaussian line fit did not converge: {e:?}");
                FitError::NoConvergence {
                    iterations: self.max_iterations,
                }
            })?;

        let nonlinear_parameters = fit_result.nonlinear_parameters();
        let linear_coefficients = fit_result
            .linear_coefficients()
            .ok_or(FitError::Singular)?;
        let mut nonlinear_variances = fit_statistics.nonlinear_parameters_variance();
        let mut linear_variances = fit_statistics.linear_coefficients_variance();

        // the solver scales the covariance by the reduced chi-squared; given errors are absolute
        let reduced_chi2 = fit_statistics.regression_standard_error().powi(2);
        if self.weights.is_some() && reduced_chi2 > 0.0 {
            linear_variances /= reduced_chi2;
            nonlinear_variances /= reduced_chi2;
        }

        let params = GaussianParams {
            area: linear_coefficients[0],
            center: nonlinear_parameters[0],
            sigma: nonlinear_parameters[1].abs(),
            lin0: linear_coefficients[1],
            lin1: linear_coefficients[2],
        };
        let uncertainties = GaussianParams {
            area: linear_variances[0].sqrt(),
            center: nonlinear_variances[0].sqrt(),
            sigma: nonlinear_variances[1].sqrt(),
            lin0: linear_variances[1].sqrt(),
            lin1: linear_variances[2].sqrt(),
        };
        let chi_squared = reduced_chi2 * (n - NUM_PARAMS) as f64;

        self.finish(params, uncertainties, chi_squared)
    }

    fn finish(
        &self,
        params: GaussianParams,
        uncertainties: GaussianParams,
        chi_squared: f64,
    ) -> Result<GaussianLineFit, FitError> {
        if !params.is_finite() {
            return Err(FitError::NonFinite);
        }

        let scale = self.y.iter().fold(0.0f64, |acc, y| acc.max(y.abs()));
        if params.lin0.abs() <= f64::EPSILON.sqrt() * scale {
            return Err(FitError::DegenerateContinuum);
        }

        let GaussianParams {
            area,
            center,
            lin0,
            ..
        } = params;

        let flux = Value::new(area, uncertainties.area);
        // the area-continuum covariance term is left out of the propagation
        let ew = Value::new(
            area / lin0,
            (uncertainties.area.powi(2) / lin0.powi(2)
                + area.powi(2) * uncertainties.lin0.powi(2) / lin0.powi(4))
            .sqrt(),
        );
        let center = Value::new(center, uncertainties.center);

        if !flux.value.is_finite() || !ew.value.is_finite() {
            return Err(FitError::NonFinite);
        }

        let model = self.x.iter().map(|&x| [x, params.evaluate(x)]).collect();

        log::debug!("Gaussian fit converged, chi2 = {chi_squared}");

        Ok(GaussianLineFit {
            params,
            uncertainties,
            flux,
            ew,
            center,
            model,
            chi_squared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUTH: GaussianParams = GaussianParams {
        area: 50.0,
        center: 6563.0,
        sigma: 3.0,
        lin0: 10.0,
        lin1: 0.01,
    };

    fn synthetic(params: &GaussianParams, error: Option<f64>) -> WorkingSpectrum {
        let wave: Vec<f64> = (0..240).map(|i| 6500.0 + 0.5 * i as f64).collect();
        let flux = wave.iter().map(|&x| params.evaluate(x)).collect();
        let error = error.map(|e| vec![e; wave.len()]);
        WorkingSpectrum { wave, flux, error }
    }

    fn relative_error(found: f64, expected: f64) -> f64 {
        (found - expected).abs() / expected.abs()
    }

    #[test]
    fn recovers_noiseless_parameters() {
        let spectrum = synthetic(&TRUTH, None);
        let fit = GaussianLineFitter::new(&spectrum, [6500.0, 6620.0])
            .fit()
            .expect("fit converges");

        assert!(relative_error(fit.params.area, TRUTH.area) < 1e-6);
        assert!(relative_error(fit.params.center, TRUTH.center) < 1e-6);
        assert!(relative_error(fit.params.sigma, TRUTH.sigma) < 1e-6);
        assert!(relative_error(fit.params.lin0, TRUTH.lin0) < 1e-6);
        assert!(relative_error(fit.params.lin1, TRUTH.lin1) < 1e-6);

        assert!(fit.flux.uncertainty < 1e-6);
        assert!(fit.center.uncertainty < 1e-6);
        assert!(relative_error(fit.ew.value, TRUTH.area / TRUTH.lin0) < 1e-6);
        assert_eq!(fit.model.len(), spectrum.wave.len());
    }

    #[test]
    fn weighted_fit_reports_absolute_uncertainties() {
        let spectrum = synthetic(&TRUTH, Some(0.1));
        let fit = GaussianLineFitter::new(&spectrum, [6500.0, 6620.0])
            .fit()
            .expect("fit converges");

        assert!(relative_error(fit.params.area, TRUTH.area) < 1e-6);
        assert!(relative_error(fit.params.center, TRUTH.center) < 1e-6);
        assert!(fit.flux.uncertainty > 0.0 && fit.flux.uncertainty.is_finite());
        assert!(fit.ew.uncertainty > 0.0 && fit.ew.uncertainty.is_finite());
        assert!(fit.chi_squared < 1e-12);
    }

    #[test]
    fn given_errors_set_the_uncertainty_scale() {
        let fit_with = |error: f64| {
            GaussianLineFitter::new(&synthetic(&TRUTH, Some(error)), [6500.0, 6620.0])
                .fit()
                .expect("fit converges")
        };
        let (narrow, wide) = (fit_with(0.1), fit_with(0.2));

        assert!(relative_error(wide.flux.uncertainty, 2.0 * narrow.flux.uncertainty) < 1e-3);
        assert!(relative_error(wide.center.uncertainty, 2.0 * narrow.center.uncertainty) < 1e-3);
        assert!(narrow.uncertainties.sigma > 0.0 && narrow.uncertainties.sigma.is_finite());
    }

    #[test]
    fn zero_continuum_is_an_error() {
        let params = GaussianParams { lin0: 0.0, ..TRUTH };
        let spectrum = synthetic(&params, None);
        let result = GaussianLineFitter::new(&spectrum, [6500.0, 6620.0]).fit();
        assert!(result.is_err());
    }

    #[test]
    fn too_few_samples() {
        let spectrum = synthetic(&TRUTH, None);
        let result = GaussianLineFitter::new(&spectrum, [6560.0, 6561.0]).fit();
        assert_eq!(
            result,
            Err(FitError::InsufficientData {
                needed: 5,
                found: 2
            })
        );
    }

    #[test]
    fn window_drops_non_finite_samples_and_sorts() {
        let spectrum = WorkingSpectrum {
            wave: vec![5.0, 1.0, 3.0, 2.0, 4.0, 6.0],
            flux: vec![5.0, 1.0, f64::NAN, 2.0, 4.0, 6.0],
            error: Some(vec![1.0, 1.0, 1.0, f64::INFINITY, 1.0, 1.0]),
        };
        let fitter = GaussianLineFitter::new(&spectrum, [1.0, 6.0]);
        assert_eq!(fitter.x, vec![1.0, 4.0, 5.0]);
        assert_eq!(fitter.y, vec![1.0, 4.0, 5.0]);
    }

    #[test]
    fn initial_guess_follows_window() {
        let spectrum = synthetic(&TRUTH, None);
        let fitter = GaussianLineFitter::new(&spectrum, [6500.0, 6620.0]);
        let guess = fitter.initial_guess();

        assert!((guess.center - 6559.75).abs() < 1e-9);
        assert!((guess.sigma - (6619.5 - 6500.5) / 2.0).abs() < 1e-9);
        assert_eq!(guess.lin1, 0.0);
        assert!(guess.area > 0.0);
    }

    #[test]
    fn iteration_limit_is_respected() {
        let spectrum = synthetic(&TRUTH, None);
        let result = GaussianLineFitter::new(&spectrum, [6500.0, 6620.0])
            .with_max_iterations(1)
            .fit();
        assert_eq!(result, Err(FitError::NoConvergence { iterations: 1 }));
    }
}
