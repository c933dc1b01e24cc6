use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, XtrimError>;

/// Reasons a Gaussian line fit can fail. The fit never panics; callers get one of these
/// and substitute an undefined measurement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("need at least {needed} finite samples in the fit window, found {found}")]
    InsufficientData { needed: usize, found: usize },

    #[error("normal equations are singular")]
    Singular,

    #[error("fit did not converge after {iterations} iterations")]
    NoConvergence { iterations: usize },

    #[error("continuum level is zero, equivalent width is undefined")]
    DegenerateContinuum,

    #[error("fit produced non-finite parameters")]
    NonFinite,
}

#[derive(Error, Debug)]
pub enum XtrimError {
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("{} is not a valid spectrum: {reason}", path.display())]
    Invariant { path: PathBuf, reason: String },

    #[error("{}:{line}: {reason}", path.display())]
    LineList {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("input error: {0}")]
    Parse(String),

    #[error("fit failed: {0}")]
    Fit(#[from] FitError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no spectrum at index {0}")]
    NoSuchSpectrum(usize),

    #[error("file I/O error: {0}")]
    File(#[from] std::io::Error),

    #[error("table error: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("settings error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl XtrimError {
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        XtrimError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        XtrimError::Invariant {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
