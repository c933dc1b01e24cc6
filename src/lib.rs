//! Quick-look inspection of one-dimensional astronomical spectra: smoothing and scaling,
//! equivalent width and line flux by direct integration, Gaussian line fits, redshift from
//! a marked line, and trim markers, all driven from the keyboard over an interactive plot.
#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod measure;
pub mod session;
pub mod spectrum;
pub mod ui;

pub use config::Settings;
pub use error::{FitError, Result, XtrimError};
pub use session::Session;
