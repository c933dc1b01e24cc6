pub mod common;
pub mod equivalent_width;
pub mod gaussian;

pub use common::Value;
pub use equivalent_width::{Continuum, LineMeasurement, measure_equivalent_width};
pub use gaussian::{GaussianLineFit, GaussianLineFitter, GaussianParams};
