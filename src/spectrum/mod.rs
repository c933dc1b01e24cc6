pub mod collection;
pub mod colors;
pub mod line_list;
pub mod loaders;
pub mod smoothing;
pub mod spectrum;

pub use collection::{SpectrumCollection, SpectrumSummary, TransformField};
pub use colors::Rgb;
pub use line_list::{DashStyle, LineList, LineListEntry, LineStyle};
pub use spectrum::{RawSpectrum, Spectrum, WorkingSpectrum};
