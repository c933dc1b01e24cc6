pub mod ascii;
pub mod table;

use std::path::Path;

pub use ascii::AsciiLoader;
pub use table::TableLoader;

use super::spectrum::{RawSpectrum, Spectrum};
use crate::error::{Result, XtrimError};

/// Turns a file into wavelength, flux and optional error arrays of equal length.
pub trait SpectrumLoader {
    fn load(&self, path: &Path) -> Result<RawSpectrum>;
}

pub fn loader_for_path(path: &Path) -> Box<dyn SpectrumLoader> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv" | "parquet" | "pq") => Box::new(TableLoader),
        _ => Box::new(AsciiLoader),
    }
}

/// Loads and validates one spectrum. I/O and table errors are rewrapped so that every
/// failure names the offending file.
pub fn load_spectrum(path: &Path, loader: &dyn SpectrumLoader) -> Result<Spectrum> {
    let raw = loader.load(path).map_err(|err| match err {
        XtrimError::File(io) => XtrimError::load(path, io.to_string()),
        XtrimError::DataFrame(table) => XtrimError::load(path, table.to_string()),
        other => other,
    })?;
    Spectrum::new(path, raw)
}
