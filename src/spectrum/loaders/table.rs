use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use super::SpectrumLoader;
use crate::error::{Result, XtrimError};
use crate::spectrum::spectrum::RawSpectrum;

const WAVE_COLUMNS: &[&str] = &["wavelength", "wave", "lambda"];
const FLUX_COLUMNS: &[&str] = &["flux", "flux_density", "flux_reduced"];
const ERROR_COLUMNS: &[&str] = &["flux_err", "err", "error", "err_reduced"];

/// Tabulated spectra in CSV or Parquet files, with named wavelength, flux and optional error
/// columns. Column names are matched case-insensitively against a list of aliases.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableLoader;

impl SpectrumLoader for TableLoader {
    fn load(&self, path: &Path) -> Result<RawSpectrum> {
        let df = read_dataframe(path)?;
        log::debug!(
            "Read {} rows with columns {:?} from {}",
            df.height(),
            df.get_column_names(),
            path.display()
        );
        raw_from_dataframe(&df, path)
    }
}

fn read_dataframe(path: &Path) -> Result<DataFrame> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let df = match extension.as_str() {
        "parquet" | "pq" => ParquetReader::new(File::open(path)?).finish()?,
        _ => CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
    };

    Ok(df)
}

fn find_column<'a>(df: &'a DataFrame, aliases: &[&str]) -> Option<&'a Column> {
    aliases.iter().find_map(|alias| {
        df.columns()
            .iter()
            .find(|column| column.name().as_str().eq_ignore_ascii_case(alias))
    })
}

fn column_values(column: &Column) -> Result<Vec<f64>> {
    let values = column.cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect())
}

pub(super) fn raw_from_dataframe(df: &DataFrame, path: &Path) -> Result<RawSpectrum> {
    let missing = |what: &str, aliases: &[&str]| {
        XtrimError::load(
            path,
            format!("no {what} column (looked for {})", aliases.join(", ")),
        )
    };

    let wave = find_column(df, WAVE_COLUMNS).ok_or_else(|| missing("wavelength", WAVE_COLUMNS))?;
    let flux = find_column(df, FLUX_COLUMNS).ok_or_else(|| missing("flux", FLUX_COLUMNS))?;
    let error = find_column(df, ERROR_COLUMNS)
        .map(column_values)
        .transpose()?;

    let raw = RawSpectrum::new(column_values(wave)?, column_values(flux)?, error);
    raw.validate(path)?;
    Ok(raw)
}
