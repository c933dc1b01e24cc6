use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::SpectrumLoader;
use crate::error::{Result, XtrimError};
use crate::spectrum::spectrum::RawSpectrum;

static HEADER_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*(?P<key>[A-Za-z][A-Za-z0-9_\-]*)\s*=\s*(?P<value>[^/]*?)\s*(?:/.*)?$")
        .expect("header card pattern is valid")
});

/// Plain text spectra.
///
/// Comment lines start with `#`; comments of the form `# KEY = value` are header cards. When
/// the cards carry a linear wavelength solution (`CRVAL1`, `CRPIX1` and `CDELT1` or `CD1_1`)
/// the data columns are `flux [error]` and the wavelength is computed, in log10 units if
/// `CTYPE1 = WAVE-LOG` or `LOGLAM = T`. Otherwise the columns are `wave flux [error]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiLoader;

impl SpectrumLoader for AsciiLoader {
    fn load(&self, path: &Path) -> Result<RawSpectrum> {
        let text = std::fs::read_to_string(path)?;
        parse_ascii(&text, path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct WavelengthSolution {
    crval: f64,
    crpix: f64,
    cdelt: f64,
    log: bool,
}

impl WavelengthSolution {
    fn from_cards(cards: &HashMap<String, String>, path: &Path) -> Result<Option<Self>> {
        let number = |key: &str| -> Result<Option<f64>> {
            cards
                .get(key)
                .map(|value| {
                    value.parse::<f64>().map_err(|_parse_error| {
                        XtrimError::load(
                            path,
                            format!("header card {key} = '{value}' is not a number"),
                        )
                    })
                })
                .transpose()
        };

        let crval = number("CRVAL1")?;
        let crpix = number("CRPIX1")?;
        let cdelt = match number("CD1_1")? {
            Some(cd) => Some(cd),
            None => number("CDELT1")?,
        };

        match (crval, crpix, cdelt) {
            (None, None, None) => Ok(None),
            (Some(crval), Some(crpix), Some(cdelt)) => {
                let log = cards
                    .get("CTYPE1")
                    .is_some_and(|ctype| ctype.eq_ignore_ascii_case("WAVE-LOG"))
                    || cards
                        .get("LOGLAM")
                        .is_some_and(|flag| matches!(flag.as_str(), "T" | "t" | "true" | "1"));
                Ok(Some(Self {
                    crval,
                    crpix,
                    cdelt,
                    log,
                }))
            }
            _ => Err(XtrimError::load(
                path,
                "wavelength header incomplete (need CRVAL1, CRPIX1 and CDELT1 or CD1_1)",
            )),
        }
    }

    // `pixel` is zero based; CRPIX1 follows the one based convention.
    fn wavelength(&self, pixel: usize) -> f64 {
        let value = self.crval + (pixel as f64 - self.crpix + 1.0) * self.cdelt;
        if self.log { 10f64.powf(value) } else { value }
    }
}

fn split_columns(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

pub(super) fn parse_ascii(text: &str, path: &Path) -> Result<RawSpectrum> {
    let mut cards: HashMap<String, String> = HashMap::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('#') {
            if let Some(captures) = HEADER_CARD.captures(trimmed) {
                let value = captures["value"].trim_matches(|c| c == '\'' || c == '"');
                cards.insert(captures["key"].to_ascii_uppercase(), value.trim().to_owned());
            }
            continue;
        }

        let parsed: std::result::Result<Vec<f64>, _> =
            split_columns(trimmed).map(str::parse::<f64>).collect();

        match parsed {
            Ok(row) => rows.push(row),
            // a single non-numeric row before any data is a column header
            Err(_) if rows.is_empty() => {
                log::debug!("Skipping column header in {}: {trimmed}", path.display());
            }
            Err(err) => {
                return Err(XtrimError::load(
                    path,
                    format!("line {}: {err}", number + 1),
                ));
            }
        }
    }

    if rows.is_empty() {
        return Err(XtrimError::load(path, "no data rows"));
    }

    let columns = rows[0].len();
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns) {
        return Err(XtrimError::invariant(
            path,
            format!(
                "data row {} has {} columns, expected {columns}",
                index + 1,
                row.len()
            ),
        ));
    }

    let column = |i: usize| -> Vec<f64> { rows.iter().map(|row| row[i]).collect() };

    let raw = match WavelengthSolution::from_cards(&cards, path)? {
        Some(solution) => {
            if let Some(naxis) = cards.get("NAXIS1") {
                if naxis.parse::<usize>().ok() != Some(rows.len()) {
                    return Err(XtrimError::invariant(
                        path,
                        format!("NAXIS1 = {naxis} but the file has {} rows", rows.len()),
                    ));
                }
            }

            let wave = (0..rows.len()).map(|i| solution.wavelength(i)).collect();
            match columns {
                1 => RawSpectrum::new(wave, column(0), None),
                2 => RawSpectrum::new(wave, column(0), Some(column(1))),
                n => {
                    return Err(XtrimError::load(
                        path,
                        format!(
                            "expected flux [error] columns with a wavelength header, found {n}"
                        ),
                    ));
                }
            }
        }
        None => match columns {
            2 => RawSpectrum::new(column(0), column(1), None),
            3 => RawSpectrum::new(column(0), column(1), Some(column(2))),
            n => {
                return Err(XtrimError::load(
                    path,
                    format!("expected wave flux [error] columns, found {n}"),
                ));
            }
        },
    };

    raw.validate(path)?;
    Ok(raw)
}
