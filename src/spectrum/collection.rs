use rayon::prelude::*;

use super::colors::{DEFAULT_CYCLE, Rgb};
use super::spectrum::Spectrum;
use crate::error::{Result, XtrimError};

/// Editable per-spectrum display transforms, keyed by their files table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformField {
    RedshiftAdd,
    SmoothWidth,
    Mult,
    Add,
}

impl TransformField {
    pub const ALL: [TransformField; 4] = [
        TransformField::RedshiftAdd,
        TransformField::SmoothWidth,
        TransformField::Mult,
        TransformField::Add,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            TransformField::RedshiftAdd => "+Redshift",
            TransformField::SmoothWidth => "Smooth",
            TransformField::Mult => "x",
            TransformField::Add => "+",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column_name() == name)
    }
}

/// One row of the files table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSummary {
    pub label: String,
    pub redshift_add: f64,
    pub smooth_width: usize,
    pub mult: f64,
    pub add: f64,
    pub color_token: String,
    pub color: Rgb,
}

/// Parses a smoothing width the way it is typed: any number, truncated toward zero.
pub fn parse_smooth_width(text: &str) -> Result<i64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_parse_error| XtrimError::Parse(format!("'{text}' is not a number")))?;
    if !value.is_finite() {
        return Err(XtrimError::Parse(format!("'{text}' is not a finite number")));
    }
    Ok(value.trunc() as i64)
}

fn parse_float(text: &str) -> Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_parse_error| XtrimError::Parse(format!("'{text}' is not a number")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(XtrimError::Parse(format!("'{text}' is not a finite number")))
    }
}

/// Ordered list of open spectra. The first one is the measurement target; colors follow the
/// order through the configured cycle.
#[derive(Debug, Clone)]
pub struct SpectrumCollection {
    spectra: Vec<Spectrum>,
    color_cycle: Vec<Rgb>,
}

impl Default for SpectrumCollection {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE.to_vec())
    }
}

impl SpectrumCollection {
    pub fn new(color_cycle: Vec<Rgb>) -> Self {
        let color_cycle = if color_cycle.is_empty() {
            DEFAULT_CYCLE.to_vec()
        } else {
            color_cycle
        };

        Self {
            spectra: Vec::new(),
            color_cycle,
        }
    }

    pub fn push(&mut self, spectrum: Spectrum) -> usize {
        self.spectra.push(spectrum);
        self.update_colors();
        self.spectra.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Spectrum> {
        if index >= self.spectra.len() {
            return None;
        }
        let removed = self.spectra.remove(index);
        self.update_colors();
        Some(removed)
    }

    pub fn update_colors(&mut self) {
        let cycle = &self.color_cycle;
        for (i, spectrum) in self.spectra.iter_mut().enumerate() {
            spectrum.color = cycle[i % cycle.len()];
        }
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    pub fn first(&self) -> Option<&Spectrum> {
        self.spectra.first()
    }

    pub fn get(&self, index: usize) -> Option<&Spectrum> {
        self.spectra.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spectrum> {
        self.spectra.iter()
    }

    pub fn smooth_all(&mut self, width: i64) {
        self.spectra
            .par_iter_mut()
            .for_each(|spectrum| spectrum.smooth(width));
    }

    pub fn set_transform(&mut self, index: usize, field: TransformField, text: &str) -> Result<()> {
        let spectrum = self
            .spectra
            .get_mut(index)
            .ok_or(XtrimError::NoSuchSpectrum(index))?;

        match field {
            TransformField::RedshiftAdd => spectrum.redshift_add = parse_float(text)?,
            TransformField::SmoothWidth => spectrum.smooth(parse_smooth_width(text)?),
            TransformField::Mult => spectrum.mult = parse_float(text)?,
            TransformField::Add => spectrum.add = parse_float(text)?,
        }

        Ok(())
    }

    pub fn summaries(&self) -> Vec<SpectrumSummary> {
        self.spectra
            .iter()
            .enumerate()
            .map(|(i, spectrum)| SpectrumSummary {
                label: spectrum.label().to_owned(),
                redshift_add: spectrum.redshift_add,
                smooth_width: spectrum.smooth_width(),
                mult: spectrum.mult,
                add: spectrum.add,
                color_token: format!("C{i}"),
                color: spectrum.color,
            })
            .collect()
    }

    /// Union of the displayed extents of every spectrum.
    pub fn extent(&self) -> Option<[f64; 4]> {
        self.spectra
            .iter()
            .filter_map(Spectrum::extent)
            .reduce(|a, b| {
                [a[0].min(b[0]), a[1].min(b[1]), a[2].max(b[2]), a[3].max(b[3])]
            })
    }
}

impl<'a> IntoIterator for &'a SpectrumCollection {
    type Item = &'a Spectrum;
    type IntoIter = std::slice::Iter<'a, Spectrum>;

    fn into_iter(self) -> Self::IntoIter {
        self.spectra.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::spectrum::RawSpectrum;

    fn spectrum(name: &str, offset: f64) -> Spectrum {
        let wave = (0..10).map(|i| offset + i as f64).collect();
        let flux = (0..10).map(|i| i as f64).collect();
        Spectrum::new(name, RawSpectrum::new(wave, flux, None)).expect("valid spectrum")
    }

    #[test]
    fn colors_follow_order_and_wrap() {
        let mut collection = SpectrumCollection::new(vec![Rgb::RED, Rgb::LIGHT_BLUE]);
        for i in 0..3 {
            collection.push(spectrum(&format!("s{i}.txt"), 0.0));
        }

        let colors: Vec<Rgb> = collection.iter().map(|s| s.color).collect();
        assert_eq!(colors, vec![Rgb::RED, Rgb::LIGHT_BLUE, Rgb::RED]);

        collection.remove(0);
        assert_eq!(collection.get(0).map(|s| s.color), Some(Rgb::RED));
        assert_eq!(collection.summaries()[1].color_token, "C1");
    }

    #[test]
    fn set_transform_by_field() {
        let mut collection = SpectrumCollection::default();
        collection.push(spectrum("a.txt", 0.0));

        collection
            .set_transform(0, TransformField::Mult, "2.5")
            .expect("valid multiplier");
        collection
            .set_transform(0, TransformField::SmoothWidth, "3.7")
            .expect("valid width");

        let summary = &collection.summaries()[0];
        assert_eq!(summary.mult, 2.5);
        assert_eq!(summary.smooth_width, 3);
        assert_eq!(summary.label, "a.txt");
    }

    #[test]
    fn invalid_transform_leaves_state_unchanged() {
        let mut collection = SpectrumCollection::default();
        collection.push(spectrum("a.txt", 0.0));

        assert!(matches!(
            collection.set_transform(0, TransformField::Add, "abc"),
            Err(XtrimError::Parse(_))
        ));
        assert!(matches!(
            collection.set_transform(3, TransformField::Add, "1"),
            Err(XtrimError::NoSuchSpectrum(3))
        ));
        assert_eq!(collection.summaries()[0].add, 0.0);
    }

    #[test]
    fn smooth_all_applies_to_every_spectrum() {
        let mut collection = SpectrumCollection::default();
        collection.push(spectrum("a.txt", 0.0));
        collection.push(spectrum("b.txt", 0.0));

        collection.smooth_all(3);
        assert!(collection.iter().all(|s| s.smooth_width() == 3));

        collection.smooth_all(-2);
        assert!(collection.iter().all(|s| s.spec_display() == s.flux()));
    }

    #[test]
    fn extent_is_union() {
        let mut collection = SpectrumCollection::default();
        assert_eq!(collection.extent(), None);

        collection.push(spectrum("a.txt", 0.0));
        collection.push(spectrum("b.txt", 100.0));
        assert_eq!(collection.extent(), Some([0.0, 0.0, 109.0, 9.0]));
    }

    #[test]
    fn column_names_round_trip() {
        for field in TransformField::ALL {
            assert_eq!(TransformField::from_column_name(field.column_name()), Some(field));
        }
        assert_eq!(TransformField::from_column_name("Filename"), None);
    }
}
