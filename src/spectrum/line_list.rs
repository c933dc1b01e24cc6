use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::colors::Rgb;
use crate::error::{Result, XtrimError};

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>[^=]+)=(?P<value>[^=]*)$").expect("key=value pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
pub enum DashStyle {
    Solid,
    #[default]
    Dashed,
    Dotted,
    DashDot,
}

impl DashStyle {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "-" | "solid" => Some(DashStyle::Solid),
            "--" | "dashed" => Some(DashStyle::Dashed),
            ":" | "dotted" => Some(DashStyle::Dotted),
            "-." | "dashdot" => Some(DashStyle::DashDot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LineStyle {
    pub color: Rgb,
    pub dash: DashStyle,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Rgb::LIGHT_BLUE,
            dash: DashStyle::Dashed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineListEntry {
    pub rest_wave: f64,
    pub label: String,
    pub overrides: BTreeMap<String, String>,
}

impl LineListEntry {
    /// Style for this line: `defaults` with the recognised overrides (`color`/`c`,
    /// `ls`/`linestyle`) applied. Unrecognised keys and values are ignored.
    pub fn style(&self, defaults: &LineStyle) -> LineStyle {
        let mut style = *defaults;

        if let Some(color) = ["color", "c"]
            .iter()
            .find_map(|key| self.overrides.get(*key))
            .and_then(|value| Rgb::parse(value))
        {
            style.color = color;
        }

        if let Some(dash) = ["ls", "linestyle"]
            .iter()
            .find_map(|key| self.overrides.get(*key))
            .and_then(|value| DashStyle::parse(value))
        {
            style.dash = dash;
        }

        style
    }
}

/// Reference lines overlaid on the plot at `rest_wave * (1 + z)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineList {
    pub entries: Vec<LineListEntry>,
}

impl LineList {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// One line per entry: `<rest_wavelength> <label> [key=value ...]`. Blank lines are skipped
    /// and quotes around values are stripped.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut entries = Vec::new();

        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let error = |reason: String| XtrimError::LineList {
                path: path.to_path_buf(),
                line: number + 1,
                reason,
            };

            let mut parts = line.split_whitespace();
            let rest_wave = parts
                .next()
                .ok_or_else(|| error("missing wavelength".to_owned()))?;
            let rest_wave: f64 = rest_wave
                .parse()
                .map_err(|_parse_error| error(format!("invalid wavelength '{rest_wave}'")))?;
            let label = parts
                .next()
                .ok_or_else(|| error("missing label".to_owned()))?
                .to_owned();

            let mut overrides = BTreeMap::new();
            for param in parts {
                let captures = KEY_VALUE
                    .captures(param)
                    .ok_or_else(|| error(format!("expected key=value, found '{param}'")))?;
                let key = captures["key"].trim().to_owned();
                let value = captures["value"]
                    .trim()
                    .trim_matches(|c| c == '\'' || c == '"')
                    .to_owned();
                overrides.insert(key, value);
            }

            entries.push(LineListEntry {
                rest_wave,
                label,
                overrides,
            });
        }

        log::debug!("Parsed {} lines from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::colors::DEFAULT_CYCLE;

    fn parse(text: &str) -> Result<LineList> {
        LineList::parse(text, Path::new("lines.dat"))
    }

    #[test]
    fn parses_entries_and_overrides() {
        let list = parse("6564.61 Halpha color='red' ls=\"-\"\n\n  4862.68 Hbeta\n")
            .expect("valid line list");

        assert_eq!(list.len(), 2);
        assert!((list.entries[0].rest_wave - 6564.61).abs() < 1e-9);
        assert_eq!(list.entries[0].label, "Halpha");
        assert_eq!(list.entries[0].overrides["color"], "red");
        assert_eq!(list.entries[0].overrides["ls"], "-");
        assert!(list.entries[1].overrides.is_empty());
    }

    #[test]
    fn style_applies_overrides() {
        let list = parse("6564.61 Halpha color=red ls=:\n5008.24 [OIII] alpha=0.5").expect("valid");
        let defaults = LineStyle::default();

        let style = list.entries[0].style(&defaults);
        assert_eq!(style.color, Rgb::RED);
        assert_eq!(style.dash, DashStyle::Dotted);

        assert_eq!(list.entries[1].style(&defaults), defaults);
    }

    #[test]
    fn short_color_forms_override_the_default() {
        let list = parse("6564.61 Halpha color=r\n4862.68 Hbeta color=C2\n4340.47 Hgamma color=k")
            .expect("valid");
        let defaults = LineStyle::default();

        assert_eq!(list.entries[0].style(&defaults).color, Rgb::RED);
        assert_eq!(list.entries[1].style(&defaults).color, DEFAULT_CYCLE[2]);
        assert_eq!(list.entries[2].style(&defaults).color, Rgb::new(0, 0, 0));
    }

    #[test]
    fn reports_malformed_lines_with_line_number() {
        for (text, bad_line) in [
            ("6564.61 Halpha\nHbeta 4862.68\n", 2),
            ("6564.61\n", 1),
            ("\n6564.61 Halpha color\n", 2),
            ("6564.61 Halpha a=b=c\n", 1),
        ] {
            match parse(text) {
                Err(XtrimError::LineList { line, .. }) => assert_eq!(line, bad_line, "{text:?}"),
                other => panic!("expected a line list error for {text:?}, got {other:?}"),
            }
        }
    }
}
