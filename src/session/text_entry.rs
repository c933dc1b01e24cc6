use super::commands::KeyInput;
use crate::error::{Result, XtrimError};

/// What the typed text will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTarget {
    RestWavelength,
    SmoothWidth,
}

impl TextTarget {
    pub fn prompt(self) -> &'static str {
        match self {
            TextTarget::RestWavelength => "'m': input rest wavelength:",
            TextTarget::SmoothWidth => "'s': input smoothing width:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    Editing,
    Aborted,
    Submitted(String),
}

/// Buffer for the text-entry sub-mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub target: TextTarget,
    buffer: String,
}

impl TextEntry {
    pub fn new(target: TextTarget) -> Self {
        Self {
            target,
            buffer: String::new(),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Prompt followed by what has been typed so far.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.target.prompt(), self.buffer)
    }

    pub fn handle(&mut self, key: KeyInput) -> TextOutcome {
        match key {
            KeyInput::Escape => {
                self.buffer.clear();
                TextOutcome::Aborted
            }
            KeyInput::Backspace => {
                self.buffer.pop();
                TextOutcome::Editing
            }
            KeyInput::Enter => TextOutcome::Submitted(std::mem::take(&mut self.buffer)),
            KeyInput::Char(c) => {
                self.buffer.push(c);
                TextOutcome::Editing
            }
        }
    }
}

/// Non-zero finite rest wavelength.
pub fn parse_rest_wavelength(text: &str) -> Result<f64> {
    let wave0: f64 = text.trim().parse().map_err(|_parse_error| {
        XtrimError::Parse(format!("'{text}' is not a number, use non-zero numbers"))
    })?;

    if wave0 == 0.0 || !wave0.is_finite() {
        return Err(XtrimError::Parse(format!(
            "'{text}' is not a usable rest wavelength, use non-zero numbers"
        )));
    }

    Ok(wave0)
}

/// Redshift that moves `rest` to `observed`.
pub fn redshift_from_line(observed: f64, rest: f64) -> f64 {
    (observed - rest) / rest
}
