use std::fmt;

use super::text_entry::TextEntry;
use crate::measure::{Continuum, Value};

/// `[x0, y0, x1, y1]`
pub type ViewBox = [f64; 4];

pub const DEFAULT_VIEW: ViewBox = [0.0, 0.0, 1.0, 1.0];

/// Progress of a two-press pick. `Done` keeps the completed result around for display until
/// the next pick starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickSequence<P, D> {
    Idle,
    AwaitingSecond(P),
    Done(D),
}

impl<P, D> Default for PickSequence<P, D> {
    fn default() -> Self {
        PickSequence::Idle
    }
}

impl<P, D> PickSequence<P, D> {
    pub fn is_awaiting_second(&self) -> bool {
        matches!(self, PickSequence::AwaitingSecond(_))
    }

    pub fn done(&self) -> Option<&D> {
        match self {
            PickSequence::Done(done) => Some(done),
            _ => None,
        }
    }

    /// Drops a half-finished pick, keeping a completed one.
    pub fn discard_pending(&mut self) {
        if self.is_awaiting_second() {
            *self = PickSequence::Idle;
        }
    }
}

/// The multi-step operation that currently owns key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingToken {
    ZoomBox,
    EquivalentWidth,
    GaussianFit,
    RedshiftMark,
    Smooth,
}

impl fmt::Display for BlockingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockingToken::ZoomBox => "zoom box",
            BlockingToken::EquivalentWidth => "EW measurement",
            BlockingToken::GaussianFit => "Gaussian fit",
            BlockingToken::RedshiftMark => "redshift marking",
            BlockingToken::Smooth => "smoothing",
        };
        write!(f, "{name}")
    }
}

/// Everything the plot and the values table show, shared by all key handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotState {
    pub view: ViewBox,
    pub redshift: f64,

    pub zoom: PickSequence<[f64; 2], ViewBox>,
    pub continuum: PickSequence<[f64; 2], Continuum>,
    pub gauss_window: PickSequence<f64, [f64; 2]>,

    pub ew: Value,
    pub flux: Value,
    pub gauss_center: Value,
    pub gauss_model: Option<Vec<[f64; 2]>>,

    pub trim_lines: Vec<f64>,
    pub redshift_line: f64,

    pub blocking: Option<BlockingToken>,
    pub text_entry: Option<TextEntry>,
}

impl Default for PlotState {
    fn default() -> Self {
        Self {
            view: DEFAULT_VIEW,
            redshift: 0.0,
            zoom: PickSequence::Idle,
            continuum: PickSequence::Idle,
            gauss_window: PickSequence::Idle,
            ew: Value::UNDEFINED,
            flux: Value::UNDEFINED,
            gauss_center: Value::UNDEFINED,
            gauss_model: None,
            trim_lines: Vec::new(),
            redshift_line: f64::NAN,
            blocking: None,
            text_entry: None,
        }
    }
}

impl PlotState {
    /// True when `token` may act: nothing is in flight, or `token` itself is.
    pub fn may_proceed(&self, token: BlockingToken) -> bool {
        self.blocking.is_none_or(|current| current == token)
    }

    pub fn in_text_entry(&self) -> bool {
        self.text_entry.is_some()
    }

    /// Index of the trim line nearest `x`, the first one on ties.
    pub fn nearest_trim_line(&self, x: f64) -> Option<usize> {
        self.trim_lines
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &line)| {
                let distance = (line - x).abs();
                match best {
                    Some((_, best_distance)) if best_distance <= distance => best,
                    _ => Some((i, distance)),
                }
            })
            .map(|(i, _)| i)
    }

    /// Observed wavelength to rest wavelength at the global redshift.
    pub fn rest_wavelength(&self, observed: f64) -> f64 {
        observed / (1.0 + self.redshift)
    }

    pub fn observed_wavelength(&self, rest: f64) -> f64 {
        rest * (1.0 + self.redshift)
    }
}

/// Orders two corners so that `x0 <= x1` and `y0 <= y1`.
pub fn canonical_box(a: [f64; 2], b: [f64; 2]) -> ViewBox {
    [a[0].min(b[0]), a[1].min(b[1]), a[0].max(b[0]), a[1].max(b[1])]
}
