mod app;
mod plot;
mod tables;

pub use app::XtrimApp;

use crate::spectrum::Rgb;

impl From<Rgb> for egui::Color32 {
    fn from(rgb: Rgb) -> Self {
        egui::Color32::from_rgb(rgb.r, rgb.g, rgb.b)
    }
}
