pub mod commands;
pub mod keybinds;
pub mod plot_state;
pub mod session;
pub mod text_entry;

pub use commands::{Command, KeyInput, help_text};
pub use plot_state::{BlockingToken, PickSequence, PlotState, ViewBox};
pub use session::{Effect, OverlayLine, Session, ValueRow};
pub use text_entry::{TextEntry, TextTarget};
