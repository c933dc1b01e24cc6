/// Key events the session understands, independent of the GUI toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Escape,
    Backspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ZoomBox,
    Baseline,
    ResetView,
    DeleteTrim,
    EquivalentWidth,
    ZoomInX,
    ZoomInY,
    ZoomOutX,
    ZoomOutY,
    GaussianFit,
    RedshiftMark,
    RepositionTrim,
    Smooth,
    AddTrim,
    PanRight,
    PanLeft,
    PanUp,
    PanDown,
}

impl Command {
    pub const ALL: [Command; 18] = [
        Command::ZoomBox,
        Command::Baseline,
        Command::ResetView,
        Command::DeleteTrim,
        Command::EquivalentWidth,
        Command::ZoomInX,
        Command::ZoomInY,
        Command::ZoomOutX,
        Command::ZoomOutY,
        Command::GaussianFit,
        Command::RedshiftMark,
        Command::RepositionTrim,
        Command::Smooth,
        Command::AddTrim,
        Command::PanRight,
        Command::PanLeft,
        Command::PanUp,
        Command::PanDown,
    ];

    pub fn from_key(key: char) -> Option<Self> {
        let command = match key {
            'a' => Command::ZoomBox,
            'b' => Command::Baseline,
            'c' => Command::ResetView,
            'd' => Command::DeleteTrim,
            'e' => Command::EquivalentWidth,
            'i' => Command::ZoomInX,
            'I' => Command::ZoomInY,
            'o' => Command::ZoomOutX,
            'O' => Command::ZoomOutY,
            'k' => Command::GaussianFit,
            'm' => Command::RedshiftMark,
            'r' => Command::RepositionTrim,
            's' => Command::Smooth,
            't' => Command::AddTrim,
            '+' | '=' => Command::PanRight,
            '-' => Command::PanLeft,
            '\'' => Command::PanUp,
            '/' => Command::PanDown,
            _ => return None,
        };
        Some(command)
    }

    /// Keys bound to the command, for help text.
    pub fn keys(self) -> &'static str {
        match self {
            Command::ZoomBox => "a",
            Command::Baseline => "b",
            Command::ResetView => "c",
            Command::DeleteTrim => "d",
            Command::EquivalentWidth => "e",
            Command::ZoomInX => "i",
            Command::ZoomInY => "I",
            Command::ZoomOutX => "o",
            Command::ZoomOutY => "O",
            Command::GaussianFit => "k",
            Command::RedshiftMark => "m",
            Command::RepositionTrim => "r",
            Command::Smooth => "s",
            Command::AddTrim => "t",
            Command::PanRight => "+ / =",
            Command::PanLeft => "-",
            Command::PanUp => "'",
            Command::PanDown => "/",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::ZoomBox => "zoom box, press at two opposite corners",
            Command::Baseline => "pull the nearer y limit to zero",
            Command::ResetView => "reset the view, cancelling unfinished picks",
            Command::DeleteTrim => "delete the trim line nearest the cursor",
            Command::EquivalentWidth => "EW and flux, press at the two continuum points",
            Command::ZoomInX => "zoom in on wavelength",
            Command::ZoomInY => "zoom in on flux",
            Command::ZoomOutX => "zoom out on wavelength",
            Command::ZoomOutY => "zoom out on flux",
            Command::GaussianFit => "Gaussian fit, press at the two window limits",
            Command::RedshiftMark => "mark a line, then type its rest wavelength",
            Command::RepositionTrim => "move the trim line nearest the cursor",
            Command::Smooth => "type a boxcar width to smooth every spectrum",
            Command::AddTrim => "add a trim line at the cursor",
            Command::PanRight => "move right",
            Command::PanLeft => "move left",
            Command::PanUp => "move up",
            Command::PanDown => "move down",
        }
    }

    /// Commands that act at the cursor and do nothing while it is outside the plot.
    pub fn needs_pointer(self) -> bool {
        matches!(
            self,
            Command::ZoomBox
                | Command::EquivalentWidth
                | Command::GaussianFit
                | Command::RedshiftMark
                | Command::AddTrim
                | Command::DeleteTrim
                | Command::RepositionTrim
        )
    }
}

pub fn help_text() -> String {
    let mut text = String::from("Keyboard shortcuts (cursor over the plot):\n");
    for command in Command::ALL {
        text.push_str(&format!("  {:<6} {}\n", command.keys(), command.description()));
    }
    text.push_str("\nWhile typing a value: Enter accepts, Backspace deletes, Escape cancels.\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_key_maps_back() {
        for command in Command::ALL {
            for key in command.keys().split(" / ") {
                let key = key.chars().next().expect("non-empty key");
                assert_eq!(Command::from_key(key), Some(command));
            }
        }
    }

    #[test]
    fn case_matters() {
        assert_eq!(Command::from_key('i'), Some(Command::ZoomInX));
        assert_eq!(Command::from_key('I'), Some(Command::ZoomInY));
        assert_eq!(Command::from_key('x'), None);
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_text();
        for command in Command::ALL {
            assert!(help.contains(command.description()));
        }
    }
}
