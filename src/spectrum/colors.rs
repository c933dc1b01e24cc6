#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub const LIGHT_BLUE: Rgb = Rgb::new(173, 216, 230);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    /// Parses the color forms found in line list files: `#rrggbb`, the one-letter base
    /// colors (`r`, `k`, ...), cycle entries `C0`-`C9`, `tab:` names, and plain names.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            if hex.len() != 6 {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?));
        }

        if let Some(index) = text.strip_prefix('C').and_then(|i| i.parse::<usize>().ok()) {
            return DEFAULT_CYCLE.get(index).copied();
        }

        if let Some(name) = text.strip_prefix("tab:") {
            return TABLEAU_NAMES
                .iter()
                .position(|tab| tab.eq_ignore_ascii_case(name))
                .map(|i| DEFAULT_CYCLE[i])
                .or_else(|| name.eq_ignore_ascii_case("grey").then_some(DEFAULT_CYCLE[7]));
        }

        if let Some(&(_, rgb)) = BASE_COLORS.iter().find(|(letter, _)| *letter == text) {
            return Some(rgb);
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(text))
            .map(|&(_, rgb)| rgb)
    }
}

/// Ten-color default cycle (tab10).
pub const DEFAULT_CYCLE: [Rgb; 10] = [
    Rgb::new(31, 119, 180),
    Rgb::new(255, 127, 14),
    Rgb::new(44, 160, 44),
    Rgb::new(214, 39, 40),
    Rgb::new(148, 103, 189),
    Rgb::new(140, 86, 75),
    Rgb::new(227, 119, 194),
    Rgb::new(127, 127, 127),
    Rgb::new(188, 189, 34),
    Rgb::new(23, 190, 207),
];

const TABLEAU_NAMES: [&str; 10] = [
    "blue", "orange", "green", "red", "purple", "brown", "pink", "gray", "olive", "cyan",
];

const BASE_COLORS: &[(&str, Rgb)] = &[
    ("b", Rgb::new(0, 0, 255)),
    ("g", Rgb::new(0, 128, 0)),
    ("r", Rgb::RED),
    ("c", Rgb::new(0, 191, 191)),
    ("m", Rgb::new(191, 0, 191)),
    ("y", Rgb::new(191, 191, 0)),
    ("k", Rgb::new(0, 0, 0)),
    ("w", Rgb::new(255, 255, 255)),
];

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("gray", Rgb::new(128, 128, 128)),
    ("grey", Rgb::new(128, 128, 128)),
    ("red", Rgb::RED),
    ("darkred", Rgb::new(139, 0, 0)),
    ("orange", Rgb::new(255, 165, 0)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("gold", Rgb::new(255, 215, 0)),
    ("green", Rgb::new(0, 128, 0)),
    ("lightgreen", Rgb::new(144, 238, 144)),
    ("blue", Rgb::new(0, 0, 255)),
    ("lightblue", Rgb::LIGHT_BLUE),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("purple", Rgb::new(128, 0, 128)),
    ("brown", Rgb::new(165, 42, 42)),
    ("pink", Rgb::new(255, 192, 203)),
];
