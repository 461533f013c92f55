use ratatui::style::Color;

pub const DEFAULT_THEME: &str = "nord";

#[derive(Clone, Debug)]
pub struct Theme {
    pub name: String,
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub error: Color,
}

struct ThemeDefinition {
    primary: &'static str,
    accent: &'static str,
    highlight: &'static str,
    background: &'static str,
    surface: &'static str,
    text: &'static str,
}

const THEME_PRESETS: &[(&str, ThemeDefinition)] = &[
    (
        "nord",
        ThemeDefinition {
            primary: "#5E81AC",
            accent: "#D08770",
            highlight: "#76B3C5",
            background: "#3B4252",
            surface: "#4C566A",
            text: "#ECEFF4",
        },
    ),
    (
        "classic",
        ThemeDefinition {
            primary: "#6FC6D4",
            accent: "#0F1A2B",
            highlight: "#9FE6EC",
            background: "#314A63",
            surface: "#416079",
            text: "#F2F8FF",
        },
    ),
    (
        "mist",
        ThemeDefinition {
            primary: "#66C3CF",
            accent: "#0E1828",
            highlight: "#96DFE8",
            background: "#2C4156",
            surface: "#3B5A72",
            text: "#F4FBFF",
        },
    ),
];

impl Theme {
    pub fn from_name(name: &str) -> Option<Self> {
        THEME_PRESETS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(key, def)| Theme::from_definition(key, def))
    }

    /// Falls back to the default preset for unknown names.
    pub fn resolve(name: &str) -> Self {
        Theme::from_name(name).unwrap_or_else(Theme::default)
    }

    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        THEME_PRESETS.iter().map(|(key, _)| *key)
    }

    fn from_definition(name: &str, def: &ThemeDefinition) -> Self {
        Theme {
            name: name.to_string(),
            primary: color_from_hex(def.primary).unwrap_or(Color::Blue),
            accent: color_from_hex(def.accent).unwrap_or(Color::Cyan),
            highlight: color_from_hex(def.highlight).unwrap_or(Color::Cyan),
            background: color_from_hex(def.background).unwrap_or(Color::Black),
            surface: color_from_hex(def.surface).unwrap_or(Color::DarkGray),
            text: color_from_hex(def.text).unwrap_or(Color::White),
            error: Color::LightRed,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        let (key, def) = &THEME_PRESETS[0];
        Theme::from_definition(key, def)
    }
}

pub fn color_from_hex(value: &str) -> Option<Color> {
    let normalized = normalize_hex(value)?;
    let r = u8::from_str_radix(&normalized[1..3], 16).ok()?;
    let g = u8::from_str_radix(&normalized[3..5], 16).ok()?;
    let b = u8::from_str_radix(&normalized[5..7], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// `#RRGGBB` with a leading `#`, or `None` when the input has the wrong
/// length or non-ASCII characters.
pub fn normalize_hex(value: &str) -> Option<String> {
    let mut cleaned = value.trim().to_string();
    if !cleaned.starts_with('#') {
        cleaned.insert(0, '#');
    }
    if cleaned.len() != 7 || !cleaned.is_ascii() {
        return None;
    }
    Some(cleaned)
}
