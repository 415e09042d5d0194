//! Window CSS
//!
//! Generates the stylesheet the GTK frontend installs for the drop-down
//! window: background colour, pane separators and a slim scrollbar.

use std::fmt;
use std::str::FromStr;

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb` or a basic color name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::from_hex(hex);
        }
        match s.to_ascii_lowercase().as_str() {
            "black" => Some(Rgb::new(0, 0, 0)),
            "white" => Some(Rgb::new(255, 255, 255)),
            "red" => Some(Rgb::new(255, 0, 0)),
            "green" => Some(Rgb::new(0, 128, 0)),
            "blue" => Some(Rgb::new(0, 0, 255)),
            "gray" | "grey" => Some(Rgb::new(128, 128, 128)),
            _ => None,
        }
    }

    fn from_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Rgb::new(digit(0)?, digit(1)?, digit(2)?))
            }
            6 => {
                let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Rgb::new(pair(0)?, pair(2)?, pair(4)?))
            }
            _ => None,
        }
    }

    /// Lighten or darken toward white/black by `amount` in 0.0..=1.0
    pub fn shade(self, amount: f64, lighten: bool) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let mix = |c: u8| {
            let c = c as f64;
            let target = if lighten { 255.0 } else { 0.0 };
            (c + (target - c) * amount).round() as u8
        };
        Rgb::new(mix(self.r), mix(self.g), mix(self.b))
    }

    /// Perceived brightness in 0..=255
    pub fn luminance(self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }
}

impl FromStr for Rgb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s).ok_or(())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// CSS for the drop-down window. An unparseable background falls back to
/// black.
pub fn window_css(background: &str, separator_size: u32) -> String {
    let bg = Rgb::parse(background).unwrap_or_else(|| {
        log::warn!("Invalid background color '{}', using black", background);
        Rgb::BLACK
    });
    let separator = bg.shade(0.25, bg.luminance() < 128);

    format!(
        r#"
        window.dropterm {{
            background-color: {bg};
        }}
        window.dropterm.bordered {{
            border: 1px solid {separator};
        }}
        window.dropterm paned > separator {{
            min-width: {size}px;
            min-height: {size}px;
            background-color: {separator};
            background-image: none;
        }}
        window.dropterm scrollbar slider {{
            min-width: 4px;
            min-height: 4px;
        }}
        .dropterm-tab-bar {{
            padding: 0 2px;
        }}
        .dropterm-tab-bar button {{
            padding: 2px 8px;
            border-radius: 0;
        }}
        .dropterm-tab-bar button.active {{
            font-weight: bold;
        }}
        .dropterm-tab-bar button.new-tab-button {{
            padding: 2px 6px;
        }}
        "#,
        bg = bg,
        separator = separator,
        size = separator_size,
    )
}
