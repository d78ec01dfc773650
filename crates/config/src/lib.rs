// Configuration loading

pub mod settings;

pub use settings::{ProfileSymbolDefaults, Settings, SettingsError};

use std::fmt;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::from_rgb(0, 0, 0);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert from hex u32 (0xRRGGBB)
    pub const fn from_hex(hex: u32) -> Self {
        Self::from_rgb(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Parse `#rrggbb`, `#aarrggbb`, `r,g,b` or `r,g,b,a`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.contains(',') {
            return Self::parse_components(s);
        }

        let hex = s.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            // RRGGBB
            6 => Some(Self::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
            // AARRGGBB
            8 => Some(Self::from_rgba(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
            _ => None,
        }
    }

    fn parse_components(s: &str) -> Option<Self> {
        let parts: Vec<u8> = s
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [r, g, b] => Some(Self::from_rgb(*r, *g, *b)),
            [r, g, b, a] => Some(Self::from_rgba(*r, *g, *b, *a)),
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`, alpha dropped
    pub fn name(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `r,g,b,a` form used in persisted symbol properties
    pub fn to_rgba_string(&self) -> String {
        format!("{},{},{},{}", self.r, self.g, self.b, self.a)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rgba_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(Color::parse("#ff4433"), Some(Color::from_rgb(255, 68, 51)));
        assert_eq!(Color::parse("80ff4433"), Some(Color::from_rgba(255, 68, 51, 128)));
        assert_eq!(Color::parse("255,68,51"), Some(Color::from_rgb(255, 68, 51)));
        assert_eq!(Color::parse(" 255, 68, 51, 10 "), Some(Color::from_rgba(255, 68, 51, 10)));
        assert_eq!(Color::parse("#ff44"), None);
        assert_eq!(Color::parse("256,0,0"), None);
        assert_eq!(Color::parse("#gg0000"), None);
        assert_eq!(Color::parse("#ééé"), None);
    }

    #[test]
    fn test_name_and_rgba_string() {
        let c = Color::from_hex(0xff1122).with_alpha(200);
        assert_eq!(c.name(), "#ff1122");
        assert_eq!(c.to_rgba_string(), "255,17,34,200");
        assert_eq!(Color::parse(&c.to_rgba_string()), Some(c));
    }
}
