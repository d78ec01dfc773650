// Application settings
// Loaded from ~/.config/strata/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::Color;

const DEFAULT_LINE_COLOR: Color = Color::from_hex(0x2b83ba);
const DEFAULT_FILL_COLOR: Color = Color::from_hex(0xabdda4);
const DEFAULT_MARKER_COLOR: Color = Color::from_hex(0xd7191c);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    // Profile symbols used when a layer has none of its own
    #[serde(rename = "profile.lineColor")]
    pub profile_line_color: String,

    #[serde(rename = "profile.lineWidth")]
    pub profile_line_width: f64,

    #[serde(rename = "profile.fillColor")]
    pub profile_fill_color: String,

    #[serde(rename = "profile.fillOutlineWidth")]
    pub profile_fill_outline_width: f64,

    #[serde(rename = "profile.markerColor")]
    pub profile_marker_color: String,

    #[serde(rename = "profile.markerSize")]
    pub profile_marker_size: f64,

    // Output
    #[serde(rename = "output.indent")]
    pub output_indent: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Profile
            profile_line_color: DEFAULT_LINE_COLOR.name(),
            profile_line_width: 0.6,
            profile_fill_color: DEFAULT_FILL_COLOR.name(),
            profile_fill_outline_width: 0.26,
            profile_marker_color: DEFAULT_MARKER_COLOR.name(),
            profile_marker_size: 2.0,
            // Output
            output_indent: 2,
        }
    }
}

/// Resolved profile symbol styling, colors already parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSymbolDefaults {
    pub line_color: Color,
    pub line_width: f64,
    pub fill_color: Color,
    pub fill_outline_width: f64,
    pub marker_color: Color,
    pub marker_size: f64,
}

impl Default for ProfileSymbolDefaults {
    fn default() -> Self {
        Settings::default().profile_symbol_defaults()
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata");
        config_dir.join("settings.json")
    }

    /// Load settings from the user config dir, falling back to defaults.
    /// Writes a commented default file on first use.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load from an explicit path; any problem falls back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{} ({}); using default settings", e, path.display());
                Self::default()
            }
        }
    }

    pub fn try_load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse settings JSON. Lines starting with // are comments.
    pub fn from_json(contents: &str) -> Result<Self, SettingsError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(serde_json::from_str(&cleaned)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Profile symbol styling with unparseable colors replaced by built-ins.
    pub fn profile_symbol_defaults(&self) -> ProfileSymbolDefaults {
        ProfileSymbolDefaults {
            line_color: parse_color_setting("profile.lineColor", &self.profile_line_color, DEFAULT_LINE_COLOR),
            line_width: self.profile_line_width,
            fill_color: parse_color_setting("profile.fillColor", &self.profile_fill_color, DEFAULT_FILL_COLOR),
            fill_outline_width: self.profile_fill_outline_width,
            marker_color: parse_color_setting("profile.markerColor", &self.profile_marker_color, DEFAULT_MARKER_COLOR),
            marker_size: self.profile_marker_size,
        }
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r##"{
    // Profile symbols for layers that don't carry their own.
    // Colors: "#rrggbb", "#aarrggbb" or "r,g,b,a"
    "profile.lineColor": "#2b83ba",
    "profile.lineWidth": 0.6,
    "profile.fillColor": "#abdda4",
    "profile.fillOutlineWidth": 0.26,
    "profile.markerColor": "#d7191c",
    "profile.markerSize": 2.0,

    // Indent width for written XML (0 = single line)
    "output.indent": 2
}
"##;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }
}

fn parse_color_setting(key: &str, value: &str, fallback: Color) -> Color {
    Color::parse(value).unwrap_or_else(|| {
        log::warn!("invalid color '{}' for {}, using {}", value, key, fallback.name());
        fallback
    })
}
