//! Application configuration and presets.
//!
//! [`AppConfig`] holds everything a user can tune: reaction rates, surface
//! colors, font settings and steps per frame. It loads from JSON with
//! camelCase keys; any missing key takes its default.
//!
//! ```ignore
//! let config = AppConfig::load("settings.json")?
//!     .with_preset(Preset::by_name("mitosis").unwrap())
//!     .with_font_size(80.0);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::font::FontFamily;
use crate::mask::TextStyle;
use crate::params::SimulationParams;
use crate::surface::SurfaceStyle;

/// Allowed font size range, in mask pixels.
pub const FONT_SIZE_MIN: f32 = 20.0;
pub const FONT_SIZE_MAX: f32 = 300.0;
/// Font size change per PageUp/PageDown.
pub const FONT_SIZE_STEP: f32 = 5.0;

/// A named feed/kill pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub feed: f32,
    pub kill: f32,
}

pub const PRESETS: [Preset; 6] = [
    Preset::new("Coral", 0.0545, 0.062),
    Preset::new("Mitosis", 0.0367, 0.0644),
    Preset::new("Mazes", 0.029, 0.057),
    Preset::new("Chaos", 0.082, 0.06),
    Preset::new("Worms", 0.046, 0.063),
    Preset::new("Spots", 0.025, 0.06),
];

impl Preset {
    pub const fn new(name: &'static str, feed: f32, kill: f32) -> Self {
        Self { name, feed, kill }
    }

    /// Look up a preset by name, ignoring case.
    pub fn by_name(name: &str) -> Option<&'static Preset> {
        PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Index of the preset whose feed/kill equal the given pair exactly.
    pub fn index_of(feed: f32, kill: f32) -> Option<usize> {
        PRESETS.iter().position(|p| p.feed == feed && p.kill == kill)
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::by_name(s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

/// An RGB color written as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub Vec3);

impl HexColor {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self(Vec3::new(r, g, b))
    }

    /// Parse `#rrggbb` (the `#` is optional).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| invalid())
        };
        Ok(Self(Vec3::new(channel(0)?, channel(2)?, channel(4)?)))
    }

    pub fn to_vec3(self) -> Vec3 {
        self.0
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        let c = (self.0.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        format!("#{:02x}{:02x}{:02x}", c.x as u8, c.y as u8, c.z as u8)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for HexColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HexColor::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HexColor::parse(&s)
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        c.to_hex()
    }
}

/// User-facing settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub feed: f32,
    pub kill: f32,
    pub displacement_scale: f32,
    pub color1: HexColor,
    pub color2: HexColor,
    pub background_color: HexColor,
    pub font_family: FontFamily,
    pub font_size: f32,
    pub use_caps: bool,
    pub iterations_per_frame: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let coral = PRESETS[0];
        Self {
            feed: coral.feed,
            kill: coral.kill,
            displacement_scale: 0.6,
            color1: HexColor::rgb(0.0, 195.0 / 255.0, 1.0),
            color2: HexColor::rgb(1.0, 0.0, 85.0 / 255.0),
            background_color: HexColor::rgb(5.0 / 255.0, 5.0 / 255.0, 5.0 / 255.0),
            font_family: FontFamily::Inter,
            font_size: 45.0,
            use_caps: true,
            iterations_per_frame: 4,
        }
    }
}

impl AppConfig {
    /// Parse a JSON config; missing keys take defaults, values are clamped.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply the same clamps as the builder methods.
    pub fn normalized(self) -> Self {
        let font_size = self.font_size;
        let iterations = self.iterations_per_frame;
        let displacement = self.displacement_scale;
        self.with_font_size(font_size)
            .with_iterations(iterations)
            .with_displacement_scale(displacement)
    }

    /// Take feed and kill from a preset; nothing else changes.
    pub fn with_preset(mut self, preset: &Preset) -> Self {
        self.feed = preset.feed;
        self.kill = preset.kill;
        self
    }

    pub fn with_feed_kill(mut self, feed: f32, kill: f32) -> Self {
        self.feed = feed;
        self.kill = kill;
        self
    }

    /// Set the surface height scale (at least 0).
    pub fn with_displacement_scale(mut self, scale: f32) -> Self {
        self.displacement_scale = if scale.is_nan() { 0.0 } else { scale.max(0.0) };
        self
    }

    pub fn with_colors(mut self, color1: HexColor, color2: HexColor) -> Self {
        self.color1 = color1;
        self.color2 = color2;
        self
    }

    pub fn with_background(mut self, color: HexColor) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_font_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self
    }

    /// Set the font size, clamped to 20..=300.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = if size.is_nan() {
            FONT_SIZE_MIN
        } else {
            size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
        };
        self
    }

    pub fn with_caps(mut self, use_caps: bool) -> Self {
        self.use_caps = use_caps;
        self
    }

    /// Set cycles per frame (at least 1).
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations_per_frame = iterations.max(1);
        self
    }

    /// Name of the preset matching the current feed/kill, if any.
    pub fn preset_name(&self) -> Option<&'static str> {
        Preset::index_of(self.feed, self.kill).map(|i| PRESETS[i].name)
    }

    /// The preset after the current one, or the first if feed/kill are custom.
    pub fn next_preset(&self) -> &'static Preset {
        match Preset::index_of(self.feed, self.kill) {
            Some(i) => &PRESETS[(i + 1) % PRESETS.len()],
            None => &PRESETS[0],
        }
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams::default()
            .with_feed_kill(self.feed, self.kill)
            .with_iterations(self.iterations_per_frame)
    }

    pub fn surface_style(&self) -> SurfaceStyle {
        SurfaceStyle {
            displacement_scale: self.displacement_scale,
            color1: self.color1.to_vec3(),
            color2: self.color2.to_vec3(),
        }
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_family: self.font_family,
            font_size: self.font_size,
            use_caps: self.use_caps,
        }
    }
}
