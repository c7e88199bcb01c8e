//! Built-in bitmap typeface and font family styles.
//!
//! The rasterizer draws text with a 5x7 bitmap face covering printable
//! ASCII. Each configured [`FontFamily`] maps onto a [`GlyphStyle`] (stroke
//! weight, slant, sampling) applied to that face, so switching families
//! visibly changes the seed shape without loading any font files.
//!
//! Glyph rows are stored top to bottom; within a row, bit 4 is the leftmost
//! column.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Glyph width in cells.
pub const GLYPH_COLUMNS: usize = 5;
/// Glyph height in cells.
pub const GLYPH_ROWS: usize = 7;
/// Horizontal advance per character, in cells (glyph plus one cell of spacing).
pub const GLYPH_ADVANCE: f32 = 6.0;
/// Number of glyph cells per font-size unit: a cell is `font_size / 10` pixels.
pub const CELLS_PER_EM: f32 = 10.0;

/// A single 5x7 glyph bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    rows: [u8; GLYPH_ROWS],
}

impl Glyph {
    /// Create a glyph from its seven row bitmasks.
    pub const fn from_rows(rows: [u8; GLYPH_ROWS]) -> Self {
        Self { rows }
    }

    /// Whether the cell at `(column, row)` is inked.
    ///
    /// Out-of-range cells are blank.
    #[inline]
    pub fn is_set(&self, column: i32, row: i32) -> bool {
        if column < 0 || row < 0 || column >= GLYPH_COLUMNS as i32 || row >= GLYPH_ROWS as i32 {
            return false;
        }
        (self.rows[row as usize] >> (GLYPH_COLUMNS as i32 - 1 - column)) & 1 == 1
    }

    /// Whether the glyph has no inked cells.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|&r| r == 0)
    }

    /// Number of inked cells.
    pub fn ink_cells(&self) -> u32 {
        self.rows.iter().map(|r| (r & 0b11111).count_ones()).sum()
    }
}

/// Source of glyph bitmaps for the text rasterizer.
pub trait GlyphSource: Send + Sync {
    /// Glyph for a character. Unsupported characters return a fallback glyph.
    fn glyph(&self, c: char) -> Glyph;

    /// Horizontal advance for a character, in cells.
    fn advance(&self, _c: char) -> f32 {
        GLYPH_ADVANCE
    }
}

/// The built-in 5x7 bitmap face.
#[derive(Clone, Copy, Debug, Default)]
pub struct BitmapFont;

/// Outlined box drawn for characters the face does not cover.
pub const MISSING_GLYPH: Glyph =
    Glyph::from_rows([0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111]);

impl GlyphSource for BitmapFont {
    fn glyph(&self, c: char) -> Glyph {
        Glyph::from_rows(match c {
            ' ' | '\t' => [0, 0, 0, 0, 0, 0, 0],

            'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
            'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
            'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
            'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
            'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
            'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
            'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
            'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
            'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
            'J' => [0b11111, 0b00010, 0b00010, 0b00010, 0b10010, 0b10010, 0b01100],
            'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
            'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
            'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
            'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
            'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
            'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
            'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
            'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
            'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
            'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
            'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
            'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
            'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
            'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
            'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
            'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],

            'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
            'b' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b11110],
            'c' => [0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110],
            'd' => [0b00001, 0b00001, 0b01101, 0b10011, 0b10001, 0b10001, 0b01111],
            'e' => [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
            'f' => [0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01000, 0b01000],
            'g' => [0b00000, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
            'h' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
            'i' => [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
            'j' => [0b00010, 0b00000, 0b00110, 0b00010, 0b00010, 0b10010, 0b01100],
            'k' => [0b10000, 0b10000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010],
            'l' => [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
            'm' => [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
            'n' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
            'o' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
            'p' => [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000],
            'q' => [0b00000, 0b00000, 0b01101, 0b10011, 0b01111, 0b00001, 0b00001],
            'r' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
            's' => [0b00000, 0b00000, 0b01110, 0b10000, 0b01110, 0b00001, 0b11110],
            't' => [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110],
            'u' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b10011, 0b01101],
            'v' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
            'w' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10101, 0b10101, 0b01010],
            'x' => [0b00000, 0b00000, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001],
            'y' => [0b00000, 0b00000, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
            'z' => [0b00000, 0b00000, 0b11111, 0b00010, 0b00100, 0b01000, 0b11111],

            '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
            '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
            '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
            '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
            '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
            '5' => [0b11111, 0b10000, 0b10000, 0b11110, 0b00001, 0b00001, 0b11110],
            '6' => [0b01110, 0b10000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
            '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
            '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
            '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00001, 0b01110],

            '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
            '"' => [0b01010, 0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000],
            '#' => [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
            '$' => [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100],
            '%' => [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011],
            '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
            '\'' => [0b01100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
            '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
            ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
            '*' => [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000],
            '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
            ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000],
            '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
            '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
            '/' => [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000],
            ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
            ';' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000],
            '<' => [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010],
            '=' => [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],
            '>' => [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000],
            '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
            '@' => [0b01110, 0b10001, 0b00001, 0b01101, 0b10101, 0b10101, 0b01110],
            '[' => [0b01110, 0b01000, 0b01000, 0b01000, 0b01000, 0b01000, 0b01110],
            '\\' => [0b00000, 0b10000, 0b01000, 0b00100, 0b00010, 0b00001, 0b00000],
            ']' => [0b01110, 0b00010, 0b00010, 0b00010, 0b00010, 0b00010, 0b01110],
            '^' => [0b00100, 0b01010, 0b10001, 0b00000, 0b00000, 0b00000, 0b00000],
            '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
            '`' => [0b01000, 0b00100, 0b00010, 0b00000, 0b00000, 0b00000, 0b00000],
            '{' => [0b00010, 0b00100, 0b00100, 0b01000, 0b00100, 0b00100, 0b00010],
            '|' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
            '}' => [0b01000, 0b00100, 0b00100, 0b00010, 0b00100, 0b00100, 0b01000],
            '~' => [0b00000, 0b00000, 0b01000, 0b10101, 0b00010, 0b00000, 0b00000],

            _ => return MISSING_GLYPH,
        })
    }
}

/// Stroke weight applied to glyph cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weight {
    /// Cells shrink toward their centers.
    Light,
    /// Cells fill exactly.
    Regular,
    /// Cells grow past their edges and merge with neighbors.
    Heavy,
}

impl Weight {
    /// Inset of the inked box inside each cell, in cells.
    ///
    /// Negative values grow the box beyond the cell.
    pub fn inset(&self) -> f32 {
        match self {
            Weight::Light => 0.18,
            Weight::Regular => 0.0,
            Weight::Heavy => -0.22,
        }
    }
}

/// How a font family renders the built-in face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphStyle {
    pub weight: Weight,
    /// Horizontal shear in cells per cell of height (positive leans right).
    pub slant: f32,
    /// Single sample per pixel, giving hard stair-stepped edges.
    pub pixelated: bool,
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self {
            weight: Weight::Regular,
            slant: 0.0,
            pixelated: false,
        }
    }
}

/// Typeface choices offered by the configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Geist,
    Asul,
    MuseoModerno,
    UnifrakturMaguntia,
    Voltaire,
    Parisienne,
    Gaegu,
    Silkscreen,
    #[default]
    Inter,
    Orbitron,
}

impl FontFamily {
    /// Every family, in menu order.
    pub const ALL: [FontFamily; 10] = [
        FontFamily::Inter,
        FontFamily::Geist,
        FontFamily::Asul,
        FontFamily::MuseoModerno,
        FontFamily::UnifrakturMaguntia,
        FontFamily::Voltaire,
        FontFamily::Parisienne,
        FontFamily::Gaegu,
        FontFamily::Silkscreen,
        FontFamily::Orbitron,
    ];

    /// Name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Geist => "Geist",
            FontFamily::Asul => "Asul",
            FontFamily::MuseoModerno => "MuseoModerno",
            FontFamily::UnifrakturMaguntia => "UnifrakturMaguntia",
            FontFamily::Voltaire => "Voltaire",
            FontFamily::Parisienne => "Parisienne",
            FontFamily::Gaegu => "Gaegu",
            FontFamily::Silkscreen => "Silkscreen",
            FontFamily::Inter => "Inter",
            FontFamily::Orbitron => "Orbitron",
        }
    }

    /// Rendering style of the built-in face for this family.
    pub fn glyph_style(&self) -> GlyphStyle {
        match self {
            FontFamily::Inter => GlyphStyle {
                weight: Weight::Light,
                ..GlyphStyle::default()
            },
            FontFamily::Orbitron => GlyphStyle {
                weight: Weight::Heavy,
                ..GlyphStyle::default()
            },
            FontFamily::Parisienne => GlyphStyle {
                slant: 0.25,
                ..GlyphStyle::default()
            },
            FontFamily::Gaegu => GlyphStyle {
                slant: 0.1,
                ..GlyphStyle::default()
            },
            FontFamily::Silkscreen => GlyphStyle {
                pixelated: true,
                ..GlyphStyle::default()
            },
            FontFamily::Geist
            | FontFamily::Asul
            | FontFamily::MuseoModerno
            | FontFamily::UnifrakturMaguntia
            | FontFamily::Voltaire => GlyphStyle::default(),
        }
    }

    /// The family after this one in [`FontFamily::ALL`], wrapping around.
    pub fn next(&self) -> FontFamily {
        let i = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownFont(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_ascii_is_covered() {
        let font = BitmapFont;
        for c in (0x21u8..=0x7e).map(char::from) {
            let glyph = font.glyph(c);
            assert_ne!(glyph, MISSING_GLYPH, "no glyph for {:?}", c);
            assert!(!glyph.is_blank(), "blank glyph for {:?}", c);
        }
    }

    #[test]
    fn test_space_is_blank() {
        assert!(BitmapFont.glyph(' ').is_blank());
    }

    #[test]
    fn test_unknown_char_uses_missing_glyph() {
        assert_eq!(BitmapFont.glyph('\u{2603}'), MISSING_GLYPH);
        assert_eq!(BitmapFont.glyph('é'), MISSING_GLYPH);
    }

    #[test]
    fn test_glyph_bit_order() {
        // 'L' is a left column plus a full bottom row
        let l = BitmapFont.glyph('L');
        assert!(l.is_set(0, 0));
        assert!(!l.is_set(4, 0));
        assert!(l.is_set(4, 6));
        assert!(!l.is_set(5, 6));
        assert!(!l.is_set(-1, 0));
        assert_eq!(l.ink_cells(), 11);
    }

    #[test]
    fn test_weight_insets_are_ordered() {
        assert!(Weight::Light.inset() > Weight::Regular.inset());
        assert!(Weight::Regular.inset() > Weight::Heavy.inset());
        assert!(Weight::Light.inset() < 0.5);
    }

    #[test]
    fn test_font_family_parse() {
        assert_eq!("inter".parse::<FontFamily>().unwrap(), FontFamily::Inter);
        assert_eq!(" Silkscreen ".parse::<FontFamily>().unwrap(), FontFamily::Silkscreen);
        assert!(matches!(
            "Comic Sans".parse::<FontFamily>(),
            Err(ConfigError::UnknownFont(_))
        ));
    }

    #[test]
    fn test_font_family_cycle_visits_all() {
        let mut family = FontFamily::Inter;
        for _ in 0..FontFamily::ALL.len() {
            family = family.next();
        }
        assert_eq!(family, FontFamily::Inter);
    }

    #[test]
    fn test_family_styles() {
        assert_eq!(FontFamily::Inter.glyph_style().weight, Weight::Light);
        assert_eq!(FontFamily::Orbitron.glyph_style().weight, Weight::Heavy);
        assert!(FontFamily::Parisienne.glyph_style().slant > 0.0);
        assert!(FontFamily::Silkscreen.glyph_style().pixelated);
        assert_eq!(FontFamily::Geist.glyph_style(), GlyphStyle::default());
        assert_eq!(
            FontFamily::UnifrakturMaguntia.glyph_style(),
            GlyphStyle::default()
        );
        let heavy: Vec<_> = FontFamily::ALL
            .iter()
            .filter(|f| f.glyph_style().weight == Weight::Heavy)
            .collect();
        assert_eq!(heavy, vec![&FontFamily::Orbitron]);
    }

    #[test]
    fn test_font_family_serde_uses_config_names() {
        let json = serde_json::to_string(&FontFamily::MuseoModerno).unwrap();
        assert_eq!(json, "\"MuseoModerno\"");
        let parsed: FontFamily = serde_json::from_str("\"Gaegu\"").unwrap();
        assert_eq!(parsed, FontFamily::Gaegu);
    }
}
