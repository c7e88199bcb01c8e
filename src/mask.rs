//! Text masks and the rasterizer that produces them.
//!
//! A [`TextMask`] is a `W x H` grid of intensities in `[0, 1]`, congruent to
//! the concentration field. The [`TextRasterizer`] draws a string into it:
//! lines are split on `\n`, each line is centered horizontally, the block is
//! centered vertically, and the whole layout is uniformly shrunk (never
//! grown) to fit inside 90% of the grid in both directions.
//!
//! Rasterization maps every mask pixel back into text space and counts how
//! many of its subsamples land on an inked glyph cell, so glyph edges get
//! fractional coverage. Nothing is ever drawn outside the grid.

use rayon::prelude::*;

use crate::error::SimulationError;
use crate::font::{
    BitmapFont, FontFamily, GlyphSource, GlyphStyle, CELLS_PER_EM, GLYPH_COLUMNS, GLYPH_ROWS,
};

/// Fraction of the grid the laid-out text may occupy in each direction.
pub const LAYOUT_FILL: f32 = 0.9;
/// Line spacing as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 0.85;
/// Subsamples per pixel side for smooth families.
pub const SUPERSAMPLE: usize = 3;

/// Text-related settings that shape the mask.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_family: FontFamily,
    /// Font size in mask pixels.
    pub font_size: f32,
    /// Uppercase the text before drawing.
    pub use_caps: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Inter,
            font_size: 45.0,
            use_caps: true,
        }
    }
}

/// Per-cell injection intensities.
#[derive(Clone, Debug)]
pub struct TextMask {
    width: usize,
    height: usize,
    data: Vec<f32>,
    revision: u64,
}

impl TextMask {
    /// Allocate an all-zero mask.
    pub fn new(width: usize, height: usize) -> Result<Self, SimulationError> {
        if width == 0 || height == 0 {
            return Err(SimulationError::InvalidDimensions { width, height });
        }
        let cells = width
            .checked_mul(height)
            .ok_or(SimulationError::InvalidDimensions { width, height })?;
        let mut data = Vec::new();
        data.try_reserve_exact(cells)
            .map_err(|_| SimulationError::Allocation { cells })?;
        data.resize(cells, 0.0);
        Ok(Self {
            width,
            height,
            data,
            revision: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major intensities.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Set one intensity (clamped to `[0, 1]`).
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        assert!(x < self.width && y < self.height, "mask ({}, {}) out of bounds", x, y);
        self.data[y * self.width + x] = value.clamp(0.0, 1.0);
        self.revision += 1;
    }

    /// Zero every intensity.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.revision += 1;
    }

    /// Incremented on every change. Consumers that mirror the mask (the GPU
    /// buffer) compare revisions to decide whether to re-upload.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when no cell would inject.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// Sum of all intensities.
    pub fn coverage(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of non-zero cells.
    pub fn bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (i, &v) in self.data.iter().enumerate() {
            if v > 0.0 {
                let (x, y) = (i % self.width, i / self.width);
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }
}

/// Where each line of a string lands, in unscaled text space.
///
/// Text space is centered on the grid center; `scale` maps it to pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<Vec<char>>,
    /// Advance width of each line, in unscaled pixels. Used for fitting.
    pub line_widths: Vec<f32>,
    /// Inked width of each line: the advance width without the spacing
    /// after the last glyph. Used for centering.
    pub ink_widths: Vec<f32>,
    pub line_height: f32,
    /// Size of one glyph cell, in unscaled pixels.
    pub unit: f32,
    /// Uniform shrink factor, `<= 1`.
    pub scale: f32,
}

impl TextLayout {
    /// Lay out `text` for a `width x height` grid.
    ///
    /// `text` is used as given; case conversion happens before this.
    pub fn compute<G: GlyphSource + ?Sized>(
        text: &str,
        font_size: f32,
        glyphs: &G,
        width: usize,
        height: usize,
    ) -> Self {
        let unit = font_size / CELLS_PER_EM;
        let lines: Vec<Vec<char>> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).chars().collect())
            .collect();
        let line_widths: Vec<f32> = lines
            .iter()
            .map(|line| line.iter().map(|&c| glyphs.advance(c)).sum::<f32>() * unit)
            .collect();
        let ink_widths: Vec<f32> = lines
            .iter()
            .map(|line| match line.split_last() {
                Some((_, rest)) => {
                    let leading: f32 = rest.iter().map(|&c| glyphs.advance(c)).sum();
                    (leading + GLYPH_COLUMNS as f32) * unit
                }
                None => 0.0,
            })
            .collect();
        let line_height = font_size * LINE_HEIGHT_FACTOR;

        let max_width = width as f32 * LAYOUT_FILL;
        let max_height = height as f32 * LAYOUT_FILL;
        let widest = line_widths.iter().copied().fold(0.0f32, f32::max);

        let mut scale = 1.0f32;
        if widest > max_width {
            scale = max_width / widest;
        }
        let block_height = lines.len() as f32 * line_height;
        if block_height * scale > max_height {
            scale = max_height / block_height;
        }

        Self {
            lines,
            line_widths,
            ink_widths,
            line_height,
            unit,
            scale,
        }
    }

    /// Vertical center of line `i` relative to the block center.
    pub fn line_center(&self, i: usize) -> f32 {
        (i as f32 - (self.lines.len() as f32 - 1.0) / 2.0) * self.line_height
    }

    /// Whether the text-space point `(tx, ty)` is inked.
    fn is_inked<G: GlyphSource + ?Sized>(
        &self,
        glyphs: &G,
        style: &GlyphStyle,
        tx: f32,
        ty: f32,
    ) -> bool {
        let n = self.lines.len();
        let first = self.line_center(0);
        let line = ((ty - first) / self.line_height).round();
        if line < 0.0 || line >= n as f32 {
            return false;
        }
        let line = line as usize;
        let chars = &self.lines[line];
        if chars.is_empty() {
            return false;
        }

        // Glyph box is centered on the line center
        let gy = (ty - self.line_center(line)) / self.unit + GLYPH_ROWS as f32 / 2.0;
        if !(-1.0..GLYPH_ROWS as f32 + 1.0).contains(&gy) {
            return false;
        }
        let mut gx = (tx + self.ink_widths[line] / 2.0) / self.unit;
        gx -= style.slant * (GLYPH_ROWS as f32 / 2.0 - gy);

        let inset = style.weight.inset();
        let mut origin = 0.0f32;
        for &c in chars {
            let advance = glyphs.advance(c);
            let local = gx - origin;
            if local >= -1.0
                && local < advance + 1.0
                && glyph_covers(glyphs, c, local, gy, inset)
            {
                return true;
            }
            origin += advance;
            if origin > gx + 1.0 {
                break;
            }
        }
        false
    }
}

/// Whether the glyph for `c` covers the glyph-space point `(u, v)`.
///
/// Each inked cell is a box inset by `inset` on all sides; negative insets
/// let boxes overlap their neighbors.
fn glyph_covers<G: GlyphSource + ?Sized>(glyphs: &G, c: char, u: f32, v: f32, inset: f32) -> bool {
    let glyph = glyphs.glyph(c);
    let col = u.floor() as i32;
    let row = v.floor() as i32;
    for r in row - 1..=row + 1 {
        for k in col - 1..=col + 1 {
            if !glyph.is_set(k, r) {
                continue;
            }
            let (x0, y0) = (k as f32 + inset, r as f32 + inset);
            let (x1, y1) = (k as f32 + 1.0 - inset, r as f32 + 1.0 - inset);
            if u >= x0 && u < x1 && v >= y0 && v < y1 {
                return true;
            }
        }
    }
    false
}

/// Draws text into a [`TextMask`].
///
/// Remembers the last text and style it drew so [`TextRasterizer::update`]
/// only redraws when something that affects the mask changed.
#[derive(Debug)]
pub struct TextRasterizer<G: GlyphSource = BitmapFont> {
    glyphs: G,
    last: Option<(String, TextStyle)>,
}

impl TextRasterizer<BitmapFont> {
    pub fn new() -> Self {
        Self::with_glyphs(BitmapFont)
    }
}

impl Default for TextRasterizer<BitmapFont> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GlyphSource> TextRasterizer<G> {
    pub fn with_glyphs(glyphs: G) -> Self {
        Self { glyphs, last: None }
    }

    pub fn glyphs(&self) -> &G {
        &self.glyphs
    }

    /// Redraw `mask` if `text` or `style` differ from the last draw.
    ///
    /// Returns true if the mask was regenerated.
    pub fn update(&mut self, text: &str, style: &TextStyle, mask: &mut TextMask) -> bool {
        let unchanged = matches!(&self.last, Some((t, s)) if t == text && s == style);
        if unchanged {
            return false;
        }
        self.rasterize(text, style, mask);
        self.last = Some((text.to_string(), style.clone()));
        true
    }

    /// Forget the last draw so the next [`update`](Self::update) redraws.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Draw `text` into `mask`, replacing its contents.
    pub fn rasterize(&self, text: &str, style: &TextStyle, mask: &mut TextMask) {
        let text = if style.use_caps {
            text.to_uppercase()
        } else {
            text.to_string()
        };

        mask.data.fill(0.0);
        mask.revision += 1;
        if text.chars().all(char::is_whitespace) {
            return;
        }

        let (width, height) = (mask.width, mask.height);
        let layout = TextLayout::compute(&text, style.font_size, &self.glyphs, width, height);
        let glyph_style = style.font_family.glyph_style();
        let samples = if glyph_style.pixelated { 1 } else { SUPERSAMPLE };
        let total = (samples * samples) as f32;
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let glyphs = &self.glyphs;

        mask.data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let mut hits = 0usize;
                for sy in 0..samples {
                    for sx in 0..samples {
                        let px = x as f32 + (sx as f32 + 0.5) / samples as f32;
                        let py = y as f32 + (sy as f32 + 0.5) / samples as f32;
                        let tx = (px - cx) / layout.scale;
                        let ty = (py - cy) / layout.scale;
                        if layout.is_inked(glyphs, &glyph_style, tx, ty) {
                            hits += 1;
                        }
                    }
                }
                *out = hits as f32 / total;
            }
        });
    }
}
