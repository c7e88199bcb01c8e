//! Double-buffered Gray-Scott concentration field.
//!
//! A [`ConcentrationField`] holds two chemicals, `a` and `b`, on a `W x H`
//! grid. There are two full buffers; exactly one is current at any time. A
//! half-step reads every cell of the current buffer and writes every cell of
//! the other, then flips which one is current. No cell is ever read from the
//! buffer being written.
//!
//! # Kernel
//!
//! Each cell uses a 9-point Laplacian over its Moore neighborhood with
//! clamp-to-edge sampling:
//!
//! ```text
//! lap(x) = 0.2 * (N + S + E + W) + 0.05 * (NE + NW + SE + SW) - x
//! a' = a + dt * (lap(a)       - a*b*b + feed * (1 - a))
//! b' = b + dt * (0.5 * lap(b) + a*b*b - (kill + feed) * b)
//! ```
//!
//! Where the text mask exceeds [`INJECTION_THRESHOLD`], `b'` is blended
//! halfway toward [`INJECTION_TARGET`]. Both channels are then clamped to
//! `[0, 1]`.
//!
//! The update of a cell is a pure function of the source buffer, the mask
//! value and the parameters, so rows can be computed in any order or in
//! parallel with bit-identical results.

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

use crate::error::SimulationError;
use crate::mask::TextMask;
use crate::params::SimulationParams;

/// Weight of the four edge-adjacent neighbors.
pub const EDGE_WEIGHT: f32 = 0.2;
/// Weight of the four diagonal neighbors.
pub const CORNER_WEIGHT: f32 = 0.05;
/// Diffusion rate of `b` relative to `a`.
pub const DIFFUSION_B: f32 = 0.5;
/// Mask values above this inject `b`.
pub const INJECTION_THRESHOLD: f32 = 0.1;
/// Concentration injected cells are pulled toward.
pub const INJECTION_TARGET: f32 = 0.9;
/// Blend factor toward the injection target.
pub const INJECTION_BLEND: f32 = 0.5;

/// One cell of the field.
///
/// `#[repr(C)]` and `Pod` so a whole buffer uploads to a GPU storage buffer
/// as `array<vec2<f32>>` without conversion.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Cell {
    pub a: f32,
    pub b: f32,
}

impl Cell {
    /// Initial state: all `a`, no `b`.
    pub const EMPTY: Cell = Cell { a: 1.0, b: 0.0 };

    pub const fn new(a: f32, b: f32) -> Self {
        Self { a, b }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::EMPTY
    }
}

/// Two-chemical grid with front/back buffers.
#[derive(Clone, Debug)]
pub struct ConcentrationField {
    width: usize,
    height: usize,
    buffers: [Vec<Cell>; 2],
    current: usize,
    half_steps: u64,
}

impl ConcentrationField {
    /// Allocate a field with every cell at [`Cell::EMPTY`].
    ///
    /// Fails on zero or overflowing dimensions, or when the buffers cannot be
    /// allocated. This is the only place the field can fail; stepping is
    /// infallible.
    pub fn new(width: usize, height: usize) -> Result<Self, SimulationError> {
        let cells = cell_count(width, height)?;
        let front = alloc_cells(cells)?;
        let back = alloc_cells(cells)?;
        Ok(Self {
            width,
            height,
            buffers: [front, back],
            current: 0,
            half_steps: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells in one buffer.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always false; a field has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The settled (current) buffer, row-major.
    pub fn current(&self) -> &[Cell] {
        &self.buffers[self.current]
    }

    /// Index (0 or 1) of the current buffer.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Cell of the current buffer.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid.
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        assert!(x < self.width && y < self.height, "cell ({}, {}) out of bounds", x, y);
        self.buffers[self.current][y * self.width + x]
    }

    /// Overwrite a cell of the current buffer, clamping both channels.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        assert!(x < self.width && y < self.height, "cell ({}, {}) out of bounds", x, y);
        let i = y * self.width + x;
        self.buffers[self.current][i] = Cell::new(cell.a.clamp(0.0, 1.0), cell.b.clamp(0.0, 1.0));
    }

    /// Half-steps performed since creation.
    pub fn half_steps(&self) -> u64 {
        self.half_steps
    }

    /// Sum of `b` over the current buffer.
    pub fn total_b(&self) -> f64 {
        self.current().iter().map(|c| c.b as f64).sum()
    }

    /// Compute the non-current buffer from the current one, then flip.
    ///
    /// Rows of the destination are computed in parallel; the call returns
    /// once every row is written.
    ///
    /// # Panics
    ///
    /// Panics if the mask is not the same size as the field.
    pub fn half_step(&mut self, mask: &TextMask, params: &SimulationParams) {
        assert_eq!(
            (mask.width(), mask.height()),
            (self.width, self.height),
            "text mask does not match field dimensions"
        );

        let (front, back) = self.buffers.split_at_mut(1);
        let (src, dst) = if self.current == 0 {
            (&front[0], &mut back[0])
        } else {
            (&back[0], &mut front[0])
        };

        half_step_into(src, dst, self.width, self.height, mask.data(), params);

        self.current ^= 1;
        self.half_steps += 1;
    }
}

fn cell_count(width: usize, height: usize) -> Result<usize, SimulationError> {
    if width == 0 || height == 0 {
        return Err(SimulationError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(SimulationError::InvalidDimensions { width, height })
}

fn alloc_cells(cells: usize) -> Result<Vec<Cell>, SimulationError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(cells)
        .map_err(|_| SimulationError::Allocation { cells })?;
    buffer.resize(cells, Cell::EMPTY);
    Ok(buffer)
}

/// Compute all of `dst` from `src`, sharding rows across the rayon pool.
///
/// # Panics
///
/// Panics if `src`, `dst` or `mask` do not hold `width * height` entries.
pub fn half_step_into(
    src: &[Cell],
    dst: &mut [Cell],
    width: usize,
    height: usize,
    mask: &[f32],
    params: &SimulationParams,
) {
    let len = width * height;
    assert_eq!(src.len(), len);
    assert_eq!(dst.len(), len);
    assert_eq!(mask.len(), len);

    dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = update_cell(src, width, height, x, y, mask[y * width + x], params);
        }
    });
}

#[inline]
fn mix(x: f32, y: f32, t: f32) -> f32 {
    x * (1.0 - t) + y * t
}

/// New value of cell `(x, y)` given the source buffer.
#[inline]
pub fn update_cell(
    src: &[Cell],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    mask: f32,
    params: &SimulationParams,
) -> Cell {
    let xl = x.saturating_sub(1);
    let xr = (x + 1).min(width - 1);
    let yu = y.saturating_sub(1);
    let yd = (y + 1).min(height - 1);

    let at = |cx: usize, cy: usize| src[cy * width + cx];

    let c = at(x, y);
    let n = at(x, yu);
    let s = at(x, yd);
    let e = at(xr, y);
    let w = at(xl, y);
    let ne = at(xr, yu);
    let nw = at(xl, yu);
    let se = at(xr, yd);
    let sw = at(xl, yd);

    let lap_a =
        EDGE_WEIGHT * (n.a + s.a + e.a + w.a) + CORNER_WEIGHT * (ne.a + nw.a + se.a + sw.a) - c.a;
    let lap_b =
        EDGE_WEIGHT * (n.b + s.b + e.b + w.b) + CORNER_WEIGHT * (ne.b + nw.b + se.b + sw.b) - c.b;

    let reaction = c.a * c.b * c.b;
    let next_a = c.a + params.dt * (lap_a - reaction + params.feed * (1.0 - c.a));
    let mut next_b =
        c.b + params.dt * (DIFFUSION_B * lap_b + reaction - (params.kill + params.feed) * c.b);

    if mask > INJECTION_THRESHOLD {
        next_b = mix(next_b, INJECTION_TARGET, INJECTION_BLEND);
    }

    Cell {
        a: next_a.clamp(0.0, 1.0),
        b: next_b.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_mask(w: usize, h: usize) -> TextMask {
        TextMask::new(w, h).unwrap()
    }

    // ===== Creation Tests =====

    #[test]
    fn test_new_field_is_at_rest() {
        let field = ConcentrationField::new(8, 5).unwrap();
        assert_eq!(field.len(), 40);
        assert_eq!(field.current_index(), 0);
        assert!(field.current().iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            ConcentrationField::new(0, 10).unwrap_err(),
            SimulationError::InvalidDimensions {
                width: 0,
                height: 10
            }
        );
        assert!(ConcentrationField::new(10, 0).is_err());
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let err = ConcentrationField::new(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_huge_allocation_fails_cleanly() {
        // Fits in usize but not in memory
        let err = ConcentrationField::new(1 << 31, 1 << 28).unwrap_err();
        assert!(matches!(err, SimulationError::Allocation { .. }));
    }

    #[test]
    fn test_cell_is_pod_pair() {
        assert_eq!(std::mem::size_of::<Cell>(), 8);
        let cells = [Cell::new(0.25, 0.5)];
        let floats: &[f32] = bytemuck::cast_slice(&cells);
        assert_eq!(floats, &[0.25, 0.5]);
    }

    // ===== Kernel Tests =====

    #[test]
    fn test_rest_state_is_exact_fixed_point() {
        let src = vec![Cell::EMPTY; 9];
        let params = SimulationParams::default();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(update_cell(&src, 3, 3, x, y, 0.0, &params), Cell::EMPTY);
            }
        }
    }

    #[test]
    fn test_injection_from_rest() {
        let src = vec![Cell::EMPTY; 9];
        let params = SimulationParams::default();
        let cell = update_cell(&src, 3, 3, 1, 1, 1.0, &params);
        assert!((cell.b - 0.45).abs() < 1e-6);
        assert_eq!(cell.a, 1.0);
    }

    #[test]
    fn test_mask_at_threshold_does_not_inject() {
        let src = vec![Cell::EMPTY; 9];
        let params = SimulationParams::default();
        let cell = update_cell(&src, 3, 3, 1, 1, INJECTION_THRESHOLD, &params);
        assert_eq!(cell, Cell::EMPTY);
    }

    #[test]
    fn test_single_cell_grid_uses_itself_as_neighbors() {
        let src = vec![Cell::new(0.5, 0.5)];
        let params = SimulationParams::default().with_feed_kill(0.0, 0.0);
        let cell = update_cell(&src, 1, 1, 0, 0, 0.0, &params);
        // Laplacian of a lone cell is zero; only the reaction term remains
        let reaction = 0.5 * 0.5 * 0.5;
        assert!((cell.a - (0.5 - reaction)).abs() < 1e-6);
        assert!((cell.b - (0.5 + reaction)).abs() < 1e-6);
    }

    #[test]
    fn test_output_clamped() {
        let src = vec![Cell::new(1.0, 1.0); 9];
        let params = SimulationParams::default().with_feed_kill(-5.0, -5.0).with_dt(10.0);
        let cell = update_cell(&src, 3, 3, 1, 1, 1.0, &params);
        assert!((0.0..=1.0).contains(&cell.a));
        assert!((0.0..=1.0).contains(&cell.b));
    }

    #[test]
    fn test_diffusion_spreads_to_neighbors_only() {
        let mut src = vec![Cell::EMPTY; 25];
        src[2 * 5 + 2] = Cell::new(1.0, 1.0);
        let params = SimulationParams::default().with_feed_kill(0.0, 0.0);
        let edge = update_cell(&src, 5, 5, 2, 1, 0.0, &params);
        let corner = update_cell(&src, 5, 5, 1, 1, 0.0, &params);
        let far = update_cell(&src, 5, 5, 0, 0, 0.0, &params);
        assert!((edge.b - DIFFUSION_B * EDGE_WEIGHT).abs() < 1e-6);
        assert!((corner.b - DIFFUSION_B * CORNER_WEIGHT).abs() < 1e-6);
        assert_eq!(far.b, 0.0);
    }

    // ===== Half-step Tests =====

    #[test]
    fn test_half_step_flips_current() {
        let mut field = ConcentrationField::new(4, 4).unwrap();
        let mask = blank_mask(4, 4);
        let params = SimulationParams::default();
        field.half_step(&mask, &params);
        assert_eq!(field.current_index(), 1);
        field.half_step(&mask, &params);
        assert_eq!(field.current_index(), 0);
        assert_eq!(field.half_steps(), 2);
    }

    #[test]
    fn test_half_step_reads_only_previous_buffer() {
        // A value written during this half-step must not feed its neighbors:
        // after one half-step, only cells adjacent to the seed see any b.
        let mut field = ConcentrationField::new(7, 1).unwrap();
        field.set_cell(3, 0, Cell::new(1.0, 1.0));
        let mask = blank_mask(7, 1);
        field.half_step(&mask, &SimulationParams::default());
        assert!(field.cell(2, 0).b > 0.0);
        assert!(field.cell(4, 0).b > 0.0);
        assert_eq!(field.cell(1, 0).b, 0.0);
        assert_eq!(field.cell(5, 0).b, 0.0);
    }

    #[test]
    #[should_panic(expected = "text mask does not match")]
    fn test_mismatched_mask_panics() {
        let mut field = ConcentrationField::new(4, 4).unwrap();
        field.half_step(&blank_mask(3, 4), &SimulationParams::default());
    }

    #[test]
    fn test_set_cell_clamps() {
        let mut field = ConcentrationField::new(2, 2).unwrap();
        field.set_cell(1, 1, Cell::new(2.0, -1.0));
        assert_eq!(field.cell(1, 1), Cell::new(1.0, 0.0));
    }
}
