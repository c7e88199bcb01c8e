//! Mapping from the settled field to a displaced, colored surface.
//!
//! The surface is a flat grid in the XZ plane. Each vertex samples the `b`
//! concentration bilinearly, rises by `b * displacement_scale`, and is
//! colored by [`shade`]. These CPU functions are the reference for the WGSL
//! surface shader and back the headless renderer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};

use crate::field::{Cell, ConcentrationField};

/// Mesh subdivisions per side.
pub const MESH_SUBDIVISIONS: u32 = 240;
/// Plane side length in world units.
pub const PLANE_SIZE: f32 = 10.0;
/// Weight of the white highlight on dense regions.
pub const HIGHLIGHT: f32 = 0.3;

/// Display parameters for the surface. Not part of the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceStyle {
    pub displacement_scale: f32,
    /// Color of thin regions.
    pub color1: Vec3,
    /// Color of dense regions.
    pub color2: Vec3,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            displacement_scale: 0.6,
            color1: Vec3::new(0.0, 195.0 / 255.0, 1.0),
            color2: Vec3::new(1.0, 0.0, 85.0 / 255.0),
        }
    }
}

/// GLSL/WGSL `smoothstep`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Surface color for a concentration of `b`.
///
/// Below 0.05 the surface is black; it ramps into `color1`, blends toward
/// `color2` as `b` approaches 0.5, and picks up a white highlight above 0.4.
pub fn shade(b: f32, style: &SurfaceStyle) -> Vec3 {
    let mask = smoothstep(0.05, 0.2, b);
    let mut color = Vec3::ZERO.lerp(style.color1, mask);
    color = color.lerp(style.color2, smoothstep(0.2, 0.5, b));
    color *= mask;
    color + Vec3::splat(HIGHLIGHT * smoothstep(0.4, 0.6, b))
}

/// Bilinear sample of `b` at texture coordinates `(u, v)`.
///
/// Texel centers sit at `(i + 0.5) / width`; coordinates outside the grid
/// clamp to the edge, like a linear-filtered clamp-to-edge texture.
pub fn sample_b(cells: &[Cell], width: usize, height: usize, u: f32, v: f32) -> f32 {
    let px = (u * width as f32 - 0.5).clamp(0.0, (width - 1) as f32);
    let py = (v * height as f32 - 0.5).clamp(0.0, (height - 1) as f32);
    let x0 = px.floor() as usize;
    let y0 = py.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = px - x0 as f32;
    let fy = py - y0 as f32;

    let b = |x: usize, y: usize| cells[y * width + x].b;
    let top = b(x0, y0) + (b(x1, y0) - b(x0, y0)) * fx;
    let bottom = b(x0, y1) + (b(x1, y1) - b(x0, y1)) * fx;
    top + (bottom - top) * fy
}

/// Vertex of the flat surface grid, as uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl SurfaceVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SurfaceVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A displaced, shaded vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacedVertex {
    pub position: Vec3,
    pub color: Vec3,
}

/// Flat `n x n` quad grid centered on the origin.
///
/// `uv = (0, 0)` is at `(-size/2, -size/2)` in XZ, so field row 0 lies on
/// the far (negative Z) edge.
#[derive(Clone, Debug)]
pub struct SurfaceGrid {
    subdivisions: u32,
    size: f32,
    vertices: Vec<SurfaceVertex>,
    indices: Vec<u32>,
}

impl SurfaceGrid {
    pub fn new(subdivisions: u32, size: f32) -> Self {
        let n = subdivisions.max(1);
        let stride = n + 1;
        let mut vertices = Vec::with_capacity((stride * stride) as usize);
        for j in 0..=n {
            for i in 0..=n {
                let uv = Vec2::new(i as f32 / n as f32, j as f32 / n as f32);
                let xz = (uv - Vec2::splat(0.5)) * size;
                vertices.push(SurfaceVertex {
                    position: [xz.x, 0.0, xz.y],
                    uv: uv.to_array(),
                });
            }
        }

        let mut indices = Vec::with_capacity((n * n * 6) as usize);
        for j in 0..n {
            for i in 0..n {
                let tl = j * stride + i;
                let tr = tl + 1;
                let bl = tl + stride;
                let br = bl + 1;
                // Counter-clockwise seen from +Y
                indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        Self {
            subdivisions: n,
            size,
            vertices,
            indices,
        }
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn vertices(&self) -> &[SurfaceVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Displace and shade every vertex from the field's current buffer.
    pub fn displaced(
        &self,
        field: &ConcentrationField,
        style: &SurfaceStyle,
    ) -> Vec<DisplacedVertex> {
        let (w, h) = (field.width(), field.height());
        let cells = field.current();
        self.vertices
            .iter()
            .map(|v| {
                let b = sample_b(cells, w, h, v.uv[0], v.uv[1]);
                let [x, y, z] = v.position;
                DisplacedVertex {
                    position: Vec3::new(x, y + b * style.displacement_scale, z),
                    color: shade(b, style),
                }
            })
            .collect()
    }
}

impl Default for SurfaceGrid {
    fn default() -> Self {
        Self::new(MESH_SUBDIVISIONS, PLANE_SIZE)
    }
}

/// Render a top-down `size x size` view of the shaded field.
///
/// Image row 0 is field row 0, so text reads upright.
pub fn render_image(field: &ConcentrationField, style: &SurfaceStyle, size: u32) -> RgbaImage {
    let size = size.max(1);
    let (w, h) = (field.width(), field.height());
    let cells = field.current();
    RgbaImage::from_fn(size, size, |px, py| {
        let u = (px as f32 + 0.5) / size as f32;
        let v = (py as f32 + 0.5) / size as f32;
        let color = shade(sample_b(cells, w, h, u, v), style).clamp(Vec3::ZERO, Vec3::ONE);
        let rgb = (color * 255.0).round();
        Rgba([rgb.x as u8, rgb.y as u8, rgb.z as u8, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> SurfaceStyle {
        SurfaceStyle::default()
    }

    // ===== Shading Tests =====

    #[test]
    fn test_shade_black_below_threshold() {
        assert_eq!(shade(0.0, &style()), Vec3::ZERO);
        assert_eq!(shade(0.05, &style()), Vec3::ZERO);
    }

    #[test]
    fn test_shade_pure_color1_at_low_ramp_top() {
        let c = shade(0.2, &style());
        assert!((c - style().color1).length() < 1e-6);
    }

    #[test]
    fn test_shade_dense_is_color2_plus_highlight() {
        let c = shade(0.8, &style());
        let expected = style().color2 + Vec3::splat(HIGHLIGHT);
        assert!((c - expected).length() < 1e-6);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.2, 0.5, 0.1), 0.0);
        assert_eq!(smoothstep(0.2, 0.5, 0.6), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    // ===== Sampling Tests =====

    #[test]
    fn test_sample_at_texel_center_is_exact() {
        let cells = vec![Cell::new(1.0, 0.0), Cell::new(1.0, 1.0)];
        assert_eq!(sample_b(&cells, 2, 1, 0.25, 0.5), 0.0);
        assert_eq!(sample_b(&cells, 2, 1, 0.75, 0.5), 1.0);
        assert!((sample_b(&cells, 2, 1, 0.5, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_clamps_outside() {
        let cells = vec![Cell::new(1.0, 0.2), Cell::new(1.0, 0.8)];
        assert_eq!(sample_b(&cells, 2, 1, 0.0, 0.0), 0.2);
        assert_eq!(sample_b(&cells, 2, 1, 1.0, 1.0), 0.8);
        assert_eq!(sample_b(&cells, 2, 1, -3.0, 9.0), 0.2);
    }

    // ===== Grid Tests =====

    #[test]
    fn test_grid_counts() {
        let grid = SurfaceGrid::new(4, 10.0);
        assert_eq!(grid.vertices().len(), 25);
        assert_eq!(grid.indices().len(), 4 * 4 * 6);
        assert!(grid.indices().iter().all(|&i| (i as usize) < grid.vertices().len()));
    }

    #[test]
    fn test_grid_orientation() {
        let grid = SurfaceGrid::new(2, 10.0);
        let first = grid.vertices()[0];
        let last = grid.vertices()[grid.vertices().len() - 1];
        assert_eq!(first.position, [-5.0, 0.0, -5.0]);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.position, [5.0, 0.0, 5.0]);
        assert_eq!(last.uv, [1.0, 1.0]);
    }

    #[test]
    fn test_displaced_follows_b() {
        let mut field = ConcentrationField::new(2, 2).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                field.set_cell(x, y, Cell::new(0.5, 0.5));
            }
        }
        let grid = SurfaceGrid::new(3, 10.0);
        let s = SurfaceStyle {
            displacement_scale: 2.0,
            ..style()
        };
        for v in grid.displaced(&field, &s) {
            assert!((v.position.y - 1.0).abs() < 1e-6);
            assert_eq!(v.color, shade(0.5, &s));
        }
    }

    #[test]
    fn test_render_image_at_rest_is_black() {
        let field = ConcentrationField::new(8, 8).unwrap();
        let img = render_image(&field, &style(), 16);
        assert_eq!(img.dimensions(), (16, 16));
        assert!(img.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_render_image_upright() {
        let mut field = ConcentrationField::new(4, 4).unwrap();
        for x in 0..4 {
            field.set_cell(x, 0, Cell::new(0.0, 1.0));
        }
        let img = render_image(&field, &style(), 8);
        assert_ne!(*img.get_pixel(4, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(4, 7), Rgba([0, 0, 0, 255]));
    }
}
