//! # Extruded Text
//!
//! Text is laid out and rasterized with `fontdue` into a coverage grid, then
//! every covered cell is extruded along Z. Only walls on the outline of the
//! grid are emitted, so the result is a closed solid with no interior faces.
//!
//! The bevel only affects shading. It lengthens the walls by `bevel_thickness`
//! at each end and bends the normals of that rim band towards the caps with
//! slope `bevel_size / bevel_thickness`. The outline is not widened, so
//! `bevel_size` never changes the XY footprint.

use std::collections::BTreeSet;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

use super::GeometryData;

/// Coverage at or above this value marks a cell as solid
const COVERAGE_THRESHOLD: u8 = 128;

/// Parameters of an extruded text mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextParams {
    /// Em size in world units
    pub size: f32,
    /// Extrusion depth of the body, bevel excluded
    pub depth: f32,
    pub bevel_enabled: bool,
    /// How far the bevel extends along Z beyond the body, per side
    pub bevel_thickness: f32,
    /// Sets the slope of the rim normals; the outline is not offset
    pub bevel_size: f32,
    pub bevel_segments: u32,
    /// Rasterization resolution in cells per em
    pub resolution: f32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            size: 0.5,
            depth: 0.2,
            bevel_enabled: true,
            bevel_thickness: 0.03,
            bevel_size: 0.02,
            bevel_segments: 4,
            resolution: 48.0,
        }
    }
}

impl TextParams {
    /// World-space edge length of one coverage cell
    pub fn cell_size(&self) -> f32 {
        self.size / self.resolution.max(1.0)
    }
}

/// Set of solid cells in glyph space, Y up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellGrid {
    cells: BTreeSet<(i32, i32)>,
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, x: i32, y: i32) {
        self.cells.insert((x, y));
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.cells.contains(&(x, y))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells.iter().copied()
    }
}

/// Rasterizes `text` into a coverage grid
///
/// Glyphs are placed by `fontdue`'s layout, so kerning and line breaks follow
/// the font. Grid Y grows upwards; the origin is arbitrary since the mesh is
/// centred afterwards.
pub fn rasterize_text(font: &fontdue::Font, text: &str, params: &TextParams) -> CellGrid {
    let px = params.resolution.max(1.0);

    let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings::default());
    layout.append(&[font], &TextStyle::new(text, px, 0));

    let mut grid = CellGrid::new();
    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }

        let (metrics, bitmap) = font.rasterize_config(glyph.key);
        let left = glyph.x.round() as i32;
        let top = glyph.y.round() as i32;

        for row in 0..metrics.height {
            for col in 0..metrics.width {
                if bitmap[row * metrics.width + col] >= COVERAGE_THRESHOLD {
                    // Layout rows grow downwards
                    grid.insert(left + col as i32, -(top + row as i32) - 1);
                }
            }
        }
    }

    grid
}

/// Side of a cell that borders an empty neighbour
#[derive(Debug, Clone, Copy)]
struct Wall {
    /// Edge start and end in the XY plane, ordered so the quad faces outward
    from: [f32; 2],
    to: [f32; 2],
    normal: [f32; 2],
}

/// Z position of a wall ring and how far into the bevel it sits (0 = body, 1 = cap edge)
#[derive(Debug, Clone, Copy)]
struct Ring {
    z: f32,
    bevel: f32,
    z_sign: f32,
}

fn rings(params: &TextParams) -> Vec<Ring> {
    let half_depth = params.depth * 0.5;
    let segments = params.bevel_segments;

    if !params.bevel_enabled || segments == 0 || params.bevel_thickness <= 0.0 {
        return vec![
            Ring { z: -half_depth, bevel: 0.0, z_sign: -1.0 },
            Ring { z: half_depth, bevel: 0.0, z_sign: 1.0 },
        ];
    }

    let mut out = Vec::with_capacity(2 * (segments as usize + 1));
    for k in 0..=segments {
        let f = k as f32 / segments as f32;
        out.push(Ring {
            z: -half_depth - params.bevel_thickness * (1.0 - f),
            bevel: 1.0 - f,
            z_sign: -1.0,
        });
    }
    for k in 0..=segments {
        let f = k as f32 / segments as f32;
        out.push(Ring {
            z: half_depth + params.bevel_thickness * f,
            bevel: f,
            z_sign: 1.0,
        });
    }
    out
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}

fn ring_normal(wall: &Wall, ring: &Ring, params: &TextParams) -> [f32; 3] {
    let side = [wall.normal[0], wall.normal[1], 0.0];
    if ring.bevel <= 0.0 {
        return side;
    }
    let chamfer = normalize([
        wall.normal[0] * params.bevel_thickness,
        wall.normal[1] * params.bevel_thickness,
        ring.z_sign * params.bevel_size,
    ]);
    let t = ring.bevel;
    normalize([
        side[0] * (1.0 - t) + chamfer[0] * t,
        side[1] * (1.0 - t) + chamfer[1] * t,
        chamfer[2] * t,
    ])
}

/// Extrudes a coverage grid into a closed solid
///
/// The result is in cell space scaled by [`TextParams::cell_size`] and is not
/// centred; callers centre it once the whole string is built.
pub fn extrude_cells(grid: &CellGrid, params: &TextParams) -> GeometryData {
    let mut data = GeometryData::new();
    let c = params.cell_size();
    let rings = rings(params);
    let front_z = rings.last().map(|r| r.z).unwrap_or(0.0);
    let back_z = rings.first().map(|r| r.z).unwrap_or(0.0);

    for (cx, cy) in grid.iter() {
        let x0 = cx as f32 * c;
        let x1 = x0 + c;
        let y0 = cy as f32 * c;
        let y1 = y0 + c;

        // Caps
        let base = data.push_vertex([x0, y0, front_z], [0.0, 0.0, 1.0]);
        data.push_vertex([x1, y0, front_z], [0.0, 0.0, 1.0]);
        data.push_vertex([x1, y1, front_z], [0.0, 0.0, 1.0]);
        data.push_vertex([x0, y1, front_z], [0.0, 0.0, 1.0]);
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);

        let base = data.push_vertex([x0, y0, back_z], [0.0, 0.0, -1.0]);
        data.push_vertex([x0, y1, back_z], [0.0, 0.0, -1.0]);
        data.push_vertex([x1, y1, back_z], [0.0, 0.0, -1.0]);
        data.push_vertex([x1, y0, back_z], [0.0, 0.0, -1.0]);
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);

        let mut walls = Vec::with_capacity(4);
        if !grid.contains(cx + 1, cy) {
            walls.push(Wall { from: [x1, y0], to: [x1, y1], normal: [1.0, 0.0] });
        }
        if !grid.contains(cx - 1, cy) {
            walls.push(Wall { from: [x0, y1], to: [x0, y0], normal: [-1.0, 0.0] });
        }
        if !grid.contains(cx, cy + 1) {
            walls.push(Wall { from: [x1, y1], to: [x0, y1], normal: [0.0, 1.0] });
        }
        if !grid.contains(cx, cy - 1) {
            walls.push(Wall { from: [x0, y0], to: [x1, y0], normal: [0.0, -1.0] });
        }

        for wall in &walls {
            for band in rings.windows(2) {
                let (lo, hi) = (band[0], band[1]);
                let n_lo = ring_normal(wall, &lo, params);
                let n_hi = ring_normal(wall, &hi, params);

                let base = data.push_vertex([wall.from[0], wall.from[1], lo.z], n_lo);
                data.push_vertex([wall.to[0], wall.to[1], lo.z], n_lo);
                data.push_vertex([wall.to[0], wall.to[1], hi.z], n_hi);
                data.push_vertex([wall.from[0], wall.from[1], hi.z], n_hi);
                data.indices
                    .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
            }
        }
    }

    data
}

/// Rasterizes, extrudes and centres `text`
pub fn build_text_geometry(font: &fontdue::Font, text: &str, params: &TextParams) -> GeometryData {
    let grid = rasterize_text(font, text, params);
    let mut data = extrude_cells(&grid, params);
    data.center();
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> TextParams {
        TextParams {
            bevel_enabled: false,
            resolution: 10.0,
            size: 1.0,
            ..TextParams::default()
        }
    }

    #[test]
    fn test_single_cell_without_bevel() {
        let mut grid = CellGrid::new();
        grid.insert(0, 0);

        let data = extrude_cells(&grid, &flat());

        // 2 caps + 4 walls, one band each
        assert_eq!(data.triangle_count(), 12);
        assert_eq!(data.vertex_count(), 24);

        let (min, max) = data.bounding_box().unwrap();
        assert!((max[0] - min[0] - 0.1).abs() < 1e-6);
        assert!((max[2] - min[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_adjacent_cells_share_no_inner_walls() {
        let mut grid = CellGrid::new();
        grid.insert(0, 0);
        grid.insert(1, 0);

        let data = extrude_cells(&grid, &flat());

        // 4 caps + 6 outline walls
        assert_eq!(data.triangle_count(), 4 * 2 + 6 * 2);
    }

    #[test]
    fn test_bevel_adds_rim_bands() {
        let mut grid = CellGrid::new();
        grid.insert(0, 0);
        let params = TextParams {
            resolution: 10.0,
            size: 1.0,
            ..TextParams::default()
        };

        let data = extrude_cells(&grid, &params);

        // Each wall has 2 * (segments + 1) rings and one band between neighbours
        let bands = 2 * (params.bevel_segments + 1) - 1;
        assert_eq!(data.triangle_count() as u32, 4 + 4 * bands * 2);

        let (min, max) = data.bounding_box().unwrap();
        let depth = params.depth + 2.0 * params.bevel_thickness;
        assert!((max[2] - min[2] - depth).abs() < 1e-6);
    }

    #[test]
    fn test_bevel_normals_are_unit_and_lean_towards_caps() {
        let mut grid = CellGrid::new();
        grid.insert(0, 0);
        let data = extrude_cells(&grid, &TextParams::default());

        for (v, n) in data.vertices.iter().zip(&data.normals) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-4);
            // No normal points back into the solid along Z
            assert!(v[2] * n[2] >= -1e-6);
        }
    }

    #[test]
    fn test_empty_grid_yields_empty_geometry() {
        let data = extrude_cells(&CellGrid::new(), &TextParams::default());
        assert!(data.is_empty());
    }

    #[test]
    fn test_bevel_keeps_outline_footprint() {
        let mut grid = CellGrid::new();
        grid.insert(0, 0);
        let params = TextParams {
            resolution: 10.0,
            size: 1.0,
            bevel_size: 0.5,
            ..TextParams::default()
        };

        let (min, max) = extrude_cells(&grid, &params).bounding_box().unwrap();

        assert!((max[0] - min[0] - params.cell_size()).abs() < 1e-6);
        assert!((max[1] - min[1] - params.cell_size()).abs() < 1e-6);
    }

    fn font() -> Option<fontdue::Font> {
        let path = crate::assets::system_fonts()
            .into_iter()
            .find(|path| path.exists())?;
        crate::assets::read_font(&path).ok()
    }

    #[test]
    fn test_rasterized_text_covers_cells() {
        let Some(font) = font() else {
            eprintln!("no system font found, skipping");
            return;
        };
        let params = TextParams::default();

        let grid = rasterize_text(&font, "Hello world", &params);
        assert!(!grid.is_empty());
        assert!(rasterize_text(&font, " ", &params).is_empty());

        let one_line = rasterize_text(&font, "Hi", &params);
        let two_lines = rasterize_text(&font, "Hi\nHi", &params);
        let height = |g: &CellGrid| {
            let ys: Vec<i32> = g.iter().map(|(_, y)| y).collect();
            ys.iter().max().unwrap() - ys.iter().min().unwrap()
        };
        assert_eq!(two_lines.len(), 2 * one_line.len());
        assert!(height(&two_lines) > height(&one_line));
    }

    #[test]
    fn test_text_geometry_is_centred_with_bevelled_depth() {
        let Some(font) = font() else {
            eprintln!("no system font found, skipping");
            return;
        };
        let params = TextParams::default();

        let data = build_text_geometry(&font, "Hello world", &params);
        assert!(data.triangle_count() > 0);

        let (min, max) = data.bounding_box().unwrap();
        for axis in 0..3 {
            assert!((min[axis] + max[axis]).abs() < 1e-4, "axis {} not centred", axis);
        }
        let depth = params.depth + 2.0 * params.bevel_thickness;
        assert!((max[2] - min[2] - depth).abs() < 1e-5);
        // Roughly one em tall, several ems wide
        assert!(max[0] - min[0] > max[1] - min[1]);
    }

    #[test]
    fn test_cell_size_follows_size_and_resolution() {
        let params = TextParams {
            size: 0.5,
            resolution: 50.0,
            ..TextParams::default()
        };
        assert!((params.cell_size() - 0.01).abs() < 1e-7);
    }
}
