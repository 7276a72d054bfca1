//! # Procedural Geometry Generation
//!
//! Every mesh the viewer draws is generated here, so the binary ships without
//! model files.
//!
//! ## Supported Meshes
//!
//! - **Cube**: axis-aligned box with per-face normals
//! - **Torus**: ring with configurable radial and tubular resolution
//! - **Text**: glyph coverage extruded into a solid with a shaded bevel rim
//!
//! ## Usage
//!
//! ```rust
//! use orbitscape::gfx::geometry::{generate_cube, generate_torus};
//!
//! let cube = generate_cube(0.4);
//! let torus = generate_torus(0.3, 0.2, 16, 32);
//! assert_eq!(cube.triangle_count(), 12);
//! assert!(torus.vertex_count() > 0);
//! ```

pub mod primitives;
pub mod text;

pub use primitives::*;
pub use text::{extrude_cells, rasterize_text, CellGrid, TextParams};

use crate::gfx::rendering::vertex::Vertex3D;

/// Generated geometry ready for GPU upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends a vertex and returns its index
    pub fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3]) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        self.normals.push(normal);
        index
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for empty geometry
    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        let bounds = self.vertices.iter().fold((first, first), |(mut min, mut max), v| {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
            (min, max)
        });
        Some(bounds)
    }

    /// Translates the geometry so its bounding box is centred on the origin
    pub fn center(&mut self) {
        let Some((min, max)) = self.bounding_box() else {
            return;
        };
        let offset = [
            -(min[0] + max[0]) * 0.5,
            -(min[1] + max[1]) * 0.5,
            -(min[2] + max[2]) * 0.5,
        ];
        for v in self.vertices.iter_mut() {
            v[0] += offset[0];
            v[1] += offset[1];
            v[2] += offset[2];
        }
    }

    /// Interleaves positions and normals into the renderer's vertex format
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_moves_bounds_to_origin() {
        let mut data = GeometryData::new();
        data.push_vertex([1.0, 2.0, 3.0], [0.0, 0.0, 1.0]);
        data.push_vertex([3.0, 6.0, 5.0], [0.0, 0.0, 1.0]);

        data.center();

        let (min, max) = data.bounding_box().unwrap();
        assert_eq!(min, [-1.0, -2.0, -1.0]);
        assert_eq!(max, [1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_center_on_empty_geometry_is_noop() {
        let mut data = GeometryData::new();
        data.center();
        assert!(data.bounding_box().is_none());
        assert!(data.is_empty());
    }

    #[test]
    fn test_to_vertices_keeps_order() {
        let cube = generate_cube(1.0);
        let vertices = cube.to_vertices();
        assert_eq!(vertices.len(), cube.vertex_count());
        assert_eq!(vertices[3].position, cube.vertices[3]);
        assert_eq!(vertices[3].normal, cube.normals[3]);
    }
}
