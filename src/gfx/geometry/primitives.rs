//! # Primitive Shape Generation
//!
//! Cube and torus generators. Both produce outward unit normals and
//! counter-clockwise front faces.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a cube with edge length `size` centered at the origin
///
/// Each face has its own four vertices so normals stay flat.
pub fn generate_cube(size: f32) -> GeometryData {
    let h = size * 0.5;

    #[rustfmt::skip]
    let positions = [
        // Front face
        [-h, -h,  h], [ h, -h,  h], [ h,  h,  h], [-h,  h,  h],
        // Back face
        [-h, -h, -h], [-h,  h, -h], [ h,  h, -h], [ h, -h, -h],
        // Left face
        [-h, -h, -h], [-h, -h,  h], [-h,  h,  h], [-h,  h, -h],
        // Right face
        [ h, -h,  h], [ h, -h, -h], [ h,  h, -h], [ h,  h,  h],
        // Top face
        [-h,  h,  h], [ h,  h,  h], [ h,  h, -h], [-h,  h, -h],
        // Bottom face
        [-h, -h, -h], [ h, -h, -h], [ h, -h,  h], [-h, -h,  h],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    let mut data = GeometryData::new();
    for (face, normal) in face_normals.iter().enumerate() {
        let base = data.vertices.len() as u32;
        for corner in &positions[face * 4..face * 4 + 4] {
            data.push_vertex(*corner, *normal);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a torus lying in the XY plane
///
/// # Arguments
/// * `radius` - Distance from the torus center to the center of the tube
/// * `tube` - Radius of the tube
/// * `radial_segments` - Segments around the tube cross-section
/// * `tubular_segments` - Segments around the ring
pub fn generate_torus(
    radius: f32,
    tube: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> GeometryData {
    let radial = radial_segments.max(3);
    let tubular = tubular_segments.max(3);
    let mut data = GeometryData::new();

    for j in 0..=radial {
        let v = j as f32 / radial as f32 * 2.0 * PI;
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * 2.0 * PI;

            let x = (radius + tube * v.cos()) * u.cos();
            let y = (radius + tube * v.cos()) * u.sin();
            let z = tube * v.sin();

            // Normal points from the tube's center line to the surface
            let center = [radius * u.cos(), radius * u.sin(), 0.0];
            let n = [x - center[0], y - center[1], z - center[2]];
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            let normal = if len > 0.0 {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 0.0, 1.0]
            };

            data.push_vertex([x, y, z], normal);
        }
    }

    let row = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;

            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    data
}
