use cgmath::{Matrix4, Rad, Vector3};

use crate::gfx::geometry::{generate_cube, generate_torus, GeometryData};

/// Torus ring radius, tube radius and segment counts
pub const TORUS_RADIUS: f32 = 0.3;
pub const TORUS_TUBE: f32 = 0.2;
pub const TORUS_RADIAL_SEGMENTS: u32 = 16;
pub const TORUS_TUBULAR_SEGMENTS: u32 = 32;
pub const CUBE_SIZE: f32 = 0.4;

/// Mesh a shape is drawn with. All shapes of one kind share one GPU mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Torus,
    Cube,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 2] = [ShapeKind::Torus, ShapeKind::Cube];

    pub fn geometry(self) -> GeometryData {
        match self {
            ShapeKind::Torus => generate_torus(
                TORUS_RADIUS,
                TORUS_TUBE,
                TORUS_RADIAL_SEGMENTS,
                TORUS_TUBULAR_SEGMENTS,
            ),
            ShapeKind::Cube => generate_cube(CUBE_SIZE),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Torus => "torus",
            ShapeKind::Cube => "cube",
        }
    }
}

/// A placed mesh instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub position: Vector3<f32>,
    /// Euler angles in radians, applied in X, Y, Z order
    pub rotation: Vector3<f32>,
    /// Uniform scale
    pub scale: f32,
    /// Radians per second on every axis; `None` keeps the shape still
    pub rotation_speed: Option<f32>,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
            rotation_speed: None,
        }
    }

    /// Sets the rotation for `elapsed` seconds since loop start
    ///
    /// Rotation is `speed * elapsed` on all three axes. It is not accumulated
    /// from earlier frames.
    pub fn animate(&mut self, elapsed: f32) {
        if let Some(speed) = self.rotation_speed {
            let angle = speed * elapsed;
            self.rotation = Vector3::new(angle, angle, angle);
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_scale(self.scale)
    }
}
