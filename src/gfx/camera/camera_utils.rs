use cgmath::{Matrix4, SquareMatrix};

pub trait Camera: Sized {
    fn build_view_matrix(&self) -> Matrix4<f32>;
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],

    /// View matrix alone, used to bring normals into view space.
    pub view: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
        }
    }
}
