//! Logical window size, device pixel ratio and the resize path
//!
//! The viewport is the single owner of the window dimensions. Every applied
//! resize pushes the physical surface size to the renderer and the new aspect
//! ratio to the camera, so the two never disagree with the window.

use log::debug;

use crate::gfx::camera::OrbitCamera;
use crate::render_loop::FrameRenderer;

/// Highest device pixel ratio the surface is rendered at
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Physical surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: f32,
    height: f32,
    device_pixel_ratio: f32,
}

impl Viewport {
    /// Creates a viewport from the initial logical window size
    ///
    /// A zero dimension is raised to one pixel so the aspect ratio stays finite.
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width: sanitize_extent(width),
            height: sanitize_extent(height),
            device_pixel_ratio: sanitize_ratio(device_pixel_ratio),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Device pixel ratio as reported by the window system
    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// Pixel ratio actually used for rendering, capped at [`MAX_PIXEL_RATIO`]
    pub fn pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
    }

    pub fn surface_size(&self) -> SurfaceSize {
        let ratio = self.pixel_ratio();
        SurfaceSize {
            width: physical_extent(self.width, ratio),
            height: physical_extent(self.height, ratio),
        }
    }

    /// Applies a window resize to the viewport, renderer and camera
    ///
    /// Returns `false` without touching anything when either dimension is
    /// zero, which is what a minimised window reports.
    pub fn on_resize<R>(
        &mut self,
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
        renderer: &mut R,
        camera: &mut OrbitCamera,
    ) -> bool
    where
        R: FrameRenderer + ?Sized,
    {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            debug!("Ignoring resize to {}x{}", width, height);
            return false;
        }

        self.width = width;
        self.height = height;
        self.device_pixel_ratio = sanitize_ratio(device_pixel_ratio);

        renderer.set_surface_size(self.surface_size());
        camera.set_aspect(self.aspect_ratio());
        true
    }
}

fn physical_extent(logical: f32, ratio: f32) -> u32 {
    ((logical * ratio).round() as u32).max(1)
}

fn sanitize_extent(value: f32) -> f32 {
    if value.is_finite() && value >= 1.0 {
        value
    } else {
        1.0
    }
}

fn sanitize_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;
    use crate::render_loop::testing::RecordingRenderer;
    use cgmath::{perspective, Vector3, Zero};

    fn camera() -> OrbitCamera {
        OrbitCamera::looking_at(Vector3::new(0.0, 0.0, 6.0), Vector3::zero(), 1.0)
    }

    #[test]
    fn test_aspect_matches_dimensions_after_resize() {
        let mut viewport = Viewport::new(1200.0, 800.0, 1.0);
        let mut renderer = RecordingRenderer::default();
        let mut camera = camera();

        for (w, h) in [(800.0, 600.0), (1920.0, 1080.0), (333.0, 777.0), (1.0, 3.0)] {
            assert!(viewport.on_resize(w, h, 1.0, &mut renderer, &mut camera));
            assert_eq!(viewport.aspect_ratio(), w / h);
            assert_eq!(camera.aspect, w / h);

            let expected = OPENGL_TO_WGPU_MATRIX * perspective(camera.fovy, w / h, camera.znear, camera.zfar);
            assert_eq!(camera.projection_matrix(), expected);
        }
    }

    #[test]
    fn test_zero_height_resize_is_ignored() {
        let mut viewport = Viewport::new(800.0, 600.0, 1.0);
        let mut renderer = RecordingRenderer::default();
        let mut camera = camera();
        camera.set_aspect(viewport.aspect_ratio());
        let before = camera.projection_matrix();

        assert!(!viewport.on_resize(800.0, 0.0, 1.0, &mut renderer, &mut camera));
        assert!(!viewport.on_resize(0.0, 600.0, 1.0, &mut renderer, &mut camera));

        assert_eq!(viewport.height(), 600.0);
        assert_eq!(viewport.aspect_ratio(), 800.0 / 600.0);
        assert_eq!(camera.projection_matrix(), before);
        assert!(renderer.sizes.is_empty());
    }

    #[test]
    fn test_pixel_ratio_is_capped() {
        let mut viewport = Viewport::new(800.0, 600.0, 3.0);
        assert_eq!(viewport.pixel_ratio(), 2.0);
        assert_eq!(viewport.device_pixel_ratio(), 3.0);
        assert_eq!(
            viewport.surface_size(),
            SurfaceSize {
                width: 1600,
                height: 1200
            }
        );

        let mut renderer = RecordingRenderer::default();
        let mut camera = camera();
        viewport.on_resize(400.0, 300.0, 1.5, &mut renderer, &mut camera);
        viewport.on_resize(400.0, 300.0, 4.0, &mut renderer, &mut camera);
        assert_eq!(
            renderer.sizes,
            vec![
                SurfaceSize { width: 600, height: 450 },
                SurfaceSize { width: 800, height: 600 },
            ]
        );
    }

    #[test]
    fn test_repeated_resize_is_idempotent() {
        let mut viewport = Viewport::new(1200.0, 800.0, 1.0);
        let mut renderer = RecordingRenderer::default();
        let mut camera = camera();

        viewport.on_resize(1024.0, 768.0, 2.0, &mut renderer, &mut camera);
        let first = (viewport, camera.projection_matrix());
        viewport.on_resize(1024.0, 768.0, 2.0, &mut renderer, &mut camera);

        assert_eq!(first.0, viewport);
        assert_eq!(first.1, camera.projection_matrix());
        assert_eq!(renderer.sizes[0], renderer.sizes[1]);
    }

    #[test]
    fn test_new_guards_degenerate_sizes() {
        let viewport = Viewport::new(0.0, f32::NAN, 0.0);
        assert_eq!(viewport.aspect_ratio(), 1.0);
        assert_eq!(viewport.pixel_ratio(), 1.0);
        assert_eq!(viewport.surface_size(), SurfaceSize { width: 1, height: 1 });
    }
}
