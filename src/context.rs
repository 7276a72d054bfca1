//! Viewer state shared by the resize path and the render loop

use cgmath::{Vector3, Zero};
use log::{info, warn};
use rand::Rng;

use crate::assets::PendingText;
use crate::config::ViewerConfig;
use crate::gfx::camera::{CameraController, CameraTween, OrbitCamera};
use crate::gfx::scene::{Scene, ScenePopulator};
use crate::render_loop::FrameRenderer;
use crate::viewport::Viewport;

/// Orbit damping factor of the viewer controls
pub const DAMPING_FACTOR: f32 = 0.05;

/// Owns everything a frame reads or writes apart from the GPU
pub struct ViewerContext {
    pub viewport: Viewport,
    pub camera: OrbitCamera,
    pub controller: CameraController,
    pub tween: Option<CameraTween>,
    pub scene: Scene,
    pub pending_text: Option<PendingText>,
}

impl ViewerContext {
    /// Builds the camera and populates the scene
    ///
    /// Text, if configured, arrives later through [`ViewerContext::poll_assets`].
    pub fn new<R>(config: &ViewerConfig, viewport: Viewport, rng: &mut R) -> Self
    where
        R: Rng,
    {
        let mut camera = OrbitCamera::looking_at(
            config.camera_position,
            Vector3::zero(),
            viewport.aspect_ratio(),
        );
        camera.update_view_proj();

        let controller = CameraController::default().with_damping(Some(DAMPING_FACTOR));

        let mut scene = Scene::new();
        let pending_text = ScenePopulator::new(config.recipe.clone()).populate(&mut scene, rng);

        Self {
            viewport,
            camera,
            controller,
            tween: config.intro,
            scene,
            pending_text,
        }
    }

    /// Forwards a window resize to the viewport
    pub fn on_resize<R>(&mut self, width: f32, height: f32, device_pixel_ratio: f32, renderer: &mut R) -> bool
    where
        R: FrameRenderer + ?Sized,
    {
        self.viewport
            .on_resize(width, height, device_pixel_ratio, renderer, &mut self.camera)
    }

    /// Inserts the text mesh once its font has loaded
    ///
    /// A failed load is logged and the text stays absent.
    pub fn poll_assets(&mut self) {
        let Some(pending) = self.pending_text.as_mut() else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };

        match result {
            Ok(mesh) => {
                info!(
                    "Text {:?} ready ({} triangles)",
                    mesh.value,
                    mesh.geometry.triangle_count()
                );
                self.scene.set_text(mesh);
            }
            Err(e) => warn!("Text disabled: {}", e),
        }
        self.pending_text = None;
    }

    /// Moves the camera along the intro tween, dropping it once finished
    pub fn advance_tween(&mut self, elapsed: f32) {
        let Some(tween) = self.tween else {
            return;
        };
        self.camera.set_position(tween.sample(elapsed));
        if tween.is_finished(elapsed) {
            self.tween = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::system_fonts;
    use crate::config::Preset;
    use crate::render_loop::testing::RecordingRenderer;
    use cgmath::InnerSpace;
    use rand::{rngs::StdRng, SeedableRng};
    use std::path::PathBuf;

    fn context_with_font(preset: Preset, font: PathBuf) -> ViewerContext {
        let mut config = ViewerConfig::preset(preset);
        if let Some(text) = config.recipe.text.as_mut() {
            text.font_path = font;
            text.fallback_fonts.clear();
        }
        ViewerContext::new(&config, Viewport::new(800.0, 600.0, 1.0), &mut StdRng::seed_from_u64(42))
    }

    fn context(preset: Preset) -> ViewerContext {
        context_with_font(preset, "assets/fonts/definitely-missing.ttf".into())
    }

    fn wait_for_text(ctx: &mut ViewerContext) {
        while ctx.pending_text.is_some() {
            ctx.poll_assets();
            std::thread::yield_now();
        }
    }

    #[test]
    fn test_new_populates_preset() {
        let ctx = context(Preset::Mixed);
        assert_eq!(ctx.scene.shapes().len(), 200);
        assert!(ctx.pending_text.is_some());
        assert!(ctx.tween.is_some());
        assert_eq!(ctx.camera.aspect, 800.0 / 600.0);
        assert!((ctx.camera.eye - Vector3::new(-30.0, 30.0, 50.0)).magnitude() < 1e-3);

        let cubes = context(Preset::Cubes);
        assert!(cubes.pending_text.is_none());
        assert!(cubes.tween.is_none());
    }

    #[test]
    fn test_missing_font_leaves_scene_without_text() {
        let mut ctx = context(Preset::Donuts);
        wait_for_text(&mut ctx);
        assert!(ctx.scene.text().is_none());
        assert_eq!(ctx.scene.shapes().len(), 150);
    }

    #[test]
    fn test_loaded_font_inserts_text_once() {
        let Some(font) = system_fonts().into_iter().find(|path| path.exists()) else {
            eprintln!("no system font found, skipping");
            return;
        };
        let mut ctx = context_with_font(Preset::Donuts, font);
        wait_for_text(&mut ctx);

        let text = ctx.scene.text().expect("text mesh inserted");
        assert_eq!(text.value, "Hello world");
        let triangles = text.geometry.triangle_count();
        assert!(triangles > 0);

        // Nothing left to insert on later frames
        ctx.poll_assets();
        assert!(ctx.pending_text.is_none());
        assert_eq!(ctx.scene.text().map(|t| t.geometry.triangle_count()), Some(triangles));
        assert_eq!(ctx.scene.shapes().len(), 150);
    }

    #[test]
    fn test_tween_reaches_destination_and_ends() {
        let mut ctx = context(Preset::Mixed);
        ctx.advance_tween(0.75);
        let midway = ctx.camera.eye;
        assert!(midway.magnitude() < Vector3::new(-30.0f32, 30.0, 50.0).magnitude());
        assert!(ctx.tween.is_some());

        ctx.advance_tween(1.5);
        assert!((ctx.camera.eye - Vector3::new(0.0, 1.0, 4.0)).magnitude() < 1e-3);
        assert!(ctx.tween.is_none());
    }

    #[test]
    fn test_resize_updates_camera_aspect() {
        let mut ctx = context(Preset::Cubes);
        let mut renderer = RecordingRenderer::default();
        assert!(ctx.on_resize(1000.0, 500.0, 1.0, &mut renderer));
        assert_eq!(ctx.camera.aspect, 2.0);
        assert_eq!(renderer.sizes.len(), 1);
    }
}
