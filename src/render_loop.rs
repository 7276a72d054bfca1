//! Per-frame driver
//!
//! The window shell calls [`RenderLoop::tick`] on every redraw and asks for
//! another redraw while it returns [`LoopStep::Continue`]. A frame applies
//! finished asset loads, moves the camera, draws, and then spins the shapes
//! to their pose at the current time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::context::ViewerContext;
use crate::gfx::camera::OrbitCamera;
use crate::gfx::rendering::RenderError;
use crate::gfx::scene::Scene;
use crate::viewport::SurfaceSize;

/// What the render loop needs from a renderer
pub trait FrameRenderer {
    /// Resizes the drawing surface, in physical pixels
    fn set_surface_size(&mut self, size: SurfaceSize);

    /// Draws one frame of `scene` as seen by `camera`
    fn render(&mut self, scene: &Scene, camera: &OrbitCamera) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStep {
    Continue,
    Stop,
}

/// Shared flag that ends the loop at the next tick
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct RenderLoop {
    state: LoopState,
    started_at: Option<Instant>,
    stop: StopToken,
    stats: FrameStats,
}

impl RenderLoop {
    pub fn new(stop: StopToken) -> Self {
        Self {
            state: LoopState::Idle,
            started_at: None,
            stop,
            stats: FrameStats::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Moves an idle loop to running and starts its clock
    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            self.state = LoopState::Running;
            self.started_at = Some(Instant::now());
            info!("Render loop started");
        }
    }

    /// Seconds since [`RenderLoop::start`], zero before it
    pub fn elapsed(&self) -> f32 {
        self.started_at
            .map(|start| start.elapsed().as_secs_f32())
            .unwrap_or(0.0)
    }

    /// Runs one frame at the current wall-clock time
    pub fn tick<R>(&mut self, ctx: &mut ViewerContext, renderer: &mut R) -> LoopStep
    where
        R: FrameRenderer + ?Sized,
    {
        self.start();
        let elapsed = self.elapsed();
        self.tick_at(ctx, renderer, elapsed)
    }

    /// Runs one frame as if `elapsed` seconds had passed since start
    pub fn tick_at<R>(&mut self, ctx: &mut ViewerContext, renderer: &mut R, elapsed: f32) -> LoopStep
    where
        R: FrameRenderer + ?Sized,
    {
        if self.stop.is_stopped() {
            self.halt();
        }
        if self.state == LoopState::Stopped {
            return LoopStep::Stop;
        }
        self.start();

        ctx.poll_assets();
        ctx.advance_tween(elapsed);
        ctx.controller.update(&mut ctx.camera);
        ctx.camera.update_view_proj();

        match renderer.render(&ctx.scene, &ctx.camera) {
            Ok(()) => {}
            Err(e) if e.is_transient() => {
                warn!("Skipping frame: {}", e);
            }
            Err(e) if e.is_fatal() => {
                error!("Rendering cannot continue: {}", e);
                self.halt();
                return LoopStep::Stop;
            }
            Err(e) => {
                error!("Render error: {}", e);
            }
        }

        ctx.scene.animate(elapsed);
        self.stats.record_frame(Instant::now());

        if self.stop.is_stopped() {
            self.halt();
            return LoopStep::Stop;
        }
        LoopStep::Continue
    }

    fn halt(&mut self) {
        if self.state != LoopState::Stopped {
            self.state = LoopState::Stopped;
            info!("Render loop stopped after {} frames", self.stats.frame_count());
        }
    }
}

/// Rolling frame-time statistics, logged periodically at debug level
#[derive(Debug)]
pub struct FrameStats {
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    last_frame: Option<Instant>,
    last_report: Option<Instant>,
    report_interval: Duration,
    frame_count: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::with_config(120, Duration::from_secs(5))
    }

    pub fn with_config(max_samples: usize, report_interval: Duration) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            last_frame: None,
            last_report: None,
            report_interval,
            frame_count: 0,
        }
    }

    /// Records a frame finishing at `now`
    pub fn record_frame(&mut self, now: Instant) {
        self.frame_count += 1;

        if let Some(last) = self.last_frame.replace(now) {
            if self.frame_times.len() >= self.max_samples {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(now.saturating_duration_since(last));
        }

        let report_due = match self.last_report {
            Some(last) => now.saturating_duration_since(last) >= self.report_interval,
            None => {
                self.last_report = Some(now);
                false
            }
        };
        if report_due {
            self.last_report = Some(now);
            debug!(
                "{:.1} fps ({:.2} ms/frame) over the last {} frames",
                self.fps(),
                self.average_frame_time().as_secs_f32() * 1000.0,
                self.frame_times.len()
            );
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn average_frame_time(&self) -> Duration {
        if self.frame_times.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.frame_times.iter().sum();
        total / self.frame_times.len() as u32
    }

    pub fn fps(&self) -> f32 {
        let secs = self.average_frame_time().as_secs_f32();
        if secs > 0.0 {
            1.0 / secs
        } else {
            0.0
        }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingRenderer;
    use super::*;
    use crate::config::{Preset, ViewerConfig};
    use crate::gfx::scene::SceneRecipe;
    use crate::viewport::Viewport;
    use rand::{rngs::StdRng, SeedableRng};

    fn context(recipe: SceneRecipe, seed: u64) -> ViewerContext {
        let mut config = ViewerConfig::preset(Preset::Cubes);
        config.recipe = recipe;
        config.intro = None;
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        ViewerContext::new(&config, viewport, &mut StdRng::seed_from_u64(seed))
    }

    fn recipe(donuts: usize, cubes: usize, bound: f32) -> SceneRecipe {
        SceneRecipe {
            donuts,
            cubes,
            bound,
            text: None,
        }
    }

    #[test]
    fn test_end_to_end_frame_at_two_seconds() {
        let mut ctx = context(recipe(75, 75, 10.0), 2024);
        let mut renderer = RecordingRenderer::default();
        let mut render_loop = RenderLoop::new(StopToken::new());

        assert_eq!(ctx.viewport.aspect_ratio(), 800.0 / 600.0);
        assert_eq!(ctx.scene.shapes().len(), 150);

        let step = render_loop.tick_at(&mut ctx, &mut renderer, 2.0);
        assert_eq!(step, LoopStep::Continue);
        assert_eq!(render_loop.state(), LoopState::Running);
        assert_eq!(renderer.frames, 1);

        for shape in ctx.scene.shapes() {
            let speed = shape.rotation_speed.unwrap_or(0.0);
            let expected = speed * 2.0;
            assert_eq!(shape.rotation.x, expected);
            assert_eq!(shape.rotation.y, expected);
            assert_eq!(shape.rotation.z, expected);
            assert!(shape.position.x.abs() <= 5.0);
            assert!(shape.position.y.abs() <= 5.0);
            assert!(shape.position.z.abs() <= 5.0);
        }
    }

    #[test]
    fn test_rotation_is_absolute_in_time() {
        let mut ctx = context(recipe(10, 10, 10.0), 7);
        let mut renderer = RecordingRenderer::default();
        let mut render_loop = RenderLoop::new(StopToken::new());

        for t in [0.5, 9.0, 1.25] {
            render_loop.tick_at(&mut ctx, &mut renderer, t);
        }

        for shape in ctx.scene.shapes() {
            let s = shape.rotation_speed.unwrap_or(0.0);
            assert_eq!(shape.rotation.x, s * 1.25);
        }
    }

    #[test]
    fn test_render_happens_before_animation() {
        let mut ctx = context(recipe(1, 0, 10.0), 3);
        let initial = ctx.scene.shapes()[0].rotation;
        let mut renderer = RecordingRenderer::default();
        let mut render_loop = RenderLoop::new(StopToken::new());

        render_loop.tick_at(&mut ctx, &mut renderer, 4.0);
        assert_eq!(renderer.first_rotation[0], initial);
        assert_ne!(ctx.scene.shapes()[0].rotation, initial);
    }

    #[test]
    fn test_first_tick_starts_loop() {
        let mut ctx = context(recipe(1, 1, 10.0), 1);
        let mut renderer = RecordingRenderer::default();
        let mut render_loop = RenderLoop::new(StopToken::new());
        assert_eq!(render_loop.state(), LoopState::Idle);

        assert_eq!(render_loop.tick(&mut ctx, &mut renderer), LoopStep::Continue);
        assert_eq!(render_loop.state(), LoopState::Running);
        assert_eq!(render_loop.stats().frame_count(), 1);
    }

    #[test]
    fn test_stop_token_halts_without_rendering() {
        let mut ctx = context(recipe(5, 5, 10.0), 11);
        let mut renderer = RecordingRenderer::default();
        let token = StopToken::new();
        let mut render_loop = RenderLoop::new(token.clone());

        assert_eq!(render_loop.tick_at(&mut ctx, &mut renderer, 0.1), LoopStep::Continue);
        token.stop();

        assert_eq!(render_loop.tick_at(&mut ctx, &mut renderer, 0.2), LoopStep::Stop);
        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert_eq!(renderer.frames, 1);

        assert_eq!(render_loop.tick_at(&mut ctx, &mut renderer, 0.3), LoopStep::Stop);
        assert_eq!(renderer.frames, 1);
    }

    #[test]
    fn test_transient_render_error_keeps_running() {
        let mut ctx = context(recipe(2, 2, 10.0), 5);
        let mut renderer = RecordingRenderer {
            fail_with: Some(RenderError::SurfaceLost),
            ..Default::default()
        };
        let mut render_loop = RenderLoop::new(StopToken::new());

        assert_eq!(render_loop.tick_at(&mut ctx, &mut renderer, 1.0), LoopStep::Continue);
        assert_eq!(render_loop.state(), LoopState::Running);
        let s = ctx.scene.shapes()[0].rotation_speed.unwrap_or(0.0);
        assert_eq!(ctx.scene.shapes()[0].rotation.x, s);
    }

    #[test]
    fn test_out_of_memory_stops_loop() {
        let mut ctx = context(recipe(2, 2, 10.0), 5);
        let mut renderer = RecordingRenderer {
            fail_with: Some(RenderError::OutOfMemory),
            ..Default::default()
        };
        let mut render_loop = RenderLoop::new(StopToken::new());

        assert_eq!(render_loop.tick_at(&mut ctx, &mut renderer, 1.0), LoopStep::Stop);
        assert_eq!(render_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn test_frame_stats_average() {
        let mut stats = FrameStats::with_config(4, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..6u64 {
            stats.record_frame(start + Duration::from_millis(i * 20));
        }
        assert_eq!(stats.frame_count(), 6);
        assert_eq!(stats.average_frame_time(), Duration::from_millis(20));
        assert!((stats.fps() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_frame_stats_empty() {
        let stats = FrameStats::new();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.average_frame_time(), Duration::ZERO);
    }
}
