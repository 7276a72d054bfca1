use std::sync::Arc;

use log::{error, info};
use rand::{rngs::StdRng, SeedableRng};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::ViewerConfig;
use crate::context::ViewerContext;
use crate::error::ViewerError;
use crate::gfx::rendering::RenderEngine;
use crate::render_loop::{LoopStep, RenderLoop, StopToken};
use crate::viewport::Viewport;

pub struct ViewerApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    context: Option<ViewerContext>,
    render_loop: RenderLoop,
    startup_error: Option<ViewerError>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        let event_loop = EventLoop::new()?;

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                context: None,
                render_loop: RenderLoop::new(StopToken::new()),
                startup_error: None,
            },
        })
    }

    /// Run the viewer (consumes self and blocks until the window closes)
    pub fn run(mut self) -> Result<(), ViewerError> {
        // Redraws are requested frame by frame, so there is nothing to poll for
        self.event_loop.set_control_flow(ControlFlow::Wait);
        self.event_loop.run_app(&mut self.app_state)?;

        match self.app_state.startup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let attributes = WindowAttributes::default()
            .with_title("orbitscape")
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        self.window = Some(window.clone());

        let (width, height, scale_factor) = logical_size(&window, window.inner_size());
        let viewport = Viewport::new(width, height, scale_factor);
        let surface_size = viewport.surface_size();
        let vsync = self.config.vsync;

        let window_clone = window.clone();
        let renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, surface_size, vsync).await
        })?;
        info!(
            "Surface {}x{} at pixel ratio {}",
            surface_size.width,
            surface_size.height,
            viewport.pixel_ratio()
        );

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        self.context = Some(ViewerContext::new(&self.config, viewport, &mut rng));
        self.render_engine = Some(renderer);

        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            error!("Failed to start viewer: {}", e);
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(render_engine), Some(context), Some(window)) = (
            self.render_engine.as_mut(),
            self.context.as_mut(),
            self.window.as_ref(),
        ) else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                } = &event
                {
                    self.render_loop.stop_token().stop();
                    event_loop.exit();
                    return;
                }
                context.controller.process_keyed_events(&event);
            }
            WindowEvent::Resized(size) => {
                let (width, height, scale_factor) = logical_size(window, size);
                context.on_resize(width, height, scale_factor, render_engine);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let (width, height, scale_factor) = logical_size(window, window.inner_size());
                context.on_resize(width, height, scale_factor, render_engine);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                context.controller.process_mouse_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                context.controller.process_scroll(&delta);
            }
            WindowEvent::CloseRequested => {
                self.render_loop.stop_token().stop();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                match self.render_loop.tick(context, render_engine) {
                    LoopStep::Continue => window.request_redraw(),
                    LoopStep::Stop => event_loop.exit(),
                }
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(context) = self.context.as_mut() {
            context.controller.process_events(&event);
        }
    }
}

/// Logical width, height and scale factor of `window` at physical `size`
fn logical_size(window: &Window, size: PhysicalSize<u32>) -> (f32, f32, f32) {
    let scale_factor = window.scale_factor();
    let logical: LogicalSize<f32> = size.to_logical(scale_factor);
    (logical.width, logical.height, scale_factor as f32)
}
