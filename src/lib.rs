// src/lib.rs
//! orbitscape
//!
//! A small 3D viewer built on wgpu and winit: randomly placed spinning
//! toruses and cubes, optional extruded text, and an orbit camera.

pub mod app;
pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod gfx;
pub mod render_loop;
pub mod viewport;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::{Args, Preset, ViewerConfig};
pub use error::ViewerError;

/// Opens the viewer window and blocks until it is closed
pub fn run(config: ViewerConfig) -> Result<(), ViewerError> {
    ViewerApp::new(config)?.run()
}
