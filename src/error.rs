//! Startup errors of the viewer

use thiserror::Error;

/// Failure to bring up the window, GPU or configuration
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture format")]
    UnsupportedSurface,
    #[error("failed to create window: {0}")]
    CreateWindow(#[from] winit::error::OsError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
