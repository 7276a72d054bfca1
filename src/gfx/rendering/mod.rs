// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, instanced shape batches and frame rendering.

use thiserror::Error;

pub mod instanced_renderer;
pub mod pipeline_manager;
pub mod render_engine;
pub mod vertex;

// Re-export main types
pub use instanced_renderer::{GpuMesh, InstanceData, MeshBatch};
pub use pipeline_manager::{PipelineConfig, PipelineManager, VertexInput};
pub use render_engine::RenderEngine;
pub use vertex::Vertex3D;

/// Per-frame rendering failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Surface was lost or outdated and has been reconfigured
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("shader module '{0}' is not loaded")]
    MissingShader(String),
    #[error("render failed: {0}")]
    Other(String),
}

impl RenderError {
    /// Whether the frame can simply be skipped
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::SurfaceLost | RenderError::Timeout)
    }

    /// Whether rendering cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::OutOfMemory)
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(error: wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            #[allow(unreachable_patterns)]
            other => RenderError::Other(other.to_string()),
        }
    }
}
