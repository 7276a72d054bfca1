//! WGPU-based rendering engine
//!
//! Owns the surface, device, queue, depth buffer and one normal-shading
//! pipeline in two flavours: instanced for shape batches and static for the
//! text mesh.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::ViewerError;
use crate::gfx::{
    camera::{CameraUniform, OrbitCamera},
    resources::TextureResource,
    scene::{Scene, ShapeKind},
};
use crate::render_loop::FrameRenderer;
use crate::viewport::SurfaceSize;
use crate::wgpu_utils::UniformBuffer;

use super::instanced_renderer::{GpuMesh, InstanceData, MeshBatch};
use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexInput};
use super::RenderError;

const SHAPES_PIPELINE: &str = "Shapes";
const TEXT_PIPELINE: &str = "Text";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    camera_ubo: UniformBuffer<CameraUniform>,
    camera_bind_group: wgpu::BindGroup,
    batches: BTreeMap<ShapeKind, MeshBatch>,
    text_mesh: Option<GpuMesh>,
    instance_scratch: Vec<InstanceData>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `size` - Initial surface size in physical pixels
    /// * `vsync` - Present with `Fifo` instead of the fastest supported mode
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: SurfaceSize,
        vsync: bool,
    ) -> Result<RenderEngine, ViewerError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(ViewerError::UnsupportedSurface)?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = choose_present_mode(&surface_capabilities.present_modes, vsync);
        debug!("Presenting with {:?}", present_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let camera_ubo = UniformBuffer::<CameraUniform>::new(&device);
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.binding_resource(),
            }],
        });

        let batches = ShapeKind::ALL
            .iter()
            .map(|kind| {
                let batch = MeshBatch::new(&device, &kind.geometry(), kind.label(), 128);
                (*kind, batch)
            })
            .collect();

        // Wrap device and queue in Arc for pipeline manager
        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());

        pipeline_manager.load_shader("normal", include_str!("normal.wgsl"));

        pipeline_manager.register_pipeline(
            SHAPES_PIPELINE,
            PipelineConfig::default()
                .with_label("SHAPES")
                .with_shader("normal")
                .with_vertex_entry("vs_instanced")
                .with_vertex_input(VertexInput::Instanced)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_color_format(format)
                .with_bind_group_layouts(vec![camera_layout.clone()]),
        );
        pipeline_manager.register_pipeline(
            TEXT_PIPELINE,
            PipelineConfig::default()
                .with_label("TEXT")
                .with_shader("normal")
                .with_vertex_entry("vs_static")
                .with_vertex_input(VertexInput::Mesh)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_color_format(format)
                .with_bind_group_layouts(vec![camera_layout]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for e in errors {
                warn!("Pipeline creation failed: {}", e);
            }
        }

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            depth_texture,
            pipeline_manager,
            camera_ubo,
            camera_bind_group,
            batches,
            text_mesh: None,
            instance_scratch: Vec::new(),
        })
    }

    /// Uploads what changed in the scene since the last frame
    fn sync_scene(&mut self, scene: &Scene) {
        for (kind, batch) in self.batches.iter_mut() {
            self.instance_scratch.clear();
            self.instance_scratch
                .extend(scene.model_matrices(*kind).map(InstanceData::from_transform));
            batch.update_instances(&self.device, &self.queue, &self.instance_scratch);
        }

        if self.text_mesh.is_none() {
            if let Some(text) = scene.text() {
                if !text.geometry.is_empty() {
                    debug!("Uploading text mesh for {:?}", text.value);
                    self.text_mesh = Some(GpuMesh::new(&self.device, &text.geometry, "Text"));
                }
            }
        }
    }

    fn draw(&mut self, scene: &Scene, camera: &OrbitCamera) -> Result<(), RenderError> {
        self.camera_ubo.update_content(&self.queue, camera.uniform);
        self.sync_scene(scene);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(e) => {
                if matches!(e, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                    self.surface.configure(&self.device, &self.config);
                }
                return Err(e.into());
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(SHAPES_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                for batch in self.batches.values() {
                    batch.render(&mut render_pass);
                }
            }

            if let (Some(mesh), Some(pipeline)) = (
                self.text_mesh.as_ref(),
                self.pipeline_manager.get_pipeline(TEXT_PIPELINE),
            ) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero-sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if self.config.width == width && self.config.height == height {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
        debug!("Surface resized to {}x{}", width, height);
    }
}

impl FrameRenderer for RenderEngine {
    fn set_surface_size(&mut self, size: SurfaceSize) {
        self.resize(size.width, size.height);
    }

    fn render(&mut self, scene: &Scene, camera: &OrbitCamera) -> Result<(), RenderError> {
        self.draw(scene, camera)
    }
}

/// Picks a present mode the surface supports
///
/// `Fifo` is guaranteed by every backend. Without vsync the lowest-latency
/// listed mode wins.
fn choose_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::PresentMode;

    #[test]
    fn test_vsync_always_uses_fifo() {
        let available = [PresentMode::Immediate, PresentMode::Fifo];
        assert_eq!(choose_present_mode(&available, true), PresentMode::Fifo);
    }

    #[test]
    fn test_immediate_used_only_when_listed() {
        let all = [PresentMode::Fifo, PresentMode::Mailbox, PresentMode::Immediate];
        assert_eq!(choose_present_mode(&all, false), PresentMode::Immediate);

        // Typical Wayland compositor
        let wayland = [PresentMode::Fifo, PresentMode::Mailbox];
        assert_eq!(choose_present_mode(&wayland, false), PresentMode::Mailbox);

        let fifo_only = [PresentMode::Fifo];
        assert_eq!(choose_present_mode(&fifo_only, false), PresentMode::Fifo);
        assert_eq!(choose_present_mode(&[], false), PresentMode::Fifo);
    }
}
