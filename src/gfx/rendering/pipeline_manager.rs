//! Render pipeline management system for wgpu
//!
//! Pipelines are registered by name with a [`PipelineConfig`] and created
//! lazily, or all at once with [`PipelineManager::create_all_pipelines`].

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use super::instanced_renderer::InstanceData;
use super::vertex::Vertex3D;
use super::RenderError;

/// Which vertex buffers a pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInput {
    /// Mesh vertices only
    Mesh,
    /// Mesh vertices plus per-instance model matrices
    Instanced,
}

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub vs_entry: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub vertex_input: VertexInput,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "shader.wgsl".to_string(),
            vs_entry: "vs_main".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_format: None,
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            vertex_input: VertexInput::Mesh,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    pub fn with_vertex_entry(mut self, entry: &str) -> Self {
        self.vs_entry = entry.to_string();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a buffer of `format`
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Renders into a single target of `format` without blending
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];
        self
    }

    pub fn with_vertex_input(mut self, input: VertexInput) -> Self {
        self.vertex_input = input;
        self
    }
}

/// Manages render pipelines with caching and lazy creation
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a pipeline configuration without creating it
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Compiles a WGSL shader module under `name`
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    /// Returns a created pipeline
    pub fn get_pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Creates all pending pipelines, collecting the names that failed
    pub fn create_all_pipelines(&mut self) -> Result<(), Vec<RenderError>> {
        let mut errors = Vec::new();
        let pending = std::mem::take(&mut self.pending_pipelines);

        for name in pending {
            let Some(config) = self.pipeline_configs.get(&name).cloned() else {
                continue;
            };
            match self.create_pipeline_from_config(&config) {
                Ok(pipeline) => {
                    log::debug!("Created pipeline '{}'", name);
                    self.pipelines.insert(name, pipeline);
                }
                Err(e) => {
                    self.pending_pipelines.push(name);
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn create_pipeline_from_config(&self, config: &PipelineConfig) -> Result<RenderPipeline, RenderError> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| RenderError::MissingShader(config.shader.clone()))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", config.label)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let mesh_only = [Vertex3D::desc()];
        let instanced = [Vertex3D::desc(), InstanceData::vertex_buffer_layout()];
        let vertex_buffers: &[VertexBufferLayout] = match config.vertex_input {
            VertexInput::Mesh => &mesh_only,
            VertexInput::Instanced => &instanced,
        };

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some(&config.vs_entry),
                    buffers: vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        Ok(pipeline)
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }
}
