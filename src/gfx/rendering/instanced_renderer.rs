//! Instanced rendering of shape batches
//!
//! Every shape kind owns one mesh and one instance buffer. Each frame the
//! model matrices of all shapes of that kind are rewritten and drawn with a
//! single indexed draw call.

use bytemuck::{Pod, Zeroable};
use cgmath::Matrix4;
use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, Queue, RenderPass};

use crate::gfx::geometry::GeometryData;
use crate::wgpu_utils::InstanceBuffer;

/// Per-instance data: the model matrix
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub transform: [[f32; 4]; 4],
}

impl InstanceData {
    pub fn from_transform(transform: Matrix4<f32>) -> Self {
        Self {
            transform: transform.into(),
        }
    }

    /// Get vertex buffer layout for instance data
    pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Transform matrix (4 vec4s)
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2, // After position(0) and normal(1)
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Mesh uploaded to the GPU
pub struct GpuMesh {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &Device, geometry: &GeometryData, label: &str) -> Self {
        let vertices = geometry.to_vertices();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }
}

/// One mesh drawn many times
pub struct MeshBatch {
    mesh: GpuMesh,
    instances: InstanceBuffer<InstanceData>,
}

impl MeshBatch {
    pub fn new(device: &Device, geometry: &GeometryData, label: &str, capacity: usize) -> Self {
        Self {
            mesh: GpuMesh::new(device, geometry, label),
            instances: InstanceBuffer::new(device, capacity),
        }
    }

    /// Replace instance data for the next draw
    pub fn update_instances(&mut self, device: &Device, queue: &Queue, instances: &[InstanceData]) {
        self.instances.update_data(device, queue, instances);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Render all instances in a single draw call
    pub fn render(&self, render_pass: &mut RenderPass<'_>) {
        if self.instances.is_empty() || self.mesh.index_count == 0 {
            return;
        }

        render_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instances.buffer().slice(..));
        render_pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.mesh.index_count, 0, 0..self.instance_count());
    }
}
