// src/wgpu_utils/uniform_buffer.rs
use std::marker::PhantomData;

fn short_type_name<T>() -> &'static str {
    let type_name = std::any::type_name::<T>();
    match type_name.rfind(':') {
        Some(pos) => &type_name[(pos + 1)..],
        None => type_name,
    }
}

/// Typed uniform buffer that skips writes when the content is unchanged
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", short_type_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Update buffer content (skips the write if nothing changed)
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

/// Growable per-instance vertex buffer
pub struct InstanceBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    capacity: usize,
    len: usize,
}

impl<Content: bytemuck::Pod> InstanceBuffer<Content> {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        InstanceBuffer {
            buffer: Self::create(device, capacity),
            content_type: PhantomData,
            capacity,
            len: 0,
        }
    }

    fn create(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("InstanceBuffer<{}>", short_type_name::<Content>())),
            size: (capacity * std::mem::size_of::<Content>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Writes `data`, reallocating with doubled capacity if it does not fit
    pub fn update_data(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[Content]) {
        if data.len() > self.capacity {
            self.capacity = data.len().next_power_of_two();
            self.buffer = Self::create(device, self.capacity);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.len = data.len();
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
