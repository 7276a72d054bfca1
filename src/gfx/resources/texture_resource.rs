//! Texture resource management for wgpu
//!
//! The viewer only needs one texture of its own: the depth buffer, which has to
//! be recreated whenever the surface is resized.

/// GPU texture together with its default view
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl TextureResource {
    /// Standard depth buffer format used throughout the engine
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth texture matching the surface configuration
    ///
    /// # Arguments
    /// * `device` - WGPU device for creating resources
    /// * `config` - Surface configuration to match dimensions
    /// * `label` - Debug label for the texture
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}
