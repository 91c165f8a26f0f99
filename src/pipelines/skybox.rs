use crate::{
    data_structures::texture::Texture,
    pipelines::basic::{depth_state, mk_render_pipeline},
    resources::texture::environment_layout,
};

/// The uploaded environment cube map, shared by the skybox and model lighting.
#[derive(Debug)]
pub struct EnvironmentResources {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl EnvironmentResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, faces: &[image::RgbaImage; 6]) -> Self {
        let texture = Texture::create_cube_map(device, queue, faces, "environment");
        Self::from_texture(device, texture)
    }

    /// Flat grey faces shown until the real environment is loaded.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let face = image::RgbaImage::from_pixel(1, 1, image::Rgba([40, 40, 48, 255]));
        Self::new(device, queue, &std::array::from_fn(|_| face.clone()))
    }

    fn from_texture(device: &wgpu::Device, texture: Texture) -> Self {
        let bind_group_layout = environment_layout(device);
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("environment_bind_group"),
        });
        Self {
            texture,
            bind_group,
            bind_group_layout,
        }
    }
}

/// Background pass: no vertex buffers, no depth writes.
pub fn mk_skybox_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    environment_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Skybox Pipeline Layout"),
        bind_group_layouts: &[
            Some(camera_bind_group_layout),
            Some(environment_bind_group_layout),
        ],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Skybox Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("skybox_shader.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        None,
        Some(depth_state(false, wgpu::CompareFunction::Always)),
        None,
        &[],
        shader,
    )
}
