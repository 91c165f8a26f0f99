//! Render pipelines.
//!
//! - `basic` draws the glTF models, lit by the environment
//! - `skybox` draws the environment cube behind everything
//! - `normal` draws the title text with normal-based colours

pub mod basic;
pub mod normal;
pub mod skybox;

use crate::resources::texture::environment_layout;

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
    pub normal: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let environment_bind_group_layout = environment_layout(device);
        Self {
            basic: basic::mk_basic_pipeline(
                device,
                config,
                camera_bind_group_layout,
                &environment_bind_group_layout,
            ),
            skybox: skybox::mk_skybox_pipeline(
                device,
                config,
                camera_bind_group_layout,
                &environment_bind_group_layout,
            ),
            normal: normal::mk_normal_pipeline(device, config, camera_bind_group_layout),
        }
    }
}
