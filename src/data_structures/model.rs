//! GPU models, meshes and materials.
//!
//! A [`Model`] is the uploaded form of one [`LoadedAsset`]: node transforms
//! are baked into the vertices so that every mesh of the asset is drawn with
//! the same per-instance matrix.

use std::ops::Range;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};
use wgpu::util::DeviceExt;

use crate::data_structures::{scene_graph::LoadedAsset, texture::Texture};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    base_color: [f32; 4],
}

/// Base-colour texture plus factor, bound at group 0 of the model pipeline.
pub struct Material {
    pub name: String,
    pub diffuse_texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Texture,
        base_color: [f32; 4],
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let factor = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} base colour")),
            contents: bytemuck::cast_slice(&[MaterialUniform { base_color }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let sampler = diffuse_texture
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: factor.as_entire_binding(),
                },
            ],
            label: Some(name),
        });

        Self {
            name: String::from(name),
            diffuse_texture,
            bind_group,
        }
    }
}

pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

impl Mesh {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
        material: usize,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
            material,
        }
    }
}

pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Model {
    /// Upload a decoded asset.
    ///
    /// Meshes without a material use an extra white material appended after
    /// the asset's own.
    pub fn from_asset(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        asset: &LoadedAsset,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let textures: Vec<Texture> = asset
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| {
                let label = format!("{}#image{i}", asset.location);
                Texture::from_rgba(device, queue, image, Some(&label), false)
            })
            .collect();

        let mut materials: Vec<Material> = asset
            .materials
            .iter()
            .map(|data| {
                let texture = match data.base_color_image.and_then(|i| textures.get(i)) {
                    Some(texture) => texture.clone(),
                    None => Texture::solid_colour([255; 4], device, queue, &data.name),
                };
                Material::new(device, &data.name, texture, data.base_color, layout)
            })
            .collect();
        let fallback = materials.len();
        materials.push(Material::new(
            device,
            "default",
            Texture::solid_colour([255; 4], device, queue, "default"),
            [1.0; 4],
            layout,
        ));

        let meshes = asset
            .world_meshes()
            .into_iter()
            .filter(|(_, mesh)| !mesh.indices.is_empty())
            .map(|(world, mesh)| {
                let (vertices, indices) = bake_transform(world, &mesh.vertices, &mesh.indices);
                let material = mesh.material.filter(|m| *m < fallback).unwrap_or(fallback);
                Mesh::new(device, &mesh.name, &vertices, &indices, material)
            })
            .collect();

        Self { meshes, materials }
    }

    /// Upload a single untextured mesh.
    pub fn from_geometry(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let material = Material::new(
            device,
            name,
            Texture::solid_colour([255; 4], device, queue, name),
            [1.0; 4],
            layout,
        );
        Self {
            meshes: vec![Mesh::new(device, name, vertices, indices, 0)],
            materials: vec![material],
        }
    }
}

/// Transform vertices into the asset root's space.
///
/// Mirroring transforms flip the winding so front faces stay counter-clockwise.
pub fn bake_transform(
    world: Matrix4<f32>,
    vertices: &[ModelVertex],
    indices: &[u32],
) -> (Vec<ModelVertex>, Vec<u32>) {
    let linear = Matrix3::from_cols(
        world.x.truncate(),
        world.y.truncate(),
        world.z.truncate(),
    );
    let normal_matrix = linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear);

    let vertices = vertices
        .iter()
        .map(|v| {
            let p = world * Vector4::new(v.position[0], v.position[1], v.position[2], 1.0);
            let n = normal_matrix * Vector3::from(v.normal);
            let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
            ModelVertex {
                position: p.truncate().into(),
                tex_coords: v.tex_coords,
                normal: n.into(),
            }
        })
        .collect();

    let indices = if linear.determinant() < 0.0 {
        indices
            .chunks_exact(3)
            .flat_map(|tri| [tri[0], tri[2], tri[1]])
            .collect()
    } else {
        indices.to_vec()
    };
    (vertices, indices)
}

pub trait DrawModel {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        environment_bind_group: &wgpu::BindGroup,
    );

    fn draw_model_instanced(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        environment_bind_group: &wgpu::BindGroup,
    );
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        environment_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, environment_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &Model,
        instances: Range<u32>,
        camera_bind_group: &wgpu::BindGroup,
        environment_bind_group: &wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh_instanced(
                mesh,
                material,
                instances.clone(),
                camera_bind_group,
                environment_bind_group,
            );
        }
    }
}
