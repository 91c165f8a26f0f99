//! Render composition and pipeline batching.
//!
//! [`SceneRenderer`] owns the GPU copy of a [`ComposedScene`]: one [`Model`]
//! per asset location, an instance buffer with every visible placement of it,
//! the title mesh and the environment cube map. Parts are uploaded one by one
//! as their loads finish. Each frame it describes its draws as a [`Render`]
//! tree which is sorted into per-pipeline batches.
//!
//! # Key types
//!
//! - [`Render<'a>`] describes which pipeline draws what
//! - [`Instanced<'a>`] is a model plus its instance buffer

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::{Instance, InstanceRaw},
        model::{DrawModel, Model},
    },
    pipelines::skybox::EnvironmentResources,
    resources::texture::material_layout,
    scene::root::{ComposedScene, SceneUpdate, TitleText},
};

/// A model with the buffer holding its per-instance transforms.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// What to draw and with which pipeline.
///
/// - `None` renders nothing
/// - `Defaults(Vec<Instanced>)` renders environment-lit instanced models
/// - `Normal(Instanced)` renders a model coloured by its normals
/// - `Composed(Vec<Render>)` recursively renders a composition
pub enum Render<'a> {
    None,
    Defaults(Vec<Instanced<'a>>),
    Normal(Instanced<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(
        self,
        basics: &mut Vec<Instanced<'a>>,
        normals: &mut Vec<Instanced<'a>>,
    ) {
        match self {
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Normal(instanced) => normals.push(instanced),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(basics, normals)),
            Render::None => (),
        }
    }
}

fn instance_buffer(device: &wgpu::Device, label: &str, instances: &[Instance]) -> wgpu::Buffer {
    let raw: Vec<InstanceRaw> = instances.iter().map(Instance::to_raw).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} instances")),
        contents: bytemuck::cast_slice(&raw),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

/// An uploaded model and the placements it is drawn at.
pub struct GpuBatch {
    pub location: String,
    pub model: Model,
    pub instances: Vec<Instance>,
    pub instance_buffer: wgpu::Buffer,
}

impl GpuBatch {
    pub fn new(
        device: &wgpu::Device,
        location: impl Into<String>,
        model: Model,
        instances: Vec<Instance>,
    ) -> Self {
        let location = location.into();
        let instance_buffer = instance_buffer(device, &location, &instances);
        Self {
            location,
            model,
            instances,
            instance_buffer,
        }
    }

    /// Replace the placements, growing the buffer when needed.
    pub fn set_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: Vec<Instance>) {
        let raw: Vec<InstanceRaw> = instances.iter().map(Instance::to_raw).collect();
        let bytes: &[u8] = bytemuck::cast_slice(&raw);
        if bytes.len() as u64 <= self.instance_buffer.size() {
            queue.write_buffer(&self.instance_buffer, 0, bytes);
        } else {
            self.instance_buffer = instance_buffer(device, &self.location, &instances);
        }
        self.instances = instances;
    }

    fn instanced(&self) -> Instanced<'_> {
        Instanced {
            instance: &self.instance_buffer,
            model: &self.model,
            amount: self.instances.len(),
        }
    }
}

/// GPU state of the scene, filled in as its parts finish loading.
///
/// Until the environment arrives the background and lighting use a flat
/// placeholder cube map.
pub struct SceneRenderer {
    scene: ComposedScene,
    material_layout: wgpu::BindGroupLayout,
    batches: Vec<GpuBatch>,
    title: Option<GpuBatch>,
    environment: EnvironmentResources,
}

impl SceneRenderer {
    pub fn new(ctx: &Context) -> Self {
        Self {
            scene: ComposedScene::default(),
            material_layout: material_layout(&ctx.device),
            batches: Vec::new(),
            title: None,
            environment: EnvironmentResources::placeholder(&ctx.device, &ctx.queue),
        }
    }

    pub fn batches(&self) -> &[GpuBatch] {
        &self.batches
    }

    /// Upload a part of the scene that finished loading.
    pub fn apply(&mut self, ctx: &Context, update: SceneUpdate) {
        match update {
            SceneUpdate::Instance { slot, instance } => {
                let location = instance.location.clone();
                self.scene.apply(SceneUpdate::Instance { slot, instance });
                self.refresh_batch(ctx, &location);
            }
            SceneUpdate::Title(title) => {
                self.title = self.upload_title(ctx, &title);
                self.scene.apply(SceneUpdate::Title(title));
            }
            SceneUpdate::Environment(faces) => {
                self.environment = EnvironmentResources::new(&ctx.device, &ctx.queue, &faces);
                log::info!("Uploaded environment");
            }
        }
    }

    fn refresh_batch(&mut self, ctx: &Context, location: &str) {
        let Some(batch) = self.scene.batch(location) else {
            return;
        };
        match self.batches.iter_mut().find(|b| b.location == location) {
            Some(gpu) => gpu.set_instances(&ctx.device, &ctx.queue, batch.transforms),
            None => {
                let model =
                    Model::from_asset(&ctx.device, &ctx.queue, batch.asset, &self.material_layout);
                self.batches
                    .push(GpuBatch::new(&ctx.device, location, model, batch.transforms));
                log::info!("Uploaded {location}");
            }
        }
    }

    fn upload_title(&self, ctx: &Context, title: &TitleText) -> Option<GpuBatch> {
        if title.geometry.is_empty() {
            log::warn!("Title {:?} produced no geometry", title.element.text);
            return None;
        }
        let model = Model::from_geometry(
            &ctx.device,
            &ctx.queue,
            &title.element.text,
            &title.geometry.vertices,
            &title.geometry.indices,
            &self.material_layout,
        );
        Some(GpuBatch::new(
            &ctx.device,
            "title",
            model,
            vec![title.placement.transform()],
        ))
    }

    pub fn on_render(&self) -> Render<'_> {
        let models = Render::Defaults(self.batches.iter().map(GpuBatch::instanced).collect());
        let title = match &self.title {
            Some(title) => Render::Normal(title.instanced()),
            None => Render::None,
        };
        Render::Composed(vec![models, title])
    }
    /// Record the frame: background first, then the models, then the title.
    pub fn draw(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&ctx.pipelines.skybox);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(1, &self.environment.bind_group, &[]);
        render_pass.draw(0..3, 0..1);

        let mut basics: Vec<Instanced> = Vec::new();
        let mut normals: Vec<Instanced> = Vec::new();
        self.on_render().set_pipelines(&mut basics, &mut normals);

        render_pass.set_pipeline(&ctx.pipelines.basic);
        for instanced in basics {
            if instanced.amount == 0 || instanced.instance.size() == 0 {
                log::warn!("you attempted to render something with zero instances");
                continue;
            }
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_model_instanced(
                instanced.model,
                0..instanced.amount as u32,
                &ctx.camera.bind_group,
                &self.environment.bind_group,
            );
        }

        render_pass.set_pipeline(&ctx.pipelines.normal);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        for instanced in normals {
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            for mesh in &instanced.model.meshes {
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.num_elements, 0, 0..instanced.amount as u32);
            }
        }
    }
}
