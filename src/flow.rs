//! Application event loop.
//!
//! [`run`] opens the window (the `canvas` element on the web) and drives the
//! scene through winit's [`ApplicationHandler`].
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the GPU context; natively that is
//!    blocked on, on the web it is spawned and arrives as
//!    `FlowEvent::Initialized`
//! 2. the scene then loads off the event loop: every model, the title and the
//!    environment are independent loads, and each one that finishes arrives as
//!    a [`FlowEvent::Loaded`] and is uploaded on its own
//! 3. window events feed the orbit controls
//! 4. each redraw advances the camera, records what has loaded and presents

use std::{fmt::Debug, iter, sync::Arc};

use futures::{StreamExt, future};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::texture::Texture,
    render::SceneRenderer,
    resources::{
        RemoteSource,
        cache::{AssetCache, prefetch},
    },
    scene::root::{PageChrome, SceneRoot, SceneUpdate},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// GPU context, uploaded scene and surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    renderer: SceneRenderer,
    is_surface_configured: bool,
}

impl Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ctx", &self.ctx)
            .field("models", &self.renderer.batches().len())
            .field("is_surface_configured", &self.is_surface_configured)
            .finish()
    }
}

impl AppState {
    async fn new(window: Arc<Window>, root: &SceneRoot) -> anyhow::Result<Self> {
        let ctx = Context::new(window, &root.camera, root.controls).await?;
        let renderer = SceneRenderer::new(&ctx);
        Ok(Self {
            ctx,
            renderer,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(&mut self) {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return;
        }

        self.ctx.camera.update(&self.ctx.queue, &self.ctx.projection);

        let (output, suboptimal) = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output) => (output, false),
            wgpu::CurrentSurfaceTexture::Suboptimal(output) => (output, true),
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => {
                return;
            }
            // Reconfigure the surface if it's lost or outdated
            wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                self.reconfigure();
                return;
            }
            wgpu::CurrentSurfaceTexture::Validation => {
                log::error!("Unable to render: the surface texture failed validation");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            self.renderer.draw(&self.ctx, &mut render_pass);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        if suboptimal {
            self.reconfigure();
        }
    }

    fn reconfigure(&mut self) {
        let size = self.ctx.window.inner_size();
        self.resize(size.width, size.height);
    }
}

pub(crate) enum FlowEvent {
    /// The GPU context is ready; sent by the web's spawned initialisation.
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<AppState>),
    Loaded(SceneUpdate),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(state) => f.debug_tuple("Initialized").field(state).finish(),
            Self::Loaded(update) => f.debug_tuple("Loaded").field(update).finish(),
        }
    }
}

/// Load the scene, forwarding every part to the event loop as it finishes.
///
/// Prefetch runs alongside the per-instance loads and shares their cache, so
/// each location is still fetched once.
async fn load_scene(root: SceneRoot, proxy: EventLoopProxy<FlowEvent>) {
    let cache = AssetCache::new(RemoteSource::new());
    let forward = root.updates(&cache).for_each(|update| {
        if proxy.send_event(FlowEvent::Loaded(update)).is_err() {
            log::warn!("Event loop closed while the scene was loading");
        }
        future::ready(())
    });
    future::join(prefetch(&root.registry, &cache), forward).await;
    log::info!("Scene loading settled");
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    // Taken once the window exists.
    root: Option<SceneRoot>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, root: SceneRoot) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            root: Some(root),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("Unable to start the scene: {error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    /// Run [`load_scene`] on the runtime's blocking pool so that no fetch can
    /// block the event loop.
    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_loader(&self, root: SceneRoot) {
        let handle = self.async_runtime.handle().clone();
        let proxy = self.proxy.clone();
        self.async_runtime
            .spawn_blocking(move || handle.block_on(load_scene(root, proxy)));
    }

    /// Return the startup error, if any, without waiting for pending loads.
    fn finish(self) -> anyhow::Result<()> {
        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.shutdown_background();
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(root) = self.root.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&root.chrome.instruction);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            if let Err(e) = mount_chrome(&document, &canvas, &root.chrome) {
                log::error!("Unable to add the page text: {e:?}");
            }
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }
        #[cfg(not(target_arch = "wasm32"))]
        log_chrome(&root.chrome);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(AppState::new(window, &root)) {
                Ok(mut app_state) => {
                    let size = app_state.ctx.window.inner_size();
                    app_state.resize(size.width, size.height);
                    app_state.ctx.window.request_redraw();
                    self.state = Some(app_state);
                    self.spawn_loader(root);
                }
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match AppState::new(window, &root).await {
                    Ok(app_state) => {
                        if proxy
                            .send_event(FlowEvent::Initialized(Box::new(app_state)))
                            .is_err()
                        {
                            log::error!("Event loop closed before the scene was ready");
                            return;
                        }
                        load_scene(root, proxy).await;
                    }
                    Err(e) => log::error!("Unable to start the scene: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            FlowEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                let app_state = self.state.insert(*state);

                // Trigger a resize and redraw now that we are initialized
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
                app_state.ctx.window.request_redraw();
            }
            FlowEvent::Loaded(update) => match &mut self.state {
                Some(state) => {
                    state.renderer.apply(&state.ctx, update);
                    state.ctx.window.request_redraw();
                }
                None => log::warn!("Dropping {update:?}: the GPU context is not ready"),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        let ctx = &mut state.ctx;
        ctx.camera.controls.handle_window_event(
            &event,
            &ctx.camera.camera,
            &ctx.projection,
            ctx.config.height,
        );

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => state.render(),
            _ => {}
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn log_chrome(chrome: &PageChrome) {
    log::info!("{}", chrome.instruction);
    log::info!("{} ({})", chrome.footer(), chrome.mailto());
}

/// Put the instruction above the canvas and the contact footer below it.
#[cfg(target_arch = "wasm32")]
fn mount_chrome(
    document: &web_sys::Document,
    canvas: &web_sys::Element,
    chrome: &PageChrome,
) -> Result<(), JsValue> {
    let parent = canvas
        .parent_node()
        .ok_or_else(|| JsValue::from_str("canvas has no parent"))?;

    let instruction = document.create_element("p")?;
    instruction.set_class_name("instruction");
    instruction.set_text_content(Some(&chrome.instruction));
    parent.insert_before(&instruction, Some(canvas))?;

    let footer = document.create_element("footer")?;
    footer.set_text_content(Some(&format!("{} ", chrome.contact_label)));
    let link = document.create_element("a")?;
    link.set_attribute("href", &chrome.mailto())?;
    link.set_text_content(Some(&chrome.contact_email));
    footer.append_child(&link)?;
    parent.insert_before(&footer, canvas.next_sibling().as_ref())?;
    Ok(())
}

/// Open the window and run the portfolio scene until it is closed.
pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, SceneRoot::portfolio())?;

    event_loop.run_app(&mut app)?;
    app.finish()
}
