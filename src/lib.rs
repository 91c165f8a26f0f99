//! portfolio-scene
//!
//! An interactive 3D landing page: glTF props placed around a walled
//! courtyard, an extruded title, a cube-map sky and orbit controls. Runs
//! natively and in the browser (WebGL through wgpu).
//!
//! High-level modules
//! - `camera`: orbit camera, controls, projection and uniforms
//! - `context`: GPU and window context that owns device/queue/pipelines
//! - `data_structures`: instances, GPU models, textures and decoded assets
//! - `error`: domain error types
//! - `flow`: the event loop and application lifecycle
//! - `pipelines`: the model, skybox and title pipelines
//! - `render`: uploads the composed scene and records its draws
//! - `resources`: asset sources, glTF/image/font loading and the asset cache
//! - `scene`: registry, named models, layout and the scene root
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use error::{SceneError, SharedLoadError};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    flow::run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
