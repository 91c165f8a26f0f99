use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use anyhow::anyhow;
use base64::Engine as _;
use futures::{FutureExt, future::LocalBoxFuture};
use portfolio_scene::{resources::AssetSource, scene::registry::ModelRegistry};
use serde_json::json;

/// In-memory asset source that counts how often each location is fetched.
#[derive(Default)]
pub(crate) struct CountingSource {
    files: HashMap<String, Vec<u8>>,
    stalled: HashSet<String>,
    fetches: RefCell<HashMap<String, usize>>,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(location.to_string(), bytes.into());
        self
    }

    /// Fetches of `location` never finish.
    pub fn stall(mut self, location: &str) -> Self {
        self.stalled.insert(location.to_string());
        self
    }

    pub fn fetches(&self, location: &str) -> usize {
        self.fetches.borrow().get(location).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.borrow().values().sum()
    }
}

impl AssetSource for CountingSource {
    fn fetch(&self, location: &str) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
        *self
            .fetches
            .borrow_mut()
            .entry(location.to_string())
            .or_default() += 1;
        if self.stalled.contains(location) {
            return futures::future::pending().boxed_local();
        }
        let result = self
            .files
            .get(location)
            .cloned()
            .ok_or_else(|| anyhow!("{location}: not found"));
        async move { result }.boxed_local()
    }
}

fn triangle_bytes() -> Vec<u8> {
    [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        .iter()
        .flatten()
        .flat_map(|f| f.to_le_bytes())
        .collect()
}

fn triangle_document(scene: &str, buffer_uri: &str) -> Vec<u8> {
    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": scene, "nodes": [0] }],
        "nodes": [{ "name": "root", "mesh": 0, "translation": [0.0, 1.0, 0.0] }],
        "meshes": [{ "name": "triangle", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{ "byteLength": 36, "uri": buffer_uri }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    })
    .to_string()
    .into_bytes()
}

/// A one-triangle glTF document with its buffer inlined as a data URI.
pub(crate) fn triangle_gltf(scene: &str) -> Vec<u8> {
    let payload = base64::engine::general_purpose::STANDARD.encode(triangle_bytes());
    triangle_document(
        scene,
        &format!("data:application/octet-stream;base64,{payload}"),
    )
}

/// A one-triangle glTF document and the external buffer it points at.
pub(crate) fn triangle_gltf_external(scene: &str, buffer_uri: &str) -> (Vec<u8>, Vec<u8>) {
    (triangle_document(scene, buffer_uri), triangle_bytes())
}

/// A typeface with a square `A`, a ring shaped `O` and a `?`.
pub(crate) fn typeface_json() -> Vec<u8> {
    json!({
        "glyphs": {
            "A": { "ha": 120, "o": "m 0 0 l 100 0 l 100 100 l 0 100 z" },
            "O": { "ha": 120, "o": "m 0 0 l 100 0 l 100 100 l 0 100 m 25 25 l 25 75 l 75 75 l 75 25" },
            "?": { "ha": 60, "o": "m 0 0 l 50 0 l 50 50 l 0 50" },
            " ": { "ha": 50, "o": "" }
        },
        "familyName": "Test Sans",
        "resolution": 100,
        "boundingBox": { "yMin": -20, "yMax": 100, "xMin": 0, "xMax": 120 },
        "underlineThickness": 10
    })
    .to_string()
    .into_bytes()
}

/// A registry whose every model points at the same in-memory location.
pub(crate) fn registry_of(names: &[&str], location: &str) -> ModelRegistry {
    ModelRegistry::new(names.iter().map(|name| (*name, location)))
}

/// Source serving every portfolio model, the title font and nothing else.
pub(crate) fn portfolio_source() -> CountingSource {
    let mut source = CountingSource::new().with("/chocolate_bar_regular.json", typeface_json());
    for (name, location) in ModelRegistry::global().iter() {
        source = source.with(location, triangle_gltf(name));
    }
    source
}
