//! Loading of mesh, texture and font data from asset locations.
//!
//! Every fetch goes through an [`AssetSource`]. [`RemoteSource`] is the one
//! used by the application: `http(s)://` locations are fetched with `reqwest`,
//! anything else is read from the copy of `assets/` that `build.rs` places in
//! the build output (native) or from the page origin's `assets/` path (web).

use anyhow::{Context as _, anyhow, bail};
use base64::Engine as _;
use cgmath::{InnerSpace, Quaternion, Vector3};
use futures::{FutureExt, future::LocalBoxFuture};
use instant::Instant;

use crate::data_structures::{
    instance::Instance,
    model::ModelVertex,
    scene_graph::{AssetNode, LoadedAsset, MaterialData, MeshData},
    texture::decode_image,
};

pub mod cache;
pub mod font;
pub mod texture;

/// Fetches the raw bytes behind an asset location.
///
/// The returned future owns everything it needs so that the cache can share
/// it between callers.
pub trait AssetSource {
    fn fetch(&self, location: &str) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>>;
}

/// The build output's copy of the crate's `assets/` directory.
#[cfg(not(target_arch = "wasm32"))]
pub fn local_asset_root() -> std::path::PathBuf {
    std::path::Path::new(env!("OUT_DIR")).join("assets")
}

/// HTTP(S) for absolute URLs, the `assets/` directory for everything else.
#[derive(Clone, Debug)]
pub struct RemoteSource {
    client: reqwest::Client,
    #[cfg(not(target_arch = "wasm32"))]
    root: std::path::PathBuf,
}

impl RemoteSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            #[cfg(not(target_arch = "wasm32"))]
            root: local_asset_root(),
        }
    }

    /// Resolve local locations against `root` instead of [`local_asset_root`].
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_root(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            root: root.into(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl Default for RemoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetSource for RemoteSource {
    fn fetch(&self, location: &str) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
        let client = self.client.clone();
        if is_remote(location) {
            let url = location.to_string();
            return async move { fetch_url(&client, &url).await }.boxed_local();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let url = format_url(location);
            async move { fetch_url(&client, url?.as_str()).await }.boxed_local()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let path = self.root.join(location.trim_start_matches('/'));
            async move {
                tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("could not read {}", path.display()))
            }
            .boxed_local()
        }
    }
}

async fn fetch_url(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow!("could not read page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name.trim_start_matches('/'))?)
}

/// Resolve a URI found inside a document against the document's location.
pub fn resolve_uri(base: &str, uri: &str) -> anyhow::Result<String> {
    if uri.contains("://") {
        return Ok(uri.to_string());
    }
    if is_remote(base) {
        return Ok(reqwest::Url::parse(base)?.join(uri)?.to_string());
    }
    Ok(match base.rfind('/') {
        Some(i) => format!("{}{}", &base[..=i], uri),
        None => uri.to_string(),
    })
}

/// Decode a `data:` URI; only base64 payloads are accepted.
pub fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data URI without payload"))?;
    if !header.ends_with(";base64") {
        bail!("data URI is not base64 encoded");
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

async fn load_uri<S>(base: &str, uri: &str, source: &S) -> anyhow::Result<Vec<u8>>
where
    S: AssetSource + ?Sized,
{
    if uri.starts_with("data:") {
        return decode_data_uri(uri);
    }
    let location = resolve_uri(base, uri)?;
    source.fetch(&location).await
}

/// Fetch and decode a glTF document (JSON or GLB) into a CPU-side subtree.
///
/// Buffers may be the GLB blob, base64 `data:` URIs or URIs relative to
/// `location`. The default scene (or the first one) becomes the subtree root.
pub async fn load_model_gltf<S>(location: &str, source: &S) -> anyhow::Result<LoadedAsset>
where
    S: AssetSource + ?Sized,
{
    let start = Instant::now();
    let bytes = source.fetch(location).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)?;

    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| anyhow!("{location}: buffer {} has no GLB blob", buffer.index()))?,
            gltf::buffer::Source::Uri(uri) => load_uri(location, uri, source).await?,
        };
        if data.len() < buffer.length() {
            bail!(
                "{location}: buffer {} holds {} bytes, expected {}",
                buffer.index(),
                data.len(),
                buffer.length()
            );
        }
        buffers.push(data);
    }

    let mut images = Vec::new();
    for image in gltf.images() {
        let rgba = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let offset = view.offset();
                let end = offset + view.length();
                let data = buffers
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(offset..end))
                    .ok_or_else(|| anyhow!("{location}: image {} is out of range", image.index()))?;
                decode_image(data, mime_type.split('/').next_back())?
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                let data = load_uri(location, uri, source).await?;
                decode_image(&data, mime_type.and_then(|m| m.split('/').next_back()))?
            }
        };
        images.push(rgba);
    }

    let materials: Vec<MaterialData> = gltf
        .materials()
        .enumerate()
        .map(|(i, material)| {
            let pbr = material.pbr_metallic_roughness();
            MaterialData {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material{i}")),
                base_color: pbr.base_color_factor(),
                base_color_image: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("{location}: document contains no scene"))?;
    let mut root = AssetNode::container(scene.name().unwrap_or(location));
    for node in scene.nodes() {
        root.add_child(to_asset_node(location, node, &buffers)?);
    }

    let asset = LoadedAsset {
        location: location.to_string(),
        root,
        materials,
        images,
    };
    log::info!(
        "Loaded {location}: {} nodes, {} meshes in {:?}",
        asset.root.node_count(),
        asset.mesh_count(),
        start.elapsed()
    );
    Ok(asset)
}

fn to_asset_node(
    location: &str,
    node: gltf::Node<'_>,
    buffers: &[Vec<u8>],
) -> anyhow::Result<AssetNode> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let [x, y, z, w] = rotation;
    let local = Instance {
        position: translation.into(),
        rotation: Quaternion::new(w, x, y, z),
        scale: scale.into(),
    };

    let mut meshes = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "{location}: skipping non-triangle primitive {} of mesh {}",
                    primitive.index(),
                    mesh.index()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                bail!(
                    "{location}: index {bad} exceeds {} vertices in mesh {}",
                    positions.len(),
                    mesh.index()
                );
            }
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(normals) => normals.collect(),
                None => compute_normals(&positions, &indices),
            };
            let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
                Some(coords) => coords.into_f32().collect(),
                None => vec![[0.0; 2]; positions.len()],
            };
            let vertices = positions
                .iter()
                .enumerate()
                .map(|(i, position)| ModelVertex {
                    position: *position,
                    tex_coords: tex_coords.get(i).copied().unwrap_or_default(),
                    normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                })
                .collect();
            meshes.push(MeshData {
                name: mesh
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("mesh{}", mesh.index())),
                vertices,
                indices,
                material: primitive.material().index(),
            });
        }
    }

    let children = node
        .children()
        .map(|child| to_asset_node(location, child, buffers))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(AssetNode {
        name: node.name().map(str::to_string),
        local,
        meshes,
        children,
    })
}

/// Area-weighted smooth normals for primitives that ship without them.
fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(positions[i as usize]));
        let face = (b - a).cross(c - a);
        for &i in tri {
            sums[i as usize] += face;
        }
    }
    sums.into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

