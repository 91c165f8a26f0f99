//! CPU-side scene subtree of a loaded model document.
//!
//! A [`LoadedAsset`] is decoded once per location and shared by every instance
//! placed in the scene. Nothing here touches the GPU; the renderer flattens the
//! tree with [`LoadedAsset::world_meshes`] when it uploads the model.

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::{instance::Instance, model::ModelVertex};

/// A triangle list with the index of its material in [`LoadedAsset::materials`].
#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    /// Index into [`LoadedAsset::images`].
    pub base_color_image: Option<usize>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0; 4],
            base_color_image: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AssetNode {
    pub name: Option<String>,
    pub local: Instance,
    pub meshes: Vec<MeshData>,
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn add_child(&mut self, child: AssetNode) {
        self.children.push(child);
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(AssetNode::node_count)
            .sum::<usize>()
    }

    /// Depth-first search by node name.
    pub fn find(&self, name: &str) -> Option<&AssetNode> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    fn collect_world_meshes<'a>(
        &'a self,
        parent: Matrix4<f32>,
        out: &mut Vec<(Matrix4<f32>, &'a MeshData)>,
    ) {
        let world = parent * self.local.to_matrix();
        out.extend(self.meshes.iter().map(|mesh| (world, mesh)));
        for child in &self.children {
            child.collect_world_meshes(world, out);
        }
    }
}

/// The decoded, immutable content behind one asset location.
#[derive(Clone, Debug)]
pub struct LoadedAsset {
    pub location: String,
    pub root: AssetNode,
    pub materials: Vec<MaterialData>,
    pub images: Vec<image::RgbaImage>,
}

impl LoadedAsset {
    /// Every mesh paired with its node's transform relative to the asset root.
    pub fn world_meshes(&self) -> Vec<(Matrix4<f32>, &MeshData)> {
        let mut out = Vec::new();
        self.root.collect_world_meshes(Matrix4::identity(), &mut out);
        out
    }

    pub fn mesh_count(&self) -> usize {
        self.world_meshes().len()
    }
}
