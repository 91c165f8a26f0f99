//! Turning asset locations into placed scene instances.

use std::sync::Arc;

use crate::{
    data_structures::{instance::Instance, scene_graph::LoadedAsset},
    resources::{AssetSource, cache::AssetCache},
    scene::{
        models::ModelSpawn,
        placement::{DisplayOptions, Placement},
        registry::ModelRegistry,
    },
};

/// One placed copy of a loaded asset.
///
/// The asset is shared with every other instance of the same location; the
/// placement belongs to this instance alone.
#[derive(Clone, Debug)]
pub struct SceneInstance {
    pub location: String,
    pub asset: Arc<LoadedAsset>,
    pub placement: Placement,
    pub display: DisplayOptions,
}

impl SceneInstance {
    pub fn transform(&self) -> Instance {
        self.placement.transform()
    }

    pub fn is_visible(&self) -> bool {
        self.display.visible
    }
}

pub struct ModelInstantiator<'a, S: AssetSource + 'static> {
    registry: &'a ModelRegistry,
    cache: &'a AssetCache<S>,
}

impl<'a, S: AssetSource + 'static> ModelInstantiator<'a, S> {
    pub fn new(registry: &'a ModelRegistry, cache: &'a AssetCache<S>) -> Self {
        Self { registry, cache }
    }

    /// Load (or reuse) the asset at `location` and place it.
    ///
    /// Loader errors are returned as the cache reports them.
    pub async fn instantiate(
        &self,
        location: &str,
        placement: Placement,
        display: DisplayOptions,
    ) -> anyhow::Result<SceneInstance> {
        let asset = self.cache.load(location).await?;
        Ok(SceneInstance {
            location: location.to_string(),
            asset,
            placement,
            display,
        })
    }

    /// Resolve `name` through the registry first.
    pub async fn instantiate_named(
        &self,
        name: &str,
        placement: Placement,
        display: DisplayOptions,
    ) -> anyhow::Result<SceneInstance> {
        let location = self.registry.location(name)?;
        self.instantiate(location, placement, display).await
    }

    pub async fn spawn(&self, spawn: &ModelSpawn) -> anyhow::Result<SceneInstance> {
        self.instantiate_named(spawn.model.key(), spawn.placement, spawn.display)
            .await
    }
}
