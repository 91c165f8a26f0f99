//! Deduplicating asset cache and registry prefetch.
//!
//! The cache hands out one shared future per location. Callers that ask for
//! the same location while it is in flight, or after it resolved, observe the
//! same result: the same `Arc<LoadedAsset>` or a clone of the same failure.

use std::{cell::RefCell, collections::HashMap, rc::Rc, sync::Arc};

use futures::{
    FutureExt,
    future::{LocalBoxFuture, Shared, join_all},
};

use crate::{
    data_structures::scene_graph::LoadedAsset,
    error::SharedLoadError,
    resources::{AssetSource, load_model_gltf},
    scene::registry::ModelRegistry,
};

type SharedLoad = Shared<LocalBoxFuture<'static, Result<Arc<LoadedAsset>, SharedLoadError>>>;

pub struct AssetCache<S: AssetSource + 'static> {
    source: Rc<S>,
    entries: RefCell<HashMap<String, SharedLoad>>,
}

impl<S: AssetSource + 'static> AssetCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Rc::new(source),
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve `location`, starting a load only if none exists for it yet.
    pub fn load(
        &self,
        location: &str,
    ) -> impl Future<Output = anyhow::Result<Arc<LoadedAsset>>> + 'static {
        let shared = self
            .entries
            .borrow_mut()
            .entry(location.to_string())
            .or_insert_with(|| {
                let source = Rc::clone(&self.source);
                let location = location.to_string();
                async move {
                    load_model_gltf(&location, source.as_ref())
                        .await
                        .map(Arc::new)
                        .map_err(SharedLoadError::from)
                }
                .boxed_local()
                .shared()
            })
            .clone();
        async move { shared.await.map_err(anyhow::Error::from) }
    }

    /// The settled result for `location`, if its load has finished.
    pub fn peek(&self, location: &str) -> Option<Result<Arc<LoadedAsset>, SharedLoadError>> {
        self.entries
            .borrow()
            .get(location)
            .and_then(|load| load.peek().cloned())
    }

    pub fn contains(&self, location: &str) -> bool {
        self.entries.borrow().contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Start and await a load for every registry entry.
///
/// Failures are logged and otherwise ignored; the cache keeps them so that a
/// later instantiation of the same location fails without fetching again.
pub async fn prefetch<S: AssetSource + 'static>(registry: &ModelRegistry, cache: &AssetCache<S>) {
    let loads = registry.iter().map(|(name, location)| {
        let load = cache.load(location);
        async move {
            if let Err(e) = load.await {
                log::warn!("Prefetching `{name}` from {location} failed: {e:#}");
            }
        }
    });
    join_all(loads).await;
    log::info!("Prefetched {} models", registry.len());
}
