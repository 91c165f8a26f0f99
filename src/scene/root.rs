//! The scene root: camera, environment, controls, page chrome and the layout.

use std::{fmt, sync::Arc};

use futures::{
    FutureExt, Stream, StreamExt,
    future::{self, LocalBoxFuture},
    stream::FuturesUnordered,
};

use crate::{
    camera::{CameraConfig, OrbitSettings},
    data_structures::{instance::Instance, scene_graph::LoadedAsset},
    resources::{
        AssetSource,
        cache::AssetCache,
        font::{TextGeometry, Typeface},
    },
    scene::{
        environment::Environment,
        instantiate::{ModelInstantiator, SceneInstance},
        layout::{SceneLayout, TextElement, portfolio_layout},
        placement::Placement,
        registry::ModelRegistry,
    },
};

/// Text shown around the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageChrome {
    pub instruction: String,
    pub contact_label: String,
    pub contact_email: String,
}

impl PageChrome {
    pub fn portfolio() -> Self {
        Self {
            instruction: "Use your mouse buttons/scroll to move the scene!".to_string(),
            contact_label: "Contact me on:".to_string(),
            contact_email: "gpeteamd@gmail.com".to_string(),
        }
    }

    pub fn mailto(&self) -> String {
        format!("mailto:{}", self.contact_email)
    }

    pub fn footer(&self) -> String {
        format!("{} {}", self.contact_label, self.contact_email)
    }
}

/// The title mesh with the placement that anchors it.
#[derive(Clone, Debug)]
pub struct TitleText {
    pub element: TextElement,
    pub geometry: TextGeometry,
    pub placement: Placement,
}

impl TitleText {
    pub async fn build<S>(element: &TextElement, source: &S) -> anyhow::Result<Self>
    where
        S: AssetSource + ?Sized,
    {
        let typeface = Typeface::from_slice(&source.fetch(&element.font).await?)?;
        let geometry = typeface.text_geometry(&element.text, &element.options)?;
        let placement = element.placement(geometry.bounds().as_ref());
        log::info!(
            "Built title {:?} with {} triangles",
            element.text,
            geometry.triangle_count()
        );
        Ok(Self {
            element: element.clone(),
            geometry,
            placement,
        })
    }
}

/// Every visible placement of one location, ready for instanced drawing.
#[derive(Debug)]
pub struct InstanceBatch<'a> {
    pub location: &'a str,
    pub asset: &'a Arc<LoadedAsset>,
    pub transforms: Vec<Instance>,
}

/// A part of the scene whose load has finished.
pub enum SceneUpdate {
    /// The instance for the spawn at `slot` in the layout.
    Instance { slot: usize, instance: SceneInstance },
    Title(TitleText),
    Environment(Box<[image::RgbaImage; 6]>),
}

impl fmt::Debug for SceneUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance { slot, instance } => f
                .debug_struct("Instance")
                .field("slot", slot)
                .field("location", &instance.location)
                .finish(),
            Self::Title(title) => f.debug_tuple("Title").field(&title.element.text).finish(),
            Self::Environment(faces) => f
                .debug_tuple("Environment")
                .field(&faces[0].dimensions())
                .finish(),
        }
    }
}

/// The parts of the layout that have loaded so far.
///
/// Instances are kept in layout order whatever order their loads finish in.
#[derive(Clone, Debug, Default)]
pub struct ComposedScene {
    pub instances: Vec<SceneInstance>,
    slots: Vec<usize>,
    pub title: Option<TitleText>,
    pub environment: Option<Box<[image::RgbaImage; 6]>>,
}

impl ComposedScene {
    pub fn apply(&mut self, update: SceneUpdate) {
        match update {
            SceneUpdate::Instance { slot, instance } => {
                let at = self.slots.partition_point(|&s| s < slot);
                self.slots.insert(at, slot);
                self.instances.insert(at, instance);
            }
            SceneUpdate::Title(title) => self.title = Some(title),
            SceneUpdate::Environment(faces) => self.environment = Some(faces),
        }
    }

    /// Layout slots of the instances present, in the order of `instances`.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// Visible instances grouped by location, in order of first appearance.
    pub fn batches(&self) -> Vec<InstanceBatch<'_>> {
        let mut batches: Vec<InstanceBatch<'_>> = Vec::new();
        for instance in self.instances.iter().filter(|i| i.is_visible()) {
            match batches.iter_mut().find(|b| b.location == instance.location) {
                Some(batch) => batch.transforms.push(instance.transform()),
                None => batches.push(InstanceBatch {
                    location: &instance.location,
                    asset: &instance.asset,
                    transforms: vec![instance.transform()],
                }),
            }
        }
        batches
    }

    /// The batch of `location`, if any of its instances is visible.
    pub fn batch(&self, location: &str) -> Option<InstanceBatch<'_>> {
        self.batches()
            .into_iter()
            .find(|batch| batch.location == location)
    }
}

pub struct SceneRoot {
    pub registry: ModelRegistry,
    pub camera: CameraConfig,
    pub environment: Environment,
    pub controls: OrbitSettings,
    pub chrome: PageChrome,
    pub layout: SceneLayout,
}

impl SceneRoot {
    pub fn portfolio() -> Self {
        Self {
            registry: ModelRegistry::global().clone(),
            camera: CameraConfig::portfolio(),
            environment: Environment::portfolio(),
            controls: OrbitSettings::default(),
            chrome: PageChrome::portfolio(),
            layout: portfolio_layout(),
        }
    }

    /// Start every spawn, the title and the environment as independent loads.
    ///
    /// Updates are yielded in completion order. A failed load is logged and
    /// yields nothing; a load that never finishes holds back only itself.
    pub fn updates<'a, S: AssetSource + 'static>(
        &'a self,
        cache: &'a AssetCache<S>,
    ) -> impl Stream<Item = SceneUpdate> + Unpin + 'a {
        let loads: FuturesUnordered<LocalBoxFuture<'a, Option<SceneUpdate>>> =
            FuturesUnordered::new();

        for (slot, spawn) in self.layout.spawns.iter().enumerate() {
            loads.push(
                async move {
                    let instantiator = ModelInstantiator::new(&self.registry, cache);
                    match instantiator.spawn(spawn).await {
                        Ok(instance) => Some(SceneUpdate::Instance { slot, instance }),
                        Err(e) => {
                            log::warn!("Leaving out `{}` at slot {slot}: {e:#}", spawn.model.key());
                            None
                        }
                    }
                }
                .boxed_local(),
            );
        }

        loads.push(
            async move {
                match TitleText::build(&self.layout.title, cache.source()).await {
                    Ok(title) => Some(SceneUpdate::Title(title)),
                    Err(e) => {
                        log::warn!("Leaving out the title: {e:#}");
                        None
                    }
                }
            }
            .boxed_local(),
        );

        loads.push(
            async move {
                match self.environment.load(cache.source()).await {
                    Ok(faces) => Some(SceneUpdate::Environment(Box::new(faces))),
                    Err(e) => {
                        log::warn!("Leaving out the environment: {e:#}");
                        None
                    }
                }
            }
            .boxed_local(),
        );

        loads.filter_map(future::ready)
    }

    /// Wait until every load of [`Self::updates`] has settled.
    ///
    /// Failed loads are missing from the result.
    pub async fn compose<S: AssetSource + 'static>(&self, cache: &AssetCache<S>) -> ComposedScene {
        let scene = self
            .updates(cache)
            .fold(ComposedScene::default(), |mut scene, update| {
                scene.apply(update);
                future::ready(scene)
            })
            .await;
        log::info!(
            "Composed scene with {} of {} instances",
            scene.instances.len(),
            self.layout.spawns.len()
        );
        scene
    }
}
