use std::sync::Arc;

use futures::{FutureExt, StreamExt, executor::block_on};
use portfolio_scene::{
    resources::cache::{AssetCache, prefetch},
    scene::{
        layout::VerticalAlign,
        placement::{DisplayOptions, Scale},
        registry::ModelRegistry,
        root::{ComposedScene, PageChrome, SceneRoot},
    },
};

mod common;
use common::test_utils::{CountingSource, portfolio_source, triangle_gltf, typeface_json};

#[test]
fn compose_after_prefetch_fetches_each_location_once() {
    let root = SceneRoot::portfolio();
    let cache = AssetCache::new(portfolio_source());

    block_on(prefetch(&root.registry, &cache));
    let scene = block_on(root.compose(&cache));

    assert_eq!(scene.instances.len(), 18);
    for (_, location) in root.registry.iter() {
        assert_eq!(cache.source().fetches(location), 1, "{location}");
    }
    assert_eq!(cache.source().fetches("/chocolate_bar_regular.json"), 1);
}

#[test]
fn batches_group_instances_by_location() {
    let root = SceneRoot::portfolio();
    let cache = AssetCache::new(portfolio_source());
    let scene = block_on(root.compose(&cache));

    let batches = scene.batches();
    let counts: Vec<(&str, usize)> = batches
        .iter()
        .map(|batch| (batch.location, batch.transforms.len()))
        .collect();
    let registry = ModelRegistry::global();
    assert_eq!(
        counts,
        [
            (registry.location("wall").unwrap(), 11),
            (registry.location("brokenWall").unwrap(), 1),
            (registry.location("witch").unwrap(), 1),
            (registry.location("cauldron").unwrap(), 1),
            (registry.location("duck").unwrap(), 1),
            (registry.location("dog").unwrap(), 1),
            (registry.location("bear").unwrap(), 1),
            (registry.location("zombie").unwrap(), 1),
        ]
    );

    let walls = &scene.instances[..12];
    assert!(Arc::ptr_eq(&walls[0].asset, &walls[1].asset));
    assert!(!Arc::ptr_eq(&walls[0].asset, &walls[7].asset));
}

#[test]
fn hidden_instances_are_not_batched() {
    let root = SceneRoot::portfolio();
    let cache = AssetCache::new(portfolio_source());
    let mut scene = block_on(root.compose(&cache));
    scene.instances[7].display = DisplayOptions { visible: false };

    let batches = scene.batches();
    assert_eq!(batches.len(), 7);
    assert!(
        batches
            .iter()
            .all(|batch| batch.location != ModelRegistry::global().location("brokenWall").unwrap())
    );
}

#[test]
fn composing_twice_gives_the_same_scene() {
    let root = SceneRoot::portfolio();
    let cache = AssetCache::new(portfolio_source());
    let first = block_on(root.compose(&cache));
    let second = block_on(root.compose(&cache));

    let placements = |scene: &portfolio_scene::scene::root::ComposedScene| {
        scene
            .instances
            .iter()
            .map(|i| (i.location.clone(), i.placement))
            .collect::<Vec<_>>()
    };
    assert_eq!(placements(&first), placements(&second));
    let (first, second) = (first.title.unwrap(), second.title.unwrap());
    assert_eq!(first.placement, second.placement);
    assert_eq!(first.geometry.indices, second.geometry.indices);
}

#[test]
fn title_is_built_and_lifted_above_its_anchor() {
    let root = SceneRoot::portfolio();
    let cache = AssetCache::new(portfolio_source());
    let scene = block_on(root.compose(&cache));

    let title = scene.title.as_ref().unwrap();
    assert!(!title.geometry.is_empty());
    assert_eq!(title.element.align, VerticalAlign::Top);
    assert_eq!(title.placement.scale, Scale::Uniform(3.0));

    let bounds = title.geometry.bounds().unwrap();
    let bottom = title.placement.position[1] + bounds.min[1] * 3.0;
    assert!((bottom - 10.0).abs() < 1e-4, "bottom at {bottom}");
}

/// Portfolio source without the duck, which is 14th in layout order.
fn source_without_duck() -> (CountingSource, &'static str) {
    let duck = ModelRegistry::global().location("duck").unwrap();
    let mut source = CountingSource::new().with("/chocolate_bar_regular.json", typeface_json());
    for (name, location) in ModelRegistry::global().iter() {
        if location != duck {
            source = source.with(location, triangle_gltf(name));
        }
    }
    (source, duck)
}

const DUCK_SLOT: usize = 14;

#[test]
fn failed_model_is_left_out_of_the_scene() {
    let root = SceneRoot::portfolio();
    let (source, duck) = source_without_duck();
    let cache = AssetCache::new(source);

    block_on(prefetch(&root.registry, &cache));
    let scene = block_on(root.compose(&cache));

    assert_eq!(scene.instances.len(), 17);
    assert!(!scene.slots().contains(&DUCK_SLOT));
    assert!(scene.instances.iter().all(|i| i.location != duck));
    assert!(scene.title.is_some());
    assert!(matches!(cache.peek(duck), Some(Err(_))));
    assert_eq!(cache.source().fetches(duck), 1);
}

#[test]
fn stalled_model_does_not_hold_back_the_others() {
    let root = SceneRoot::portfolio();
    let duck = ModelRegistry::global().location("duck").unwrap();
    let cache = AssetCache::new(portfolio_source().stall(duck));

    let mut updates = root.updates(&cache);
    let mut scene = ComposedScene::default();
    while let Some(Some(update)) = updates.next().now_or_never() {
        scene.apply(update);
    }

    assert_eq!(scene.instances.len(), 17);
    assert_eq!(
        scene.slots(),
        (0..18).filter(|&slot| slot != DUCK_SLOT).collect::<Vec<_>>()
    );
    assert!(scene.title.is_some());
    assert!(cache.peek(duck).is_none());
    assert_eq!(scene.batches().len(), 7);
}

#[test]
fn updates_keep_layout_order_in_the_composed_scene() {
    let root = SceneRoot::portfolio();
    let cache = AssetCache::new(portfolio_source());
    let scene = block_on(root.compose(&cache));

    assert_eq!(scene.slots(), (0..18).collect::<Vec<_>>());
    let models: Vec<&str> = root.layout.spawns.iter().map(|s| s.model.key()).collect();
    let locations: Vec<&str> = scene.instances.iter().map(|i| i.location.as_str()).collect();
    let expected: Vec<&str> = models
        .iter()
        .map(|name| root.registry.location(name).unwrap())
        .collect();
    assert_eq!(locations, expected);
    // No environment faces are served.
    assert!(scene.environment.is_none());
}

#[test]
fn page_chrome_text() {
    let chrome = PageChrome::portfolio();
    assert_eq!(chrome.instruction, "Use your mouse buttons/scroll to move the scene!");
    assert_eq!(chrome.footer(), "Contact me on: gpeteamd@gmail.com");
    assert_eq!(chrome.mailto(), "mailto:gpeteamd@gmail.com");
}
