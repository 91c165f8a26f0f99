use std::sync::Arc;

use futures::executor::block_on;
use portfolio_scene::{
    error::SceneError,
    resources::cache::AssetCache,
    scene::{
        instantiate::ModelInstantiator,
        models::{bear, wall},
        placement::{DisplayOptions, Placement},
        registry::ModelRegistry,
    },
};

mod common;
use common::test_utils::{CountingSource, registry_of, triangle_gltf};

#[test]
fn instances_share_the_asset_but_not_the_placement() {
    let registry = registry_of(&["wall"], "wall.gltf");
    let cache = AssetCache::new(CountingSource::new().with("wall.gltf", triangle_gltf("Wall")));
    let instantiator = ModelInstantiator::new(&registry, &cache);

    let left = block_on(instantiator.spawn(&wall(Placement::at([-2.0, 0.0, 0.0])))).unwrap();
    let mut right = block_on(instantiator.spawn(&wall(Placement::at([2.0, 0.0, 0.0])))).unwrap();

    assert!(Arc::ptr_eq(&left.asset, &right.asset));
    assert_eq!(cache.source().fetches("wall.gltf"), 1);

    right.placement.position = [5.0, 0.0, 0.0];
    assert_eq!(left.placement.position, [-2.0, 0.0, 0.0]);
    assert_eq!(left.transform().position, cgmath::Vector3::new(-2.0, 0.0, 0.0));
    assert_eq!(right.transform().position, cgmath::Vector3::new(5.0, 0.0, 0.0));
}

#[test]
fn display_options_are_forwarded() {
    let registry = registry_of(&["bear"], "bear.gltf");
    let cache = AssetCache::new(CountingSource::new().with("bear.gltf", triangle_gltf("Bear")));
    let instantiator = ModelInstantiator::new(&registry, &cache);

    let hidden = bear(Placement::default()).with_display(DisplayOptions { visible: false });
    let instance = block_on(instantiator.spawn(&hidden)).unwrap();
    assert!(!instance.is_visible());
    assert_eq!(instance.location, "bear.gltf");
}

#[test]
fn missing_registry_entry_fails_with_unresolved_model() {
    let registry = ModelRegistry::new([("wall", "wall.gltf")]);
    let cache = AssetCache::new(CountingSource::new());
    let instantiator = ModelInstantiator::new(&registry, &cache);

    let err = block_on(instantiator.spawn(&bear(Placement::default()))).unwrap_err();
    match err.downcast_ref::<SceneError>() {
        Some(SceneError::UnresolvedModel { name }) => assert_eq!(name, "bear"),
        other => panic!("expected an unresolved model, got {other:?}"),
    }
    assert_eq!(cache.source().total_fetches(), 0);
}

#[test]
fn loader_errors_propagate_unchanged() {
    let registry = registry_of(&["wall"], "broken.gltf");
    let cache = AssetCache::new(CountingSource::new().with("broken.gltf", b"not a gltf".to_vec()));
    let instantiator = ModelInstantiator::new(&registry, &cache);

    let err = block_on(instantiator.instantiate_named(
        "wall",
        Placement::default(),
        DisplayOptions::default(),
    ))
    .unwrap_err();
    assert!(err.downcast_ref::<SceneError>().is_none());
}

#[test]
fn instantiate_accepts_a_location_directly() {
    let registry = ModelRegistry::new(Vec::<(String, String)>::new());
    let cache = AssetCache::new(CountingSource::new().with("any.gltf", triangle_gltf("Any")));
    let instantiator = ModelInstantiator::new(&registry, &cache);

    let instance = block_on(instantiator.instantiate(
        "any.gltf",
        Placement::at([1.0, 2.0, 3.0]).scaled(2.0),
        DisplayOptions::default(),
    ))
    .unwrap();
    assert_eq!(instance.transform().scale, cgmath::Vector3::new(2.0, 2.0, 2.0));
}
