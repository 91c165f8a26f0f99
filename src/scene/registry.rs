//! The model registry: short model names mapped to remote glTF documents.

use std::{collections::BTreeMap, sync::LazyLock};

use crate::error::SceneError;

const MODEL_BASE: &str =
    "https://vazxmixjsiawhamofees.supabase.co/storage/v1/object/public/models";

static PORTFOLIO: LazyLock<ModelRegistry> = LazyLock::new(ModelRegistry::portfolio);

/// Read-only lookup table from model name to asset location.
///
/// There is no registration API: a registry is fully described by the entries
/// it is constructed with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRegistry {
    entries: BTreeMap<String, String>,
}

impl ModelRegistry {
    pub fn new<N, L>(entries: impl IntoIterator<Item = (N, L)>) -> Self
    where
        N: Into<String>,
        L: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, location)| (name.into(), location.into()))
                .collect(),
        }
    }

    /// The models of the landing page.
    pub fn portfolio() -> Self {
        Self::new(
            [
                ("cauldron", "cauldron"),
                ("witch", "witch"),
                ("brokenWall", "broken-wall"),
                ("wall", "wall"),
                ("duck", "duck"),
                ("dog", "dog"),
                ("bear", "bear"),
                ("zombie", "zombie-1"),
            ]
            .map(|(name, dir)| (name, format!("{MODEL_BASE}/{dir}/model.gltf"))),
        )
    }

    /// The process-wide portfolio registry, built on first use.
    pub fn global() -> &'static ModelRegistry {
        &PORTFOLIO
    }

    pub fn location(&self, name: &str) -> Result<&str, SceneError> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SceneError::UnresolvedModel {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, location)| (name.as_str(), location.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
