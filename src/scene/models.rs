//! Named model wrappers.
//!
//! Each function binds one registry entry to a placement. They carry no state
//! and add no failure modes: resolution happens when the spawn is instantiated.

use crate::scene::placement::{DisplayOptions, Placement};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelName {
    Wall,
    BrokenWall,
    Witch,
    Cauldron,
    Duck,
    Dog,
    Bear,
    Zombie,
}

impl ModelName {
    pub const ALL: [ModelName; 8] = [
        ModelName::Wall,
        ModelName::BrokenWall,
        ModelName::Witch,
        ModelName::Cauldron,
        ModelName::Duck,
        ModelName::Dog,
        ModelName::Bear,
        ModelName::Zombie,
    ];

    /// The registry key of this model.
    pub fn key(self) -> &'static str {
        match self {
            ModelName::Wall => "wall",
            ModelName::BrokenWall => "brokenWall",
            ModelName::Witch => "witch",
            ModelName::Cauldron => "cauldron",
            ModelName::Duck => "duck",
            ModelName::Dog => "dog",
            ModelName::Bear => "bear",
            ModelName::Zombie => "zombie",
        }
    }
}

/// A request to place one named model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelSpawn {
    pub model: ModelName,
    pub placement: Placement,
    pub display: DisplayOptions,
}

impl ModelSpawn {
    pub fn new(model: ModelName, placement: Placement) -> Self {
        Self {
            model,
            placement,
            display: DisplayOptions::default(),
        }
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }
}

pub fn wall(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::Wall, placement)
}

pub fn broken_wall(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::BrokenWall, placement)
}

pub fn witch(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::Witch, placement)
}

pub fn cauldron(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::Cauldron, placement)
}

pub fn duck(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::Duck, placement)
}

pub fn dog(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::Dog, placement)
}

pub fn bear(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::Bear, placement)
}

pub fn zombie(placement: Placement) -> ModelSpawn {
    ModelSpawn::new(ModelName::Zombie, placement)
}
