//! Literal placement data carried by every instance in the layout.

use crate::data_structures::instance::Instance;

/// Uniform (`scale={2}`) or per-axis scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scale {
    Uniform(f32),
    NonUniform([f32; 3]),
}

impl Scale {
    pub fn to_vector(self) -> [f32; 3] {
        match self {
            Scale::Uniform(s) => [s; 3],
            Scale::NonUniform(v) => v,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Uniform(1.0)
    }
}

impl From<f32> for Scale {
    fn from(s: f32) -> Self {
        Scale::Uniform(s)
    }
}

impl From<[f32; 3]> for Scale {
    fn from(v: [f32; 3]) -> Self {
        Scale::NonUniform(v)
    }
}

/// Position, Euler rotation (radians, XYZ order) and scale of one instance.
///
/// Values are stored exactly as written in the layout and only turned into a
/// matrix when the instance is uploaded.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Placement {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: Scale,
}

impl Placement {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn rotated(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: impl Into<Scale>) -> Self {
        self.scale = scale.into();
        self
    }

    pub fn transform(&self) -> Instance {
        Instance::from(self)
    }
}

/// Options forwarded untouched to the instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayOptions {
    pub visible: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self { visible: true }
    }
}
