//! The literal layout of the landing page.
//!
//! Everything here is plain data: positions, rotations (radians) and scales are
//! written out exactly and nothing is loaded until the layout is instantiated.

use crate::{
    resources::font::{Bounds, TextOptions},
    scene::{
        models::{ModelSpawn, bear, broken_wall, cauldron, dog, duck, wall, witch, zombie},
        placement::Placement,
    },
};

/// Where the text's bounding box sits vertically relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalAlign {
    /// The box is centred on the anchor.
    Center,
    /// The box sits on top of the anchor.
    Top,
    /// The box hangs below the anchor.
    Bottom,
}

/// A 3D text element, centred horizontally and in depth around its anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct TextElement {
    pub text: String,
    /// Location of the typeface JSON.
    pub font: String,
    pub options: TextOptions,
    pub scale: f32,
    pub anchor: [f32; 3],
    pub align: VerticalAlign,
}

impl TextElement {
    /// Placement that aligns geometry with `bounds` to the anchor.
    pub fn placement(&self, bounds: Option<&Bounds>) -> Placement {
        let Some(bounds) = bounds else {
            return Placement::at(self.anchor).scaled(self.scale);
        };
        let s = self.scale;
        let center = bounds.center();
        let height = bounds.size()[1] * s;
        let lift = match self.align {
            VerticalAlign::Center => 0.0,
            VerticalAlign::Top => height / 2.0,
            VerticalAlign::Bottom => -height / 2.0,
        };
        Placement::at([
            self.anchor[0] - center[0] * s,
            self.anchor[1] - center[1] * s + lift,
            self.anchor[2] - center[2] * s,
        ])
        .scaled(s)
    }
}

/// Model spawns plus the title.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLayout {
    pub spawns: Vec<ModelSpawn>,
    pub title: TextElement,
}

pub fn wall_group() -> Vec<ModelSpawn> {
    vec![
        wall(Placement::at([-16.0, 0.0, 1.31]).rotated([0.0, 30.0, 0.0])),
        wall(Placement::at([-15.4, 0.0, 5.27]).rotated([0.0, 30.0, 0.0])),
        wall(Placement::at([-14.0, 0.0, 0.0])),
        wall(Placement::at([-10.0, 0.0, 0.0])),
        wall(Placement::at([-6.0, 0.0, 0.0])),
        wall(Placement::at([-2.0, 0.0, 0.0])),
        wall(Placement::at([2.0, 0.0, 0.0])),
        broken_wall(Placement::at([6.0, 0.0, 0.0])),
        wall(Placement::at([10.0, 0.0, 0.0])),
        wall(Placement::at([14.0, 0.0, 0.0])),
        wall(Placement::at([16.0, 0.0, 1.31]).rotated([0.0, 30.0, 0.0])),
        wall(Placement::at([16.6, 0.0, 5.27]).rotated([0.0, 30.0, 0.0])),
    ]
}

pub fn props() -> Vec<ModelSpawn> {
    vec![
        witch(Placement::at([0.0, 0.0, 3.0]).scaled(2.0)),
        cauldron(Placement::at([0.0, 0.0, 5.3]).scaled(1.5)),
        duck(Placement::at([-3.0, 0.0, 7.0]).rotated([0.0, 2.0, 0.0])),
        dog(Placement::at([-3.0, 0.0, 10.0]).rotated([0.0, 2.0, 0.0])),
        bear(Placement::at([3.0, 0.0, 7.0]).rotated([0.0, -2.0, 0.0])),
        zombie(Placement::at([6.0, 0.0, -0.5]).rotated([0.0, -0.5, 0.0])),
    ]
}

pub fn title() -> TextElement {
    TextElement {
        text: "Soon to rise portfolio".to_string(),
        font: "/chocolate_bar_regular.json".to_string(),
        options: TextOptions {
            size: 1.0,
            depth: 0.2,
            curve_segments: 8,
        },
        scale: 3.0,
        anchor: [0.0, 10.0, -12.0],
        align: VerticalAlign::Top,
    }
}

pub fn portfolio_layout() -> SceneLayout {
    let mut spawns = wall_group();
    spawns.extend(props());
    SceneLayout {
        spawns,
        title: title(),
    }
}
