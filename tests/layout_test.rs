use cgmath::{InnerSpace, Matrix4, Quaternion, Rad, Rotation3, Vector3, Vector4};
use portfolio_scene::{
    resources::font::Bounds,
    scene::{
        layout::{VerticalAlign, portfolio_layout, props, title, wall_group},
        models::ModelName,
        placement::{Placement, Scale},
    },
};

#[test]
fn wall_group_has_eleven_walls_and_one_broken_wall() {
    let walls = wall_group();
    assert_eq!(walls.len(), 12);
    let broken: Vec<_> = walls
        .iter()
        .filter(|spawn| spawn.model == ModelName::BrokenWall)
        .collect();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].placement.position, [6.0, 0.0, 0.0]);
}

#[test]
fn angled_wall_keeps_its_literal_values() {
    let first = wall_group()[0];
    assert_eq!(first.model, ModelName::Wall);
    assert_eq!(first.placement.position, [-16.0, 0.0, 1.31]);
    assert_eq!(first.placement.rotation, [0.0, 30.0, 0.0]);
    assert_eq!(first.placement.scale, Scale::Uniform(1.0));

    let transform = first.placement.transform();
    assert_eq!(transform.position, Vector3::new(-16.0, 0.0, 1.31));
    // 30 is taken as radians, about y only.
    assert_eq!(transform.rotation, Quaternion::from_angle_y(Rad(30.0f32)));
    assert_eq!(transform.scale, Vector3::new(1.0, 1.0, 1.0));

    let matrix = transform.to_matrix();
    assert_eq!(matrix.w, Vector4::new(-16.0, 0.0, 1.31, 1.0));
    let expected = Matrix4::from_angle_y(Rad(30.0f32));
    for (column, want) in [(matrix.x, expected.x), (matrix.y, expected.y), (matrix.z, expected.z)] {
        for i in 0..4 {
            assert!((column[i] - want[i]).abs() < 1e-6, "{column:?} != {want:?}");
        }
    }
}

#[test]
fn rotations_apply_in_xyz_order() {
    let placement = Placement::at([1.0, 2.0, 3.0])
        .rotated([0.1, 0.2, 0.3])
        .scaled([2.0, 3.0, 4.0]);
    let transform = placement.transform();
    let expected = Quaternion::from_angle_x(Rad(0.1f32))
        * Quaternion::from_angle_y(Rad(0.2))
        * Quaternion::from_angle_z(Rad(0.3));
    assert_eq!(transform.rotation, expected);

    let matrix = transform.to_matrix();
    assert_eq!(matrix.w, Vector4::new(1.0, 2.0, 3.0, 1.0));
    // Columns carry the per-axis scale.
    assert!((matrix.x.truncate().magnitude() - 2.0).abs() < 1e-5);
    assert!((matrix.y.truncate().magnitude() - 3.0).abs() < 1e-5);
    assert!((matrix.z.truncate().magnitude() - 4.0).abs() < 1e-5);
}

#[test]
fn props_are_placed_as_written() {
    let props = props();
    let models: Vec<ModelName> = props.iter().map(|spawn| spawn.model).collect();
    assert_eq!(
        models,
        [
            ModelName::Witch,
            ModelName::Cauldron,
            ModelName::Duck,
            ModelName::Dog,
            ModelName::Bear,
            ModelName::Zombie,
        ]
    );
    assert_eq!(props[0].placement, Placement::at([0.0, 0.0, 3.0]).scaled(2.0));
    assert_eq!(props[1].placement.scale, Scale::Uniform(1.5));
    assert_eq!(props[5].placement.rotation, [0.0, -0.5, 0.0]);
    assert!(props.iter().all(|spawn| spawn.display.visible));
}

#[test]
fn layout_is_deterministic() {
    assert_eq!(portfolio_layout(), portfolio_layout());
    let layout = portfolio_layout();
    assert_eq!(layout.spawns.len(), 18);
    assert_eq!(&layout.spawns[..12], &wall_group()[..]);
}

#[test]
fn title_is_anchored_on_top_of_its_anchor() {
    let title = title();
    assert_eq!(title.text, "Soon to rise portfolio");
    assert_eq!(title.anchor, [0.0, 10.0, -12.0]);
    assert_eq!(title.align, VerticalAlign::Top);

    let bounds = Bounds {
        min: [0.0, -0.2, 0.0],
        max: [10.0, 0.8, 0.2],
    };
    let placement = title.placement(Some(&bounds));
    assert_eq!(placement.scale, Scale::Uniform(3.0));
    let [x, y, z] = placement.position;
    // Centred on x and z; the scaled box's bottom rests on y = 10.
    assert!((x - -15.0).abs() < 1e-5);
    assert!((z - -12.3).abs() < 1e-5);
    let bottom = y + bounds.min[1] * 3.0;
    assert!((bottom - 10.0).abs() < 1e-5, "bottom at {bottom}");
}

#[test]
fn empty_text_sits_at_the_anchor() {
    let title = title();
    assert_eq!(title.placement(None).position, title.anchor);
}
