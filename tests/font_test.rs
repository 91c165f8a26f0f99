use portfolio_scene::{
    error::SceneError,
    resources::font::{TextOptions, Typeface},
};

mod common;
use common::test_utils::typeface_json;

fn typeface() -> Typeface {
    Typeface::from_slice(&typeface_json()).unwrap()
}

#[test]
fn parses_typeface_metadata() {
    let face = typeface();
    assert_eq!(face.family_name, "Test Sans");
    assert_eq!(face.resolution, 100.0);
    assert_eq!(face.glyphs.len(), 4);
    // (yMax - yMin + underline) * size / resolution
    assert!((face.line_height(1.0) - 1.3).abs() < 1e-6);
}

#[test]
fn square_glyph_extrudes_into_a_box() {
    let geometry = typeface().text_geometry("A", &TextOptions::default()).unwrap();
    // Two triangles per cap and two per side.
    assert_eq!(geometry.triangle_count(), 2 + 2 + 4 * 2);

    let bounds = geometry.bounds().unwrap();
    for (actual, expected) in bounds.min.into_iter().zip([0.0, 0.0, 0.0]) {
        assert!((actual - expected).abs() < 1e-6);
    }
    for (actual, expected) in bounds.max.into_iter().zip([1.0, 1.0, 0.2]) {
        assert!((actual - expected).abs() < 1e-6);
    }
    assert!(geometry.indices.iter().all(|&i| (i as usize) < geometry.vertices.len()));
}

#[test]
fn caps_face_outwards() {
    let geometry = typeface().text_geometry("A", &TextOptions::default()).unwrap();
    for vertex in &geometry.vertices {
        match vertex.position[2] {
            z if z == 0.2 && vertex.normal[2] != 0.0 => assert_eq!(vertex.normal, [0.0, 0.0, 1.0]),
            z if z == 0.0 && vertex.normal[2] != 0.0 => assert_eq!(vertex.normal, [0.0, 0.0, -1.0]),
            _ => assert_eq!(vertex.normal[2], 0.0),
        }
    }
}

#[test]
fn glyph_with_counter_keeps_its_hole() {
    let geometry = typeface().text_geometry("O", &TextOptions::default()).unwrap();
    // Outline and hole bridged into one ten point polygon per cap, plus
    // eight side quads.
    assert_eq!(geometry.triangle_count(), 8 + 8 + 8 * 2);
}

#[test]
fn advance_and_size_scale_the_layout() {
    let options = TextOptions {
        size: 2.0,
        ..Default::default()
    };
    let geometry = typeface().text_geometry("AA", &options).unwrap();
    let bounds = geometry.bounds().unwrap();
    // Second glyph starts at ha * size / resolution = 2.4.
    assert!((bounds.max[0] - 4.4).abs() < 1e-5);
    assert!((bounds.max[1] - 2.0).abs() < 1e-5);
}

#[test]
fn newline_moves_down_one_line() {
    let geometry = typeface().text_geometry("A\nA", &TextOptions::default()).unwrap();
    let bounds = geometry.bounds().unwrap();
    assert!((bounds.min[1] - -1.3).abs() < 1e-5);
    assert!((bounds.max[0] - 1.0).abs() < 1e-5);
}

#[test]
fn missing_glyphs_fall_back_to_question_mark() {
    let face = typeface();
    let fallback = face.text_geometry("?", &TextOptions::default()).unwrap();
    let unknown = face.text_geometry("x", &TextOptions::default()).unwrap();
    assert_eq!(unknown.vertices, fallback.vertices);
    assert_eq!(unknown.indices, fallback.indices);
}

#[test]
fn whitespace_only_text_is_empty() {
    let geometry = typeface().text_geometry("  ", &TextOptions::default()).unwrap();
    assert!(geometry.is_empty());
    assert!(geometry.bounds().is_none());
}

#[test]
fn malformed_outline_is_a_font_error() {
    let json = br#"{
        "glyphs": { "A": { "ha": 100, "o": "m 0 0 l ten 0" } },
        "resolution": 100,
        "boundingBox": { "yMin": 0, "yMax": 100 }
    }"#;
    let face = Typeface::from_slice(json).unwrap();
    let err = face.text_geometry("A", &TextOptions::default()).unwrap_err();
    assert!(matches!(err, SceneError::Font(_)));
}
