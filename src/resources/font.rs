//! Extruded text geometry from typeface JSON fonts.
//!
//! A typeface file maps characters to outlines written as a space separated
//! command list: `m x y` starts a contour, `l x y` draws a line,
//! `q x y cx cy` a quadratic curve and `b x y c1x c1y c2x c2y` a cubic curve
//! (end point first, control points after). Coordinates are in font units;
//! `resolution` font units make one unit of text size.
//!
//! Geometry is built per glyph: contours are flattened, sorted into outlines
//! and holes by containment, holes are bridged into their outline, the caps
//! are ear-clipped and the outline is extruded along +Z.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{data_structures::model::ModelVertex, error::SceneError};

const FALLBACK_GLYPH: char = '?';
const EPSILON: f32 = 1e-7;

type Point = [f32; 2];

#[derive(Clone, Debug, Deserialize)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub ha: f32,
    #[serde(default)]
    pub o: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontBoundingBox {
    pub y_min: f32,
    pub y_max: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typeface {
    pub glyphs: HashMap<String, Glyph>,
    pub resolution: f32,
    pub bounding_box: FontBoundingBox,
    #[serde(default)]
    pub underline_thickness: f32,
    #[serde(default)]
    pub family_name: String,
}

/// Size, extrusion depth and curve subdivision of generated text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextOptions {
    pub size: f32,
    pub depth: f32,
    pub curve_segments: u32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 1.0,
            depth: 0.2,
            curve_segments: 8,
        }
    }
}

/// Axis aligned bounds of generated geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn center(&self) -> [f32; 3] {
        [0, 1, 2].map(|i| (self.min[i] + self.max[i]) / 2.0)
    }

    pub fn size(&self) -> [f32; 3] {
        [0, 1, 2].map(|i| self.max[i] - self.min[i])
    }
}

#[derive(Clone, Debug, Default)]
pub struct TextGeometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl TextGeometry {
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, v| Bounds {
                min: [0, 1, 2].map(|i| b.min[i].min(v.position[i])),
                max: [0, 1, 2].map(|i| b.max[i].max(v.position[i])),
            },
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl Typeface {
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The glyph for `ch`, falling back to `?`.
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        if let Some(glyph) = self.glyphs.get(ch.encode_utf8(&mut [0; 4]) as &str) {
            return Some(glyph);
        }
        let fallback = self
            .glyphs
            .get(FALLBACK_GLYPH.encode_utf8(&mut [0; 4]) as &str);
        match fallback {
            Some(_) => log::warn!(
                "{}: no glyph for {ch:?}, using {FALLBACK_GLYPH:?}",
                self.family_name
            ),
            None => log::warn!("{}: no glyph for {ch:?}, skipping it", self.family_name),
        }
        fallback
    }

    pub fn line_height(&self, size: f32) -> f32 {
        (self.bounding_box.y_max - self.bounding_box.y_min + self.underline_thickness) * size
            / self.resolution
    }

    /// Flattened contours of every glyph, offset to its position in the text.
    ///
    /// The outer vector has one entry per laid out glyph.
    pub fn glyph_contours(
        &self,
        text: &str,
        size: f32,
        curve_segments: u32,
    ) -> Result<Vec<Vec<Vec<Point>>>, SceneError> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let mut offset = [0.0f32, 0.0];
        let mut glyphs = Vec::new();
        for ch in text.chars() {
            if ch == '\n' {
                offset = [0.0, offset[1] - line_height];
                continue;
            }
            let Some(glyph) = self.glyph(ch) else {
                continue;
            };
            glyphs.push(parse_outline(&glyph.o, scale, offset, curve_segments)?);
            offset[0] += glyph.ha * scale;
        }
        Ok(glyphs)
    }

    /// Build the extruded mesh of `text`.
    ///
    /// The back cap lies at z = 0 and faces -Z, the front cap lies at
    /// z = `depth` and faces +Z.
    pub fn text_geometry(
        &self,
        text: &str,
        options: &TextOptions,
    ) -> Result<TextGeometry, SceneError> {
        let mut geometry = TextGeometry::default();
        for contours in self.glyph_contours(text, options.size, options.curve_segments)? {
            for shape in into_shapes(contours) {
                extrude_shape(&shape, options.depth, &mut geometry);
            }
        }
        Ok(geometry)
    }
}

fn parse_outline(
    outline: &str,
    scale: f32,
    offset: [f32; 2],
    curve_segments: u32,
) -> Result<Vec<Vec<Point>>, SceneError> {
    let segments = curve_segments.max(1);
    let mut contours: Vec<Vec<Point>> = Vec::new();
    let commands: Vec<&str> = outline.split_whitespace().collect();
    let mut i = 0;
    while i < commands.len() {
        let command = commands[i];
        i += 1;
        let arity = match command {
            "m" | "l" => 1,
            "q" => 2,
            "b" => 3,
            _ => continue,
        };
        if i + arity * 2 > commands.len() {
            return Err(SceneError::Font(format!("`{command}` is missing coordinates")));
        }
        let mut points = Vec::with_capacity(arity);
        for _ in 0..arity {
            let x = parse_number(commands[i])?;
            let y = parse_number(commands[i + 1])?;
            i += 2;
            points.push([x * scale + offset[0], y * scale + offset[1]]);
        }
        if command == "m" {
            contours.push(vec![points[0]]);
            continue;
        }
        let contour = contours
            .last_mut()
            .ok_or_else(|| SceneError::Font(format!("`{command}` before the first `m`")))?;
        let start = *contour.last().unwrap_or(&points[0]);
        match command {
            "l" => contour.push(points[0]),
            "q" => {
                let (end, control) = (points[0], points[1]);
                contour.extend((1..=segments).map(|s| {
                    let t = s as f32 / segments as f32;
                    let u = 1.0 - t;
                    [0, 1].map(|k| u * u * start[k] + 2.0 * u * t * control[k] + t * t * end[k])
                }));
            }
            _ => {
                let (end, c1, c2) = (points[0], points[1], points[2]);
                contour.extend((1..=segments).map(|s| {
                    let t = s as f32 / segments as f32;
                    let u = 1.0 - t;
                    [0, 1].map(|k| {
                        u * u * u * start[k]
                            + 3.0 * u * u * t * c1[k]
                            + 3.0 * u * t * t * c2[k]
                            + t * t * t * end[k]
                    })
                }));
            }
        }
    }

    Ok(contours
        .into_iter()
        .map(clean_contour)
        .filter(|c| c.len() >= 3 && signed_area(c).abs() > EPSILON)
        .collect())
}

fn parse_number(token: &str) -> Result<f32, SceneError> {
    token
        .parse::<f32>()
        .map_err(|_| SceneError::Font(format!("`{token}` is not a number")))
}

/// Drop repeated points, including a closing point equal to the first.
fn clean_contour(contour: Vec<Point>) -> Vec<Point> {
    let mut cleaned: Vec<Point> = Vec::with_capacity(contour.len());
    for p in contour {
        if cleaned.last().is_none_or(|last| !same_point(*last, p)) {
            cleaned.push(p);
        }
    }
    while cleaned.len() > 1 && same_point(cleaned[0], cleaned[cleaned.len() - 1]) {
        cleaned.pop();
    }
    cleaned
}

fn same_point(a: Point, b: Point) -> bool {
    (a[0] - b[0]).abs() <= EPSILON && (a[1] - b[1]).abs() <= EPSILON
}

/// Shoelace area, positive for counter-clockwise contours.
fn signed_area(contour: &[Point]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            a[0] * b[1] - b[0] * a[1]
        })
        .sum::<f32>()
        / 2.0
}

fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a[1] > p[1]) != (b[1] > p[1])
            && p[0] < (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0]
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// An outline (counter-clockwise) with its holes (clockwise).
#[derive(Clone, Debug)]
struct Shape {
    outline: Vec<Point>,
    holes: Vec<Vec<Point>>,
}

/// Contours nested an even number of times are outlines, the others holes.
fn into_shapes(contours: Vec<Vec<Point>>) -> Vec<Shape> {
    let depth: Vec<usize> = contours
        .iter()
        .enumerate()
        .map(|(i, c)| {
            contours
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && point_in_polygon(c[0], other))
                .count()
        })
        .collect();

    let mut shapes: Vec<(usize, Shape)> = Vec::new();
    for (i, contour) in contours.iter().enumerate() {
        if depth[i] % 2 == 0 {
            let mut outline = contour.clone();
            if signed_area(&outline) < 0.0 {
                outline.reverse();
            }
            shapes.push((
                i,
                Shape {
                    outline,
                    holes: Vec::new(),
                },
            ));
        }
    }

    for (i, contour) in contours.iter().enumerate() {
        if depth[i] % 2 == 0 {
            continue;
        }
        // The innermost enclosing outline is the one nested one level less.
        let parent = shapes.iter_mut().find(|(j, shape)| {
            depth[*j] + 1 == depth[i] && point_in_polygon(contour[0], &shape.outline)
        });
        if let Some((_, shape)) = parent {
            let mut hole = contour.clone();
            if signed_area(&hole) > 0.0 {
                hole.reverse();
            }
            shape.holes.push(hole);
        }
    }

    shapes.into_iter().map(|(_, shape)| shape).collect()
}

fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Splice `hole` into `outer` through a bridge from the hole's rightmost
/// point to a mutually visible outer vertex.
fn bridge_hole(outer: &mut Vec<Point>, hole: &[Point]) {
    let (hi, m) = hole
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a[0].total_cmp(&b[0]))
        .unwrap_or((0, hole[0]));

    let n = outer.len();
    let mut hit: Option<(f32, usize)> = None;
    for i in 0..n {
        let (a, b) = (outer[i], outer[(i + 1) % n]);
        if (a[1] - b[1]).abs() <= EPSILON || (a[1] > m[1]) == (b[1] > m[1]) {
            continue;
        }
        let x = a[0] + (m[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
        if x >= m[0] && hit.is_none_or(|(best, _)| x < best) {
            let candidate = if a[0] > b[0] { i } else { (i + 1) % n };
            hit = Some((x, candidate));
        }
    }

    let target = match hit {
        Some((x, candidate)) => {
            let intersection = [x, m[1]];
            let p = outer[candidate];
            // A reflex vertex inside the bridge triangle would block the
            // view; take the one closest in angle to the ray instead.
            (0..n)
                .filter(|&j| j != candidate)
                .filter(|&j| {
                    let q = outer[j];
                    q[0] > m[0]
                        && !same_point(q, p)
                        && point_in_triangle(q, m, intersection, p)
                })
                .min_by(|&a, &b| {
                    let tan = |q: Point| (q[1] - m[1]).abs() / (q[0] - m[0]);
                    tan(outer[a]).total_cmp(&tan(outer[b]))
                })
                .unwrap_or(candidate)
        }
        None => (0..n)
            .min_by(|&a, &b| distance2(outer[a], m).total_cmp(&distance2(outer[b], m)))
            .unwrap_or(0),
    };

    let mut spliced = Vec::with_capacity(n + hole.len() + 2);
    spliced.extend_from_slice(&outer[..=target]);
    spliced.extend((0..hole.len()).map(|k| hole[(hi + k) % hole.len()]));
    spliced.push(m);
    spliced.push(outer[target]);
    spliced.extend_from_slice(&outer[target + 1..]);
    *outer = spliced;
}

fn distance2(a: Point, b: Point) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Ear-clip a counter-clockwise polygon into counter-clockwise triangles.
///
/// Always yields `len - 2` triangles; degenerate input clips the next convex
/// (or simply the next) vertex when no clean ear exists.
fn triangulate(polygon: &[Point]) -> Vec<[usize; 3]> {
    let mut remaining: Vec<usize> = (0..polygon.len()).collect();
    let mut triangles = Vec::with_capacity(polygon.len().saturating_sub(2));
    while remaining.len() > 3 {
        let n = remaining.len();
        let corner = |k: usize| {
            (
                remaining[(k + n - 1) % n],
                remaining[k],
                remaining[(k + 1) % n],
            )
        };
        let is_ear = |k: usize| {
            let (a, b, c) = corner(k);
            let (pa, pb, pc) = (polygon[a], polygon[b], polygon[c]);
            cross(pa, pb, pc) > EPSILON
                && remaining.iter().all(|&r| {
                    let p = polygon[r];
                    r == a
                        || r == b
                        || r == c
                        || same_point(p, pa)
                        || same_point(p, pb)
                        || same_point(p, pc)
                        || !point_in_triangle(p, pa, pb, pc)
                })
        };
        let k = (0..n)
            .find(|&k| is_ear(k))
            .or_else(|| {
                (0..n).find(|&k| {
                    let (a, b, c) = corner(k);
                    cross(polygon[a], polygon[b], polygon[c]) >= 0.0
                })
            })
            .unwrap_or(0);
        let (a, b, c) = corner(k);
        triangles.push([a, b, c]);
        remaining.remove(k);
    }
    if let [a, b, c] = remaining[..] {
        triangles.push([a, b, c]);
    }
    triangles
}

fn extrude_shape(shape: &Shape, depth: f32, geometry: &mut TextGeometry) {
    let mut holes = shape.holes.clone();
    holes.sort_by(|a, b| {
        let max_x = |h: &Vec<Point>| h.iter().map(|p| p[0]).fold(f32::MIN, f32::max);
        max_x(b).total_cmp(&max_x(a))
    });
    let mut polygon = shape.outline.clone();
    for hole in &holes {
        bridge_hole(&mut polygon, hole);
    }
    let triangles = triangulate(&polygon);

    for (z, normal, flip) in [(depth, [0.0, 0.0, 1.0], false), (0.0, [0.0, 0.0, -1.0], true)] {
        let base = geometry.vertices.len() as u32;
        geometry
            .vertices
            .extend(polygon.iter().map(|p| ModelVertex {
                position: [p[0], p[1], z],
                tex_coords: *p,
                normal,
            }));
        for &[a, b, c] in &triangles {
            let tri = if flip { [a, c, b] } else { [a, b, c] };
            geometry
                .indices
                .extend(tri.map(|i| base + i as u32));
        }
    }

    for contour in std::iter::once(&shape.outline).chain(shape.holes.iter()) {
        let n = contour.len();
        for i in 0..n {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
            let length = (dx * dx + dy * dy).sqrt();
            if length <= EPSILON {
                continue;
            }
            let normal = [dy / length, -dx / length, 0.0];
            let base = geometry.vertices.len() as u32;
            let quad = [
                ([a[0], a[1], 0.0], [0.0, 0.0]),
                ([b[0], b[1], 0.0], [length, 0.0]),
                ([b[0], b[1], depth], [length, depth]),
                ([a[0], a[1], depth], [0.0, depth]),
            ];
            geometry
                .vertices
                .extend(quad.map(|(position, tex_coords)| ModelVertex {
                    position,
                    tex_coords,
                    normal,
                }));
            geometry
                .indices
                .extend([0, 1, 2, 0, 2, 3].map(|k| base + k));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, y: f32, edge: f32) -> Vec<Point> {
        vec![[x, y], [x + edge, y], [x + edge, y + edge], [x, y + edge]]
    }

    fn triangles_area(polygon: &[Point], triangles: &[[usize; 3]]) -> f32 {
        triangles
            .iter()
            .map(|[a, b, c]| cross(polygon[*a], polygon[*b], polygon[*c]) / 2.0)
            .sum()
    }

    #[test]
    fn triangulates_convex_polygon() {
        let polygon = square(0.0, 0.0, 2.0);
        let triangles = triangulate(&polygon);
        assert_eq!(triangles.len(), 2);
        assert!((triangles_area(&polygon, &triangles) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn triangulates_concave_polygon_without_flipped_triangles() {
        // An L shape.
        let polygon = vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [0.0, 2.0],
        ];
        let triangles = triangulate(&polygon);
        assert_eq!(triangles.len(), 4);
        for [a, b, c] in &triangles {
            assert!(cross(polygon[*a], polygon[*b], polygon[*c]) > 0.0);
        }
        assert!((triangles_area(&polygon, &triangles) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn bridged_hole_keeps_the_ring_area() {
        let mut polygon = square(0.0, 0.0, 4.0);
        let mut hole = square(1.0, 1.0, 2.0);
        hole.reverse();
        bridge_hole(&mut polygon, &hole);
        assert_eq!(polygon.len(), 4 + 4 + 2);
        let triangles = triangulate(&polygon);
        assert!((triangles_area(&polygon, &triangles) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn nested_contours_become_outline_and_hole() {
        let mut inner = square(1.0, 1.0, 2.0);
        inner.reverse();
        let shapes = into_shapes(vec![square(0.0, 0.0, 4.0), inner, square(10.0, 0.0, 1.0)]);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].holes.len(), 1);
        assert!(signed_area(&shapes[0].outline) > 0.0);
        assert!(signed_area(&shapes[0].holes[0]) < 0.0);
        assert!(shapes[1].holes.is_empty());
    }

    #[test]
    fn clockwise_outline_is_normalised() {
        let mut outline = square(0.0, 0.0, 1.0);
        outline.reverse();
        let shapes = into_shapes(vec![outline]);
        assert!(signed_area(&shapes[0].outline) > 0.0);
    }

    #[test]
    fn quadratic_command_lists_end_point_before_control() {
        let contours = parse_outline("m 0 0 q 10 0 5 10 l 5 -5", 1.0, [0.0, 0.0], 2).unwrap();
        let contour = &contours[0];
        // Halfway along the curve from (0,0) to (10,0) around (5,10).
        assert_eq!(contour[1], [5.0, 5.0]);
        assert_eq!(contour[2], [10.0, 0.0]);
    }

    #[test]
    fn line_before_move_is_rejected() {
        let err = parse_outline("l 1 1", 1.0, [0.0, 0.0], 8).unwrap_err();
        assert!(matches!(err, SceneError::Font(_)));
    }

    #[test]
    fn truncated_command_is_rejected() {
        let err = parse_outline("m 0 0 l 1", 1.0, [0.0, 0.0], 8).unwrap_err();
        assert!(matches!(err, SceneError::Font(_)));
    }
}
