//! Polygon geometry for bodies and the playfield
//!
//! All polygons here are convex (regular polygons and axis-aligned boxes), so
//! overlap is decided with a separating-axis test. Points use screen space:
//! x grows right, y grows down, and positive angles turn clockwise on screen.

use glam::Vec2;
use std::f32::consts::TAU;

use crate::consts::OVERLAP_EPSILON;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square of side `2 * half` centered on `center`
    pub fn around(center: Vec2, half: f32) -> Self {
        Self::new(center - Vec2::splat(half), center + Vec2::splat(half))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True if `other` lies entirely inside (edges inclusive)
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Corners in winding order, usable as a polygon
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// Edge segments: top, bottom, left, right
    pub fn edges(&self) -> [Segment; 4] {
        let top_right = Vec2::new(self.max.x, self.min.y);
        let bottom_left = Vec2::new(self.min.x, self.max.y);
        [
            Segment::new(self.min, top_right),
            Segment::new(bottom_left, self.max),
            Segment::new(self.min, bottom_left),
            Segment::new(top_right, self.max),
        ]
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }
}

/// Vertex offsets of a regular polygon around the origin.
///
/// Points are evenly spaced on a circle of `radius`, the first one at
/// `-initial_angle_deg` (taken modulo 360). Computed once per body type and
/// never mutated; absolute points are always derived from these offsets so
/// rounding error does not accumulate into the shape.
pub fn build_outline(sides: u32, initial_angle_deg: f32, radius: f32) -> Vec<Vec2> {
    let theta = TAU / sides as f32;
    let offset = (-initial_angle_deg % 360.0).to_radians();
    (0..sides)
        .map(|i| {
            let a = theta * i as f32 + offset;
            Vec2::new(a.cos() * radius, a.sin() * radius)
        })
        .collect()
}

/// Rotate each offset by `angle` and translate by `center`, writing into `out`
pub fn transform_into(outline: &[Vec2], angle: f32, center: Vec2, out: &mut [Vec2]) {
    let rotation = Vec2::from_angle(angle);
    for (dst, offset) in out.iter_mut().zip(outline) {
        *dst = center + rotation.rotate(*offset);
    }
}

/// Unsigned area via the shoelace formula
pub fn area(points: &[Vec2]) -> f32 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.perp_dot(b);
    }
    (sum / 2.0).abs()
}

/// Smallest axis-aligned box holding every point
pub fn bounding_box(points: &[Vec2]) -> Aabb {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }
    Aabb::new(min, max)
}

fn project(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for p in points {
        let d = p.dot(axis);
        lo = lo.min(d);
        hi = hi.max(d);
    }
    (lo, hi)
}

/// True if some edge normal of `edges_of` separates `a` from `b`.
///
/// Projections that only meet (within `OVERLAP_EPSILON`) count as separated,
/// so polygons sharing an edge or a vertex do not overlap.
fn has_separating_axis(edges_of: &[Vec2], a: &[Vec2], b: &[Vec2]) -> bool {
    let n = edges_of.len();
    for i in 0..n {
        let edge = edges_of[(i + 1) % n] - edges_of[i];
        let Some(axis) = edge.perp().try_normalize() else {
            continue;
        };
        let (a_lo, a_hi) = project(a, axis);
        let (b_lo, b_hi) = project(b, axis);
        if a_hi <= b_lo + OVERLAP_EPSILON || b_hi <= a_lo + OVERLAP_EPSILON {
            return true;
        }
    }
    false
}

/// True if two convex polygons overlap with non-zero area
pub fn polygons_overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    !has_separating_axis(a, a, b) && !has_separating_axis(b, a, b)
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

fn within_span(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// True if two segments touch or cross (endpoints and collinear overlap included)
pub fn segments_intersect(s: Segment, t: Segment) -> bool {
    let d1 = orientation(t.start, t.end, s.start);
    let d2 = orientation(t.start, t.end, s.end);
    let d3 = orientation(s.start, s.end, t.start);
    let d4 = orientation(s.start, s.end, t.end);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_span(t.start, t.end, s.start))
        || (d2 == 0.0 && within_span(t.start, t.end, s.end))
        || (d3 == 0.0 && within_span(s.start, s.end, t.start))
        || (d4 == 0.0 && within_span(s.start, s.end, t.end))
}

/// True if the segment touches any edge of the polygon
pub fn segment_intersects_polygon(segment: Segment, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    (0..n).any(|i| segments_intersect(segment, Segment::new(polygon[i], polygon[(i + 1) % n])))
}

const GREEK_DIGITS: [&str; 10] = [
    "", "hena", "di", "tri", "tetra", "penta", "hexa", "hepta", "octa", "ennea",
];

/// Conventional name of a polygon with the given number of sides
pub fn polygon_name(sides: u32) -> String {
    if sides > 999 {
        return format!("{sides}-gon");
    }

    let hundreds = (sides / 100 % 10) as usize;
    let tens = (sides / 10 % 10) as usize;
    let ones = (sides % 10) as usize;

    let mut name = String::new();
    match hundreds {
        0 => {}
        1 => name.push_str("hecto"),
        h => {
            name.push_str(GREEK_DIGITS[h]);
            name.push_str("hecta");
        }
    }

    match tens {
        0 => {}
        1 => {
            // 10-19 have their own forms
            match ones {
                0 => {}
                1 => name.push_str("un"),
                2 => name.push_str("do"),
                3 => name.push_str("tris"),
                o => name.push_str(GREEK_DIGITS[o]),
            }
            name.push_str("decagon");
            return capitalize(&name);
        }
        2 => name.push_str(if ones > 0 { "icosi" } else { "icosa" }),
        3 => name.push_str("triaconta"),
        t => {
            name.push_str(GREEK_DIGITS[t]);
            name.push_str("conta");
        }
    }
    if tens > 0 && ones > 0 {
        name.push_str("kai");
    }

    name.push_str(GREEK_DIGITS[ones]);
    name.push_str("gon");
    capitalize(&name)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
