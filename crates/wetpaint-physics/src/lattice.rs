//! Lattice sampling of brush shapes into particle positions

use wetpaint_core::{Circle, Vec2};

/// Positions of a square lattice with the given `spacing` that fall inside
/// the union of `shapes`.
///
/// The lattice is anchored at the world origin, so overlapping circles from
/// one batch never yield duplicate points and neighbouring batches line up.
pub fn fill_circles(shapes: &[Circle], spacing: f32) -> Vec<Vec2> {
    if shapes.is_empty() || spacing <= 0.0 {
        return Vec::new();
    }

    let (mut min, mut max) = shapes[0].aabb();
    for shape in &shapes[1..] {
        let (lo, hi) = shape.aabb();
        min = min.min(lo);
        max = max.max(hi);
    }

    let first_col = (min.x / spacing).ceil() as i64;
    let last_col = (max.x / spacing).floor() as i64;
    let first_row = (min.y / spacing).ceil() as i64;
    let last_row = (max.y / spacing).floor() as i64;

    let mut points = Vec::new();
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            let point = Vec2::new(col as f32 * spacing, row as f32 * spacing);
            if shapes.iter().any(|shape| shape.contains(point)) {
                points.push(point);
            }
        }
    }
    points
}
