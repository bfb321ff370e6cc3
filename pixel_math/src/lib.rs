pub use glam::*;

pub fn v2(a: f32, b: f32) -> Vec2 {
    Vec2::new(a, b)
}

pub fn iv2(a: i32, b: i32) -> IVec2 {
    IVec2::new(a, b)
}

/// Rotates `point` around `pivot` by `degrees`.
///
/// Screen space has y pointing down, so a positive angle turns clockwise on
/// screen.
pub fn rotate_about(point: Vec2, pivot: Vec2, degrees: f32) -> Vec2 {
    if degrees == 0.0 {
        return point;
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - pivot;

    pivot + v2(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

/// Axis-aligned bounds of a set of points as `(min, max)`.
pub fn bounds(points: &[Vec2]) -> (Vec2, Vec2) {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);

    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }

    (min, max)
}
