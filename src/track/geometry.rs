//! Stateless 2D geometry for track construction
//!
//! Rotation about a pivot, reflection across a line, line intersection and
//! quadratic Bezier subdivision. All angles are in degrees; positive angles
//! turn counter-clockwise in the track plane.

use glam::Vec2;

use crate::consts::{BISECTION_TOLERANCE, SAMPLES_PER_UNIT};
use crate::error::{Result, TrackError};

/// Relative tolerance below which two lines count as parallel
const PARALLEL_EPSILON: f32 = 1e-6;

/// Rotate `point` about `pivot` by `angle_degrees`
#[inline]
pub fn rotate(pivot: Vec2, point: Vec2, angle_degrees: f32) -> Vec2 {
    let moved = point - pivot;
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    Vec2::new(moved.x * cos - moved.y * sin, moved.x * sin + moved.y * cos) + pivot
}

/// Translate `point` by `translation`, then rotate it about `pivot`
#[inline]
pub fn rotate_translated(pivot: Vec2, point: Vec2, angle_degrees: f32, translation: Vec2) -> Vec2 {
    rotate(pivot, point + translation, angle_degrees)
}

/// Apply [`rotate_translated`] to a whole point set
pub fn rotate_all(pivot: Vec2, points: &[Vec2], angle_degrees: f32, translation: Vec2) -> Vec<Vec2> {
    points
        .iter()
        .map(|&p| rotate_translated(pivot, p, angle_degrees, translation))
        .collect()
}

/// Reflect `point` across the infinite line through `axis_p1` and `axis_p2`
pub fn reflect(point: Vec2, axis_p1: Vec2, axis_p2: Vec2) -> Vec2 {
    let normal = (axis_p2 - axis_p1).perp().normalize();
    let v = point - axis_p1;
    v - 2.0 * v.dot(normal) * normal + axis_p1
}

pub fn reflect_all(points: &[Vec2], axis_p1: Vec2, axis_p2: Vec2) -> Vec<Vec2> {
    points.iter().map(|&p| reflect(p, axis_p1, axis_p2)).collect()
}

/// Intersection of line p1–p2 with line p3–p4
///
/// Parallel (or zero-length) lines have no single intersection and are
/// reported as [`TrackError::DegenerateGeometry`].
pub fn intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Result<Vec2> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;

    let denom = d2.y * d1.x - d2.x * d1.y;
    if denom.abs() <= PARALLEL_EPSILON * d1.length() * d2.length() {
        return Err(TrackError::DegenerateGeometry {
            context: "line intersection of parallel lines",
        });
    }

    let u = (d2.x * (p1.y - p3.y) - d2.y * (p1.x - p3.x)) / denom;
    Ok(p1 + d1 * u)
}

/// Signed angle in degrees that turns `from` onto `to`, in (-180, 180]
#[inline]
pub fn signed_angle(from: Vec2, to: Vec2) -> f32 {
    from.perp_dot(to).atan2(from.dot(to)).to_degrees()
}

/// Point on the quadratic Bezier (p0, control, p1) at parameter `t`
#[inline]
pub fn bezier_point(p0: Vec2, control: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let first = p0.lerp(control, t);
    let second = control.lerp(p1, t);
    first.lerp(second, t)
}

/// Cubic whose root is the parameter of the curve point closest to the
/// control point (zero of `(B(t) - control) · B'(t)` up to a constant)
fn control_distance_slope(p0: Vec2, control: Vec2, p1: Vec2, t: f32) -> f32 {
    let v0 = control - p0;
    let v1 = p1 - control;

    let a = (v1 - v0).length_squared();
    let b = 3.0 * (v1.dot(v0) - v0.dot(v0));
    let c = 3.0 * v0.dot(v0) - v1.dot(v0);
    let d = -v0.dot(v0);

    ((a * t + b) * t + c) * t + d
}

/// Parameter t of the curve point nearest to the control point, by bisection
///
/// The cubic is ≤ 0 at t = 0 and ≥ 0 at t = 1, so a sign change always
/// exists inside [0, 1].
pub fn nearest_to_control(p0: Vec2, control: Vec2, p1: Vec2) -> f32 {
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);

    while hi - lo > BISECTION_TOLERANCE {
        let mid = (hi - lo) * 0.5 + lo;
        let lo_value = control_distance_slope(p0, control, p1, lo);
        let mid_value = control_distance_slope(p0, control, p1, mid);

        if lo_value <= 0.0 && 0.0 <= mid_value {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    (hi - lo) * 0.5 + lo
}

/// Split a quadratic Bezier at its sharpest point, recursively
///
/// Appends `2^depth - 1` interior points to `out` in curve order (the two
/// endpoints are not included). Each level splits at the point nearest the
/// control point; the halves' control points are where the tangent at the
/// split meets the original control polygon. `depth <= 1` appends the split
/// point alone.
pub fn subdivide_bezier(
    p0: Vec2,
    control: Vec2,
    p1: Vec2,
    depth: u32,
    out: &mut Vec<Vec2>,
) -> Result<()> {
    let t = nearest_to_control(p0, control, p1);
    let split = bezier_point(p0, control, p1, t);

    if depth <= 1 {
        out.push(split);
        return Ok(());
    }

    // Tangent at the split is perpendicular to the direction towards the control point
    let tangent_end = (control - split).perp() + split;

    let left_control = intersect(p0, control, split, tangent_end)?;
    let right_control = intersect(split, tangent_end, control, p1)?;

    subdivide_bezier(p0, left_control, split, depth - 1, out)?;
    out.push(split);
    subdivide_bezier(split, right_control, p1, depth - 1, out)
}

/// Total length of a polyline (0 for fewer than two points)
pub fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Number of uniform steps for a piece of the given length
#[inline]
fn sample_steps(length: f32) -> usize {
    ((length * SAMPLES_PER_UNIT).ceil() as usize).max(1)
}

/// Uniform samples of the segment start→end, ending exactly on `end`
pub fn sample_line(start: Vec2, end: Vec2, length: f32) -> Vec<Vec2> {
    let steps = sample_steps(length);
    (0..steps)
        .map(|i| start.lerp(end, i as f32 / steps as f32))
        .chain(std::iter::once(end))
        .collect()
}

/// Uniform-in-t samples of a quadratic Bezier, ending exactly on `p1`
pub fn sample_bezier(p0: Vec2, control: Vec2, p1: Vec2, length: f32) -> Vec<Vec2> {
    let steps = sample_steps(length);
    (0..steps)
        .map(|i| bezier_point(p0, control, p1, i as f32 / steps as f32))
        .chain(std::iter::once(p1))
        .collect()
}
