//! A single track piece with three interchangeable shapes
//!
//! Every segment is built once with a straight chord and a right-hand
//! quadratic Bezier sharing the same start point. The left curve is the
//! right curve mirrored across the chord. Which of the three shapes the
//! segment presents is `(base_variant + variant_offset) mod 3`, so the
//! assembler can retry a position by cycling the offset without rebuilding
//! any geometry.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{
    polyline_length, reflect_all, rotate, rotate_all, rotate_translated, sample_bezier,
    sample_line, signed_angle, subdivide_bezier,
};
use crate::consts::*;
use crate::error::Result;

/// Shape a segment currently presents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackVariant {
    Straight,
    RightCurve,
    LeftCurve,
}

impl TrackVariant {
    pub const ALL: [TrackVariant; 3] = [
        TrackVariant::Straight,
        TrackVariant::RightCurve,
        TrackVariant::LeftCurve,
    ];

    /// Variant for an index, wrapping modulo 3
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackVariant::Straight => "Straight",
            TrackVariant::RightCurve => "RightCurve",
            TrackVariant::LeftCurve => "LeftCurve",
        }
    }
}

/// Reference point used as the "predecessor" of the first segment; the
/// seed starting at the origin therefore heads towards +y
pub const SEED_PREDECESSOR: Vec2 = Vec2::NEG_Y;

/// One piece of track
#[derive(Debug, Clone)]
pub struct TrackSegment {
    straight_start: Vec2,
    straight_end: Vec2,
    bezier_control: Vec2,
    curve_end: Vec2,

    /// Chord sample; doubles as the straight collision proxy
    straight_path: Vec<Vec2>,
    /// `[start, 15 subdivision points, curve_end]`
    right_path: Vec<Vec2>,
    left_path: Vec<Vec2>,

    right_collision_path: Vec<Vec2>,
    left_collision_path: Vec<Vec2>,

    base_variant: TrackVariant,
    variant_offset: u32,
}

impl TrackSegment {
    /// First segment of a track, with no predecessor
    pub fn seed<R: Rng + ?Sized>(anchor: Vec2, segment_length: f32, rng: &mut R) -> Result<Self> {
        Self::new(anchor, segment_length, SEED_PREDECESSOR, rng)
    }

    /// Segment starting at `anchor`, continuing the heading
    /// `predecessor -> anchor`
    ///
    /// `segment_length` must be positive and `predecessor` must differ from
    /// `anchor`. Fails with `DegenerateGeometry` if the random curve cannot
    /// be subdivided; callers redraw in that case.
    pub fn new<R: Rng + ?Sized>(
        anchor: Vec2,
        segment_length: f32,
        predecessor: Vec2,
        rng: &mut R,
    ) -> Result<Self> {
        debug_assert!(segment_length > 0.0, "segment length must be positive");
        debug_assert!(anchor != predecessor, "heading is undefined");

        let straight_start = anchor;
        let straight_end = (anchor - predecessor).normalize() * segment_length + anchor;
        let straight_path = sample_line(straight_start, straight_end, segment_length);

        // Clockwise deviation of 0..90 degrees, expressed as a 270..360 turn
        let deviation = rng.random_range(0..MAX_CURVE_DEVIATION_DEG);
        let curve_end = rotate(straight_start, straight_end, (360 - deviation) as f32);
        let bezier_control = random_control_point(straight_start, straight_end, curve_end, rng);

        let (bezier_control, curve_end) =
            readjust_curve(straight_start, straight_end, bezier_control, curve_end);

        let mut right_path = Vec::with_capacity((1 << SUBDIVISION_DEPTH) + 1);
        right_path.push(straight_start);
        subdivide_bezier(
            straight_start,
            bezier_control,
            curve_end,
            SUBDIVISION_DEPTH,
            &mut right_path,
        )?;
        right_path.push(curve_end);
        let left_path = reflect_all(&right_path, straight_start, straight_end);

        let right_collision_path =
            sample_bezier(straight_start, bezier_control, curve_end, segment_length);
        let left_collision_path = reflect_all(&right_collision_path, straight_start, straight_end);

        let base_variant = TrackVariant::from_index(rng.random_range(0..TrackVariant::ALL.len()));

        Ok(Self {
            straight_start,
            straight_end,
            bezier_control,
            curve_end,
            straight_path,
            right_path,
            left_path,
            right_collision_path,
            left_collision_path,
            base_variant,
            variant_offset: 0,
        })
    }

    /// Currently active shape
    pub fn variant(&self) -> TrackVariant {
        TrackVariant::from_index(self.base_variant.index() + self.variant_offset as usize)
    }

    pub fn base_variant(&self) -> TrackVariant {
        self.base_variant
    }

    pub fn start_point(&self) -> Vec2 {
        match self.variant() {
            TrackVariant::Straight => self.straight_start,
            TrackVariant::RightCurve => self.right_path[0],
            TrackVariant::LeftCurve => self.left_path[0],
        }
    }

    pub fn end_point(&self) -> Vec2 {
        match self.variant() {
            TrackVariant::Straight => self.straight_end,
            TrackVariant::RightCurve => self.right_path[self.right_path.len() - 1],
            TrackVariant::LeftCurve => self.left_path[self.left_path.len() - 1],
        }
    }

    /// Second-to-last point of the active shape; with the end point it gives
    /// the exit heading the next segment continues
    pub fn penultimate_point(&self) -> Vec2 {
        match self.variant() {
            TrackVariant::Straight => self.straight_start,
            TrackVariant::RightCurve => self.right_path[self.right_path.len() - 2],
            TrackVariant::LeftCurve => self.left_path[self.left_path.len() - 2],
        }
    }

    /// Dense points of the active shape, for rendering
    pub fn path(&self) -> &[Vec2] {
        self.path_for(self.variant())
    }

    pub fn path_for(&self, variant: TrackVariant) -> &[Vec2] {
        match variant {
            TrackVariant::Straight => &self.straight_path,
            TrackVariant::RightCurve => &self.right_path,
            TrackVariant::LeftCurve => &self.left_path,
        }
    }

    /// Active path without its last point, for stitching segments into one
    /// polyline without duplicated joints
    pub fn path_without_end_point(&self) -> &[Vec2] {
        let path = self.path();
        &path[..path.len() - 1]
    }

    /// Proxy points of the active shape, for overlap tests
    pub fn collision_path(&self) -> &[Vec2] {
        self.collision_path_for(self.variant())
    }

    pub fn collision_path_for(&self, variant: TrackVariant) -> &[Vec2] {
        match variant {
            TrackVariant::Straight => &self.straight_path,
            TrackVariant::RightCurve => &self.right_collision_path,
            TrackVariant::LeftCurve => &self.left_collision_path,
        }
    }

    /// Length of the active shape
    pub fn length(&self) -> f32 {
        match self.variant() {
            TrackVariant::Straight => self.straight_start.distance(self.straight_end),
            TrackVariant::RightCurve => polyline_length(&self.right_path),
            TrackVariant::LeftCurve => polyline_length(&self.left_path),
        }
    }

    /// `[straight_start, straight_end, bezier_control, curve_end]`
    pub fn debug_points(&self) -> [Vec2; 4] {
        [
            self.straight_start,
            self.straight_end,
            self.bezier_control,
            self.curve_end,
        ]
    }

    pub fn cycle_variant_offset(&mut self) {
        self.variant_offset += 1;
    }

    pub fn reset_variant_offset(&mut self) {
        self.variant_offset = 0;
    }

    pub fn variant_offset(&self) -> u32 {
        self.variant_offset
    }

    /// True if any pair of proxy points is within `track_width`
    /// (with [`COLLISION_SLACK`] applied to the squared width)
    pub fn collides_with(&self, other: &TrackSegment, track_width: f32) -> bool {
        let threshold = track_width * track_width * COLLISION_SLACK;
        let theirs = other.collision_path();

        self.collision_path()
            .iter()
            .any(|a| theirs.iter().any(|b| a.distance_squared(*b) <= threshold))
    }

    /// Rigidly move this segment so it starts at `predecessor`'s end point
    /// and continues its exit heading
    ///
    /// Every stored point set is translated then rotated about the new start,
    /// so shapes are preserved; the chord sample is regenerated in place. A
    /// negligible move leaves the segment untouched.
    pub fn adjust_all_points(&mut self, predecessor: &TrackSegment, segment_length: f32) {
        let pivot = predecessor.end_point();
        let old_direction = self.straight_end - self.straight_start;
        let new_direction = pivot - predecessor.penultimate_point();

        let angle = signed_angle(old_direction, new_direction);
        let translation = pivot - self.straight_start;

        if translation.length_squared() <= ANCHOR_TOLERANCE * ANCHOR_TOLERANCE
            && angle.abs() <= ANGLE_TOLERANCE_DEG
        {
            return;
        }

        log::trace!(
            "re-anchoring segment: translate {translation}, rotate {angle:.3} deg"
        );

        self.straight_start = pivot;
        self.straight_end = rotate_translated(pivot, self.straight_end, angle, translation);
        self.curve_end = rotate_translated(pivot, self.curve_end, angle, translation);
        self.bezier_control = rotate_translated(pivot, self.bezier_control, angle, translation);

        self.straight_path = sample_line(self.straight_start, self.straight_end, segment_length);

        self.right_path = rotate_all(pivot, &self.right_path, angle, translation);
        self.left_path = rotate_all(pivot, &self.left_path, angle, translation);

        self.right_collision_path = rotate_all(pivot, &self.right_collision_path, angle, translation);
        self.left_collision_path = rotate_all(pivot, &self.left_collision_path, angle, translation);
    }
}

/// Random control point on the left of `start -> end`, offset by
/// 0.5–1.5 chord lengths from a random point on that line
fn random_control_point<R: Rng + ?Sized>(
    start: Vec2,
    straight_end: Vec2,
    end: Vec2,
    rng: &mut R,
) -> Vec2 {
    let straight_length = straight_end.distance(start);
    let left = (end - start).perp().normalize();
    let on_line = start.lerp(end, rng.random_range(0.0..=1.0));
    let offset = rng.random_range(
        straight_length * CONTROL_OFFSET_MIN..straight_length * CONTROL_OFFSET_MAX,
    );

    on_line + left * offset
}

/// Turn control and end point about `start` so the curve leaves along the
/// straight heading
fn readjust_curve(start: Vec2, straight_end: Vec2, control: Vec2, curve_end: Vec2) -> (Vec2, Vec2) {
    let rotation = signed_angle(control - start, straight_end - start);
    (rotate(start, control, rotation), rotate(start, curve_end, rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const LENGTH: f32 = 30.0;

    fn seed_segment(seed: u64) -> TrackSegment {
        let mut rng = Pcg32::seed_from_u64(seed);
        TrackSegment::seed(Vec2::ZERO, LENGTH, &mut rng).unwrap()
    }

    fn with_variant(mut segment: TrackSegment, variant: TrackVariant) -> TrackSegment {
        while segment.variant() != variant {
            segment.cycle_variant_offset();
        }
        segment
    }

    /// Left shape mirrors right shape across the chord
    fn assert_mirrored(segment: &TrackSegment) {
        let [start, end, _, _] = segment.debug_points();
        let axis = (end - start).normalize();
        for (set_right, set_left) in [
            (
                segment.path_for(TrackVariant::RightCurve),
                segment.path_for(TrackVariant::LeftCurve),
            ),
            (
                segment.collision_path_for(TrackVariant::RightCurve),
                segment.collision_path_for(TrackVariant::LeftCurve),
            ),
        ] {
            assert_eq!(set_right.len(), set_left.len());
            for (r, l) in set_right.iter().zip(set_left) {
                let (r, l) = (*r - start, *l - start);
                assert!((axis.dot(r) - axis.dot(l)).abs() < 1e-3);
                assert!((axis.perp_dot(r) + axis.perp_dot(l)).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_seed_heads_up() {
        let segment = with_variant(seed_segment(1), TrackVariant::Straight);
        assert_eq!(segment.start_point(), Vec2::ZERO);
        assert_eq!(segment.end_point(), Vec2::new(0.0, LENGTH));
        assert_eq!(segment.penultimate_point(), Vec2::ZERO);
        assert_eq!(segment.length(), LENGTH);
    }

    #[test]
    fn test_path_shapes() {
        let segment = seed_segment(7);
        assert_eq!(segment.path_for(TrackVariant::RightCurve).len(), 17);
        assert_eq!(segment.path_for(TrackVariant::LeftCurve).len(), 17);
        // 1.5 points per unit plus the end point
        assert_eq!(segment.path_for(TrackVariant::Straight).len(), 46);
        assert_eq!(segment.collision_path_for(TrackVariant::RightCurve).len(), 46);
        // Straight uses its chord sample for both roles
        assert_eq!(
            segment.path_for(TrackVariant::Straight),
            segment.collision_path_for(TrackVariant::Straight)
        );
    }

    #[test]
    fn test_all_variants_share_start() {
        let mut segment = seed_segment(3);
        for _ in 0..3 {
            assert!(segment.start_point().distance(Vec2::ZERO) < 1e-5);
            assert_eq!(segment.path()[0], segment.start_point());
            segment.cycle_variant_offset();
        }
    }

    #[test]
    fn test_curve_ends_on_path_end() {
        let segment = seed_segment(11);
        let [start, _, control, curve_end] = segment.debug_points();
        let right = with_variant(segment.clone(), TrackVariant::RightCurve);
        assert_eq!(right.end_point(), curve_end);
        // Chord of the curve keeps the segment length
        assert!((start.distance(curve_end) - LENGTH).abs() < 1e-3);
        // Curve leaves tangentially along the straight heading (+y)
        let heading = (control - start).normalize();
        assert!(heading.distance(Vec2::Y) < 1e-4);
        // Curves are longer than their chord
        assert!(right.length() > LENGTH);
        let left = with_variant(segment, TrackVariant::LeftCurve);
        assert!((left.length() - right.length()).abs() < 1e-3);
    }

    #[test]
    fn test_variant_cycles_modulo_three() {
        let mut segment = seed_segment(5);
        let base = segment.base_variant();
        assert_eq!(segment.variant(), base);
        let mut seen = vec![segment.variant()];
        for _ in 0..2 {
            segment.cycle_variant_offset();
            seen.push(segment.variant());
        }
        seen.sort_by_key(|v| v.index());
        seen.dedup();
        assert_eq!(seen.len(), 3);

        segment.cycle_variant_offset();
        assert_eq!(segment.variant_offset(), 3);
        assert_eq!(segment.variant(), base);

        segment.reset_variant_offset();
        assert_eq!(segment.variant_offset(), 0);
    }

    #[test]
    fn test_collides_with_self_and_far_segment() {
        let a = seed_segment(1);
        assert!(a.collides_with(&a, 1.0));

        let mut rng = Pcg32::seed_from_u64(2);
        let far = TrackSegment::new(
            Vec2::new(1000.0, 1000.0),
            LENGTH,
            Vec2::new(1000.0, 999.0),
            &mut rng,
        )
        .unwrap();
        assert!(!a.collides_with(&far, 7.0));
        assert!(!far.collides_with(&a, 7.0));
    }

    #[test]
    fn test_collision_slack() {
        // Two parallel straights exactly one width apart count as touching
        let mut rng = Pcg32::seed_from_u64(9);
        let a = with_variant(
            TrackSegment::new(Vec2::ZERO, LENGTH, Vec2::NEG_Y, &mut rng).unwrap(),
            TrackVariant::Straight,
        );
        let b = with_variant(
            TrackSegment::new(Vec2::new(7.0, 0.0), LENGTH, Vec2::new(7.0, -1.0), &mut rng).unwrap(),
            TrackVariant::Straight,
        );
        assert!(a.collides_with(&b, 7.0));
        assert!(!a.collides_with(&b, 6.5));
    }

    #[test]
    fn test_adjust_moves_onto_predecessor() {
        let first = with_variant(seed_segment(21), TrackVariant::RightCurve);
        let mut rng = Pcg32::seed_from_u64(22);
        // Built somewhere unrelated, then re-anchored
        let mut second =
            TrackSegment::new(Vec2::new(-50.0, 10.0), LENGTH, Vec2::new(-49.0, 10.0), &mut rng)
                .unwrap();
        let lengths: Vec<f32> = TrackVariant::ALL
            .iter()
            .map(|v| polyline_length(second.path_for(*v)))
            .collect();

        second.adjust_all_points(&first, LENGTH);

        let exit = (first.end_point() - first.penultimate_point()).normalize();
        for variant in TrackVariant::ALL {
            let path = second.path_for(variant);
            assert!(path[0].distance(first.end_point()) < 1e-4);
            assert!(second.collision_path_for(variant)[0].distance(first.end_point()) < 1e-4);
            assert!((polyline_length(path) - lengths[variant.index()]).abs() < 1e-2);
        }
        let [start, end, _, _] = second.debug_points();
        assert_eq!(start, first.end_point());
        assert!((end - start).normalize().distance(exit) < 1e-4);
        assert_mirrored(&second);
    }

    #[test]
    fn test_adjust_is_idempotent() {
        let first = with_variant(seed_segment(31), TrackVariant::LeftCurve);
        let mut rng = Pcg32::seed_from_u64(32);
        let mut second =
            TrackSegment::new(first.end_point(), LENGTH, first.penultimate_point(), &mut rng)
                .unwrap();
        let before = second.clone();

        second.adjust_all_points(&first, LENGTH);
        for variant in TrackVariant::ALL {
            assert_eq!(second.path_for(variant), before.path_for(variant));
            assert_eq!(second.collision_path_for(variant), before.collision_path_for(variant));
        }
        assert_eq!(second.debug_points(), before.debug_points());

        // Moving once and adjusting again is also a fixed point
        let mut moved = before.clone();
        let other = with_variant(seed_segment(33), TrackVariant::RightCurve);
        moved.adjust_all_points(&other, LENGTH);
        let snapshot = moved.clone();
        moved.adjust_all_points(&other, LENGTH);
        for variant in TrackVariant::ALL {
            for (a, b) in moved.path_for(variant).iter().zip(snapshot.path_for(variant)) {
                assert!(a.distance(*b) < 1e-4);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_left_mirrors_right(seed in any::<u64>()) {
            assert_mirrored(&seed_segment(seed));
        }

        #[test]
        fn prop_collision_is_symmetric(
            seed in any::<u64>(),
            x in -40.0f32..40.0,
            y in -40.0f32..40.0,
            width in 0.5f32..20.0,
            offset_a in 0u32..3,
            offset_b in 0u32..3,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut a = TrackSegment::seed(Vec2::ZERO, LENGTH, &mut rng).unwrap();
            let anchor = Vec2::new(x, y);
            let mut b = TrackSegment::new(anchor, LENGTH, anchor - Vec2::X, &mut rng).unwrap();
            for _ in 0..offset_a {
                a.cycle_variant_offset();
            }
            for _ in 0..offset_b {
                b.cycle_variant_offset();
            }
            prop_assert_eq!(a.collides_with(&b, width), b.collides_with(&a, width));
        }
    }
}
