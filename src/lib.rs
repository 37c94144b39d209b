//! Racetrack Gen - procedural non-self-intersecting racetrack centerlines
//!
//! Core modules:
//! - `track`: Segment geometry and the backtracking assembler
//! - `params`: Generation parameters with JSON persistence
//! - `error`: Error type shared by all modules
//!
//! Generation is deterministic: the same [`TrackParams`] (seed included)
//! always produce the same segment sequence.

pub mod error;
pub mod params;
pub mod track;

pub use error::{Result, TrackError};
pub use params::TrackParams;
pub use track::{
    AssemblyStats, SegmentExport, Track, TrackAssembler, TrackExport, TrackSegment, TrackVariant,
};

/// Generation constants
pub mod consts {
    /// Points per unit of length for chord samples and collision proxies
    pub const SAMPLES_PER_UNIT: f32 = 1.5;
    /// Bezier subdivision depth; yields 2^4 - 1 = 15 interior curve points
    pub const SUBDIVISION_DEPTH: u32 = 4;
    /// Width of the t-interval at which nearest-point bisection stops
    pub const BISECTION_TOLERANCE: f32 = 5e-6;

    /// Multiplier on the squared track width in collision tests (5% extra clearance)
    pub const COLLISION_SLACK: f32 = 1.05;
    /// Curves turn clockwise by a whole number of degrees in 0..90,
    /// i.e. a rotation of 271..=360 degrees
    pub const MAX_CURVE_DEVIATION_DEG: u32 = 90;
    /// Bezier control point offset from the chord, in segment lengths
    pub const CONTROL_OFFSET_MIN: f32 = 0.5;
    pub const CONTROL_OFFSET_MAX: f32 = 1.5;

    /// Straight, right curve, left curve
    pub const VARIANT_COUNT: u32 = 3;
    /// Distance below which two anchor points are treated as the same point
    pub const ANCHOR_TOLERANCE: f32 = 1e-5;
    /// Rotation (degrees) below which re-anchoring is skipped
    pub const ANGLE_TOLERANCE_DEG: f32 = 1e-4;
    /// Fresh random draws allowed when a segment's curve is degenerate
    pub const MAX_DEGENERATE_REDRAWS: u32 = 16;
}

/// Generate a track in one call
pub fn generate(params: &TrackParams) -> Result<Track> {
    TrackAssembler::new(params.clone()).generate()
}
