//! Track generation
//!
//! - `geometry`: stateless 2D primitives and Bezier subdivision
//! - `segment`: one track piece with straight/right/left variants
//! - `assembler`: backtracking placement of segments into a track

pub mod assembler;
pub mod geometry;
pub mod segment;

pub use assembler::{AssemblyStats, TrackAssembler};
pub use segment::{TrackSegment, TrackVariant};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::TrackParams;

/// A finished track, segments ordered from start to end
#[derive(Debug, Clone)]
pub struct Track {
    segments: Vec<TrackSegment>,
    params: TrackParams,
}

impl Track {
    pub fn new(segments: Vec<TrackSegment>, params: TrackParams) -> Self {
        Self { segments, params }
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    /// Parameters the track was generated with
    pub fn params(&self) -> &TrackParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_length(&self) -> f32 {
        self.segments.iter().map(TrackSegment::length).sum()
    }

    /// Whole centerline as one polyline, shared joints appearing once
    pub fn centerline(&self) -> Vec<Vec2> {
        let Some(last) = self.segments.last() else {
            return Vec::new();
        };

        let mut points: Vec<Vec2> = self
            .segments
            .iter()
            .flat_map(|s| s.path_without_end_point().iter().copied())
            .collect();
        points.push(last.end_point());
        points
    }

    /// Snapshot for renderers and debug viewers
    pub fn to_export(&self) -> TrackExport {
        TrackExport {
            params: self.params.clone(),
            total_length: self.total_length(),
            centerline: self.centerline(),
            segments: self.segments.iter().map(SegmentExport::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_export())?)
    }
}

/// Serialisable view of one accepted segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentExport {
    pub variant: TrackVariant,
    pub length: f32,
    pub path: Vec<Vec2>,
    pub collision_path: Vec<Vec2>,
    /// Straight start, straight end, Bezier control, curve end
    pub debug_points: [Vec2; 4],
}

impl From<&TrackSegment> for SegmentExport {
    fn from(segment: &TrackSegment) -> Self {
        Self {
            variant: segment.variant(),
            length: segment.length(),
            path: segment.path().to_vec(),
            collision_path: segment.collision_path().to_vec(),
            debug_points: segment.debug_points(),
        }
    }
}

/// Serialisable view of a whole track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackExport {
    pub params: TrackParams,
    pub total_length: f32,
    pub centerline: Vec<Vec2>,
    pub segments: Vec<SegmentExport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_track() -> Track {
        let params = TrackParams {
            seed: 42,
            track_length: 200.0,
            ..Default::default()
        };
        TrackAssembler::new(params).generate().unwrap()
    }

    #[test]
    fn test_empty_track() {
        let track = Track::new(Vec::new(), TrackParams::default());
        assert!(track.is_empty());
        assert_eq!(track.total_length(), 0.0);
        assert!(track.centerline().is_empty());
    }

    #[test]
    fn test_centerline_stitches_segments() {
        let track = small_track();
        let centerline = track.centerline();

        let expected: usize = track.segments().iter().map(|s| s.path().len() - 1).sum::<usize>() + 1;
        assert_eq!(centerline.len(), expected);
        assert_eq!(centerline[0], track.segments()[0].start_point());
        assert_eq!(
            *centerline.last().unwrap(),
            track.segments().last().unwrap().end_point()
        );
    }

    #[test]
    fn test_export_json() {
        let track = small_track();
        let export = track.to_export();
        assert_eq!(export.segments.len(), track.len());
        assert_eq!(export.params.seed, 42);
        for (s, e) in track.segments().iter().zip(&export.segments) {
            assert_eq!(e.variant, s.variant());
            assert_eq!(e.path, s.path());
        }

        let json = track.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["segments"].as_array().unwrap().len(), track.len());
        assert!(value["segments"][0]["variant"].is_string());
        assert!(value["centerline"][0].is_array());
    }
}
