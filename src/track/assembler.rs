//! Backtracking track assembly
//!
//! Segments are placed end to end on an accepted stack. The segment being
//! placed is the top of a pending stack; it is tested against everything
//! already accepted except its direct predecessor (which always touches it).
//! A colliding segment cycles to its next variant. Once all three variants
//! have failed, the accepted top is popped, forced onto its next variant and
//! retried before the exhausted segment gets another go at the new tail.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::Track;
use super::segment::TrackSegment;
use crate::consts::{ANCHOR_TOLERANCE, MAX_DEGENERATE_REDRAWS, VARIANT_COUNT};
use crate::error::{Result, TrackError};
use crate::params::TrackParams;

/// Counters for the last generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Times an accepted segment was popped to retry it
    pub rollbacks: u32,
    /// Variant switches after a collision
    pub cycles: u32,
    /// Segments constructed (including the seed)
    pub segments_built: u32,
    /// Constructions redrawn after degenerate geometry
    pub redraws: u32,
}

/// Outcome of one assembly step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Spawned,
    Accepted,
    Cycled,
    RolledBack,
}

/// Generates tracks from a parameter set
///
/// Each call to [`TrackAssembler::generate`] reseeds the RNG and starts from
/// empty stacks, so repeated runs with the same parameters are identical.
pub struct TrackAssembler {
    params: TrackParams,
    rng: Pcg32,
    accepted: Vec<TrackSegment>,
    pending: Vec<TrackSegment>,
    stats: AssemblyStats,
}

impl TrackAssembler {
    pub fn new(params: TrackParams) -> Self {
        let rng = Pcg32::seed_from_u64(params.seed);
        Self {
            params,
            rng,
            accepted: Vec::new(),
            pending: Vec::new(),
            stats: AssemblyStats::default(),
        }
    }

    pub fn params(&self) -> &TrackParams {
        &self.params
    }

    /// Replace the parameters used by the next run
    pub fn set_params(&mut self, params: TrackParams) {
        self.params = params;
    }

    pub fn stats(&self) -> AssemblyStats {
        self.stats
    }

    /// Run the assembly to completion
    ///
    /// Fails with `RetryLimitExceeded` when more than `max_rollbacks`
    /// rollbacks are needed; nothing of the failed run is kept.
    pub fn generate(&mut self) -> Result<Track> {
        self.reset();
        log::info!(
            "Generating track: seed={}, length={}, segment={}x{}",
            self.params.seed,
            self.params.track_length,
            self.params.segment_length,
            self.params.segment_width
        );

        match self.assemble() {
            Ok(segments) => {
                let track = Track::new(segments, self.params.clone());
                log::info!(
                    "Track done: {} segments, length {:.2}, {} rollbacks, {} cycles",
                    track.len(),
                    track.total_length(),
                    self.stats.rollbacks,
                    self.stats.cycles
                );
                Ok(track)
            }
            Err(err) => {
                self.accepted.clear();
                self.pending.clear();
                Err(err)
            }
        }
    }

    fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.params.seed);
        self.accepted.clear();
        self.pending.clear();
        self.stats = AssemblyStats::default();
    }

    fn assemble(&mut self) -> Result<Vec<TrackSegment>> {
        debug_assert!(self.params.track_length > 0.0, "track length must be positive");
        debug_assert!(self.params.segment_length > 0.0, "segment length must be positive");
        debug_assert!(self.params.segment_width > 0.0, "segment width must be positive");

        let seed = self.build_segment(None)?;
        self.accepted.push(seed);
        let mut total_length = self.accepted_length();

        while total_length < self.params.track_length {
            let step = self.step()?;
            log::trace!(
                "{step:?}: accepted={}, pending={}",
                self.accepted.len(),
                self.pending.len()
            );
            if step == Step::Accepted {
                total_length = self.accepted_length();
            }
        }

        self.pending.clear();
        Ok(std::mem::take(&mut self.accepted))
    }

    fn step(&mut self) -> Result<Step> {
        let Some(mut current) = self.pending.pop() else {
            let anchor = self
                .accepted
                .last()
                .map(|top| (top.end_point(), top.penultimate_point()));
            let segment = self.build_segment(anchor)?;
            self.pending.push(segment);
            return Ok(Step::Spawned);
        };

        // The tail may have moved since this segment was last placed
        if let Some(top) = self.accepted.last() {
            if !current
                .start_point()
                .abs_diff_eq(top.end_point(), ANCHOR_TOLERANCE)
            {
                current.adjust_all_points(top, self.params.segment_length);
            }
        }

        if current.variant_offset() >= VARIANT_COUNT {
            current.reset_variant_offset();
            // An exhausted seed has nothing to collide with and is simply re-placed
            if !self.accepted.is_empty() {
                self.pending.push(current);
                self.roll_back()?;
                return Ok(Step::RolledBack);
            }
        }

        if self.collides_with_track(&current) {
            current.cycle_variant_offset();
            self.stats.cycles += 1;
            self.pending.push(current);
            return Ok(Step::Cycled);
        }

        self.accepted.push(current);
        Ok(Step::Accepted)
    }

    /// Pop the accepted top, move it to its next variant and make it pending
    fn roll_back(&mut self) -> Result<()> {
        self.stats.rollbacks += 1;
        if self.stats.rollbacks > self.params.max_rollbacks {
            log::warn!(
                "Giving up after {} rollbacks at depth {}",
                self.stats.rollbacks,
                self.accepted.len()
            );
            return Err(TrackError::RetryLimitExceeded {
                rollbacks: self.stats.rollbacks,
            });
        }

        if let Some(mut previous) = self.accepted.pop() {
            previous.cycle_variant_offset();
            log::debug!(
                "Rolling back to segment {} (offset {})",
                self.accepted.len(),
                previous.variant_offset()
            );
            self.pending.push(previous);
        }
        Ok(())
    }

    /// Test against every accepted segment except the direct predecessor
    fn collides_with_track(&self, segment: &TrackSegment) -> bool {
        let earlier = &self.accepted[..self.accepted.len().saturating_sub(1)];
        earlier
            .iter()
            .any(|other| segment.collides_with(other, self.params.segment_width))
    }

    /// Build a segment at `anchor` (end point, heading reference) or a seed
    /// at the origin, redrawing on degenerate geometry
    fn build_segment(&mut self, anchor: Option<(Vec2, Vec2)>) -> Result<TrackSegment> {
        let segment_length = self.params.segment_length;
        let mut redraws = 0;

        loop {
            let built = match anchor {
                Some((start, predecessor)) => {
                    TrackSegment::new(start, segment_length, predecessor, &mut self.rng)
                }
                None => TrackSegment::seed(Vec2::ZERO, segment_length, &mut self.rng),
            };

            match built {
                Ok(segment) => {
                    self.stats.segments_built += 1;
                    return Ok(segment);
                }
                Err(err @ TrackError::DegenerateGeometry { .. })
                    if redraws < MAX_DEGENERATE_REDRAWS =>
                {
                    log::debug!("Redrawing segment: {err}");
                    redraws += 1;
                    self.stats.redraws += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn accepted_length(&self) -> f32 {
        self.accepted.iter().map(TrackSegment::length).sum()
    }
}
