//! Track generation parameters
//!
//! Read once at the start of a run and passed to the assembler by value.
//! Persisted as JSON; missing fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parameters of one generation run
///
/// Dimensions are trusted: lengths and width must be positive and the rail
/// dimensions non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackParams {
    /// RNG seed; identical parameters give an identical track
    pub seed: u64,
    /// Generation stops once the total length reaches this
    pub track_length: f32,
    /// Chord length of a single segment
    pub segment_length: f32,
    /// Track width, also the minimum clearance between non-adjacent segments
    pub segment_width: f32,

    // === Renderer pass-through ===
    pub rail_width: f32,
    pub rail_height: f32,

    /// Rollbacks allowed before giving up with `RetryLimitExceeded`
    pub max_rollbacks: u32,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            seed: 0,
            track_length: 2500.0,
            segment_length: 30.0,
            segment_width: 7.0,

            rail_width: 0.5,
            rail_height: 1.0,

            max_rollbacks: 100_000,
        }
    }
}

impl TrackParams {
    /// Defaults with the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load parameters from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let params = Self::from_json(&json)?;
        log::info!("Loaded track parameters from {}", path.display());
        Ok(params)
    }

    /// Save parameters to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Track parameters saved to {}", path.display());
        Ok(())
    }
}
