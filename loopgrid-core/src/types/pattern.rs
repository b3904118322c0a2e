//! The pattern data model: a named, tempo-stamped grid of tracks, plus the
//! resolution-remapping algorithm that keeps active steps at the same
//! musical position when the grid is resized.

use std::time::{SystemTime, UNIX_EPOCH};

use super::error::ConfigError;
use super::step::Step;
use super::time::{is_valid_bpm, is_valid_resolution, is_valid_swing};
use super::track::{Track, TrackId};

pub type PatternId = u64;

const DEFAULT_TRACK_NAMES: [&str; 8] = [
    "Kick", "Snare", "Hi-Hat", "Open Hat", "Crash", "Ride", "Clap", "Perc",
];

const DEFAULT_TRACK_COLORS: [&str; 8] = [
    "#e74c3c", "#3498db", "#f1c40f", "#2ecc71", "#9b59b6", "#1abc9c", "#e67e22", "#95a5a6",
];

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternMetadata {
    pub created: u64,
    pub modified: u64,
}

impl PatternMetadata {
    fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            created: secs,
            modified: secs,
        }
    }

    fn touch(&mut self) {
        self.modified = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(self.modified);
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub id: PatternId,
    pub name: String,
    pub bpm: f32,
    pub swing: f32,
    pub step_resolution: u32,
    pub tracks: Vec<Track>,
    pub metadata: PatternMetadata,
}

fn default_track_name(index: usize) -> String {
    DEFAULT_TRACK_NAMES
        .get(index)
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("Track {}", index + 1))
}

fn default_track_color(index: usize) -> &'static str {
    DEFAULT_TRACK_COLORS[index % DEFAULT_TRACK_COLORS.len()]
}

impl Pattern {
    /// Builds a fresh pattern with default-named tracks, all steps inactive,
    /// per the C4 pattern-creation contract.
    pub fn new(id: PatternId, name: impl Into<String>, num_tracks: u32, step_resolution: u32) -> Self {
        let tracks = (0..num_tracks)
            .map(|i| {
                Track::new(
                    i as u64 + 1,
                    default_track_name(i as usize),
                    step_resolution,
                    default_track_color(i as usize),
                )
            })
            .collect();

        Self {
            id,
            name: name.into(),
            bpm: 120.0,
            swing: 0.0,
            step_resolution,
            tracks,
            metadata: PatternMetadata::now(),
        }
    }

    pub fn touch(&mut self) {
        self.metadata.touch();
    }

    pub fn track_mut(&mut self, track_id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    /// True if any track in the pattern is soloed, per I6.
    pub fn has_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.solo)
    }

    /// Resizes every track's step vector to `new_resolution`, preserving
    /// musical position of active steps per §4.4, and remaps `current_step`
    /// the same way the engine remaps its own playhead.
    pub fn change_step_resolution(&mut self, new_resolution: u32) -> Result<(), ConfigError> {
        if !is_valid_resolution(new_resolution) {
            return Err(ConfigError::InvalidResolution(new_resolution));
        }
        let old_resolution = self.step_resolution;
        if new_resolution == old_resolution {
            return Ok(());
        }
        for track in &mut self.tracks {
            track.steps = remap_steps(&track.steps, old_resolution, new_resolution);
        }
        self.step_resolution = new_resolution;
        self.touch();
        Ok(())
    }
}

/// Remaps a single track's steps from `old_resolution` to `new_resolution`,
/// preserving active-step musical position.
pub fn remap_steps(steps: &[Step], old_resolution: u32, new_resolution: u32) -> Vec<Step> {
    if new_resolution == old_resolution {
        return steps.to_vec();
    }
    let mut remapped = vec![Step::default_inactive(); new_resolution as usize];
    if new_resolution > old_resolution {
        // Upsample: each active step lands at i * (new_r / old_r); velocity preserved.
        let ratio = new_resolution / old_resolution;
        for (i, step) in steps.iter().enumerate() {
            if step.active {
                let new_idx = i * ratio as usize;
                if let Some(slot) = remapped.get_mut(new_idx) {
                    *slot = *step;
                }
            }
        }
    } else {
        // Downsample: group old_r / new_r contiguous cells; active if any
        // member is active, velocity is the max among active members.
        let group_size = (old_resolution / new_resolution) as usize;
        for (new_idx, group) in steps.chunks(group_size).enumerate() {
            if new_idx >= remapped.len() {
                break;
            }
            let active = group.iter().any(|s| s.active);
            let velocity = group
                .iter()
                .filter(|s| s.active)
                .map(|s| s.velocity)
                .fold(0.0_f32, f32::max);
            remapped[new_idx] = Step::new(active, if active { velocity } else { 0.8 });
        }
    }
    remapped
}

/// Standalone validation so tests and a future serialization layer can call
/// it without going through a `PatternManager`.
pub fn validate_pattern(pattern: &Pattern) -> Result<(), ConfigError> {
    if !is_valid_bpm(pattern.bpm) {
        return Err(ConfigError::BpmOutOfRange(pattern.bpm));
    }
    if !is_valid_swing(pattern.swing) {
        return Err(ConfigError::SwingOutOfRange(pattern.swing));
    }
    if !is_valid_resolution(pattern.step_resolution) {
        return Err(ConfigError::InvalidResolution(pattern.step_resolution));
    }
    if pattern.tracks.is_empty() {
        return Err(ConfigError::EmptyPattern);
    }
    for track in &pattern.tracks {
        if track.steps.len() != pattern.step_resolution as usize {
            return Err(ConfigError::TrackStepCountMismatch {
                track_id: track.id,
                expected: pattern.step_resolution,
                actual: track.steps.len(),
            });
        }
        if !(0.0..=1.0).contains(&track.volume) {
            return Err(ConfigError::InvalidVolume(track.volume));
        }
        for step in &track.steps {
            if !(0.0..=1.0).contains(&step.velocity) {
                return Err(ConfigError::InvalidVelocity(step.velocity));
            }
        }
    }
    Ok(())
}
