//! The neutral, serializable record persistence and MIDI-export
//! collaborators round-trip patterns through. Decoupled from [`Pattern`]
//! itself so the live in-memory type can carry non-serializable fields
//! later without breaking the wire contract.

use super::pattern::{Pattern, PatternMetadata};
use super::randomization::Randomization;
use super::sample::SampleId;
use super::step::Step;
use super::track::TrackId;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub active: bool,
    pub velocity: f32,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub id: TrackId,
    pub name: String,
    pub sample_id: Option<SampleId>,
    pub volume: f32,
    pub mute: bool,
    pub solo: bool,
    pub color: String,
    pub steps: Vec<StepRecord>,
    pub randomization: Randomization,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRecord {
    pub id: u64,
    pub name: String,
    pub bpm: f32,
    pub swing: f32,
    pub step_resolution: u32,
    pub tracks: Vec<TrackRecord>,
    pub metadata: PatternMetadata,
}

impl From<&Pattern> for PatternRecord {
    fn from(p: &Pattern) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            bpm: p.bpm,
            swing: p.swing,
            step_resolution: p.step_resolution,
            tracks: p
                .tracks
                .iter()
                .map(|t| TrackRecord {
                    id: t.id,
                    name: t.name.clone(),
                    sample_id: t.sample_id,
                    volume: t.volume,
                    mute: t.mute,
                    solo: t.solo,
                    color: t.color.clone(),
                    steps: t
                        .steps
                        .iter()
                        .map(|s: &Step| StepRecord {
                            active: s.active,
                            velocity: s.velocity,
                        })
                        .collect(),
                    randomization: t.randomization,
                })
                .collect(),
            metadata: p.metadata,
        }
    }
}

impl From<PatternRecord> for Pattern {
    fn from(r: PatternRecord) -> Self {
        use super::track::Track;

        Pattern {
            id: r.id,
            name: r.name,
            bpm: r.bpm,
            swing: r.swing,
            step_resolution: r.step_resolution,
            tracks: r
                .tracks
                .into_iter()
                .map(|t| Track {
                    id: t.id,
                    name: t.name,
                    sample_id: t.sample_id,
                    volume: t.volume,
                    mute: t.mute,
                    solo: t.solo,
                    color: t.color,
                    steps: t
                        .steps
                        .into_iter()
                        .map(|s| Step::new(s.active, s.velocity))
                        .collect(),
                    randomization: t.randomization,
                })
                .collect(),
            metadata: r.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_all_fields_r2() {
        let original = Pattern::new(7, "Demo", 2, 16);
        let record = PatternRecord::from(&original);
        let restored: Pattern = record.into();
        assert_eq!(original, restored);
    }
}
