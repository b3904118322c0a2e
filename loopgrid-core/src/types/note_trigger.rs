//! The request the scheduler hands to an external `SamplePlayer` sink once
//! randomization and velocity scaling have been applied.

use super::sample::SampleId;
use super::track::TrackId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteTrigger {
    pub sample_id: SampleId,
    pub when: f64,
    pub velocity: f32,
    pub track_id: TrackId,
}

impl NoteTrigger {
    pub fn new(sample_id: SampleId, when: f64, velocity: f32, track_id: TrackId) -> Self {
        Self {
            sample_id,
            when,
            velocity: velocity.clamp(0.0, 1.0),
            track_id,
        }
    }
}
