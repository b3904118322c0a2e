//! A single instrument lane within a pattern: a row of steps plus the
//! per-track mix/assignment state.

use super::randomization::Randomization;
use super::sample::SampleId;
use super::step::Step;

pub type TrackId = u64;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub sample_id: Option<SampleId>,
    pub volume: f32,
    pub mute: bool,
    pub solo: bool,
    pub color: String,
    pub steps: Vec<Step>,
    pub randomization: Randomization,
}

impl Track {
    pub fn new(id: TrackId, name: impl Into<String>, step_resolution: u32, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sample_id: None,
            volume: 0.8,
            mute: false,
            solo: false,
            color: color.into(),
            steps: vec![Step::default_inactive(); step_resolution as usize],
            randomization: Randomization::off(),
        }
    }

    pub fn set_volume(&mut self, v: f32) {
        self.volume = v.clamp(0.0, 1.0);
    }

    pub fn toggle_mute(&mut self) {
        self.mute = !self.mute;
    }

    pub fn toggle_solo(&mut self) {
        self.solo = !self.solo;
    }

    pub fn toggle_step(&mut self, step_idx: usize) -> bool {
        if let Some(step) = self.steps.get_mut(step_idx) {
            step.active = !step.active;
            true
        } else {
            false
        }
    }

    pub fn set_step_velocity(&mut self, step_idx: usize, velocity: f32) -> bool {
        if let Some(step) = self.steps.get_mut(step_idx) {
            step.set_velocity(velocity);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_track_is_all_inactive_at_default_velocity() {
        let t = Track::new(1, "Kick", 16, "#ff0000");
        assert_eq!(t.steps.len(), 16);
        assert!(t.steps.iter().all(|s| !s.active && s.velocity == 0.8));
    }

    #[test]
    fn toggle_step_round_trips_r1() {
        let mut t = Track::new(1, "Kick", 16, "#ff0000");
        t.toggle_step(3);
        assert!(t.steps[3].active);
        t.toggle_step(3);
        assert!(!t.steps[3].active);
    }

    #[test]
    fn toggle_step_out_of_range_is_a_no_op() {
        let mut t = Track::new(1, "Kick", 16, "#ff0000");
        assert!(!t.toggle_step(99));
    }

    #[test]
    fn set_volume_clamps() {
        let mut t = Track::new(1, "Kick", 16, "#ff0000");
        t.set_volume(5.0);
        assert_eq!(t.volume, 1.0);
    }
}
