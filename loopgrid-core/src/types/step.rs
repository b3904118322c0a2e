//! A single beat cell within a track.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub active: bool,
    pub velocity: f32,
}

impl Step {
    pub fn new(active: bool, velocity: f32) -> Self {
        Self {
            active,
            velocity: velocity.clamp(0.0, 1.0),
        }
    }

    /// An inactive step at the default velocity new tracks are seeded with.
    pub fn default_inactive() -> Self {
        Self {
            active: false,
            velocity: 0.8,
        }
    }

    pub fn set_velocity(&mut self, v: f32) {
        self.velocity = v.clamp(0.0, 1.0);
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::default_inactive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_clamps_on_construction() {
        assert_eq!(Step::new(true, 1.5).velocity, 1.0);
        assert_eq!(Step::new(true, -0.5).velocity, 0.0);
    }

    #[test]
    fn default_inactive_matches_pattern_manager_seed() {
        let s = Step::default_inactive();
        assert!(!s.active);
        assert_eq!(s.velocity, 0.8);
    }

    #[test]
    fn set_velocity_clamps() {
        let mut s = Step::default_inactive();
        s.set_velocity(2.0);
        assert_eq!(s.velocity, 1.0);
    }
}
