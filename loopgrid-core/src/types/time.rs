//! Pure time-math helpers shared by the scheduler and pattern manager.
//!
//! Everything here is plain `f64` arithmetic over seconds; there is no
//! dependency on a clock or a thread so the formulas can be checked in
//! isolation.

pub const MIN_BPM: f32 = 60.0;
pub const MAX_BPM: f32 = 200.0;
pub const MIN_SWING: f32 = 0.0;
pub const MAX_SWING: f32 = 100.0;
pub const VALID_RESOLUTIONS: [u32; 4] = [8, 16, 32, 64];

pub fn is_valid_bpm(bpm: f32) -> bool {
    (MIN_BPM..=MAX_BPM).contains(&bpm)
}

pub fn is_valid_swing(swing: f32) -> bool {
    (MIN_SWING..=MAX_SWING).contains(&swing)
}

pub fn is_valid_resolution(resolution: u32) -> bool {
    VALID_RESOLUTIONS.contains(&resolution)
}

pub fn seconds_per_beat(bpm: f32) -> f64 {
    60.0 / bpm as f64
}

pub fn steps_per_beat(step_resolution: u32) -> f64 {
    step_resolution as f64 / 4.0
}

/// Duration, in seconds, of a single step at the given tempo and resolution.
pub fn step_duration(bpm: f32, step_resolution: u32) -> f64 {
    seconds_per_beat(bpm) / steps_per_beat(step_resolution)
}

/// Swing delay applied to odd-indexed steps, in seconds.
pub fn swing_delay(step_duration_secs: f64, swing: f32) -> f64 {
    step_duration_secs * 0.30 * (swing as f64 / 100.0)
}

/// Applies the swing algorithm: even steps are untouched, odd steps are
/// delayed by [`swing_delay`].
pub fn apply_swing(time: f64, step_idx: u32, step_duration_secs: f64, swing: f32) -> f64 {
    if step_idx % 2 == 1 {
        time + swing_delay(step_duration_secs, swing)
    } else {
        time
    }
}

/// Remaps a step index from one resolution to another, preserving musical
/// position, per the current-step remapping rule.
pub fn remap_step_index(old_step: u32, old_resolution: u32, new_resolution: u32) -> u32 {
    let old_step = old_step as f64;
    let old_resolution = old_resolution as f64;
    let new_resolution_f = new_resolution as f64;
    ((old_step * new_resolution_f / old_resolution).floor() as u32) % new_resolution.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_duration_boundary_b1() {
        assert!((step_duration(60.0, 64) - 0.0625).abs() < 1e-9);
    }

    #[test]
    fn step_duration_boundary_b2() {
        assert!((step_duration(200.0, 8) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn bpm_range_rejects_out_of_bounds() {
        assert!(!is_valid_bpm(50.0));
        assert!(!is_valid_bpm(201.0));
        assert!(is_valid_bpm(60.0));
        assert!(is_valid_bpm(200.0));
    }

    #[test]
    fn resolution_rejects_unlisted_values() {
        assert!(!is_valid_resolution(12));
        assert!(is_valid_resolution(32));
    }

    #[test]
    fn swing_delay_formula_p2() {
        let dur = step_duration(120.0, 16);
        let delay = swing_delay(dur, 50.0);
        assert!((delay - dur * 0.3 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn swing_zero_is_identity_p6() {
        let dur = step_duration(120.0, 16);
        assert_eq!(apply_swing(10.0, 1, dur, 0.0), 10.0);
    }

    #[test]
    fn even_steps_never_swing() {
        let dur = step_duration(120.0, 16);
        assert_eq!(apply_swing(10.0, 4, dur, 100.0), 10.0);
    }

    #[test]
    fn remap_matches_scenario_s4() {
        assert_eq!(remap_step_index(4, 16, 32), 8);
    }

    #[test]
    fn remap_matches_boundary_b4() {
        assert_eq!(remap_step_index(12, 16, 8), 6);
    }
}
