//! Lookahead audio scheduler: converts tempo, resolution, swing, and
//! randomization into note-trigger times anchored to a monotonic clock.
//!
//! The scheduler never spawns a thread and never calls back into the
//! sequencer engine directly. `tick` returns the steps that became due;
//! the owning engine decides what, if anything, to trigger for them and
//! calls `schedule_note` itself. This keeps pattern lookup out of the
//! scheduler and avoids a callback cycle between engine and scheduler.

use std::time::Instant;

use loopgrid_core::{ConfigError, NoteTrigger, PerfStats, SampleId, TrackId};

use crate::audio::sample_player::{PlaybackError, SamplePlayer};

pub const LOOKAHEAD_INTERVAL_MS: u64 = 25;
pub const SCHEDULE_AHEAD_SECS: f64 = 0.100;

/// Minimum velocity a triggered note is clamped to, preventing inaudible
/// hits under heavy randomization. Exposed as a parameter rather than a
/// hardcoded constant.
pub const DEFAULT_VELOCITY_FLOOR: f32 = 0.1;

/// Uniform [0, 1) random stream, injectable so tests can supply a
/// deterministic sequence.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

/// Production randomization backed by `rand`'s `StdRng`.
pub struct StdRandomSource {
    rng: rand::rngs::StdRng,
}

impl StdRandomSource {
    pub fn new() -> Self {
        use rand::SeedableRng;
        Self {
            rng: rand::rngs::StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandomSource {
    fn next_f64(&mut self) -> f64 {
        use rand::Rng;
        self.rng.gen::<f64>()
    }
}

/// A step that became due during a scheduler tick, carrying the
/// swing-adjusted clock time it should fire at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DueStep {
    pub step_idx: u32,
    pub when: f64,
}

/// Plain, non-threaded scheduler state. Owned exclusively by the
/// sequencer engine.
pub struct Scheduler {
    bpm: f32,
    swing: f32,
    step_resolution: u32,
    next_step_time: f64,
    current_step: u32,
    is_running: bool,
    velocity_floor: f32,
    stats: PerfStats,
}

impl Scheduler {
    pub fn new(bpm: f32, swing: f32, step_resolution: u32) -> Self {
        Self {
            bpm,
            swing,
            step_resolution,
            next_step_time: 0.0,
            current_step: 0,
            is_running: false,
            velocity_floor: DEFAULT_VELOCITY_FLOOR,
            stats: PerfStats::default(),
        }
    }

    pub fn with_velocity_floor(mut self, floor: f32) -> Self {
        self.velocity_floor = floor.clamp(0.0, 1.0);
        self
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn next_step_time(&self) -> f64 {
        self.next_step_time
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    pub fn step_resolution(&self) -> u32 {
        self.step_resolution
    }

    pub fn stats(&self) -> PerfStats {
        self.stats
    }

    /// Folds an expected-vs-actual step time observation into `timing_drift`.
    pub fn record_drift(&mut self, expected: f64, actual: f64) {
        self.stats.record_drift(expected, actual);
    }

    fn step_duration(&self) -> f64 {
        loopgrid_core::time::step_duration(self.bpm, self.step_resolution)
    }

    pub fn start(&mut self, now: f64) {
        self.next_step_time = now;
        self.current_step = 0;
        self.is_running = true;
        self.stats = PerfStats::default();
    }

    pub fn stop(&mut self) {
        self.is_running = false;
        self.current_step = 0;
        self.next_step_time = 0.0;
    }

    /// Preserves `current_step` and `next_step_time`; the engine stops the
    /// tick source separately.
    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Re-anchors to `now`, forgetting musical phase. See the design
    /// decision recorded for resume-after-pause policy.
    pub fn resume(&mut self, now: f64) {
        self.next_step_time = now;
        self.is_running = true;
    }

    pub fn set_bpm(&mut self, bpm: f32, now: f64) -> Result<(), ConfigError> {
        if !loopgrid_core::time::is_valid_bpm(bpm) {
            return Err(ConfigError::BpmOutOfRange(bpm));
        }
        self.bpm = bpm;
        self.reanchor_if_running(now);
        Ok(())
    }

    pub fn set_swing(&mut self, swing: f32, now: f64) -> Result<(), ConfigError> {
        if !loopgrid_core::time::is_valid_swing(swing) {
            return Err(ConfigError::SwingOutOfRange(swing));
        }
        self.swing = swing;
        self.reanchor_if_running(now);
        Ok(())
    }

    pub fn set_resolution(&mut self, resolution: u32, now: f64) -> Result<(), ConfigError> {
        if !loopgrid_core::time::is_valid_resolution(resolution) {
            return Err(ConfigError::InvalidResolution(resolution));
        }
        self.current_step = loopgrid_core::time::remap_step_index(
            self.current_step,
            self.step_resolution,
            resolution,
        );
        self.step_resolution = resolution;
        self.reanchor_if_running(now);
        Ok(())
    }

    /// Re-anchors one step duration ahead of `now` rather than at `now`
    /// itself, so a sharp BPM drop doesn't trigger a schedule-ahead
    /// catch-up burst for the step already in flight.
    fn reanchor_if_running(&mut self, now: f64) {
        if self.is_running {
            self.next_step_time = now + self.step_duration();
        }
    }

    /// Runs the lookahead loop: while the next step falls within
    /// `schedule_ahead` of `now`, emit it (with swing applied) and advance.
    pub fn tick(&mut self, now: f64) -> Vec<DueStep> {
        if !self.is_running {
            return Vec::new();
        }
        let mut due = Vec::new();
        let step_duration = self.step_duration();
        while self.next_step_time < now + SCHEDULE_AHEAD_SECS {
            let swung = loopgrid_core::time::apply_swing(
                self.next_step_time,
                self.current_step,
                step_duration,
                self.swing,
            );
            due.push(DueStep {
                step_idx: self.current_step,
                when: swung,
            });
            self.current_step = (self.current_step + 1) % self.step_resolution;
            self.next_step_time += step_duration;
        }
        due
    }

    /// Applies velocity/timing randomization and forwards the trigger to
    /// `player`. Called by the engine after `tick`, never from within it.
    pub fn schedule_note(
        &mut self,
        time: f64,
        sample_id: SampleId,
        velocity: f32,
        velocity_jitter: RandomParamInput,
        timing_jitter: RandomParamInput,
        track_id: TrackId,
        rng: &mut dyn RandomSource,
        player: &dyn SamplePlayer,
    ) -> Result<(), PlaybackError> {
        let start = Instant::now();

        let adjusted_velocity = if velocity_jitter.enabled {
            let r = rng.next_f64() as f32;
            (velocity + (r - 0.5) * 2.0 * (velocity_jitter.amount / 100.0))
                .clamp(self.velocity_floor, 1.0)
        } else {
            velocity.max(self.velocity_floor)
        };

        let step_duration = self.step_duration();
        let adjusted_time = if timing_jitter.enabled {
            let r = rng.next_f64();
            time + (r - 0.5) * 2.0 * step_duration * 0.10 * (timing_jitter.amount as f64 / 100.0)
        } else {
            time
        };

        let trigger = NoteTrigger::new(sample_id, adjusted_time, adjusted_velocity, track_id);
        let result = player.play(trigger);

        let latency = start.elapsed().as_secs_f64();
        self.stats.record_latency(latency);

        result
    }
}

/// A minimal view of a [`loopgrid_core::RandomParam`] the scheduler needs,
/// decoupled so callers can pass either a pattern's actual randomization
/// settings or a one-off override.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomParamInput {
    pub enabled: bool,
    pub amount: f32,
}

impl From<loopgrid_core::RandomParam> for RandomParamInput {
    fn from(p: loopgrid_core::RandomParam) -> Self {
        Self {
            enabled: p.enabled,
            amount: p.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sample_player::NullPlayer;

    struct FixedRandom(f64);
    impl RandomSource for FixedRandom {
        fn next_f64(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn start_anchors_to_now_and_resets_step() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        s.start(5.0);
        assert_eq!(s.current_step(), 0);
        assert_eq!(s.next_step_time(), 5.0);
        assert!(s.is_running());
    }

    #[test]
    fn stop_resets_step_and_time() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        s.start(5.0);
        s.tick(5.2);
        s.stop();
        assert_eq!(s.current_step(), 0);
        assert_eq!(s.next_step_time(), 0.0);
        assert!(!s.is_running());
    }

    #[test]
    fn tick_emits_steps_within_schedule_ahead_s1() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        s.start(0.0);
        let due = s.tick(0.0);
        // step_duration at 120bpm/16res = 0.125s; schedule_ahead=0.1s, so
        // only step 0 (at t=0) is due initially.
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].step_idx, 0);
        assert_eq!(due[0].when, 0.0);
    }

    #[test]
    fn tick_advances_step_index_wrapping_at_resolution_p8() {
        let mut s = Scheduler::new(120.0, 0.0, 4);
        s.start(0.0);
        for _ in 0..4 {
            s.tick(1000.0); // force catch-up across the whole pattern
        }
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn swing_zero_keeps_grid_times_p6() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        s.start(0.0);
        let due = s.tick(0.5);
        for (i, d) in due.iter().enumerate() {
            let expected = i as f64 * 0.125;
            assert!((d.when - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn swing_offsets_odd_steps_by_formula_p2() {
        let mut s = Scheduler::new(120.0, 50.0, 16);
        s.start(0.0);
        let due = s.tick(0.2);
        let step_duration = 0.125;
        let expected_delay = step_duration * 0.3 * 0.5;
        let odd = due.iter().find(|d| d.step_idx == 1).unwrap();
        assert!((odd.when - (step_duration + expected_delay)).abs() < 1e-9);
        let even = due.iter().find(|d| d.step_idx == 0).unwrap();
        assert_eq!(even.when, 0.0);
    }

    #[test]
    fn set_bpm_rejects_out_of_range_b3() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        assert!(s.set_bpm(250.0, 0.0).is_err());
        assert_eq!(s.bpm(), 120.0);
    }

    #[test]
    fn set_bpm_reanchors_one_new_step_ahead_when_running() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        s.start(0.0);
        s.set_bpm(60.0, 1.0).unwrap();
        let expected_step_duration = loopgrid_core::time::step_duration(60.0, 16);
        assert!((s.next_step_time() - (1.0 + expected_step_duration)).abs() < 1e-9);
    }

    #[test]
    fn randomization_identity_when_amount_zero_p7() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        let mut rng = FixedRandom(0.9);
        let player = NullPlayer::default();
        let jitter = RandomParamInput {
            enabled: true,
            amount: 0.0,
        };
        s.schedule_note(1.0, 1, 0.5, jitter, jitter, 1, &mut rng, &player)
            .unwrap();
        let played = player.last().unwrap();
        assert_eq!(played.when, 1.0);
        assert_eq!(played.velocity, 0.5);
    }

    #[test]
    fn velocity_floor_clamps_low_results() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        let mut rng = FixedRandom(0.0); // (rng-0.5)*2 == -1.0, worst case jitter
        let player = NullPlayer::default();
        let jitter = RandomParamInput {
            enabled: true,
            amount: 100.0,
        };
        s.schedule_note(0.0, 1, 0.05, jitter, RandomParamInput::default(), 1, &mut rng, &player)
            .unwrap();
        let played = player.last().unwrap();
        assert!(played.velocity >= DEFAULT_VELOCITY_FLOOR);
    }

    #[test]
    fn resolution_remap_preserves_current_step_s4() {
        let mut s = Scheduler::new(120.0, 0.0, 16);
        s.start(0.0);
        for _ in 0..4 {
            s.tick(1000.0);
        }
        // after 4 ticks current_step wrapped back through the pattern a few
        // times; pin it explicitly to exercise the remap formula directly.
        let mut s2 = Scheduler::new(120.0, 0.0, 16);
        s2.start(0.0);
        s2.tick(0.5); // advances current_step to some value < 16
        let before = s2.current_step();
        s2.set_resolution(32, 0.5).unwrap();
        let expected = loopgrid_core::time::remap_step_index(before, 16, 32);
        assert_eq!(s2.current_step(), expected);
    }
}
