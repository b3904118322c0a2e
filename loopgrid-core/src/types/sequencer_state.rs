//! The immutable snapshot `get_state()` hands back to callers, plus the
//! running performance counters the scheduler and engine accumulate into it.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfStats {
    pub total_steps: u64,
    pub avg_latency: f64,
    pub max_latency: f64,
    pub timing_drift: f64,
}

impl PerfStats {
    /// Folds a newly observed `schedule_note` latency into the running mean.
    pub fn record_latency(&mut self, latency: f64) {
        self.total_steps += 1;
        let n = self.total_steps as f64;
        self.avg_latency += (latency - self.avg_latency) / n;
        if latency > self.max_latency {
            self.max_latency = latency;
        }
    }

    pub fn record_drift(&mut self, expected: f64, actual: f64) {
        self.timing_drift = (actual - expected).abs();
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerState {
    pub is_playing: bool,
    pub is_paused: bool,
    pub current_step: u32,
    pub bpm: f32,
    pub swing: f32,
    pub step_resolution: u32,
    pub next_step_time: f64,
    pub is_initialized: bool,
    pub perf_stats: PerfStats,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_paused: false,
            current_step: 0,
            bpm: 120.0,
            swing: 0.0,
            step_resolution: 16,
            next_step_time: 0.0,
            is_initialized: false,
            perf_stats: PerfStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_latency_tracks_running_mean_and_max() {
        let mut stats = PerfStats::default();
        stats.record_latency(10.0);
        stats.record_latency(20.0);
        assert_eq!(stats.total_steps, 2);
        assert!((stats.avg_latency - 15.0).abs() < 1e-9);
        assert_eq!(stats.max_latency, 20.0);
    }

    #[test]
    fn default_state_is_stopped_and_uninitialized() {
        let s = SequencerState::default();
        assert!(!s.is_playing);
        assert!(!s.is_initialized);
        assert_eq!(s.current_step, 0);
    }
}
