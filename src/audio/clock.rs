//! Monotonic clock and periodic tick source driving the scheduler loop.
//!
//! The clock is injected rather than read from a global so tests can
//! advance virtual time deterministically instead of sleeping for real.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration as StdDuration, Instant};

/// Default wake-up period for [`TickSource`]; must stay at or below half of
/// the scheduler's `schedule_ahead` horizon.
pub const DEFAULT_LOOKAHEAD_INTERVAL: StdDuration = StdDuration::from_millis(25);

/// A monotonic, high-resolution time source returning seconds from an
/// arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Production clock backed by `std::time::Instant`. The origin is fixed at
/// construction; only elapsed time matters to callers.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Test double: virtual time advanced explicitly, never by wall-clock sleep.
/// Exported (not `#[cfg(test)]`-gated) so integration tests in the root
/// package's `tests/` directory can use it too.
#[derive(Clone)]
pub struct ManualClock {
    now_bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now_bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    pub fn set(&self, t: f64) {
        self.now_bits.store(t.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, dt: f64) {
        let current = f64::from_bits(self.now_bits.load(Ordering::Relaxed));
        self.set(current + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::Relaxed))
    }
}

/// A single wake-up from the tick source, carrying the clock time it fired at.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub at: f64,
}

/// Periodic wake-up source driving the scheduler loop at `lookahead_interval`.
/// Runs on a dedicated thread using a hybrid sleep/spin loop to bound jitter
/// without pegging a core: it sleeps in short increments while more than
/// 500µs remain until the next tick, then busy-waits for final precision.
pub struct TickSource {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TickSource {
    pub fn spawn(clock: Arc<dyn Clock>, interval: StdDuration) -> (Self, Receiver<Tick>) {
        let (tx, rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let thread = thread::spawn(move || run_loop(clock, interval, tx, running_clone));

        (
            Self {
                running,
                thread: Some(thread),
            },
            rx,
        )
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_loop(
    clock: Arc<dyn Clock>,
    interval: StdDuration,
    tx: Sender<Tick>,
    running: Arc<AtomicBool>,
) {
    let interval_secs = interval.as_secs_f64();
    let mut next_tick_at = clock.now();

    while running.load(Ordering::Relaxed) {
        let now = clock.now();
        if now >= next_tick_at {
            if tx.send(Tick { at: now }).is_err() {
                break;
            }
            next_tick_at += interval_secs;
        } else {
            let remaining = next_tick_at - now;
            if remaining > 0.0005 {
                thread::sleep(StdDuration::from_micros(100));
            } else {
                std::hint::spin_loop();
            }
        }
    }
}

/// Test-only tick source: the caller pushes ticks explicitly instead of a
/// background thread deriving them from wall-clock time.
pub struct ManualTickSource {
    tx: Sender<Tick>,
}

impl ManualTickSource {
    pub fn new() -> (Self, Receiver<Tick>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    pub fn push(&self, at: f64) {
        let _ = self.tx.send(Tick { at });
    }
}
