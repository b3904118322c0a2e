//! Transport state machine that owns the scheduler, reacts to its step
//! notifications by performing pattern lookup, and publishes step/state
//! events. Runs as a dedicated actor thread selecting over a command
//! channel and the tick source's channel, mirroring the single
//! control-thread requirement: all scheduler/pattern/sample mutation
//! happens inside this loop.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use loopgrid_core::{ConfigError, SequencerState};

use crate::audio::clock::{Clock, Tick, TickSource, DEFAULT_LOOKAHEAD_INTERVAL};
use crate::audio::event_bus::{EventBus, SubscriptionId};
use crate::audio::pattern_manager::PatternManager;
use crate::audio::sample_player::SamplePlayer;
use crate::audio::sample_registry::SampleRegistry;
use crate::audio::scheduler::{RandomParamInput, Scheduler, StdRandomSource};

/// Thin stand-in for "the audio context" dependency real engines suspend
/// on; low-level audio output is out of scope here, so this is just a
/// presence/suspended marker `initialize`/`start` can check against.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioContextHandle {
    suspended: bool,
}

impl AudioContextHandle {
    pub fn new() -> Self {
        Self { suspended: false }
    }

    pub fn suspended() -> Self {
        Self { suspended: true }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) {
        self.suspended = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitError {
    MissingAudioContext,
    NotInitialized,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::MissingAudioContext => write!(f, "no audio context was provided"),
            InitError::NotInitialized => write!(f, "sequencer has not been initialized"),
        }
    }
}

impl std::error::Error for InitError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportState {
    Stopped,
    Playing,
    Paused,
}

enum Command {
    Start,
    Stop,
    Pause,
    Resume,
    SetBpm(f32),
    SetSwing(f32),
    SetStepResolution(u32),
    Destroy,
}

/// Cloneable public handle. Non-suspension-point operations are
/// fire-and-forget over the command channel; `get_state` reads a
/// lock-guarded snapshot the engine thread keeps current.
#[derive(Clone)]
pub struct SequencerHandle {
    command_tx: Sender<Command>,
    state: Arc<RwLock<SequencerState>>,
    step_bus: Arc<EventBus<(u32, f64)>>,
    state_bus: Arc<EventBus<SequencerState>>,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_source: Arc<Mutex<Option<TickSource>>>,
    destroyed: Arc<AtomicBool>,
}

impl SequencerHandle {
    /// One-shot: fails if `audio_ctx` is absent. Spawns the tick source and
    /// the engine's actor thread.
    pub fn initialize(
        audio_ctx: Option<AudioContextHandle>,
        pattern_manager: Arc<PatternManager>,
        sample_registry: Arc<SampleRegistry>,
        player: Arc<dyn SamplePlayer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, InitError> {
        let audio_ctx = audio_ctx.ok_or(InitError::MissingAudioContext)?;

        let (command_tx, command_rx) = unbounded();
        let (tick_source, tick_rx) =
            TickSource::spawn(clock.clone(), DEFAULT_LOOKAHEAD_INTERVAL);

        let state = Arc::new(RwLock::new(SequencerState {
            is_initialized: true,
            ..SequencerState::default()
        }));
        let step_bus = Arc::new(EventBus::new());
        let state_bus = Arc::new(EventBus::new());

        let engine = SequencerEngine {
            scheduler: Scheduler::new(120.0, 0.0, 16),
            pattern_manager,
            sample_registry,
            player,
            clock,
            rng: Box::new(StdRandomSource::new()),
            command_rx,
            tick_rx,
            audio_ctx,
            transport: TransportState::Stopped,
            state: state.clone(),
            step_bus: step_bus.clone(),
            state_bus: state_bus.clone(),
            skipped_triggers: 0,
        };

        let thread = thread::spawn(move || engine.run_loop());

        Ok(Self {
            command_tx,
            state,
            step_bus,
            state_bus,
            thread: Arc::new(Mutex::new(Some(thread))),
            tick_source: Arc::new(Mutex::new(Some(tick_source))),
            destroyed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn ensure_initialized(&self) -> Result<(), InitError> {
        if self.state.read().unwrap().is_initialized {
            Ok(())
        } else {
            Err(InitError::NotInitialized)
        }
    }

    pub fn start(&self) -> Result<(), InitError> {
        self.ensure_initialized()?;
        let _ = self.command_tx.send(Command::Start);
        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.command_tx.send(Command::Stop);
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(Command::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_tx.send(Command::Resume);
    }

    pub fn set_bpm(&self, bpm: f32) -> Result<(), ConfigError> {
        if !loopgrid_core::time::is_valid_bpm(bpm) {
            return Err(ConfigError::BpmOutOfRange(bpm));
        }
        let _ = self.command_tx.send(Command::SetBpm(bpm));
        Ok(())
    }

    pub fn set_swing(&self, swing: f32) -> Result<(), ConfigError> {
        if !loopgrid_core::time::is_valid_swing(swing) {
            return Err(ConfigError::SwingOutOfRange(swing));
        }
        let _ = self.command_tx.send(Command::SetSwing(swing));
        Ok(())
    }

    pub fn set_step_resolution(&self, resolution: u32) -> Result<(), ConfigError> {
        if !loopgrid_core::time::is_valid_resolution(resolution) {
            return Err(ConfigError::InvalidResolution(resolution));
        }
        let _ = self.command_tx.send(Command::SetStepResolution(resolution));
        Ok(())
    }

    pub fn get_state(&self) -> SequencerState {
        *self.state.read().unwrap()
    }

    pub fn on_step<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn((u32, f64)) + Send + Sync + 'static,
    {
        self.step_bus.subscribe(callback)
    }

    pub fn remove_step_callback(&self, id: SubscriptionId) {
        self.step_bus.unsubscribe(id);
    }

    pub fn on_state_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(SequencerState) + Send + Sync + 'static,
    {
        self.state_bus.subscribe(callback)
    }

    pub fn remove_state_callback(&self, id: SubscriptionId) {
        self.state_bus.unsubscribe(id);
    }

    /// Idempotent: stops playback, tears down the scheduler thread and the
    /// tick source, and clears callbacks. A second call is a no-op.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.command_tx.send(Command::Destroy);
        if let Some(handle) = self.thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        if let Some(ts) = self.tick_source.lock().unwrap().take() {
            drop(ts);
        }
    }
}

struct SequencerEngine {
    scheduler: Scheduler,
    pattern_manager: Arc<PatternManager>,
    sample_registry: Arc<SampleRegistry>,
    player: Arc<dyn SamplePlayer>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn crate::audio::scheduler::RandomSource>,
    command_rx: Receiver<Command>,
    tick_rx: Receiver<Tick>,
    audio_ctx: AudioContextHandle,
    transport: TransportState,
    state: Arc<RwLock<SequencerState>>,
    step_bus: Arc<EventBus<(u32, f64)>>,
    state_bus: Arc<EventBus<SequencerState>>,
    skipped_triggers: u64,
}

impl SequencerEngine {
    fn run_loop(mut self) {
        loop {
            crossbeam_channel::select! {
                recv(self.command_rx) -> msg => match msg {
                    Ok(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(self.tick_rx) -> msg => match msg {
                    Ok(tick) => self.handle_tick(tick),
                    Err(_) => break,
                },
            }
        }
    }

    /// Returns `false` when the engine should shut down.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Start => self.transition_start(),
            Command::Stop => self.transition_stop(),
            Command::Pause => self.transition_pause(),
            Command::Resume => self.transition_resume(),
            Command::SetBpm(bpm) => {
                if let Err(e) = self.scheduler.set_bpm(bpm, self.clock.now()) {
                    log::warn!("rejected set_bpm: {e}");
                } else {
                    self.sync_shared_state();
                }
            }
            Command::SetSwing(swing) => {
                if let Err(e) = self.scheduler.set_swing(swing, self.clock.now()) {
                    log::warn!("rejected set_swing: {e}");
                } else {
                    self.sync_shared_state();
                }
            }
            Command::SetStepResolution(resolution) => {
                self.change_step_resolution(resolution);
            }
            Command::Destroy => {
                self.transition_stop();
                return false;
            }
        }
        true
    }

    fn change_step_resolution(&mut self, resolution: u32) {
        let old_step = self.scheduler.current_step();
        if let Err(e) = self.pattern_manager.change_step_resolution(resolution, old_step) {
            log::warn!("rejected set_step_resolution (pattern): {e}");
            return;
        }
        if let Err(e) = self.scheduler.set_resolution(resolution, self.clock.now()) {
            log::warn!("rejected set_step_resolution (scheduler): {e}");
            return;
        }
        self.sync_shared_state();
    }

    fn resume_audio_context_if_suspended(&mut self) {
        if self.audio_ctx.is_suspended() {
            self.audio_ctx.resume();
            log::info!("resumed suspended audio context");
        }
    }

    fn transition_start(&mut self) {
        match self.transport {
            TransportState::Stopped => {
                self.resume_audio_context_if_suspended();
                self.scheduler.start(self.clock.now());
                self.transport = TransportState::Playing;
                self.publish_state_change();
            }
            TransportState::Paused => {
                self.resume_audio_context_if_suspended();
                self.scheduler.resume(self.clock.now());
                self.transport = TransportState::Playing;
                self.publish_state_change();
            }
            TransportState::Playing => {}
        }
    }

    fn transition_stop(&mut self) {
        if self.transport != TransportState::Stopped {
            self.scheduler.stop();
            self.transport = TransportState::Stopped;
            self.publish_state_change();
        }
    }

    fn transition_pause(&mut self) {
        if self.transport == TransportState::Playing {
            self.scheduler.pause();
            self.transport = TransportState::Paused;
            self.publish_state_change();
        }
    }

    fn transition_resume(&mut self) {
        if self.transport == TransportState::Paused {
            self.scheduler.resume(self.clock.now());
            self.transport = TransportState::Playing;
            self.publish_state_change();
        }
    }

    fn sync_shared_state(&mut self) {
        let mut guard = self.state.write().unwrap();
        guard.is_playing = self.transport == TransportState::Playing;
        guard.is_paused = self.transport == TransportState::Paused;
        guard.current_step = self.scheduler.current_step();
        guard.bpm = self.scheduler.bpm();
        guard.swing = self.scheduler.swing();
        guard.step_resolution = self.scheduler.step_resolution();
        guard.next_step_time = self.scheduler.next_step_time();
        guard.is_initialized = true;
        guard.perf_stats = self.scheduler.stats();
    }

    fn publish_state_change(&mut self) {
        self.sync_shared_state();
        let snapshot = *self.state.read().unwrap();
        self.state_bus.dispatch(snapshot);
    }

    fn handle_tick(&mut self, tick: Tick) {
        if !self.scheduler.is_running() {
            return;
        }
        let due_steps = self.scheduler.tick(tick.at);
        for due in due_steps {
            self.scheduler.record_drift(due.when, tick.at);
            self.process_step(due.step_idx, due.when);
        }
    }

    /// The per-step handler from §4.2: compute the effective track set,
    /// schedule triggers for active steps, then notify subscribers.
    fn process_step(&mut self, step_idx: u32, when: f64) {
        self.sync_shared_state();

        if let Some(pattern) = self.pattern_manager.get_current_pattern() {
            let has_solo = pattern.has_solo();
            for track in &pattern.tracks {
                let registry_muted = self.sample_registry.is_muted(track.id);
                let effective = if has_solo {
                    track.solo && !track.mute && !registry_muted
                } else {
                    !track.mute && !registry_muted
                };
                if !effective {
                    continue;
                }

                let Some(step) = track.steps.get(step_idx as usize) else {
                    continue;
                };
                if !step.active {
                    continue;
                }

                let Some(sample_id) = track.sample_id else {
                    self.skipped_triggers += 1;
                    log::debug!(
                        "skipped trigger: track {} has no sample assigned (total skipped: {})",
                        track.id,
                        self.skipped_triggers
                    );
                    continue;
                };
                if self.sample_registry.get(sample_id).is_none() {
                    self.skipped_triggers += 1;
                    log::debug!(
                        "skipped trigger: sample {} not registered (total skipped: {})",
                        sample_id,
                        self.skipped_triggers
                    );
                    continue;
                }

                let base_velocity =
                    step.velocity * track.volume * self.sample_registry.get_volume(track.id);
                let velocity_jitter: RandomParamInput = track.randomization.velocity.into();
                let timing_jitter: RandomParamInput = track.randomization.timing.into();

                if let Err(e) = self.scheduler.schedule_note(
                    when,
                    sample_id,
                    base_velocity,
                    velocity_jitter,
                    timing_jitter,
                    track.id,
                    self.rng.as_mut(),
                    self.player.as_ref(),
                ) {
                    log::warn!("sample playback failed for track {}: {e}", track.id);
                }
            }
        }

        self.step_bus.dispatch((step_idx, when));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clock::ManualClock;
    use crate::audio::sample_player::NullPlayer;
    use std::sync::atomic::AtomicU32;

    fn fresh_handle(clock: Arc<ManualClock>) -> SequencerHandle {
        let pattern_manager = Arc::new(PatternManager::new());
        let pattern = pattern_manager.create_pattern("Demo", 1, 16).unwrap();
        pattern_manager.load_pattern(pattern.id).unwrap();
        let track_id = pattern.tracks[0].id;
        for step in [0, 4, 8, 12] {
            pattern_manager.toggle_step(track_id, step).unwrap();
        }

        let sample_registry = Arc::new(SampleRegistry::new());
        sample_registry.load_sample(loopgrid_core::SampleHandle::new(
            1,
            44100,
            0.1,
            vec!["kick".into()],
        ));
        sample_registry.assign_to_track(track_id, 1);
        pattern_manager.set_track_randomization(track_id, Default::default()).unwrap();

        SequencerHandle::initialize(
            Some(AudioContextHandle::new()),
            pattern_manager,
            sample_registry,
            Arc::new(NullPlayer::default()),
            clock,
        )
        .unwrap()
    }

    #[test]
    fn initialize_fails_without_audio_context() {
        let clock = Arc::new(ManualClock::new(0.0));
        let result = SequencerHandle::initialize(
            None,
            Arc::new(PatternManager::new()),
            Arc::new(SampleRegistry::new()),
            Arc::new(NullPlayer::default()),
            clock,
        );
        assert!(result.is_err());
    }

    #[test]
    fn stop_then_start_resets_step_and_stats_r4() {
        let clock = Arc::new(ManualClock::new(0.0));
        let handle = fresh_handle(clock.clone());
        handle.start().unwrap();
        std::thread::sleep(StdDuration::from_millis(20));
        handle.stop();
        std::thread::sleep(StdDuration::from_millis(20));
        handle.start().unwrap();
        std::thread::sleep(StdDuration::from_millis(20));
        let state = handle.get_state();
        assert_eq!(state.current_step, 0);
        handle.destroy();
    }

    #[test]
    fn destroy_is_idempotent_r3() {
        let clock = Arc::new(ManualClock::new(0.0));
        let handle = fresh_handle(clock);
        handle.destroy();
        handle.destroy();
    }

    #[test]
    fn set_bpm_out_of_range_is_rejected_and_state_unchanged_s6() {
        let clock = Arc::new(ManualClock::new(0.0));
        let handle = fresh_handle(clock);
        let before = handle.get_state().bpm;
        assert!(handle.set_bpm(250.0).is_err());
        assert_eq!(handle.get_state().bpm, before);
        handle.destroy();
    }

    #[test]
    fn step_callback_fires_on_subscription() {
        let clock = Arc::new(ManualClock::new(0.0));
        let handle = fresh_handle(clock.clone());
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();
        handle.on_step(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        handle.start().unwrap();
        std::thread::sleep(StdDuration::from_millis(30));
        handle.destroy();
        assert!(count.load(Ordering::SeqCst) > 0);
    }
}
