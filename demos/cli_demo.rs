//! Illustrative demo binary: wires a real `SystemClock`, the `cpal`-backed
//! click-tone `SamplePlayer`, and a small kick/snare pattern together and
//! lets the sequencer run for a few bars, printing each step event.
//!
//! This binary exists to exercise the crate end-to-end with real audio
//! output; it is not part of the library's public contract. Build with
//! `--features cpal-demo`.

use std::sync::Arc;
use std::time::Duration;

use loopgrid::audio::clock::SystemClock;
use loopgrid::audio::pattern_manager::PatternManager;
use loopgrid::audio::sample_player::ClickTonePlayer;
use loopgrid::audio::sample_registry::SampleRegistry;
use loopgrid::audio::sequencer::{AudioContextHandle, SequencerHandle};
use loopgrid_core::SampleHandle;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let pattern_manager = Arc::new(PatternManager::new());
    let pattern = pattern_manager.create_pattern("Demo Groove", 2, 16)?;
    pattern_manager.load_pattern(pattern.id)?;

    let kick = pattern.tracks[0].id;
    let snare = pattern.tracks[1].id;

    let sample_registry = Arc::new(SampleRegistry::new());
    sample_registry.load_sample(SampleHandle::new(1, 44100, 0.2, vec!["kick".into()]));
    sample_registry.load_sample(SampleHandle::new(2, 44100, 0.2, vec!["snare".into()]));
    sample_registry.assign_to_track(kick, 1);
    sample_registry.assign_to_track(snare, 2);

    for step in [0, 4, 8, 12] {
        pattern_manager.toggle_step(kick, step)?;
    }
    for step in [4, 12] {
        pattern_manager.toggle_step(snare, step)?;
    }

    let player = Arc::new(
        ClickTonePlayer::new().map_err(|e| anyhow::anyhow!("failed to open audio device: {e}"))?,
    );
    let clock = Arc::new(SystemClock::new());

    let handle = SequencerHandle::initialize(
        Some(AudioContextHandle::new()),
        pattern_manager,
        sample_registry,
        player,
        clock,
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize sequencer: {e}"))?;

    handle.on_step(|(step_idx, when)| {
        println!("step {step_idx:>2} @ {when:.4}s");
    });

    handle.start()?;
    std::thread::sleep(Duration::from_secs(4));
    handle.destroy();

    Ok(())
}
