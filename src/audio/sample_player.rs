//! The external playback sink the scheduler forwards note triggers to.
//!
//! Real sample decoding and audio output are out of scope: this module
//! defines the contract and, behind the `cpal-demo` feature, an
//! illustrative click-tone player for the demo binary.

use std::fmt;
use std::sync::Mutex;

use loopgrid_core::NoteTrigger;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    DeviceUnavailable(String),
    SinkRefused(String),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::DeviceUnavailable(msg) => write!(f, "device unavailable: {msg}"),
            PlaybackError::SinkRefused(msg) => write!(f, "playback sink refused: {msg}"),
        }
    }
}

impl std::error::Error for PlaybackError {}

/// External collaborator the scheduler calls from `schedule_note`. Errors
/// are captured as performance events, not propagated further up.
pub trait SamplePlayer: Send + Sync {
    fn play(&self, trigger: NoteTrigger) -> Result<(), PlaybackError>;
}

/// Test/demo double that records triggers instead of producing sound.
#[derive(Default)]
pub struct NullPlayer {
    played: Mutex<Vec<NoteTrigger>>,
}

impl NullPlayer {
    pub fn last(&self) -> Option<NoteTrigger> {
        self.played.lock().unwrap().last().copied()
    }

    pub fn all(&self) -> Vec<NoteTrigger> {
        self.played.lock().unwrap().clone()
    }
}

impl SamplePlayer for NullPlayer {
    fn play(&self, trigger: NoteTrigger) -> Result<(), PlaybackError> {
        self.played.lock().unwrap().push(trigger);
        Ok(())
    }
}

#[cfg(feature = "cpal-demo")]
pub use cpal_player::ClickTonePlayer;

#[cfg(feature = "cpal-demo")]
mod cpal_player {
    use super::{PlaybackError, SamplePlayer};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
    use loopgrid_core::NoteTrigger;
    use std::sync::{Arc, Mutex};

    /// A single-frequency click tone per trigger, just enough to hear the
    /// sequencer run without any real sample decoding.
    #[derive(Clone, Default)]
    struct ClickState {
        active_frequencies: Vec<f32>,
    }

    pub struct ClickTonePlayer {
        stream: Stream,
        state: Arc<Mutex<ClickState>>,
    }

    impl ClickTonePlayer {
        pub fn new() -> Result<Self, PlaybackError> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| PlaybackError::DeviceUnavailable("no output device".into()))?;
            let config = device
                .default_output_config()
                .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;

            let sample_format = config.sample_format();
            let config: StreamConfig = config.into();
            let state = Arc::new(Mutex::new(ClickState::default()));

            let stream = match sample_format {
                SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, state.clone())?,
                SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, state.clone())?,
                SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, state.clone())?,
                other => {
                    return Err(PlaybackError::DeviceUnavailable(format!(
                        "unsupported sample format: {other:?}"
                    )))
                }
            };

            Ok(Self { stream, state })
        }

        fn build_stream<T>(
            device: &cpal::Device,
            config: &StreamConfig,
            state: Arc<Mutex<ClickState>>,
        ) -> Result<Stream, PlaybackError>
        where
            T: Sample + SizedSample + Send + 'static + FromSample<f32>,
        {
            let channels = config.channels as usize;
            let sample_rate = config.sample_rate.0 as f32;
            let mut sample_clock = 0f32;

            let err_fn = |err| log::error!("output audio stream error: {err}");

            let stream = device
                .build_output_stream(
                    config,
                    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                        let frequencies = state.lock().unwrap().active_frequencies.clone();
                        let num_voices = frequencies.len().max(1) as f32;

                        for frame in data.chunks_mut(channels) {
                            let mut summed = 0.0;
                            for &freq in &frequencies {
                                summed += next_sine_value(sample_rate, &mut sample_clock, freq);
                            }
                            let value: T = cpal::Sample::from_sample(summed / num_voices);
                            for sample in frame.iter_mut() {
                                *sample = value;
                            }
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| PlaybackError::SinkRefused(e.to_string()))?;

            stream
                .play()
                .map_err(|e| PlaybackError::SinkRefused(e.to_string()))?;

            Ok(stream)
        }
    }

    fn next_sine_value(sample_rate: f32, sample_clock: &mut f32, frequency: f32) -> f32 {
        let volume = 0.2;
        let value =
            volume * (2.0 * std::f32::consts::PI * frequency * *sample_clock / sample_rate).sin();
        *sample_clock = (*sample_clock + 1.0) % sample_rate;
        value
    }

    impl SamplePlayer for ClickTonePlayer {
        fn play(&self, trigger: NoteTrigger) -> Result<(), PlaybackError> {
            // Map sample id to a distinct audible pitch so different tracks
            // are distinguishable in the demo.
            let frequency = 220.0 + (trigger.sample_id % 12) as f32 * 55.0;
            let mut state = self.state.lock().unwrap();
            state.active_frequencies = vec![frequency * trigger.velocity.max(0.2)];
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sine_wave_stays_in_amplitude_range() {
            let mut clock = 0.0;
            for _ in 0..1000 {
                let v = next_sine_value(44100.0, &mut clock, 440.0);
                assert!((-0.2..=0.2).contains(&v));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_player_records_triggers_in_order() {
        let player = NullPlayer::default();
        player.play(NoteTrigger::new(1, 0.0, 0.5, 1)).unwrap();
        player.play(NoteTrigger::new(2, 0.1, 0.6, 1)).unwrap();
        let all = player.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sample_id, 1);
        assert_eq!(all[1].sample_id, 2);
    }
}
