// loopgrid-core/src/types/mod.rs

pub mod error;
pub mod note_trigger;
pub mod pattern;
pub mod randomization;
pub mod sample;
pub mod sequencer_state;
pub mod serialization;
pub mod step;
pub mod time;
pub mod track;

pub use error::ConfigError;
pub use note_trigger::NoteTrigger;
pub use pattern::{validate_pattern, Pattern, PatternId, PatternMetadata};
pub use randomization::{RandomParam, Randomization};
pub use sample::{SampleHandle, SampleId};
pub use sequencer_state::{PerfStats, SequencerState};
pub use serialization::{PatternRecord, StepRecord, TrackRecord};
pub use step::Step;
pub use track::{Track, TrackId};
