//! # loopgrid-core
//!
//! Host-agnostic data model for the loopgrid step sequencer: patterns,
//! tracks, steps, randomization, and the resolution-remapping and
//! validation algorithms that operate on them. No threads, no channels —
//! the runtime that drives this model lives in the `loopgrid` crate.
//!
//! ## Features
//!
//! - **serde**: derive `Serialize`/`Deserialize` on the data types for
//!   persistence or a web host.
//! - **wasm**: expose the pure time-math helpers (`wasm` module) to a JS
//!   host via `wasm-bindgen`, without pulling in the threaded runtime.

pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use types::time;

pub use types::{
    validate_pattern, ConfigError, NoteTrigger, Pattern, PatternId, PatternMetadata,
    PatternRecord, PerfStats, RandomParam, Randomization, SampleHandle, SampleId,
    SequencerState, Step, StepRecord, Track, TrackId, TrackRecord,
};
