//! WASM bindings for loopgrid-core.
//!
//! Exposes the pure time-math helpers so a JS host can compute step
//! durations, swing offsets, and resolution remaps without pulling in the
//! threaded `loopgrid` runtime crate at all — useful for a UI that wants to
//! preview timing before a pattern is ever played.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::types::time;

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = stepDuration)]
pub fn step_duration(bpm: f32, step_resolution: u32) -> f64 {
    time::step_duration(bpm, step_resolution)
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = swingDelay)]
pub fn swing_delay(step_duration_secs: f64, swing: f32) -> f64 {
    time::swing_delay(step_duration_secs, swing)
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = remapStepIndex)]
pub fn remap_step_index(old_step: u32, old_resolution: u32, new_resolution: u32) -> u32 {
    time::remap_step_index(old_step, old_resolution, new_resolution)
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = isValidBpm)]
pub fn is_valid_bpm(bpm: f32) -> bool {
    time::is_valid_bpm(bpm)
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = isValidResolution)]
pub fn is_valid_resolution(resolution: u32) -> bool {
    time::is_valid_resolution(resolution)
}

#[cfg(all(test, feature = "wasm"))]
mod tests {
    use super::*;

    #[test]
    fn step_duration_matches_pure_helper() {
        assert!((step_duration(120.0, 16) - 0.125).abs() < 1e-9);
    }
}
