//! Owns patterns, exposes editing operations, enforces invariants, and
//! remaps track step counts on resolution change.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use loopgrid_core::{validate_pattern, ConfigError, Pattern, PatternId, TrackId};

pub struct PatternManager {
    patterns: RwLock<HashMap<PatternId, Pattern>>,
    current: RwLock<Option<PatternId>>,
    next_id: AtomicU64,
}

impl Default for PatternManager {
    fn default() -> Self {
        Self {
            patterns: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }
}

impl PatternManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pattern(
        &self,
        name: impl Into<String>,
        num_tracks: u32,
        step_resolution: u32,
    ) -> Result<Pattern, ConfigError> {
        if !loopgrid_core::time::is_valid_resolution(step_resolution) {
            return Err(ConfigError::InvalidResolution(step_resolution));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pattern = Pattern::new(id, name, num_tracks, step_resolution);
        validate_pattern(&pattern)?;
        self.patterns.write().unwrap().insert(id, pattern.clone());
        Ok(pattern)
    }

    pub fn load_pattern(&self, id: PatternId) -> Result<Pattern, ConfigError> {
        let patterns = self.patterns.read().unwrap();
        let pattern = patterns.get(&id).ok_or(ConfigError::UnknownPattern(id))?;
        validate_pattern(pattern)?;
        drop(patterns);
        *self.current.write().unwrap() = Some(id);
        Ok(self.patterns.read().unwrap()[&id].clone())
    }

    pub fn save_pattern(&self, mut pattern: Pattern) -> Result<PatternId, ConfigError> {
        validate_pattern(&pattern)?;
        pattern.touch();
        let id = pattern.id;
        self.patterns.write().unwrap().insert(id, pattern);
        Ok(id)
    }

    pub fn get_current_pattern(&self) -> Option<Pattern> {
        let current = *self.current.read().unwrap();
        current.and_then(|id| self.patterns.read().unwrap().get(&id).cloned())
    }

    pub fn get_all_patterns(&self) -> Vec<Pattern> {
        self.patterns.read().unwrap().values().cloned().collect()
    }

    fn with_current_mut<R>(
        &self,
        f: impl FnOnce(&mut Pattern) -> R,
    ) -> Result<R, ConfigError> {
        let id = self.current.read().unwrap().ok_or(ConfigError::NoCurrentPattern)?;
        let mut patterns = self.patterns.write().unwrap();
        let pattern = patterns.get_mut(&id).ok_or(ConfigError::UnknownPattern(id))?;
        let result = f(pattern);
        pattern.touch();
        Ok(result)
    }

    pub fn toggle_step(&self, track_id: TrackId, step_idx: usize) -> Result<bool, ConfigError> {
        self.with_current_mut(|p| {
            p.track_mut(track_id)
                .map(|t| t.toggle_step(step_idx))
                .unwrap_or(false)
        })
    }

    pub fn set_step_velocity(
        &self,
        track_id: TrackId,
        step_idx: usize,
        velocity: f32,
    ) -> Result<bool, ConfigError> {
        self.with_current_mut(|p| {
            p.track_mut(track_id)
                .map(|t| t.set_step_velocity(step_idx, velocity))
                .unwrap_or(false)
        })
    }

    pub fn set_track_volume(&self, track_id: TrackId, volume: f32) -> Result<(), ConfigError> {
        self.with_current_mut(|p| {
            if let Some(t) = p.track_mut(track_id) {
                t.set_volume(volume);
            }
        })
    }

    pub fn toggle_track_mute(&self, track_id: TrackId) -> Result<(), ConfigError> {
        self.with_current_mut(|p| {
            if let Some(t) = p.track_mut(track_id) {
                t.toggle_mute();
            }
        })
    }

    pub fn toggle_track_solo(&self, track_id: TrackId) -> Result<(), ConfigError> {
        self.with_current_mut(|p| {
            if let Some(t) = p.track_mut(track_id) {
                t.toggle_solo();
            }
        })
    }

    pub fn set_track_name(&self, track_id: TrackId, name: impl Into<String>) -> Result<(), ConfigError> {
        let name = name.into();
        self.with_current_mut(|p| {
            if let Some(t) = p.track_mut(track_id) {
                t.name = name;
            }
        })
    }

    pub fn set_track_color(&self, track_id: TrackId, color: impl Into<String>) -> Result<(), ConfigError> {
        let color = color.into();
        self.with_current_mut(|p| {
            if let Some(t) = p.track_mut(track_id) {
                t.color = color;
            }
        })
    }

    pub fn set_track_randomization(
        &self,
        track_id: TrackId,
        randomization: loopgrid_core::Randomization,
    ) -> Result<(), ConfigError> {
        self.with_current_mut(|p| {
            if let Some(t) = p.track_mut(track_id) {
                t.randomization = randomization;
            }
        })
    }

    /// Remaps every track's steps to `new_resolution`, preserving active
    /// step position per §4.4, and returns the remapped `current_step`
    /// given the caller's previous step index.
    pub fn change_step_resolution(
        &self,
        new_resolution: u32,
        current_step: u32,
    ) -> Result<u32, ConfigError> {
        let old_resolution = self
            .get_current_pattern()
            .ok_or(ConfigError::NoCurrentPattern)?
            .step_resolution;
        self.with_current_mut(|p| p.change_step_resolution(new_resolution))??;
        Ok(loopgrid_core::time::remap_step_index(
            current_step,
            old_resolution,
            new_resolution,
        ))
    }

    pub fn clear_pattern(&self) -> Result<(), ConfigError> {
        self.with_current_mut(|p| {
            for track in &mut p.tracks {
                for step in &mut track.steps {
                    step.active = false;
                }
            }
        })
    }

    pub fn duplicate_pattern(
        &self,
        id: PatternId,
        new_name: impl Into<String>,
    ) -> Result<Pattern, ConfigError> {
        let source = self
            .patterns
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ConfigError::UnknownPattern(id))?;
        let new_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut copy = source;
        copy.id = new_id;
        copy.name = new_name.into();
        copy.touch();
        self.patterns.write().unwrap().insert(new_id, copy.clone());
        Ok(copy)
    }

    pub fn delete_pattern(&self, id: PatternId) -> Result<(), ConfigError> {
        let removed = self.patterns.write().unwrap().remove(&id).is_some();
        if !removed {
            return Err(ConfigError::UnknownPattern(id));
        }
        let mut current = self.current.write().unwrap();
        if *current == Some(id) {
            *current = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_pattern_uses_default_bpm_and_velocity() {
        let mgr = PatternManager::new();
        let p = mgr.create_pattern("Demo", 1, 16).unwrap();
        assert_eq!(p.bpm, 120.0);
        assert_eq!(p.tracks[0].steps[0].velocity, 0.8);
    }

    #[test]
    fn create_pattern_rejects_invalid_resolution() {
        let mgr = PatternManager::new();
        assert!(mgr.create_pattern("Demo", 1, 12).is_err());
    }

    #[test]
    fn load_pattern_sets_current_and_round_trips_r2() {
        let mgr = PatternManager::new();
        let created = mgr.create_pattern("Demo", 1, 16).unwrap();
        let loaded = mgr.load_pattern(created.id).unwrap();
        assert_eq!(created, loaded);
        assert_eq!(mgr.get_current_pattern().unwrap(), created);
    }

    #[test]
    fn load_unknown_pattern_fails() {
        let mgr = PatternManager::new();
        assert!(mgr.load_pattern(999).is_err());
    }

    #[test]
    fn toggle_step_round_trips_r1() {
        let mgr = PatternManager::new();
        let p = mgr.create_pattern("Demo", 1, 16).unwrap();
        mgr.load_pattern(p.id).unwrap();
        let track_id = p.tracks[0].id;
        mgr.toggle_step(track_id, 3).unwrap();
        mgr.toggle_step(track_id, 3).unwrap();
        let after = mgr.get_current_pattern().unwrap();
        assert!(!after.tracks[0].steps[3].active);
    }

    #[test]
    fn change_step_resolution_remaps_current_step_s4() {
        let mgr = PatternManager::new();
        let p = mgr.create_pattern("Demo", 1, 16).unwrap();
        mgr.load_pattern(p.id).unwrap();
        let track_id = p.tracks[0].id;
        for i in [0, 4, 8, 12] {
            mgr.toggle_step(track_id, i).unwrap();
        }
        let new_step = mgr.change_step_resolution(32, 4).unwrap();
        assert_eq!(new_step, 8);
        let after = mgr.get_current_pattern().unwrap();
        let active: Vec<_> = after.tracks[0]
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(active, vec![0, 8, 16, 24]);
    }

    #[test]
    fn duplicate_pattern_gets_a_fresh_id() {
        let mgr = PatternManager::new();
        let p = mgr.create_pattern("Demo", 1, 16).unwrap();
        let dup = mgr.duplicate_pattern(p.id, "Demo Copy").unwrap();
        assert_ne!(dup.id, p.id);
        assert_eq!(dup.name, "Demo Copy");
    }

    #[test]
    fn delete_pattern_clears_current_if_it_was_loaded() {
        let mgr = PatternManager::new();
        let p = mgr.create_pattern("Demo", 1, 16).unwrap();
        mgr.load_pattern(p.id).unwrap();
        mgr.delete_pattern(p.id).unwrap();
        assert!(mgr.get_current_pattern().is_none());
    }
}
