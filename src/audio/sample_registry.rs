//! Holds sample handles and per-track audio-level overrides (volume, mute)
//! separate from pattern state. No audio decoding happens here; `load_*`
//! operations just register metadata.

use std::collections::HashMap;
use std::sync::RwLock;

use loopgrid_core::{SampleHandle, SampleId, TrackId};

use crate::audio::sample_player::{PlaybackError, SamplePlayer};

/// Snapshot of a batch-load operation, for UI/progress consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadProgress {
    pub total: usize,
    pub loaded: usize,
    pub percentage: f32,
    pub is_loading: bool,
}

impl LoadProgress {
    fn of(total: usize, loaded: usize, is_loading: bool) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            (loaded as f32 / total as f32) * 100.0
        };
        Self {
            total,
            loaded,
            percentage,
            is_loading,
        }
    }
}

struct Inner {
    handles: HashMap<SampleId, SampleHandle>,
    track_assignments: HashMap<TrackId, SampleId>,
    track_volume: HashMap<TrackId, f32>,
    track_muted: HashMap<TrackId, bool>,
    preloaded: HashMap<SampleId, bool>,
}

pub struct SampleRegistry {
    inner: RwLock<Inner>,
}

impl Default for SampleRegistry {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                handles: HashMap::new(),
                track_assignments: HashMap::new(),
                track_volume: HashMap::new(),
                track_muted: HashMap::new(),
                preloaded: HashMap::new(),
            }),
        }
    }
}

impl SampleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a default set of handles under a pack name. Real decoding
    /// is out of scope; this just seeds the handle table.
    pub fn load_pack(&self, pack_handles: Vec<SampleHandle>) -> LoadProgress {
        let total = pack_handles.len();
        let mut inner = self.inner.write().unwrap();
        for handle in pack_handles {
            inner.preloaded.insert(handle.id, true);
            inner.handles.insert(handle.id, handle);
        }
        LoadProgress::of(total, total, false)
    }

    pub fn load_sample(&self, handle: SampleHandle) -> SampleHandle {
        let mut inner = self.inner.write().unwrap();
        inner.handles.insert(handle.id, handle.clone());
        handle
    }

    pub fn get(&self, id: SampleId) -> Option<SampleHandle> {
        self.inner.read().unwrap().handles.get(&id).cloned()
    }

    pub fn get_all(&self) -> Vec<SampleHandle> {
        self.inner.read().unwrap().handles.values().cloned().collect()
    }

    pub fn assign_to_track(&self, track_id: TrackId, sample_id: SampleId) -> bool {
        let mut inner = self.inner.write().unwrap();
        if !inner.handles.contains_key(&sample_id) {
            return false;
        }
        inner.track_assignments.insert(track_id, sample_id);
        true
    }

    pub fn get_track_sample(&self, track_id: TrackId) -> Option<SampleHandle> {
        let inner = self.inner.read().unwrap();
        let sample_id = *inner.track_assignments.get(&track_id)?;
        inner.handles.get(&sample_id).cloned()
    }

    pub fn is_muted(&self, track_id: TrackId) -> bool {
        self.inner
            .read()
            .unwrap()
            .track_muted
            .get(&track_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn set_muted(&self, track_id: TrackId, muted: bool) {
        self.inner.write().unwrap().track_muted.insert(track_id, muted);
    }

    pub fn get_volume(&self, track_id: TrackId) -> f32 {
        self.inner
            .read()
            .unwrap()
            .track_volume
            .get(&track_id)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn set_volume(&self, track_id: TrackId, volume: f32) {
        self.inner
            .write()
            .unwrap()
            .track_volume
            .insert(track_id, volume.clamp(0.0, 1.0));
    }

    pub fn preload(&self, ids: &[SampleId]) -> LoadProgress {
        let mut inner = self.inner.write().unwrap();
        let mut loaded = 0;
        for id in ids {
            if inner.handles.contains_key(id) {
                inner.preloaded.insert(*id, true);
                loaded += 1;
            }
        }
        LoadProgress::of(ids.len(), loaded, false)
    }

    pub fn is_preloaded(&self, id: SampleId) -> bool {
        self.inner
            .read()
            .unwrap()
            .preloaded
            .get(&id)
            .copied()
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.handles.clear();
        inner.track_assignments.clear();
        inner.preloaded.clear();
    }

    pub fn destroy(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.handles.clear();
        inner.track_assignments.clear();
        inner.track_volume.clear();
        inner.track_muted.clear();
        inner.preloaded.clear();
    }

    /// Delegates to the external player; errors are the caller's concern to
    /// capture as performance events, not this registry's.
    pub fn play_sample(
        &self,
        handle: &SampleHandle,
        when: f64,
        velocity: f32,
        track_id: TrackId,
        player: &dyn SamplePlayer,
    ) -> Result<(), PlaybackError> {
        player.play(loopgrid_core::NoteTrigger::new(handle.id, when, velocity, track_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: SampleId) -> SampleHandle {
        SampleHandle::new(id, 44100, 0.5, vec!["kick".into()])
    }

    #[test]
    fn get_on_unregistered_id_is_none() {
        let registry = SampleRegistry::new();
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn load_sample_makes_it_retrievable() {
        let registry = SampleRegistry::new();
        registry.load_sample(handle(1));
        assert!(registry.get(1).is_some());
    }

    #[test]
    fn assign_to_track_fails_for_unknown_sample() {
        let registry = SampleRegistry::new();
        assert!(!registry.assign_to_track(1, 99));
    }

    #[test]
    fn assign_to_track_then_lookup_round_trips() {
        let registry = SampleRegistry::new();
        registry.load_sample(handle(1));
        assert!(registry.assign_to_track(10, 1));
        assert_eq!(registry.get_track_sample(10).unwrap().id, 1);
    }

    #[test]
    fn default_volume_is_unity_gain() {
        let registry = SampleRegistry::new();
        assert_eq!(registry.get_volume(1), 1.0);
    }

    #[test]
    fn set_volume_clamps_to_unit_range() {
        let registry = SampleRegistry::new();
        registry.set_volume(1, 5.0);
        assert_eq!(registry.get_volume(1), 1.0);
    }

    #[test]
    fn preload_only_marks_known_handles() {
        let registry = SampleRegistry::new();
        registry.load_sample(handle(1));
        let progress = registry.preload(&[1, 2]);
        assert_eq!(progress.loaded, 1);
        assert_eq!(progress.total, 2);
        assert!(registry.is_preloaded(1));
        assert!(!registry.is_preloaded(2));
    }

    #[test]
    fn load_pack_reports_full_progress() {
        let registry = SampleRegistry::new();
        let progress = registry.load_pack(vec![handle(1), handle(2)]);
        assert_eq!(progress.percentage, 100.0);
        assert!(!progress.is_loading);
    }
}
