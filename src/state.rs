//! Per-instance playback bookkeeping
//!
//! Everything transient about playback lives here, owned by the caller and
//! passed into every evaluation. The evaluator itself keeps no hidden
//! state, so two instances sharing a skeleton and clip can never bleed
//! poses into each other.

use glam::{Quat, Vec3};

use crate::bone::BoneIndex;

/// Transition bookkeeping for one bone's three channels
#[derive(Debug, Clone, Copy, Default)]
pub struct BoneState {
    pub(crate) last_translation: Option<Vec3>,
    pub(crate) last_rotation: Option<Quat>,
    pub(crate) last_scale: Option<Vec3>,
    pub(crate) translation_blend_start: Option<f32>,
    pub(crate) rotation_blend_start: Option<f32>,
    pub(crate) scale_blend_start: Option<f32>,
}

impl BoneState {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Per-mesh-instance interpolation state
///
/// Created once per instance and resized lazily to the skeleton's arena on
/// first use. Cleared whenever playback restarts from the bind pose.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    bones: Vec<BoneState>,
    loop_count: u32,
}

impl PlaybackState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the current clip has wrapped, as of the last
    /// `evaluate` call
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Forget all per-channel history and blend bookkeeping
    ///
    /// The next evaluation snaps directly onto its track samples instead of
    /// blending in from a remembered pose.
    pub fn clear(&mut self) {
        for bone in &mut self.bones {
            bone.clear();
        }
        self.loop_count = 0;
    }

    pub(crate) fn set_loop_count(&mut self, loops: u32) {
        self.loop_count = loops;
    }

    pub(crate) fn ensure_bones(&mut self, count: usize) {
        if self.bones.len() < count {
            self.bones.resize_with(count, BoneState::default);
        }
    }

    pub(crate) fn bone_mut(&mut self, index: BoneIndex) -> &mut BoneState {
        &mut self.bones[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_resize_keeps_existing_history() {
        let mut state = PlaybackState::new();
        state.ensure_bones(2);
        state.bone_mut(1).last_translation = Some(Vec3::ONE);
        state.ensure_bones(4);
        assert_eq!(state.bone_mut(1).last_translation, Some(Vec3::ONE));
        assert_eq!(state.bone_mut(3).last_translation, None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = PlaybackState::new();
        state.ensure_bones(2);
        state.bone_mut(0).last_rotation = Some(Quat::from_rotation_x(1.0));
        state.bone_mut(0).rotation_blend_start = Some(3.0);
        state.set_loop_count(5);

        state.clear();
        assert_eq!(state.loop_count(), 0);
        assert_eq!(state.bone_mut(0).last_rotation, None);
        assert_eq!(state.bone_mut(0).rotation_blend_start, None);
    }
}
