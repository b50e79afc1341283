//! Pose evaluation: hierarchy walk and final matrix composition
//!
//! The evaluator is the stateless algorithm set tying everything together.
//! Shared, read-only inputs ([`Skeleton`], [`AnimationClip`]) come in by
//! reference; all mutation lands in the caller-owned [`PlaybackState`] and
//! the evaluator's per-instance [`PoseBuffer`]. One evaluator per mesh
//! instance, one call per rendered frame.

use glam::Mat4;

use crate::bone::BoneIndex;
use crate::clip::AnimationClip;
use crate::interpolation::{SampleCtx, sample_with_transition};
use crate::pose::PoseBuffer;
use crate::skeleton::Skeleton;
use crate::state::PlaybackState;

/// Per-instance pose evaluator
///
/// Owns the instance's [`PoseBuffer`]; every `evaluate_*` call overwrites
/// it completely and returns a reference to it for the skinning upload.
#[derive(Debug, Default)]
pub struct PoseEvaluator {
    pose: PoseBuffer,
}

impl PoseEvaluator {
    /// Create an evaluator with an empty pose buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// The pose produced by the most recent evaluation
    pub fn pose(&self) -> &PoseBuffer {
        &self.pose
    }

    /// Evaluate the pose at `time_seconds` into the clip
    ///
    /// Time is converted to ticks via the clip's tick rate and wrapped
    /// modulo its duration; the resulting loop count is published on
    /// `state` so callers can observe playback wrapping. `blend_seconds`
    /// sizes the transition window that eases the instance from its
    /// remembered pose into the clip; pass 0 to snap.
    pub fn evaluate(
        &mut self,
        skeleton: &Skeleton,
        clip: &AnimationClip,
        time_seconds: f32,
        blend_seconds: f32,
        state: &mut PlaybackState,
    ) -> &PoseBuffer {
        let rate = clip.ticks_per_second();
        let duration = clip.duration_ticks();
        let ticks = time_seconds.max(0.0) * rate;
        // Builder guarantees duration > 0
        let loops = (ticks / duration) as u32;
        let tick = ticks % duration;

        state.set_loop_count(loops);
        state.ensure_bones(skeleton.bone_count());
        self.pose.reset(skeleton);

        let ctx = SampleCtx {
            tick,
            duration,
            loop_count: loops,
            blend_ticks: blend_seconds.max(0.0) * rate,
        };
        for &root in skeleton.roots() {
            self.walk(skeleton, clip, &ctx, state, root, Mat4::IDENTITY);
        }
        &self.pose
    }

    fn walk(
        &mut self,
        skeleton: &Skeleton,
        clip: &AnimationClip,
        ctx: &SampleCtx,
        state: &mut PlaybackState,
        index: BoneIndex,
        parent_global: Mat4,
    ) {
        let bone = &skeleton.bones()[index as usize];
        if bone.is_useless {
            // Whole subtree is dummy by construction
            return;
        }

        let mut global = parent_global;
        match clip.track(index) {
            None => global *= bone.rest_chain,
            Some(track) => {
                global *= bone.anim_prefix;
                let bs = state.bone_mut(index);

                let mut translation_index = None;
                if let Some(channel) = &track.translation {
                    let (v, i) = sample_with_transition(
                        channel,
                        track.post_state,
                        ctx,
                        None,
                        &mut bs.last_translation,
                        &mut bs.translation_blend_start,
                    );
                    global *= Mat4::from_translation(v);
                    translation_index = i;
                }

                if let Some(m) = bone.post_anim_transform {
                    global *= m;
                }

                let mut rotation_index = None;
                if let Some(channel) = &track.rotation {
                    let hint = if track.shared.translation_rotation {
                        translation_index
                    } else {
                        None
                    };
                    let (q, i) = sample_with_transition(
                        channel,
                        track.post_state,
                        ctx,
                        hint,
                        &mut bs.last_rotation,
                        &mut bs.rotation_blend_start,
                    );
                    global *= Mat4::from_quat(q);
                    rotation_index = i;
                }

                if let Some(channel) = &track.scale {
                    let hint = if track.shared.translation_scale {
                        translation_index
                    } else if track.shared.rotation_scale {
                        rotation_index
                    } else {
                        None
                    };
                    let (v, _) = sample_with_transition(
                        channel,
                        track.post_state,
                        ctx,
                        hint,
                        &mut bs.last_scale,
                        &mut bs.scale_blend_start,
                    );
                    global *= Mat4::from_scale(v);
                }
            }
        }

        self.commit(skeleton, index, global);
        for &child in bone.children.iter() {
            self.walk(skeleton, clip, ctx, state, child, global);
        }
    }

    /// Evaluate the authored rest pose, ignoring all animation tracks
    ///
    /// Also clears `state`: restarting from the bind pose forgets all
    /// transition history, so the next animated call starts fresh.
    pub fn evaluate_bind_pose(
        &mut self,
        skeleton: &Skeleton,
        state: &mut PlaybackState,
    ) -> &PoseBuffer {
        state.clear();
        state.ensure_bones(skeleton.bone_count());
        self.pose.reset(skeleton);
        for &root in skeleton.roots() {
            self.walk_bind(skeleton, root, Mat4::IDENTITY);
        }
        &self.pose
    }

    fn walk_bind(&mut self, skeleton: &Skeleton, index: BoneIndex, parent_global: Mat4) {
        let bone = &skeleton.bones()[index as usize];
        if bone.is_useless {
            return;
        }
        let global = parent_global * bone.rest_chain;
        self.commit(skeleton, index, global);
        for &child in bone.children.iter() {
            self.walk_bind(skeleton, child, global);
        }
    }

    /// Evaluate at exact keyframe indices instead of an interpolated time
    ///
    /// Used for scrubbing and preview. Each channel samples the key at its
    /// given index, clamped to the channel's last key. No transition blend
    /// runs; the sampled values replace the channels' remembered history so
    /// a later animated call blends away from the scrubbed pose.
    pub fn evaluate_discrete_keys(
        &mut self,
        skeleton: &Skeleton,
        clip: &AnimationClip,
        rotation_key: usize,
        translation_key: usize,
        scaling_key: usize,
        state: &mut PlaybackState,
    ) -> &PoseBuffer {
        state.set_loop_count(0);
        state.ensure_bones(skeleton.bone_count());
        self.pose.reset(skeleton);
        for &root in skeleton.roots() {
            self.walk_discrete(
                skeleton,
                clip,
                (rotation_key, translation_key, scaling_key),
                state,
                root,
                Mat4::IDENTITY,
            );
        }
        &self.pose
    }

    fn walk_discrete(
        &mut self,
        skeleton: &Skeleton,
        clip: &AnimationClip,
        keys: (usize, usize, usize),
        state: &mut PlaybackState,
        index: BoneIndex,
        parent_global: Mat4,
    ) {
        let (rotation_key, translation_key, scaling_key) = keys;
        let bone = &skeleton.bones()[index as usize];
        if bone.is_useless {
            return;
        }

        let mut global = parent_global;
        match clip.track(index) {
            None => global *= bone.rest_chain,
            Some(track) => {
                global *= bone.anim_prefix;
                let bs = state.bone_mut(index);

                if let Some(channel) = &track.translation {
                    let keys = channel.keys();
                    let v = keys[translation_key.min(keys.len() - 1)].value;
                    global *= Mat4::from_translation(v);
                    bs.last_translation = Some(v);
                    bs.translation_blend_start = None;
                }
                if let Some(m) = bone.post_anim_transform {
                    global *= m;
                }
                if let Some(channel) = &track.rotation {
                    let keys = channel.keys();
                    let q = keys[rotation_key.min(keys.len() - 1)].value;
                    global *= Mat4::from_quat(q);
                    bs.last_rotation = Some(q);
                    bs.rotation_blend_start = None;
                }
                if let Some(channel) = &track.scale {
                    let keys = channel.keys();
                    let v = keys[scaling_key.min(keys.len() - 1)].value;
                    global *= Mat4::from_scale(v);
                    bs.last_scale = Some(v);
                    bs.scale_blend_start = None;
                }
            }
        }

        self.commit(skeleton, index, global);
        for &child in bone.children.iter() {
            self.walk_discrete(skeleton, clip, keys, state, child, global);
        }
    }

    /// Override one bone's pose and re-propagate the change to its subtree
    ///
    /// `pose` is interpreted in the bone's bind-local frame when
    /// `local_space` is set, otherwise in model space. With `additive` the
    /// override composes onto the bone's current global transform; without
    /// it the override replaces the bone's pose relative to its parent.
    /// Descendants keep their relative poses: every already-computed global
    /// in the subtree is left-multiplied by the same delta, with no track
    /// re-interpolation. Parents and siblings are untouched.
    ///
    /// Requires a prior evaluation; called on an empty buffer it is a no-op
    /// with a diagnostic.
    pub fn set_manual_bone_pose(
        &mut self,
        skeleton: &Skeleton,
        bone: BoneIndex,
        pose: Mat4,
        additive: bool,
        local_space: bool,
    ) {
        let in_range = (bone as usize) < skeleton.bone_count();
        debug_assert!(in_range, "bone index {bone} out of range");
        if !in_range {
            log::warn!("manual pose for out-of-range bone {bone}, ignoring");
            return;
        }
        if self.pose.globals.len() != skeleton.bone_count() {
            log::warn!("manual pose before any evaluation, ignoring");
            return;
        }

        let bone_ref = &skeleton.bones()[bone as usize];
        if bone_ref.is_useless {
            return;
        }

        let old_global = self.pose.globals[bone as usize];
        let parent_global = bone_ref
            .parent
            .map_or(Mat4::IDENTITY, |p| self.pose.globals[p as usize]);

        let base = if additive { old_global } else { parent_global };
        let new_global = if local_space {
            base * bone_ref.bind_offset_inverse * pose
        } else {
            base * pose
        };

        let delta = new_global * old_global.inverse();
        self.write_global(skeleton, bone, new_global);
        for &child in bone_ref.children.iter() {
            self.shift_subtree(skeleton, child, delta);
        }
    }

    fn shift_subtree(&mut self, skeleton: &Skeleton, index: BoneIndex, delta: Mat4) {
        let bone = &skeleton.bones()[index as usize];
        if bone.is_useless {
            return;
        }
        let shifted = delta * self.pose.globals[index as usize];
        self.write_global(skeleton, index, shifted);
        for &child in bone.children.iter() {
            self.shift_subtree(skeleton, child, delta);
        }
    }

    /// Store a freshly walked global and count the visit
    fn commit(&mut self, skeleton: &Skeleton, index: BoneIndex, global: Mat4) {
        self.pose.visited += 1;
        self.write_global(skeleton, index, global);
    }

    /// Store a bone's global and derive its skinning matrix if it deforms
    fn write_global(&mut self, skeleton: &Skeleton, index: BoneIndex, global: Mat4) {
        let bone = &skeleton.bones()[index as usize];
        self.pose.globals[index as usize] = global;
        if !bone.is_dummy {
            self.pose.matrices[index as usize] = global * bone.bind_offset;
        }
    }
}
