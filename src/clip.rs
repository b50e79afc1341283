//! Animation clips: shared, read-only keyframe data for one animation

use std::collections::HashMap;

use crate::bone::BoneIndex;
use crate::error::{PoseError, Result};
use crate::skeleton::Skeleton;
use crate::track::{
    BoneAnimationTrack, BoneTrackDesc, Keyframe, KeyframeTrack, SharedKeyTimes, key_times_aligned,
};

/// A named, timed collection of per-bone keyframe tracks
///
/// Clips are immutable once built and can be shared across every instance
/// of the mesh they animate. The per-bone map is sparse: most bones carry
/// no track in a given clip and fall back to their rest transform.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    duration_ticks: f32,
    ticks_per_second: f32,
    tracks: HashMap<BoneIndex, BoneAnimationTrack>,
}

impl AnimationClip {
    /// Start building a clip
    pub fn builder(name: &str, duration_ticks: f32, ticks_per_second: f32) -> ClipBuilder {
        ClipBuilder {
            name: name.to_string(),
            duration_ticks,
            ticks_per_second,
            tracks: HashMap::new(),
        }
    }

    /// Clip name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total clip length in ticks
    pub fn duration_ticks(&self) -> f32 {
        self.duration_ticks
    }

    /// Tick rate used to convert caller seconds into ticks
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    /// Track bundle for `bone`, or `None` when the bone is unanimated here
    ///
    /// Looked up once per bone per evaluation, not once per channel.
    pub fn track(&self, bone: BoneIndex) -> Option<&BoneAnimationTrack> {
        self.tracks.get(&bone)
    }

    /// Whether `bone` carries any channel in this clip
    pub fn is_animated(&self, bone: BoneIndex) -> bool {
        self.tracks.contains_key(&bone)
    }

    /// Number of animated bones
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Builder validating and assembling an [`AnimationClip`]
#[derive(Debug)]
pub struct ClipBuilder {
    name: String,
    duration_ticks: f32,
    ticks_per_second: f32,
    tracks: HashMap<BoneIndex, BoneAnimationTrack>,
}

impl ClipBuilder {
    /// Attach the channel bundle for one bone
    ///
    /// Rejects empty channels (`Some(vec![])`) and non-increasing
    /// timestamps. Re-attaching a bone replaces its previous bundle.
    pub fn track(&mut self, bone: BoneIndex, desc: BoneTrackDesc) -> Result<&mut Self> {
        let translation = Self::channel(bone, "translation", desc.translation)?;
        let rotation = Self::channel(bone, "rotation", desc.rotation)?;
        let scale = Self::channel(bone, "scale", desc.scale)?;

        let shared = SharedKeyTimes {
            translation_rotation: key_times_aligned(translation.as_ref(), rotation.as_ref()),
            translation_scale: key_times_aligned(translation.as_ref(), scale.as_ref()),
            rotation_scale: key_times_aligned(rotation.as_ref(), scale.as_ref()),
        };

        self.tracks.insert(
            bone,
            BoneAnimationTrack {
                translation,
                rotation,
                scale,
                post_state: desc.post_state,
                shared,
            },
        );
        Ok(self)
    }

    fn channel<T>(
        bone: BoneIndex,
        name: &'static str,
        keys: Option<Vec<Keyframe<T>>>,
    ) -> Result<Option<KeyframeTrack<T>>> {
        let Some(keys) = keys else {
            return Ok(None);
        };
        if keys.is_empty() {
            return Err(PoseError::EmptyKeyTrack {
                bone,
                channel: name,
            });
        }
        for (i, pair) in keys.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(PoseError::NonMonotonicKeys {
                    bone,
                    channel: name,
                    key: i + 1,
                });
            }
        }
        Ok(Some(KeyframeTrack { keys }))
    }

    /// Validate timing, drop tracks aimed outside `skeleton`'s arena, and
    /// freeze the clip
    ///
    /// A track for a bone index the skeleton does not have is an importer
    /// defect; it is dropped here with a diagnostic rather than surfacing
    /// during evaluation.
    pub fn finish(mut self, skeleton: &Skeleton) -> Result<AnimationClip> {
        let timing_ok = self.duration_ticks.is_finite()
            && self.duration_ticks > 0.0
            && self.ticks_per_second.is_finite()
            && self.ticks_per_second > 0.0;
        if !timing_ok {
            return Err(PoseError::InvalidClipTiming {
                name: self.name,
                duration: self.duration_ticks,
                ticks_per_second: self.ticks_per_second,
            });
        }

        let bone_count = skeleton.bone_count() as BoneIndex;
        self.tracks.retain(|&bone, _| {
            let keep = bone < bone_count;
            if !keep {
                log::warn!(
                    "clip '{}': dropping track for bone {bone}, skeleton has {bone_count} bones",
                    self.name
                );
            }
            keep
        });

        Ok(AnimationClip {
            name: self.name,
            duration_ticks: self.duration_ticks,
            ticks_per_second: self.ticks_per_second,
            tracks: self.tracks,
        })
    }
}
