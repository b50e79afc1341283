//! Keyframe tracks and per-bone channel bundles

use glam::{Quat, Vec3};

/// A single timestamped sample of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    /// Sample time in clip ticks
    pub time: f32,
    /// Channel value at that time
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Create a keyframe
    pub const fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// An ordered, non-empty sequence of keyframes for one channel
///
/// Invariants (enforced by [`ClipBuilder`](crate::clip::ClipBuilder)):
/// timestamps strictly increasing, at least one key. An absent channel is
/// modeled by omitting the track, never by an empty one.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T> {
    pub(crate) keys: Vec<Keyframe<T>>,
}

impl<T> KeyframeTrack<T> {
    /// All keys, in time order
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    /// Number of keys, always at least 1
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; kept for slice-like ergonomics
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn first(&self) -> &Keyframe<T> {
        &self.keys[0]
    }

    pub(crate) fn last(&self) -> &Keyframe<T> {
        &self.keys[self.keys.len() - 1]
    }
}

/// Behavior of a track after its last key (and, for `Repeat`, before its
/// first key on wrapped loops)
///
/// Only `Repeat` changes evaluation: the segment between the last and first
/// key wraps across the clip boundary. Every other variant holds the last
/// key's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostState {
    /// Source asset left the behavior unspecified; holds the last key
    #[default]
    Default,
    /// Hold the last key's value
    Constant,
    /// Authored as linear extrapolation; degraded to holding the last key
    Linear,
    /// Wrap around to the first key across the clip boundary
    Repeat,
}

/// Which channel pairs share identical per-index key timestamps
///
/// When two channels are aligned, a bracketing index found while sampling
/// one can be reused for the other without a second scan. Computed by the
/// clip builder, never caller-supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedKeyTimes {
    pub(crate) translation_rotation: bool,
    pub(crate) translation_scale: bool,
    pub(crate) rotation_scale: bool,
}

/// Up to three keyframe channels animating one bone in one clip
#[derive(Debug, Clone, Default)]
pub struct BoneAnimationTrack {
    pub(crate) translation: Option<KeyframeTrack<Vec3>>,
    pub(crate) rotation: Option<KeyframeTrack<Quat>>,
    pub(crate) scale: Option<KeyframeTrack<Vec3>>,
    pub(crate) post_state: PostState,
    pub(crate) shared: SharedKeyTimes,
}

impl BoneAnimationTrack {
    /// Translation channel, if animated
    pub fn translation(&self) -> Option<&KeyframeTrack<Vec3>> {
        self.translation.as_ref()
    }

    /// Rotation channel, if animated
    pub fn rotation(&self) -> Option<&KeyframeTrack<Quat>> {
        self.rotation.as_ref()
    }

    /// Scale channel, if animated
    pub fn scale(&self) -> Option<&KeyframeTrack<Vec3>> {
        self.scale.as_ref()
    }

    /// Pre/post-clip behavior tag
    pub fn post_state(&self) -> PostState {
        self.post_state
    }
}

/// Construction-time channel data for one bone, consumed by
/// [`ClipBuilder`](crate::clip::ClipBuilder)
///
/// `Some(vec![])` is rejected as an empty key track; use `None` for an
/// unanimated channel.
#[derive(Debug, Clone, Default)]
pub struct BoneTrackDesc {
    pub translation: Option<Vec<Keyframe<Vec3>>>,
    pub rotation: Option<Vec<Keyframe<Quat>>>,
    pub scale: Option<Vec<Keyframe<Vec3>>>,
    pub post_state: PostState,
}

pub(crate) fn key_times_aligned<A, B>(a: Option<&KeyframeTrack<A>>, b: Option<&KeyframeTrack<B>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.len() == b.len()
                && a.keys
                    .iter()
                    .zip(b.keys.iter())
                    .all(|(ka, kb)| ka.time == kb.time)
        }
        _ => false,
    }
}
