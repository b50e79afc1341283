//! Skeletal pose evaluation
//!
//! This crate turns a bone hierarchy plus time-indexed keyframe tracks into
//! a per-bone array of skinning matrices for a point in time:
//! - frozen, index-based bone arena ([`Skeleton`]) shared across instances
//! - sparse per-bone keyframe clips ([`AnimationClip`]) with linear
//!   translation/scale and slerp rotation channels, `Repeat` wrap-around,
//!   and a transition blend that eases restarts instead of snapping
//! - per-instance [`PlaybackState`] and [`PoseBuffer`], overwritten each
//!   frame by a [`PoseEvaluator`]
//!
//! Asset decoding and GPU upload are collaborator contracts: the importer
//! feeds the builders, the renderer consumes [`PoseBuffer::matrices`].
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use skeletal_pose::{
//!     AnimationClip, BoneDesc, BoneTrackDesc, Keyframe, PlaybackState, PoseEvaluator,
//!     PostState, Skeleton,
//! };
//!
//! # fn main() -> skeletal_pose::Result<()> {
//! let mut builder = Skeleton::builder();
//! let root = builder.bone("root", None, BoneDesc::default())?;
//! let skeleton = builder.finish()?;
//!
//! let mut clip = AnimationClip::builder("bob", 2.0, 30.0);
//! clip.track(
//!     root,
//!     BoneTrackDesc {
//!         translation: Some(vec![
//!             Keyframe::new(0.0, Vec3::ZERO),
//!             Keyframe::new(1.0, Vec3::new(0.0, 1.0, 0.0)),
//!         ]),
//!         post_state: PostState::Repeat,
//!         ..BoneTrackDesc::default()
//!     },
//! )?;
//! let clip = clip.finish(&skeleton)?;
//!
//! let mut state = PlaybackState::new();
//! let mut evaluator = PoseEvaluator::new();
//! let pose = evaluator.evaluate(&skeleton, &clip, 0.016, 0.0, &mut state);
//! assert_eq!(pose.len(), skeleton.valid_bone_count() as usize);
//! # Ok(())
//! # }
//! ```

pub mod bone;
pub mod clip;
pub mod error;
pub mod evaluator;
pub mod interpolation;
pub mod pose;
pub mod skeleton;
pub mod state;
pub mod track;
pub mod types;

pub use bone::{Bone, BoneDesc, BoneIndex};
pub use clip::{AnimationClip, ClipBuilder};
pub use error::{PoseError, Result};
pub use evaluator::PoseEvaluator;
pub use interpolation::find_key_index;
pub use pose::PoseBuffer;
pub use skeleton::{Skeleton, SkeletonBuilder};
pub use state::{BoneState, PlaybackState};
pub use track::{BoneAnimationTrack, BoneTrackDesc, Keyframe, KeyframeTrack, PostState};
pub use types::{Lerp, SLERP_EPSILON, slerp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
