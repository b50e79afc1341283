use thiserror::Error;

/// Error types for skeleton and clip construction
///
/// Evaluation itself never returns an error: a degenerate input degrades to
/// a held or bind-posed bone instead of failing a render frame. Everything
/// here is raised by the builders, before any evaluation can happen.
#[derive(Error, Debug)]
pub enum PoseError {
    /// A channel track was attached with zero keyframes
    #[error("bone {bone}: empty {channel} key track (omit the channel instead)")]
    EmptyKeyTrack { bone: u32, channel: &'static str },

    /// Keyframe timestamps must be strictly increasing
    #[error("bone {bone}: {channel} keys are not strictly increasing at key {key}")]
    NonMonotonicKeys {
        bone: u32,
        channel: &'static str,
        key: usize,
    },

    /// Two bones were registered under the same name
    #[error("duplicate bone name '{name}'")]
    DuplicateBoneName { name: String },

    /// A bone referenced a parent index that has not been added yet
    #[error("bone '{name}': parent index {parent} does not exist")]
    InvalidParent { name: String, parent: u32 },

    /// The parent links loop back on themselves instead of forming a tree
    #[error("bone {bone} is part of a parent cycle")]
    CyclicHierarchy { bone: u32 },

    /// Deforming bones must precede dummy bones in the arena
    #[error("bone {index} deforms but follows a dummy bone in the arena")]
    InvalidBoneOrder { index: u32 },

    /// A mirror pairing referenced an index outside the arena
    #[error("bone {bone}: mirror index {mirror} is out of range")]
    MirrorOutOfRange { bone: u32, mirror: u32 },

    /// The bind offset matrix is singular or non-finite and cannot be inverted
    #[error("bone '{name}': bind offset matrix is not invertible")]
    BadBindOffset { name: String },

    /// Clip duration and tick rate must both be positive
    #[error("clip '{name}': invalid timing (duration {duration} ticks, {ticks_per_second} ticks/s)")]
    InvalidClipTiming {
        name: String,
        duration: f32,
        ticks_per_second: f32,
    },
}

/// Result type using `PoseError`
pub type Result<T> = std::result::Result<T, PoseError>;
