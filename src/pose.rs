//! The evaluated pose: one skinning matrix per deforming bone

use glam::Mat4;

use crate::bone::BoneIndex;
use crate::skeleton::Skeleton;

/// Output of one evaluation call, owned per mesh instance
///
/// `matrices` holds one skinning matrix per deforming bone, ready for
/// upload as the shader's bone array; it is fully overwritten by every
/// evaluation, there is no partial-update contract. The buffer also retains
/// the global (model-space) transform of every visited bone so a manual
/// bone override can re-propagate a subtree without re-interpolating.
#[derive(Debug, Clone, Default)]
pub struct PoseBuffer {
    pub(crate) matrices: Vec<Mat4>,
    pub(crate) globals: Vec<Mat4>,
    pub(crate) visited: u32,
}

impl PoseBuffer {
    /// Create an empty buffer; sized on first evaluation
    pub fn new() -> Self {
        Self::default()
    }

    /// Skinning matrices, indexed by deforming-bone index
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Number of skinning matrices (the skeleton's deforming bone count)
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// True before the first evaluation
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Global (model-space) transform of `bone` from the last walk
    ///
    /// Available for every visited bone, dummies included. Skipped useless
    /// subtrees keep the identity they were reset to; out-of-range indices
    /// yield `None`.
    pub fn global(&self, bone: BoneIndex) -> Option<Mat4> {
        self.globals.get(bone as usize).copied()
    }

    /// Number of bones the last walk actually visited
    ///
    /// Useless subtrees are pruned, so this can be smaller than the arena.
    pub fn visited_bone_count(&self) -> u32 {
        self.visited
    }

    pub(crate) fn reset(&mut self, skeleton: &Skeleton) {
        self.matrices.clear();
        self.matrices
            .resize(skeleton.valid_bone_count() as usize, Mat4::IDENTITY);
        self.globals.clear();
        self.globals.resize(skeleton.bone_count(), Mat4::IDENTITY);
        self.visited = 0;
    }
}
