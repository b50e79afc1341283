//! Skeleton arena and its validating builder
//!
//! The builder is the only way to obtain a [`Skeleton`], and `finish()` is
//! the single choke point for the arena-layout invariants the evaluator
//! later relies on: the hierarchy is a forest (no cycles), deforming bones
//! are packed in front of dummies, bind offsets are invertible, and the
//! useless-subtree flags are derived, never trusted.

use std::collections::HashMap;

use glam::Mat4;

use crate::bone::{Bone, BoneDesc, BoneIndex};
use crate::error::{PoseError, Result};

/// Largest acceptable element-wise deviation of
/// `bind_offset * bind_offset_inverse` from identity.
const BIND_ROUNDTRIP_TOLERANCE: f32 = 1e-3;

/// An immutable bone hierarchy shared by all instances of one mesh
///
/// The arena is frozen after construction: no public API mutates it, so a
/// `Skeleton` can be shared freely across threads and mesh instances.
/// Deforming bones occupy indices `[0, valid_bone_count)`; dummy bones
/// follow.
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    roots: Vec<BoneIndex>,
    valid_bone_count: u32,
    name_to_index: HashMap<String, BoneIndex>,
}

impl Skeleton {
    /// Start building a skeleton
    pub fn builder() -> SkeletonBuilder {
        SkeletonBuilder::new()
    }

    /// All bones, indexed by [`BoneIndex`]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Bone at `index`, or `None` when out of range
    pub fn bone(&self, index: BoneIndex) -> Option<&Bone> {
        self.bones.get(index as usize)
    }

    /// Indices of bones without a parent
    pub fn roots(&self) -> &[BoneIndex] {
        &self.roots
    }

    /// Number of bones that emit a skinning matrix
    pub fn valid_bone_count(&self) -> u32 {
        self.valid_bone_count
    }

    /// Total arena size, dummies included
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Look up a bone index by its authored name
    pub fn bone_index(&self, name: &str) -> Option<BoneIndex> {
        self.name_to_index.get(name).copied()
    }

    /// Symmetric counterpart of `index`, or `None` when out of range
    pub fn mirror_of(&self, index: BoneIndex) -> Option<BoneIndex> {
        self.bone(index).map(Bone::mirror_index)
    }
}

/// Append-only builder producing a frozen [`Skeleton`]
///
/// Parents may reference bones that have not been added yet (a dummy
/// helper can parent a deforming bone even though dummies sort to the back
/// of the arena); all cross-references are validated in `finish()`.
#[derive(Debug, Default)]
pub struct SkeletonBuilder {
    bones: Vec<Bone>,
    names: Vec<String>,
    name_to_index: HashMap<String, BoneIndex>,
    mirrors: Vec<(BoneIndex, BoneIndex)>,
}

impl SkeletonBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone and return its arena index
    pub fn bone(
        &mut self,
        name: &str,
        parent: Option<BoneIndex>,
        desc: BoneDesc,
    ) -> Result<BoneIndex> {
        let index = self.bones.len() as BoneIndex;

        if self.name_to_index.contains_key(name) {
            return Err(PoseError::DuplicateBoneName {
                name: name.to_string(),
            });
        }

        let bind_offset = desc.bind_offset;
        let det = bind_offset.determinant();
        if !det.is_finite() || det.abs() < f32::EPSILON {
            return Err(PoseError::BadBindOffset {
                name: name.to_string(),
            });
        }
        let bind_offset_inverse = bind_offset.inverse();
        let roundtrip = bind_offset * bind_offset_inverse;
        if !mat4_approx_identity(roundtrip, BIND_ROUNDTRIP_TOLERANCE) {
            return Err(PoseError::BadBindOffset {
                name: name.to_string(),
            });
        }

        let pre = desc.pre_transform.unwrap_or(Mat4::IDENTITY);
        let pre_anim = desc.pre_anim_transform.unwrap_or(Mat4::IDENTITY);

        self.bones.push(Bone {
            index,
            mirror_index: index,
            parent,
            children: Vec::new(),
            bind_offset,
            bind_offset_inverse,
            rest_transform: desc.rest_transform,
            pre_transform: desc.pre_transform,
            pre_anim_transform: desc.pre_anim_transform,
            post_anim_transform: desc.post_anim_transform,
            anim_prefix: pre * pre_anim,
            rest_chain: pre * desc.rest_transform,
            is_dummy: desc.is_dummy,
            // Resolved in finish()
            is_useless: false,
        });
        self.names.push(name.to_string());
        self.name_to_index.insert(name.to_string(), index);

        Ok(index)
    }

    /// Pair `bone` with its symmetric counterpart
    ///
    /// The counterpart may be added later; the pairing is validated in
    /// `finish()`.
    pub fn mirror(&mut self, bone: BoneIndex, mirror: BoneIndex) -> &mut Self {
        self.mirrors.push((bone, mirror));
        self
    }

    /// Validate the arena invariants and freeze the skeleton
    pub fn finish(mut self) -> Result<Skeleton> {
        let count = self.bones.len() as u32;

        // Parent references and child lists
        for i in 0..self.bones.len() {
            if let Some(p) = self.bones[i].parent {
                if p >= count || p == i as u32 {
                    return Err(PoseError::InvalidParent {
                        name: self.names[i].clone(),
                        parent: p,
                    });
                }
                self.bones[p as usize].children.push(i as u32);
            }
        }

        // The hierarchy must be a forest: every bone reachable from a root
        // exactly once.
        let roots: Vec<BoneIndex> = self
            .bones
            .iter()
            .filter(|b| b.parent.is_none())
            .map(|b| b.index)
            .collect();
        let mut seen = vec![false; self.bones.len()];
        let mut visited = 0u32;
        for &root in &roots {
            let mut stack = vec![root];
            while let Some(i) = stack.pop() {
                if seen[i as usize] {
                    return Err(PoseError::CyclicHierarchy { bone: i });
                }
                seen[i as usize] = true;
                visited += 1;
                stack.extend_from_slice(&self.bones[i as usize].children);
            }
        }
        if visited != count {
            // Orphaned cycle not reachable from any root
            let bone = seen
                .iter()
                .position(|&s| !s)
                .map_or(0, |i| i as u32);
            return Err(PoseError::CyclicHierarchy { bone });
        }

        // Deforming bones must be packed in front of dummies so that
        // `index < valid_bone_count` alone decides matrix emission.
        let valid_bone_count = self
            .bones
            .iter()
            .position(|b| b.is_dummy)
            .map_or(count, |first_dummy| first_dummy as u32);
        if let Some(bad) = self.bones[valid_bone_count as usize..]
            .iter()
            .find(|b| !b.is_dummy)
        {
            return Err(PoseError::InvalidBoneOrder { index: bad.index });
        }

        for &(bone, mirror) in &self.mirrors {
            if bone >= count || mirror >= count {
                return Err(PoseError::MirrorOutOfRange { bone, mirror });
            }
            self.bones[bone as usize].mirror_index = mirror;
        }

        for &root in &roots {
            resolve_useless(&mut self.bones, root as usize);
        }

        log::debug!("skeleton frozen: {count} bones ({valid_bone_count} deforming)");

        Ok(Skeleton {
            bones: self.bones,
            roots,
            valid_bone_count,
            name_to_index: self.name_to_index,
        })
    }
}

/// Post-order sweep marking subtrees that consist purely of dummy bones
fn resolve_useless(bones: &mut [Bone], index: usize) -> bool {
    let children = bones[index].children.clone();
    let mut all_dummy = bones[index].is_dummy;
    for child in children {
        let child_useless = resolve_useless(bones, child as usize);
        all_dummy = all_dummy && child_useless;
    }
    bones[index].is_useless = all_dummy;
    all_dummy
}

fn mat4_approx_identity(m: Mat4, tolerance: f32) -> bool {
    let id = Mat4::IDENTITY.to_cols_array();
    m.to_cols_array()
        .iter()
        .zip(id.iter())
        .all(|(a, b)| (a - b).abs() <= tolerance)
}
