//! Bone records held in the skeleton arena

use glam::Mat4;

/// Index of a bone inside its skeleton's arena
pub type BoneIndex = u32;

/// Construction-time description of a bone, consumed by
/// [`SkeletonBuilder`](crate::skeleton::SkeletonBuilder)
///
/// All matrices default to identity; absent optional matrices act as
/// identity during evaluation.
#[derive(Debug, Clone)]
pub struct BoneDesc {
    /// Mesh-space to bone-space transform at bind time
    pub bind_offset: Mat4,
    /// Static transform used when the active clip has no track for this bone
    pub rest_transform: Mat4,
    /// Composed in front of everything else, animated or not
    pub pre_transform: Option<Mat4>,
    /// Composed after `pre_transform`, only for animated bones
    pub pre_anim_transform: Option<Mat4>,
    /// Composed between the translation and rotation channels
    pub post_anim_transform: Option<Mat4>,
    /// Non-deforming helper bone: propagates transforms but emits no matrix
    pub is_dummy: bool,
}

impl Default for BoneDesc {
    fn default() -> Self {
        Self {
            bind_offset: Mat4::IDENTITY,
            rest_transform: Mat4::IDENTITY,
            pre_transform: None,
            pre_anim_transform: None,
            post_anim_transform: None,
            is_dummy: false,
        }
    }
}

/// A single bone in a frozen skeleton arena
///
/// Bones reference each other by index only; the arena never grows or
/// shrinks once [`SkeletonBuilder::finish`](crate::skeleton::SkeletonBuilder::finish)
/// has run, so the indices stay valid for the life of the skeleton.
#[derive(Debug, Clone)]
pub struct Bone {
    pub(crate) index: BoneIndex,
    pub(crate) mirror_index: BoneIndex,
    pub(crate) parent: Option<BoneIndex>,
    pub(crate) children: Vec<BoneIndex>,
    pub(crate) bind_offset: Mat4,
    pub(crate) bind_offset_inverse: Mat4,
    pub(crate) rest_transform: Mat4,
    pub(crate) pre_transform: Option<Mat4>,
    pub(crate) pre_anim_transform: Option<Mat4>,
    pub(crate) post_anim_transform: Option<Mat4>,
    /// Cached `pre_transform * pre_anim_transform`, applied once per walk
    pub(crate) anim_prefix: Mat4,
    /// Cached `pre_transform * rest_transform` for unanimated bones
    pub(crate) rest_chain: Mat4,
    pub(crate) is_dummy: bool,
    pub(crate) is_useless: bool,
}

impl Bone {
    /// Stable arena index, equal to this bone's own slot
    pub fn index(&self) -> BoneIndex {
        self.index
    }

    /// Index of the symmetric counterpart bone; defaults to `index()`
    pub fn mirror_index(&self) -> BoneIndex {
        self.mirror_index
    }

    /// Parent bone index, `None` for roots
    pub fn parent(&self) -> Option<BoneIndex> {
        self.parent
    }

    /// Child bone indices
    pub fn children(&self) -> &[BoneIndex] {
        &self.children
    }

    /// Mesh-space to bone-space bind transform
    pub fn bind_offset(&self) -> Mat4 {
        self.bind_offset
    }

    /// Inverse of [`bind_offset`](Self::bind_offset), derived at build time
    pub fn bind_offset_inverse(&self) -> Mat4 {
        self.bind_offset_inverse
    }

    /// Transform applied when no animation track targets this bone
    pub fn rest_transform(&self) -> Mat4 {
        self.rest_transform
    }

    /// Cached `pre_transform * rest_transform` product
    pub fn rest_chain(&self) -> Mat4 {
        self.rest_chain
    }

    /// Optional transform composed in front of everything else
    pub fn pre_transform(&self) -> Option<Mat4> {
        self.pre_transform
    }

    /// Optional transform composed after `pre_transform` on animated bones
    pub fn pre_anim_transform(&self) -> Option<Mat4> {
        self.pre_anim_transform
    }

    /// Optional transform composed between translation and rotation
    pub fn post_anim_transform(&self) -> Option<Mat4> {
        self.post_anim_transform
    }

    /// Whether this bone is a non-deforming helper
    pub fn is_dummy(&self) -> bool {
        self.is_dummy
    }

    /// Whether this bone and its whole subtree are dummies; such subtrees
    /// are skipped entirely during evaluation
    pub fn is_useless(&self) -> bool {
        self.is_useless
    }
}
