//! Channel value interpolation primitives

use glam::{Quat, Vec3};

/// Angle threshold (radians) below which slerp falls back to a normalized
/// linear blend to avoid dividing by a vanishing `sin`.
pub const SLERP_EPSILON: f32 = 0.001;

/// Trait for values a keyframe channel can interpolate
///
/// Translation and scale channels blend component-wise; the rotation channel
/// routes through [`slerp`].
pub trait Lerp: Copy {
    /// Interpolate between `self` and `other` by factor `t` in `[0, 1]`
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(self, other: Self, t: f32) -> Self {
        Vec3::lerp(self, other, t)
    }
}

impl Lerp for Quat {
    fn lerp(self, other: Self, t: f32) -> Self {
        slerp(self, other, t)
    }
}

/// Spherical linear interpolation with a near-parallel fallback
///
/// Always takes the shorter arc. When the angle between the two rotations is
/// within [`SLERP_EPSILON`] of zero the spherical weights degenerate, so the
/// blend falls back to linear quaternion interpolation plus renormalization.
pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
    let mut dot = a.dot(b);
    let b = if dot < 0.0 {
        dot = -dot;
        -b
    } else {
        b
    };

    let theta = dot.clamp(-1.0, 1.0).acos();
    if theta < SLERP_EPSILON {
        return Quat::from_xyzw(
            a.x + t * (b.x - a.x),
            a.y + t * (b.y - a.y),
            a.z + t * (b.z - a.z),
            a.w + t * (b.w - a.w),
        )
        .normalize();
    }

    let sin_theta = theta.sin();
    let s0 = ((1.0 - t) * theta).sin() / sin_theta;
    let s1 = (t * theta).sin() / sin_theta;

    Quat::from_xyzw(
        s0 * a.x + s1 * b.x,
        s0 * a.y + s1 * b.y,
        s0 * a.z + s1 * b.z,
        s0 * a.w + s1 * b.w,
    )
}
