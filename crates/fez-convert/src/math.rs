//! Vector and quaternion helpers used by the fragment builder.

use glam::{Quat, Vec3};

/// Axis-aligned normals indexed by the face-side code stored in the source
/// vertex data.
pub const FACE_NORMALS: [Vec3; 6] = [
    Vec3::NEG_X,
    Vec3::NEG_Y,
    Vec3::NEG_Z,
    Vec3::X,
    Vec3::Y,
    Vec3::Z,
];

/// Rotate `v` by the unit quaternion `q`.
///
/// Expanded form `2(u·v)u + (s² − u·u)v + 2s(u×v)` with `u` the vector part
/// and `s` the scalar part. Only defined for unit quaternions.
pub fn rotate(v: Vec3, q: Quat) -> Vec3 {
    let u = Vec3::new(q.x, q.y, q.z);
    let s = q.w;
    2.0 * u.dot(v) * u + (s * s - u.dot(u)) * v + 2.0 * s * u.cross(v)
}

/// Right-handed cross product, normalized for use as a surface normal.
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    a.cross(b).normalize_or_zero()
}

/// Look up the normal for a face-side code. Codes outside `0..=5` fall back
/// to `-X`.
pub fn face_normal(code: i32) -> Vec3 {
    usize::try_from(code)
        .ok()
        .and_then(|i| FACE_NORMALS.get(i).copied())
        .unwrap_or(Vec3::NEG_X)
}
