//! Quaternion, inertia and contact-frame helpers layered on top of `glam`.

use glam::{Mat3, Quat, Vec3};

/// Squared-length window inside which the Padé renormalization is accurate to f32 precision.
///
/// The approximant's relative error grows with the square of the drift, so a
/// window of `1e-3` keeps it around `1e-7`, the f32 spacing near one.
pub const PADE_NORMALIZE_THRESHOLD: f32 = 1e-3;

/// Whether [`normalize_quat`] takes the square-root-free path for `q`.
pub fn uses_pade_normalization(q: Quat) -> bool {
    (1.0 - q.length_squared()).abs() < PADE_NORMALIZE_THRESHOLD
}

/// Renormalizes a quaternion that has drifted away from unit length.
///
/// Near-unit inputs use the first-order Padé approximant `2 / (1 + |q|²)` of
/// `1 / sqrt(|q|²)`, which needs no square root. Everything else falls back to
/// the exact reciprocal square root. A degenerate quaternion becomes identity.
pub fn normalize_quat(q: Quat) -> Quat {
    let length_sq = q.length_squared();
    if !length_sq.is_finite() || length_sq <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    let scale = if uses_pade_normalization(q) {
        2.0 / (1.0 + length_sq)
    } else {
        1.0 / length_sq.sqrt()
    };
    q * scale
}

/// Time derivative of an orientation rotating with `angular_velocity`: `0.5 · (ω, 0) · q`.
pub fn spin(angular_velocity: Vec3, orientation: Quat) -> Quat {
    let omega = Quat::from_xyzw(angular_velocity.x, angular_velocity.y, angular_velocity.z, 0.0);
    (omega * orientation) * 0.5
}

/// Adds a scaled rotation vector to an orientation (first-order update, not renormalized).
pub fn add_scaled_rotation(orientation: Quat, rotation: Vec3, scale: f32) -> Quat {
    orientation + spin(rotation * scale, orientation)
}

/// Rotates a body-space diagonal inverse inertia into world space: `R · diag(inv) · Rᵀ`.
pub fn world_inverse_inertia(orientation: Quat, inverse_inertia: Vec3) -> Mat3 {
    let rotation = Mat3::from_quat(orientation);
    rotation * Mat3::from_diagonal(inverse_inertia) * rotation.transpose()
}

/// Matrix form of the cross product, `skew(a) · b == a × b`.
pub fn skew_symmetric(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    )
}

/// Orthonormal contact frame whose first column is `normal`.
///
/// The first tangent is built in the plane of the normal's dominant world axis
/// so the frame is stable for normals close to any coordinate axis.
pub fn contact_basis(normal: Vec3) -> Mat3 {
    let tangent = if normal.x.abs() > normal.y.abs() {
        let s = 1.0 / (normal.z * normal.z + normal.x * normal.x).sqrt();
        Vec3::new(normal.z * s, 0.0, -normal.x * s)
    } else {
        let s = 1.0 / (normal.z * normal.z + normal.y * normal.y).sqrt();
        Vec3::new(0.0, -normal.z * s, normal.y * s)
    };
    let bitangent = normal.cross(tangent);
    Mat3::from_cols(normal, tangent, bitangent)
}

/// Reads `m[row][col]` from a column-major `Mat3`.
#[inline]
pub fn element(m: &Mat3, row: usize, col: usize) -> f32 {
    m.col(col)[row]
}
