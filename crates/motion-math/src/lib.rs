//! Rotation math shared by the motion observer.
//!
//! Everything here is pure: no allocation, no state. Vectors and quaternions
//! are `glam` types; matrices are returned in row-major order to match the
//! layout consumers of orientation events expect.

use glam::{Mat4, Quat, Vec3};

/// Standard gravity in m/s^2.
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Componentwise `a - b`.
pub fn subtract(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// Rotate `v` by the unit quaternion `q` (`q * v * q^-1`).
///
/// Uses the two-cross-product form of the sandwich product:
/// `t = 2 (q.xyz x v)`, `v' = v + w t + q.xyz x t`.
pub fn apply_rotation(v: Vec3, q: Quat) -> Vec3 {
    let (qx, qy, qz, qw) = (q.x, q.y, q.z, q.w);

    let tx = 2.0 * (qy * v.z - qz * v.y);
    let ty = 2.0 * (qz * v.x - qx * v.z);
    let tz = 2.0 * (qx * v.y - qy * v.x);

    Vec3::new(
        v.x + qw * tx + qy * tz - qz * ty,
        v.y + qw * ty + qz * tx - qx * tz,
        v.z + qw * tz + qx * ty - qy * tx,
    )
}

/// Build a quaternion from Euler angles (radians) applied in Y, X, Z order.
///
/// `v.x`, `v.y` and `v.z` are the rotations about the X, Y and Z axes. The
/// result equals `Ry(v.y) * Rx(v.x) * Rz(v.z)` and is always unit-norm.
pub fn euler_to_quaternion(v: Vec3) -> Quat {
    let (s1, c1) = (v.x / 2.0).sin_cos();
    let (s2, c2) = (v.y / 2.0).sin_cos();
    let (s3, c3) = (v.z / 2.0).sin_cos();

    Quat::from_xyzw(
        s1 * c2 * c3 + c1 * s2 * s3,
        c1 * s2 * c3 - s1 * c2 * s3,
        c1 * c2 * s3 - s1 * s2 * c3,
        c1 * c2 * c3 + s1 * s2 * s3,
    )
}

/// Hamilton product `a * b`: applying the result rotates by `b` first, then `a`.
pub fn multiply(a: Quat, b: Quat) -> Quat {
    Quat::from_xyzw(
        a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
    )
}

/// Expand a unit quaternion into a 4x4 rotation matrix.
///
/// `q` is assumed to be unit-norm; nothing is validated.
#[rustfmt::skip]
pub fn quaternion_to_matrix(q: Quat) -> Matrix {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let (x2, y2, z2) = (x + x, y + y, z + z);
    let (xx, xy, xz) = (x * x2, x * y2, x * z2);
    let (yy, yz, zz) = (y * y2, y * z2, z * z2);
    let (wx, wy, wz) = (w * x2, w * y2, w * z2);

    Matrix([
        1.0 - (yy + zz), xy - wz, xz + wy, 0.0,
        xy + wz, 1.0 - (xx + zz), yz - wx, 0.0,
        xz - wy, yz + wx, 1.0 - (xx + yy), 0.0,
        0.0, 0.0, 0.0, 1.0,
    ])
}

/// Rotation-only homogeneous transform, 16 components in row-major order.
///
/// The translation row and column are always `(0, 0, 0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f32; 16]);

impl Matrix {
    #[rustfmt::skip]
    pub const IDENTITY: Matrix = Matrix([
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Row-major elements.
    pub fn elements(&self) -> &[f32; 16] {
        &self.0
    }

    /// Element at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.0[row * 4 + col]
    }

    /// Multiply a direction vector (w = 0) by this matrix.
    pub fn transform_vector3(&self, v: Vec3) -> Vec3 {
        let m = &self.0;
        Vec3::new(
            m[0] * v.x + m[1] * v.y + m[2] * v.z,
            m[4] * v.x + m[5] * v.y + m[6] * v.z,
            m[8] * v.x + m[9] * v.y + m[10] * v.z,
        )
    }
}

impl From<Matrix> for Mat4 {
    fn from(m: Matrix) -> Mat4 {
        // glam stores columns; a row-major array read as columns is the transpose.
        Mat4::from_cols_array(&m.0).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPS
    }

    fn approx_quat(a: Quat, b: Quat) -> bool {
        (a.x - b.x).abs() < EPS
            && (a.y - b.y).abs() < EPS
            && (a.z - b.z).abs() < EPS
            && (a.w - b.w).abs() < EPS
    }

    /// Deterministic spread of Euler triples over (-pi, pi).
    fn sample_angles() -> Vec<Vec3> {
        let mut seed: u32 = 0x2545_f491;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed as f32 / u32::MAX as f32) * 2.0 * std::f32::consts::PI - std::f32::consts::PI
        };
        (0..64).map(|_| Vec3::new(next(), next(), next())).collect()
    }

    #[test]
    fn subtract_is_componentwise() {
        let d = subtract(Vec3::new(1.0, 5.0, -2.0), Vec3::new(0.5, 5.0, 3.0));
        assert!(approx_vec(d, Vec3::new(0.5, 0.0, -5.0)));
    }

    #[test]
    fn rotation_matches_glam() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5).normalize(), 1.1);
        let v = Vec3::new(0.3, -4.0, 2.5);
        assert!(approx_vec(apply_rotation(v, q), q * v));
    }

    #[test]
    fn quarter_turn_about_x() {
        let q = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let r = apply_rotation(Vec3::Y, q);
        assert!(approx_vec(r, Vec3::Z));
    }

    #[test]
    fn euler_order_is_yxz() {
        for v in sample_angles() {
            let (yaw, pitch, roll) = (v.y, v.x, v.z);
            let expected = Quat::from_rotation_y(yaw)
                * Quat::from_rotation_x(pitch)
                * Quat::from_rotation_z(roll);
            assert!(approx_quat(euler_to_quaternion(v), expected), "angles {v:?}");
        }
    }

    #[test]
    fn euler_quaternions_are_unit_norm() {
        for v in sample_angles() {
            let q = euler_to_quaternion(v);
            let norm_sq = q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w;
            assert!((norm_sq - 1.0).abs() < EPS, "angles {v:?} -> {norm_sq}");
        }
    }

    #[test]
    fn multiply_matches_hamilton_product() {
        let a = Quat::from_rotation_z(0.4);
        let b = Quat::from_rotation_x(-1.2);
        assert!(approx_quat(multiply(a, b), a * b));
        // Not commutative.
        assert!(!approx_quat(multiply(a, b), multiply(b, a)));
    }

    #[test]
    fn matrix_agrees_with_rotation() {
        for v in sample_angles() {
            let q = euler_to_quaternion(v);
            let m = quaternion_to_matrix(q);
            for basis in [Vec3::X, Vec3::Y, Vec3::Z] {
                assert!(
                    approx_vec(m.transform_vector3(basis), apply_rotation(basis, q)),
                    "angles {v:?} basis {basis:?}"
                );
            }
        }
    }

    #[test]
    fn matrix_has_no_translation() {
        let m = quaternion_to_matrix(euler_to_quaternion(Vec3::new(0.2, 1.3, -0.7)));
        for i in 0..3 {
            assert_eq!(m.get(i, 3), 0.0);
            assert_eq!(m.get(3, i), 0.0);
        }
        assert_eq!(m.get(3, 3), 1.0);
    }

    #[test]
    fn matrix_converts_to_glam() {
        let q = Quat::from_rotation_y(0.9);
        let ours: Mat4 = quaternion_to_matrix(q).into();
        let theirs = Mat4::from_quat(q);
        assert!(ours.abs_diff_eq(theirs, EPS));
    }

    #[test]
    fn identity_quaternion_gives_identity_matrix() {
        assert_eq!(quaternion_to_matrix(Quat::IDENTITY), Matrix::IDENTITY);
    }
}
