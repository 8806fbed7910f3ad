use glam::{DMat3, DQuat, DVec3};

use crate::error::Sim3Error;
use crate::Matrix3;

/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation. It does not need to be normalized.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix.
///
/// Example:
///
/// ```
/// use kornia_sim3::transforms::axis_angle_to_rotation_matrix;
///
/// let axis = [1.0, 0.0, 0.0];
/// let angle = std::f64::consts::PI / 2.0;
/// let rotation = axis_angle_to_rotation_matrix(&axis, angle).unwrap();
/// assert!((rotation[1][2] + 1.0).abs() < 1e-12);
/// ```
pub fn axis_angle_to_rotation_matrix(axis: &[f64; 3], angle: f64) -> Result<Matrix3, Sim3Error> {
    // normalize the vector
    let axis_norm = {
        let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
        match magnitude < 1e-10 {
            true => return Err(Sim3Error::ZeroAxis),
            false => [
                axis[0] / magnitude,
                axis[1] / magnitude,
                axis[2] / magnitude,
            ],
        }
    };

    let [x, y, z] = axis_norm;

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    let (xy, xz, yz) = (x * y * t, x * z * t, y * z * t);
    let (xs, ys, zs) = (x * s, y * s, z * s);

    Ok([
        [c + x * x * t, xy - zs, xz + ys],
        [xy + zs, c + y * y * t, yz - xs],
        [xz - ys, yz + xs, c + z * z * t],
    ])
}

/// Convert a rotation matrix to a unit quaternion in `[w, x, y, z]` order.
///
/// The scalar-first order matches the `qvec` layout of COLMAP reconstructions.
pub fn rotation_matrix_to_quaternion(rotation: &Matrix3) -> [f64; 4] {
    let q = DQuat::from_mat3(&to_glam(rotation)).normalize();
    let qvec = [q.w, q.x, q.y, q.z];
    // q and -q are the same rotation: the first non-negligible component is positive
    let sign = qvec
        .iter()
        .find(|v| v.abs() > 1e-9)
        .map_or(1.0, |v| v.signum());
    qvec.map(|v| v * sign)
}

/// Convert a quaternion in `[w, x, y, z]` order to a rotation matrix.
///
/// The quaternion is normalized first, so any non-zero quaternion is accepted.
pub fn quaternion_to_rotation_matrix(qvec: &[f64; 4]) -> Result<Matrix3, Sim3Error> {
    let q = DQuat::from_xyzw(qvec[1], qvec[2], qvec[3], qvec[0]);
    if q.length() < 1e-10 {
        return Err(Sim3Error::ZeroAxis);
    }
    Ok(from_glam(&DMat3::from_quat(q.normalize())))
}

fn to_glam(m: &Matrix3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(m[0][0], m[1][0], m[2][0]),
        DVec3::new(m[0][1], m[1][1], m[2][1]),
        DVec3::new(m[0][2], m[1][2], m[2][2]),
    )
}

fn from_glam(m: &DMat3) -> Matrix3 {
    [
        [m.x_axis.x, m.y_axis.x, m.z_axis.x],
        [m.x_axis.y, m.y_axis.y, m.z_axis.y],
        [m.x_axis.z, m.y_axis.z, m.z_axis.z],
    ]
}
