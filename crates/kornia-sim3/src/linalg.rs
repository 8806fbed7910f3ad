use crate::{Matrix3, Matrix4, Point3};

/// The 3x3 identity matrix.
pub const IDENTITY33: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Singular value decomposition of a 3x3 matrix as `M = U * diag(s) * Vt`.
#[derive(Debug, Clone, Copy)]
pub struct Svd33 {
    /// Left singular vectors as columns.
    pub u: Matrix3,
    /// Singular values in non-increasing order.
    pub s: [f64; 3],
    /// Transposed right singular vectors.
    pub vt: Matrix3,
}

/// Compute the singular value decomposition of a 3x3 matrix.
pub fn svd33(mat: &Matrix3) -> Svd33 {
    let mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| mat[i][j]);
    let svd = mat.svd();

    let u = from_faer_mat33(svd.u());
    let v = from_faer_mat33(svd.v());
    let s = svd.s_diagonal();

    Svd33 {
        u,
        s: [s.read(0), s.read(1), s.read(2)],
        vt: transpose33(&v),
    }
}

fn from_faer_mat33(m: faer::MatRef<'_, f64>) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = m.read(i, j);
        }
    }
    out
}

/// Multiply two 3x3 matrices.
pub fn matmul33(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Multiply two 4x4 matrices.
pub fn matmul44(a: &Matrix4, b: &Matrix4) -> Matrix4 {
    let mut out = [[0.0; 4]; 4];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Transpose a 3x3 matrix.
pub fn transpose33(m: &Matrix3) -> Matrix3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Compute the determinant of a 3x3 matrix.
pub fn det_mat33(m: &Matrix3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Multiply every entry of a 3x3 matrix by a scalar.
pub fn scale_mat33(m: &Matrix3, s: f64) -> Matrix3 {
    m.map(|row| row.map(|v| v * s))
}

/// Multiply a 3x3 matrix by a column vector.
pub fn mat33_mul_vec3(m: &Matrix3, v: &Point3) -> Point3 {
    [
        dot_product3(&m[0], v),
        dot_product3(&m[1], v),
        dot_product3(&m[2], v),
    ]
}

/// Dot product of two 3-vectors.
#[inline]
pub fn dot_product3(a: &Point3, b: &Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Euclidean norm of a 3-vector.
#[inline]
pub fn norm3(v: &Point3) -> f64 {
    dot_product3(v, v).sqrt()
}

/// Component-wise `a - b`.
#[inline]
pub fn sub3(a: &Point3, b: &Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Component-wise `a + b`.
#[inline]
pub fn add3(a: &Point3, b: &Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Multiply a 3-vector by a scalar.
#[inline]
pub fn scale3(v: &Point3, s: f64) -> Point3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

/// Outer product `a * b^T`.
pub fn outer3(a: &Point3, b: &Point3) -> Matrix3 {
    [
        [a[0] * b[0], a[0] * b[1], a[0] * b[2]],
        [a[1] * b[0], a[1] * b[1], a[1] * b[2]],
        [a[2] * b[0], a[2] * b[1], a[2] * b[2]],
    ]
}

/// Largest absolute entry of `R^T * R - I`.
pub fn orthogonality_error(r: &Matrix3) -> f64 {
    let rtr = matmul33(&transpose33(r), r);
    let mut max_err: f64 = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            max_err = max_err.max((rtr[i][j] - IDENTITY33[i][j]).abs());
        }
    }
    max_err
}

/// Check that a matrix is a proper rotation: orthonormal with determinant +1 within `eps`.
pub fn is_rotation(r: &Matrix3, eps: f64) -> bool {
    orthogonality_error(r) <= eps && (det_mat33(r) - 1.0).abs() <= eps
}

/// Transform a set of points with a similarity `dst = scale * R * src + t`.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `dst_r_src` - A rotation matrix.
/// * `dst_t_src` - A translation vector.
/// * `scale` - The uniform scale applied after the rotation.
/// * `dst_points` - A pre-allocated vector to store the transformed points.
///
/// PRECONDITION: dst_points is a pre-allocated vector of the same size as source.
///
/// Example:
///
/// ```
/// use kornia_sim3::linalg::transform_points;
///
/// let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
/// let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let translation = [1.0, 0.0, 0.0];
/// let mut dst_points = vec![[0.0; 3]; src_points.len()];
/// transform_points(&src_points, &rotation, &translation, 2.0, &mut dst_points);
/// assert_eq!(dst_points, vec![[5.0, 4.0, 4.0], [7.0, 8.0, 10.0]]);
/// ```
pub fn transform_points(
    src_points: &[Point3],
    dst_r_src: &Matrix3,
    dst_t_src: &Point3,
    scale: f64,
    dst_points: &mut [Point3],
) {
    assert_eq!(src_points.len(), dst_points.len());

    let dst_r_src_mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| dst_r_src[i][j]);

    // create view of the source points
    let points_in_src = {
        let src_points_slice = unsafe {
            std::slice::from_raw_parts(src_points.as_ptr() as *const f64, src_points.len() * 3)
        };
        // SAFETY: src_points_slice is a Nx3 matrix where each row represents a 3D point
        faer::mat::from_row_major_slice(src_points_slice, src_points.len(), 3)
    };

    // create a mutable view of the destination points
    let mut points_in_dst = {
        let dst_points_slice = unsafe {
            std::slice::from_raw_parts_mut(
                dst_points.as_mut_ptr() as *mut f64,
                dst_points.len() * 3,
            )
        };
        // SAFETY: dst_points_slice is a 3xN matrix where each column represents a 3D point
        faer::mat::from_column_major_slice_mut(dst_points_slice, 3, dst_points.len())
    };

    // dst = scale * R * src^T
    faer::linalg::matmul::matmul(
        &mut points_in_dst,
        dst_r_src_mat.as_ref(),
        points_in_src.transpose(),
        None,
        scale,
        faer::Parallelism::None,
    );

    for point in dst_points.iter_mut() {
        point[0] += dst_t_src[0];
        point[1] += dst_t_src[1];
        point[2] += dst_t_src[2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_points_identity() {
        let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
        let mut dst_points = vec![[0.0; 3]; src_points.len()];
        transform_points(&src_points, &IDENTITY33, &[0.0; 3], 1.0, &mut dst_points);
        assert_eq!(dst_points, src_points);
    }

    #[test]
    fn test_transform_points_roundtrip() {
        let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
        let rotation = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
        let translation = [1.0, 2.0, 3.0];
        let scale = 4.0;

        let mut dst_points = vec![[0.0; 3]; src_points.len()];
        transform_points(&src_points, &rotation, &translation, scale, &mut dst_points);

        // R' = R^T / s, t' = -R^T * t / s
        let rotation_inv = transpose33(&rotation);
        let translation_inv = scale3(&mat33_mul_vec3(&rotation_inv, &translation), -1.0 / scale);

        let mut dst_points_src = vec![[0.0; 3]; dst_points.len()];
        transform_points(
            &dst_points,
            &rotation_inv,
            &translation_inv,
            1.0 / scale,
            &mut dst_points_src,
        );

        for (res, exp) in dst_points_src.iter().zip(src_points.iter()) {
            for (r, e) in res.iter().zip(exp.iter()) {
                assert_relative_eq!(r, e, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_svd33_reconstruction() {
        let m = [[2.0, -1.0, 0.5], [0.3, 4.0, 1.0], [-2.0, 0.0, 1.5]];
        let svd = svd33(&m);

        assert!(svd.s[0] >= svd.s[1] && svd.s[1] >= svd.s[2]);

        let us = [
            scale3(&[svd.u[0][0], svd.u[1][0], svd.u[2][0]], svd.s[0]),
            scale3(&[svd.u[0][1], svd.u[1][1], svd.u[2][1]], svd.s[1]),
            scale3(&[svd.u[0][2], svd.u[1][2], svd.u[2][2]], svd.s[2]),
        ];
        // columns of U * diag(s), transposed back into rows
        let us = transpose33(&us);
        let rec = matmul33(&us, &svd.vt);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rec[i][j], m[i][j], epsilon = 1e-10);
            }
        }
        assert_relative_eq!(orthogonality_error(&svd.u), 0.0, epsilon = 1e-12);
        assert_relative_eq!(orthogonality_error(&svd.vt), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_det_and_rotation_check() {
        let r = [[0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
        assert_relative_eq!(det_mat33(&r), 1.0);
        assert!(is_rotation(&r, 1e-6));

        let reflection = [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_relative_eq!(det_mat33(&reflection), -1.0);
        assert!(!is_rotation(&reflection, 1e-6));

        let scaled = scale_mat33(&r, 2.0);
        assert!(!is_rotation(&scaled, 1e-6));
    }

    #[test]
    fn test_matmul44_identity() {
        let a = [
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let eye = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        assert_eq!(matmul44(&a, &eye), a);
        assert_eq!(matmul44(&eye, &a), a);
    }
}
