//! Similarity group Sim(3): uniform scale, rotation and translation in 3D.
//!
//! A [`SimilarityTransform`] maps a point as `p' = s * R * p + t`.

use serde::Serialize;

use crate::align::NumericTol;
use crate::error::Sim3Error;
use crate::linalg::{self, IDENTITY33};
use crate::{Matrix3, Matrix4, Point3};

/// Build a 4x4 homogeneous matrix of the form `[s*R | t; 0 0 0 1]`.
///
/// Only the rotation block carries the scale. The translation is written as given, so that
/// composing homogeneous matrices carries the scale through the product.
pub fn to_homogeneous(scale: f64, rotation: &Matrix3, translation: &Point3) -> Matrix4 {
    let sr = linalg::scale_mat33(rotation, scale);
    [
        [sr[0][0], sr[0][1], sr[0][2], translation[0]],
        [sr[1][0], sr[1][1], sr[1][2], translation[1]],
        [sr[2][0], sr[2][1], sr[2][2], translation[2]],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Similarity transformation in 3D: rotation + uniform scale + translation.
///
/// 7 degrees of freedom: 3 for rotation, 1 for scale, 3 for translation.
/// The transform is immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityTransform {
    rotation: Matrix3,
    translation: Point3,
    scale: f64,
}

impl SimilarityTransform {
    /// Create a transform, checking that `rotation` is proper and `scale` is positive.
    pub fn new(rotation: Matrix3, translation: Point3, scale: f64) -> Result<Self, Sim3Error> {
        Self::with_tolerance(rotation, translation, scale, NumericTol::default().eps)
    }

    /// Same as [`SimilarityTransform::new`] with an explicit rotation tolerance.
    pub fn with_tolerance(
        rotation: Matrix3,
        translation: Point3,
        scale: f64,
        eps: f64,
    ) -> Result<Self, Sim3Error> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Sim3Error::InvalidScale(scale));
        }
        check_rotation(&rotation, eps)?;
        Ok(Self::from_parts(rotation, translation, scale))
    }

    // callers guarantee a proper rotation and a positive scale
    pub(crate) fn from_parts(rotation: Matrix3, translation: Point3, scale: f64) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Identity transformation.
    pub fn identity() -> Self {
        Self::from_parts(IDENTITY33, [0.0; 3], 1.0)
    }

    /// Create from a 4x4 homogeneous matrix of the form `[s*R | t; 0 | 1]`.
    ///
    /// The scale is taken from the norm of the first column of the rotation block.
    pub fn from_matrix(mat: &Matrix4) -> Result<Self, Sim3Error> {
        let scale = linalg::norm3(&[mat[0][0], mat[1][0], mat[2][0]]);
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Sim3Error::InvalidScale(scale));
        }
        let rotation = [
            [mat[0][0] / scale, mat[0][1] / scale, mat[0][2] / scale],
            [mat[1][0] / scale, mat[1][1] / scale, mat[1][2] / scale],
            [mat[2][0] / scale, mat[2][1] / scale, mat[2][2] / scale],
        ];
        Self::new(rotation, [mat[0][3], mat[1][3], mat[2][3]], scale)
    }

    /// The rotation matrix.
    pub fn rotation(&self) -> &Matrix3 {
        &self.rotation
    }

    /// The translation vector.
    pub fn translation(&self) -> &Point3 {
        &self.translation
    }

    /// The uniform scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Homogeneous 4x4 matrix `[s*R | t; 0 0 0 1]`.
    pub fn matrix(&self) -> Matrix4 {
        to_homogeneous(self.scale, &self.rotation, &self.translation)
    }

    /// Inverse transformation.
    ///
    /// For `S = [sR | t; 0 | 1]` the inverse is `[(1/s)R^T | -(1/s)R^T t; 0 | 1]`.
    pub fn inverse(&self) -> Self {
        let rot_inv = linalg::transpose33(&self.rotation);
        let scale_inv = 1.0 / self.scale;
        let t_inv = linalg::scale3(&linalg::mat33_mul_vec3(&rot_inv, &self.translation), -scale_inv);
        Self::from_parts(rot_inv, t_inv, scale_inv)
    }

    /// Composition `self * other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &SimilarityTransform) -> Self {
        let rotation = linalg::matmul33(&self.rotation, &other.rotation);
        let translation = self.transform_point(&other.translation);
        Self::from_parts(rotation, translation, self.scale * other.scale)
    }

    /// Transform a single point: `s * R * p + t`.
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        let rotated = linalg::mat33_mul_vec3(&self.rotation, point);
        linalg::add3(&linalg::scale3(&rotated, self.scale), &self.translation)
    }

    /// Transform a set of points.
    pub fn transform_points(&self, points: &[Point3]) -> Vec<Point3> {
        let mut dst_points = vec![[0.0; 3]; points.len()];
        linalg::transform_points(
            points,
            &self.rotation,
            &self.translation,
            self.scale,
            &mut dst_points,
        );
        dst_points
    }
}

impl Default for SimilarityTransform {
    fn default() -> Self {
        Self::identity()
    }
}

pub(crate) fn check_rotation(rotation: &Matrix3, eps: f64) -> Result<(), Sim3Error> {
    if linalg::is_rotation(rotation, eps) {
        return Ok(());
    }
    Err(Sim3Error::InvalidRotation {
        orthogonality_error: linalg::orthogonality_error(rotation),
        determinant: linalg::det_mat33(rotation),
    })
}
