//! Rigid camera poses and their composition with a similarity transform.
//!
//! A [`Pose`] is stored local-to-world: `rotation` maps camera axes to world axes and
//! `center` is the camera position in the world frame. Extrinsics in the world-to-local
//! direction (e.g. COLMAP `qvec`/`tvec`) are converted with [`invert_pose`].

use serde::Serialize;

use crate::align::NumericTol;
use crate::error::Sim3Error;
use crate::linalg;
use crate::sim3::{check_rotation, to_homogeneous, SimilarityTransform};
use crate::{Matrix3, Matrix4, Point3};

/// A rigid camera pose in the local-to-world convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    rotation: Matrix3,
    center: Point3,
}

impl Pose {
    /// Create a pose, checking that `rotation` is a proper rotation.
    pub fn new(rotation: Matrix3, center: Point3) -> Result<Self, Sim3Error> {
        Self::with_tolerance(rotation, center, NumericTol::default().eps)
    }

    /// Same as [`Pose::new`] with an explicit rotation tolerance.
    pub fn with_tolerance(rotation: Matrix3, center: Point3, eps: f64) -> Result<Self, Sim3Error> {
        check_rotation(&rotation, eps)?;
        Ok(Self { rotation, center })
    }

    /// Create a pose from world-to-local extrinsics `x_local = R * x_world + t`.
    pub fn from_world_to_local(rotation: Matrix3, translation: Point3) -> Result<Self, Sim3Error> {
        let eps = NumericTol::default().eps;
        Self::from_world_to_local_with_tolerance(rotation, translation, eps)
    }

    /// Same as [`Pose::from_world_to_local`] with an explicit rotation tolerance.
    pub fn from_world_to_local_with_tolerance(
        rotation: Matrix3,
        translation: Point3,
        eps: f64,
    ) -> Result<Self, Sim3Error> {
        check_rotation(&rotation, eps)?;
        let (rotation, center) = invert_pose(&rotation, &translation);
        Ok(Self { rotation, center })
    }

    /// Local-to-world rotation.
    pub fn rotation(&self) -> &Matrix3 {
        &self.rotation
    }

    /// Camera center in the world frame.
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// World-to-local rotation and translation.
    pub fn world_to_local(&self) -> (Matrix3, Point3) {
        invert_pose(&self.rotation, &self.center)
    }

    /// Homogeneous local-to-world matrix `[R | c; 0 0 0 1]`.
    pub fn matrix(&self) -> Matrix4 {
        to_homogeneous(1.0, &self.rotation, &self.center)
    }
}

/// Invert a rigid transform: `R' = R^T`, `t' = -R^T * c`.
///
/// Converts a local-to-world pose `(R, c)` to world-to-local and back; applying it twice
/// returns the input.
pub fn invert_pose(rotation: &Matrix3, center: &Point3) -> (Matrix3, Point3) {
    let rotation_inv = linalg::transpose33(rotation);
    let translation_inv = linalg::scale3(&linalg::mat33_mul_vec3(&rotation_inv, center), -1.0);
    (rotation_inv, translation_inv)
}

/// Apply a similarity transform to a collection of poses.
///
/// Each pose is composed as `T * P` in homogeneous form. The rotation block of the product
/// carries one factor of the transform scale, which is divided out so the rotation stays
/// orthonormal. The translation block keeps the scale.
///
/// Returns one pose per input, in the same order.
pub fn apply_similarity(poses: &[Pose], transform: &SimilarityTransform) -> Vec<Pose> {
    let transform_mat = transform.matrix();
    poses
        .iter()
        .map(|pose| compose_pose(&transform_mat, transform.scale(), pose))
        .collect()
}

fn compose_pose(transform_mat: &Matrix4, scale: f64, pose: &Pose) -> Pose {
    let fixed = linalg::matmul44(transform_mat, &pose.matrix());

    let scaled_rotation = [
        [fixed[0][0], fixed[0][1], fixed[0][2]],
        [fixed[1][0], fixed[1][1], fixed[1][2]],
        [fixed[2][0], fixed[2][1], fixed[2][2]],
    ];
    // strip the scale from the rotation block only
    let rotation = linalg::scale_mat33(&scaled_rotation, 1.0 / scale);
    let center = [fixed[0][3], fixed[1][3], fixed[2][3]];

    Pose { rotation, center }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;
    use crate::transforms::axis_angle_to_rotation_matrix;
    use approx::assert_relative_eq;

    fn assert_pose_eq(a: &Pose, b: &Pose, eps: f64) {
        for i in 0..3 {
            assert_relative_eq!(a.center()[i], b.center()[i], epsilon = eps);
            for j in 0..3 {
                assert_relative_eq!(a.rotation()[i][j], b.rotation()[i][j], epsilon = eps);
            }
        }
    }

    fn sample_pose() -> Result<Pose, Sim3Error> {
        let rotation = axis_angle_to_rotation_matrix(&[0.4, 1.0, -0.3], 1.3)?;
        Pose::new(rotation, [1.0, -2.0, 0.5])
    }

    #[test]
    fn test_invert_pose_involution() -> Result<(), Box<dyn std::error::Error>> {
        let pose = sample_pose()?;
        let (r_inv, t_inv) = invert_pose(pose.rotation(), pose.center());
        let (r, c) = invert_pose(&r_inv, &t_inv);
        assert_pose_eq(&Pose::new(r, c)?, &pose, 1e-12);

        // the inverse maps the camera center to the local origin
        let origin = linalg::add3(&linalg::mat33_mul_vec3(&r_inv, pose.center()), &t_inv);
        for v in origin {
            assert_relative_eq!(v, 0.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_world_to_local_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let pose = sample_pose()?;
        let (rotation, translation) = pose.world_to_local();
        let recovered = Pose::from_world_to_local(rotation, translation)?;
        assert_pose_eq(&recovered, &pose, 1e-12);
        Ok(())
    }

    #[test]
    fn test_from_world_to_local_tolerance() -> Result<(), Box<dyn std::error::Error>> {
        let mut noisy = linalg::IDENTITY33;
        noisy[1][2] = 1e-5;
        assert!(matches!(
            Pose::from_world_to_local(noisy, [1.0, 2.0, 3.0]),
            Err(Sim3Error::InvalidRotation { .. })
        ));

        let pose = Pose::from_world_to_local_with_tolerance(noisy, [1.0, 2.0, 3.0], 1e-4)?;
        assert_eq!(pose.rotation(), &linalg::transpose33(&noisy));
        assert_relative_eq!(pose.center()[0], -1.0, epsilon = 1e-9);
        assert_relative_eq!(pose.center()[1], -2.0, epsilon = 1e-4);
        assert_relative_eq!(pose.center()[2], -3.0, epsilon = 1e-4);
        Ok(())
    }

    #[test]
    fn test_new_rejects_scaled_rotation() {
        let scaled = linalg::scale_mat33(&linalg::IDENTITY33, 2.0);
        assert!(matches!(
            Pose::new(scaled, [0.0; 3]),
            Err(Sim3Error::InvalidRotation { .. })
        ));
        // a relaxed tolerance accepts single precision rounding
        let mut noisy = linalg::IDENTITY33;
        noisy[0][1] = 1e-5;
        assert!(Pose::new(noisy, [0.0; 3]).is_err());
        assert!(Pose::with_tolerance(noisy, [0.0; 3], 1e-4).is_ok());
    }

    #[test]
    fn test_apply_similarity_keeps_rotation_orthonormal() -> Result<(), Box<dyn std::error::Error>>
    {
        let pose = sample_pose()?;
        let rotation = axis_angle_to_rotation_matrix(&[0.0, 1.0, 0.0], 0.5)?;
        let transform = SimilarityTransform::new(rotation, [3.0, 0.0, -1.0], 4.0)?;

        let moved = apply_similarity(&[pose], &transform);
        assert_eq!(moved.len(), 1);
        assert!(linalg::is_rotation(moved[0].rotation(), 1e-9));

        // rotation composes without scale, the center is mapped as a point
        let expected_rotation = linalg::matmul33(&rotation, pose.rotation());
        let expected_center = transform.transform_point(pose.center());
        assert_pose_eq(&moved[0], &Pose::new(expected_rotation, expected_center)?, 1e-12);
        Ok(())
    }

    #[test]
    fn test_apply_similarity_identity() -> Result<(), Box<dyn std::error::Error>> {
        let poses = vec![sample_pose()?, Pose::new(linalg::IDENTITY33, [5.0, 5.0, 5.0])?];
        let moved = apply_similarity(&poses, &SimilarityTransform::identity());
        assert_eq!(moved.len(), poses.len());
        for (a, b) in moved.iter().zip(poses.iter()) {
            assert_pose_eq(a, b, 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_apply_similarity_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let model = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 3.0],
            [1.0, 1.0, 1.0],
        ];
        let truth = SimilarityTransform::new(
            axis_angle_to_rotation_matrix(&[1.0, -1.0, 2.0], -0.8)?,
            [0.1, 0.2, 0.3],
            0.25,
        )?;
        let data = truth.transform_points(&model);
        let transform = align(&model, &data, true)?.transform;

        let pose = sample_pose()?;
        let moved = apply_similarity(&[pose], &transform)[0];

        // through world-to-local and back, then undo the transform
        let (r_w2l, t_w2l) = moved.world_to_local();
        let (rotation, center) = invert_pose(&r_w2l, &t_w2l);
        let restored = apply_similarity(&[Pose::new(rotation, center)?], &transform.inverse())[0];

        assert_pose_eq(&restored, &pose, 1e-5);
        Ok(())
    }

    #[test]
    fn test_apply_similarity_preserves_order() -> Result<(), Box<dyn std::error::Error>> {
        let poses = (0..5)
            .map(|i| Pose::new(linalg::IDENTITY33, [i as f64, 0.0, 0.0]))
            .collect::<Result<Vec<_>, _>>()?;
        let transform = SimilarityTransform::new(linalg::IDENTITY33, [0.0, 1.0, 0.0], 2.0)?;
        let moved = apply_similarity(&poses, &transform);
        for (i, pose) in moved.iter().enumerate() {
            assert_eq!(*pose.center(), [2.0 * i as f64, 1.0, 0.0]);
        }
        Ok(())
    }
}
