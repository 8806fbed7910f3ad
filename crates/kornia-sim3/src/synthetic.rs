use rand::Rng;

use crate::error::Sim3Error;
use crate::pose::Pose;
use crate::sim3::SimilarityTransform;
use crate::Point3;

/// Camera centers of the reference rig in frame A: a unit square in the `z = 0` plane.
pub const CAMERA_CENTERS_A: [Point3; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
];

/// Camera centers of the same rig in frame B, related to frame A by a scale 2 similarity.
pub const CAMERA_CENTERS_B: [Point3; 4] = [
    [0.0, -1.0, 1.0],
    [0.0, -1.0, 3.0],
    [0.0, -3.0, 3.0],
    [0.0, -3.0, 1.0],
];

/// Rotation shared by every camera of frame A.
pub const CAMERA_ROTATION_A: [[f64; 3]; 3] = [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]];

/// Rotation shared by every camera of frame B.
pub const CAMERA_ROTATION_B: [[f64; 3]; 3] = [[0.0, 0.0, -1.0], [0.0, -1.0, 0.0], [-1.0, 0.0, 0.0]];

/// The same camera rig expressed in two independently scaled reconstructions.
#[derive(Debug, Clone)]
pub struct CameraCase {
    /// Poses in frame A.
    pub poses_a: Vec<Pose>,
    /// Poses in frame B.
    pub poses_b: Vec<Pose>,
}

impl CameraCase {
    /// Camera centers of frame A.
    pub fn centers_a(&self) -> Vec<Point3> {
        self.poses_a.iter().map(|p| *p.center()).collect()
    }

    /// Camera centers of frame B.
    pub fn centers_b(&self) -> Vec<Point3> {
        self.poses_b.iter().map(|p| *p.center()).collect()
    }
}

/// Four cameras seen from two reconstructions that differ by a similarity transform.
pub fn simple_camera_case() -> Result<CameraCase, Sim3Error> {
    let poses_a = CAMERA_CENTERS_A
        .iter()
        .map(|c| Pose::new(CAMERA_ROTATION_A, *c))
        .collect::<Result<Vec<_>, _>>()?;
    let poses_b = CAMERA_CENTERS_B
        .iter()
        .map(|c| Pose::new(CAMERA_ROTATION_B, *c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CameraCase { poses_a, poses_b })
}

/// Sample `n` points in the box `0 < x < 1, -1 < y < 0, 0.5 < z < 1.5` and map them
/// with `transform`.
///
/// # Returns
///
/// The sampled points and their transformed counterparts, index aligned.
pub fn sample_points<R: Rng>(
    n: usize,
    transform: &SimilarityTransform,
    rng: &mut R,
) -> (Vec<Point3>, Vec<Point3>) {
    let points = (0..n)
        .map(|_| {
            [
                rng.random::<f64>(),
                -rng.random::<f64>(),
                rng.random::<f64>() + 0.5,
            ]
        })
        .collect::<Vec<_>>();
    let transformed = transform.transform_points(&points);
    (points, transformed)
}
