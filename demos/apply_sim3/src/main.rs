use argh::FromArgs;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;

use kornia_sim3::{
    align_with_params, apply_similarity, linalg,
    synthetic::{sample_points, simple_camera_case},
    transforms::rotation_matrix_to_quaternion,
    AlignParams, ErrorStats, Pose, SimilarityTransform,
};

#[derive(FromArgs)]
/// Align two camera reconstructions with a similarity transform and apply it to the poses
struct Args {
    /// disable the scale estimation
    #[argh(switch)]
    no_scale: bool,

    /// the number of random points sampled in frame A
    #[argh(option, default = "100")]
    num_points: usize,

    /// the seed of the point sampler
    #[argh(option, default = "42")]
    seed: u64,

    /// write a JSON report to this path
    #[argh(option)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct CameraReport {
    /// camera center after applying the transform
    center: [f64; 3],
    /// local-to-world rotation as [w, x, y, z]
    qvec: [f64; 4],
    /// distance between the moved center and the frame B center
    center_error: f64,
}

#[derive(Serialize)]
struct Report<'a> {
    params: &'a AlignParams,
    transform: &'a SimilarityTransform,
    per_point_error: &'a [f64],
    error_stats: ErrorStats,
    cameras: Vec<CameraReport>,
    num_points: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let case = simple_camera_case()?;

    let params = AlignParams {
        estimate_scale: !args.no_scale,
        ..Default::default()
    };
    let result = align_with_params(&case.centers_a(), &case.centers_b(), &params)?;
    let transform = &result.transform;

    log::info!("scale: {}", transform.scale());
    log::info!("rotation: {:?}", transform.rotation());
    log::info!("translation: {:?}", transform.translation());
    for degeneracy in &result.degeneracies {
        log::warn!("alignment degeneracy: {:?}", degeneracy);
    }

    let error_stats = result.error_stats();
    log::info!(
        "alignment error rmse: {:.6} mean: {:.6} max: {:.6}",
        error_stats.rmse,
        error_stats.mean,
        error_stats.max
    );

    let moved = apply_similarity(&case.poses_a, transform);
    let cameras = moved
        .iter()
        .zip(case.poses_b.iter())
        .enumerate()
        .map(|(i, (pose, expected))| camera_report(i, pose, expected))
        .collect::<Vec<_>>();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (points_a, points_b) = sample_points(args.num_points, transform, &mut rng);
    log::info!(
        "sampled {} points, first: {:?} -> {:?}",
        points_a.len(),
        points_a.first(),
        points_b.first()
    );

    println!("scale: {}", transform.scale());

    if let Some(path) = args.output {
        let report = Report {
            params: &params,
            transform,
            per_point_error: &result.per_point_error,
            error_stats,
            cameras,
            num_points: points_b.len(),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        log::info!("report written to {}", path.display());
    }

    Ok(())
}

fn camera_report(index: usize, pose: &Pose, expected: &Pose) -> CameraReport {
    let center_error = linalg::norm3(&linalg::sub3(pose.center(), expected.center()));
    log::info!(
        "camera{:04}: center {:?}, error to frame B {:.3e}",
        index,
        pose.center(),
        center_error
    );
    CameraReport {
        center: *pose.center(),
        qvec: rotation_matrix_to_quaternion(pose.rotation()),
        center_error,
    }
}
