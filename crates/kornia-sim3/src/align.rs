//! Closed-form similarity alignment of two corresponding point sets.
//!
//! Reference: Horn, B. K. P. "Closed-form solution of absolute orientation using unit
//! quaternions." JOSA A, 1987. The rotation is recovered from the SVD of the
//! cross-covariance as in Arun et al., IEEE PAMI 1987.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::Sim3Error;
use crate::linalg;
use crate::sim3::SimilarityTransform;
use crate::Point3;

/// Minimum number of correspondences accepted by [`align`].
pub const MIN_CORRESPONDENCES: usize = 3;

/// Numeric tolerances shared by the alignment and pose routines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericTol {
    /// Tolerance for the orthonormality and `det = +1` rotation checks.
    pub eps: f64,
    /// Relative singular-value threshold used to count the rank of the cross-covariance.
    pub rank_eps: f64,
}

impl Default for NumericTol {
    fn default() -> Self {
        Self {
            eps: 1e-6,
            rank_eps: 1e-9,
        }
    }
}

/// Parameters controlling [`align_with_params`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignParams {
    /// Estimate the uniform scale. When `false` the scale is fixed to 1.
    pub estimate_scale: bool,
    /// Shared numeric tolerances.
    pub tol: NumericTol,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            estimate_scale: true,
            tol: NumericTol::default(),
        }
    }
}

/// Advisory conditions detected while aligning. They never abort the estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Degeneracy {
    /// The cross-covariance has rank below 2, e.g. collinear or coincident points.
    /// The returned rotation is one of infinitely many minimizers.
    RankDeficient {
        /// Number of singular values above the rank threshold.
        rank: usize,
    },
    /// The scale ratio was not finite and positive, so unit scale was used instead.
    UnobservableScale,
    /// The estimated rotation is not orthonormal with `det = +1` within `NumericTol::eps`.
    RotationOutOfTolerance,
}

/// Output of [`align`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentResult {
    /// Estimated transform with `data ≈ scale * rotation * model + translation`.
    pub transform: SimilarityTransform,
    /// One non-negative residual per correspondence, in input order.
    pub per_point_error: Vec<f64>,
    /// Advisory degeneracies, empty for well-conditioned inputs.
    pub degeneracies: Vec<Degeneracy>,
}

/// Summary statistics of the per-point residuals (absolute trajectory error).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorStats {
    /// Root mean square error.
    pub rmse: f64,
    /// Mean error.
    pub mean: f64,
    /// Median error.
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest error.
    pub min: f64,
    /// Largest error.
    pub max: f64,
}

impl AlignmentResult {
    /// Whether the estimation reported any degeneracy.
    pub fn is_degenerate(&self) -> bool {
        !self.degeneracies.is_empty()
    }

    /// Statistics over [`AlignmentResult::per_point_error`].
    pub fn error_stats(&self) -> ErrorStats {
        let errors = &self.per_point_error;
        let n = errors.len().max(1) as f64;

        let mean = errors.iter().sum::<f64>() / n;
        let sq_mean = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let std = errors.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = errors.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = match sorted.len() {
            0 => 0.0,
            len if len % 2 == 0 => 0.5 * (sorted[len / 2 - 1] + sorted[len / 2]),
            len => sorted[len / 2],
        };

        ErrorStats {
            rmse: sq_mean.sqrt(),
            mean,
            median,
            std: std.sqrt(),
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
        }
    }
}

/// Align `model` onto `data` with Horn's closed-form method.
///
/// # Arguments
///
/// * `model` - Source points, at least 3.
/// * `data` - Target points, index-aligned with `model`.
/// * `estimate_scale` - Whether to estimate a uniform scale.
///
/// # Returns
///
/// The transform with `data ≈ scale * rotation * model + translation` and one residual per
/// point.
pub fn align(
    model: &[Point3],
    data: &[Point3],
    estimate_scale: bool,
) -> Result<AlignmentResult, Sim3Error> {
    let params = AlignParams {
        estimate_scale,
        ..Default::default()
    };
    align_with_params(model, data, &params)
}

/// Align `model` onto `data` with explicit parameters.
///
/// The scale and translation are first estimated in the working space of `data`, where the
/// ratio `sum ||m_i||^2 / sum <d_i, R m_i>` scales `data` towards `model`. The residuals are
/// reported in that space as `||R * model_i + t_w - s_w * data_i||`. Both values are then
/// flipped to express the final transform from `model` to `data`.
pub fn align_with_params(
    model: &[Point3],
    data: &[Point3],
    params: &AlignParams,
) -> Result<AlignmentResult, Sim3Error> {
    validate_correspondences(model, data)?;

    let n = model.len() as f64;
    let model_centroid = compute_centroid(model);
    let data_centroid = compute_centroid(data);
    log::debug!(
        "model centroid: {:?}, data centroid: {:?}",
        model_centroid,
        data_centroid
    );

    let model_centered = model
        .iter()
        .map(|p| linalg::sub3(p, &model_centroid))
        .collect::<Vec<_>>();
    let data_centered = data
        .iter()
        .map(|p| linalg::sub3(p, &data_centroid))
        .collect::<Vec<_>>();

    // W = Σ model_i * data_i^T
    let mut w = [[0.0; 3]; 3];
    for (m, d) in model_centered.iter().zip(data_centered.iter()) {
        let outer = linalg::outer3(m, d);
        for i in 0..3 {
            for j in 0..3 {
                w[i][j] += outer[i][j];
            }
        }
    }

    let svd = linalg::svd33(&linalg::transpose33(&w));
    log::debug!("cross-covariance singular values: {:?}", svd.s);

    let mut degeneracies = Vec::new();
    let rank = covariance_rank(&svd.s, params.tol.rank_eps);
    if rank < 2 {
        log::warn!(
            "cross-covariance has rank {} over {} points, the rotation is not unique",
            rank,
            model.len()
        );
        degeneracies.push(Degeneracy::RankDeficient { rank });
    }

    let correction = reflection_correction(&svd.u, &svd.vt);
    let rotation = linalg::matmul33(&linalg::matmul33(&svd.u, &correction), &svd.vt);
    if !linalg::is_rotation(&rotation, params.tol.eps) {
        log::warn!(
            "estimated rotation exceeds tolerance {}: |R^T R - I| = {:e}, det(R) = {}",
            params.tol.eps,
            linalg::orthogonality_error(&rotation),
            linalg::det_mat33(&rotation)
        );
        degeneracies.push(Degeneracy::RotationOutOfTolerance);
    }

    let scale_working = if params.estimate_scale {
        let mut dots = 0.0;
        let mut norms = 0.0;
        for (m, d) in model_centered.iter().zip(data_centered.iter()) {
            let rotated = linalg::mat33_mul_vec3(&rotation, m);
            dots += linalg::dot_product3(d, &rotated);
            norms += linalg::dot_product3(m, m);
        }
        let ratio = norms / dots;
        if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            log::warn!(
                "scale is unobservable (norms: {}, dots: {}), using unit scale",
                norms,
                dots
            );
            degeneracies.push(Degeneracy::UnobservableScale);
            1.0
        }
    } else {
        1.0
    };

    // t_w = s_w * mean(data) - R * mean(model)
    let translation_working = linalg::sub3(
        &linalg::scale3(&data_centroid, scale_working),
        &linalg::mat33_mul_vec3(&rotation, &model_centroid),
    );

    let per_point_error = model
        .iter()
        .zip(data.iter())
        .map(|(m, d)| {
            let model_aligned = linalg::add3(
                &linalg::mat33_mul_vec3(&rotation, m),
                &translation_working,
            );
            let data_aligned = linalg::scale3(d, scale_working);
            linalg::norm3(&linalg::sub3(&model_aligned, &data_aligned))
        })
        .collect::<Vec<_>>();

    let scale_final = 1.0 / scale_working;
    let translation_final = linalg::scale3(&translation_working, scale_final);
    log::debug!(
        "scale working: {}, scale final: {}, mean error: {}",
        scale_working,
        scale_final,
        per_point_error.iter().sum::<f64>() / n
    );

    Ok(AlignmentResult {
        transform: SimilarityTransform::from_parts(rotation, translation_final, scale_final),
        per_point_error,
        degeneracies,
    })
}

/// Align several independent point-set pairs in parallel.
///
/// Results are returned in the order of `pairs`.
pub fn align_batch(
    pairs: &[(&[Point3], &[Point3])],
    params: &AlignParams,
) -> Vec<Result<AlignmentResult, Sim3Error>> {
    pairs
        .par_iter()
        .map(|(model, data)| align_with_params(model, data, params))
        .collect()
}

/// Compute the centroid of a set of points.
pub fn compute_centroid(points: &[Point3]) -> Point3 {
    let sum = points
        .iter()
        .fold([0.0; 3], |acc, p| linalg::add3(&acc, p));
    linalg::scale3(&sum, 1.0 / points.len() as f64)
}

fn validate_correspondences(model: &[Point3], data: &[Point3]) -> Result<(), Sim3Error> {
    if model.len() != data.len() {
        return Err(Sim3Error::MismatchedArrayLengths {
            left_name: "model",
            left_len: model.len(),
            right_name: "data",
            right_len: data.len(),
        });
    }
    if model.len() < MIN_CORRESPONDENCES {
        return Err(Sim3Error::InsufficientCorrespondences {
            required: MIN_CORRESPONDENCES,
            actual: model.len(),
        });
    }
    for (name, points) in [("model", model), ("data", data)] {
        if let Some(index) = points
            .iter()
            .position(|p| p.iter().any(|v| !v.is_finite()))
        {
            return Err(Sim3Error::NonFinitePoint { name, index });
        }
    }
    Ok(())
}

// S = diag(1, 1, -1) when U * Vt would be a reflection
fn reflection_correction(u: &[[f64; 3]; 3], vt: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut s = linalg::IDENTITY33;
    if linalg::det_mat33(u) * linalg::det_mat33(vt) < 0.0 {
        s[2][2] = -1.0;
    }
    s
}

fn covariance_rank(singular_values: &[f64; 3], rank_eps: f64) -> usize {
    let s_max = singular_values.iter().cloned().fold(0.0, f64::max);
    if s_max <= f64::MIN_POSITIVE {
        return 0;
    }
    singular_values
        .iter()
        .filter(|s| **s > rank_eps * s_max)
        .count()
}
