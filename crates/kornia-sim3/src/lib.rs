#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Sim3
//!
//! Estimate the similarity transform (rotation, translation and uniform scale) that maps
//! one ordered set of 3D points onto another with Horn's closed-form method, and apply
//! the result to a collection of rigid camera poses.
//!
//! ## Example
//!
//! ```rust
//! use kornia_sim3::{align, apply_similarity, Pose};
//!
//! let model = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, -1.0, 0.0], [0.0, -1.0, 0.0]];
//! let data = [[0.0, -1.0, 1.0], [0.0, -1.0, 3.0], [0.0, -3.0, 3.0], [0.0, -3.0, 1.0]];
//!
//! let result = align(&model, &data, true).unwrap();
//! assert!((result.transform.scale() - 2.0).abs() < 1e-6);
//!
//! let rotation = [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]];
//! let poses = vec![Pose::new(rotation, model[1]).unwrap()];
//! let moved = apply_similarity(&poses, &result.transform);
//! assert!((moved[0].center()[2] - 3.0).abs() < 1e-6);
//! ```

/// Horn's closed-form similarity alignment.
pub mod align;

/// Error types.
pub mod error;

/// Linear algebra utilities for fixed-size matrices.
pub mod linalg;

/// Rigid camera poses and similarity composition.
pub mod pose;

/// Similarity group Sim(3) value type.
pub mod sim3;

/// Synthetic scenes for demos and tests.
pub mod synthetic;

/// Rotation parameterization conversions.
pub mod transforms;

pub use align::{
    align, align_batch, align_with_params, AlignParams, AlignmentResult, Degeneracy, ErrorStats,
    NumericTol,
};
pub use error::Sim3Error;
pub use pose::{apply_similarity, invert_pose, Pose};
pub use sim3::{to_homogeneous, SimilarityTransform};

/// A point or vector in 3D.
pub type Point3 = [f64; 3];

/// A row-major 3x3 matrix.
pub type Matrix3 = [[f64; 3]; 3];

/// A row-major 4x4 homogeneous matrix.
pub type Matrix4 = [[f64; 4]; 4];
