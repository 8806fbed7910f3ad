use thiserror::Error;

/// Error types for similarity estimation and pose composition.
#[derive(Debug, Error, PartialEq)]
pub enum Sim3Error {
    /// Not enough correspondences to estimate a similarity transform.
    #[error("Similarity alignment requires at least {required} point correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimum number of correspondences required.
        required: usize,
        /// Actual number of correspondences provided.
        actual: usize,
    },

    /// Mismatched array lengths with descriptive labels.
    #[error("Mismatched array lengths: {left_name} ({left_len}) != {right_name} ({right_len})")]
    MismatchedArrayLengths {
        /// Label for the left-hand slice.
        left_name: &'static str,
        /// Length of the left-hand slice.
        left_len: usize,
        /// Label for the right-hand slice.
        right_name: &'static str,
        /// Length of the right-hand slice.
        right_len: usize,
    },

    /// A point holds a NaN or infinite coordinate.
    #[error("Non-finite coordinate in {name} at index {index}")]
    NonFinitePoint {
        /// Label of the point set.
        name: &'static str,
        /// Index of the offending point.
        index: usize,
    },

    /// The scale of a similarity transform must be finite and strictly positive.
    #[error("Invalid similarity scale {0}: must be finite and > 0")]
    InvalidScale(f64),

    /// The matrix is not a proper rotation within tolerance.
    #[error("Not a proper rotation: |R^T R - I| = {orthogonality_error:e}, det(R) = {determinant}")]
    InvalidRotation {
        /// Largest absolute entry of `R^T R - I`.
        orthogonality_error: f64,
        /// Determinant of the matrix.
        determinant: f64,
    },

    /// A rotation axis with zero length was supplied.
    #[error("Cannot compute rotation matrix from a zero axis")]
    ZeroAxis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Sim3Error::InsufficientCorrespondences {
            required: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Similarity alignment requires at least 3 point correspondences, got 2"
        );

        let err = Sim3Error::MismatchedArrayLengths {
            left_name: "model",
            left_len: 4,
            right_name: "data",
            right_len: 3,
        };
        assert_eq!(
            err.to_string(),
            "Mismatched array lengths: model (4) != data (3)"
        );
    }
}
