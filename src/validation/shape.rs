use log::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::{index_axis, normalize_by_area};
use crate::peak_shape::BiGaussianPeakShape;
use crate::sparse_matrix::SparseMatrix;

use super::curve_similarity;

/// The outcome of a [`ShapeValidator`] test
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeValidation {
    pub accepted: bool,
    /// The similarity of the observed curve to the model, if a model could be built
    pub similarity: Option<f64>,
    pub shape: Option<BiGaussianPeakShape>,
}

/// Checks that a chromatogram looks like a bi-Gaussian peak
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeValidator {
    pub similarity_threshold: f64,
}

impl Default for ShapeValidator {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
        }
    }
}

impl ShapeValidator {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Test the chromatogram at `apex_mz` across scans `[left, right]`
    pub fn validate(
        &self,
        matrix: &SparseMatrix,
        apex_mz: i32,
        left: i32,
        right: i32,
    ) -> ShapeValidation {
        let x = index_axis(left, right);
        let y = matrix.eic(apex_mz, left, right);
        self.validate_curve(&x, &y)
    }

    /// Build a [`BiGaussianPeakShape`] from the half-height crossings of `intensity` and
    /// compare the two after normalizing each by its own area.
    ///
    /// The peak is accepted when the similarity exceeds
    /// [`ShapeValidator::similarity_threshold`]. A curve without a half-height crossing on
    /// both sides of its apex is rejected.
    pub fn validate_curve(&self, time: &[f64], intensity: &[f64]) -> ShapeValidation {
        let Some(shape) = BiGaussianPeakShape::from_half_height(time, intensity) else {
            trace!("No bi-Gaussian model for a curve of {} points", intensity.len());
            return ShapeValidation::default();
        };
        let fitted = shape.predict(time);
        let (Some(observed), Some(fitted)) =
            (normalize_by_area(time, intensity), normalize_by_area(time, &fitted))
        else {
            return ShapeValidation {
                accepted: false,
                similarity: None,
                shape: Some(shape),
            };
        };
        let similarity = curve_similarity(time, &observed, &fitted);
        ShapeValidation {
            accepted: similarity > self.similarity_threshold,
            similarity: Some(similarity),
            shape: Some(shape),
        }
    }
}
