use log::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::{index_axis, normalize_by_area};
use crate::sparse_matrix::SparseMatrix;

use super::curve_similarity;

/// The outcome of an [`ApexValidator`] test
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ApexValidation {
    pub accepted: bool,
    /// The smallest rounded m/z whose chromatogram stayed similar to the apex's
    pub lower_mz_bound: i32,
    /// The largest rounded m/z whose chromatogram stayed similar to the apex's
    pub upper_mz_bound: i32,
    /// Every similarity computed, upward neighbors first
    pub similarities: Vec<f64>,
}

impl ApexValidation {
    fn rejected(apex_mz: i32) -> Self {
        Self {
            accepted: false,
            lower_mz_bound: apex_mz,
            upper_mz_bound: apex_mz,
            similarities: Vec::new(),
        }
    }
}

/// Checks that the chromatogram at a peak's apex m/z is echoed by the neighboring m/z rows
/// over at least one full width at half max.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ApexValidator {
    pub similarity_threshold: f64,
}

impl Default for ApexValidator {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
        }
    }
}

impl ApexValidator {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Test the peak at `apex_mz` spanning scans `[left, right]`.
    ///
    /// `fwhm` is in rounded m/z units. Neighboring m/z rows are visited outward from the
    /// apex in each direction while they remain within `2 * fwhm` of the apex and more
    /// similar than [`ApexValidator::similarity_threshold`]. The peak is accepted when the
    /// similar rows extend at least `fwhm / 2` to either side and span at least `fwhm`.
    pub fn validate(
        &self,
        matrix: &SparseMatrix,
        apex_mz: i32,
        left: i32,
        right: i32,
        fwhm: f64,
    ) -> ApexValidation {
        let x = index_axis(left, right);
        let Some(apex_curve) = normalize_by_area(&x, &matrix.eic(apex_mz, left, right)) else {
            trace!("Apex chromatogram at {apex_mz} over {left}-{right} has no area");
            return ApexValidation::rejected(apex_mz);
        };

        let mz_values = matrix.mz_values();
        let above = mz_values.partition_point(|mz| *mz <= apex_mz);
        let below = mz_values.partition_point(|mz| *mz < apex_mz);
        let mut similarities = Vec::new();

        let upper_mz_bound = self.walk(
            matrix,
            apex_mz,
            (left, right),
            &apex_curve,
            fwhm,
            mz_values[above..].iter().copied(),
            &mut similarities,
        );
        let lower_mz_bound = self.walk(
            matrix,
            apex_mz,
            (left, right),
            &apex_curve,
            fwhm,
            mz_values[..below].iter().rev().copied(),
            &mut similarities,
        );

        let half = fwhm / 2.0;
        let accepted = (upper_mz_bound - apex_mz) as f64 >= half
            && (apex_mz - lower_mz_bound) as f64 >= half
            && (upper_mz_bound - lower_mz_bound) as f64 >= fwhm;

        ApexValidation {
            accepted,
            lower_mz_bound,
            upper_mz_bound,
            similarities,
        }
    }

    /// Visit `neighbors` in order, returning the last one that was similar to the apex
    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        matrix: &SparseMatrix,
        apex_mz: i32,
        (left, right): (i32, i32),
        apex_curve: &[f64],
        fwhm: f64,
        neighbors: impl Iterator<Item = i32>,
        similarities: &mut Vec<f64>,
    ) -> i32 {
        let x = index_axis(left, right);
        let mut bound = apex_mz;
        for mz in neighbors {
            if ((mz - apex_mz).abs() as f64) >= 2.0 * fwhm {
                break;
            }
            let similarity = match normalize_by_area(&x, &matrix.eic(mz, left, right)) {
                Some(curve) => curve_similarity(&x, apex_curve, &curve),
                None => 0.0,
            };
            similarities.push(similarity);
            if similarity > self.similarity_threshold {
                bound = mz;
            } else {
                break;
            }
        }
        bound
    }
}
