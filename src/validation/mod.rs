//! Tests applied to a peak candidate before it is accepted.
//!
//! Both tests compare area-normalized curves with [`curve_similarity`], which maps the
//! integrated absolute difference between two curves onto a score that is 1 for identical
//! curves and falls to 0 when the curves do not overlap at all.
mod apex;
mod shape;

pub use apex::{ApexValidation, ApexValidator};
pub use shape::{ShapeValidation, ShapeValidator};

use crate::arrayops::absolute_difference_area;

/// The decay rate of [`curve_similarity`] with respect to the difference area
pub const SIMILARITY_DECAY: f64 = 0.2;

/// Score the similarity of two area-normalized curves sampled at `x`.
///
/// ```math
/// s = \frac{e^{-d/k} - e^{-1/k}}{1 - e^{-1/k}}
/// ```
///
/// where `d` is the trapezoidal area of `|a - b|` and `k` is [`SIMILARITY_DECAY`]. The
/// score is at most 1, reached when `d` is zero.
pub fn curve_similarity(x: &[f64], a: &[f64], b: &[f64]) -> f64 {
    let diff_area = absolute_difference_area(x, a, b);
    let shift = (-1.0 / SIMILARITY_DECAY).exp();
    let height = 1.0 / (1.0 - shift);
    height * ((-diff_area / SIMILARITY_DECAY).exp() - shift)
}
