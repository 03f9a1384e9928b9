use std::f64::consts::PI;

use cfg_if::cfg_if;
use nalgebra::DMatrix;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::average_spacing;

/// How many scale widths either side of the center the wavelet is summed over
pub const WAVELET_SUPPORT: f64 = 5.0;

/// The Ricker ("Mexican hat") wavelet with width parameter `a`, evaluated at `x`
///
/// ```math
/// \psi(x) = \frac{2}{\sqrt{3a}\pi^{1/4}}\left(1 - \frac{x^2}{a^2}\right)\exp\left(-\frac{x^2}{2a^2}\right)
/// ```
#[inline]
pub fn ricker(x: f64, a: f64) -> f64 {
    let x2 = x.powi(2);
    let a2 = a.powi(2);
    let amplitude = 2.0 / (3.0 * a * PI.sqrt()).sqrt() * (1.0 - x2 / a2);
    (-x2 / (2.0 * a2)).exp() * amplitude
}

/// An arithmetic progression of wavelet scales, in sample units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleRange {
    pub small: f64,
    pub large: f64,
    pub increment: f64,
}

impl ScaleRange {
    pub fn new(small: f64, large: f64, increment: f64) -> Self {
        Self {
            small,
            large,
            increment,
        }
    }

    /// Every scale from `small` up to and including `large`
    pub fn scales(&self) -> Vec<f64> {
        if self.increment.is_nan() || self.increment <= 0.0 || self.small > self.large {
            return Vec::new();
        }
        let steps = ((self.large - self.small) / self.increment + 1e-9).floor() as usize;
        (0..=steps)
            .map(|i| self.small + i as f64 * self.increment)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scales().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::new(1.0, 10.0, 1.0)
    }
}

/// The wavelet coefficients of a signal, one row per scale
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletCoefficients {
    pub scales: Vec<f64>,
    pub coefficients: DMatrix<f64>,
}

impl WaveletCoefficients {
    pub fn num_scales(&self) -> usize {
        self.scales.len()
    }

    pub fn len(&self) -> usize {
        self.coefficients.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.ncols() == 0
    }

    pub fn get(&self, scale_index: usize, position: usize) -> f64 {
        self.coefficients[(scale_index, position)]
    }

    pub fn at_scale(&self, scale_index: usize) -> Vec<f64> {
        self.coefficients.row(scale_index).iter().copied().collect()
    }
}

/// Correlate `signal` with a Ricker wavelet of width `scale * spacing` centered on each
/// sample.
///
/// The sum for sample `i` runs over `round(i - 5 * scale - 1)..=round(i + 5 * scale + 1)`,
/// clamped to the array.
pub fn coefficients_at_scale(time: &[f64], signal: &[f64], scale: f64, spacing: f64) -> Vec<f64> {
    let n = time.len().min(signal.len());
    let width = scale * spacing;
    let reach = WAVELET_SUPPORT * scale + 1.0;
    (0..n)
        .map(|i| {
            let center = i as f64;
            let start = (center - reach).round().max(0.0) as usize;
            let end = ((center + reach).round() as usize).min(n - 1);
            (start..=end)
                .map(|k| signal[k] * ricker(time[k] - time[i], width))
                .sum()
        })
        .collect()
}

/// Compute the coefficient matrix for each of `scales`.
///
/// Returns [`None`] if the signal has fewer than two points or no spacing between them.
pub fn transform(time: &[f64], signal: &[f64], scales: &[f64]) -> Option<WaveletCoefficients> {
    let n = time.len().min(signal.len());
    if n < 2 {
        return None;
    }
    let spacing = average_spacing(&time[..n]);
    if spacing.is_nan() || spacing <= 0.0 {
        return None;
    }

    let rows: Vec<Vec<f64>>;
    cfg_if! {
        if #[cfg(feature = "parallelism")] {
            rows = scales
                .par_iter()
                .map(|scale| coefficients_at_scale(time, signal, *scale, spacing))
                .collect();
        } else {
            rows = scales
                .iter()
                .map(|scale| coefficients_at_scale(time, signal, *scale, spacing))
                .collect();
        }
    }

    let coefficients = DMatrix::from_fn(scales.len(), n, |r, c| rows[r][c]);
    Some(WaveletCoefficients {
        scales: scales.to_vec(),
        coefficients,
    })
}

/// Greedily pick local maxima of `coefficients` for one scale.
///
/// The largest unclaimed coefficient is taken, then every index less than
/// `round(2.5 * scale)` away from it is claimed, until nothing is left. Among equal
/// coefficients the highest index is taken first. Maxima are returned in the order they
/// were chosen.
pub fn scale_maxima(coefficients: &[f64], scale: f64) -> Vec<usize> {
    let n = coefficients.len();
    let reach = ((scale * 2.5).round() as usize).saturating_sub(1);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| {
        coefficients[*b]
            .total_cmp(&coefficients[*a])
            .then(b.cmp(a))
    });

    let mut claimed = vec![false; n];
    let mut maxima = Vec::new();
    for i in order {
        if claimed[i] {
            continue;
        }
        maxima.push(i);
        let lo = i.saturating_sub(reach);
        let hi = (i + reach).min(n - 1);
        claimed[lo..=hi].iter_mut().for_each(|c| *c = true);
    }
    maxima
}
