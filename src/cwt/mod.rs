//! Continuous wavelet transform peak finding over a one-dimensional signal.
//!
//! A signal is correlated with Ricker wavelets over a range of scales. The per-scale
//! coefficient maxima are linked into ridge lines from the widest scale to the narrowest,
//! and ridges that persist across most scales are turned into bounded [`PeakCandidate`]s.
//!
//! # Example
//!
//! ```rust
//! use mzridge::cwt::WaveletRidgeDetector;
//!
//! // One sample per second, in minutes
//! let time: Vec<f64> = (0..61).map(|i| i as f64 / 60.0).collect();
//! let signal: Vec<f64> = (0..61)
//!     .map(|i| 1000.0 * (-0.5 * (i as f64 - 30.0).powi(2) / 4.0).exp())
//!     .collect();
//! let detector = WaveletRidgeDetector::default();
//! let peaks = detector.find_peaks(&time, &signal);
//! assert_eq!(peaks.len(), 1);
//! assert_eq!((peaks[0].left_bound, peaks[0].right_bound), (22, 38));
//! ```
mod boundary;
mod ridge;
mod transform;

use log::trace;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::trapz;

pub use boundary::{crop_to_signal, fix_left_boundary, fix_right_boundary, mostly_zero};
pub use ridge::{build_ridge_lines, filter_ridge_lines, RidgeLine, RidgePoint};
pub use transform::{
    coefficients_at_scale, ricker, scale_maxima, transform, ScaleRange, WaveletCoefficients,
};

/// A peak located by [`WaveletRidgeDetector`], with bounds given as indices into the
/// analyzed signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakCandidate {
    pub left_bound: i32,
    pub right_bound: i32,
    pub best_coefficient: f64,
    pub area: f64,
    pub coef_over_area: f64,
}

impl PeakCandidate {
    /// Shift the bounds by `offset`, e.g. to convert signal indices to scan numbers
    pub fn offset(&self, offset: i32) -> Self {
        Self {
            left_bound: self.left_bound + offset,
            right_bound: self.right_bound + offset,
            ..*self
        }
    }
}

/// The reasons a surviving ridge does not produce a [`PeakCandidate`]
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CandidateRejection {
    #[error("The peak boundary could not be settled on a local minimum")]
    UndefinedBoundary,
    #[error("The peak bounds contain no signal")]
    NoSignal,
    #[error("Too many samples within the peak bounds are zero")]
    MostlyZero,
    #[error("The ratio of the wavelet coefficient to peak area {0} is below the tolerance")]
    CoefficientAreaRatio(f64),
    #[error("The peak width {0} is outside of the accepted range")]
    Width(f64),
}

/// Locates peaks in a signal from its continuous wavelet transform ridge lines.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaveletRidgeDetector {
    /// The wavelet scales, in sample units
    pub scales: ScaleRange,
    /// The narrowest accepted peak, in the units of the signal's time axis
    pub min_peak_width: f64,
    /// The widest accepted peak, in the units of the signal's time axis
    pub max_peak_width: f64,
    /// The minimum ratio of the best wavelet coefficient to the peak's area. The default
    /// suits a time axis in minutes.
    pub coef_area_ratio_tolerance: f64,
}

impl Default for WaveletRidgeDetector {
    fn default() -> Self {
        Self {
            scales: ScaleRange::default(),
            min_peak_width: 0.0,
            max_peak_width: 10.0,
            coef_area_ratio_tolerance: 100.0,
        }
    }
}

impl WaveletRidgeDetector {
    pub fn new(
        scales: ScaleRange,
        min_peak_width: f64,
        max_peak_width: f64,
        coef_area_ratio_tolerance: f64,
    ) -> Self {
        Self {
            scales,
            min_peak_width,
            max_peak_width,
            coef_area_ratio_tolerance,
        }
    }

    pub fn scales(mut self, scales: ScaleRange) -> Self {
        self.scales = scales;
        self
    }

    pub fn peak_width(mut self, min_peak_width: f64, max_peak_width: f64) -> Self {
        self.min_peak_width = min_peak_width;
        self.max_peak_width = max_peak_width;
        self
    }

    pub fn coef_area_ratio_tolerance(mut self, value: f64) -> Self {
        self.coef_area_ratio_tolerance = value;
        self
    }

    /// Compute the wavelet coefficients of `signal` over the configured scales
    pub fn transform(&self, time: &[f64], signal: &[f64]) -> Option<WaveletCoefficients> {
        transform(time, signal, &self.scales.scales())
    }

    /// Find the ridge lines of `signal` that span enough scales to be peaks
    pub fn ridge_lines(&self, time: &[f64], signal: &[f64]) -> Vec<RidgeLine> {
        match self.transform(time, signal) {
            Some(coefficients) => filter_ridge_lines(build_ridge_lines(&coefficients)),
            None => Vec::new(),
        }
    }

    /// Find the peaks of `signal` sampled at `time`.
    ///
    /// `time` must be sorted. Signals with fewer than two points produce no peaks.
    pub fn find_peaks(&self, time: &[f64], signal: &[f64]) -> Vec<PeakCandidate> {
        let n = time.len().min(signal.len());
        let (time, signal) = (&time[..n], &signal[..n]);
        self.ridge_lines(time, signal)
            .iter()
            .filter_map(|ridge| match self.extract_candidate(ridge, time, signal) {
                Ok(candidate) => Some(candidate),
                Err(reason) => {
                    trace!("Rejected ridge at {:?}: {reason}", ridge.best());
                    None
                }
            })
            .collect()
    }

    /// Convert one ridge line into a bounded peak
    pub fn extract_candidate(
        &self,
        ridge: &RidgeLine,
        time: &[f64],
        signal: &[f64],
    ) -> Result<PeakCandidate, CandidateRejection> {
        let n = signal.len();
        let best = ridge.best();
        let reach = best.scale.round() as usize;

        let right = (best.index + reach).min(n - 1);
        let left = best.index.saturating_sub(reach);
        let left = fix_left_boundary(signal, left).ok_or(CandidateRejection::UndefinedBoundary)?;
        let right =
            fix_right_boundary(signal, right).ok_or(CandidateRejection::UndefinedBoundary)?;

        let (left, right) = crop_to_signal(signal, left, right).ok_or(CandidateRejection::NoSignal)?;

        if mostly_zero(signal, left, right) {
            return Err(CandidateRejection::MostlyZero);
        }

        let area: f64 = trapz(&time[left..=right], &signal[left..=right]);
        if area <= 0.0 {
            return Err(CandidateRejection::NoSignal);
        }
        let coef_over_area = best.coefficient / area;
        if coef_over_area < self.coef_area_ratio_tolerance {
            return Err(CandidateRejection::CoefficientAreaRatio(coef_over_area));
        }

        let width = time[right] - time[left];
        if !(self.min_peak_width..=self.max_peak_width).contains(&width) {
            return Err(CandidateRejection::Width(width));
        }

        Ok(PeakCandidate {
            left_bound: left as i32,
            right_bound: right as i32,
            best_coefficient: best.coefficient,
            area,
            coef_over_area,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gaussian(time: &[f64], center: f64, sigma: f64, height: f64) -> Vec<f64> {
        time.iter()
            .map(|t| {
                let y = height * (-0.5 * (t - center).powi(2) / sigma.powi(2)).exp();
                if y < 1.0 {
                    0.0
                } else {
                    y
                }
            })
            .collect()
    }

    #[test_log::test]
    #[test_log(default_log_filter = "debug")]
    fn test_single_peak() {
        let time: Vec<f64> = (0..41).map(|i| i as f64).collect();
        let signal = gaussian(&time, 20.0, 2.0, 1000.0);
        let detector = WaveletRidgeDetector::default()
            .peak_width(0.0, 20.0)
            .coef_area_ratio_tolerance(0.01);
        let peaks = detector.find_peaks(&time, &signal);
        assert_eq!(peaks.len(), 1);
        let peak = peaks[0];
        assert_eq!(peak.left_bound, 12);
        assert_eq!(peak.right_bound, 28);
        assert!(peak.area > 0.0);
        assert_eq!(peak.coef_over_area, peak.best_coefficient / peak.area);
    }

    #[test]
    fn test_two_peaks() {
        let time: Vec<f64> = (0..81).map(|i| i as f64 * 0.5).collect();
        let mut signal = gaussian(&time, 10.0, 1.0, 1000.0);
        for (s, y) in signal.iter_mut().zip(gaussian(&time, 28.0, 1.5, 500.0)) {
            *s += y;
        }
        let detector = WaveletRidgeDetector::default()
            .peak_width(0.0, 20.0)
            .coef_area_ratio_tolerance(0.01);
        let mut peaks = detector.find_peaks(&time, &signal);
        peaks.sort_by_key(|p| p.left_bound);
        assert_eq!(peaks.len(), 2);
        assert!(peaks[0].right_bound < peaks[1].left_bound);
    }

    #[rstest::rstest]
    #[case(0.0, 5.0)]
    #[case(17.0, 30.0)]
    #[case(0.0, 16.0)]
    #[case(16.0, 16.0)]
    fn test_width_bound(#[case] min_width: f64, #[case] max_width: f64) {
        let time: Vec<f64> = (0..41).map(|i| i as f64).collect();
        let signal = gaussian(&time, 20.0, 2.0, 1000.0);
        let detector = WaveletRidgeDetector::default()
            .peak_width(min_width, max_width)
            .coef_area_ratio_tolerance(0.01);
        for peak in detector.find_peaks(&time, &signal) {
            let width = time[peak.right_bound as usize] - time[peak.left_bound as usize];
            assert!(width >= min_width && width <= max_width);
        }
        let expected = if (min_width..=max_width).contains(&16.0) { 1 } else { 0 };
        assert_eq!(detector.find_peaks(&time, &signal).len(), expected);
    }

    #[test]
    fn test_ridge_survival() {
        let time: Vec<f64> = (0..41).map(|i| i as f64).collect();
        let signal = gaussian(&time, 20.0, 2.0, 1000.0);
        let detector = WaveletRidgeDetector::default().coef_area_ratio_tolerance(0.01);
        let total = detector.scales.len();
        for ridge in detector.ridge_lines(&time, &signal) {
            assert!(ridge.len() + 3 >= total);
        }
    }

    #[test]
    fn test_flat_and_short_signals() {
        let time: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let detector = WaveletRidgeDetector::default().coef_area_ratio_tolerance(0.0);
        assert!(detector.find_peaks(&time, &vec![0.0; 20]).is_empty());
        assert!(detector.find_peaks(&time[..1], &[5.0]).is_empty());
        assert!(detector.find_peaks(&[], &[]).is_empty());
    }

    #[test]
    fn test_candidate_offset() {
        let candidate = PeakCandidate {
            left_bound: 2,
            right_bound: 9,
            best_coefficient: 1.0,
            area: 2.0,
            coef_over_area: 0.5,
        };
        let shifted = candidate.offset(30);
        assert_eq!(shifted.left_bound, 32);
        assert_eq!(shifted.right_bound, 39);
        assert_eq!(shifted.area, 2.0);
    }
}
