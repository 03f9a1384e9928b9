//! Iterative chromatographic peak detection over a [`SparseMatrix`].
//!
//! [`PeakDetector::detect`] repeatedly takes the most intense cell that has not been
//! consumed yet, runs [`WaveletRidgeDetector`] over the chromatogram at that cell's m/z in a
//! window of scans around it, and validates any peak whose apex is the seed cell with
//! [`ApexValidator`] and [`ShapeValidator`]. Every region examined is consumed, so each
//! seed is only visited once, and the run ends when the matrix is exhausted, enough peaks
//! were accepted or the run is cancelled.
//!
//! # Example
//!
//! ```rust
//! use mzridge::detection::{DetectionParameters, PeakDetector};
//! use mzridge::sparse_matrix::{RawScan, SparseMatrix};
//!
//! let scans: Vec<RawScan> = (0..100)
//!     .map(|scan| {
//!         let y = 1000.0 * (-0.5 * (scan as f64 - 50.0).powi(2) / 4.0).exp();
//!         RawScan::new(vec![450.25], vec![y as f32], Some(scan as f64))
//!     })
//!     .collect();
//! let mut matrix = SparseMatrix::with_min_intensity(scans, 1.0).unwrap();
//!
//! let parameters = DetectionParameters::default()
//!     .large_scale_half_window(20)
//!     .fwhm(Some(0.0));
//! let detector = PeakDetector::new(parameters).unwrap();
//! let run = detector.detect(&mut matrix).unwrap();
//! assert_eq!(run.peaks.len(), 1);
//! assert_eq!(run.peaks[0].max_height_scan_number, 50);
//! ```
use log::{debug, info, log_enabled, trace, Level};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::{argmax, index_axis, median};
use crate::cwt::{ScaleRange, WaveletRidgeDetector};
use crate::peak::AcceptedPeak;
use crate::peak_statistics::full_width_at_half_max;
use crate::progress::{CancellationToken, Progress};
use crate::quality::{sharpness_yang, SharedPeakCriteria};
use crate::sparse_matrix::{unround_mz, Cell, SparseMatrix, MZ_ROUNDING_FACTOR};
use crate::validation::{ApexValidator, ShapeValidator};

/// All the ways a detection run can fail to start
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("The full width at half max could not be estimated from any scan")]
    FwhmUnavailable,
}

/// The unit of a [`SparseMatrix`]'s retention times.
///
/// Peak widths and the coefficient to area ratio are measured on a time axis in minutes,
/// so retention times in seconds are divided by 60 before the wavelet search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RetentionTimeUnit {
    #[default]
    Seconds,
    Minutes,
}

impl RetentionTimeUnit {
    #[inline]
    pub fn to_minutes(&self, time: f64) -> f64 {
        match self {
            Self::Seconds => time / 60.0,
            Self::Minutes => time,
        }
    }
}

/// Configuration for a [`PeakDetector`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionParameters {
    /// The number of scans on either side of the seed cell to search for a peak in
    pub large_scale_half_window: i32,
    /// The narrowest wavelet scale, in scans
    pub small_scale: f64,
    /// The widest wavelet scale, in scans
    pub large_scale: f64,
    pub scale_increment: f64,
    /// The narrowest accepted peak, in minutes
    pub min_peak_width: f64,
    /// The widest accepted peak, in minutes
    pub max_peak_width: f64,
    /// The minimum ratio of the best wavelet coefficient to the peak's area
    pub coef_area_ratio_tolerance: f64,
    /// The similarity neighboring m/z chromatograms must exceed in [`ApexValidator`]
    pub peak_similarity_threshold: f64,
    /// The similarity the bi-Gaussian model must exceed in [`ShapeValidator`]
    pub bigaussian_similarity_threshold: f64,
    /// Stop after this many peaks are accepted. [`None`] runs until the matrix is exhausted.
    pub target_peak_count: Option<usize>,
    /// The m/z full width at half max. [`None`] estimates it from the data.
    pub fwhm: Option<f64>,
    /// The number of distinct scans to estimate the full width at half max from
    pub fwhm_estimation_scans: usize,
    pub retention_time_unit: RetentionTimeUnit,
    /// Used to flag accepted peaks as [`AcceptedPeak::shared`]
    pub shared_peak_criteria: SharedPeakCriteria,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            large_scale_half_window: 10,
            small_scale: 1.0,
            large_scale: 10.0,
            scale_increment: 1.0,
            min_peak_width: 0.0,
            max_peak_width: 10.0,
            coef_area_ratio_tolerance: 100.0,
            peak_similarity_threshold: 0.5,
            bigaussian_similarity_threshold: 0.5,
            target_peak_count: None,
            fwhm: None,
            fwhm_estimation_scans: 10,
            retention_time_unit: RetentionTimeUnit::Seconds,
            shared_peak_criteria: SharedPeakCriteria::default(),
        }
    }
}

impl DetectionParameters {
    pub fn large_scale_half_window(mut self, value: i32) -> Self {
        self.large_scale_half_window = value;
        self
    }

    /// The wavelet scales to try, from `small_scale` to `large_scale` in steps of `increment`
    pub fn scales(mut self, small_scale: f64, large_scale: f64, increment: f64) -> Self {
        self.small_scale = small_scale;
        self.large_scale = large_scale;
        self.scale_increment = increment;
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

    pub fn peak_similarity_threshold(mut self, value: f64) -> Self {
        self.peak_similarity_threshold = value;
        self
    }

    pub fn bigaussian_similarity_threshold(mut self, value: f64) -> Self {
        self.bigaussian_similarity_threshold = value;
        self
    }

    pub fn target_peak_count(mut self, value: Option<usize>) -> Self {
        self.target_peak_count = value;
        self
    }

    pub fn fwhm(mut self, value: Option<f64>) -> Self {
        self.fwhm = value;
        self
    }

    pub fn fwhm_estimation_scans(mut self, value: usize) -> Self {
        self.fwhm_estimation_scans = value;
        self
    }

    pub fn retention_time_unit(mut self, value: RetentionTimeUnit) -> Self {
        self.retention_time_unit = value;
        self
    }

    pub fn shared_peak_criteria(mut self, value: SharedPeakCriteria) -> Self {
        self.shared_peak_criteria = value;
        self
    }

    /// Check that the parameters describe a runnable detection
    pub fn validate(&self) -> Result<(), DetectionError> {
        fn invalid(name: &'static str, reason: impl Into<String>) -> DetectionError {
            DetectionError::InvalidParameter {
                name,
                reason: reason.into(),
            }
        }

        if self.large_scale_half_window < 1 {
            return Err(invalid(
                "large_scale_half_window",
                format!("{} is less than 1", self.large_scale_half_window),
            ));
        }
        for (name, value) in [
            ("small_scale", self.small_scale),
            ("large_scale", self.large_scale),
            ("scale_increment", self.scale_increment),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, format!("{value} is not a positive number")));
            }
        }
        if self.small_scale > self.large_scale {
            return Err(invalid(
                "small_scale",
                format!(
                    "{} is greater than large_scale {}",
                    self.small_scale, self.large_scale
                ),
            ));
        }
        if self.min_peak_width.is_nan() || self.min_peak_width < 0.0 {
            return Err(invalid(
                "min_peak_width",
                format!("{} is negative", self.min_peak_width),
            ));
        }
        if self.max_peak_width.is_nan() || self.min_peak_width > self.max_peak_width {
            return Err(invalid(
                "max_peak_width",
                format!(
                    "{} is less than min_peak_width {}",
                    self.max_peak_width, self.min_peak_width
                ),
            ));
        }
        if let Some(fwhm) = self.fwhm {
            if !(fwhm.is_finite() && fwhm >= 0.0) {
                return Err(invalid("fwhm", format!("{fwhm} is negative or not finite")));
            }
        }
        Ok(())
    }
}

/// Why a detection run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopReason {
    /// Every cell was either visited or consumed
    Exhausted,
    /// [`DetectionParameters::target_peak_count`] peaks were accepted
    TargetReached,
    /// The [`CancellationToken`] was triggered
    Cancelled,
}

/// The result of [`PeakDetector::detect`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionRun {
    /// The accepted peaks, in the order they were found
    pub peaks: Vec<AcceptedPeak>,
    pub stop_reason: StopReason,
    /// The number of seed cells taken from the matrix
    pub seeds_visited: usize,
    /// The m/z full width at half max used for the run
    pub fwhm: f64,
}

/// Estimate the m/z full width at half max of the matrix's peaks.
///
/// The `scans` most intense distinct scans each contribute the half height width of their
/// [`SparseMatrix::vertical_slice`], and the median width is returned. An empty matrix has
/// a width of zero.
pub fn estimate_fwhm(matrix: &SparseMatrix, scans: usize) -> Result<f64, DetectionError> {
    if matrix.is_empty() {
        return Ok(0.0);
    }
    let mut visited: Vec<i32> = Vec::with_capacity(scans);
    let mut widths = Vec::with_capacity(scans);
    for cell in matrix.iter_by_intensity() {
        if visited.len() >= scans {
            break;
        }
        if visited.contains(&cell.scan) {
            continue;
        }
        visited.push(cell.scan);

        let profile = matrix.vertical_slice(cell.scan);
        let mzs: Vec<f64> = profile.iter().map(|p| p.mz).collect();
        let intensities: Vec<f64> = profile.iter().map(|p| p.intensity as f64).collect();
        let Some(apex) = argmax(&intensities) else {
            continue;
        };
        match full_width_at_half_max(&mzs, &intensities, apex) {
            Some(width) if width > 0.0 => widths.push(width),
            _ => trace!("No half height width in scan {}", cell.scan),
        }
    }
    median(&mut widths).ok_or(DetectionError::FwhmUnavailable)
}

/// Drives detection over a [`SparseMatrix`], see the [module documentation](self)
#[derive(Debug, Clone)]
pub struct PeakDetector {
    parameters: DetectionParameters,
    cancellation: CancellationToken,
    progress: Progress,
}

impl PeakDetector {
    /// Create a detector, rejecting invalid parameters
    pub fn new(parameters: DetectionParameters) -> Result<Self, DetectionError> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            cancellation: CancellationToken::new(),
            progress: Progress::new(),
        })
    }

    /// Use an existing cancellation token instead of the detector's own
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn parameters(&self) -> &DetectionParameters {
        &self.parameters
    }

    /// A handle that stops the run from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// A handle to read the progress of the run from another thread
    pub fn progress(&self) -> Progress {
        self.progress.clone()
    }

    pub fn ridge_detector(&self) -> WaveletRidgeDetector {
        WaveletRidgeDetector::new(
            ScaleRange::new(
                self.parameters.small_scale,
                self.parameters.large_scale,
                self.parameters.scale_increment,
            ),
            self.parameters.min_peak_width,
            self.parameters.max_peak_width,
            self.parameters.coef_area_ratio_tolerance,
        )
    }

    /// The configured m/z full width at half max, or one estimated from `matrix`
    pub fn resolve_fwhm(&self, matrix: &SparseMatrix) -> Result<f64, DetectionError> {
        let fwhm = match self.parameters.fwhm {
            Some(fwhm) => fwhm,
            None => {
                let fwhm = estimate_fwhm(matrix, self.parameters.fwhm_estimation_scans)?;
                debug!("Estimated m/z full width at half max {fwhm}");
                fwhm
            }
        };
        Ok(fwhm)
    }

    /// Detect peaks in `matrix`, consuming the cells of each examined region.
    ///
    /// The matrix's cursor is not rewound first, so a second call continues where the first
    /// stopped, e.g. after a cancelled run. Call [`SparseMatrix::restore_all`] and
    /// [`SparseMatrix::reset_cursor`] to repeat a run.
    pub fn detect(&self, matrix: &mut SparseMatrix) -> Result<DetectionRun, DetectionError> {
        self.detect_with(matrix, |_| {})
    }

    /// As [`PeakDetector::detect`], calling `on_accept` with each peak as it is accepted
    pub fn detect_with<F: FnMut(&AcceptedPeak)>(
        &self,
        matrix: &mut SparseMatrix,
        mut on_accept: F,
    ) -> Result<DetectionRun, DetectionError> {
        let fwhm = self.resolve_fwhm(matrix)?;
        let fwhm_units = (fwhm * MZ_ROUNDING_FACTOR).round() as i32;
        let ridge_detector = self.ridge_detector();
        let apex_validator = ApexValidator::new(self.parameters.peak_similarity_threshold);
        let shape_validator = ShapeValidator::new(self.parameters.bigaussian_similarity_threshold);

        info!(
            "Detecting peaks over {} cells in {} scans with m/z FWHM {fwhm}",
            matrix.len(),
            matrix.num_scans()
        );

        let mut peaks = Vec::new();
        let mut seeds_visited = 0;
        let stop_reason = loop {
            if self.cancellation.is_cancelled() {
                break StopReason::Cancelled;
            }
            if let Some(target) = self.parameters.target_peak_count {
                if peaks.len() >= target {
                    break StopReason::TargetReached;
                }
            }
            let Some(seed) = matrix.next_max_intensity() else {
                break StopReason::Exhausted;
            };
            seeds_visited += 1;

            if let Some(peak) = self.process_seed(
                matrix,
                seed,
                fwhm_units,
                &ridge_detector,
                &apex_validator,
                &shape_validator,
            ) {
                debug!("Accepted {peak}");
                on_accept(&peak);
                peaks.push(peak);
            }
            self.progress.set(matrix.finished_fraction(&seed));
        };

        if stop_reason != StopReason::Cancelled {
            self.progress.set(1.0);
        }
        info!(
            "Detected {} peaks from {seeds_visited} seeds, stopped: {stop_reason:?}",
            peaks.len()
        );

        Ok(DetectionRun {
            peaks,
            stop_reason,
            seeds_visited,
            fwhm,
        })
    }

    /// Search for a peak around `seed` and consume the region examined
    fn process_seed(
        &self,
        matrix: &mut SparseMatrix,
        seed: Cell,
        fwhm_units: i32,
        ridge_detector: &WaveletRidgeDetector,
        apex_validator: &ApexValidator,
        shape_validator: &ShapeValidator,
    ) -> Option<AcceptedPeak> {
        let half = self.parameters.large_scale_half_window;
        let last_scan = matrix.num_scans() as i32 - 1;
        let window_lo = (seed.scan - half).max(0);
        let window_hi = (seed.scan + half).min(last_scan);
        let (mz_lo, mz_hi) = (
            seed.mz.saturating_sub(fwhm_units),
            seed.mz.saturating_add(fwhm_units),
        );

        let slice = matrix.horizontal_slice(seed.mz, window_lo, window_hi);
        let (mut time, signal) = matrix.signal(&slice);
        let unit = self.parameters.retention_time_unit;
        time.iter_mut().for_each(|t| *t = unit.to_minutes(*t));
        let candidates = ridge_detector.find_peaks(&time, &signal);

        if candidates.is_empty() {
            trace!(
                "No peaks at {} around scan {}",
                seed.mz_value(),
                seed.scan
            );
            matrix.remove(mz_lo, mz_hi, window_lo, window_hi);
            return None;
        }

        let mut blanked = false;
        let mut accepted = None;
        for candidate in candidates {
            let local = &signal[candidate.left_bound as usize..=candidate.right_bound as usize];
            let Some(offset) = argmax(local) else {
                continue;
            };
            let bounds = candidate.offset(window_lo);
            let (left, right) = (bounds.left_bound, bounds.right_bound);
            let apex_scan = left + offset as i32;

            if apex_scan != seed.scan {
                trace!(
                    "Peak {left}-{right} at {} belongs to scan {apex_scan}, not {}",
                    seed.mz_value(),
                    seed.scan
                );
                if !blanked {
                    matrix.remove(mz_lo, mz_hi, window_lo, window_hi);
                    blanked = true;
                }
                matrix.restore(seed.mz, seed.mz, left, right);
                continue;
            }
            if accepted.is_some() {
                continue;
            }

            let apex = apex_validator.validate(matrix, seed.mz, left, right, fwhm_units as f64);
            let shape = shape_validator.validate(matrix, seed.mz, left, right);
            if apex.accepted && shape.accepted {
                let eic = matrix.eic(seed.mz, left, right);
                let last = eic.len().saturating_sub(1);
                let sharpness = sharpness_yang(&index_axis(left, right), &eic, 0, last);
                let shared = self.parameters.shared_peak_criteria.is_shared(&eic);
                matrix.remove(apex.lower_mz_bound, apex.upper_mz_bound, left, right);
                accepted = Some(AcceptedPeak {
                    mz: seed.mz_value(),
                    lower_scan_bound: left,
                    upper_scan_bound: right,
                    max_height_scan_number: apex_scan,
                    max_height: seed.intensity,
                    candidate: bounds,
                    lower_mz_bound: unround_mz(apex.lower_mz_bound),
                    upper_mz_bound: unround_mz(apex.upper_mz_bound),
                    retention_time: matrix.retention_time(apex_scan).unwrap_or_default(),
                    shape_similarity: shape.similarity.unwrap_or_default(),
                    sharpness,
                    shared,
                });
            } else {
                if log_enabled!(Level::Trace) {
                    trace!(
                        "Rejected peak {left}-{right} at {}: apex test {} {:?}, shape test {} {:?}",
                        seed.mz_value(),
                        apex.accepted,
                        apex.similarities,
                        shape.accepted,
                        shape.similarity
                    );
                }
                matrix.remove(mz_lo, mz_hi, left, right);
            }
        }
        accepted
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sparse_matrix::RawScan;

    /// Gaussian chromatograms with a two scan standard deviation for each
    /// `(mz, center scan, height)` column, one retention time unit per scan
    fn gaussian_scans(columns: &[(f64, f64, f64)], n_scans: usize) -> SparseMatrix {
        let scans: Vec<RawScan> = (0..n_scans)
            .map(|scan| {
                let mut mzs = Vec::new();
                let mut intensities = Vec::new();
                for (mz, center, height) in columns {
                    let y = height * (-0.5 * (scan as f64 - center).powi(2) / 4.0).exp();
                    mzs.push(*mz);
                    intensities.push(y as f32);
                }
                RawScan::new(mzs, intensities, Some(scan as f64))
            })
            .collect();
        SparseMatrix::with_min_intensity(scans, 1.0).unwrap()
    }

    fn parameters() -> DetectionParameters {
        DetectionParameters::default()
            .large_scale_half_window(20)
            .fwhm(Some(0.0))
    }

    #[test_log::test]
    #[test_log(default_log_filter = "debug")]
    fn test_single_gaussian() {
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0)], 100);
        let detector = PeakDetector::new(parameters()).unwrap();
        let run = detector.detect(&mut matrix).unwrap();

        assert_eq!(run.stop_reason, StopReason::Exhausted);
        assert_eq!(run.peaks.len(), 1);
        let peak = run.peaks[0];
        assert_eq!(peak.max_height_scan_number, 50);
        assert_eq!(peak.lower_scan_bound, 42);
        assert_eq!(peak.upper_scan_bound, 58);
        assert_eq!(peak.candidate.left_bound, 42);
        assert_eq!(peak.max_height, 1000.0);
        assert_eq!(peak.retention_time, 50.0);
        assert_eq!(peak.lower_mz_bound, 100.0);
        assert!(peak.shape_similarity > 0.9);
        let sharpness = peak.sharpness.unwrap();
        assert!((sharpness - 196.73).abs() < 0.05, "{sharpness}");
        assert!(!peak.shared);
        assert_eq!(matrix.removed_count(), matrix.len());
        assert_eq!(detector.progress().get(), 1.0);
    }

    #[test]
    fn test_empty_matrix() {
        let scans: Vec<RawScan> = (0..20)
            .map(|scan| RawScan::new(vec![100.0], vec![0.0], Some(scan as f64)))
            .collect();
        let mut matrix = SparseMatrix::new(scans).unwrap();
        let detector = PeakDetector::new(parameters().fwhm(None)).unwrap();
        let run = detector.detect(&mut matrix).unwrap();
        assert!(run.peaks.is_empty());
        assert_eq!(run.stop_reason, StopReason::Exhausted);
        assert_eq!(run.seeds_visited, 0);
        assert_eq!(run.fwhm, 0.0);
    }

    #[test_log::test]
    #[test_log(default_log_filter = "debug")]
    fn test_replay_is_identical() {
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0), (200.0, 30.0, 800.0)], 100);
        let detector = PeakDetector::new(parameters()).unwrap();
        let first = detector.detect(&mut matrix).unwrap();
        assert_eq!(first.peaks.len(), 2);
        assert_eq!(first.peaks[0].max_height_scan_number, 50);
        assert_eq!(first.peaks[1].max_height_scan_number, 30);
        assert_eq!(first.peaks[1].lower_scan_bound, 22);
        assert_eq!(first.peaks[1].upper_scan_bound, 38);

        matrix.restore_all();
        matrix.reset_cursor();
        let second = detector.detect(&mut matrix).unwrap();
        assert_eq!(first, second);
        for (a, b) in first.peaks.iter().zip(second.peaks.iter()) {
            assert_eq!(a.shape_similarity, b.shape_similarity);
            assert_eq!(a.candidate, b.candidate);
        }
    }

    #[test]
    fn test_target_peak_count() {
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0), (200.0, 30.0, 800.0)], 100);
        let detector = PeakDetector::new(parameters().target_peak_count(Some(1))).unwrap();
        let run = detector.detect(&mut matrix).unwrap();
        assert_eq!(run.stop_reason, StopReason::TargetReached);
        assert_eq!(run.peaks.len(), 1);
        assert_eq!(run.seeds_visited, 1);
        assert_eq!(run.peaks[0].mz, 100.0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0)], 100);
        let token = CancellationToken::new();
        let detector = PeakDetector::new(parameters())
            .unwrap()
            .with_cancellation_token(token.clone());
        token.cancel();
        let run = detector.detect(&mut matrix).unwrap();
        assert_eq!(run.stop_reason, StopReason::Cancelled);
        assert!(run.peaks.is_empty());
        assert_eq!(run.seeds_visited, 0);
        assert_eq!(detector.progress().get(), 0.0);
        assert!(detector.cancellation_token().is_cancelled());
    }

    #[test_log::test]
    #[test_log(default_log_filter = "debug")]
    fn test_cancel_and_resume() {
        let columns = [(100.0, 50.0, 1000.0), (200.0, 30.0, 800.0)];
        let mut matrix = gaussian_scans(&columns, 100);
        let complete = PeakDetector::new(parameters())
            .unwrap()
            .detect(&mut matrix)
            .unwrap();
        assert_eq!(complete.peaks.len(), 2);

        let mut matrix = gaussian_scans(&columns, 100);
        let token = CancellationToken::new();
        let detector = PeakDetector::new(parameters())
            .unwrap()
            .with_cancellation_token(token.clone());
        let partial = detector
            .detect_with(&mut matrix, |_| token.cancel())
            .unwrap();
        assert_eq!(partial.stop_reason, StopReason::Cancelled);
        assert_eq!(partial.peaks[..], complete.peaks[..1]);
        assert!(detector.progress().get() < 1.0);

        token.reset();
        let rest = detector.detect(&mut matrix).unwrap();
        assert_eq!(rest.stop_reason, StopReason::Exhausted);
        assert_eq!(rest.peaks[..], complete.peaks[1..]);
        assert_eq!(
            partial.seeds_visited + rest.seeds_visited,
            complete.seeds_visited
        );
        assert_eq!(detector.progress().get(), 1.0);
    }

    #[test]
    fn test_fwhm_wider_than_mz_range() {
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0)], 100);
        let detector = PeakDetector::new(parameters().fwhm(Some(1.0e6))).unwrap();
        let run = detector.detect(&mut matrix).unwrap();
        assert_eq!(run.stop_reason, StopReason::Exhausted);
        assert!(run.peaks.is_empty());
        assert_eq!(matrix.removed_count(), matrix.len());
    }

    #[rstest::rstest]
    #[case(RetentionTimeUnit::Seconds, 1.5, 1)]
    #[case(RetentionTimeUnit::Minutes, 90.0, 0)]
    fn test_retention_time_unit(
        #[case] unit: RetentionTimeUnit,
        #[case] minutes: f64,
        #[case] expected: usize,
    ) {
        assert_eq!(unit.to_minutes(90.0), minutes);
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0)], 100);
        let detector = PeakDetector::new(parameters().retention_time_unit(unit)).unwrap();
        let run = detector.detect(&mut matrix).unwrap();
        assert_eq!(run.peaks.len(), expected);
    }

    #[rstest::rstest]
    #[case(0.0002, 1)]
    #[case(0.0004, 0)]
    fn test_apex_width_requirement(#[case] fwhm: f64, #[case] expected: usize) {
        let mut matrix = gaussian_scans(
            &[(99.9999, 50.0, 600.0), (100.0, 50.0, 1000.0), (100.0001, 50.0, 600.0)],
            100,
        );
        let detector = PeakDetector::new(parameters().fwhm(Some(fwhm))).unwrap();
        let run = detector.detect(&mut matrix).unwrap();
        assert_eq!(run.peaks.len(), expected);
        if let Some(peak) = run.peaks.first() {
            assert_eq!(peak.lower_mz_bound, 99.9999);
            assert_eq!(peak.upper_mz_bound, 100.0001);
        }
        assert_eq!(matrix.removed_count(), matrix.len());
    }

    #[test_log::test]
    #[test_log(default_log_filter = "trace")]
    fn test_neighboring_peaks_in_one_column() {
        let mut matrix = gaussian_scans(&[(100.0, 30.0, 1000.0), (100.0, 45.0, 900.0)], 100);
        let detector = PeakDetector::new(parameters()).unwrap();
        let run = detector.detect(&mut matrix).unwrap();
        let apexes: Vec<i32> = run
            .peaks
            .iter()
            .map(|p| p.max_height_scan_number)
            .collect();
        assert_eq!(apexes, vec![30, 45]);
        assert_eq!(run.peaks[1].lower_scan_bound, 37);
        assert_eq!(run.peaks[1].upper_scan_bound, 53);
    }

    #[test]
    fn test_fwhm_unavailable() {
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0)], 100);
        let detector = PeakDetector::new(parameters().fwhm(None)).unwrap();
        assert_eq!(
            detector.detect(&mut matrix).unwrap_err(),
            DetectionError::FwhmUnavailable
        );
    }

    #[test]
    fn test_estimate_fwhm() {
        let scans: Vec<RawScan> = (0..20)
            .map(|scan| {
                let elution = (-0.5 * (scan as f64 - 10.0).powi(2) / 9.0).exp();
                let mzs: Vec<f64> = (-10..=10).map(|k| 100.0 + k as f64 * 0.001).collect();
                let intensities: Vec<f32> = (-10..=10)
                    .map(|k| (1000.0 * elution * (-0.5 * (k * k) as f64 / 9.0).exp()) as f32)
                    .collect();
                RawScan::new(mzs, intensities, Some(scan as f64))
            })
            .collect();
        let matrix = SparseMatrix::with_min_intensity(scans, 1.0).unwrap();
        let fwhm = estimate_fwhm(&matrix, 10).unwrap();
        let expected = 2.0 * (2.0 * 2f64.ln()).sqrt() * 0.003;
        assert!((fwhm - expected).abs() < 2e-4, "{fwhm} vs {expected}");
    }

    #[rstest::rstest]
    #[case(parameters().large_scale_half_window(0), "large_scale_half_window")]
    #[case(parameters().scales(0.0, 10.0, 1.0), "small_scale")]
    #[case(parameters().scales(1.0, 10.0, 0.0), "scale_increment")]
    #[case(parameters().scales(5.0, 2.0, 1.0), "small_scale")]
    #[case(parameters().peak_width(-1.0, 10.0), "min_peak_width")]
    #[case(parameters().peak_width(10.0, 5.0), "max_peak_width")]
    #[case(parameters().fwhm(Some(-0.01)), "fwhm")]
    fn test_invalid_parameters(#[case] params: DetectionParameters, #[case] field: &str) {
        match PeakDetector::new(params) {
            Err(DetectionError::InvalidParameter { name, .. }) => assert_eq!(name, field),
            other => panic!("Expected an invalid parameter error, got {other:?}"),
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_run() {
        let mut matrix = gaussian_scans(&[(100.0, 50.0, 1000.0)], 100);
        let params = parameters();
        let text = serde_json::to_string(&params).unwrap();
        let restored: DetectionParameters = serde_json::from_str(&text).unwrap();
        assert_eq!(params, restored);

        let run = PeakDetector::new(restored)
            .unwrap()
            .detect(&mut matrix)
            .unwrap();
        let text = serde_json::to_string(&run).unwrap();
        let restored: DetectionRun = serde_json::from_str(&text).unwrap();
        assert_eq!(run, restored);
    }
}
