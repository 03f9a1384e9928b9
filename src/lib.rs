//! `mzridge` is a library for detecting chromatographic peaks in LC-MS data by
//! following continuous wavelet transform ridge lines through extracted ion
//! chromatograms.
//!
//! Raw scans are loaded into a [`SparseMatrix`] of rounded m/z by scan number. A
//! [`PeakDetector`] then visits the matrix's cells from most to least intense, looks
//! for a wavelet peak around each one with [`WaveletRidgeDetector`], and keeps peaks
//! whose chromatogram is echoed by the neighboring m/z values and looks like a
//! bi-Gaussian. Each region examined is consumed so that the same signal is not
//! reported twice.
//!
//! # Usage
//! ```
//! use mzridge::prelude::*;
//!
//! let scans: Vec<RawScan> = (0..100)
//!     .map(|scan| {
//!         let elution = (-0.5 * (scan as f64 - 40.0).powi(2) / 4.0).exp();
//!         RawScan::new(
//!             vec![301.1402, 301.1403, 301.1404],
//!             vec![
//!                 (3000.0 * elution) as f32,
//!                 (5000.0 * elution) as f32,
//!                 (3000.0 * elution) as f32,
//!             ],
//!             Some(scan as f64 * 0.1),
//!         )
//!     })
//!     .collect();
//! let mut matrix = SparseMatrix::with_min_intensity(scans, 1.0).unwrap();
//!
//! let parameters = DetectionParameters::default()
//!     .large_scale_half_window(20)
//!     .peak_width(0.0, 3.0)
//!     .fwhm(Some(0.0002));
//! let detector = PeakDetector::new(parameters).unwrap();
//! let run = detector.detect(&mut matrix).unwrap();
//! assert_eq!(run.peaks.len(), 1);
//! for peak in run.peaks.iter() {
//!     println!("{}", peak);
//! }
//! ```
//!
//! ## Building
//! The `parallelism` feature, enabled by default, computes the wavelet coefficients of
//! each scale in parallel with `rayon`. The `serde` feature makes the parameters and
//! results serializable.
pub mod arrayops;
pub mod cwt;
pub mod detection;
pub mod peak;
pub mod peak_shape;
pub mod peak_statistics;
pub mod progress;
pub mod quality;
pub mod sparse_matrix;
pub mod validation;

pub mod prelude;

pub use crate::cwt::{PeakCandidate, WaveletRidgeDetector};
pub use crate::detection::{
    DetectionError, DetectionParameters, DetectionRun, PeakDetector, RetentionTimeUnit,
    StopReason,
};
pub use crate::peak::AcceptedPeak;
pub use crate::progress::{CancellationToken, Progress};
pub use crate::quality::SharedPeakCriteria;
pub use crate::sparse_matrix::{RawScan, SparseMatrix, SparseMatrixError};
