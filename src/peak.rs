use std::cmp::Ordering;
use std::fmt;

use mzpeaks::feature::Feature;
use mzpeaks::{CoordinateLike, IntensityMeasurement, Time, MZ};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cwt::PeakCandidate;
use crate::sparse_matrix::{round_mz, SparseMatrix};

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A chromatographic peak that passed both validation tests.
///
/// An [`AcceptedPeak`] implements [`CoordinateLike<MZ>`](mzpeaks::CoordinateLike) with its
/// apex m/z and [`IntensityMeasurement`] with the apex height, so it can be collected into
/// `mzpeaks` containers.
pub struct AcceptedPeak {
    pub mz: f64,
    /// The first scan of the peak, inclusive
    pub lower_scan_bound: i32,
    /// The last scan of the peak, inclusive
    pub upper_scan_bound: i32,
    pub max_height_scan_number: i32,
    pub max_height: f32,
    /// The wavelet peak this was built from, with bounds in scan numbers
    pub candidate: PeakCandidate,
    /// The smallest m/z whose chromatogram matched the apex chromatogram
    pub lower_mz_bound: f64,
    /// The largest m/z whose chromatogram matched the apex chromatogram
    pub upper_mz_bound: f64,
    /// The retention time of [`AcceptedPeak::max_height_scan_number`]
    pub retention_time: f64,
    pub shape_similarity: f64,
    /// The median slope sharpness of the apex chromatogram, see
    /// [`sharpness_yang`](crate::quality::sharpness_yang)
    pub sharpness: Option<f64>,
    /// Whether the apex chromatogram looks like part of a larger or merged peak, see
    /// [`SharedPeakCriteria::is_shared`](crate::quality::SharedPeakCriteria::is_shared)
    pub shared: bool,
}

impl AcceptedPeak {
    /// The number of scans spanned by the peak
    pub fn scan_count(&self) -> usize {
        (self.upper_scan_bound - self.lower_scan_bound + 1).max(0) as usize
    }

    /// Export the chromatogram at the apex m/z across the peak's scan bounds.
    ///
    /// Scans without signal at the apex m/z are left out.
    pub fn to_feature(&self, matrix: &SparseMatrix) -> Feature<MZ, Time> {
        let apex_mz = round_mz(self.mz);
        let mut feature = Feature::default();
        for cell in matrix.horizontal_slice(apex_mz, self.lower_scan_bound, self.upper_scan_bound)
        {
            if cell.intensity <= 0.0 {
                continue;
            }
            if let Some(time) = matrix.retention_time(cell.scan) {
                feature.push_raw(cell.mz_value(), time, cell.intensity);
            }
        }
        feature
    }
}

impl PartialEq for AcceptedPeak {
    fn eq(&self, other: &Self) -> bool {
        self.mz == other.mz
            && self.max_height_scan_number == other.max_height_scan_number
            && self.lower_scan_bound == other.lower_scan_bound
            && self.upper_scan_bound == other.upper_scan_bound
            && self.max_height == other.max_height
    }
}

impl PartialOrd for AcceptedPeak {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.mz.partial_cmp(&other.mz) {
            Some(Ordering::Equal) => {}
            ord => return ord,
        }
        match self
            .max_height_scan_number
            .cmp(&other.max_height_scan_number)
        {
            Ordering::Equal => {}
            ord => return Some(ord),
        }
        self.retention_time.partial_cmp(&other.retention_time)
    }
}

impl CoordinateLike<MZ> for AcceptedPeak {
    fn coordinate(&self) -> f64 {
        self.mz
    }
}

impl IntensityMeasurement for AcceptedPeak {
    #[inline]
    fn intensity(&self) -> f32 {
        self.max_height
    }
}

impl fmt::Display for AcceptedPeak {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "AcceptedPeak({:.4}, {}, {}-{}, {:.3})",
            self.mz,
            self.max_height,
            self.lower_scan_bound,
            self.upper_scan_bound,
            self.retention_time
        )
    }
}
