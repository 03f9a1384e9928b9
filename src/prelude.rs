pub use crate::cwt::{PeakCandidate, ScaleRange, WaveletRidgeDetector};
pub use crate::detection::{
    DetectionParameters, DetectionRun, PeakDetector, RetentionTimeUnit, StopReason,
};
pub use crate::peak::AcceptedPeak;
pub use crate::progress::{CancellationToken, Progress};
pub use crate::quality::SharedPeakCriteria;
pub use crate::sparse_matrix::{RawScan, SparseMatrix};
pub use crate::validation::{ApexValidator, ShapeValidator};
