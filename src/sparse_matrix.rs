//! A sparse (m/z × scan) intensity matrix built from a sequence of raw spectra.
//!
//! The cells are stored once in a backing vector ordered by scan and then m/z. Three
//! permutations over that vector give the m/z-major, scan-major and intensity-descending
//! views used by the detection loop. Every view refers to the same cells through a
//! [`CellHandle`], so toggling [`Cell::removed`] is visible through all of them.
//!
//! m/z values are rounded to an integer grid ([`MZ_ROUNDING_FACTOR`] units per m/z) so that
//! equality and ordering between cells are exact.
use std::borrow::Cow;

use log::{debug, trace};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The number of rounded units per m/z
pub const MZ_ROUNDING_FACTOR: f64 = 10_000.0;

/// The half-width of a vertical slice window, in rounded m/z units
pub const VERTICAL_SLICE_HALF_WIDTH: i32 = 10_000;

/// Cells below this intensity are discarded while building the matrix
pub const DEFAULT_MIN_INTENSITY: f32 = 1000.0;

/// Convert an m/z value to the integer grid used by [`SparseMatrix`]
#[inline]
pub fn round_mz(mz: f64) -> i32 {
    (mz * MZ_ROUNDING_FACTOR).round() as i32
}

/// Convert a rounded m/z value back to m/z
#[inline]
pub fn unround_mz(mz: i32) -> f64 {
    mz as f64 / MZ_ROUNDING_FACTOR
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SparseMatrixError {
    #[error("The m/z array and intensity array of scan {0} are not the same length")]
    MZIntensityMismatch(usize),
    #[error("The retention time {time} of scan {index} precedes the retention time of the previous scan")]
    RetentionTimeNotSorted { index: usize, time: f64 },
}

/// One deduplicated, non-zero (m/z, scan) entry
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// The rounded m/z, see [`round_mz`]
    pub mz: i32,
    /// The index of the scan among the scans kept by the matrix
    pub scan: i32,
    pub intensity: f32,
    /// Whether the cell has been consumed by the detection loop
    pub removed: bool,
}

impl Cell {
    pub fn new(mz: i32, scan: i32, intensity: f32) -> Self {
        Self {
            mz,
            scan,
            intensity,
            removed: false,
        }
    }

    /// A zero-intensity stand-in for an absent cell
    pub fn placeholder(mz: i32, scan: i32) -> Self {
        Self::new(mz, scan, 0.0)
    }

    pub fn mz_value(&self) -> f64 {
        unround_mz(self.mz)
    }

    /// The intensity seen by the detector, zero when consumed
    pub fn visible_intensity(&self) -> f32 {
        if self.removed {
            0.0
        } else {
            self.intensity
        }
    }

    #[inline]
    fn key(&self) -> (i32, i32) {
        (self.mz, self.scan)
    }
}

/// A stable reference to a cell in a [`SparseMatrix`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellHandle(usize);

impl CellHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One point of a [`SparseMatrix::vertical_slice`] profile
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VerticalSlicePoint {
    pub mz: f64,
    pub intensity: f32,
}

/// A single spectrum handed to [`SparseMatrix`] construction.
#[derive(Debug, Clone)]
pub struct RawScan<'a> {
    pub mz_array: Cow<'a, [f64]>,
    pub intensity_array: Cow<'a, [f32]>,
    pub retention_time: Option<f64>,
}

impl<'a> RawScan<'a> {
    pub fn new(
        mz_array: impl Into<Cow<'a, [f64]>>,
        intensity_array: impl Into<Cow<'a, [f32]>>,
        retention_time: Option<f64>,
    ) -> Self {
        Self {
            mz_array: mz_array.into(),
            intensity_array: intensity_array.into(),
            retention_time,
        }
    }

    pub fn len(&self) -> usize {
        self.mz_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz_array.is_empty()
    }
}

impl From<(Vec<f64>, Vec<f32>, Option<f64>)> for RawScan<'static> {
    fn from(value: (Vec<f64>, Vec<f32>, Option<f64>)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl<'a> From<(&'a [f64], &'a [f32], Option<f64>)> for RawScan<'a> {
    fn from(value: (&'a [f64], &'a [f32], Option<f64>)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    /// The backing cells, in (scan, m/z) order
    cells: Vec<Cell>,
    by_mz_scan: Vec<usize>,
    by_scan: Vec<usize>,
    by_intensity: Vec<usize>,
    /// The position of each cell in `by_intensity`
    intensity_rank: Vec<usize>,
    mz_values: Vec<i32>,
    retention_times: Vec<f64>,
    source_indices: Vec<usize>,
    cursor: usize,
}

impl SparseMatrix {
    /// Build a matrix from `scans`, dropping cells below [`DEFAULT_MIN_INTENSITY`]
    pub fn new<'a, I: IntoIterator<Item = RawScan<'a>>>(
        scans: I,
    ) -> Result<Self, SparseMatrixError> {
        Self::with_min_intensity(scans, DEFAULT_MIN_INTENSITY)
    }

    pub fn with_min_intensity<'a, I: IntoIterator<Item = RawScan<'a>>>(
        scans: I,
        min_intensity: f32,
    ) -> Result<Self, SparseMatrixError> {
        Self::from_scans_filtered(scans, min_intensity, |_, _| true)
    }

    /// Build a matrix from the scans accepted by `predicate`, which receives each scan's
    /// position in `scans` along with the scan itself.
    ///
    /// Scans without a retention time are skipped. The remaining scans are numbered
    /// contiguously from zero and must be in non-decreasing retention time order. Cells with
    /// an intensity below `min_intensity` are dropped, then cells sharing a rounded m/z
    /// within the same scan are merged by summing their intensities.
    pub fn from_scans_filtered<'a, I, F>(
        scans: I,
        min_intensity: f32,
        mut predicate: F,
    ) -> Result<Self, SparseMatrixError>
    where
        I: IntoIterator<Item = RawScan<'a>>,
        F: FnMut(usize, &RawScan<'a>) -> bool,
    {
        let mut retention_times = Vec::new();
        let mut source_indices = Vec::new();
        let mut raw_cells = Vec::new();

        for (source_index, scan) in scans.into_iter().enumerate() {
            if !predicate(source_index, &scan) {
                continue;
            }
            let Some(time) = scan.retention_time else {
                trace!("Skipping scan {source_index} without a retention time");
                continue;
            };
            if scan.mz_array.len() != scan.intensity_array.len() {
                return Err(SparseMatrixError::MZIntensityMismatch(source_index));
            }
            if let Some(last) = retention_times.last().copied() {
                if time < last {
                    return Err(SparseMatrixError::RetentionTimeNotSorted {
                        index: source_index,
                        time,
                    });
                }
            }
            let scan_index = retention_times.len() as i32;
            retention_times.push(time);
            source_indices.push(source_index);

            raw_cells.extend(
                scan.mz_array
                    .iter()
                    .zip(scan.intensity_array.iter())
                    .filter(|(_, inten)| **inten > 0.0 && **inten >= min_intensity)
                    .map(|(mz, inten)| Cell::new(round_mz(*mz), scan_index, *inten)),
            );
        }

        raw_cells.sort_by(|a, b| a.scan.cmp(&b.scan).then(a.mz.cmp(&b.mz)));

        let mut cells: Vec<Cell> = Vec::with_capacity(raw_cells.len());
        for cell in raw_cells {
            match cells.last_mut() {
                Some(last) if last.scan == cell.scan && last.mz == cell.mz => {
                    last.intensity += cell.intensity;
                }
                _ => cells.push(cell),
            }
        }

        let mut by_mz_scan: Vec<usize> = (0..cells.len()).collect();
        by_mz_scan.sort_by_key(|i| cells[*i].key());

        let mut by_scan: Vec<usize> = (0..cells.len()).collect();
        by_scan.sort_by_key(|i| cells[*i].scan);

        let mut by_intensity: Vec<usize> = (0..cells.len()).collect();
        by_intensity.sort_by(|a, b| cells[*b].intensity.total_cmp(&cells[*a].intensity));

        let mut intensity_rank = vec![0; cells.len()];
        for (rank, i) in by_intensity.iter().enumerate() {
            intensity_rank[*i] = rank;
        }

        let mut mz_values: Vec<i32> = cells.iter().map(|c| c.mz).collect();
        mz_values.sort_unstable();
        mz_values.dedup();

        debug!(
            "Built a sparse matrix with {} cells over {} scans and {} m/z values",
            cells.len(),
            retention_times.len(),
            mz_values.len()
        );

        Ok(Self {
            cells,
            by_mz_scan,
            by_scan,
            by_intensity,
            intensity_rank,
            mz_values,
            retention_times,
            source_indices,
            cursor: 0,
        })
    }

    /// The number of stored cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The number of scans kept, including scans that contributed no cells
    pub fn num_scans(&self) -> usize {
        self.retention_times.len()
    }

    /// The sorted, unique rounded m/z values of all stored cells
    pub fn mz_values(&self) -> &[i32] {
        &self.mz_values
    }

    pub fn retention_time(&self, scan: i32) -> Option<f64> {
        usize::try_from(scan)
            .ok()
            .and_then(|i| self.retention_times.get(i).copied())
    }

    /// The retention times of the scans in `[scan_lo, scan_hi]` that exist
    pub fn retention_times(&self, scan_lo: i32, scan_hi: i32) -> Vec<f64> {
        (scan_lo..=scan_hi)
            .filter_map(|scan| self.retention_time(scan))
            .collect()
    }

    /// The position of `scan` in the sequence the matrix was built from
    pub fn source_index(&self, scan: i32) -> Option<usize> {
        usize::try_from(scan)
            .ok()
            .and_then(|i| self.source_indices.get(i).copied())
    }

    pub fn get(&self, handle: CellHandle) -> Option<&Cell> {
        self.cells.get(handle.0)
    }

    /// Locate the cell at exactly (`mz`, `scan`)
    pub fn find(&self, mz: i32, scan: i32) -> Option<CellHandle> {
        self.by_mz_scan
            .binary_search_by(|i| self.cells[*i].key().cmp(&(mz, scan)))
            .ok()
            .map(|pos| CellHandle(self.by_mz_scan[pos]))
    }

    /// Iterate over the cells from most to least intense
    pub fn iter_by_intensity(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.by_intensity.iter().map(|i| &self.cells[*i])
    }

    /// Iterate over the cells in (m/z, scan) order
    pub fn iter_by_mz(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.by_mz_scan.iter().map(|i| &self.cells[*i])
    }

    /// The cells of a single scan, in m/z order
    fn scan_members(&self, scan: i32) -> &[usize] {
        let start = self
            .by_scan
            .partition_point(|i| self.cells[*i].scan < scan);
        let end = self
            .by_scan
            .partition_point(|i| self.cells[*i].scan <= scan);
        &self.by_scan[start..end]
    }

    /// Read the row at `mz` across `[scan_lo, scan_hi]`.
    ///
    /// The result always has `scan_hi - scan_lo + 1` entries; scans without a stored cell
    /// are filled with a zero-intensity [`Cell::placeholder`].
    pub fn horizontal_slice(&self, mz: i32, scan_lo: i32, scan_hi: i32) -> Vec<Cell> {
        (scan_lo..=scan_hi)
            .map(|scan| match self.find(mz, scan) {
                Some(handle) => self.cells[handle.0],
                None => Cell::placeholder(mz, scan),
            })
            .collect()
    }

    /// The stored intensities at `mz` across `[scan_lo, scan_hi]`, ignoring [`Cell::removed`]
    pub fn eic(&self, mz: i32, scan_lo: i32, scan_hi: i32) -> Vec<f64> {
        (scan_lo..=scan_hi)
            .map(|scan| {
                self.find(mz, scan)
                    .map(|h| self.cells[h.0].intensity as f64)
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Convert a horizontal slice into a retention time-ordered signal for peak finding.
    ///
    /// Removed cells and placeholders contribute zero intensity. Entries whose scan is not
    /// part of the matrix are skipped.
    pub fn signal(&self, slice: &[Cell]) -> (Vec<f64>, Vec<f64>) {
        let mut points: Vec<(f64, f64)> = slice
            .iter()
            .filter_map(|cell| {
                self.retention_time(cell.scan)
                    .map(|rt| (rt, cell.visible_intensity() as f64))
            })
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.into_iter().unzip()
    }

    /// Build the m/z profile of `scan` around its most intense cell.
    ///
    /// Every m/z value known to the matrix within [`VERTICAL_SLICE_HALF_WIDTH`] of the most
    /// intense cell produces a point, with zero intensity when the scan has no cell there.
    /// Removed flags are ignored.
    pub fn vertical_slice(&self, scan: i32) -> Vec<VerticalSlicePoint> {
        let members = self.scan_members(scan);
        let mut apex: Option<&Cell> = None;
        for i in members {
            let cell = &self.cells[*i];
            match apex {
                Some(best) if best.intensity >= cell.intensity => {}
                _ => apex = Some(cell),
            }
        }
        let Some(apex) = apex else {
            return Vec::new();
        };

        let lo = apex.mz - VERTICAL_SLICE_HALF_WIDTH;
        let hi = apex.mz + VERTICAL_SLICE_HALF_WIDTH;
        let start = self.mz_values.partition_point(|mz| *mz < lo);
        let end = self.mz_values.partition_point(|mz| *mz <= hi);
        self.mz_values[start..end]
            .iter()
            .map(|mz| {
                let intensity = members
                    .binary_search_by(|i| self.cells[*i].mz.cmp(mz))
                    .map(|pos| self.cells[members[pos]].intensity)
                    .unwrap_or_default();
                VerticalSlicePoint {
                    mz: unround_mz(*mz),
                    intensity,
                }
            })
            .collect()
    }

    /// Return the most intense cell not yet visited by the cursor and not removed,
    /// advancing the cursor past it.
    pub fn next_max_intensity(&mut self) -> Option<Cell> {
        while self.cursor < self.by_intensity.len() {
            let cell = self.cells[self.by_intensity[self.cursor]];
            self.cursor += 1;
            if !cell.removed {
                return Some(cell);
            }
        }
        None
    }

    /// Rewind the [`SparseMatrix::next_max_intensity`] cursor to the most intense cell
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// The fraction of the intensity ordering at or before `cell`, in `[0, 1]`
    pub fn finished_fraction(&self, cell: &Cell) -> f32 {
        if self.by_intensity.is_empty() {
            return 1.0;
        }
        match self.find(cell.mz, cell.scan) {
            Some(handle) => {
                self.intensity_rank[handle.0] as f32 / self.by_intensity.len() as f32
            }
            None => self.cursor as f32 / self.by_intensity.len() as f32,
        }
    }

    fn region(&self, mz_lo: i32, mz_hi: i32, scan_lo: i32, scan_hi: i32) -> Vec<usize> {
        if mz_lo > mz_hi || scan_lo > scan_hi {
            return Vec::new();
        }
        let start = self
            .by_mz_scan
            .partition_point(|i| self.cells[*i].key() < (mz_lo, scan_lo));
        let end = self
            .by_mz_scan
            .partition_point(|i| self.cells[*i].key() <= (mz_hi, scan_hi));
        if start >= end {
            return Vec::new();
        }
        self.by_mz_scan[start..end]
            .iter()
            .copied()
            .filter(|i| {
                let scan = self.cells[*i].scan;
                scan >= scan_lo && scan <= scan_hi
            })
            .collect()
    }

    fn set_removed(
        &mut self,
        mz_lo: i32,
        mz_hi: i32,
        scan_lo: i32,
        scan_hi: i32,
        removed: bool,
    ) -> usize {
        let region = self.region(mz_lo, mz_hi, scan_lo, scan_hi);
        let mut changed = 0;
        for i in region {
            let cell = &mut self.cells[i];
            if cell.removed != removed {
                cell.removed = removed;
                changed += 1;
            }
        }
        changed
    }

    /// Mark every stored cell with m/z in `[mz_lo, mz_hi]` and scan in `[scan_lo, scan_hi]`
    /// as removed, returning the number of cells that changed state.
    pub fn remove(&mut self, mz_lo: i32, mz_hi: i32, scan_lo: i32, scan_hi: i32) -> usize {
        self.set_removed(mz_lo, mz_hi, scan_lo, scan_hi, true)
    }

    /// Clear the removed flag of every stored cell in the region, returning the number of
    /// cells that changed state.
    pub fn restore(&mut self, mz_lo: i32, mz_hi: i32, scan_lo: i32, scan_hi: i32) -> usize {
        self.set_removed(mz_lo, mz_hi, scan_lo, scan_hi, false)
    }

    /// Clear the removed flag of every cell
    pub fn restore_all(&mut self) {
        self.cells.iter_mut().for_each(|c| c.removed = false);
    }

    pub fn removed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.removed).count()
    }
}

impl PartialEq for SparseMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells && self.retention_times == other.retention_times
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn make_scans() -> Vec<RawScan<'static>> {
        vec![
            (vec![100.0, 100.00001, 200.0], vec![1500.0, 600.0, 3000.0], Some(1.0)).into(),
            (vec![100.0, 150.0], vec![5000.0, 200.0], None).into(),
            (vec![100.0, 200.0, 200.5], vec![4000.0, 2000.0, 2500.0], Some(2.0)).into(),
            (vec![], vec![], Some(3.0)).into(),
            (vec![100.0, 200.0], vec![1200.0, 9000.0], Some(4.0)).into(),
        ]
    }

    fn make_matrix() -> SparseMatrix {
        SparseMatrix::new(make_scans()).unwrap()
    }

    #[test]
    fn test_construction() {
        let matrix = make_matrix();
        assert_eq!(matrix.num_scans(), 4);
        assert_eq!(matrix.len(), 7);
        assert_eq!(matrix.mz_values(), &[1_000_000, 2_000_000, 2_005_000]);
        assert_eq!(matrix.source_index(1), Some(2));
        assert_eq!(matrix.source_index(3), Some(4));
        assert_eq!(matrix.retention_time(2), Some(3.0));
        assert_eq!(matrix.retention_time(4), None);
    }

    #[test]
    fn test_merge_duplicates() {
        let scans: Vec<RawScan> = vec![(
            vec![100.0, 100.00001, 100.00004],
            vec![1500.0, 1200.0, 1100.0],
            Some(1.0),
        )
            .into()];
        let matrix = SparseMatrix::new(scans).unwrap();
        assert_eq!(matrix.len(), 1);
        let cell = matrix.get(matrix.find(1_000_000, 0).unwrap()).unwrap();
        assert_eq!(cell.intensity, 3800.0);
    }

    #[test]
    fn test_construction_errors() {
        let scans: Vec<RawScan> = vec![(vec![100.0], vec![], Some(1.0)).into()];
        assert_eq!(
            SparseMatrix::new(scans).unwrap_err(),
            SparseMatrixError::MZIntensityMismatch(0)
        );
        let scans: Vec<RawScan> = vec![
            (vec![100.0], vec![2000.0], Some(2.0)).into(),
            (vec![100.0], vec![2000.0], Some(1.0)).into(),
        ];
        assert!(matches!(
            SparseMatrix::new(scans),
            Err(SparseMatrixError::RetentionTimeNotSorted { index: 1, .. })
        ));
    }

    #[test]
    fn test_scan_filter() {
        let matrix =
            SparseMatrix::from_scans_filtered(make_scans(), 0.0, |i, _| i % 2 == 0).unwrap();
        assert_eq!(matrix.num_scans(), 3);
        assert_eq!(matrix.source_index(1), Some(2));
        assert!(matrix.find(1_500_000, 0).is_none());
    }

    #[rstest::rstest]
    #[case(1_000_000, 0, 3)]
    #[case(2_000_000, 1, 3)]
    #[case(1_234_567, 0, 3)]
    #[case(1_000_000, -2, 5)]
    fn test_horizontal_slice_completeness(#[case] mz: i32, #[case] lo: i32, #[case] hi: i32) {
        let matrix = make_matrix();
        let slice = matrix.horizontal_slice(mz, lo, hi);
        assert_eq!(slice.len() as i32, hi - lo + 1);
        for (cell, scan) in slice.iter().zip(lo..=hi) {
            assert_eq!(cell.scan, scan);
            assert_eq!(cell.mz, mz);
            if matrix.find(mz, scan).is_none() {
                assert_eq!(cell.intensity, 0.0);
                assert!(!cell.removed);
            }
        }
    }

    #[test]
    fn test_intensity_ordering() {
        let mut matrix = make_matrix();
        matrix.remove(2_005_000, 2_005_000, 0, 3);
        let mut last = f32::INFINITY;
        let mut seen = Vec::new();
        while let Some(cell) = matrix.next_max_intensity() {
            assert!(cell.intensity <= last);
            assert!(!cell.removed);
            assert!(!seen.contains(&(cell.mz, cell.scan)));
            seen.push((cell.mz, cell.scan));
            last = cell.intensity;
        }
        assert_eq!(seen.len(), matrix.len() - 1);
        assert!(matrix.next_max_intensity().is_none());
        matrix.reset_cursor();
        assert_eq!(matrix.next_max_intensity().unwrap().intensity, 9000.0);
    }

    #[test]
    fn test_idempotent_masking() {
        let mut matrix = make_matrix();
        matrix.remove(1_000_000, 1_000_000, 1, 1);
        let before: Vec<bool> = matrix.iter_by_mz().map(|c| c.removed).collect();
        let changed = matrix.remove(1_000_000, 2_000_000, 0, 2);
        assert_eq!(changed, 3);
        assert_eq!(matrix.remove(1_000_000, 2_000_000, 0, 2), 0);
        matrix.restore(1_000_000, 2_000_000, 0, 2);
        matrix.remove(1_000_000, 1_000_000, 1, 1);
        let after: Vec<bool> = matrix.iter_by_mz().map(|c| c.removed).collect();
        assert_eq!(before, after);

        matrix.restore_all();
        assert_eq!(matrix.removed_count(), 0);
    }

    #[test]
    fn test_removed_visible_in_all_views() {
        let mut matrix = make_matrix();
        matrix.remove(2_000_000, 2_000_000, 3, 3);
        let top = matrix.iter_by_intensity().next().unwrap();
        assert!(top.removed);
        let slice = matrix.horizontal_slice(2_000_000, 3, 3);
        assert!(slice[0].removed);
        let (_, signal) = matrix.signal(&slice);
        assert_eq!(signal, vec![0.0]);
        assert_eq!(matrix.eic(2_000_000, 3, 3), vec![9000.0]);
        assert_eq!(matrix.next_max_intensity().unwrap().intensity, 4000.0);
    }

    #[test]
    fn test_vertical_slice() {
        let matrix = make_matrix();
        let profile = matrix.vertical_slice(0);
        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0].mz, 200.0);
        assert_eq!(profile[0].intensity, 3000.0);
        assert_eq!(profile[1].mz, 200.5);
        assert_eq!(profile[1].intensity, 0.0);

        let profile = matrix.vertical_slice(1);
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[0].mz, 100.0);
        assert_eq!(profile[0].intensity, 4000.0);

        assert!(matrix.vertical_slice(2).is_empty());
    }

    #[test]
    fn test_finished_fraction_monotonic() {
        let mut matrix = make_matrix();
        let mut last = 0.0f32;
        while let Some(cell) = matrix.next_max_intensity() {
            let fraction = matrix.finished_fraction(&cell);
            assert!(fraction >= last);
            assert!((0.0..1.0).contains(&fraction));
            last = fraction;
        }
        assert!(last > 0.5);
    }

    #[test]
    fn test_empty() {
        let mut matrix = SparseMatrix::new(Vec::<RawScan>::new()).unwrap();
        assert!(matrix.is_empty());
        assert!(matrix.next_max_intensity().is_none());
        assert!(matrix.vertical_slice(0).is_empty());
        assert_eq!(matrix.horizontal_slice(10, 0, 4).len(), 5);
    }
}
