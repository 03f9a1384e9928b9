//! Chromatographic peak quality scores.
//!
//! These operate on a chromatogram given as parallel slices and an inclusive index range
//! `[left, right]` holding the peak. The apex is the first most intense point in that
//! range. Sharpness scores are measured per sample, so they do not depend on the
//! retention time spacing.
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::{argmax, median};

/// The apex index and height of `intensity[left..=right]`, if it holds any signal
fn apex_between(intensity: &[f64], left: usize, right: usize) -> Option<(usize, f64)> {
    if left > right || right >= intensity.len() {
        return None;
    }
    let offset = argmax(&intensity[left..=right])?;
    let apex = left + offset;
    let height = intensity[apex];
    if height > 0.0 {
        Some((apex, height))
    } else {
        None
    }
}

/// The median slope sharpness of a peak.
///
/// A line is drawn between the two boundary points, and only points at least a quarter of
/// the way from that line to the apex contribute. The left side's slopes to the apex and
/// the right side's slopes from the apex are each reduced to their median, and the result
/// is half their difference. If only one side has qualifying points its median is returned
/// as is.
///
/// Returns [`None`] when the range holds no signal, spans a single point or no point
/// qualifies on either side.
pub fn sharpness_yang(time: &[f64], intensity: &[f64], left: usize, right: usize) -> Option<f64> {
    if right >= time.len() || left == right {
        return None;
    }
    let (apex, height) = apex_between(intensity, left, right)?;

    let baseline_slope = (intensity[right] - intensity[left]) / (time[right] - time[left]);
    let baseline_at_apex = intensity[left] + baseline_slope * (time[apex] - time[left]);
    let quarter = 0.25 * (height - baseline_at_apex);
    if quarter.is_nan() || quarter < 0.0 {
        return None;
    }
    let threshold = quarter + baseline_at_apex;

    let mut left_slopes: Vec<f64> = (left..apex)
        .filter(|i| intensity[*i] >= threshold)
        .map(|i| (height - intensity[i]) / (apex - i) as f64)
        .collect();
    let mut right_slopes: Vec<f64> = (apex + 1..=right)
        .filter(|i| intensity[*i] >= threshold)
        .map(|i| (intensity[i] - height) / (i - apex) as f64)
        .collect();

    match (median(&mut left_slopes), median(&mut right_slopes)) {
        (Some(l), Some(r)) => Some((l - r) / 2.0),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

/// Half of the peak's width, rounded, used to look past the boundaries
#[inline]
fn half_width(left: usize, right: usize) -> usize {
    ((right - left) as f64 / 2.0).round() as usize
}

#[inline]
fn slope_angle(slope: f64) -> f64 {
    (1.0 / slope.abs()).atan()
}

/// The angle at the apex between the mean slopes of either side, in radians.
///
/// Each side is followed from the apex to half a peak width beyond its boundary. Sharper
/// peaks have smaller angles.
///
/// Returns [`None`] when the range holds no signal or the apex has no neighbor on one side.
pub fn sharpness_angle_avg_slopes(intensity: &[f64], left: usize, right: usize) -> Option<f64> {
    let (apex, height) = apex_between(intensity, left, right)?;
    let half = half_width(left, right);

    let final_left = left.saturating_sub(half);
    let left_slopes: Vec<f64> = (final_left..apex)
        .rev()
        .map(|i| (height - intensity[i]) / (apex - i) as f64)
        .collect();
    let final_right = (right + half).min(intensity.len() - 1);
    let right_slopes: Vec<f64> = (apex + 1..=final_right)
        .map(|i| (intensity[i] - height) / (i - apex) as f64)
        .collect();
    if left_slopes.is_empty() || right_slopes.is_empty() {
        return None;
    }

    let mean_left = left_slopes.iter().sum::<f64>() / left_slopes.len() as f64;
    let mean_right = right_slopes.iter().sum::<f64>() / right_slopes.len() as f64;
    let mut left_angle = slope_angle(mean_left);
    let mut right_angle = slope_angle(mean_right);
    if mean_right > 0.0 {
        right_angle = PI - right_angle;
    }
    if mean_left < 0.0 {
        left_angle = PI - left_angle;
    }
    Some(left_angle + right_angle)
}

/// The angle at the apex between the weighted mean angles of either side, in radians.
///
/// Each side is followed for half a peak width from the apex. Points further from the apex
/// weigh more.
///
/// Returns [`None`] when the range holds no signal or the apex has no neighbor on one side.
pub fn sharpness_angle_avg_angles(intensity: &[f64], left: usize, right: usize) -> Option<f64> {
    let (apex, height) = apex_between(intensity, left, right)?;
    let half = half_width(left, right);

    let weighted_mean = |angles: Vec<f64>| -> Option<f64> {
        if angles.is_empty() {
            return None;
        }
        let (total, weights) = angles
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(total, weights), (k, angle)| {
                let weight = (k + 1) as f64;
                (total + weight * angle, weights + weight)
            });
        Some(total / weights)
    };

    let final_left = apex.saturating_sub(half);
    let left_angles = (final_left..apex)
        .rev()
        .map(|i| {
            let slope = (height - intensity[i]) / (apex - i) as f64;
            if slope < 0.0 {
                PI - slope_angle(slope)
            } else {
                slope_angle(slope)
            }
        })
        .collect();
    let final_right = (apex + half).min(intensity.len() - 1);
    let right_angles = (apex + 1..=final_right)
        .map(|i| {
            let slope = (intensity[i] - height) / (i - apex) as f64;
            if slope > 0.0 {
                PI - slope_angle(slope)
            } else {
                slope_angle(slope)
            }
        })
        .collect();

    Some(weighted_mean(left_angles)? + weighted_mean(right_angles)?)
}

/// Thresholds for deciding whether a chromatographic peak is shared with a neighbor,
/// i.e. it is a shoulder of, or merged with, another peak.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SharedPeakCriteria {
    /// The largest boundary intensity, relative to the apex, of an isolated peak
    pub edge_to_height: f64,
    /// The largest difference between the boundary intensities, relative to the apex, of
    /// an isolated peak
    pub delta_to_height: f64,
}

impl Default for SharedPeakCriteria {
    fn default() -> Self {
        Self::new(0.3, 0.2)
    }
}

impl SharedPeakCriteria {
    pub fn new(edge_to_height: f64, delta_to_height: f64) -> Self {
        Self {
            edge_to_height,
            delta_to_height,
        }
    }

    fn edges_exceed(&self, left_intensity: f64, right_intensity: f64, height: f64) -> bool {
        left_intensity / height >= self.edge_to_height
            || right_intensity / height >= self.edge_to_height
            || (left_intensity - right_intensity).abs() / height >= self.delta_to_height
    }

    /// Whether the chromatogram `intensities`, bounded by its first and last points, is
    /// shared.
    ///
    /// It is shared when it has more than one local maximum, counting a plateau once, or
    /// when either boundary or their difference is too large relative to the apex. A
    /// chromatogram without signal is not shared.
    pub fn is_shared(&self, intensities: &[f64]) -> bool {
        let size = intensities.len();
        if size == 0 {
            return false;
        }
        let left_intensity = intensities[0];
        let right_intensity = intensities[size - 1];

        let mut height = left_intensity.max(right_intensity);
        let mut local_maxima = 0;
        let mut index = 1;
        while index + 1 < size {
            let current = intensities[index];
            if current > height {
                height = current;
            }
            let mut next = index + 1;
            while next + 1 < size && intensities[next] == current {
                next += 1;
            }
            if intensities[index - 1] < current && current > intensities[next] {
                local_maxima += 1;
            }
            index = next;
        }

        if local_maxima > 1 {
            return true;
        }
        if height <= 0.0 {
            return false;
        }
        self.edges_exceed(left_intensity, right_intensity, height)
    }

    /// Whether the peak in `intensity[left..=right]` is shared, judged only by its
    /// boundary intensities relative to its apex.
    pub fn is_shared_between(&self, intensity: &[f64], left: usize, right: usize) -> bool {
        match apex_between(intensity, left, right) {
            Some((_, height)) => self.edges_exceed(intensity[left], intensity[right], height),
            None => false,
        }
    }
}
