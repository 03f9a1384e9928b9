//! Refinement of wavelet peak bounds against the raw signal.

/// Samples below this value count as zero when weighing a peak's support
pub const ZERO_EPSILON: f64 = 1e-4;

/// Signal below this value always terminates a boundary walk
const FLOOR: f64 = 1.0;

/// Walk the right bound of a peak to a local minimum of `signal`.
///
/// The walk moves outward while the next sample is no larger, and inward while the
/// previous sample is smaller. It stops at the array end, at a sample below 1.0, or when
/// both neighbors are at least as large as the current sample. A bound that reaches the
/// first two samples is left where it started. Returns [`None`] if no direction applies.
pub fn fix_right_boundary(signal: &[f64], peak_right: usize) -> Option<usize> {
    let mut current = peak_right;
    loop {
        if current <= 1 {
            return Some(peak_right);
        }
        let right = current + 1;
        let left = current - 1;
        if right >= signal.len() || signal[current] < FLOOR {
            return Some(current);
        }
        let value = signal[current];
        if signal[right] >= value && signal[left] >= value {
            return Some(current);
        } else if signal[right] <= value {
            current += 1;
        } else if signal[left] < value {
            current -= 1;
        } else {
            return None;
        }
    }
}

/// Walk the left bound of a peak to a local minimum of `signal`.
///
/// The mirror image of [`fix_right_boundary`]. A bound that reaches the last sample is left
/// where it started.
pub fn fix_left_boundary(signal: &[f64], peak_left: usize) -> Option<usize> {
    let mut current = peak_left;
    loop {
        let right = current + 1;
        if right >= signal.len() {
            return Some(peak_left);
        }
        if current == 0 || signal[current] < FLOOR {
            return Some(current);
        }
        let left = current - 1;
        let value = signal[current];
        if signal[right] >= value && signal[left] >= value {
            return Some(current);
        } else if signal[left] <= value {
            current -= 1;
        } else if signal[right] < value {
            current += 1;
        } else {
            return None;
        }
    }
}

/// Shrink `[left, right]` to the non-zero samples it contains, keeping one bounding zero
/// sample on each side that moved.
///
/// The leading edge is searched in `[left, right)` and the trailing edge in `(left, right]`.
/// Returns [`None`] when either search finds nothing.
pub fn crop_to_signal(signal: &[f64], left: usize, right: usize) -> Option<(usize, usize)> {
    if left >= right || right >= signal.len() {
        return None;
    }
    let cropped_left = (left..right).find(|i| signal[*i] != 0.0)?;
    let cropped_right = ((left + 1)..=right).rev().find(|i| signal[*i] != 0.0)?;

    let cropped_left = if cropped_left != left {
        cropped_left - 1
    } else {
        cropped_left
    };
    let cropped_right = if cropped_right != right {
        cropped_right + 1
    } else {
        cropped_right
    };
    Some((cropped_left, cropped_right))
}

/// Whether at least half of the samples in `[left, right]` are effectively zero
pub fn mostly_zero(signal: &[f64], left: usize, right: usize) -> bool {
    let (zeros, nonzeros) = signal[left..=right]
        .iter()
        .fold((0usize, 0usize), |(z, nz), v| {
            if *v < ZERO_EPSILON {
                (z + 1, nz)
            } else {
                (z, nz + 1)
            }
        });
    zeros >= nonzeros
}
