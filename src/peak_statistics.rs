use num_traits::{Float, FromPrimitive};

pub fn _isclose<T>(x: T, y: T, rtol: T, atol: T) -> bool
where
    T: Float,
{
    (x - y).abs() <= (atol + rtol * y.abs())
}

pub fn isclose<T>(x: T, y: T) -> bool
where
    T: Float + FromPrimitive,
{
    _isclose(x, y, T::from_f64(1e-5).unwrap(), T::from_f64(1e-8).unwrap())
}

pub fn aboutzero<T>(x: T) -> bool
where
    T: Float + FromPrimitive,
{
    isclose(x, T::zero())
}

#[inline]
fn interpolate_crossing(x1: f64, y1: f64, x2: f64, y2: f64, target: f64) -> f64 {
    x1 - (x1 - x2) * ((target - y1) / (y2 - y1))
}

/// Locate where the rising side of the peak at `data_index` crosses half of the apex height.
///
/// Walks left from the apex to the first sample below half height and interpolates between
/// it and its right-hand neighbor. Returns [`None`] if the signal never drops below half
/// height before the start of the array.
pub fn rising_half_height_crossing(
    x_array: &[f64],
    intensity_array: &[f64],
    data_index: usize,
) -> Option<f64> {
    let peak = *intensity_array.get(data_index)?;
    if peak <= 0.0 || aboutzero(peak) {
        return None;
    }
    let peak_half = peak / 2.0;
    for index in (0..data_index).rev() {
        let y1 = intensity_array[index];
        if y1 < peak_half {
            let y2 = intensity_array[index + 1];
            return Some(interpolate_crossing(
                x_array[index],
                y1,
                x_array[index + 1],
                y2,
                peak_half,
            ));
        }
    }
    None
}

/// Locate where the falling side of the peak at `data_index` crosses half of the apex height.
///
/// The mirror of [`rising_half_height_crossing`].
pub fn falling_half_height_crossing(
    x_array: &[f64],
    intensity_array: &[f64],
    data_index: usize,
) -> Option<f64> {
    let peak = *intensity_array.get(data_index)?;
    if peak <= 0.0 || aboutzero(peak) {
        return None;
    }
    let peak_half = peak / 2.0;
    for index in (data_index + 1)..intensity_array.len() {
        let y1 = intensity_array[index];
        if y1 < peak_half {
            let y2 = intensity_array[index - 1];
            return Some(interpolate_crossing(
                x_array[index],
                y1,
                x_array[index - 1],
                y2,
                peak_half,
            ));
        }
    }
    None
}

pub fn full_width_at_half_max(
    x_array: &[f64],
    intensity_array: &[f64],
    data_index: usize,
) -> Option<f64> {
    let rising = rising_half_height_crossing(x_array, intensity_array, data_index)?;
    let falling = falling_half_height_crossing(x_array, intensity_array, data_index)?;
    Some(falling - rising)
}
