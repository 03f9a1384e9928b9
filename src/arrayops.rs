use std::iter::Sum;

use num_traits::{AsPrimitive, Float};

/// Integrate `y` over `x` with the trapezoid rule. The shorter of the two arrays
/// determines the number of intervals.
pub fn trapz<
    A: Float + Clone + AsPrimitive<B> + 'static,
    B: Float + Clone + AsPrimitive<A> + 'static + Sum,
>(
    x: &[A],
    y: &[B],
) -> B {
    let n = x.len().min(y.len());
    if n < 2 {
        return B::zero();
    }
    (0..n - 1)
        .map(|i| {
            let delta = x[i + 1] - x[i];
            delta.as_() * B::from(0.5).unwrap() * (y[i + 1] + y[i])
        })
        .sum()
}

/// Divide `y` by its trapezoidal area over `x`.
///
/// Returns [`None`] when the area is not positive.
pub fn normalize_by_area(x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    let area = trapz(x, y);
    if !area.is_finite() || area <= 0.0 {
        return None;
    }
    Some(y.iter().map(|v| v / area).collect())
}

/// The trapezoidal area of `|a - b|` over `x`
pub fn absolute_difference_area(x: &[f64], a: &[f64], b: &[f64]) -> f64 {
    let diff: Vec<f64> = a.iter().zip(b.iter()).map(|(a, b)| (a - b).abs()).collect();
    trapz(x, &diff)
}

/// The index of the first maximum of `y`
pub fn argmax<T: PartialOrd + Copy>(y: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, v) in y.iter().copied().enumerate() {
        match best {
            Some((_, b)) if b >= v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// The mean distance between successive values of `x`
pub fn average_spacing(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    (x[x.len() - 1] - x[0]) / (x.len() - 1) as f64
}

/// The median of `values`, averaging the middle pair for even lengths
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// The abscissa `lo..=hi` as floating point values
pub fn index_axis(lo: i32, hi: i32) -> Vec<f64> {
    (lo..=hi).map(|i| i as f64).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_trapz() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(trapz(&x, &y), 2.0);
        assert_eq!(trapz(&x[..1], &y[..1]), 0.0);
        let yf = [0.0f32, 2.0, 2.0, 0.0];
        assert_eq!(trapz(&x, &yf), 4.0f32);
    }

    #[test]
    fn test_normalize() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 4.0, 0.0];
        let norm = normalize_by_area(&x, &y).unwrap();
        assert_eq!(norm, vec![0.0, 1.0, 0.0]);
        assert!(normalize_by_area(&x, &[0.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn test_argmax_first() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax::<f64>(&[]), None);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_difference_area() {
        let x = [0.0, 1.0, 2.0];
        let a = [0.0, 1.0, 0.0];
        assert_eq!(absolute_difference_area(&x, &a, &a), 0.0);
        assert_eq!(absolute_difference_area(&x, &a, &[0.0, 0.0, 0.0]), 1.0);
    }
}
