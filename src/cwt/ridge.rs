use log::trace;

use super::transform::{scale_maxima, WaveletCoefficients};

/// One wavelet-coefficient maximum on a [`RidgeLine`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgePoint {
    pub scale: f64,
    pub index: usize,
    pub coefficient: f64,
}

impl RidgePoint {
    pub fn new(scale: f64, index: usize, coefficient: f64) -> Self {
        Self {
            scale,
            index,
            coefficient,
        }
    }
}

/// A chain of per-scale coefficient maxima, collected from the largest scale towards the
/// smallest.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeLine {
    points: Vec<RidgePoint>,
    total_scales: usize,
}

impl RidgeLine {
    pub fn new(point: RidgePoint, total_scales: usize) -> Self {
        Self {
            points: vec![point],
            total_scales,
        }
    }

    pub fn points(&self) -> &[RidgePoint] {
        &self.points
    }

    /// The number of scales this ridge was matched at
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> &RidgePoint {
        // A ridge is never constructed empty
        &self.points[self.points.len() - 1]
    }

    /// The point with the largest coefficient, the earliest one on ties
    pub fn best(&self) -> RidgePoint {
        let mut best = self.points[0];
        for point in self.points.iter().skip(1) {
            if point.coefficient > best.coefficient {
                best = *point;
            }
        }
        best
    }

    /// The location tolerance for a point at `scale`
    #[inline]
    pub fn tolerance(scale: f64) -> usize {
        scale.round().max(1.0) as usize
    }

    /// Append `point` if it lies at a new scale and within [`RidgeLine::tolerance`] of the
    /// last point's location.
    pub fn try_extend(&mut self, point: RidgePoint) -> bool {
        let last = self.last();
        if last.scale == point.scale {
            return false;
        }
        if last.index.abs_diff(point.index) <= Self::tolerance(point.scale) {
            self.points.push(point);
            true
        } else {
            false
        }
    }

    /// Whether the ridge spans enough scales to be considered a peak
    pub fn is_persistent(&self) -> bool {
        self.len() + 3 >= self.total_scales
    }
}

/// Link the per-scale maxima of `coefficients` into ridge lines, walking from the largest
/// scale to the smallest. A maximum is offered to every existing ridge and starts a new
/// ridge when none of them accept it.
pub fn build_ridge_lines(coefficients: &WaveletCoefficients) -> Vec<RidgeLine> {
    let total_scales = coefficients.num_scales();
    let mut ridges: Vec<RidgeLine> = Vec::new();
    for scale_index in (0..total_scales).rev() {
        let scale = coefficients.scales[scale_index];
        let row = coefficients.at_scale(scale_index);
        for index in scale_maxima(&row, scale) {
            let point = RidgePoint::new(scale, index, row[index]);
            let mut matched = false;
            for ridge in ridges.iter_mut() {
                if ridge.try_extend(point) {
                    matched = true;
                }
            }
            if !matched {
                ridges.push(RidgeLine::new(point, total_scales));
            }
        }
    }
    trace!("Built {} ridge lines over {} scales", ridges.len(), total_scales);
    ridges
}

/// Drop ridges matched at fewer than `total_scales - 3` scales
pub fn filter_ridge_lines(ridges: Vec<RidgeLine>) -> Vec<RidgeLine> {
    ridges.into_iter().filter(|r| r.is_persistent()).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cwt::transform::transform;

    #[test]
    fn test_try_extend() {
        let mut ridge = RidgeLine::new(RidgePoint::new(4.0, 10, 1.0), 4);
        assert!(!ridge.try_extend(RidgePoint::new(4.0, 10, 2.0)));
        assert!(ridge.try_extend(RidgePoint::new(3.0, 13, 2.0)));
        assert!(!ridge.try_extend(RidgePoint::new(2.0, 10, 3.0)));
        assert!(ridge.try_extend(RidgePoint::new(1.0, 12, 0.5)));
        assert_eq!(ridge.len(), 3);
        assert_eq!(ridge.best().index, 13);
        assert!(ridge.is_persistent());
    }

    #[test]
    fn test_short_ridges_filtered() {
        let long = RidgeLine {
            points: (0..7).map(|i| RidgePoint::new(10.0 - i as f64, 5, 1.0)).collect(),
            total_scales: 10,
        };
        let short = RidgeLine {
            points: (0..6).map(|i| RidgePoint::new(10.0 - i as f64, 5, 1.0)).collect(),
            total_scales: 10,
        };
        let kept = filter_ridge_lines(vec![long.clone(), short]);
        assert_eq!(kept, vec![long]);
    }

    #[test]
    fn test_ridge_follows_peak() {
        let time: Vec<f64> = (0..61).map(|i| i as f64).collect();
        let signal: Vec<f64> = time
            .iter()
            .map(|t| 100.0 * (-0.5 * (t - 30.0).powi(2) / 9.0).exp())
            .collect();
        let scales: Vec<f64> = (1..=6).map(|s| s as f64).collect();
        let coefs = transform(&time, &signal, &scales).unwrap();
        let ridges = filter_ridge_lines(build_ridge_lines(&coefs));
        let centered: Vec<_> = ridges.iter().filter(|r| r.best().index == 30).collect();
        assert_eq!(centered.len(), 1);
        assert_eq!(centered[0].len(), 6);
    }
}
