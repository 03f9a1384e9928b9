use std::f64::consts::LN_2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::argmax;
use crate::peak_statistics::{falling_half_height_crossing, rising_half_height_crossing};

/// Bi-Gaussian peak shape model
///
/// ```math
/// y = \begin{cases}
///     a\exp\left({\frac{-(\mu - x)^2}{2\sigma_a^2}}\right) & x \le \mu \\
///     a\exp\left({\frac{-(\mu - x)^2}{2\sigma_b^2}}\right) & x \gt \mu
/// \end{cases}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BiGaussianPeakShape {
    pub mu: f64,
    pub sigma_falling: f64,
    pub sigma_rising: f64,
    pub amplitude: f64,
}

impl BiGaussianPeakShape {
    pub fn new(mu: f64, sigma_rising: f64, sigma_falling: f64, amplitude: f64) -> Self {
        Self {
            mu,
            sigma_falling,
            sigma_rising,
            amplitude,
        }
    }

    /// Derive the shape of the most intense peak in `intensity` from where each of its sides
    /// crosses half of the apex height.
    ///
    /// The apex is the first maximum. Each half-height crossing is interpolated between the
    /// nearest pair of samples that bracket it, and gives
    /// $`\sigma = \lvert\mu - x_{1/2}\rvert / \sqrt{2\ln 2}`$ for that side.
    ///
    /// Returns [`None`] when the apex is not positive or either side never falls below half
    /// height.
    pub fn from_half_height(time: &[f64], intensity: &[f64]) -> Option<Self> {
        let n = time.len().min(intensity.len());
        let (time, intensity) = (&time[..n], &intensity[..n]);
        let index = argmax(intensity)?;
        let amplitude = intensity[index];
        if amplitude <= 0.0 {
            return None;
        }
        let mu = time[index];
        let rising = rising_half_height_crossing(time, intensity, index)?;
        let falling = falling_half_height_crossing(time, intensity, index)?;
        let scale = (2.0 * LN_2).sqrt();
        Some(Self::new(
            mu,
            (mu - rising).abs() / scale,
            (falling - mu).abs() / scale,
            amplitude,
        ))
    }

    /// Compute the theoretical intensity at a specified coordinate
    pub fn density(&self, x: f64) -> f64 {
        if self.mu >= x {
            self.amplitude * (-0.5 * (-self.mu + x).powi(2) / self.sigma_rising.powi(2)).exp()
        } else {
            self.amplitude * (-0.5 * (-self.mu + x).powi(2) / self.sigma_falling.powi(2)).exp()
        }
    }

    /// Compute the theoretical intensity at each of `times`
    pub fn predict(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|t| self.density(*t)).collect()
    }

    pub fn full_width_at_half_max(&self) -> f64 {
        (self.sigma_rising + self.sigma_falling) * (2.0 * LN_2).sqrt()
    }
}
