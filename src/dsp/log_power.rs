//! Log-power conversion applied to raw magnitude-squared frames before they
//! reach the accumulator.
//!
//! The offset normalises for transform length and window energy so that a
//! full-scale tone reads close to 0 dB regardless of the FFT size.

use std::f64::consts::PI;

use crate::core::SpectralFrame;

/// Blackman window coefficient
const BLACKMAN_ALPHA: f64 = 0.16;

/// Smallest linear value fed to the logarithm
const POWER_FLOOR: f32 = 1e-20;

/// Blackman window of length `n`.
pub fn blackman_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }

    let a0 = (1.0 - BLACKMAN_ALPHA) / 2.0;
    let a1 = 0.5;
    let a2 = BLACKMAN_ALPHA / 2.0;
    let denom = (n - 1) as f64;

    (0..n)
        .map(|i| {
            let x = i as f64 / denom;
            (a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()) as f32
        })
        .collect()
}

/// Sum of squared window coefficients.
pub fn window_power(window: &[f32]) -> f64 {
    window.iter().map(|w| (*w as f64) * (*w as f64)).sum()
}

/// Converts linear power bins to dB with a fixed normalisation offset.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPower {
    offset_db: f32,
}

impl LogPower {
    /// Builds the stage for a Blackman-windowed transform of `vector_length` bins.
    pub fn for_vector_length(vector_length: usize) -> Self {
        let n = vector_length.max(1) as f64;
        let window = blackman_window(vector_length);
        let power = window_power(&window).max(f64::MIN_POSITIVE);
        let offset_db = -20.0 * n.log10() - 10.0 * (power / n).log10();

        Self {
            offset_db: offset_db as f32,
        }
    }

    pub fn with_offset(offset_db: f32) -> Self {
        Self { offset_db }
    }

    pub fn offset_db(&self) -> f32 {
        self.offset_db
    }

    pub fn to_db(&self, linear: f32) -> f32 {
        10.0 * linear.max(POWER_FLOOR).log10() + self.offset_db
    }

    pub fn apply(&self, frame: &mut SpectralFrame) {
        for bin in frame.bins.iter_mut() {
            *bin = self.to_db(*bin);
        }
    }
}
