use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::ScanError;

/// User-facing scan settings. Frequencies in Hz, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Frames averaged per cycle
    pub average_size: usize,
    /// Fine smoothing window
    pub fine_bandwidth: f64,
    /// Coarse smoothing window, 8x fine when unset
    pub coarse_bandwidth: Option<f64>,
    /// Minimum separation between distinct signals
    pub spread: f64,
    /// Fine-over-coarse margin needed to report a signal, dB
    pub threshold: f64,
    /// Drop from the peak that marks a signal edge, dB
    pub half_power_db: f64,
    pub start_frequency: f64,
    pub end_frequency: f64,
    pub sample_rate: f64,
    /// Bin spacing of the transform; the vector length is `sample_rate / fft_width`
    pub fft_width: f64,
    /// Retune increment, `sample_rate / 4` when unset
    pub step: Option<f64>,
    /// Time to listen at each frequency before moving on
    pub dwell_seconds: f64,
    /// Convert incoming linear frames to dB before averaging
    pub log_scale: bool,
    /// Frames buffered between the source and the scanner
    pub channel_capacity: usize,
    /// Append detections to this CSV file
    pub csv_path: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            average_size: 1000,
            fine_bandwidth: 25_000.0,
            coarse_bandwidth: None,
            spread: 50_000.0,
            threshold: 3.0,
            half_power_db: 3.0,
            start_frequency: 87_000_000.0,
            end_frequency: 108_000_000.0,
            sample_rate: 2_000_000.0,
            fft_width: 1000.0,
            step: None,
            dwell_seconds: 0.0,
            log_scale: true,
            channel_capacity: 100,
            csv_path: None,
        }
    }
}

impl ScanConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        serde_json::from_value(config).context("Failed to parse scan config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        Self::from_json(value)
    }

    pub fn coarse_bandwidth(&self) -> f64 {
        self.coarse_bandwidth.unwrap_or(self.fine_bandwidth * 8.0)
    }

    pub fn step(&self) -> f64 {
        self.step.unwrap_or(self.sample_rate / 4.0)
    }

    /// Validates the settings and computes the derived scan parameters.
    pub fn resolve(&self) -> Result<ScanParameters, ScanError> {
        let invalid = |msg: String| -> Result<ScanParameters, ScanError> {
            Err(ScanError::InvalidConfig(msg))
        };

        if self.average_size == 0 {
            return invalid("average size must be at least 1".to_string());
        }
        if !(self.sample_rate > 0.0) {
            return invalid(format!("sample rate must be positive, got {}", self.sample_rate));
        }
        if !(self.fft_width > 0.0) {
            return invalid(format!("FFT width must be positive, got {}", self.fft_width));
        }

        let vector_length = (self.sample_rate / self.fft_width) as usize;
        if vector_length < 2 {
            return invalid(format!(
                "sample rate / FFT width gives {} bins, need at least 2",
                vector_length
            ));
        }
        if vector_length % 2 != 0 {
            return Err(ScanError::OddVectorLength(vector_length));
        }

        let step = self.step();
        if !(step > 0.0) {
            return invalid(format!("step must be positive, got {}", step));
        }
        if self.end_frequency < self.start_frequency {
            return invalid(format!(
                "end frequency {} is below start frequency {}",
                self.end_frequency, self.start_frequency
            ));
        }
        // a zero difference at the guarded edges must not open a signal
        if !(self.threshold > 0.0) {
            return invalid(format!("threshold must be positive, got {}", self.threshold));
        }

        if self.spread < 0.0 {
            return invalid(format!("spread must not be negative, got {}", self.spread));
        }
        if self.fine_bandwidth < 0.0 || self.coarse_bandwidth() < 0.0 {
            return invalid("smoothing bandwidths must not be negative".to_string());
        }
        if self.dwell_seconds < 0.0 {
            return invalid(format!("dwell time must not be negative, got {}", self.dwell_seconds));
        }
        if self.channel_capacity == 0 {
            return invalid("channel capacity must be at least 1".to_string());
        }

        Ok(ScanParameters {
            vector_length,
            average_size: self.average_size,
            sample_rate: self.sample_rate,
            fine_bandwidth: self.fine_bandwidth,
            coarse_bandwidth: self.coarse_bandwidth(),
            spread: self.spread,
            threshold: self.threshold as f32,
            half_power_db: self.half_power_db as f32,
            start_frequency: self.start_frequency,
            end_frequency: self.end_frequency,
            step,
            dwell_seconds: self.dwell_seconds,
            log_scale: self.log_scale,
            channel_capacity: self.channel_capacity,
        })
    }
}

/// Validated settings with derived values filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanParameters {
    /// Bins per frame (N)
    pub vector_length: usize,
    pub average_size: usize,
    pub sample_rate: f64,
    pub fine_bandwidth: f64,
    pub coarse_bandwidth: f64,
    pub spread: f64,
    pub threshold: f32,
    pub half_power_db: f32,
    pub start_frequency: f64,
    pub end_frequency: f64,
    pub step: f64,
    pub dwell_seconds: f64,
    pub log_scale: bool,
    pub channel_capacity: usize,
}

impl ScanParameters {
    pub fn sample_width(&self) -> f64 {
        self.sample_rate / self.vector_length as f64
    }

    /// Seconds of signal covered by one averaging cycle.
    pub fn frame_duration(&self) -> f64 {
        (self.vector_length * self.average_size) as f64 / self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let params = ScanConfig::default().resolve().unwrap();

        assert_eq!(params.vector_length, 2000);
        assert_eq!(params.coarse_bandwidth, 200_000.0);
        assert_eq!(params.step, 500_000.0);
        assert!((params.frame_duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScanConfig::from_json(serde_json::json!({
            "average_size": 10,
            "coarse_bandwidth": 100000.0
        }))
        .unwrap();

        assert_eq!(config.average_size, 10);
        assert_eq!(config.coarse_bandwidth(), 100_000.0);
        assert_eq!(config.fine_bandwidth, 25_000.0);
    }

    #[test]
    fn test_odd_vector_length_rejected() {
        let config = ScanConfig {
            sample_rate: 1_001_000.0,
            fft_width: 1000.0,
            ..ScanConfig::default()
        };

        assert!(matches!(config.resolve(), Err(ScanError::OddVectorLength(1001))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = ScanConfig {
            start_frequency: 100e6,
            end_frequency: 90e6,
            ..ScanConfig::default()
        };

        assert!(matches!(config.resolve(), Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_step_rejected() {
        let config = ScanConfig {
            step: Some(0.0),
            ..ScanConfig::default()
        };

        assert!(matches!(config.resolve(), Err(ScanError::InvalidConfig(_))));
    }
}
