use serde::Serialize;
use std::time::Duration;
use time::OffsetDateTime;

/// An accepted detection. Emitted once per physical emitter per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedSignal {
    /// Midpoint of the half-power edges, Hz
    pub center_frequency: f64,
    /// Distance between the half-power edges, Hz
    pub bandwidth_hz: f64,
    /// Fine-band value at the peak bin
    pub peak_power_db: f32,
    /// Fine minus coarse at the peak bin
    pub peak_margin_db: f32,
    /// Wall-clock time of the detection
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Time since the scan started
    pub elapsed: Duration,
}

impl DetectedSignal {
    pub fn frequency_mhz(&self) -> f64 {
        self.center_frequency / 1_000_000.0
    }

    pub fn width_khz(&self) -> f64 {
        self.bandwidth_hz / 1000.0
    }
}

/// Progress notice for one completed averaging cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    pub elapsed: Duration,
    pub low_frequency: f64,
    pub high_frequency: f64,
    pub detections: usize,
}

/// Final tally handed to the sinks when a scan ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub elapsed: Duration,
    pub frames: u64,
    pub cycles: u64,
    pub detections: u64,
    pub retunes: u64,
    pub tuning_gaps: u64,
    pub final_frequency: f64,
    /// True when the sweep reached its end frequency
    pub completed: bool,
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let t = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", t / 3600, (t % 3600) / 60, t % 60)
}
