use serde::{Deserialize, Serialize};

/// Lifecycle of a frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    Unopened,
    Opened,
    Running,
    Stopped,
}

/// Narrowband emitter placed in the simulated spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    /// Center frequency in Hz
    pub frequency: f64,
    /// Occupied bandwidth in Hz
    pub width: f64,
    /// Power above the noise floor in dB
    pub power_db: f64,
}

impl Emitter {
    pub fn new(frequency: f64, width: f64, power_db: f64) -> Self {
        Self {
            frequency,
            width,
            power_db,
        }
    }

    pub fn covers(&self, frequency: f64) -> bool {
        (frequency - self.frequency).abs() <= self.width / 2.0
    }
}

/// Frequency range the simulated tuner cannot lock onto, in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningGap {
    pub start: f64,
    pub end: f64,
}

impl TuningGap {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.start && frequency <= self.end
    }
}
