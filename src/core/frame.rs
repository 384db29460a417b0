use serde::{Deserialize, Serialize};

/// One power spectrum as delivered by the upstream transform.
///
/// Bins are in transform order: bin 0 is the zero-frequency bin, the upper
/// half holds the negative frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralFrame {
    /// Timestamp in microseconds since the stream started
    pub timestamp: u64,

    /// Sequential frame number for ordering
    pub sequence_id: u64,

    /// Power per bin
    pub bins: Vec<f32>,

    /// Center frequency the device was tuned to when the frame was captured,
    /// if the source knows it
    #[serde(default)]
    pub tuned_frequency: Option<f64>,
}

impl SpectralFrame {
    pub fn new(timestamp: u64, sequence_id: u64, bins: Vec<f32>) -> Self {
        Self {
            timestamp,
            sequence_id,
            bins,
            tuned_frequency: None,
        }
    }

    pub fn with_tuned_frequency(mut self, frequency: f64) -> Self {
        self.tuned_frequency = Some(frequency);
        self
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
