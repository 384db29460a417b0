use super::spectrum::{OrderedSpectrum, SmoothedBand};

/// A threshold crossing refined to its half-power edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub low_bin: usize,
    pub peak_bin: usize,
    pub high_bin: usize,
    pub low_frequency: f64,
    pub high_frequency: f64,
    /// Fine-band value at the peak
    pub peak_power: f32,
    /// Difference trace value at the peak
    pub margin: f32,
}

impl Candidate {
    pub fn mid_frequency(&self) -> f64 {
        (self.low_frequency + self.high_frequency) / 2.0
    }

    pub fn bandwidth(&self) -> f64 {
        self.high_frequency - self.low_frequency
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanMode {
    Idle,
    InSignal { peak: usize },
}

/// Finds narrowband emissions as places where the fine band rises above the
/// coarse band.
#[derive(Debug, Clone)]
pub struct Detector {
    threshold: f32,
    half_power_db: f32,
}

impl Detector {
    pub fn new(threshold: f32, half_power_db: f32) -> Self {
        Self {
            threshold,
            half_power_db,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Fine minus coarse, bin by bin.
    pub fn difference(fine: &SmoothedBand, coarse: &SmoothedBand) -> Vec<f32> {
        fine.power
            .iter()
            .zip(&coarse.power)
            .map(|(f, c)| f - c)
            .collect()
    }

    pub fn detect(
        &self,
        ordered: &OrderedSpectrum,
        fine: &SmoothedBand,
        coarse: &SmoothedBand,
    ) -> Vec<Candidate> {
        let diff = Self::difference(fine, coarse);
        self.scan(&diff, &fine.power, &ordered.frequencies)
    }

    /// Runs the two-state scan over a difference trace.
    ///
    /// A signal still open when the trace ends is dropped.
    pub fn scan(&self, diff: &[f32], fine: &[f32], frequencies: &[f64]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut mode = ScanMode::Idle;

        for i in 0..diff.len() {
            match mode {
                ScanMode::Idle => {
                    if diff[i] >= self.threshold {
                        mode = ScanMode::InSignal { peak: i };
                    }
                }
                ScanMode::InSignal { mut peak } => {
                    if diff[peak] < diff[i] {
                        peak = i;
                    }

                    if diff[i] < self.threshold {
                        let (low, high) = self.half_power_edges(diff, peak);
                        candidates.push(Candidate {
                            low_bin: low,
                            peak_bin: peak,
                            high_bin: high,
                            low_frequency: frequencies[low],
                            high_frequency: frequencies[high],
                            peak_power: fine[peak],
                            margin: diff[peak],
                        });
                        mode = ScanMode::Idle;
                    } else {
                        mode = ScanMode::InSignal { peak };
                    }
                }
            }
        }

        candidates
    }

    fn half_power_edges(&self, diff: &[f32], peak: usize) -> (usize, usize) {
        let floor = diff[peak] - self.half_power_db;

        let mut low = peak;
        while diff[low] > floor && low > 0 {
            low -= 1;
        }

        let mut high = peak;
        while diff[high] > floor && high < diff.len() - 1 {
            high += 1;
        }

        (low, high)
    }
}
