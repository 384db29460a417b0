use crate::core::SpectralFrame;
use crate::error::ScanError;

/// Running sum of spectral frames for one averaging cycle.
pub struct Accumulator {
    sum: Vec<f32>,
    count: usize,
    average_size: usize,
}

impl Accumulator {
    pub fn new(vector_length: usize, average_size: usize) -> Self {
        Self {
            sum: vec![0.0; vector_length],
            count: 0,
            average_size,
        }
    }

    /// Adds a frame to the running sum.
    ///
    /// Returns `true` once `average_size` frames have been summed; the caller
    /// must then collect the cycle with [`Accumulator::take_sum`].
    pub fn accumulate(&mut self, frame: &SpectralFrame) -> Result<bool, ScanError> {
        if frame.len() != self.sum.len() {
            return Err(ScanError::FrameLength {
                expected: self.sum.len(),
                actual: frame.len(),
            });
        }

        for (total, value) in self.sum.iter_mut().zip(&frame.bins) {
            *total += *value;
        }
        self.count += 1;

        Ok(self.is_full())
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.average_size
    }

    /// Hands out the completed sum and zeroes the buffer for the next cycle.
    pub fn take_sum(&mut self) -> Vec<f32> {
        let n = self.sum.len();
        let completed = std::mem::replace(&mut self.sum, vec![0.0; n]);
        self.count = 0;
        completed
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn average_size(&self) -> usize {
        self.average_size
    }

    pub fn vector_length(&self) -> usize {
        self.sum.len()
    }

    pub fn sum(&self) -> &[f32] {
        &self.sum
    }
}
