use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ScanParameters;
use crate::hal::Tuner;

/// How far the tuner may land from a request and still count as tuned, Hz
pub const TUNE_TOLERANCE_HZ: f64 = 10.0;

/// Position of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanState {
    pub center_frequency: f64,
    pub end_frequency: f64,
    pub step: f64,
    pub dwell_seconds: f64,
    /// Completed cycles at the current frequency
    pub listens: u64,
    /// Seconds covered by one cycle
    pub frame_duration: f64,
}

/// What the controller did after a completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepAction {
    /// Keep listening at the current frequency
    Stay,
    /// Moved to a new frequency after skipping `skipped` unreachable ones
    Retuned { frequency: f64, skipped: u32 },
    /// The end frequency has been reached
    Finished,
}

/// Decides when to retune and walks the receiver through the range.
pub struct SweepController {
    state: ScanState,
    /// Frequency the tuner last reported, which is where frames come from
    tuned_frequency: f64,
    finished: bool,
    retunes: u64,
    tuning_gaps: u64,
}

impl SweepController {
    pub fn new(state: ScanState) -> Self {
        Self {
            tuned_frequency: state.center_frequency,
            state,
            finished: false,
            retunes: 0,
            tuning_gaps: 0,
        }
    }

    pub fn from_parameters(params: &ScanParameters) -> Self {
        Self::new(ScanState {
            center_frequency: params.start_frequency,
            end_frequency: params.end_frequency,
            step: params.step,
            dwell_seconds: params.dwell_seconds,
            listens: 0,
            frame_duration: params.frame_duration(),
        })
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn center_frequency(&self) -> f64 {
        self.state.center_frequency
    }

    pub fn tuned_frequency(&self) -> f64 {
        self.tuned_frequency
    }

    /// Records where the tuner actually landed after a request made outside
    /// the controller, such as the initial tune to the start frequency.
    pub fn tuner_settled(&mut self, actual: f64) {
        self.tuned_frequency = actual;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn retunes(&self) -> u64 {
        self.retunes
    }

    pub fn tuning_gaps(&self) -> u64 {
        self.tuning_gaps
    }

    /// Records a completed averaging cycle and retunes once the dwell time is used up.
    ///
    /// Frequencies the tuner cannot reach are skipped by stepping on. The
    /// sweep finishes when the current frequency is at or past the end before
    /// a step would be taken.
    pub fn on_cycle_complete(&mut self, tuner: &mut dyn Tuner) -> Result<SweepAction> {
        if self.finished {
            return Ok(SweepAction::Finished);
        }

        self.state.listens += 1;
        let listened = self.state.listens as f64 * self.state.frame_duration;
        if listened < self.state.dwell_seconds {
            return Ok(SweepAction::Stay);
        }

        let mut skipped = 0u32;
        loop {
            if self.state.center_frequency >= self.state.end_frequency {
                self.finished = true;
                info!(
                    "Reached end frequency {:.6} MHz",
                    self.state.end_frequency / 1_000_000.0
                );
                return Ok(SweepAction::Finished);
            }

            self.state.center_frequency += self.state.step;
            let requested = self.state.center_frequency;
            let actual = tuner.set_center_frequency(requested)?;
            self.tuned_frequency = actual;

            if (actual - requested).abs() < TUNE_TOLERANCE_HZ {
                break;
            }

            skipped += 1;
            self.tuning_gaps += 1;
            debug!(
                "Tuner landed on {:.0} Hz for {:.0} Hz, skipping",
                actual, requested
            );
        }

        self.state.listens = 0;
        self.retunes += 1;
        Ok(SweepAction::Retuned {
            frequency: self.state.center_frequency,
            skipped,
        })
    }
}
