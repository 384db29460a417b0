use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use super::registry::{Rejection, SignalRegistry};
use super::sweep::{SweepAction, SweepController, TUNE_TOLERANCE_HZ};
use crate::config::ScanParameters;
use crate::core::{DetectedSignal, ScanSummary, SpectralFrame, WindowReport};
use crate::dsp::{reorder, smooth, Accumulator, Candidate, Detector};
use crate::hal::Tuner;
use crate::observability::ScanMetrics;
use crate::report::ReportSink;

/// Result of feeding one frame to the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The averaging window is not full yet
    Accumulating,
    /// A cycle was evaluated
    CycleComplete(CycleReport),
    /// Captured before the last retune; dropped without touching the window
    Stale,
    /// The sweep had already ended; the frame was ignored
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Center frequency the cycle was evaluated at
    pub center_frequency: f64,
    pub candidates: usize,
    pub detections: Vec<DetectedSignal>,
    pub action: SweepAction,
}

/// Drives frames through accumulation, detection, deduplication and sweep control.
///
/// Owns every piece of mutable scan state; callers hand in the tuner and sink
/// by exclusive reference for each frame.
pub struct Scanner {
    params: ScanParameters,
    accumulator: Accumulator,
    detector: Detector,
    registry: SignalRegistry,
    sweep: SweepController,
    metrics: Arc<ScanMetrics>,
    started: Instant,
    utc_offset: UtcOffset,
}

impl Scanner {
    pub fn new(params: ScanParameters) -> Self {
        Self {
            accumulator: Accumulator::new(params.vector_length, params.average_size),
            detector: Detector::new(params.threshold, params.half_power_db),
            registry: SignalRegistry::new(),
            sweep: SweepController::from_parameters(&params),
            metrics: Arc::new(ScanMetrics::new()),
            started: Instant::now(),
            utc_offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            params,
        }
    }

    /// Offset used for detection timestamps.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<ScanMetrics> {
        self.metrics.clone()
    }

    pub fn parameters(&self) -> &ScanParameters {
        &self.params
    }

    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    pub fn sweep(&self) -> &SweepController {
        &self.sweep
    }

    /// Tells the sweep where the tuner landed for a request the scanner did
    /// not make itself.
    pub fn tuner_settled(&mut self, actual: f64) {
        self.sweep.tuner_settled(actual);
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn is_finished(&self) -> bool {
        self.sweep.is_finished()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn process_frame(
        &mut self,
        frame: &SpectralFrame,
        tuner: &mut dyn Tuner,
        sink: &mut dyn ReportSink,
    ) -> Result<FrameOutcome> {
        if self.sweep.is_finished() {
            return Ok(FrameOutcome::Finished);
        }

        if let Some(tuned) = frame.tuned_frequency {
            if (tuned - self.sweep.tuned_frequency()).abs() >= TUNE_TOLERANCE_HZ {
                self.metrics.record_stale_frame();
                return Ok(FrameOutcome::Stale);
            }
        }

        let full = self.accumulator.accumulate(frame)?;
        self.metrics.record_frame();
        if !full {
            return Ok(FrameOutcome::Accumulating);
        }

        let started = self.metrics.start_cycle();
        let center_frequency = self.sweep.center_frequency();
        let candidates = self.evaluate_cycle(center_frequency)?;
        let candidate_count = candidates.len();

        let elapsed = self.elapsed();
        let mut detections = Vec::new();
        for candidate in candidates {
            if let Some(signal) = self.register(&candidate, center_frequency, elapsed) {
                sink.signal(&signal)?;
                detections.push(signal);
            }
        }

        let half_band = self.params.sample_rate / 2.0;
        let window = WindowReport {
            elapsed,
            low_frequency: center_frequency - half_band,
            high_frequency: center_frequency + half_band,
            detections: detections.len(),
        };
        debug!(
            "Finished scanning {:.6} MHz - {:.6} MHz ({} candidates, {} new)",
            window.low_frequency / 1_000_000.0,
            window.high_frequency / 1_000_000.0,
            candidate_count,
            detections.len()
        );
        sink.window_scanned(&window)?;

        self.metrics.finish_cycle(started);
        self.metrics.record_cycle();

        let gaps_before = self.sweep.tuning_gaps();
        let action = self.sweep.on_cycle_complete(tuner)?;
        // gaps can also be skipped on the way to the end frequency
        self.metrics.record_tuning_gaps(self.sweep.tuning_gaps() - gaps_before);
        if let SweepAction::Retuned { frequency, skipped } = &action {
            self.metrics.record_retune();
            if *skipped > 0 {
                info!(
                    "Retuned to {:.6} MHz, skipped {} unreachable frequencies",
                    frequency / 1_000_000.0,
                    skipped
                );
            } else {
                debug!("Retuned to {:.6} MHz", frequency / 1_000_000.0);
            }
        }

        Ok(FrameOutcome::CycleComplete(CycleReport {
            center_frequency,
            candidates: candidate_count,
            detections,
            action,
        }))
    }

    fn evaluate_cycle(&mut self, center_frequency: f64) -> Result<Vec<Candidate>> {
        let sum = self.accumulator.take_sum();
        let ordered = reorder(
            &sum,
            self.params.average_size,
            center_frequency,
            self.params.sample_rate,
        )?;
        let fine = smooth(&ordered, self.params.fine_bandwidth);
        let coarse = smooth(&ordered, self.params.coarse_bandwidth);

        Ok(self.detector.detect(&ordered, &fine, &coarse))
    }

    fn register(
        &mut self,
        candidate: &Candidate,
        center_frequency: f64,
        elapsed: Duration,
    ) -> Option<DetectedSignal> {
        match self.registry.check(
            candidate.low_frequency,
            candidate.high_frequency,
            center_frequency,
            self.params.spread,
        ) {
            Ok(mid) => {
                self.metrics.record_detection();
                Some(DetectedSignal {
                    center_frequency: mid,
                    bandwidth_hz: candidate.bandwidth(),
                    peak_power_db: candidate.peak_power,
                    peak_margin_db: candidate.margin,
                    timestamp: OffsetDateTime::now_utc().to_offset(self.utc_offset),
                    elapsed,
                })
            }
            Err(Rejection::NearCenter) => {
                self.metrics.record_near_center();
                debug!(
                    "Ignoring candidate at {:.6} MHz next to the tuned center",
                    candidate.mid_frequency() / 1_000_000.0
                );
                None
            }
            Err(Rejection::Duplicate { existing }) => {
                self.metrics.record_duplicate();
                debug!(
                    "Ignoring candidate at {:.6} MHz, already reported at {:.6} MHz",
                    candidate.mid_frequency() / 1_000_000.0,
                    existing / 1_000_000.0
                );
                None
            }
        }
    }

    /// Snapshot for the sinks' `finish` call.
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            elapsed: self.elapsed(),
            frames: self.metrics.frames_processed(),
            cycles: self.metrics.cycles_completed(),
            detections: self.metrics.detections(),
            retunes: self.sweep.retunes(),
            tuning_gaps: self.sweep.tuning_gaps(),
            final_frequency: self.sweep.center_frequency(),
            completed: self.sweep.is_finished(),
        }
    }
}
