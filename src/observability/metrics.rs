use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one scan session. Shared through `Arc` so a monitor can read
/// them while the scanner runs.
#[derive(Default)]
pub struct ScanMetrics {
    frames_processed: AtomicU64,
    stale_frames: AtomicU64,
    cycles_completed: AtomicU64,
    detections: AtomicU64,
    rejected_near_center: AtomicU64,
    rejected_duplicates: AtomicU64,
    retunes: AtomicU64,
    tuning_gaps: AtomicU64,
    total_cycle_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    /// Frames dropped because they were captured before the last retune
    pub fn stale_frames(&self) -> u64 {
        self.stale_frames.load(Ordering::Relaxed)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn detections(&self) -> u64 {
        self.detections.load(Ordering::Relaxed)
    }

    pub fn rejected_near_center(&self) -> u64 {
        self.rejected_near_center.load(Ordering::Relaxed)
    }

    pub fn rejected_duplicates(&self) -> u64 {
        self.rejected_duplicates.load(Ordering::Relaxed)
    }

    pub fn retunes(&self) -> u64 {
        self.retunes.load(Ordering::Relaxed)
    }

    pub fn tuning_gaps(&self) -> u64 {
        self.tuning_gaps.load(Ordering::Relaxed)
    }

    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_frame(&self) {
        self.stale_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_near_center(&self) {
        self.rejected_near_center.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.rejected_duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retune(&self) {
        self.retunes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tuning_gaps(&self, count: u64) {
        self.tuning_gaps.fetch_add(count, Ordering::Relaxed);
    }

    pub fn start_cycle(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_cycle(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_cycle_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Mean time spent reordering, smoothing and detecting per cycle
    pub fn avg_cycle_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_cycle_latency_us.load(Ordering::Relaxed) / samples
    }
}
