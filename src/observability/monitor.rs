use std::sync::Arc;
use super::ScanMetrics;

pub struct ScanMonitor {
    metrics: Arc<ScanMetrics>,
}

impl ScanMonitor {
    pub fn new(metrics: Arc<ScanMetrics>) -> Self {
        Self { metrics }
    }

    pub fn generate_report(&self) -> String {
        let m = &self.metrics;
        let mut report = String::from("=== Scan Metrics ===\n");

        report.push_str(&format!(
            "  Frames: {} frames processed in {} cycles, {} stale\n",
            m.frames_processed(),
            m.cycles_completed(),
            m.stale_frames()
        ));
        report.push_str(&format!(
            "  Signals: {} reported, {} near center, {} duplicate{}\n",
            m.detections(),
            m.rejected_near_center(),
            m.rejected_duplicates(),
            if m.rejected_duplicates() == 1 { "" } else { "s" }
        ));
        report.push_str(&format!(
            "  Tuning: {} retunes, {} gap{} skipped\n",
            m.retunes(),
            m.tuning_gaps(),
            if m.tuning_gaps() == 1 { "" } else { "s" }
        ));
        report.push_str(&format!(
            "  Avg Cycle Latency: {}μs\n",
            m.avg_cycle_latency_us()
        ));

        report
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }
}
