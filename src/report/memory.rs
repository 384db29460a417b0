use anyhow::Result;
use std::sync::{Arc, Mutex};

use super::ReportSink;
use crate::core::{DetectedSignal, ScanSummary, WindowReport};

#[derive(Default)]
struct Collected {
    signals: Vec<DetectedSignal>,
    windows: Vec<WindowReport>,
    summary: Option<ScanSummary>,
}

/// Keeps every event in memory. Clones share the same storage, so a handle
/// can be kept while the sink itself is moved into a scan.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Collected>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<DetectedSignal> {
        self.lock().signals.clone()
    }

    pub fn windows(&self) -> Vec<WindowReport> {
        self.lock().windows.clone()
    }

    pub fn summary(&self) -> Option<ScanSummary> {
        self.lock().summary.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collected> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReportSink for MemorySink {
    fn signal(&mut self, signal: &DetectedSignal) -> Result<()> {
        self.lock().signals.push(signal.clone());
        Ok(())
    }

    fn window_scanned(&mut self, report: &WindowReport) -> Result<()> {
        self.lock().windows.push(report.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &ScanSummary) -> Result<()> {
        self.lock().summary = Some(summary.clone());
        Ok(())
    }
}
