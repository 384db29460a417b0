//! Output side of the scanner. Sinks only receive; nothing they do feeds
//! back into detection or sweep state.

pub mod console;
pub mod csv_log;
pub mod memory;

pub use console::ConsoleSink;
pub use csv_log::CsvLog;
pub use memory::MemorySink;

use anyhow::Result;
use crate::core::{DetectedSignal, ScanSummary, WindowReport};

/// Destination for scan results.
pub trait ReportSink: Send {
    /// Called once per accepted detection
    fn signal(&mut self, signal: &DetectedSignal) -> Result<()>;

    /// Called after every completed averaging cycle
    fn window_scanned(&mut self, _report: &WindowReport) -> Result<()> {
        Ok(())
    }

    /// Called once when the scan ends; flush and release resources here
    fn finish(&mut self, _summary: &ScanSummary) -> Result<()> {
        Ok(())
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn signal(&mut self, signal: &DetectedSignal) -> Result<()> {
        (**self).signal(signal)
    }

    fn window_scanned(&mut self, report: &WindowReport) -> Result<()> {
        (**self).window_scanned(report)
    }

    fn finish(&mut self, summary: &ScanSummary) -> Result<()> {
        (**self).finish(summary)
    }
}

/// Forwards every event to each inner sink in order.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for Fanout {
    fn signal(&mut self, signal: &DetectedSignal) -> Result<()> {
        for sink in &mut self.sinks {
            sink.signal(signal)?;
        }
        Ok(())
    }

    fn window_scanned(&mut self, report: &WindowReport) -> Result<()> {
        for sink in &mut self.sinks {
            sink.window_scanned(report)?;
        }
        Ok(())
    }

    fn finish(&mut self, summary: &ScanSummary) -> Result<()> {
        // every sink gets the chance to close even if an earlier one failed
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.finish(summary) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
