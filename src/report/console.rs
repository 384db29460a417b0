use anyhow::Result;
use std::io::{self, Stderr, Stdout, Write};

use super::ReportSink;
use crate::core::{format_elapsed, DetectedSignal, ScanSummary, WindowReport};

/// Human-readable report lines.
///
/// Detections go to `out`, progress and the completion notice to `status`,
/// so detections can be piped on their own.
pub struct ConsoleSink<W: Write + Send = Stdout, E: Write + Send = Stderr> {
    out: W,
    status: E,
}

impl ConsoleSink {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write + Send, E: Write + Send> ConsoleSink<W, E> {
    pub fn new(out: W, status: E) -> Self {
        Self { out, status }
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.status)
    }
}

pub fn signal_line(signal: &DetectedSignal) -> String {
    format!(
        "[+] {}: Found signal: at {:.6} MHz of width {:.6} kHz, peak power {:.6} dB (difference {:.6} dB)",
        format_elapsed(signal.elapsed),
        signal.frequency_mhz(),
        signal.width_khz(),
        signal.peak_power_db,
        signal.peak_margin_db
    )
}

impl<W: Write + Send, E: Write + Send> ReportSink for ConsoleSink<W, E> {
    fn signal(&mut self, signal: &DetectedSignal) -> Result<()> {
        writeln!(self.out, "{}", signal_line(signal))?;
        self.out.flush()?;
        Ok(())
    }

    fn window_scanned(&mut self, report: &WindowReport) -> Result<()> {
        writeln!(
            self.status,
            "{}: Finished scanning {:.6} MHz - {:.6} MHz",
            format_elapsed(report.elapsed),
            report.low_frequency / 1_000_000.0,
            report.high_frequency / 1_000_000.0
        )?;
        Ok(())
    }

    fn finish(&mut self, summary: &ScanSummary) -> Result<()> {
        if summary.completed {
            writeln!(
                self.status,
                "[*] Finished scanning: {} signals in {}",
                summary.detections,
                format_elapsed(summary.elapsed)
            )?;
        } else {
            writeln!(
                self.status,
                "[*] Scan stopped at {:.6} MHz: {} signals in {}",
                summary.final_frequency / 1_000_000.0,
                summary.detections,
                format_elapsed(summary.elapsed)
            )?;
        }
        self.out.flush()?;
        self.status.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::OffsetDateTime;

    fn signal() -> DetectedSignal {
        DetectedSignal {
            center_frequency: 100_500_000.0,
            bandwidth_hz: 12_000.0,
            peak_power_db: -40.5,
            peak_margin_db: 9.25,
            timestamp: OffsetDateTime::UNIX_EPOCH,
            elapsed: Duration::from_secs(65),
        }
    }

    #[test]
    fn test_signal_line_format() {
        assert_eq!(
            signal_line(&signal()),
            "[+] 00:01:05: Found signal: at 100.500000 MHz of width 12.000000 kHz, \
             peak power -40.500000 dB (difference 9.250000 dB)"
        );
    }

    #[test]
    fn test_streams_are_separate() {
        let mut sink = ConsoleSink::new(Vec::new(), Vec::new());
        sink.signal(&signal()).unwrap();
        sink.finish(&ScanSummary {
            completed: true,
            detections: 1,
            ..ScanSummary::default()
        })
        .unwrap();

        let (out, status) = sink.into_inner();
        let out = String::from_utf8(out).unwrap();
        let status = String::from_utf8(status).unwrap();
        assert!(out.starts_with("[+] 00:01:05"));
        assert!(!out.contains("Finished"));
        assert_eq!(status, "[*] Finished scanning: 1 signals in 00:00:00\n");
    }
}
