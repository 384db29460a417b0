use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use super::ReportSink;
use crate::core::{DetectedSignal, ScanSummary};
use crate::error::ScanError;

pub const CSV_HEADER: [&str; 5] = ["time", "frequency_mhz", "width_khz", "peak", "diff"];

const ROW_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// Append-only CSV record of detections.
///
/// The header is written only when the file is created; rows are flushed as
/// they are written so the log survives an abrupt exit.
pub struct CsvLog {
    path: PathBuf,
    writer: Option<Writer<File>>,
    rows: u64,
}

impl CsvLog {
    /// Opens (or creates) the log. Failure here should stop the scan before it starts.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref().to_path_buf();
        let write_header = !path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ScanError::SinkOpen {
                path: path.clone(),
                source,
            })?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if write_header {
            writer
                .write_record(CSV_HEADER)
                .map_err(io::Error::from)
                .and_then(|_| writer.flush())
                .map_err(|source| ScanError::SinkOpen {
                    path: path.clone(),
                    source,
                })?;
        }

        Ok(Self {
            path,
            writer: Some(writer),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written by this instance
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

pub fn format_row_time(timestamp: OffsetDateTime) -> Result<String> {
    timestamp
        .format(ROW_TIME_FORMAT)
        .context("Failed to format detection time")
}

impl ReportSink for CsvLog {
    fn signal(&mut self, signal: &DetectedSignal) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("CSV log already closed")?;

        writer.write_record([
            format_row_time(signal.timestamp)?,
            format!("{:.6}", signal.frequency_mhz()),
            format!("{:.6}", signal.width_khz()),
            format!("{:.6}", signal.peak_power_db),
            format!("{:.6}", signal.peak_margin_db),
        ])?;
        writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self, _summary: &ScanSummary) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", self.path.display()))?;
            info!("Wrote {} detections to {}", self.rows, self.path.display());
        }
        Ok(())
    }
}
