use std::path::PathBuf;

/// Errors raised by the scanning core.
///
/// Hardware and runtime faults travel as `anyhow::Error`; these variants are
/// the contract violations and configuration problems the core itself detects.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A frame arrived with a different bin count than the session's vector length.
    #[error("Frame length mismatch: expected {expected} bins, got {actual}")]
    FrameLength { expected: usize, actual: usize },

    /// Half-swapping a spectrum requires an even number of bins.
    #[error("Vector length must be even, got {0}")]
    OddVectorLength(usize),

    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The report log could not be opened before scanning started.
    #[error("Error opening output CSV file {}: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        source: std::io::Error,
    },
}
