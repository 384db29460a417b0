pub mod frame;
pub mod signal;

pub use frame::SpectralFrame;
pub use signal::{format_elapsed, DetectedSignal, ScanSummary, WindowReport};
