pub mod metrics;
pub mod monitor;

pub use metrics::ScanMetrics;
pub use monitor::ScanMonitor;
