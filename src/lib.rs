pub mod config;
pub mod core;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod hal;
pub mod logging;
pub mod observability;
pub mod report;
pub mod scan;

pub use config::{ScanConfig, ScanParameters};
pub use error::ScanError;
