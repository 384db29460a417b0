pub mod accumulator;
pub mod detector;
pub mod log_power;
pub mod spectrum;

pub use accumulator::Accumulator;
pub use detector::{Candidate, Detector};
pub use log_power::LogPower;
pub use spectrum::{reorder, smooth, swap_halves, OrderedSpectrum, SmoothedBand};
