pub mod registry;
pub mod scanner;
pub mod sweep;

pub use registry::{Rejection, SignalRegistry};
pub use scanner::{CycleReport, FrameOutcome, Scanner};
pub use sweep::{ScanState, SweepAction, SweepController, TUNE_TOLERANCE_HZ};
