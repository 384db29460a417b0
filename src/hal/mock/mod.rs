pub mod receiver;

pub use receiver::{SimulatedFrameSource, SimulatedReceiver, SimulatedTuner};
