pub mod mock;
pub mod traits;
pub mod types;

pub use traits::{FrameSource, Tuner};
pub use types::{DeviceState, Emitter, TuningGap};
