pub mod kernel;
pub mod state;

pub use kernel::ScanKernel;
pub use state::PipelineState;
