use anyhow::Result;
use async_trait::async_trait;
use crate::core::SpectralFrame;
use super::types::DeviceState;

/// Hardware tuning primitive.
///
/// Calls block until the hardware has settled, the scanner does not look at
/// another frame until they return.
pub trait Tuner: Send {
    /// Requests a center frequency in Hz and returns the frequency actually set.
    ///
    /// An `Err` is a hardware fault. A frequency the device cannot reach is
    /// reported as an `Ok` with whatever the device ended up on.
    fn set_center_frequency(&mut self, requested_hz: f64) -> Result<f64>;
}

impl<T: Tuner + ?Sized> Tuner for Box<T> {
    fn set_center_frequency(&mut self, requested_hz: f64) -> Result<f64> {
        (**self).set_center_frequency(requested_hz)
    }
}

/// Producer of power-spectrum frames, one per transform.
#[async_trait]
pub trait FrameSource: Send {
    /// Prepare the device for streaming
    async fn open(&mut self) -> Result<()>;

    /// Start streaming frames
    async fn start(&mut self) -> Result<()>;

    /// Next frame, or `None` once the stream has ended
    async fn read_frame(&mut self) -> Result<Option<SpectralFrame>>;

    /// Stop streaming
    async fn stop(&mut self) -> Result<()>;

    fn state(&self) -> DeviceState;
}
