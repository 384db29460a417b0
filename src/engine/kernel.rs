use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Instant;
use time::UtcOffset;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ScanParameters;
use crate::core::{ScanSummary, SpectralFrame};
use crate::dsp::LogPower;
use crate::engine::state::PipelineState;
use crate::hal::{FrameSource, Tuner};
use crate::observability::{ScanMetrics, ScanMonitor};
use crate::report::ReportSink;
use crate::scan::{Scanner, TUNE_TOLERANCE_HZ};

/// Everything the scanning thread owns exclusively.
struct ScanWorker {
    scanner: Scanner,
    tuner: Box<dyn Tuner>,
    sink: Box<dyn ReportSink>,
    log_power: Option<LogPower>,
}

impl ScanWorker {
    /// Consumes frames until the sweep ends or the channel closes, then
    /// flushes the sinks.
    fn run(mut self, mut rx: mpsc::Receiver<SpectralFrame>) -> Result<ScanSummary> {
        let result = self.consume(&mut rx);
        // stops the reader from queueing anything else
        rx.close();

        let summary = self.scanner.summary();
        let finished = self.sink.finish(&summary);
        result?;
        finished?;
        Ok(summary)
    }

    fn consume(&mut self, rx: &mut mpsc::Receiver<SpectralFrame>) -> Result<()> {
        while let Some(mut frame) = rx.blocking_recv() {
            if let Some(stage) = &self.log_power {
                stage.apply(&mut frame);
            }

            self.scanner
                .process_frame(&frame, self.tuner.as_mut(), self.sink.as_mut())?;

            if self.scanner.is_finished() {
                break;
            }
        }
        Ok(())
    }
}

/// Runs a scan: a reader task streams frames from the source into a bounded
/// channel, a blocking worker owns the scanner, tuner and sink.
pub struct ScanKernel {
    params: ScanParameters,
    state: PipelineState,
    source: Option<Box<dyn FrameSource>>,
    worker: Option<ScanWorker>,
    metrics: Arc<ScanMetrics>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    reader_handle: Option<JoinHandle<Result<()>>>,
    worker_handle: Option<JoinHandle<Result<ScanSummary>>>,
}

impl ScanKernel {
    pub fn new(
        params: ScanParameters,
        source: Box<dyn FrameSource>,
        tuner: Box<dyn Tuner>,
        sink: Box<dyn ReportSink>,
    ) -> Self {
        let metrics = Arc::new(ScanMetrics::new());
        let scanner = Scanner::new(params.clone()).with_metrics(metrics.clone());
        let log_power = params
            .log_scale
            .then(|| LogPower::for_vector_length(params.vector_length));

        Self {
            params,
            state: PipelineState::Idle,
            source: Some(source),
            worker: Some(ScanWorker {
                scanner,
                tuner,
                sink,
                log_power,
            }),
            metrics,
            shutdown_tx: None,
            reader_handle: None,
            worker_handle: None,
        }
    }

    /// Offset for detection timestamps; resolve it before the runtime starts
    /// its worker threads.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        if let Some(worker) = self.worker.take() {
            self.worker = Some(ScanWorker {
                scanner: worker.scanner.with_utc_offset(offset),
                ..worker
            });
        }
        self
    }

    /// Get current pipeline state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn metrics(&self) -> Arc<ScanMetrics> {
        self.metrics.clone()
    }

    pub fn monitor(&self) -> ScanMonitor {
        ScanMonitor::new(self.metrics.clone())
    }

    /// Transition to a new state with validation
    fn transition_to(&mut self, new_state: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(anyhow!(
                "Invalid state transition: {} -> {}",
                self.state.name(),
                new_state.name()
            ));
        }
        self.state = new_state;
        Ok(())
    }

    fn fail(&mut self, err: &anyhow::Error, recoverable: bool) {
        error!("Scan failed: {:#}", err);
        self.state = PipelineState::Error {
            error_msg: format!("{:#}", err),
            recoverable,
        };
    }

    pub async fn start(&mut self) -> Result<()> {
        self.transition_to(PipelineState::Initializing)?;

        match self.spawn_tasks().await {
            Ok(()) => {
                self.transition_to(PipelineState::Running {
                    start_time: Some(Instant::now()),
                })?;
                Ok(())
            }
            Err(e) => {
                self.fail(&e, false);
                Err(e)
            }
        }
    }

    async fn spawn_tasks(&mut self) -> Result<()> {
        let mut source = self
            .source
            .take()
            .ok_or_else(|| anyhow!("Scan kernel has already been started"))?;
        let mut worker = self
            .worker
            .take()
            .ok_or_else(|| anyhow!("Scan kernel has already been started"))?;

        let start = self.params.start_frequency;
        let actual = worker.tuner.set_center_frequency(start)?;
        if (actual - start).abs() >= TUNE_TOLERANCE_HZ {
            warn!(
                "Tuner settled on {:.0} Hz instead of start frequency {:.0} Hz",
                actual, start
            );
        }
        // frames are matched against where the device really is
        worker.scanner.tuner_settled(actual);

        source.open().await?;
        source.start().await?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (frame_tx, frame_rx) = mpsc::channel(self.params.channel_capacity);

        self.reader_handle = Some(tokio::spawn(read_frames(source, frame_tx, shutdown_rx)));
        self.worker_handle = Some(tokio::task::spawn_blocking(move || worker.run(frame_rx)));
        self.shutdown_tx = Some(shutdown_tx);

        info!(
            "Scanning {:.6} MHz to {:.6} MHz in {:.6} MHz steps",
            self.params.start_frequency / 1_000_000.0,
            self.params.end_frequency / 1_000_000.0,
            self.params.step / 1_000_000.0
        );
        Ok(())
    }

    /// Waits for the sweep to reach its end frequency (or the source to run dry).
    pub async fn wait(&mut self) -> Result<ScanSummary> {
        self.finish(false).await
    }

    /// Stops reading new frames, processes what is already queued and flushes the sinks.
    pub async fn shutdown(&mut self) -> Result<ScanSummary> {
        self.finish(true).await
    }

    /// Convenience for start + wait.
    pub async fn run(mut self) -> Result<ScanSummary> {
        self.start().await?;
        self.wait().await
    }

    async fn finish(&mut self, stop_reader: bool) -> Result<ScanSummary> {
        if !self.state.is_active() {
            return Err(anyhow!("Cannot finish scan in state {}", self.state.name()));
        }
        let started = match &self.state {
            PipelineState::Running { start_time } => *start_time,
            _ => None,
        };

        if stop_reader {
            self.signal_shutdown();
            if self.state != PipelineState::Draining {
                self.transition_to(PipelineState::Draining)?;
            }
        }

        // awaited in place so a cancelled wait() can be followed by shutdown()
        let worker_result = match self.worker_handle.as_mut() {
            Some(handle) => handle
                .await
                .map_err(|e| anyhow!("Scan worker panicked: {}", e))
                .and_then(|r| r),
            None => Err(anyhow!("Scan worker not running")),
        };
        self.worker_handle = None;

        // the worker is done, nothing reads the channel any more
        self.signal_shutdown();
        if self.state != PipelineState::Draining {
            self.transition_to(PipelineState::Draining)?;
        }

        let reader_result = match self.reader_handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| anyhow!("Frame reader panicked: {}", e))
                .and_then(|r| r),
            None => Ok(()),
        };
        self.shutdown_tx = None;

        let summary = match worker_result {
            Ok(summary) => summary,
            Err(e) => {
                self.fail(&e, false);
                return Err(e);
            }
        };
        if let Err(e) = reader_result {
            self.fail(&e, true);
            return Err(e);
        }

        self.transition_to(PipelineState::Completed {
            duration: started.map(|t| t.elapsed()),
            total_frames: summary.frames,
            reached_end: summary.completed,
        })?;
        Ok(summary)
    }

    fn signal_shutdown(&self) {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(());
        }
    }
}

async fn read_frames(
    mut source: Box<dyn FrameSource>,
    frames: mpsc::Sender<SpectralFrame>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let result = loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break Ok(()),
            frame = source.read_frame() => match frame {
                Ok(Some(frame)) => {
                    if frames.send(frame).await.is_err() {
                        // scanner finished or failed
                        break Ok(());
                    }
                }
                Ok(None) => {
                    info!("Frame source ended");
                    break Ok(());
                }
                Err(e) => break Err(e),
            },
        }
    };

    // closing the sender lets the worker drain and exit
    drop(frames);
    if let Err(e) = source.stop().await {
        warn!("Failed to stop frame source: {}", e);
    }
    result
}

// Dropping without shutdown() leaves the worker to drain on its own once the
// reader sees the signal.
impl Drop for ScanKernel {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(());
        }
    }
}
