use anyhow::Result;
use bandsweep::engine::{PipelineState, ScanKernel};
use bandsweep::hal::mock::SimulatedReceiver;
use bandsweep::hal::{Emitter, TuningGap};
use bandsweep::report::MemorySink;
use bandsweep::{ScanConfig, ScanParameters};
use tokio::time::{sleep, timeout, Duration};

fn params(start: f64, end: f64, average_size: usize) -> ScanParameters {
    ScanConfig {
        average_size,
        start_frequency: start,
        end_frequency: end,
        channel_capacity: 8,
        ..ScanConfig::default()
    }
    .resolve()
    .unwrap()
}

fn kernel(
    params: ScanParameters,
    receiver: &SimulatedReceiver,
    sink: &MemorySink,
) -> ScanKernel {
    let (source, tuner) = receiver.split();
    ScanKernel::new(params, Box::new(source), Box::new(tuner), Box::new(sink.clone()))
}

#[tokio::test]
async fn test_scan_runs_to_end_frequency() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 100e6)
        .with_emitter(Emitter::new(101.2e6, 10_000.0, 20.0))
        .with_noise(-60.0, 0.5)
        .with_seed(7);
    let sink = MemorySink::new();
    let mut kernel = kernel(params(100e6, 102e6, 8), &receiver, &sink);

    assert_eq!(kernel.state().name(), "Idle");
    kernel.start().await?;
    assert_eq!(kernel.state().name(), "Running");

    let summary = timeout(Duration::from_secs(30), kernel.wait()).await??;

    assert!(summary.completed);
    assert_eq!(summary.final_frequency, 102e6);
    assert_eq!(summary.retunes, 4);
    assert!(matches!(
        kernel.state(),
        PipelineState::Completed { reached_end: true, .. }
    ));

    let signals = sink.signals();
    assert_eq!(signals.len(), 1);
    assert!((signals[0].center_frequency - 101.2e6).abs() < 5_000.0);
    assert_eq!(sink.summary(), Some(summary));
    Ok(())
}

#[tokio::test]
async fn test_shutdown_drains_and_flushes() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 88e6)
        .with_realtime(true);
    let sink = MemorySink::new();
    let mut kernel = kernel(params(88e6, 108e6, 50), &receiver, &sink);

    kernel.start().await?;
    sleep(Duration::from_millis(150)).await;

    let summary = timeout(Duration::from_secs(10), kernel.shutdown()).await??;

    assert!(!summary.completed);
    assert!(summary.frames > 0);
    assert!(matches!(
        kernel.state(),
        PipelineState::Completed { reached_end: false, .. }
    ));
    // finish ran on the worker before shutdown returned
    assert_eq!(sink.summary(), Some(summary));
    Ok(())
}

#[tokio::test]
async fn test_source_running_dry_stops_the_scan() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 90e6).with_frame_limit(10);
    let sink = MemorySink::new();
    // long dwell keeps every frame at the start frequency
    let params = ScanParameters {
        dwell_seconds: 60.0,
        ..params(90e6, 95e6, 4)
    };
    let mut kernel = kernel(params, &receiver, &sink);

    let summary = timeout(Duration::from_secs(10), async {
        kernel.start().await?;
        kernel.wait().await
    })
    .await??;

    assert!(!summary.completed);
    assert_eq!(summary.frames, 10);
    assert_eq!(summary.cycles, 2);
    Ok(())
}

#[tokio::test]
async fn test_gaps_are_counted_by_the_kernel() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 90e6)
        .with_gap(TuningGap::new(90.4e6, 91.1e6));
    let sink = MemorySink::new();
    let kernel = kernel(params(90e6, 92e6, 2), &receiver, &sink);
    let metrics = kernel.metrics();

    let summary = timeout(Duration::from_secs(30), kernel.run()).await??;

    assert!(summary.completed);
    // 90.5 and 91.0 are unreachable
    assert_eq!(summary.tuning_gaps, 2);
    assert_eq!(metrics.tuning_gaps(), 2);
    assert!(sink.signals().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_kernel_cannot_start_twice() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 90e6);
    let sink = MemorySink::new();
    let mut kernel = kernel(params(90e6, 90.5e6, 2), &receiver, &sink);

    kernel.start().await?;
    assert!(kernel.start().await.is_err());

    kernel.wait().await?;
    Ok(())
}

#[tokio::test]
async fn test_untunable_start_frequency_still_sweeps() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 80e6)
        .with_gap(TuningGap::new(86.5e6, 87.5e6));
    let sink = MemorySink::new();
    let kernel = kernel(params(87e6, 89e6, 1), &receiver, &sink);
    let metrics = kernel.metrics();

    let summary = timeout(Duration::from_secs(30), kernel.run()).await??;

    assert!(summary.completed);
    assert_eq!(summary.final_frequency, 89e6);
    // 87.0, 88.0, 88.5 and 89.0 MHz; 87.5 MHz is skipped
    assert_eq!(summary.cycles, 4);
    assert_eq!(summary.tuning_gaps, 1);
    assert_eq!(metrics.tuning_gaps(), 1);
    assert_eq!(receiver.tune_requests()[0], 87e6);
    Ok(())
}
