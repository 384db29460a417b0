use anyhow::Result;
use bandsweep::core::SpectralFrame;
use bandsweep::dsp::LogPower;
use bandsweep::hal::mock::SimulatedReceiver;
use bandsweep::hal::{Emitter, FrameSource, Tuner};
use bandsweep::report::MemorySink;
use bandsweep::scan::{FrameOutcome, Scanner};
use bandsweep::{ScanConfig, ScanError, ScanParameters};

fn params(start: f64, end: f64) -> ScanParameters {
    ScanConfig {
        average_size: 4,
        start_frequency: start,
        end_frequency: end,
        ..ScanConfig::default()
    }
    .resolve()
    .unwrap()
}

/// Feeds simulated frames through the log stage and the scanner until the
/// sweep ends.
async fn sweep(
    receiver: &SimulatedReceiver,
    scanner: &mut Scanner,
    sink: &mut MemorySink,
) -> Result<()> {
    let (mut source, mut tuner) = receiver.split();
    let log_power = LogPower::for_vector_length(scanner.parameters().vector_length);
    tuner.set_center_frequency(scanner.parameters().start_frequency)?;

    source.open().await?;
    source.start().await?;
    while !scanner.is_finished() {
        let mut frame = source.read_frame().await?.expect("unlimited source");
        log_power.apply(&mut frame);
        scanner.process_frame(&frame, &mut tuner, sink)?;
    }
    source.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_emitter_reported_once_across_overlapping_windows() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 87e6)
        .with_emitter(Emitter::new(87.6e6, 10_000.0, 20.0));
    let mut scanner = Scanner::new(params(87e6, 88e6));
    let mut sink = MemorySink::new();

    sweep(&receiver, &mut scanner, &mut sink).await?;

    // windows at 87.0, 87.5 and 88.0 MHz all contain the emitter
    assert_eq!(sink.windows().len(), 3);
    let signals = sink.signals();
    assert_eq!(signals.len(), 1);
    assert!((signals[0].center_frequency - 87.6e6).abs() < 5_000.0);
    assert!(signals[0].bandwidth_hz > 0.0);
    assert!(signals[0].peak_margin_db >= 3.0);

    let metrics = scanner.metrics();
    assert_eq!(metrics.detections(), 1);
    assert_eq!(metrics.rejected_duplicates(), 2);
    assert_eq!(metrics.frames_processed(), 12);
    Ok(())
}

#[tokio::test]
async fn test_two_emitters_are_both_reported() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 87e6)
        .with_emitter(Emitter::new(87.3e6, 10_000.0, 25.0))
        .with_emitter(Emitter::new(87.7e6, 10_000.0, 25.0));
    let mut scanner = Scanner::new(params(87e6, 87.5e6));
    let mut sink = MemorySink::new();

    sweep(&receiver, &mut scanner, &mut sink).await?;

    let mut found: Vec<f64> = sink.signals().iter().map(|s| s.center_frequency).collect();
    found.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(found.len(), 2);
    assert!((found[0] - 87.3e6).abs() < 5_000.0);
    assert!((found[1] - 87.7e6).abs() < 5_000.0);
    Ok(())
}

#[tokio::test]
async fn test_center_artifact_is_never_reported() -> Result<()> {
    let receiver = SimulatedReceiver::new(2e6, 2000, 87e6).with_dc_spike(120.0);
    let mut scanner = Scanner::new(params(87e6, 87.5e6));
    let mut sink = MemorySink::new();

    sweep(&receiver, &mut scanner, &mut sink).await?;

    assert!(sink.signals().is_empty());
    assert_eq!(scanner.metrics().rejected_near_center(), 2);
    assert!(scanner.registry().is_empty());
    Ok(())
}

#[test]
fn test_wrong_frame_length_is_fatal() {
    let receiver = SimulatedReceiver::new(2e6, 2000, 87e6);
    let (_, mut tuner) = receiver.split();
    let mut scanner = Scanner::new(params(87e6, 88e6));
    let mut sink = MemorySink::new();

    let err = scanner
        .process_frame(&SpectralFrame::new(0, 0, vec![0.0; 1999]), &mut tuner, &mut sink)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScanError>(),
        Some(ScanError::FrameLength { expected: 2000, actual: 1999 })
    ));
}

#[test]
fn test_frames_from_before_a_retune_are_dropped() {
    let receiver = SimulatedReceiver::new(2e6, 2000, 87e6);
    let (_, mut tuner) = receiver.split();
    let mut scanner = Scanner::new(params(87e6, 88e6));
    let mut sink = MemorySink::new();

    let stale = SpectralFrame::new(0, 0, vec![-100.0; 2000]).with_tuned_frequency(86.5e6);
    let outcome = scanner.process_frame(&stale, &mut tuner, &mut sink).unwrap();
    assert_eq!(outcome, FrameOutcome::Stale);
    assert_eq!(scanner.accumulator().count(), 0);
    assert_eq!(scanner.metrics().stale_frames(), 1);

    let current = SpectralFrame::new(1, 1, vec![-100.0; 2000]).with_tuned_frequency(87e6);
    let outcome = scanner.process_frame(&current, &mut tuner, &mut sink).unwrap();
    assert_eq!(outcome, FrameOutcome::Accumulating);
    assert_eq!(scanner.accumulator().count(), 1);
}

#[test]
fn test_frames_follow_where_the_tuner_landed() {
    let receiver = SimulatedReceiver::new(2e6, 2000, 80e6);
    let (_, mut tuner) = receiver.split();
    let mut scanner = Scanner::new(params(87e6, 88e6));
    let mut sink = MemorySink::new();

    // the start frequency could not be reached, the device stayed at 80 MHz
    scanner.tuner_settled(80e6);

    let frame = SpectralFrame::new(0, 0, vec![-100.0; 2000]).with_tuned_frequency(80e6);
    let outcome = scanner.process_frame(&frame, &mut tuner, &mut sink).unwrap();
    assert_eq!(outcome, FrameOutcome::Accumulating);
    assert_eq!(scanner.metrics().stale_frames(), 0);
}
