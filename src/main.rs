use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use time::UtcOffset;
use tracing::info;

use bandsweep::config::ScanConfig;
use bandsweep::engine::ScanKernel;
use bandsweep::hal::mock::SimulatedReceiver;
use bandsweep::hal::{Emitter, TuningGap};
use bandsweep::logging;
use bandsweep::report::{ConsoleSink, CsvLog, Fanout};

/// Sweeps a receiver across a frequency range and reports narrowband signals.
///
/// Frames come from the built-in simulated receiver; place emitters and
/// untunable gaps with --emitter and --gap.
#[derive(Parser, Debug)]
#[command(name = "bandsweep", version, about)]
struct Cli {
    /// Base configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Average over COUNT frames
    #[arg(short = 'a', long = "average", value_name = "COUNT")]
    average: Option<usize>,

    /// Bandwidth of the fine window in kHz
    #[arg(short = 'f', long = "fine-bandwidth", value_name = "FREQ")]
    fine_bandwidth: Option<f64>,

    /// Bandwidth of the coarse window in kHz
    #[arg(short = 'c', long = "coarse-bandwidth", value_name = "FREQ")]
    coarse_bandwidth: Option<f64>,

    /// Minimum frequency between detected signals in kHz
    #[arg(short = 's', long = "spread", value_name = "FREQ")]
    spread: Option<f64>,

    /// Threshold for the difference between the coarse and fine filtered signals in dB
    #[arg(short = 't', long = "threshold", value_name = "POWER", allow_hyphen_values = true)]
    threshold: Option<f64>,

    /// Start frequency in MHz
    #[arg(short = 'x', long = "start-frequency", value_name = "FREQ")]
    start_frequency: Option<f64>,

    /// End frequency in MHz
    #[arg(short = 'y', long = "end-frequency", value_name = "FREQ")]
    end_frequency: Option<f64>,

    /// Sample rate in Msamples/s
    #[arg(short = 'r', long = "sample-rate", value_name = "RATE")]
    sample_rate: Option<f64>,

    /// Width of FFT bins in Hz
    #[arg(short = 'w', long = "fft-width", value_name = "COUNT")]
    fft_width: Option<f64>,

    /// Increment step in MHz
    #[arg(short = 'z', long = "step", value_name = "FREQ")]
    step: Option<f64>,

    /// Time in seconds to scan on each frequency
    #[arg(short = 'p', long = "time", value_name = "TIME")]
    time: Option<f64>,

    /// Append detections to this CSV file
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    output: Option<PathBuf>,

    /// Simulated emitter as MHZ[:KHZ[:DB]] (center, width, power above floor)
    #[arg(long = "emitter", value_name = "SPEC", value_parser = parse_emitter)]
    emitters: Vec<Emitter>,

    /// Untunable range as START_MHZ:END_MHZ
    #[arg(long = "gap", value_name = "RANGE", value_parser = parse_gap)]
    gaps: Vec<TuningGap>,

    /// Simulated noise floor in dB
    #[arg(long, default_value_t = -60.0, allow_hyphen_values = true)]
    noise_db: f64,

    /// Uniform noise jitter either side of the floor in dB
    #[arg(long, default_value_t = 1.0)]
    jitter_db: f64,

    /// Seed for the simulated noise
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Deliver simulated frames at the real sample rate
    #[arg(long)]
    realtime: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };

        if let Some(v) = self.average {
            config.average_size = v;
        }
        if let Some(v) = self.fine_bandwidth {
            config.fine_bandwidth = v * 1000.0;
        }
        if let Some(v) = self.coarse_bandwidth {
            config.coarse_bandwidth = Some(v * 1000.0);
        }
        if let Some(v) = self.spread {
            config.spread = v * 1000.0;
        }
        if let Some(v) = self.threshold {
            config.threshold = v;
        }
        if let Some(v) = self.start_frequency {
            config.start_frequency = v * 1_000_000.0;
        }
        if let Some(v) = self.end_frequency {
            config.end_frequency = v * 1_000_000.0;
        }
        if let Some(v) = self.sample_rate {
            config.sample_rate = v * 1_000_000.0;
        }
        if let Some(v) = self.fft_width {
            config.fft_width = v;
        }
        if let Some(v) = self.step {
            config.step = Some(v * 1_000_000.0);
        }
        if let Some(v) = self.time {
            config.dwell_seconds = v;
        }
        if let Some(path) = &self.output {
            config.csv_path = Some(path.clone());
        }

        Ok(config)
    }
}

fn parse_emitter(spec: &str) -> Result<Emitter, String> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(format!("expected MHZ[:KHZ[:DB]], got '{}'", spec));
    }
    let number = |s: &str| s.trim().parse::<f64>().map_err(|e| format!("'{}': {}", s, e));

    let mhz = number(parts[0])?;
    let khz = parts.get(1).map(|s| number(s)).transpose()?.unwrap_or(10.0);
    let db = parts.get(2).map(|s| number(s)).transpose()?.unwrap_or(20.0);
    Ok(Emitter::new(mhz * 1_000_000.0, khz * 1000.0, db))
}

fn parse_gap(spec: &str) -> Result<TuningGap, String> {
    let (start, end) = spec
        .split_once(':')
        .ok_or_else(|| format!("expected START_MHZ:END_MHZ, got '{}'", spec))?;
    let start: f64 = start.trim().parse().map_err(|e| format!("'{}': {}", start, e))?;
    let end: f64 = end.trim().parse().map_err(|e| format!("'{}': {}", end, e))?;
    if end < start {
        return Err(format!("gap end {} is below start {}", end, start));
    }
    Ok(TuningGap::new(start * 1_000_000.0, end * 1_000_000.0))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // must be read while the process is still single-threaded
    let offset = logging::local_offset();
    logging::init(&cli.log_level, offset)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?
        .block_on(run(cli, offset))
}

async fn run(cli: Cli, offset: UtcOffset) -> Result<()> {
    let config = cli.scan_config()?;
    let params = config.resolve()?;

    let mut sinks = Fanout::new().with(ConsoleSink::stdio());
    if let Some(path) = &config.csv_path {
        sinks = sinks.with(CsvLog::open(path)?);
    }

    let mut receiver = SimulatedReceiver::new(
        params.sample_rate,
        params.vector_length,
        params.start_frequency,
    )
    .with_noise(cli.noise_db, cli.jitter_db)
    .with_seed(cli.seed)
    .with_realtime(cli.realtime);
    for emitter in &cli.emitters {
        receiver = receiver.with_emitter(*emitter);
    }
    for gap in &cli.gaps {
        receiver = receiver.with_gap(*gap);
    }
    let (source, tuner) = receiver.split();

    let mut kernel = ScanKernel::new(params, Box::new(source), Box::new(tuner), Box::new(sinks))
        .with_utc_offset(offset);
    let monitor = kernel.monitor();

    kernel.start().await?;
    let summary = tokio::select! {
        result = kernel.wait() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, draining");
            kernel.shutdown().await?
        }
    };

    info!("{}", monitor.generate_report().trim_end());
    if !summary.completed {
        return Err(anyhow!(
            "Scan stopped at {:.6} MHz before reaching the end frequency",
            summary.final_frequency / 1_000_000.0
        ));
    }
    Ok(())
}
