use crate::core::SpectralFrame;
use crate::hal::{DeviceState, Emitter, FrameSource, Tuner, TuningGap};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{sleep, Duration};

const DEFAULT_NOISE_FLOOR_DB: f64 = -60.0;

struct ReceiverState {
    center_frequency: f64,
    sample_rate: f64,
    vector_length: usize,
    emitters: Vec<Emitter>,
    gaps: Vec<TuningGap>,
    noise_floor_db: f64,
    noise_jitter_db: f64,
    dc_spike_db: Option<f64>,
    rng: StdRng,
    frame_counter: u64,
    max_frames: Option<u64>,
    realtime: bool,
    tune_requests: Vec<f64>,
}

impl ReceiverState {
    fn generate_frame(&mut self) -> SpectralFrame {
        let n = self.vector_length;
        let half = n / 2;
        let sample_width = self.sample_rate / n as f64;
        let mut bins = vec![0.0f32; n];

        for j in 0..n {
            let frequency = self.center_frequency + j as f64 * sample_width - self.sample_rate / 2.0;

            let mut floor_db = self.noise_floor_db;
            if self.noise_jitter_db > 0.0 {
                floor_db += self.rng.random_range(-self.noise_jitter_db..=self.noise_jitter_db);
            }
            let mut linear = db_to_linear(floor_db);

            for emitter in &self.emitters {
                if emitter.covers(frequency) {
                    linear += db_to_linear(self.noise_floor_db + emitter.power_db);
                }
            }
            if j == half {
                if let Some(spike) = self.dc_spike_db {
                    linear += db_to_linear(self.noise_floor_db + spike);
                }
            }

            // frequency order back to transform order
            bins[(j + half) % n] = linear as f32;
        }

        let timestamp =
            (self.frame_counter as f64 * n as f64 * 1_000_000.0 / self.sample_rate) as u64;
        let frame = SpectralFrame::new(timestamp, self.frame_counter, bins)
            .with_tuned_frequency(self.center_frequency);
        self.frame_counter += 1;
        frame
    }

    fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(self.vector_length as f64 / self.sample_rate)
    }
}

fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

fn lock(shared: &Mutex<ReceiverState>) -> MutexGuard<'_, ReceiverState> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Software stand-in for a tunable SDR front end.
///
/// Produces linear power spectra for a fixed set of emitters around whatever
/// frequency it is tuned to. Frequencies inside a [`TuningGap`] cannot be
/// reached: the tuner stays where it was and reports that frequency back.
pub struct SimulatedReceiver {
    shared: Arc<Mutex<ReceiverState>>,
}

impl SimulatedReceiver {
    pub fn new(sample_rate: f64, vector_length: usize, center_frequency: f64) -> Self {
        Self {
            shared: Arc::new(Mutex::new(ReceiverState {
                center_frequency,
                sample_rate,
                vector_length,
                emitters: Vec::new(),
                gaps: Vec::new(),
                noise_floor_db: DEFAULT_NOISE_FLOOR_DB,
                noise_jitter_db: 0.0,
                dc_spike_db: None,
                rng: StdRng::seed_from_u64(0),
                frame_counter: 0,
                max_frames: None,
                realtime: false,
                tune_requests: Vec::new(),
            })),
        }
    }

    pub fn with_emitter(self, emitter: Emitter) -> Self {
        lock(&self.shared).emitters.push(emitter);
        self
    }

    pub fn with_gap(self, gap: TuningGap) -> Self {
        lock(&self.shared).gaps.push(gap);
        self
    }

    /// Noise floor in dB with a uniform jitter of `jitter_db` either side.
    pub fn with_noise(self, floor_db: f64, jitter_db: f64) -> Self {
        {
            let mut state = lock(&self.shared);
            state.noise_floor_db = floor_db;
            state.noise_jitter_db = jitter_db.abs();
        }
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        lock(&self.shared).rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Adds the local-oscillator artifact at the tuned center, `spike_db` above the floor.
    pub fn with_dc_spike(self, spike_db: f64) -> Self {
        lock(&self.shared).dc_spike_db = Some(spike_db);
        self
    }

    /// Ends the frame stream after `max_frames` frames.
    pub fn with_frame_limit(self, max_frames: u64) -> Self {
        lock(&self.shared).max_frames = Some(max_frames);
        self
    }

    /// Paces frames at the rate real hardware would deliver them.
    pub fn with_realtime(self, realtime: bool) -> Self {
        lock(&self.shared).realtime = realtime;
        self
    }

    pub fn center_frequency(&self) -> f64 {
        lock(&self.shared).center_frequency
    }

    /// Every frequency the tuner has been asked for, in order.
    pub fn tune_requests(&self) -> Vec<f64> {
        lock(&self.shared).tune_requests.clone()
    }

    pub fn frames_generated(&self) -> u64 {
        lock(&self.shared).frame_counter
    }

    /// Splits the device into its streaming half and its tuning half.
    ///
    /// Both halves share one device state, so a retune shows up in the next
    /// generated frame.
    pub fn split(&self) -> (SimulatedFrameSource, SimulatedTuner) {
        (
            SimulatedFrameSource {
                shared: self.shared.clone(),
                state: DeviceState::Unopened,
            },
            SimulatedTuner {
                shared: self.shared.clone(),
            },
        )
    }
}

impl Clone for SimulatedReceiver {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

pub struct SimulatedFrameSource {
    shared: Arc<Mutex<ReceiverState>>,
    state: DeviceState,
}

#[async_trait]
impl FrameSource for SimulatedFrameSource {
    async fn open(&mut self) -> Result<()> {
        if self.state != DeviceState::Unopened {
            return Err(anyhow!("Cannot open device in state {:?}", self.state));
        }
        self.state = DeviceState::Opened;
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if self.state != DeviceState::Opened && self.state != DeviceState::Stopped {
            return Err(anyhow!("Cannot start device in state {:?}", self.state));
        }
        self.state = DeviceState::Running;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<SpectralFrame>> {
        if self.state != DeviceState::Running {
            return Err(anyhow!("Device not running"));
        }

        let (frame, pace) = {
            let mut state = lock(&self.shared);
            if let Some(max) = state.max_frames {
                if state.frame_counter >= max {
                    return Ok(None);
                }
            }
            let pace = state.realtime.then(|| state.frame_duration());
            (state.generate_frame(), pace)
        };

        if let Some(duration) = pace {
            sleep(duration).await;
        }

        Ok(Some(frame))
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state == DeviceState::Running {
            self.state = DeviceState::Stopped;
        }
        Ok(())
    }

    fn state(&self) -> DeviceState {
        self.state
    }
}

pub struct SimulatedTuner {
    shared: Arc<Mutex<ReceiverState>>,
}

impl Tuner for SimulatedTuner {
    fn set_center_frequency(&mut self, requested_hz: f64) -> Result<f64> {
        let mut state = lock(&self.shared);
        state.tune_requests.push(requested_hz);

        if state.gaps.iter().any(|gap| gap.contains(requested_hz)) {
            return Ok(state.center_frequency);
        }

        state.center_frequency = requested_hz;
        Ok(requested_hz)
    }
}
