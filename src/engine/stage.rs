use super::clock::{Clock, SystemClock};
use super::io::{EventWriter, SampleReader};
use super::state::StageState;
use crate::buffers::SampleBuffer;
use crate::config::ClassifierConfig;
use crate::core::{decode_iq, filter_by_confidence, ClassificationEvent};
use crate::error::{ClassifierError, Result};
use crate::model::{DeviceSpec, WindowClassifier};
use crate::observability::StageMetrics;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Tuned center frequency, settable from any thread while the stage runs
#[derive(Debug, Clone, Default)]
pub struct FrequencyControl(Arc<AtomicI64>);

impl FrequencyControl {
    pub fn set(&self, hz: i64) {
        self.0.store(hz, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Summary returned when a stage's worker exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub windows_classified: u64,
    pub events_emitted: u64,
    /// Buffered samples dropped at shutdown without being classified
    pub discarded_samples: usize,
}

/// Streaming window classifier.
///
/// Buffers decoded I/Q samples, cuts non-overlapping fixed-size windows from
/// the head of the buffer, and classifies one whenever a full window is
/// available and the configured interval has passed since the previous one.
/// Predictions above the threshold are written downstream as JSON lines.
pub struct ClassifierStage {
    id: String,
    config: ClassifierConfig,
    device: DeviceSpec,
    window_size: usize,
    interval: Duration,
    classifier: Arc<dyn WindowClassifier>,
    clock: Arc<dyn Clock>,
    frequency: FrequencyControl,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<StageState>>,
    metrics: Arc<StageMetrics>,
}

impl ClassifierStage {
    pub fn new(
        id: impl Into<String>,
        config: ClassifierConfig,
        classifier: Arc<dyn WindowClassifier>,
    ) -> Result<Self> {
        config.validate()?;
        let id = id.into();

        Ok(Self {
            device: config.device_spec()?,
            window_size: config.window_size(),
            interval: config.interval_duration(),
            metrics: Arc::new(StageMetrics::new(id.clone())),
            id,
            config,
            classifier,
            clock: Arc::new(SystemClock),
            frequency: FrequencyControl::default(),
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(StageState::NotStarted)),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn metrics(&self) -> Arc<StageMetrics> {
        self.metrics.clone()
    }

    pub fn state(&self) -> StageState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_dial_frequency(&self, hz: i64) {
        self.frequency.set(hz);
    }

    pub fn frequency_control(&self) -> FrequencyControl {
        self.frequency.clone()
    }

    /// Spawn the stage's dedicated worker thread
    pub fn start(
        self,
        reader: Box<dyn SampleReader>,
        writer: Box<dyn EventWriter>,
    ) -> Result<StageHandle> {
        let running = self.running.clone();
        let state = self.state.clone();
        let frequency = self.frequency.clone();
        let metrics = self.metrics.clone();

        // Armed before spawning so an immediate stop() is not lost
        running.store(true, Ordering::SeqCst);

        let join = thread::Builder::new()
            .name(format!("classifier-{}", self.id))
            .spawn(move || self.run_loop(reader, writer))
            .map_err(|e| {
                ClassifierError::Worker(format!("failed to spawn stage worker: {}", e))
            })?;

        Ok(StageHandle {
            join,
            running,
            state,
            frequency,
            metrics,
        })
    }

    /// Run the stage loop on the calling thread until end of stream
    pub fn run(
        self,
        reader: Box<dyn SampleReader>,
        writer: Box<dyn EventWriter>,
    ) -> Result<StageReport> {
        self.running.store(true, Ordering::SeqCst);
        self.run_loop(reader, writer)
    }

    fn run_loop(
        self,
        mut reader: Box<dyn SampleReader>,
        mut writer: Box<dyn EventWriter>,
    ) -> Result<StageReport> {
        self.transition_to(StageState::Running)?;

        info!(
            stage = %self.id,
            sample_rate = self.config.sample_rate,
            interval_s = self.config.interval,
            window = self.window_size,
            "classifier stage starting"
        );

        if !self.classifier.is_loaded() {
            if let Err(e) = self.classifier.load(&self.device) {
                if e.is_fatal() {
                    error!(stage = %self.id, "classifier stage cannot start: {}", e);
                    self.finish();
                    return Err(e);
                }
                warn!(
                    stage = %self.id,
                    "model unavailable, stage will emit nothing until a load succeeds: {}",
                    e
                );
            }
        }

        let mut buffer = SampleBuffer::new(self.config.buffer_warn_threshold());
        let mut last_classification: Option<Instant> = None;

        while self.running.load(Ordering::SeqCst) {
            let chunk = match reader.read() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    warn!(stage = %self.id, "upstream read failed, stopping: {}", e);
                    break;
                }
            };

            let samples = match decode_iq(&chunk) {
                Ok(samples) => samples,
                Err(e) => {
                    self.metrics.record_decode_error();
                    error!(stage = %self.id, bytes = chunk.len(), "error reading samples: {}", e);
                    continue;
                }
            };

            self.metrics.record_chunk(samples.len());
            if buffer.extend(samples) {
                warn!(
                    stage = %self.id,
                    buffered = buffer.len(),
                    window = self.window_size,
                    "sample buffer is growing faster than it is classified"
                );
            }

            let now = self.clock.now();
            if !self.gate_open(buffer.len(), last_classification, now) {
                continue;
            }
            last_classification = Some(now);

            let Some(window) = buffer.take_window(self.window_size) else {
                continue;
            };

            let start = self.metrics.start_inference();
            let predictions = self.classifier.classify(&window, self.config.top_k);
            self.metrics.finish_inference(start);

            let predictions = filter_by_confidence(predictions, self.config.threshold);
            if predictions.is_empty() {
                continue;
            }

            let event = ClassificationEvent {
                timestamp: self.clock.epoch_millis(),
                frequency: self.frequency.get(),
                predictions,
                sample_rate: self.config.sample_rate,
            };

            match emit(writer.as_mut(), &event) {
                Ok(()) => self.metrics.record_event_emitted(),
                Err(e) => {
                    self.metrics.record_write_error();
                    error!(stage = %self.id, "error writing output: {}", e);
                }
            }
        }

        let discarded_samples = buffer.clear();
        self.finish();

        info!(
            stage = %self.id,
            windows = self.metrics.windows_classified(),
            events = self.metrics.events_emitted(),
            discarded = discarded_samples,
            "classifier stage exiting"
        );

        Ok(StageReport {
            windows_classified: self.metrics.windows_classified(),
            events_emitted: self.metrics.events_emitted(),
            discarded_samples,
        })
    }

    /// Classify only with a full window buffered and the interval elapsed
    fn gate_open(&self, buffered: usize, last: Option<Instant>, now: Instant) -> bool {
        if buffered < self.window_size {
            return false;
        }
        match last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    fn transition_to(&self, target: StageState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if !state.can_transition_to(&target) {
            return Err(ClassifierError::Worker(format!(
                "invalid stage transition: {} -> {}",
                state.name(),
                target.name()
            )));
        }
        *state = target;
        Ok(())
    }

    fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = StageState::Stopped;
    }
}

fn emit(writer: &mut dyn EventWriter, event: &ClassificationEvent) -> Result<()> {
    let line = event
        .to_json_line()
        .map_err(|e| ClassifierError::Write(format!("failed to serialize event: {}", e)))?;
    writer
        .write(line.as_bytes())
        .map_err(|e| ClassifierError::Write(e.to_string()))
}

/// Control handle for a stage running on its own thread
pub struct StageHandle {
    join: JoinHandle<Result<StageReport>>,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<StageState>>,
    frequency: FrequencyControl,
    metrics: Arc<StageMetrics>,
}

impl StageHandle {
    /// Ask the worker to exit. Takes effect once its current blocking read or
    /// write returns.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn state(&self) -> StageState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn set_dial_frequency(&self, hz: i64) {
        self.frequency.set(hz);
    }

    pub fn frequency_control(&self) -> FrequencyControl {
        self.frequency.clone()
    }

    pub fn metrics(&self) -> Arc<StageMetrics> {
        self.metrics.clone()
    }

    /// Wait for the worker to exit
    pub fn join(self) -> Result<StageReport> {
        self.join.join().map_err(|_| {
            ClassifierError::Worker("classifier stage worker panicked".to_string())
        })?
    }
}
