use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one classifier stage, shared between its worker and observers
pub struct StageMetrics {
    stage_id: String,
    chunks_read: AtomicU64,
    samples_buffered: AtomicU64,
    decode_errors: AtomicU64,
    windows_classified: AtomicU64,
    events_emitted: AtomicU64,
    write_errors: AtomicU64,
    total_inference_us: AtomicU64,
}

impl StageMetrics {
    pub fn new(stage_id: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            chunks_read: AtomicU64::new(0),
            samples_buffered: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            windows_classified: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            total_inference_us: AtomicU64::new(0),
        }
    }

    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    pub fn chunks_read(&self) -> u64 {
        self.chunks_read.load(Ordering::Relaxed)
    }

    pub fn samples_buffered(&self) -> u64 {
        self.samples_buffered.load(Ordering::Relaxed)
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    pub fn windows_classified(&self) -> u64 {
        self.windows_classified.load(Ordering::Relaxed)
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.decode_errors() + self.write_errors()
    }

    pub fn record_chunk(&self, samples: usize) {
        self.chunks_read.fetch_add(1, Ordering::Relaxed);
        self.samples_buffered.fetch_add(samples as u64, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_inference(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_inference(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_inference_us.fetch_add(latency_us, Ordering::Relaxed);
        self.windows_classified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_inference_us(&self) -> u64 {
        let windows = self.windows_classified();
        if windows == 0 {
            return 0;
        }
        self.total_inference_us.load(Ordering::Relaxed) / windows
    }
}
