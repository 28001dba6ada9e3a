use super::labels::LabelTable;
use super::traits::{DeviceSpec, IqTensor, ModelLoader, SignalModel, WindowClassifier};
use crate::core::{Prediction, Sample};
use crate::error::{ClassifierError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Instant;
use tracing::{debug, error, info};

static GLOBAL_CACHE: OnceLock<Arc<ModelCache>> = OnceLock::new();

/// Lifecycle of the shared model handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loaded { device: DeviceSpec },
    /// Last load attempt failed; the next `load()` call retries
    Failed { error: String },
}

impl ModelState {
    pub fn name(&self) -> &str {
        match self {
            Self::Unloaded => "Unloaded",
            Self::Loaded { .. } => "Loaded",
            Self::Failed { .. } => "Failed",
        }
    }
}

/// Shared, load-once handle to the classification model.
///
/// One instance is built at startup and handed to every stage as an
/// `Arc<ModelCache>`. Loading and inference are serialized internally, so the
/// wrapped model never sees concurrent calls.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    labels: LabelTable,
    load_lock: Mutex<()>,
    model: Mutex<Option<Box<dyn SignalModel>>>,
    state: Mutex<ModelState>,
    loaded: AtomicBool,
    load_attempts: AtomicU64,
}

impl ModelCache {
    /// Build a cache for `loader`, rejecting an inconsistent label table up front
    pub fn new(loader: Arc<dyn ModelLoader>, labels: LabelTable) -> Result<Self> {
        labels.validate()?;
        Ok(Self::build(loader, labels))
    }

    /// Cache over the built-in Sig53 vocabulary
    pub fn sig53(loader: Arc<dyn ModelLoader>) -> Self {
        Self::build(loader, LabelTable::sig53())
    }

    fn build(loader: Arc<dyn ModelLoader>, labels: LabelTable) -> Self {
        Self {
            loader,
            labels,
            load_lock: Mutex::new(()),
            model: Mutex::new(None),
            state: Mutex::new(ModelState::Unloaded),
            loaded: AtomicBool::new(false),
            load_attempts: AtomicU64::new(0),
        }
    }

    /// Process-wide handle, created by the first caller.
    ///
    /// Later callers get the same instance; their `loader` is ignored.
    pub fn acquire(loader: Arc<dyn ModelLoader>) -> Arc<ModelCache> {
        GLOBAL_CACHE
            .get_or_init(|| Arc::new(Self::sig53(loader)))
            .clone()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn loader_id(&self) -> &str {
        self.loader.loader_id()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ModelState {
        lock(&self.state).clone()
    }

    pub fn last_error(&self) -> Option<String> {
        match &*lock(&self.state) {
            ModelState::Failed { error } => Some(error.clone()),
            _ => None,
        }
    }

    /// Number of load attempts that actually ran the loader
    pub fn load_attempts(&self) -> u64 {
        self.load_attempts.load(Ordering::Relaxed)
    }

    /// Load the model onto `device` unless it is already loaded.
    ///
    /// Concurrent callers are serialized; only the first one runs the loader and
    /// the others return once it finishes. A failure leaves the cache retryable.
    pub fn load(&self, device: &DeviceSpec) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let _guard = lock(&self.load_lock);
        if self.is_loaded() {
            return Ok(());
        }

        self.load_attempts.fetch_add(1, Ordering::Relaxed);
        info!(loader = self.loader.loader_id(), %device, "loading classification model");
        let start = Instant::now();

        match self.try_load(device) {
            Ok(model) => {
                *lock(&self.model) = Some(model);
                *lock(&self.state) = ModelState::Loaded { device: *device };
                self.loaded.store(true, Ordering::Release);
                info!(
                    loader = self.loader.loader_id(),
                    %device,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "classification model loaded"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    loader = self.loader.loader_id(),
                    %device,
                    attempt = self.load_attempts(),
                    "failed to load classification model: {}",
                    e
                );
                *lock(&self.state) = ModelState::Failed {
                    error: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn try_load(&self, device: &DeviceSpec) -> Result<Box<dyn SignalModel>> {
        if !self.loader.is_available() {
            return Err(ClassifierError::ModelLoad(format!(
                "runtime for '{}' is not available",
                self.loader.loader_id()
            )));
        }

        let model = self
            .loader
            .load(device)
            .map_err(|e| ClassifierError::ModelLoad(format!("{:#}", e)))?;

        self.labels.validate_against(model.num_classes())?;
        Ok(model)
    }

    /// Classify one window, returning at most `top_k` predictions ranked by
    /// confidence.
    ///
    /// Returns an empty list when the model is not loaded or inference fails;
    /// failures are logged. Use `try_classify` to observe the error.
    pub fn classify(&self, window: &[Sample], top_k: usize) -> Vec<Prediction> {
        match self.try_classify(window, top_k) {
            Ok(predictions) => predictions,
            Err(e) => {
                error!(window_len = window.len(), "classification error: {}", e);
                Vec::new()
            }
        }
    }

    pub fn try_classify(&self, window: &[Sample], top_k: usize) -> Result<Vec<Prediction>> {
        if !self.is_loaded() || window.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let input = prepare_input(window);

        let logits = {
            let mut guard = lock(&self.model);
            let model = guard
                .as_mut()
                .ok_or_else(|| ClassifierError::Inference("model handle is empty".to_string()))?;
            model
                .forward(&input)
                .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?
        };

        if logits.len() != self.labels.len() {
            return Err(ClassifierError::Inference(format!(
                "model returned {} logits for a vocabulary of {}",
                logits.len(),
                self.labels.len()
            )));
        }

        let probabilities = softmax(&logits)?;
        let mut ranked: Vec<usize> = (0..probabilities.len()).collect();
        ranked.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
        ranked.truncate(top_k.min(self.labels.len()));

        let mut predictions = Vec::with_capacity(ranked.len());
        for index in ranked {
            let label = self.labels.label_of(index)?;
            predictions.push(Prediction::new(
                label,
                probabilities[index],
                self.labels.mode_of(label),
            ));
        }

        debug!(top = ?predictions.first().map(|p| &p.label), "window classified");
        Ok(predictions)
    }
}

impl WindowClassifier for ModelCache {
    fn is_loaded(&self) -> bool {
        ModelCache::is_loaded(self)
    }

    fn load(&self, device: &DeviceSpec) -> Result<()> {
        ModelCache::load(self, device)
    }

    fn classify(&self, window: &[Sample], top_k: usize) -> Vec<Prediction> {
        ModelCache::classify(self, window, top_k)
    }
}

/// Scale the window by its peak magnitude and split it into I and Q channels.
///
/// An all-zero window is passed through unscaled.
pub fn prepare_input(window: &[Sample]) -> IqTensor {
    let peak = window.iter().map(Sample::magnitude).fold(0.0f32, f32::max);
    let scale = if peak > 0.0 { 1.0 / peak } else { 1.0 };

    IqTensor {
        in_phase: window.iter().map(|s| s.i * scale).collect(),
        quadrature: window.iter().map(|s| s.q * scale).collect(),
    }
}

/// Numerically stable softmax; non-finite logits are an inference error
pub fn softmax(logits: &[f32]) -> Result<Vec<f32>> {
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(ClassifierError::Inference(
            "model produced non-finite logits".to_string(),
        ));
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    Ok(exps.into_iter().map(|e| (e / sum).clamp(0.0, 1.0)).collect())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]).unwrap();
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits_stay_finite() {
        let probs = softmax(&[1000.0, 999.0]).unwrap();
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_softmax_rejects_nan() {
        assert!(softmax(&[0.0, f32::NAN]).is_err());
    }

    #[test]
    fn test_prepare_input_scales_by_peak() {
        let window = [Sample::new(3.0, 4.0), Sample::new(-1.0, 0.0)];
        let input = prepare_input(&window);
        assert!((input.in_phase[0] - 0.6).abs() < 1e-6);
        assert!((input.quadrature[0] - 0.8).abs() < 1e-6);
        assert!((input.in_phase[1] + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_prepare_input_zero_window() {
        let window = vec![Sample::default(); 16];
        let input = prepare_input(&window);
        assert_eq!(input.len(), 16);
        assert!(input.in_phase.iter().all(|v| *v == 0.0));
        assert!(input.quadrature.iter().all(|v| *v == 0.0));
    }
}
