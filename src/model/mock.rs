//! Deterministic model backends for tests and the demo binary.

use super::labels::LabelTable;
use super::traits::{DeviceSpec, IqTensor, ModelLoader, SignalModel};
use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Build logits whose softmax yields `probabilities` for the named labels.
///
/// Labels not listed share whatever probability mass is left over.
pub fn logits_for(labels: &LabelTable, probabilities: &[(&str, f32)]) -> Vec<f32> {
    let assigned: f32 = probabilities.iter().map(|(_, p)| p).sum();
    let others = labels.len().saturating_sub(probabilities.len()).max(1);
    let rest = ((1.0 - assigned) / others as f32).max(1e-6);

    let mut logits = vec![rest.ln(); labels.len()];
    for (label, p) in probabilities {
        if let Some(index) = labels.index_of(label) {
            logits[index] = p.max(1e-6).ln();
        }
    }
    logits
}

/// Returns the same logits for every window
pub struct FixedLogitsModel {
    logits: Vec<f32>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl FixedLogitsModel {
    pub fn new(logits: Vec<f32>) -> Self {
        Self {
            logits,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Simulate a slow forward pass
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl SignalModel for FixedLogitsModel {
    fn num_classes(&self) -> usize {
        self.logits.len()
    }

    fn forward(&mut self, input: &IqTensor) -> Result<Vec<f32>> {
        if input.in_phase.len() != input.quadrature.len() {
            return Err(anyhow!(
                "channel length mismatch: {} I vs {} Q",
                input.in_phase.len(),
                input.quadrature.len()
            ));
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        Ok(self.logits.clone())
    }
}

/// Model whose forward pass always fails
pub struct BrokenModel {
    num_classes: usize,
}

impl BrokenModel {
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }
}

impl SignalModel for BrokenModel {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn forward(&mut self, _input: &IqTensor) -> Result<Vec<f32>> {
        Err(anyhow!("simulated inference failure"))
    }
}

/// Loader producing `FixedLogitsModel`s.
///
/// Counts how many times `load` ran and can fail a configurable number of
/// times before succeeding.
pub struct StaticLoader {
    logits: Vec<f32>,
    load_delay: Duration,
    failures_left: AtomicUsize,
    loads: Arc<AtomicUsize>,
    inference_calls: Arc<AtomicUsize>,
}

impl StaticLoader {
    pub fn new(logits: Vec<f32>) -> Self {
        Self {
            logits,
            load_delay: Duration::ZERO,
            failures_left: AtomicUsize::new(0),
            loads: Arc::new(AtomicUsize::new(0)),
            inference_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Loader whose model puts `probability` on `label`
    pub fn favoring(labels: &LabelTable, label: &str, probability: f32) -> Self {
        Self::new(logits_for(labels, &[(label, probability)]))
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Fail the first `count` load attempts
    pub fn failing_first(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::Relaxed);
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Forward passes across every model this loader has produced
    pub fn inference_count(&self) -> usize {
        self.inference_calls.load(Ordering::Relaxed)
    }
}

impl ModelLoader for StaticLoader {
    fn loader_id(&self) -> &str {
        "static-logits"
    }

    fn load(&self, device: &DeviceSpec) -> Result<Box<dyn SignalModel>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        if !self.load_delay.is_zero() {
            thread::sleep(self.load_delay);
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(anyhow!("simulated weight download failure on {}", device));
        }

        let mut model = FixedLogitsModel::new(self.logits.clone());
        model.calls = self.inference_calls.clone();
        Ok(Box::new(model))
    }
}

/// Loader whose runtime is never present
pub struct UnavailableLoader;

impl ModelLoader for UnavailableLoader {
    fn loader_id(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn load(&self, _device: &DeviceSpec) -> Result<Box<dyn SignalModel>> {
        Err(anyhow!("classifier runtime is not installed"))
    }
}

/// Loader handing out a model whose inference always fails
pub struct BrokenModelLoader {
    num_classes: usize,
}

impl BrokenModelLoader {
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }
}

impl ModelLoader for BrokenModelLoader {
    fn loader_id(&self) -> &str {
        "broken-model"
    }

    fn load(&self, _device: &DeviceSpec) -> Result<Box<dyn SignalModel>> {
        Ok(Box::new(BrokenModel::new(self.num_classes)))
    }
}
