use crate::core::{Prediction, Sample};
use crate::error::ClassifierError;
use anyhow::Result;
use std::fmt;
use std::str::FromStr;

/// Compute device a model is bound to when it loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceSpec {
    #[default]
    Cpu,
    Cuda(usize),
    Mps,
}

impl FromStr for DeviceSpec {
    type Err = ClassifierError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "cpu" => Ok(DeviceSpec::Cpu),
            "mps" => Ok(DeviceSpec::Mps),
            "cuda" => Ok(DeviceSpec::Cuda(0)),
            _ => match s.strip_prefix("cuda:") {
                Some(ordinal) => ordinal.parse().map(DeviceSpec::Cuda).map_err(|_| {
                    ClassifierError::Configuration(format!("invalid CUDA ordinal in '{}'", s))
                }),
                None => Err(ClassifierError::Configuration(format!(
                    "unknown device '{}' (expected cpu, cuda, cuda:N or mps)",
                    s
                ))),
            },
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSpec::Cpu => write!(f, "cpu"),
            DeviceSpec::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
            DeviceSpec::Mps => write!(f, "mps"),
        }
    }
}

/// Two-channel (in-phase, quadrature) model input for one window
#[derive(Debug, Clone, PartialEq)]
pub struct IqTensor {
    pub in_phase: Vec<f32>,
    pub quadrature: Vec<f32>,
}

impl IqTensor {
    pub fn len(&self) -> usize {
        self.in_phase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_phase.is_empty()
    }
}

/// A loaded classification capability: one window in, one logit per class out
pub trait SignalModel: Send {
    /// Size of the logit vector returned by `forward`
    fn num_classes(&self) -> usize;

    fn forward(&mut self, input: &IqTensor) -> Result<Vec<f32>>;
}

/// Produces a `SignalModel` bound to a device. Loading may be slow.
pub trait ModelLoader: Send + Sync {
    /// Identifier used in logs (e.g. "efficientnet_b0-sig53")
    fn loader_id(&self) -> &str;

    /// Whether the runtime this loader depends on is present
    fn is_available(&self) -> bool {
        true
    }

    fn load(&self, device: &DeviceSpec) -> Result<Box<dyn SignalModel>>;
}

/// What a stage needs from the shared model: load once, classify windows.
///
/// Implemented by `ModelCache`; stages only see this trait.
pub trait WindowClassifier: Send + Sync {
    fn is_loaded(&self) -> bool;

    fn load(&self, device: &DeviceSpec) -> crate::error::Result<()>;

    /// Ranked predictions for one window; empty when nothing can be said
    fn classify(&self, window: &[Sample], top_k: usize) -> Vec<Prediction>;
}

/// Feature probe: true when the classifier's runtime dependency is present
pub fn is_available(loader: &dyn ModelLoader) -> bool {
    loader.is_available()
}
