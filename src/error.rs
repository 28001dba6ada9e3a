use thiserror::Error;

/// Failure kinds surfaced by the classifier stage and its model cache.
///
/// Only `Configuration` is fatal. Everything else is recovered by the stage
/// loop and shows up in logs and metrics.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to load classification model: {0}")]
    ModelLoad(String),

    #[error("malformed sample chunk: {0}")]
    Decode(String),

    #[error("downstream write failed: {0}")]
    Write(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("stage worker failed: {0}")]
    Worker(String),
}

impl ClassifierError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClassifierError::Configuration(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelLoad(_) => "model_load",
            Self::Decode(_) => "decode",
            Self::Write(_) => "write",
            Self::Configuration(_) => "configuration",
            Self::Inference(_) => "inference",
            Self::Worker(_) => "worker",
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
