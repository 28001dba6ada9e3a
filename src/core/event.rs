use serde::{Deserialize, Serialize};

/// One ranked class for a classified window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "torchsig_class")]
    pub label: String,

    /// Softmax probability in [0, 1]
    pub confidence: f32,

    /// Demodulator mode the pipeline can switch to, if any
    pub mode: Option<String>,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32, mode: Option<&str>) -> Self {
        Self {
            label: label.into(),
            confidence,
            mode: mode.map(str::to_string),
        }
    }
}

/// Record emitted downstream for every window that produced at least one
/// prediction above the confidence threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,

    /// Tuned center frequency in Hz
    #[serde(rename = "freq")]
    pub frequency: i64,

    pub predictions: Vec<Prediction>,

    pub sample_rate: u32,
}

impl ClassificationEvent {
    /// Serialize as one newline-terminated JSON record
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Keep only the predictions at or above `threshold`, preserving rank order
pub fn filter_by_confidence(predictions: Vec<Prediction>, threshold: f32) -> Vec<Prediction> {
    predictions
        .into_iter()
        .filter(|p| p.confidence >= threshold)
        .collect()
}
