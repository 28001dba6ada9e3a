use crate::error::{ClassifierError, Result};
use crate::model::DeviceSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Settings keys the classifier reads from the flat application settings
pub const SETTINGS_ENABLED: &str = "signal_classifier_enabled";
pub const SETTINGS_THRESHOLD: &str = "signal_classifier_threshold";
pub const SETTINGS_INTERVAL: &str = "signal_classifier_interval";
pub const SETTINGS_DEVICE: &str = "signal_classifier_device";

/// Windows of backlog after which the stage starts warning about buffer growth
const DEFAULT_WARN_WINDOWS: usize = 10;

/// Typed configuration for one classifier stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,

    /// Minimum confidence for a prediction to be emitted
    pub threshold: f32,

    /// Seconds of signal per window, and minimum seconds between classifications
    pub interval: f64,

    pub device: String,

    pub sample_rate: u32,

    pub top_k: usize,

    /// Buffered samples above which a growth warning is logged.
    /// Defaults to ten windows.
    pub buffer_warn_samples: Option<usize>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.5,
            interval: 1.0,
            device: "cpu".to_string(),
            sample_rate: 48000,
            top_k: 3,
            buffer_warn_samples: None,
        }
    }
}

impl ClassifierConfig {
    pub fn new(sample_rate: u32, interval: f64, threshold: f32) -> Self {
        Self {
            sample_rate,
            interval,
            threshold,
            ..Self::default()
        }
    }

    /// Read the `signal_classifier_*` keys from a flat settings object.
    /// Missing keys keep their defaults.
    pub fn from_settings(settings: &Value) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = settings.get(SETTINGS_ENABLED) {
            config.enabled = v.as_bool().ok_or_else(|| wrong_type(SETTINGS_ENABLED, "a bool"))?;
        }
        if let Some(v) = settings.get(SETTINGS_THRESHOLD) {
            config.threshold =
                v.as_f64().ok_or_else(|| wrong_type(SETTINGS_THRESHOLD, "a number"))? as f32;
        }
        if let Some(v) = settings.get(SETTINGS_INTERVAL) {
            config.interval = v.as_f64().ok_or_else(|| wrong_type(SETTINGS_INTERVAL, "a number"))?;
        }
        if let Some(v) = settings.get(SETTINGS_DEVICE) {
            config.device = v
                .as_str()
                .ok_or_else(|| wrong_type(SETTINGS_DEVICE, "a string"))?
                .to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ClassifierError::Configuration(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        if !self.interval.is_finite() || self.interval <= 0.0 {
            return Err(ClassifierError::Configuration(format!(
                "interval must be a positive number of seconds, got {}",
                self.interval
            )));
        }
        Duration::try_from_secs_f64(self.interval).map_err(|e| {
            ClassifierError::Configuration(format!("interval {} s: {}", self.interval, e))
        })?;
        if self.sample_rate as f64 * self.interval >= usize::MAX as f64 {
            return Err(ClassifierError::Configuration(format!(
                "{} Hz x {} s window does not fit in memory",
                self.sample_rate, self.interval
            )));
        }
        if self.sample_rate == 0 {
            return Err(ClassifierError::Configuration(
                "sample rate must be non-zero".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(ClassifierError::Configuration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.window_size() == 0 {
            return Err(ClassifierError::Configuration(format!(
                "{} Hz x {} s gives an empty window",
                self.sample_rate, self.interval
            )));
        }
        self.device_spec()?;
        Ok(())
    }

    /// Samples per classification window
    pub fn window_size(&self) -> usize {
        (self.sample_rate as f64 * self.interval) as usize
    }

    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    pub fn device_spec(&self) -> Result<DeviceSpec> {
        self.device.parse()
    }

    pub fn buffer_warn_threshold(&self) -> usize {
        self.buffer_warn_samples
            .unwrap_or_else(|| self.window_size().saturating_mul(DEFAULT_WARN_WINDOWS))
    }
}

fn wrong_type(key: &str, expected: &str) -> ClassifierError {
    ClassifierError::Configuration(format!("setting '{}' must be {}", key, expected))
}
