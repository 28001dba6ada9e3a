use crate::error::{ClassifierError, Result};
use std::collections::{HashMap, HashSet};

/// Class names in the order the Sig53 classifier emits its logits
pub const SIG53_CLASSES: [&str; 53] = [
    "ook", "4ask", "8ask", "bpsk", "qpsk", "8psk", "16psk", "32psk", "64psk",
    "16qam", "32qam", "64qam", "128qam", "256qam", "512qam", "1024qam",
    "2fsk", "4fsk", "8fsk", "16fsk", "2gfsk", "4gfsk", "8gfsk", "16gfsk",
    "2msk", "4msk", "8msk", "16msk", "gmsk",
    "ofdm-64", "ofdm-72", "ofdm-128", "ofdm-180", "ofdm-256", "ofdm-300",
    "ofdm-512", "ofdm-600", "ofdm-900", "ofdm-1024", "ofdm-1200", "ofdm-2048",
    "am-dsb", "am-dsb-sc", "am-lsb", "am-usb", "fm", "lfm", "lfm_ramp",
    "lfm_triangle", "continuous_phase_fsk", "dvb-s2", "chirp_ss", "wbfm",
];

/// Receiver mode for each class. `None` means the class is recognised but
/// no demodulator in the pipeline handles it.
pub const SIG53_MODES: &[(&str, Option<&str>)] = &[
    // Analog
    ("ook", Some("cw")),
    ("am-dsb", Some("am")),
    ("am-dsb-sc", Some("am")),
    ("am-lsb", Some("lsb")),
    ("am-usb", Some("usb")),
    ("fm", Some("nfm")),
    ("wbfm", Some("wfm")),
    ("lfm", None),
    ("lfm_ramp", None),
    ("lfm_triangle", None),
    ("chirp_ss", None),
    // ASK
    ("4ask", None),
    ("8ask", None),
    // PSK
    ("bpsk", Some("bpsk31")),
    ("qpsk", None),
    ("8psk", None),
    ("16psk", None),
    ("32psk", None),
    ("64psk", None),
    // QAM
    ("16qam", None),
    ("32qam", None),
    ("64qam", None),
    ("128qam", None),
    ("256qam", None),
    ("512qam", None),
    ("1024qam", None),
    // FSK
    ("2fsk", Some("rtty170")),
    ("4fsk", Some("dmr")),
    ("8fsk", None),
    ("16fsk", None),
    ("2gfsk", None),
    ("4gfsk", Some("dmr")),
    ("8gfsk", None),
    ("16gfsk", None),
    ("2msk", None),
    ("4msk", None),
    ("8msk", None),
    ("16msk", None),
    ("gmsk", Some("dstar")),
    ("continuous_phase_fsk", None),
    // OFDM
    ("ofdm-64", Some("ft8")),
    ("ofdm-72", None),
    ("ofdm-128", None),
    ("ofdm-180", None),
    ("ofdm-256", None),
    ("ofdm-300", None),
    ("ofdm-512", None),
    ("ofdm-600", None),
    ("ofdm-900", None),
    ("ofdm-1024", None),
    ("ofdm-1200", None),
    ("ofdm-2048", Some("dab")),
    // Satellite
    ("dvb-s2", None),
];

/// Vocabulary of class labels plus their receiver-mode mapping.
///
/// Immutable once built; shared read-only by the model cache.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    vocabulary: Vec<String>,
    modes: HashMap<String, Option<String>>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::sig53()
    }
}

impl LabelTable {
    pub fn new(vocabulary: Vec<String>, modes: HashMap<String, Option<String>>) -> Self {
        Self { vocabulary, modes }
    }

    pub fn from_static(vocabulary: &[&str], modes: &[(&str, Option<&str>)]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|s| s.to_string()).collect(),
            modes: modes
                .iter()
                .map(|(label, mode)| (label.to_string(), mode.map(str::to_string)))
                .collect(),
        }
    }

    /// Built-in Sig53 vocabulary
    pub fn sig53() -> Self {
        Self::from_static(&SIG53_CLASSES, SIG53_MODES)
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn label_of(&self, index: usize) -> Result<&str> {
        self.vocabulary
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                ClassifierError::Configuration(format!(
                    "class index {} outside vocabulary of {} labels",
                    index,
                    self.vocabulary.len()
                ))
            })
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.vocabulary.iter().position(|l| l == label)
    }

    pub fn mode_of(&self, label: &str) -> Option<&str> {
        self.modes.get(label).and_then(|m| m.as_deref())
    }

    /// Every label must be unique and have an entry in the mode table
    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.is_empty() {
            return Err(ClassifierError::Configuration(
                "label vocabulary is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for label in &self.vocabulary {
            if !seen.insert(label.as_str()) {
                return Err(ClassifierError::Configuration(format!(
                    "duplicate label '{}' in vocabulary",
                    label
                )));
            }
            if !self.modes.contains_key(label) {
                return Err(ClassifierError::Configuration(format!(
                    "label '{}' has no entry in the mode table",
                    label
                )));
            }
        }

        Ok(())
    }

    /// The model must emit exactly one logit per vocabulary entry
    pub fn validate_against(&self, num_classes: usize) -> Result<()> {
        if num_classes != self.vocabulary.len() {
            return Err(ClassifierError::Configuration(format!(
                "vocabulary has {} labels but model reports {} output classes",
                self.vocabulary.len(),
                num_classes
            )));
        }
        Ok(())
    }
}
