//! Synthetic IQ test signals and `.cf32` writers.

use crate::core::{encode_iq, Sample};
use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Complex tone at `frequency` Hz offset from center
pub fn tone(frequency: f64, sample_rate: u32, duration: f64, amplitude: f32) -> Vec<Sample> {
    let num_samples = (sample_rate as f64 * duration) as usize;
    (0..num_samples)
        .map(|n| {
            let phase = 2.0 * PI * frequency * n as f64 / sample_rate as f64;
            Sample::new(
                amplitude * phase.cos() as f32,
                amplitude * phase.sin() as f32,
            )
        })
        .collect()
}

/// Uniform white noise from a seeded RNG, so files are reproducible
pub fn noise(sample_rate: u32, duration: f64, amplitude: f32, seed: u64) -> Vec<Sample> {
    let num_samples = (sample_rate as f64 * duration) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples)
        .map(|_| {
            let i: f32 = rng.gen_range(-1.0..1.0);
            let q: f32 = rng.gen_range(-1.0..1.0);
            Sample::new(amplitude * i, amplitude * q)
        })
        .collect()
}

/// AM: carrier at `carrier_freq` with envelope `1 + depth * sin(2π·mod_freq·t)`
pub fn am(
    carrier_freq: f64,
    mod_freq: f64,
    sample_rate: u32,
    duration: f64,
    carrier_amplitude: f32,
    depth: f32,
) -> Vec<Sample> {
    let num_samples = (sample_rate as f64 * duration) as usize;
    (0..num_samples)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            let envelope = 1.0 + depth as f64 * (2.0 * PI * mod_freq * t).sin();
            let amplitude = carrier_amplitude as f64 * envelope;
            let phase = 2.0 * PI * carrier_freq * t;
            Sample::new((amplitude * phase.cos()) as f32, (amplitude * phase.sin()) as f32)
        })
        .collect()
}

/// Sample-wise sum; the result is as long as the shorter input
pub fn mix(a: &[Sample], b: &[Sample]) -> Vec<Sample> {
    a.iter()
        .zip(b)
        .map(|(x, y)| Sample::new(x.i + y.i, x.q + y.q))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Tone,
    Noise,
    Am,
    ToneNoise,
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tone" => Ok(SignalKind::Tone),
            "noise" => Ok(SignalKind::Noise),
            "am" => Ok(SignalKind::Am),
            "tone_noise" => Ok(SignalKind::ToneNoise),
            other => Err(format!(
                "unknown signal '{}' (expected tone, noise, am or tone_noise)",
                other
            )),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Tone => "tone",
            SignalKind::Noise => "noise",
            SignalKind::Am => "am",
            SignalKind::ToneNoise => "tone_noise",
        };
        write!(f, "{}", name)
    }
}

impl SignalKind {
    pub fn generate(&self, frequency: f64, sample_rate: u32, duration: f64) -> Vec<Sample> {
        match self {
            SignalKind::Tone => tone(frequency, sample_rate, duration, 0.5),
            SignalKind::Noise => noise(sample_rate, duration, 0.1, 1),
            SignalKind::Am => am(frequency, 400.0, sample_rate, duration, 0.5, 0.5),
            SignalKind::ToneNoise => mix(
                &tone(frequency, sample_rate, duration, 0.4),
                &noise(sample_rate, duration, 0.1, 1),
            ),
        }
    }

    pub fn description(&self, frequency: f64) -> String {
        match self {
            SignalKind::Tone => format!("{}Hz tone", frequency),
            SignalKind::Noise => "White noise".to_string(),
            SignalKind::Am => format!("AM signal at {}Hz with 400Hz modulation", frequency),
            SignalKind::ToneNoise => format!("{}Hz tone with noise", frequency),
        }
    }
}

/// JSON sidecar written next to a generated recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    pub sample_rate: u32,
    pub center_frequency: i64,
    pub duration_seconds: f64,
    pub description: String,
    pub signal_type: SignalKind,
    pub file_size_bytes: u64,
    pub num_samples: usize,
}

/// Write samples as interleaved little-endian f32, returning the file size
pub fn write_cf32(path: impl AsRef<Path>, samples: &[Sample]) -> Result<u64> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let bytes = encode_iq(samples);
    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(bytes.len() as u64)
}

/// Write `metadata` as `<recording>.json`, returning the sidecar path
pub fn write_metadata(recording: impl AsRef<Path>, metadata: &SignalMetadata) -> Result<PathBuf> {
    let path = recording.as_ref().with_extension("json");
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Generate a test recording plus its metadata sidecar
pub fn generate_file(
    path: impl AsRef<Path>,
    kind: SignalKind,
    frequency: f64,
    sample_rate: u32,
    duration: f64,
    center_frequency: i64,
) -> Result<SignalMetadata> {
    if sample_rate == 0 || !(duration > 0.0) {
        bail!("sample rate and duration must be positive");
    }

    let samples = kind.generate(frequency, sample_rate, duration);
    let file_size_bytes = write_cf32(&path, &samples)?;
    let metadata = SignalMetadata {
        sample_rate,
        center_frequency,
        duration_seconds: duration,
        description: kind.description(frequency),
        signal_type: kind,
        file_size_bytes,
        num_samples: samples.len(),
    };
    write_metadata(&path, &metadata)?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_has_constant_magnitude() {
        let samples = tone(1000.0, 48000, 0.01, 0.5);
        assert_eq!(samples.len(), 480);
        assert!(samples.iter().all(|s| (s.magnitude() - 0.5).abs() < 1e-4));
    }

    #[test]
    fn test_noise_is_bounded_and_seeded() {
        let a = noise(8000, 0.1, 0.1, 7);
        let b = noise(8000, 0.1, 0.1, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|s| s.i.abs() <= 0.1 && s.q.abs() <= 0.1));
    }

    #[test]
    fn test_noise_differs_across_seeds() {
        assert_ne!(noise(8000, 0.01, 0.1, 1), noise(8000, 0.01, 0.1, 2));
    }

    #[test]
    fn test_am_envelope_stays_within_depth() {
        let samples = am(1000.0, 400.0, 48000, 0.05, 0.5, 0.5);
        for s in &samples {
            let m = s.magnitude();
            assert!(m >= 0.25 - 1e-4 && m <= 0.75 + 1e-4);
        }
    }

    #[test]
    fn test_signal_kind_parse() {
        assert_eq!("tone_noise".parse::<SignalKind>().unwrap(), SignalKind::ToneNoise);
        assert!("chirp".parse::<SignalKind>().is_err());
    }
}
