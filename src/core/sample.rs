use crate::error::{ClassifierError, Result};
use serde::{Deserialize, Serialize};

/// Bytes occupied by one interleaved little-endian f32 I/Q pair
pub const BYTES_PER_SAMPLE: usize = 8;

/// One complex baseband sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub i: f32,
    pub q: f32,
}

impl Sample {
    pub fn new(i: f32, q: f32) -> Self {
        Self { i, q }
    }

    pub fn magnitude(&self) -> f32 {
        self.i.hypot(self.q)
    }
}

/// Decode a raw chunk of interleaved little-endian f32 I/Q pairs.
///
/// The whole chunk is rejected if its length is not a multiple of one sample
/// or if any component is not finite, so callers never append a partial chunk.
pub fn decode_iq(bytes: &[u8]) -> Result<Vec<Sample>> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(ClassifierError::Decode(format!(
            "chunk of {} bytes is not a multiple of {} (I/Q f32 pair)",
            bytes.len(),
            BYTES_PER_SAMPLE
        )));
    }

    let mut samples = Vec::with_capacity(bytes.len() / BYTES_PER_SAMPLE);
    for (index, pair) in bytes.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
        let i = f32::from_le_bytes([pair[0], pair[1], pair[2], pair[3]]);
        let q = f32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]);
        if !i.is_finite() || !q.is_finite() {
            return Err(ClassifierError::Decode(format!(
                "non-finite sample at index {}",
                index
            )));
        }
        samples.push(Sample { i, q });
    }

    Ok(samples)
}

/// Encode samples back into the interleaved little-endian wire format
pub fn encode_iq(samples: &[Sample]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        bytes.extend_from_slice(&sample.i.to_le_bytes());
        bytes.extend_from_slice(&sample.q.to_le_bytes());
    }
    bytes
}
