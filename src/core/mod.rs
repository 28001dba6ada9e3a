pub mod event;
pub mod sample;

pub use event::{filter_by_confidence, ClassificationEvent, Prediction};
pub use sample::{decode_iq, encode_iq, Sample, BYTES_PER_SAMPLE};
