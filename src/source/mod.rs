pub mod file;
pub mod generator;

pub use file::FileSource;
pub use generator::{generate_file, write_cf32, SignalKind, SignalMetadata};
