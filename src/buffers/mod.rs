pub mod sample_buffer;

pub use sample_buffer::SampleBuffer;
