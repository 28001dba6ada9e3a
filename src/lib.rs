pub mod buffers;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod model;
pub mod observability;
pub mod source;

pub use config::ClassifierConfig;
pub use error::ClassifierError;
