//! Box Office Prediction Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod artifacts;
pub mod config;
pub mod media;
pub mod model;
pub mod prediction;
pub mod server;

// Re-export commonly used types for convenience
pub use artifacts::{ArtifactLoad, ArtifactStore};
pub use media::{MediaProvider, MediaSignal, NoOpMediaProvider};
pub use prediction::{MovieDescriptor, PredictionResult, Predictor};
pub use server::{run_server, RequestsLoggingLevel};
