//! The inference pipeline: descriptor in, calibrated and explained
//! prediction out.

mod attribution;
mod calibration;
mod descriptor;
mod features;
mod narrator;
mod pipeline;
mod result;

pub use attribution::{AttributionEngine, AttributionError, AttributionMap, DEFAULT_TOP_K};
pub use calibration::{
    display_star_power, roi, Calibrated, CalibrationLayer, ConfidenceInterval, CorrectionPolicy,
    Estimate,
};
pub use descriptor::MovieDescriptor;
pub use features::{
    genre_document, parse_release_date, star_power, EncodeError, FeatureEncoder, FeatureVector,
    ReleaseDate,
};
pub use narrator::{ContextFlags, ContextNarrator, MarketingStats, NarrationInput, Narrative};
pub use pipeline::{PredictError, Predictor};
pub use result::PredictionResult;
