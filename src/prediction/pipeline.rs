use super::{
    roi, AttributionEngine, AttributionMap, CalibrationLayer, ContextNarrator, FeatureEncoder,
    MovieDescriptor, NarrationInput, PredictionResult,
};
use crate::artifacts::{ArtifactBundle, ArtifactLoad, MetricsTable};
use crate::media::MediaProvider;
use crate::model::Target;
use crate::server::metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("Models not loaded")]
    NotReady,
}

struct Pipeline {
    bundle: ArtifactBundle,
    calibration: CalibrationLayer,
    attribution: AttributionEngine,
    narrator: ContextNarrator,
}

enum Engine {
    Ready(Box<Pipeline>),
    Degraded(Option<MetricsTable>),
    Unavailable(Option<MetricsTable>),
}

/// Runs descriptors through encoding, prediction, calibration, attribution
/// and narration. Holds no mutable state, so any number of predictions can
/// run against it concurrently.
pub struct Predictor {
    engine: Engine,
    media: Arc<dyn MediaProvider>,
}

impl Predictor {
    pub fn new(load: ArtifactLoad, media: Arc<dyn MediaProvider>) -> Self {
        let engine = match load {
            ArtifactLoad::Ready(bundle) => Engine::Ready(Box::new(Pipeline {
                calibration: CalibrationLayer::for_bundle(&bundle),
                bundle,
                attribution: AttributionEngine::default(),
                narrator: ContextNarrator,
            })),
            ArtifactLoad::Degraded { metrics, .. } => Engine::Degraded(metrics),
            ArtifactLoad::Unavailable { metrics, .. } => Engine::Unavailable(metrics),
        };
        Predictor { engine, media }
    }

    pub fn status(&self) -> &'static str {
        match self.engine {
            Engine::Ready(_) => "ready",
            Engine::Degraded(_) => "degraded",
            Engine::Unavailable(_) => "unavailable",
        }
    }

    pub fn metrics(&self) -> Option<&MetricsTable> {
        match &self.engine {
            Engine::Ready(pipeline) => Some(pipeline.bundle.metrics()),
            Engine::Degraded(metrics) | Engine::Unavailable(metrics) => metrics.as_ref(),
        }
    }

    pub async fn predict(
        &self,
        descriptor: &MovieDescriptor,
    ) -> Result<PredictionResult, PredictError> {
        let pipeline = match &self.engine {
            Engine::Ready(pipeline) => pipeline,
            Engine::Degraded(_) => {
                metrics::record_prediction("degraded");
                return Ok(PredictionResult::degraded());
            }
            Engine::Unavailable(_) => return Err(PredictError::NotReady),
        };
        let bundle = &pipeline.bundle;

        let features = match FeatureEncoder::new(bundle).encode(descriptor) {
            Ok(features) => features,
            Err(err) => {
                warn!("Cannot encode '{}': {}", descriptor.title(), err);
                metrics::record_prediction("degraded");
                return Ok(PredictionResult::degraded());
            }
        };

        let raw = bundle.models().predict(features.values());
        let calibrated = pipeline
            .calibration
            .calibrate(raw, features.log_star_power());
        if calibrated.corrected {
            metrics::record_calibration_correction();
        }
        let roi = roi(calibrated.revenue.point, descriptor.budget);

        let attributions = match pipeline.attribution.explain(
            bundle.models().model(Target::Revenue),
            bundle.schema(),
            &features,
        ) {
            Ok(attributions) => attributions,
            Err(err) => {
                warn!("Attribution failed for '{}': {}", descriptor.title(), err);
                metrics::record_attribution_failure();
                AttributionMap::default()
            }
        };

        let media = self.media.get_media(descriptor.title()).await;
        let narrative = pipeline.narrator.narrate(
            descriptor,
            NarrationInput {
                opening_weekend: calibrated.opening_weekend.point,
                total_gross: calibrated.revenue.point,
                star_power: calibrated.star_power,
            },
            &media,
        );

        debug!(
            "Predicted '{}': opening {:.0}, total {:.0}",
            descriptor.title(),
            calibrated.opening_weekend.point,
            calibrated.revenue.point
        );
        metrics::record_prediction("full");

        Ok(PredictionResult {
            opening_weekend: calibrated.opening_weekend.point,
            total_gross: calibrated.revenue.point,
            opening_weekend_ci: calibrated.opening_weekend.interval,
            total_gross_ci: calibrated.revenue.interval,
            roi,
            star_power: calibrated.star_power,
            attributions,
            explanation: narrative.explanation,
            context_flags: narrative.flags,
            marketing_stats: narrative.stats,
        })
    }

    /// Predicts both descriptors concurrently. Each result is the same as a
    /// standalone [`Predictor::predict`].
    pub async fn predict_pair(
        &self,
        first: &MovieDescriptor,
        second: &MovieDescriptor,
    ) -> Result<(PredictionResult, PredictionResult), PredictError> {
        if let Engine::Unavailable(_) = self.engine {
            return Err(PredictError::NotReady);
        }
        let (first, second) = tokio::join!(self.predict(first), self.predict(second));
        Ok((first?, second?))
    }
}
