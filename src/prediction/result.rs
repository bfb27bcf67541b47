use super::{AttributionMap, ConfidenceInterval, ContextFlags, MarketingStats};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionResult {
    pub opening_weekend: f64,
    pub total_gross: f64,
    pub opening_weekend_ci: ConfidenceInterval,
    pub total_gross_ci: ConfidenceInterval,
    /// Percent.
    pub roi: f64,
    /// Display score, 0 to 100.
    pub star_power: f64,
    #[serde(rename = "shap_values")]
    pub attributions: AttributionMap,
    pub explanation: String,
    pub context_flags: ContextFlags,
    pub marketing_stats: MarketingStats,
}

impl PredictionResult {
    /// All-zero result returned while the artifacts are incomplete.
    pub fn degraded() -> Self {
        PredictionResult::default()
    }
}
