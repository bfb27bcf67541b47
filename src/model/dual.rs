//! The opening-weekend and revenue regressors, sharing one feature schema.

use super::TreeEnsemble;

/// Prediction target, with the keys used by the artifact store and the
/// metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    OpeningWeekend,
    Revenue,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::OpeningWeekend, Target::Revenue];

    /// Key of the model in the artifact store.
    pub fn model_key(&self) -> &'static str {
        match self {
            Target::OpeningWeekend => "opening",
            Target::Revenue => "revenue",
        }
    }

    /// Key of the target in the metrics table.
    pub fn metrics_key(&self) -> &'static str {
        match self {
            Target::OpeningWeekend => "opening_weekend",
            Target::Revenue => "revenue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    pub opening_weekend: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone)]
pub struct DualRegressor {
    opening: TreeEnsemble,
    revenue: TreeEnsemble,
}

impl DualRegressor {
    pub fn new(opening: TreeEnsemble, revenue: TreeEnsemble) -> Self {
        DualRegressor { opening, revenue }
    }

    pub fn model(&self, target: Target) -> &TreeEnsemble {
        match target {
            Target::OpeningWeekend => &self.opening,
            Target::Revenue => &self.revenue,
        }
    }

    pub fn predict(&self, features: &[f64]) -> RawPrediction {
        RawPrediction {
            opening_weekend: self.opening.predict(features),
            revenue: self.revenue.predict(features),
        }
    }
}
