//! Post-hoc adjustment of the raw model outputs: confidence intervals from the
//! held-out RMSE, the high-opening correction, and ROI.

use crate::artifacts::ArtifactBundle;
use crate::model::{RawPrediction, Target};
use serde::{Serialize, Serializer};
use tracing::debug;

/// Two-sided 95% normal quantile.
pub const CI_Z: f64 = 1.96;

/// `min(100, log_star_power / 20 * 100)`.
pub fn display_star_power(log_star_power: f64) -> f64 {
    (log_star_power / 20.0 * 100.0).min(100.0)
}

/// Percentage return on `budget`. Zero when the budget is not positive or the
/// result is not a finite number.
pub fn roi(revenue: f64, budget: f64) -> f64 {
    if budget <= 0.0 || budget.is_nan() {
        return 0.0;
    }
    let roi = (revenue - budget) / budget * 100.0;
    if roi.is_finite() {
        roi
    } else {
        debug!("Non-finite ROI for revenue {} and budget {}", revenue, budget);
        0.0
    }
}

/// Dampens implausibly high openings unless star power is top tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionPolicy {
    pub opening_threshold: f64,
    pub star_power_ceiling: f64,
    pub factor: f64,
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        CorrectionPolicy {
            opening_threshold: 200_000_000.0,
            star_power_ceiling: 94.0,
            factor: 0.65,
        }
    }
}

impl CorrectionPolicy {
    pub fn applies(&self, opening_weekend: f64, display_star_power: f64) -> bool {
        opening_weekend > self.opening_threshold && display_star_power < self.star_power_ceiling
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    fn around(point: f64, rmse: f64) -> Self {
        ConfidenceInterval {
            lower: (point - CI_Z * rmse).max(0.0),
            upper: point + CI_Z * rmse,
        }
    }

    fn scaled(self, factor: f64) -> Self {
        ConfidenceInterval {
            lower: self.lower * factor,
            upper: self.upper * factor,
        }
    }
}

/// Serialized as `[lower, upper]`.
impl Serialize for ConfidenceInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.lower, self.upper].serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimate {
    pub point: f64,
    pub interval: ConfidenceInterval,
}

impl Estimate {
    fn scaled(self, factor: f64) -> Self {
        Estimate {
            point: self.point * factor,
            interval: self.interval.scaled(factor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrated {
    pub opening_weekend: Estimate,
    pub revenue: Estimate,
    pub star_power: f64,
    pub corrected: bool,
}

#[derive(Debug, Clone)]
pub struct CalibrationLayer {
    opening_rmse: f64,
    revenue_rmse: f64,
    policy: CorrectionPolicy,
}

impl CalibrationLayer {
    pub fn new(opening_rmse: f64, revenue_rmse: f64, policy: CorrectionPolicy) -> Self {
        CalibrationLayer {
            opening_rmse,
            revenue_rmse,
            policy,
        }
    }

    pub fn for_bundle(bundle: &ArtifactBundle) -> Self {
        CalibrationLayer::new(
            bundle.rmse(Target::OpeningWeekend),
            bundle.rmse(Target::Revenue),
            CorrectionPolicy::default(),
        )
    }

    pub fn calibrate(&self, raw: RawPrediction, log_star_power: f64) -> Calibrated {
        let star_power = display_star_power(log_star_power);
        let opening_weekend = Estimate {
            point: raw.opening_weekend,
            interval: ConfidenceInterval::around(raw.opening_weekend, self.opening_rmse),
        };
        let revenue = Estimate {
            point: raw.revenue,
            interval: ConfidenceInterval::around(raw.revenue, self.revenue_rmse),
        };

        if self.policy.applies(raw.opening_weekend, star_power) {
            debug!(
                "Dampening opening weekend {:.0} (star power {:.1}) by {}",
                raw.opening_weekend, star_power, self.policy.factor
            );
            return Calibrated {
                opening_weekend: opening_weekend.scaled(self.policy.factor),
                revenue: revenue.scaled(self.policy.factor),
                star_power,
                corrected: true,
            };
        }

        Calibrated {
            opening_weekend,
            revenue,
            star_power,
            corrected: false,
        }
    }
}
