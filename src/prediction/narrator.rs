//! Rule-based explanation of a calibrated prediction.
//!
//! Rules run in a fixed order and the sentences keep that order, so the same
//! inputs always produce the same text.

use super::MovieDescriptor;
use crate::media::MediaSignal;
use serde::Serialize;
use std::collections::BTreeMap;

const HIGH_MARKETING_VIEWS: u64 = 50_000_000;
const FRANCHISE_STAR_POWER: f64 = 80.0;
const LONG_LEGS_MULTIPLIER: f64 = 3.5;

pub const ORGANIC_REACH: &str = "Organic Reach";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContextFlags {
    pub is_estimated: bool,
    pub high_marketing: bool,
    pub franchise_legacy: bool,
    pub missing_marketing: bool,
}

pub type MarketingStats = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Narrative {
    pub explanation: String,
    pub flags: ContextFlags,
    pub stats: MarketingStats,
}

/// The calibrated numbers the rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationInput {
    pub opening_weekend: f64,
    pub total_gross: f64,
    /// Display score, 0 to 100.
    pub star_power: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextNarrator;

impl ContextNarrator {
    pub fn narrate(
        &self,
        descriptor: &MovieDescriptor,
        prediction: NarrationInput,
        media: &MediaSignal,
    ) -> Narrative {
        let mut sentences = Vec::new();
        let mut flags = ContextFlags::default();
        let mut stats = MarketingStats::new();

        if descriptor.is_estimated_budget {
            sentences.push(format!(
                "Prediction uses an **estimated budget** of ${:.1}M. Actual performance may vary if the confirmed budget differs significantly.",
                descriptor.budget / 1_000_000.0
            ));
            flags.is_estimated = true;
        }

        let views = media.metrics.trailer_views_approx;
        if views > HIGH_MARKETING_VIEWS {
            sentences.push(format!(
                "Strong **organic marketing surge** detected with ~{:.1}M+ trailer views, indicating high pre-release hype.",
                views as f64 / 1_000_000.0
            ));
            flags.high_marketing = true;
            stats.insert(ORGANIC_REACH.to_string(), "High".to_string());
        }

        if !media.has_trailers() {
            if prediction.star_power > FRANCHISE_STAR_POWER {
                sentences.push(format!(
                    "No official trailer released yet, but **Franchise Legacy** (Score: {:.0}/100) acts as a strong compensating signal. Historical performance of related movies supports the high prediction.",
                    prediction.star_power
                ));
                flags.franchise_legacy = true;
            } else {
                sentences.push(
                    "Lack of official trailers contributes to higher uncertainty in the opening weekend prediction."
                        .to_string(),
                );
                flags.missing_marketing = true;
            }
        }

        if prediction.total_gross > prediction.opening_weekend * LONG_LEGS_MULTIPLIER {
            sentences.push(
                "Long run potential is high based on genre and release window (legs > 3.5x)."
                    .to_string(),
            );
        }

        Narrative {
            explanation: sentences.join(" "),
            flags,
            stats,
        }
    }
}
