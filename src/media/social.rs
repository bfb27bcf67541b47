//! Keyword rules that assign approximate social metrics to a title.

use super::SocialMetrics;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SocialSignalRule {
    /// Every keyword must appear in the title.
    #[serde(default)]
    pub all_of: Vec<String>,
    /// At least one keyword must appear in the title, when non-empty.
    #[serde(default)]
    pub any_of: Vec<String>,
    pub trailer_views_approx: u64,
    pub social_buzz_score: u32,
}

impl SocialSignalRule {
    fn new(
        all_of: &[&str],
        any_of: &[&str],
        trailer_views_approx: u64,
        social_buzz_score: u32,
    ) -> Self {
        SocialSignalRule {
            all_of: all_of.iter().map(|k| k.to_string()).collect(),
            any_of: any_of.iter().map(|k| k.to_string()).collect(),
            trailer_views_approx,
            social_buzz_score,
        }
    }

    /// `title` must already be lowercase.
    fn matches(&self, title: &str) -> bool {
        let contains = |keyword: &String| title.contains(&keyword.to_lowercase());
        self.all_of.iter().all(contains)
            && (self.any_of.is_empty() || self.any_of.iter().any(contains))
    }

    fn metrics(&self) -> SocialMetrics {
        SocialMetrics {
            trailer_views_approx: self.trailer_views_approx,
            social_buzz_score: self.social_buzz_score,
        }
    }
}

/// Ordered rule list; the first matching rule wins.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialSignalRules {
    rules: Vec<SocialSignalRule>,
}

impl SocialSignalRules {
    pub fn new(rules: Vec<SocialSignalRule>) -> Self {
        SocialSignalRules { rules }
    }

    pub fn rules(&self) -> &[SocialSignalRule] {
        &self.rules
    }

    pub fn metrics_for(&self, title: Option<&str>) -> SocialMetrics {
        let Some(title) = title else {
            return SocialMetrics::default();
        };
        let lowered = title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(SocialSignalRule::metrics)
            .unwrap_or_default()
    }
}

impl Default for SocialSignalRules {
    fn default() -> Self {
        SocialSignalRules::new(vec![
            SocialSignalRule::new(&["avengers", "doomsday"], &[], 1_020_000_000, 98),
            SocialSignalRule::new(&["dune"], &["3", "part three"], 0, 85),
            SocialSignalRule::new(&["dune"], &[], 150_000_000, 90),
        ])
    }
}
