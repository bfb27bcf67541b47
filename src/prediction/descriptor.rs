use serde::{Deserialize, Serialize};

pub const UNKNOWN_TITLE: &str = "Unknown";

/// Raw, user-supplied description of a movie to predict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDescriptor {
    #[serde(default)]
    pub title: Option<String>,
    pub budget: f64,
    #[serde(default)]
    pub is_estimated_budget: bool,
    pub release_date: String,
    /// Comma-separated genre names.
    pub genres: String,
    /// Comma-separated `name, role, name, role, ...` tokens.
    pub crew: String,
    #[serde(default)]
    pub score: Option<f64>,
}

impl MovieDescriptor {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }

    pub fn score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}
