//! Media signal payloads returned by the media collaborator and served by
//! `GET /media`.

use serde::{Deserialize, Serialize};

/// A video associated with a movie.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Trailer {
    pub name: String,
    /// Video key on the hosting site.
    #[serde(default)]
    pub key: String,
    /// "Trailer" or "Teaser"
    #[serde(rename = "type")]
    pub kind: String,
    pub site: String,
}

impl Trailer {
    pub fn is_trailer(&self) -> bool {
        self.kind == "Trailer"
    }
}

/// Approximate audience signals for a title.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SocialMetrics {
    pub trailer_views_approx: u64,
    pub social_buzz_score: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MediaSignal {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub trailers: Vec<Trailer>,
    #[serde(default)]
    pub metrics: SocialMetrics,
}

impl MediaSignal {
    /// No media known for the title. Narration treats this as "no marketing
    /// signal".
    pub fn not_found() -> Self {
        MediaSignal::default()
    }

    pub fn has_trailers(&self) -> bool {
        !self.trailers.is_empty()
    }
}
