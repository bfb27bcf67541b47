//! Media signals (posters, trailers, social buzz) for a movie title.

mod cache;
mod models;
mod service;
mod social;
pub mod tmdb;

pub use cache::{Lookup, MediaCache, DEFAULT_CAPACITY};
pub use models::{MediaSignal, SocialMetrics, Trailer};
pub use service::TmdbMediaService;
pub use social::{SocialSignalRule, SocialSignalRules};

use async_trait::async_trait;

/// Source of media signals. Lookups never fail: any problem degrades to
/// [`MediaSignal::not_found`].
#[async_trait]
pub trait MediaProvider: Send + Sync {
    async fn get_media(&self, title: &str) -> MediaSignal;
}

/// Used when no TMDB API key is configured.
pub struct NoOpMediaProvider;

#[async_trait]
impl MediaProvider for NoOpMediaProvider {
    async fn get_media(&self, _title: &str) -> MediaSignal {
        MediaSignal::not_found()
    }
}
