//! Resolves a title to its [`MediaSignal`] through TMDB, with caching.

use super::tmdb::{MediaError, MovieSummary, TmdbApi, BACKDROP_BASE_URL, POSTER_BASE_URL};
use super::{Lookup, MediaCache, MediaProvider, MediaSignal, SocialSignalRules, Trailer};
use crate::server::metrics;
use async_trait::async_trait;
use tracing::{debug, info, warn};

const UNDATED: &str = "9999-12-31";

pub struct TmdbMediaService<A: TmdbApi> {
    api: A,
    cache: MediaCache,
    social_rules: SocialSignalRules,
}

impl<A: TmdbApi> TmdbMediaService<A> {
    pub fn new(api: A, cache: MediaCache, social_rules: SocialSignalRules) -> Self {
        Self {
            api,
            cache,
            social_rules,
        }
    }

    /// Fails only when the search itself fails; every later call degrades to
    /// missing information.
    async fn lookup(&self, title: &str) -> Result<MediaSignal, MediaError> {
        let Some(movie) = self.api.search_movie(title).await? else {
            debug!("No TMDB match for '{}'", title);
            return Ok(MediaSignal::not_found());
        };

        let details = match self.api.details(movie.id).await {
            Ok(details) => Some(details),
            Err(err) => {
                warn!("Failed to fetch details of movie {}: {}", movie.id, err);
                None
            }
        };

        let mut trailers = self.trailers(movie.id).await;
        if trailers.is_empty() {
            if let Some(collection) = details.and_then(|d| d.belongs_to_collection) {
                info!(
                    "No direct trailer for '{}', checking collection '{}'",
                    title, collection.name
                );
                trailers = self.collection_trailers(collection.id, movie.id).await;
            }
        }

        Ok(MediaSignal {
            found: true,
            year: movie
                .release_date
                .as_deref()
                .map(|date| date.chars().take(4).collect()),
            poster_url: movie
                .poster_path
                .as_deref()
                .map(|path| format!("{}{}", POSTER_BASE_URL, path)),
            backdrop_url: movie
                .backdrop_path
                .as_deref()
                .map(|path| format!("{}{}", BACKDROP_BASE_URL, path)),
            metrics: self.social_rules.metrics_for(movie.title.as_deref()),
            title: movie.title,
            trailers,
        })
    }

    /// YouTube trailers and teasers of a movie, trailers first.
    async fn trailers(&self, movie_id: u64) -> Vec<Trailer> {
        let videos = match self.api.videos(movie_id).await {
            Ok(videos) => videos,
            Err(err) => {
                warn!("Failed to fetch videos of movie {}: {}", movie_id, err);
                return vec![];
            }
        };
        let mut trailers: Vec<Trailer> = videos
            .into_iter()
            .filter(|v| v.site == "YouTube" && (v.kind == "Trailer" || v.kind == "Teaser"))
            .collect();
        trailers.sort_by_key(|t| !t.is_trailer());
        trailers
    }

    /// Trailers of the earliest other collection part that has any, with
    /// names tagged as related.
    async fn collection_trailers(
        &self,
        collection_id: u64,
        current_movie_id: u64,
    ) -> Vec<Trailer> {
        let collection = match self.api.collection(collection_id).await {
            Ok(collection) => collection,
            Err(err) => {
                warn!("Failed to fetch collection {}: {}", collection_id, err);
                return vec![];
            }
        };

        let mut parts: Vec<MovieSummary> = collection
            .parts
            .into_iter()
            .filter(|part| part.id != current_movie_id)
            .collect();
        parts.sort_by(|a, b| release_key(a).cmp(release_key(b)));

        for part in parts {
            let mut trailers = self.trailers(part.id).await;
            if trailers.is_empty() {
                continue;
            }
            let part_title = part.title.as_deref().unwrap_or_default();
            for trailer in &mut trailers {
                trailer.name = format!("[Related] {}: {}", part_title, trailer.name);
            }
            return trailers;
        }
        vec![]
    }
}

fn release_key(movie: &MovieSummary) -> &str {
    match movie.release_date.as_deref() {
        Some(date) if !date.is_empty() => date,
        _ => UNDATED,
    }
}

#[async_trait]
impl<A: TmdbApi> MediaProvider for TmdbMediaService<A> {
    async fn get_media(&self, title: &str) -> MediaSignal {
        match self.cache.get_or_fetch(title, self.lookup(title)).await {
            Ok((signal, Lookup::Hit)) => {
                metrics::record_media_lookup("hit");
                signal
            }
            Ok((signal, Lookup::Fetched)) => {
                metrics::record_media_lookup("miss");
                signal
            }
            Err(err) => {
                warn!("Media lookup for '{}' failed: {}", title, err);
                metrics::record_media_lookup("failed");
                MediaSignal::not_found()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tmdb::{Collection, CollectionRef, MovieDetails};
    use crate::media::SocialMetrics;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn movie(id: u64, title: &str, release_date: Option<&str>) -> MovieSummary {
        MovieSummary {
            id,
            title: Some(title.to_string()),
            release_date: release_date.map(str::to_string),
            poster_path: Some(format!("/poster{}.jpg", id)),
            backdrop_path: None,
        }
    }

    fn video(name: &str, kind: &str, site: &str) -> Trailer {
        Trailer {
            name: name.to_string(),
            key: name.to_lowercase().replace(' ', "-"),
            kind: kind.to_string(),
            site: site.to_string(),
        }
    }

    #[derive(Default)]
    struct FakeTmdb {
        movies: HashMap<String, MovieSummary>,
        videos: HashMap<u64, Vec<Trailer>>,
        collections: HashMap<u64, (CollectionRef, Collection)>,
        failing_search: bool,
        failing_videos: bool,
        search_delay: Option<Duration>,
        searches: AtomicUsize,
    }

    #[async_trait]
    impl TmdbApi for FakeTmdb {
        async fn search_movie(&self, query: &str) -> Result<Option<MovieSummary>, MediaError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.search_delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing_search {
                return Err(MediaError::Status {
                    endpoint: "/search/movie".to_string(),
                    status: 500,
                });
            }
            Ok(self.movies.get(query).cloned())
        }

        async fn videos(&self, movie_id: u64) -> Result<Vec<Trailer>, MediaError> {
            if self.failing_videos {
                return Err(MediaError::Status {
                    endpoint: format!("/movie/{}/videos", movie_id),
                    status: 503,
                });
            }
            Ok(self.videos.get(&movie_id).cloned().unwrap_or_default())
        }

        async fn details(&self, movie_id: u64) -> Result<MovieDetails, MediaError> {
            let belongs_to_collection = self
                .collections
                .values()
                .find(|(_, c)| c.parts.iter().any(|p| p.id == movie_id))
                .map(|(r, _)| r.clone());
            Ok(MovieDetails {
                belongs_to_collection,
            })
        }

        async fn collection(&self, collection_id: u64) -> Result<Collection, MediaError> {
            self.collections
                .get(&collection_id)
                .map(|(_, c)| c.clone())
                .ok_or_else(|| MediaError::Status {
                    endpoint: format!("/collection/{}", collection_id),
                    status: 404,
                })
        }
    }

    fn service(api: FakeTmdb) -> TmdbMediaService<FakeTmdb> {
        TmdbMediaService::new(api, MediaCache::default(), SocialSignalRules::default())
    }

    #[tokio::test]
    async fn resolves_found_movie() {
        let mut api = FakeTmdb::default();
        api.movies.insert(
            "Dune".to_string(),
            movie(438631, "Dune: Part Two", Some("2024-02-27")),
        );
        api.videos.insert(
            438631,
            vec![
                video("Teaser", "Teaser", "YouTube"),
                video("Featurette", "Featurette", "YouTube"),
                video("Vimeo Trailer", "Trailer", "Vimeo"),
                video("Official Trailer", "Trailer", "YouTube"),
            ],
        );

        let signal = service(api).get_media("Dune").await;

        assert!(signal.found);
        assert_eq!(signal.title.as_deref(), Some("Dune: Part Two"));
        assert_eq!(signal.year.as_deref(), Some("2024"));
        assert_eq!(
            signal.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster438631.jpg")
        );
        assert_eq!(signal.backdrop_url, None);
        let names: Vec<&str> = signal.trailers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Official Trailer", "Teaser"]);
        assert_eq!(
            signal.metrics,
            SocialMetrics {
                trailer_views_approx: 150_000_000,
                social_buzz_score: 90
            }
        );
    }

    #[tokio::test]
    async fn falls_back_to_earliest_related_collection_part() {
        let mut api = FakeTmdb::default();
        api.movies
            .insert("Sequel".to_string(), movie(3, "Sequel", Some("2026-12-18")));
        api.videos
            .insert(1, vec![video("Original Trailer", "Trailer", "YouTube")]);
        api.videos
            .insert(2, vec![video("Middle Teaser", "Teaser", "YouTube")]);
        api.collections.insert(
            10,
            (
                CollectionRef {
                    id: 10,
                    name: "Saga".to_string(),
                },
                Collection {
                    parts: vec![
                        movie(3, "Sequel", Some("2026-12-18")),
                        movie(4, "Undated Spinoff", None),
                        movie(2, "Middle", Some("2015-05-01")),
                        movie(1, "Original", Some("2009-12-18")),
                    ],
                },
            ),
        );

        let signal = service(api).get_media("Sequel").await;

        assert_eq!(signal.trailers.len(), 1);
        assert_eq!(
            signal.trailers[0].name,
            "[Related] Original: Original Trailer"
        );
    }

    #[tokio::test]
    async fn no_search_result_is_cached_not_found() {
        let api = FakeTmdb::default();
        let service = service(api);

        assert_eq!(service.get_media("Nothing").await, MediaSignal::not_found());
        assert_eq!(service.get_media("Nothing").await, MediaSignal::not_found());

        assert_eq!(service.api.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_search_degrades_and_is_retried() {
        let api = FakeTmdb {
            failing_search: true,
            ..FakeTmdb::default()
        };
        let service = service(api);

        assert_eq!(service.get_media("Dune").await, MediaSignal::not_found());
        assert_eq!(service.get_media("Dune").await, MediaSignal::not_found());

        assert_eq!(service.api.searches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_videos_leave_movie_found_without_trailers() {
        let mut api = FakeTmdb {
            failing_videos: true,
            ..FakeTmdb::default()
        };
        api.movies
            .insert("Heat".to_string(), movie(949, "Heat", Some("1995-12-15")));

        let signal = service(api).get_media("Heat").await;

        assert!(signal.found);
        assert!(signal.trailers.is_empty());
        assert_eq!(signal.metrics, SocialMetrics::default());
    }

    #[tokio::test]
    async fn repeated_lookup_is_served_from_cache() {
        let mut api = FakeTmdb::default();
        api.movies
            .insert("Heat".to_string(), movie(949, "Heat", Some("1995-12-15")));
        let service = service(api);

        let first = service.get_media("Heat").await;
        let second = service.get_media("Heat").await;

        assert_eq!(first, second);
        assert_eq!(service.api.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_of_one_title_search_once() {
        let api = FakeTmdb {
            search_delay: Some(Duration::from_millis(20)),
            ..FakeTmdb::default()
        };
        let service = service(api);

        let (first, second) = tokio::join!(
            service.get_media("Unknown"),
            service.get_media("Unknown")
        );

        assert_eq!(first, MediaSignal::not_found());
        assert_eq!(second, MediaSignal::not_found());
        assert_eq!(service.api.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_failed_lookups_are_not_cached() {
        let api = FakeTmdb {
            failing_search: true,
            search_delay: Some(Duration::from_millis(20)),
            ..FakeTmdb::default()
        };
        let service = service(api);

        tokio::join!(service.get_media("Dune"), service.get_media("Dune"));
        assert_eq!(service.api.searches.load(Ordering::SeqCst), 1);

        service.get_media("Dune").await;
        assert_eq!(service.api.searches.load(Ordering::SeqCst), 2);
    }
}
