//! HTTP client for The Movie Database (TMDB) v3 API.

use super::Trailer;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const BACKDROP_BASE_URL: &str = "https://image.tmdb.org/t/p/w1280";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Request to {endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: reqwest::Error,
    },
}

#[derive(Clone, Debug, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CollectionRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MovieDetails {
    pub belongs_to_collection: Option<CollectionRef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub parts: Vec<MovieSummary>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MovieSummary>,
}

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    results: Vec<Trailer>,
}

/// The TMDB endpoints used to resolve a title's media.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Most relevant search result, if any.
    async fn search_movie(&self, query: &str) -> Result<Option<MovieSummary>, MediaError>;

    /// Every video of a movie, unfiltered.
    async fn videos(&self, movie_id: u64) -> Result<Vec<Trailer>, MediaError>;

    async fn details(&self, movie_id: u64) -> Result<MovieDetails, MediaError>;

    async fn collection(&self, collection_id: u64) -> Result<Collection, MediaError>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, api_key: &str, timeout_sec: u64) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .map_err(MediaError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MediaError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|source| MediaError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| MediaError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search_movie(&self, query: &str) -> Result<Option<MovieSummary>, MediaError> {
        let response: SearchResponse = self.get("/search/movie", &[("query", query)]).await?;
        Ok(response.results.into_iter().next())
    }

    async fn videos(&self, movie_id: u64) -> Result<Vec<Trailer>, MediaError> {
        let endpoint = format!("/movie/{}/videos", movie_id);
        let response: VideosResponse = self.get(&endpoint, &[]).await?;
        Ok(response.results)
    }

    async fn details(&self, movie_id: u64) -> Result<MovieDetails, MediaError> {
        self.get(&format!("/movie/{}", movie_id), &[]).await
    }

    async fn collection(&self, collection_id: u64) -> Result<Collection, MediaError> {
        self.get(&format!("/collection/{}", collection_id), &[]).await
    }
}
