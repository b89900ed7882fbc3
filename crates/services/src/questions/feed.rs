use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::FeedError;

const DEFAULT_BASE_URL: &str = "https://tv-api.com/en/API/MostPopularMovies";

/// One movie of the remote pool.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieEntry {
    pub title: String,
    pub image_url: String,
    /// Unparseable ratings are stored as `0.0`.
    pub rating: f32,
}

/// Remote source of movies and their posters.
#[async_trait]
pub trait MovieFeed: Send + Sync {
    /// Fetch the movie pool.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` on transport failures, API errors, or an empty pool.
    async fn load_movies(&self) -> Result<Vec<MovieEntry>, FeedError>;

    /// Download poster bytes.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` on transport failures.
    async fn load_image(&self, url: &str) -> Result<Vec<u8>, FeedError>;
}

#[derive(Clone, Debug)]
pub struct MovieFeedConfig {
    pub base_url: String,
    pub api_key: String,
}

impl MovieFeedConfig {
    /// Reads `QUIZ_FEED_API_KEY` and optionally `QUIZ_FEED_BASE_URL`.
    ///
    /// Returns `None` when no API key is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_FEED_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("QUIZ_FEED_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Some(Self { base_url, api_key })
    }

    #[must_use]
    pub fn movies_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.api_key)
    }
}

/// `MovieFeed` backed by the most-popular-movies HTTP API.
#[derive(Clone)]
pub struct HttpMovieFeed {
    client: Client,
    config: MovieFeedConfig,
}

impl HttpMovieFeed {
    #[must_use]
    pub fn new(config: MovieFeedConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MovieFeedConfig {
        &self.config
    }
}

#[async_trait]
impl MovieFeed for HttpMovieFeed {
    async fn load_movies(&self) -> Result<Vec<MovieEntry>, FeedError> {
        let response = self.client.get(self.config.movies_url()).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status()));
        }
        let body = response.bytes().await?;
        parse_movies(&body)
    }

    async fn load_image(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode a most-popular-movies payload.
///
/// # Errors
///
/// Returns `FeedError::Decode` for malformed JSON, `FeedError::Api` when the
/// payload carries an error message, and `FeedError::EmptyPool` when it lists no movies.
pub fn parse_movies(body: &[u8]) -> Result<Vec<MovieEntry>, FeedError> {
    let payload: MostPopularMovies = serde_json::from_slice(body)?;
    if !payload.error_message.trim().is_empty() {
        return Err(FeedError::Api(payload.error_message));
    }
    if payload.items.is_empty() {
        return Err(FeedError::EmptyPool);
    }
    Ok(payload
        .items
        .into_iter()
        .map(|item| MovieEntry {
            rating: item.rating.trim().parse().unwrap_or(0.0),
            title: item.title,
            image_url: item.image_url,
        })
        .collect())
}

/// Ask the image CDN for a 600px-wide rendition instead of the original upload.
#[must_use]
pub fn resized_image_url(url: &str) -> String {
    match url.split_once("._") {
        Some((base, _)) => format!("{base}._V0_UX600_.jpg"),
        None => url.to_owned(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MostPopularMovies {
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    items: Vec<MovieItem>,
}

#[derive(Debug, Deserialize)]
struct MovieItem {
    title: String,
    #[serde(rename = "imDbRating", default)]
    rating: String,
    #[serde(rename = "image")]
    image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_and_ratings() {
        let body = br#"{
            "errorMessage": "",
            "items": [
                {"id": "tt1", "title": "Dune", "imDbRating": "8.3", "image": "https://m.media-amazon.com/images/M/abc._V1_Ratio0.6716_AL_.jpg"},
                {"id": "tt2", "title": "Unrated", "imDbRating": "", "image": "https://example.com/u.jpg"}
            ]
        }"#;
        let movies = parse_movies(body).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Dune");
        assert!((movies[0].rating - 8.3).abs() < f32::EPSILON);
        assert!(movies[1].rating.abs() < f32::EPSILON);
    }

    #[test]
    fn error_message_is_a_feed_error() {
        let body = br#"{"errorMessage": "Invalid API Key", "items": []}"#;
        let err = parse_movies(body).unwrap_err();
        assert!(matches!(err, FeedError::Api(ref msg) if msg == "Invalid API Key"));
    }

    #[test]
    fn empty_items_are_reported_distinctly() {
        let body = br#"{"errorMessage": "", "items": []}"#;
        assert!(matches!(parse_movies(body), Err(FeedError::EmptyPool)));
    }

    #[test]
    fn malformed_json_is_decode_error() {
        assert!(matches!(parse_movies(b"<html>"), Err(FeedError::Decode(_))));
    }

    #[test]
    fn resizes_cdn_urls() {
        assert_eq!(
            resized_image_url("https://m.media-amazon.com/images/M/abc._V1_Ratio0.6716_AL_.jpg"),
            "https://m.media-amazon.com/images/M/abc._V0_UX600_.jpg"
        );
        assert_eq!(
            resized_image_url("https://example.com/poster.jpg"),
            "https://example.com/poster.jpg"
        );
    }

    #[test]
    fn movies_url_joins_key() {
        let config = MovieFeedConfig {
            base_url: "https://api.example.com/movies/".into(),
            api_key: "k_123".into(),
        };
        assert_eq!(config.movies_url(), "https://api.example.com/movies/k_123");
    }
}
