use async_trait::async_trait;
use domain::{Comment, LiveStream, Video};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

mod wire;

use wire::{CommentThread, ErrorEnvelope, ListResponse, SearchResult, VideoResource};

/// Public endpoint of the YouTube Data API v3
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Upper bound on comments fetched per piece
pub const MAX_COMMENTS: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    #[error("request to YouTube failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube answered {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("YouTube response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YouTube response is malformed: {0}")]
    Malformed(String),
}

/// Answers whether a channel is broadcasting right now
#[async_trait]
pub trait LiveStatusSource: Send + Sync {
    /// Live broadcasts on `channel_id`, most relevant first
    async fn live_streams(&self, channel_id: &str) -> Result<Vec<LiveStream>, YouTubeError>;
}

/// Metadata and comments of uploaded videos
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Metadata for `ids`, fetched in a single batched request
    async fn videos(&self, ids: &[String]) -> Result<Vec<Video>, YouTubeError>;

    /// Up to `max_results` top-level comments on `video_id`
    async fn comments(&self, video_id: &str, max_results: u32) -> Result<Vec<Comment>, YouTubeError>;
}

/// Thin client over the three Data API endpoints the site uses
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Point the client at another deployment of the API, e.g. a local mock
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, YouTubeError> {
        tracing::debug!(resource, "querying YouTube");
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, resource))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(YouTubeError::Api { status, message });
        }

        let list: ListResponse<T> = serde_json::from_slice(&body)?;
        Ok(list.items)
    }
}

#[async_trait]
impl LiveStatusSource for YouTubeClient {
    async fn live_streams(&self, channel_id: &str) -> Result<Vec<LiveStream>, YouTubeError> {
        let results: Vec<SearchResult> = self
            .list(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("type", "video"),
                    ("eventType", "live"),
                ],
            )
            .await?;
        Ok(results
            .into_iter()
            .filter_map(SearchResult::into_live_stream)
            .collect())
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn videos(&self, ids: &[String]) -> Result<Vec<Video>, YouTubeError> {
        let ids = ids.join(",");
        let resources: Vec<VideoResource> = self
            .list("videos", &[("part", "snippet,statistics"), ("id", ids.as_str())])
            .await?;
        resources.into_iter().map(VideoResource::into_video).collect()
    }

    async fn comments(&self, video_id: &str, max_results: u32) -> Result<Vec<Comment>, YouTubeError> {
        let max_results = max_results.to_string();
        let threads: Vec<CommentThread> = self
            .list(
                "commentThreads",
                &[
                    ("part", "snippet"),
                    ("videoId", video_id),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;
        Ok(threads.into_iter().map(CommentThread::into_comment).collect())
    }
}
