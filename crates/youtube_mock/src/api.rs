use crate::catalog::Catalog;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default and ceiling for `maxResults` on commentThreads
const DEFAULT_MAX_RESULTS: usize = 20;
const MAX_MAX_RESULTS: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct VideosListParams {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadsParams {
    #[serde(default)]
    pub video_id: String,
    pub max_results: Option<usize>,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub kind: String,
    pub etag: String,
    pub page_info: PageInfo,
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_results: usize,
    pub results_per_page: usize,
}

impl<T> ListResponse<T> {
    fn new(kind: &str, items: Vec<T>) -> Self {
        Self {
            kind: kind.to_string(),
            etag: format!("etag-{}-{}", kind.trim_start_matches("youtube#"), items.len()),
            page_info: PageInfo {
                total_results: items.len(),
                results_per_page: items.len(),
            },
            items,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub kind: String,
    pub id: SearchResultId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    pub kind: String,
    pub video_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub channel_id: String,
    pub title: String,
    pub live_broadcast_content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub kind: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub published_at: String,
    pub title: String,
    pub description: String,
}

/// Counters are strings on the real API too
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub kind: String,
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    pub video_id: String,
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelComment {
    pub kind: String,
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub author_display_name: String,
    pub author_profile_image_url: String,
    pub text_display: String,
    pub like_count: u64,
    pub published_at: String,
}

/// Error body in the shape the real API uses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail {
            code: status.as_u16(),
            message: message.to_string(),
        },
    };
    (status, Json(body)).into_response()
}

fn require_key(key: &str) -> Result<(), Response> {
    if key.trim().is_empty() {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "The request is missing a valid API key.",
        ));
    }
    Ok(())
}

fn parts(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

async fn search(State(catalog): State<Arc<Catalog>>, Query(params): Query<SearchParams>) -> Response {
    if let Err(rejection) = require_key(&params.key) {
        return rejection;
    }
    if !parts(&params.part).contains(&"snippet") {
        return error_response(StatusCode::BAD_REQUEST, "Required parameter: part");
    }

    // only live broadcasts are modelled; any other search finds nothing
    let items: Vec<SearchResult> = catalog
        .live_broadcast(&params.channel_id)
        .filter(|_| params.event_type == "live")
        .map(|broadcast| SearchResult {
            kind: "youtube#searchResult".to_string(),
            id: SearchResultId {
                kind: "youtube#video".to_string(),
                video_id: broadcast.video_id,
            },
            snippet: SearchSnippet {
                channel_id: broadcast.channel_id,
                title: broadcast.title,
                live_broadcast_content: "live".to_string(),
            },
        })
        .into_iter()
        .collect();

    tracing::debug!(channel = %params.channel_id, hits = items.len(), "mock search");
    (StatusCode::OK, Json(ListResponse::new("youtube#searchListResponse", items))).into_response()
}

async fn videos_list(
    State(catalog): State<Arc<Catalog>>,
    Query(params): Query<VideosListParams>,
) -> Response {
    if let Err(rejection) = require_key(&params.key) {
        return rejection;
    }

    // Parse which parts are requested
    let requested = parts(&params.part);
    let include_snippet = requested.is_empty() || requested.contains(&"snippet");
    let include_statistics = requested.is_empty() || requested.contains(&"statistics");

    let ids = parts(&params.id);
    let items: Vec<Video> = catalog
        .get_videos(&ids)
        .into_iter()
        .map(|video| Video {
            kind: "youtube#video".to_string(),
            id: video.id,
            snippet: include_snippet.then(|| VideoSnippet {
                published_at: video.published_at.to_rfc3339(),
                title: video.title,
                description: video.description,
            }),
            statistics: include_statistics.then(|| VideoStatistics {
                view_count: video.view_count.to_string(),
                like_count: video.like_count.map(|count| count.to_string()),
            }),
        })
        .collect();

    (StatusCode::OK, Json(ListResponse::new("youtube#videoListResponse", items))).into_response()
}

async fn comment_threads(
    State(catalog): State<Arc<Catalog>>,
    Query(params): Query<CommentThreadsParams>,
) -> Response {
    if let Err(rejection) = require_key(&params.key) {
        return rejection;
    }
    if params.video_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No filter selected.");
    }

    let max_results = params
        .max_results
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .min(MAX_MAX_RESULTS);
    let items: Vec<CommentThread> = catalog
        .get_comments(&params.video_id, max_results)
        .into_iter()
        .map(|comment| CommentThread {
            kind: "youtube#commentThread".to_string(),
            id: comment.id.clone(),
            snippet: CommentThreadSnippet {
                video_id: params.video_id.clone(),
                top_level_comment: TopLevelComment {
                    kind: "youtube#comment".to_string(),
                    id: comment.id,
                    snippet: CommentSnippet {
                        author_display_name: comment.author,
                        author_profile_image_url: comment.author_profile_img,
                        text_display: comment.text,
                        like_count: comment.like_count,
                        published_at: comment.published_at.to_rfc3339(),
                    },
                },
            },
        })
        .collect();

    (
        StatusCode::OK,
        Json(ListResponse::new("youtube#commentThreadListResponse", items)),
    )
        .into_response()
}

/// Create the router for the data API, mounted under the API prefix
pub fn create_router(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/videos", get(videos_list))
        .route("/commentThreads", get(comment_threads))
        .with_state(catalog)
}
