use crate::catalog::{Catalog, MockLiveBroadcast};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for creating a new video
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    pub like_count: Option<u64>,
}

/// Request body for creating a new top-level comment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub id: Option<String>,
    pub video_id: String,
    pub author: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub author_profile_img: String,
    #[serde(default)]
    pub like_count: u64,
}

/// Response for successful changes
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
}

fn ok(status: StatusCode, message: String) -> impl IntoResponse {
    (
        status,
        Json(ControlResponse {
            success: true,
            message,
        }),
    )
}

/// Handler for creating a new video
async fn create_video(
    State(catalog): State<Arc<Catalog>>,
    Json(request): Json<CreateVideoRequest>,
) -> impl IntoResponse {
    let id = request.id.clone();
    catalog.add_video(domain::Video {
        id: request.id,
        title: request.title,
        description: request.description,
        published_at: request.published_at,
        view_count: request.view_count,
        like_count: request.like_count,
    });
    ok(StatusCode::CREATED, format!("Video '{}' created successfully", id))
}

/// Handler for creating a new comment
async fn create_comment(
    State(catalog): State<Arc<Catalog>>,
    Json(request): Json<CreateCommentRequest>,
) -> impl IntoResponse {
    let id = request
        .id
        .unwrap_or_else(|| format!("Ug{}", uuid::Uuid::new_v4().simple()));
    catalog.add_comment(
        &request.video_id,
        domain::Comment {
            id: id.clone(),
            author: request.author,
            text: request.text,
            published_at: request.published_at,
            author_profile_img: request.author_profile_img,
            like_count: request.like_count,
        },
    );
    ok(StatusCode::CREATED, format!("Comment '{}' created successfully", id))
}

/// Handler that starts a broadcast
async fn start_live(
    State(catalog): State<Arc<Catalog>>,
    Json(broadcast): Json<MockLiveBroadcast>,
) -> impl IntoResponse {
    tracing::info!(video = %broadcast.video_id, channel = %broadcast.channel_id, "mock broadcast started");
    let message = format!("Video '{}' is live", broadcast.video_id);
    catalog.go_live(broadcast);
    ok(StatusCode::OK, message)
}

/// Handler that ends the current broadcast
async fn stop_live(State(catalog): State<Arc<Catalog>>) -> impl IntoResponse {
    catalog.end_live();
    ok(StatusCode::OK, "Broadcast ended".to_string())
}

/// Create the router for the control API
pub fn create_router(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/videos", post(create_video))
        .route("/comments", post(create_comment))
        .route("/live", put(start_live).delete(stop_live))
        .with_state(catalog)
}
