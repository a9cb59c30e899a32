//! Offline stand-in for the parts of the YouTube Data API the site reads.
//!
//! Serves `search`, `videos` and `commentThreads` from an in-memory
//! [`Catalog`], plus a small control API to start broadcasts and add content.

use axum::Router;
use std::sync::Arc;

mod api;
mod catalog;
mod control;

pub use catalog::{Catalog, MockLiveBroadcast, SEED_CHANNEL_ID, SEED_VIDEO_IDS};
pub use control::{CreateCommentRequest, CreateVideoRequest};

/// Path the data API is mounted under
pub const API_PREFIX: &str = "/youtube/v3";

/// Path the control API is mounted under
pub const CONTROL_PREFIX: &str = "/control";

/// Create the router serving both the data and control APIs
pub fn create_router(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .nest(API_PREFIX, api::create_router(catalog.clone()))
        .nest(CONTROL_PREFIX, control::create_router(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_key_is_forbidden() {
        let app = create_router(Arc::new(Catalog::seeded()));
        let (status, body) = call(app, get("/youtube/v3/videos?part=snippet&id=mSeGecrtEqM")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], 403);
    }

    #[tokio::test]
    async fn videos_carry_string_statistics() {
        let app = create_router(Arc::new(Catalog::seeded()));
        let (status, body) = call(
            app,
            get("/youtube/v3/videos?part=snippet,statistics&id=mSeGecrtEqM,59Dm0YYiBEk&key=k"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0]["statistics"]["viewCount"].is_string());
        assert_eq!(items[1]["id"], "59Dm0YYiBEk");
    }

    #[tokio::test]
    async fn control_api_starts_and_ends_broadcasts() {
        let catalog = Arc::new(Catalog::seeded());
        let app = create_router(catalog.clone());
        let search = format!(
            "/youtube/v3/search?part=snippet&channelId={}&type=video&eventType=live&key=k",
            SEED_CHANNEL_ID
        );

        let (_, body) = call(app.clone(), get(&search)).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 0);

        let (status, _) = call(
            app.clone(),
            send_json(
                "PUT",
                "/control/live",
                json!({"channelId": SEED_CHANNEL_ID, "videoId": "X", "title": "T"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(app.clone(), get(&search)).await;
        assert_eq!(body["items"][0]["id"]["videoId"], "X");
        assert_eq!(body["items"][0]["snippet"]["title"], "T");

        let request = Request::delete("/control/live").body(Body::empty()).unwrap();
        let (status, _) = call(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(catalog.live_broadcast(SEED_CHANNEL_ID), None);
    }

    #[tokio::test]
    async fn posted_comments_are_listed() {
        let catalog = Arc::new(Catalog::new());
        let app = create_router(catalog);

        let (status, _) = call(
            app.clone(),
            send_json(
                "POST",
                "/control/comments",
                json!({
                    "videoId": "v1",
                    "author": "Ana",
                    "text": "first!",
                    "publishedAt": "2024-11-03T10:00:00Z"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = call(
            app,
            get("/youtube/v3/commentThreads?part=snippet&videoId=v1&maxResults=20&key=k"),
        )
        .await;
        let snippet = &body["items"][0]["snippet"]["topLevelComment"]["snippet"];
        assert_eq!(snippet["authorDisplayName"], "Ana");
        assert_eq!(snippet["textDisplay"], "first!");
    }
}
