use chrono::{TimeZone, Utc};
use domain::{Comment, Video};
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Channel whose broadcasts the seeded catalog knows about
pub const SEED_CHANNEL_ID: &str = "UCeLZvLUb0tXMK3hXBbM01ag";

/// The two competing pieces of the seeded catalog
pub const SEED_VIDEO_IDS: [&str; 2] = ["mSeGecrtEqM", "59Dm0YYiBEk"];

const SEED_COMMENTS_PER_VIDEO: usize = 25;

/// A broadcast that search reports as live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockLiveBroadcast {
    pub channel_id: String,
    pub video_id: String,
    pub title: String,
}

/// In-memory content served by the mock API
pub struct Catalog {
    videos: RwLock<Vec<Video>>,
    comments: RwLock<HashMap<String, Vec<Comment>>>,
    live: RwLock<Option<MockLiveBroadcast>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            videos: RwLock::new(Vec::new()),
            comments: RwLock::new(HashMap::new()),
            live: RwLock::new(None),
        }
    }

    /// Create a catalog holding the two pieces with generated comments
    pub fn seeded() -> Self {
        let catalog = Self::new();
        catalog.populate_dummy_data();
        catalog
    }

    fn populate_dummy_data(&self) {
        // Fixed point in time for consistent dummy data
        let fixed_time = Utc
            .with_ymd_and_hms(2024, 11, 2, 18, 0, 0)
            .single()
            .expect("Fixed datetime should be valid");

        for (i, id) in SEED_VIDEO_IDS.iter().enumerate() {
            self.add_video(Video {
                id: id.to_string(),
                title: format!("TezTones Match 1 - Piece {}", i + 1),
                description: format!("Live art battle entry {}.\nPainted in one session.", i + 1),
                published_at: fixed_time,
                view_count: 1200 + 311 * i as u64,
                like_count: Some(87 + 13 * i as u64),
            });

            for n in 0..SEED_COMMENTS_PER_VIDEO {
                let author: String = Name().fake();
                let text: String = Sentence(3..12).fake();
                self.add_comment(
                    id,
                    Comment {
                        id: format!("Ug{}", uuid::Uuid::new_v4().simple()),
                        author,
                        text,
                        published_at: fixed_time + chrono::Duration::minutes(n as i64),
                        author_profile_img: String::new(),
                        like_count: (n % 7) as u64,
                    },
                );
            }
        }
    }

    /// Insert or replace a video, keeping insertion order
    pub fn add_video(&self, video: Video) {
        let mut videos = self
            .videos
            .write()
            .expect("Failed to acquire write lock on videos");
        match videos.iter_mut().find(|existing| existing.id == video.id) {
            Some(existing) => *existing = video,
            None => videos.push(video),
        }
    }

    pub fn add_comment(&self, video_id: &str, comment: Comment) {
        self.comments
            .write()
            .expect("Failed to acquire write lock on comments")
            .entry(video_id.to_string())
            .or_default()
            .push(comment);
    }

    /// Videos matching `ids`, in request order; unknown ids are skipped
    pub fn get_videos(&self, ids: &[&str]) -> Vec<Video> {
        let videos = self
            .videos
            .read()
            .expect("Failed to acquire read lock on videos");
        ids.iter()
            .filter_map(|id| videos.iter().find(|video| video.id == *id).cloned())
            .collect()
    }

    pub fn get_comments(&self, video_id: &str, max_results: usize) -> Vec<Comment> {
        self.comments
            .read()
            .expect("Failed to acquire read lock on comments")
            .get(video_id)
            .map(|comments| comments.iter().take(max_results).cloned().collect())
            .unwrap_or_default()
    }

    pub fn go_live(&self, broadcast: MockLiveBroadcast) {
        *self.live.write().expect("Failed to acquire write lock on live") = Some(broadcast);
    }

    pub fn end_live(&self) {
        *self.live.write().expect("Failed to acquire write lock on live") = None;
    }

    /// Live broadcast on `channel_id`, if any
    pub fn live_broadcast(&self, channel_id: &str) -> Option<MockLiveBroadcast> {
        self.live
            .read()
            .expect("Failed to acquire read lock on live")
            .as_ref()
            .filter(|broadcast| broadcast.channel_id == channel_id)
            .cloned()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_catalog_has_both_pieces() {
        let catalog = Catalog::seeded();
        let videos = catalog.get_videos(&SEED_VIDEO_IDS);
        assert_eq!(videos.len(), 2);
        assert_eq!(
            catalog.get_comments(SEED_VIDEO_IDS[1], 100).len(),
            SEED_COMMENTS_PER_VIDEO
        );
    }

    #[test]
    fn videos_come_back_in_request_order() {
        let catalog = Catalog::seeded();
        let reversed = [SEED_VIDEO_IDS[1], "unknown", SEED_VIDEO_IDS[0]];
        let ids: Vec<String> = catalog
            .get_videos(&reversed)
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![SEED_VIDEO_IDS[1], SEED_VIDEO_IDS[0]]);
    }

    #[test]
    fn live_broadcast_is_scoped_to_its_channel() {
        let catalog = Catalog::new();
        assert_eq!(catalog.live_broadcast(SEED_CHANNEL_ID), None);

        let broadcast = MockLiveBroadcast {
            channel_id: SEED_CHANNEL_ID.to_string(),
            video_id: "v".to_string(),
            title: "t".to_string(),
        };
        catalog.go_live(broadcast.clone());
        assert_eq!(catalog.live_broadcast(SEED_CHANNEL_ID), Some(broadcast));
        assert_eq!(catalog.live_broadcast("elsewhere"), None);

        catalog.end_live();
        assert_eq!(catalog.live_broadcast(SEED_CHANNEL_ID), None);
    }
}
