//! Response shapes of the YouTube Data API v3, limited to the fields the site reads.

use crate::YouTubeError;
use chrono::{DateTime, Utc};
use domain::{Comment, LiveStream, Video};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    pub id: SearchResultId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResultId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchSnippet {
    pub title: String,
}

impl SearchResult {
    /// Channel and playlist hits carry no video id and cannot be embedded
    pub fn into_live_stream(self) -> Option<LiveStream> {
        Some(LiveStream {
            id: self.id.video_id?,
            title: self.snippet.title,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoResource {
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub published_at: DateTime<Utc>,
}

/// Counters arrive as decimal strings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
}

impl VideoResource {
    pub fn into_video(self) -> Result<Video, YouTubeError> {
        let view_count = parse_count("viewCount", self.statistics.view_count.as_deref())?;
        let like_count = parse_count("likeCount", self.statistics.like_count.as_deref())?;
        Ok(Video {
            id: self.id,
            title: self.snippet.title,
            description: self.snippet.description,
            published_at: self.snippet.published_at,
            view_count: view_count.unwrap_or(0),
            like_count,
        })
    }
}

fn parse_count(field: &'static str, raw: Option<&str>) -> Result<Option<u64>, YouTubeError> {
    raw.map(|value| {
        value
            .parse::<u64>()
            .map_err(|_| YouTubeError::Malformed(format!("{field} is not a number: {value:?}")))
    })
    .transpose()
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentSnippet {
    pub author_display_name: String,
    pub text_display: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub author_profile_image_url: String,
    #[serde(default)]
    pub like_count: u64,
}

impl CommentThread {
    pub fn into_comment(self) -> Comment {
        let snippet = self.snippet.top_level_comment.snippet;
        Comment {
            id: self.id,
            author: snippet.author_display_name,
            text: snippet.text_display,
            published_at: snippet.published_at,
            author_profile_img: snippet.author_profile_image_url,
            like_count: snippet.like_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_yields_live_streams() {
        let body = r#"{"kind":"youtube#searchListResponse","items":[
            {"id":{"kind":"youtube#video","videoId":"X"},"snippet":{"title":"T","channelId":"c"}},
            {"id":{"kind":"youtube#channel","channelId":"c"},"snippet":{"title":"chan"}}
        ]}"#;
        let response: ListResponse<SearchResult> = serde_json::from_str(body).unwrap();
        let streams: Vec<LiveStream> = response
            .items
            .into_iter()
            .filter_map(SearchResult::into_live_stream)
            .collect();
        assert_eq!(
            streams,
            vec![LiveStream {
                id: "X".into(),
                title: "T".into()
            }]
        );
    }

    #[test]
    fn missing_items_reads_as_empty() {
        let response: ListResponse<SearchResult> =
            serde_json::from_str(r#"{"kind":"youtube#searchListResponse"}"#).unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn video_counters_are_parsed_from_strings() {
        let body = r#"{"id":"abc","snippet":{"title":"Piece","description":"d",
            "publishedAt":"2024-11-02T18:30:00Z"},
            "statistics":{"viewCount":"12345","commentCount":"3"}}"#;
        let video = serde_json::from_str::<VideoResource>(body)
            .unwrap()
            .into_video()
            .unwrap();
        assert_eq!(video.view_count, 12345);
        // hidden like counts are simply absent
        assert_eq!(video.like_count, None);
        assert_eq!(video.published_at.to_rfc3339(), "2024-11-02T18:30:00+00:00");
    }

    #[test]
    fn non_numeric_counter_is_malformed() {
        let body = r#"{"id":"abc","snippet":{"title":"Piece","publishedAt":"2024-11-02T18:30:00Z"},
            "statistics":{"viewCount":"lots"}}"#;
        let err = serde_json::from_str::<VideoResource>(body)
            .unwrap()
            .into_video()
            .unwrap_err();
        assert!(matches!(err, YouTubeError::Malformed(_)));
    }

    #[test]
    fn comment_thread_flattens_top_level_comment() {
        let body = r#"{"id":"t1","snippet":{"videoId":"abc","topLevelComment":{"id":"c1","snippet":{
            "authorDisplayName":"Ana","textDisplay":"so good","publishedAt":"2024-11-03T09:00:00Z",
            "authorProfileImageUrl":"https://yt3.ggpht.com/a.jpg","likeCount":4}}}}"#;
        let comment = serde_json::from_str::<CommentThread>(body).unwrap().into_comment();
        assert_eq!(comment.id, "t1");
        assert_eq!(comment.author, "Ana");
        assert_eq!(comment.text, "so good");
        assert_eq!(comment.like_count, 4);
        assert_eq!(comment.author_profile_img, "https://yt3.ggpht.com/a.jpg");
    }
}
