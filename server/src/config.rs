use clap::Parser;
use datastore::DEFAULT_TALLY_PATH;
use std::net::SocketAddr;
use std::time::Duration;
use youtube_client::DEFAULT_BASE_URL;

/// API key handed to the local mock, which only checks that one is present
const MOCK_API_KEY: &str = "mock-key";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a YouTube API key is required (set YOUTUBE_API_KEY or pass --mock-youtube)")]
    MissingApiKey,

    #[error("two video ids are required, got {0}")]
    NotEnoughVideos(usize),

    #[error("live poll interval must be at least one second")]
    ZeroPollInterval,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "teztones", version, about = "TezTones live stream and voting site")]
pub struct Config {
    /// Address the site listens on
    #[arg(long, env = "TEZTONES_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    #[arg(long, env = "YOUTUBE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub youtube_base_url: String,

    /// Channel checked for live broadcasts
    #[arg(long, env = "YOUTUBE_CHANNEL_ID", default_value = live_view::DEFAULT_CHANNEL_ID)]
    pub channel_id: String,

    /// The two competing pieces, comma separated
    #[arg(
        long,
        env = "VOTE_VIDEO_IDS",
        value_delimiter = ',',
        default_values_t = vote_view::DEFAULT_VIDEO_IDS.map(String::from)
    )]
    pub video_ids: Vec<String>,

    /// Realtime database holding the tally; an in-memory tally is used when absent
    #[arg(long, env = "FIREBASE_DATABASE_URL")]
    pub firebase_url: Option<String>,

    #[arg(long, env = "FIREBASE_AUTH", hide_env_values = true)]
    pub firebase_auth: Option<String>,

    #[arg(long, env = "TALLY_PATH", default_value = DEFAULT_TALLY_PATH)]
    pub tally_path: String,

    /// Seconds between live status checks
    #[arg(long, env = "LIVE_POLL_SECS", default_value_t = 300)]
    pub live_poll_secs: u64,

    /// Serve the offline YouTube API on a local port and read from it
    #[arg(long)]
    pub mock_youtube: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mock_youtube && self.api_key().is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.video_ids.len() < 2 {
            return Err(ConfigError::NotEnoughVideos(self.video_ids.len()));
        }
        if self.live_poll_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Key sent to the API; the mock accepts any non-empty key
    pub fn api_key(&self) -> Option<&str> {
        match self.youtube_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Some(key),
            _ if self.mock_youtube => Some(MOCK_API_KEY),
            _ => None,
        }
    }

    pub fn live_poll_interval(&self) -> Duration {
        Duration::from_secs(self.live_poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["teztones"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_current_match() {
        let config = parse(&["--youtube-api-key", "k"]);
        assert_eq!(config.video_ids, vec!["mSeGecrtEqM", "59Dm0YYiBEk"]);
        assert_eq!(config.tally_path, "matches/match1");
        assert_eq!(config.live_poll_interval(), Duration::from_secs(300));
        assert_eq!(config.youtube_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn video_ids_split_on_commas() {
        let config = parse(&["--youtube-api-key", "k", "--video-ids", "a,b"]);
        assert_eq!(config.video_ids, vec!["a", "b"]);

        let config = parse(&["--youtube-api-key", "k", "--video-ids", "a"]);
        assert_eq!(config.validate(), Err(ConfigError::NotEnoughVideos(1)));
    }

    #[test]
    fn api_key_is_required_unless_mocking() {
        let config = parse(&["--youtube-api-key", "  "]);
        assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));

        let config = parse(&["--youtube-api-key", " ", "--mock-youtube"]);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.api_key(), Some(MOCK_API_KEY));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = parse(&["--youtube-api-key", "k", "--live-poll-secs", "0"]);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));
    }
}
