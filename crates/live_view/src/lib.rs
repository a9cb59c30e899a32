use domain::{LiveStream, embed_url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use youtube_client::LiveStatusSource;

/// Channel that hosts the match broadcasts
pub const DEFAULT_CHANNEL_ID: &str = "UCeLZvLUb0tXMK3hXBbM01ag";

/// How often the channel is re-checked
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Shortest accepted poll interval; shorter ones are raised to it
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub const PLACEHOLDER_HEADLINE: &str = "No Live Stream Currently";
pub const PLACEHOLDER_HINT: &str = "Check back later for the next live match";
pub const LIVE_BADGE: &str = "LIVE";

/// Outcome of the latest poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LiveState {
    Live(LiveStream),
    #[default]
    Offline,
}

impl LiveState {
    pub fn display(&self) -> LiveDisplay {
        match self {
            LiveState::Live(stream) => LiveDisplay::Embed {
                video_id: stream.id.clone(),
                embed_url: embed_url(&stream.id),
                title: stream.title.clone(),
                badge: LIVE_BADGE,
            },
            LiveState::Offline => LiveDisplay::Placeholder {
                headline: PLACEHOLDER_HEADLINE,
                hint: PLACEHOLDER_HINT,
            },
        }
    }
}

/// What the landing page shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveDisplay {
    Embed {
        video_id: String,
        embed_url: String,
        title: String,
        badge: &'static str,
    },
    Placeholder {
        headline: &'static str,
        hint: &'static str,
    },
}

/// Runs one poll. Failures are logged and read as "nothing live".
pub async fn check_live_status(source: &dyn LiveStatusSource, channel_id: &str) -> LiveState {
    match source.live_streams(channel_id).await {
        Ok(streams) => match streams.into_iter().next() {
            Some(stream) => {
                tracing::debug!(video = %stream.id, "channel is live");
                LiveState::Live(stream)
            }
            None => LiveState::Offline,
        },
        Err(err) => {
            tracing::warn!(error = %err, channel = channel_id, "checking live status failed");
            LiveState::Offline
        }
    }
}

/// Background poller mirroring the channel's live status.
///
/// Polls immediately, then on every interval tick. Dropping the view stops
/// the poller.
pub struct LiveView {
    state: watch::Receiver<LiveState>,
    poller: JoinHandle<()>,
}

impl LiveView {
    pub fn spawn(source: Arc<dyn LiveStatusSource>, channel_id: impl Into<String>, interval: Duration) -> Self {
        let channel_id = channel_id.into();
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (tx, state) = watch::channel(LiveState::Offline);

        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let next = check_live_status(source.as_ref(), &channel_id).await;
                tx.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    tracing::info!(live = matches!(next, LiveState::Live(_)), "live status changed");
                    *current = next;
                    true
                });
            }
        });

        Self { state, poller }
    }

    pub fn state(&self) -> LiveState {
        self.state.borrow().clone()
    }

    pub fn display(&self) -> LiveDisplay {
        self.state.borrow().display()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveState> {
        self.state.clone()
    }

    pub fn shutdown(self) {
        // Drop aborts the poller
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use youtube_client::YouTubeError;

    /// Replays scripted answers, repeating the last one
    struct ScriptedSource {
        answers: Mutex<VecDeque<Result<Vec<LiveStream>, String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(answers: Vec<Result<Vec<LiveStream>, String>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LiveStatusSource for ScriptedSource {
        async fn live_streams(&self, _channel_id: &str) -> Result<Vec<LiveStream>, YouTubeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock().unwrap();
            let answer = if answers.len() > 1 {
                answers.pop_front().unwrap()
            } else {
                answers.front().cloned().unwrap_or(Ok(Vec::new()))
            };
            answer.map_err(YouTubeError::Malformed)
        }
    }

    fn stream(id: &str, title: &str) -> LiveStream {
        LiveStream {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn zero_items_render_placeholder() {
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);
        let state = check_live_status(source.as_ref(), "c").await;
        assert_eq!(state, LiveState::Offline);
        assert_eq!(
            state.display(),
            LiveDisplay::Placeholder {
                headline: PLACEHOLDER_HEADLINE,
                hint: PLACEHOLDER_HINT
            }
        );
    }

    #[tokio::test]
    async fn first_item_is_embedded() {
        let source = ScriptedSource::new(vec![Ok(vec![stream("X", "T"), stream("Y", "U")])]);
        let state = check_live_status(source.as_ref(), "c").await;
        match state.display() {
            LiveDisplay::Embed {
                video_id,
                embed_url,
                title,
                badge,
            } => {
                assert_eq!(video_id, "X");
                assert_eq!(embed_url, "https://www.youtube.com/embed/X");
                assert_eq!(title, "T");
                assert_eq!(badge, "LIVE");
            }
            other => panic!("expected embed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failures_read_as_offline() {
        let source = ScriptedSource::new(vec![Err("boom".to_string())]);
        assert_eq!(check_live_status(source.as_ref(), "c").await, LiveState::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_every_interval() {
        let source = ScriptedSource::new(vec![
            Ok(Vec::new()),
            Ok(vec![stream("X", "T")]),
            Err("quota".to_string()),
        ]);
        let view = LiveView::spawn(source.clone(), "c", DEFAULT_POLL_INTERVAL);
        let mut updates = view.subscribe();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(view.state(), LiveState::Offline);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        updates.changed().await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(view.state(), LiveState::Live(stream("X", "T")));

        // an error on the next poll drops back to the placeholder
        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        updates.changed().await.unwrap();
        assert_eq!(source.calls(), 3);
        assert_eq!(view.state(), LiveState::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_raised_to_the_minimum() {
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);
        let view = LiveView::spawn(source.clone(), "c", Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);
        tokio::time::sleep(MIN_POLL_INTERVAL).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(view.state(), LiveState::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_view_stops_polling() {
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);
        let view = LiveView::spawn(source.clone(), "c", Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);

        view.shutdown();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.calls(), 1);
    }
}
