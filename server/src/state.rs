use crate::config::Config;
use crate::error::StartupError;
use datastore::{FirebaseConfig, FirebaseTallyStore, InMemoryTallyStore, TallyStore, TallySubscription};
use live_view::LiveView;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use vote_guard::{LocalStorage, VoteGuard};
use vote_view::{VoteView, VoteViewConfig};
use youtube_client::{LiveStatusSource, VideoSource, YouTubeClient};
use youtube_mock::{API_PREFIX, Catalog};

/// Shared handles every request works from
#[derive(Clone)]
pub struct AppState {
    pub live: Arc<LiveView>,
    pub videos: Arc<dyn VideoSource>,
    pub store: Arc<dyn TallyStore>,
    /// One long-lived mirror of the tally shared by all vote pages
    pub tally: TallySubscription,
    pub vote_config: VoteViewConfig,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, StartupError> {
        let base_url = if config.mock_youtube {
            let addr = spawn_mock_youtube().await?;
            format!("http://{addr}{API_PREFIX}")
        } else {
            config.youtube_base_url.clone()
        };
        let api_key = config.api_key().unwrap_or_default();
        let client = Arc::new(YouTubeClient::new(api_key).with_base_url(base_url));
        info!(base_url = client.base_url(), "using YouTube Data API");

        let store: Arc<dyn TallyStore> = match &config.firebase_url {
            Some(url) => {
                let mut firebase = FirebaseConfig::new(url.clone());
                firebase.path = config.tally_path.clone();
                firebase.auth = config.firebase_auth.clone();
                info!(database = %url, path = %firebase.path, "using Firebase tally store");
                Arc::new(FirebaseTallyStore::new(firebase))
            }
            None => {
                info!("no database configured, keeping the tally in memory");
                Arc::new(InMemoryTallyStore::new())
            }
        };

        let live_source: Arc<dyn LiveStatusSource> = client.clone();
        let live = LiveView::spawn(live_source, config.channel_id.clone(), config.live_poll_interval());
        let vote_config = VoteViewConfig {
            video_ids: config.video_ids.clone(),
            ..VoteViewConfig::default()
        };

        Ok(Self::from_parts(live, client, store, vote_config))
    }

    pub fn from_parts(
        live: LiveView,
        videos: Arc<dyn VideoSource>,
        store: Arc<dyn TallyStore>,
        vote_config: VoteViewConfig,
    ) -> Self {
        let tally = store.subscribe();
        Self {
            live: Arc::new(live),
            videos,
            store,
            tally,
            vote_config,
        }
    }

    /// A fresh vote page for one visitor, sharing the tally mirror
    pub fn vote_view<S: LocalStorage>(&self, guard: VoteGuard<S>) -> VoteView<S> {
        VoteView::with_subscription(
            self.videos.clone(),
            self.store.clone(),
            self.tally.clone(),
            guard,
            self.vote_config.clone(),
        )
    }
}

/// Serve the offline YouTube API on a loopback port for the life of the process
async fn spawn_mock_youtube() -> Result<SocketAddr, StartupError> {
    let requested: SocketAddr = ([127, 0, 0, 1], 0).into();
    let listener = TcpListener::bind(requested)
        .await
        .map_err(|source| StartupError::Bind { addr: requested, source })?;
    let addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { addr: requested, source })?;

    let app = youtube_mock::create_router(Arc::new(Catalog::seeded()));
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!(error = %err, "mock YouTube API stopped");
        }
    });

    info!(%addr, "serving mock YouTube API");
    Ok(addr)
}
