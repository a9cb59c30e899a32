use datastore::{StoreError, TallyStore, TallySubscription};
use domain::{LocalVoteState, Video, VoteOption, VoteResults, VoteTally};
use serde::Serialize;
use std::sync::Arc;
use vote_guard::{LocalStorage, VoteGuard};
use youtube_client::{MAX_COMMENTS, VideoSource};

mod comments;

pub use comments::{COMMENT_PREVIEW, CommentList, PLACEHOLDER_AVATAR, avatar_url};

/// The two pieces of the current match
pub const DEFAULT_VIDEO_IDS: [&str; 2] = ["mSeGecrtEqM", "59Dm0YYiBEk"];

pub const THANK_YOU: &str = "Thanks for voting! Your support helps determine the winner.";

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("vote was not recorded: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// The vote committed; carries the tally it produced
    Recorded(VoteTally),
    /// This client voted before, nothing was sent
    AlreadyVoted,
}

#[derive(Debug, Clone)]
pub struct VoteViewConfig {
    pub video_ids: Vec<String>,
    pub max_comments: u32,
}

impl Default for VoteViewConfig {
    fn default() -> Self {
        Self {
            video_ids: DEFAULT_VIDEO_IDS.iter().map(|id| id.to_string()).collect(),
            max_comments: MAX_COMMENTS,
        }
    }
}

/// Toggle state a page can carry between loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub current: VoteOption,
    pub show_details: bool,
    pub comments_expanded: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current: VoteOption::First,
            show_details: false,
            comments_expanded: false,
        }
    }
}

/// Render model of one vote control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteButton {
    pub option: usize,
    pub label: String,
    pub enabled: bool,
    /// The option this client picked
    pub chosen: bool,
}

/// The voting page: two pieces, their comments, and the shared tally.
///
/// Remote content and the vote store are injected so tests can run on fakes.
pub struct VoteView<S> {
    videos: Arc<dyn VideoSource>,
    store: Arc<dyn TallyStore>,
    tally: TallySubscription,
    guard: VoteGuard<S>,
    config: VoteViewConfig,
    pieces: Vec<Video>,
    comments: CommentList,
    state: ViewState,
    loading_comments: bool,
}

impl<S: LocalStorage> VoteView<S> {
    /// Create a view with its own subscription to the tally
    pub fn new(
        videos: Arc<dyn VideoSource>,
        store: Arc<dyn TallyStore>,
        guard: VoteGuard<S>,
        config: VoteViewConfig,
    ) -> Self {
        let tally = store.subscribe();
        Self::with_subscription(videos, store, tally, guard, config)
    }

    /// Create a view that shares an existing tally subscription
    pub fn with_subscription(
        videos: Arc<dyn VideoSource>,
        store: Arc<dyn TallyStore>,
        tally: TallySubscription,
        guard: VoteGuard<S>,
        config: VoteViewConfig,
    ) -> Self {
        Self {
            videos,
            store,
            tally,
            guard,
            config,
            pieces: Vec::new(),
            comments: CommentList::default(),
            state: ViewState::default(),
            loading_comments: true,
        }
    }

    pub fn restore(&mut self, state: ViewState) {
        self.state = state;
        self.comments.set_expanded(state.comments_expanded);
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            comments_expanded: self.comments.is_expanded(),
            ..self.state
        }
    }

    /// Mount: fetch both pieces, then the comments of the selected one
    pub async fn load(&mut self) {
        self.load_videos().await;
        if !self.pieces.is_empty() {
            self.load_comments().await;
        }
    }

    pub async fn load_videos(&mut self) {
        match self.videos.videos(&self.config.video_ids).await {
            Ok(pieces) => {
                tracing::debug!(count = pieces.len(), "loaded vote pieces");
                self.pieces = pieces;
            }
            Err(err) => tracing::error!(error = %err, "loading videos failed"),
        }
    }

    /// Fetch comments for the selected piece. On failure the previous list stays.
    pub async fn load_comments(&mut self) {
        self.loading_comments = true;
        if let Some(video_id) = self.current_video().map(|video| video.id.clone()) {
            match self.videos.comments(&video_id, self.config.max_comments).await {
                Ok(comments) => self.comments.replace(comments),
                Err(err) => tracing::error!(error = %err, video = %video_id, "loading comments failed"),
            }
        }
        self.loading_comments = false;
    }

    /// Both pieces are known and the page can render
    pub fn is_ready(&self) -> bool {
        self.pieces.len() >= 2
    }

    pub fn is_loading_comments(&self) -> bool {
        self.loading_comments
    }

    pub fn pieces(&self) -> &[Video] {
        &self.pieces
    }

    pub fn current(&self) -> VoteOption {
        self.state.current
    }

    pub fn current_video(&self) -> Option<&Video> {
        self.pieces.get(self.state.current.index())
    }

    pub fn comments(&self) -> &CommentList {
        &self.comments
    }

    pub fn show_details(&self) -> bool {
        self.state.show_details
    }

    /// Flip to the other piece. Details collapse; comment expansion is kept.
    pub async fn switch_piece(&mut self) {
        self.state.current = self.state.current.other();
        self.state.show_details = false;
        self.load_comments().await;
    }

    pub fn toggle_details(&mut self) {
        self.state.show_details = !self.state.show_details;
    }

    pub fn toggle_comments(&mut self) {
        self.comments.toggle();
    }

    /// Latest mirrored tally; a record that does not exist yet reads as zero
    pub fn tally(&self) -> VoteTally {
        self.tally.current().unwrap_or_default()
    }

    pub fn results(&self) -> VoteResults {
        self.tally().results()
    }

    pub fn local_state(&self) -> LocalVoteState {
        self.guard.state()
    }

    pub fn can_vote(&self) -> bool {
        !self.guard.has_voted()
    }

    /// Cast this client's single vote.
    ///
    /// A client that already voted is a no-op. Otherwise the increment runs as
    /// an optimistic transaction on the shared record, and only a committed
    /// vote is written to the local guard. Failures are logged and leave the
    /// guard unset so the visitor can try again.
    pub async fn cast_vote(&mut self, option: VoteOption) -> Result<CastOutcome, VoteError> {
        if self.guard.has_voted() {
            tracing::debug!(option = option.index(), "ignoring repeat vote");
            return Ok(CastOutcome::AlreadyVoted);
        }

        let update = move |current: Option<&VoteTally>| VoteTally::apply_vote(current, option);
        match self.store.transaction(&update).await {
            Ok(tally) => {
                self.guard.record(option);
                tracing::info!(option = option.index(), total = tally.total(), "vote recorded");
                Ok(CastOutcome::Recorded(tally))
            }
            Err(err) => {
                tracing::error!(error = %err, option = option.index(), "casting vote failed");
                Err(err.into())
            }
        }
    }

    pub fn vote_buttons(&self) -> Vec<VoteButton> {
        let local = self.guard.state();
        VoteOption::ALL
            .iter()
            .map(|&option| {
                let number = option.label_number();
                let chosen = local.has_voted && local.voted_for == Some(option);
                let label = match (local.has_voted, chosen) {
                    (false, _) => format!("Vote for Piece {number}"),
                    (true, true) => format!("You voted for Piece {number}!"),
                    (true, false) => format!("Piece {number}"),
                };
                VoteButton {
                    option: option.index(),
                    label,
                    enabled: !local.has_voted,
                    chosen,
                }
            })
            .collect()
    }

    pub fn thank_you(&self) -> Option<&'static str> {
        self.guard.has_voted().then_some(THANK_YOU)
    }

    pub fn guard(&self) -> &VoteGuard<S> {
        &self.guard
    }

    pub fn into_guard(self) -> VoteGuard<S> {
        self.guard
    }
}
