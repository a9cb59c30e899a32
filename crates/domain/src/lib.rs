use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base url for the embeddable YouTube player
pub const EMBED_BASE_URL: &str = "https://www.youtube.com/embed";

/// Base url for the public YouTube watch page
pub const WATCH_BASE_URL: &str = "https://www.youtube.com/watch";

/// Represents a broadcast that is live right now on the watched channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStream {
    pub id: String,
    pub title: String,
}

/// Represents one of the competing video pieces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub view_count: u64,
    /// Absent when the uploader hides the like count
    pub like_count: Option<u64>,
}

/// Represents a top-level comment on a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub author_profile_img: String,
    pub like_count: u64,
}

/// One of the two pieces a visitor can vote for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOption {
    First,
    Second,
}

impl VoteOption {
    pub const ALL: [VoteOption; 2] = [VoteOption::First, VoteOption::Second];

    /// Zero-based index used on the wire and in local storage
    pub fn index(self) -> usize {
        match self {
            VoteOption::First => 0,
            VoteOption::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(VoteOption::First),
            1 => Some(VoteOption::Second),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            VoteOption::First => VoteOption::Second,
            VoteOption::Second => VoteOption::First,
        }
    }

    /// One-based number shown to visitors ("Piece 1", "Piece 2")
    pub fn label_number(self) -> usize {
        self.index() + 1
    }
}

/// The shared vote record stored at the tally path
///
/// Counters missing from a stored record read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    #[serde(default)]
    pub votes1: u64,
    #[serde(default)]
    pub votes2: u64,
    #[serde(default)]
    pub active: bool,
}

impl VoteTally {
    /// Computes the record that results from one vote for `option`.
    ///
    /// This is the update handed to the store's optimistic commit, so it must
    /// stay a pure function of the current record.
    pub fn apply_vote(current: Option<&VoteTally>, option: VoteOption) -> VoteTally {
        match current {
            None => VoteTally {
                votes1: u64::from(option == VoteOption::First),
                votes2: u64::from(option == VoteOption::Second),
                active: true,
            },
            Some(tally) => {
                let mut next = *tally;
                match option {
                    VoteOption::First => next.votes1 = next.votes1.saturating_add(1),
                    VoteOption::Second => next.votes2 = next.votes2.saturating_add(1),
                }
                next
            }
        }
    }

    pub fn votes_for(&self, option: VoteOption) -> u64 {
        match option {
            VoteOption::First => self.votes1,
            VoteOption::Second => self.votes2,
        }
    }

    pub fn total(&self) -> u64 {
        self.votes1.saturating_add(self.votes2)
    }

    pub fn results(&self) -> VoteResults {
        let total = self.total();
        VoteResults {
            votes1: self.votes1,
            votes2: self.votes2,
            total,
            percent1: percentage(self.votes1, total),
            percent2: percentage(self.votes2, total),
        }
    }
}

/// Display-ready share of the vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoteResults {
    pub votes1: u64,
    pub votes2: u64,
    pub total: u64,
    pub percent1: f64,
    pub percent2: f64,
}

impl VoteResults {
    pub fn percent_for(&self, option: VoteOption) -> f64 {
        match option {
            VoteOption::First => self.percent1,
            VoteOption::Second => self.percent2,
        }
    }

    pub fn votes_for(&self, option: VoteOption) -> u64 {
        match option {
            VoteOption::First => self.votes1,
            VoteOption::Second => self.votes2,
        }
    }
}

/// Share of `total` held by `count`, in percent rounded to one decimal.
/// Returns 0 when nobody has voted yet.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// What this browser remembers about its own vote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVoteState {
    pub has_voted: bool,
    pub voted_for: Option<VoteOption>,
}

pub fn embed_url(video_id: &str) -> String {
    format!("{}/{}", EMBED_BASE_URL, video_id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("{}?v={}", WATCH_BASE_URL, video_id)
}
