use async_trait::async_trait;
use domain::VoteTally;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

mod firebase;
mod memory;
mod sse;

pub use firebase::{FirebaseConfig, FirebaseTallyStore};
pub use memory::InMemoryTallyStore;

/// Default location of the match record in the realtime database
pub const DEFAULT_TALLY_PATH: &str = "matches/match1";

/// Attempts made by a transaction before it gives up on a contended record
pub const MAX_TRANSACTION_RETRIES: usize = 25;

/// Update function handed to [`TallyStore::transaction`].
///
/// Receives the current record (`None` when it does not exist yet) and
/// returns the record to commit. It may run several times.
pub type TallyUpdate = dyn Fn(Option<&VoteTally>) -> VoteTally + Send + Sync;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request to tally store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tally store answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("tally record is malformed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("tally store did not return an ETag")]
    MissingETag,

    #[error("transaction gave up after {0} conflicting attempts")]
    TooManyRetries(usize),
}

/// Storage abstraction for the shared vote record.
/// Implementations decide how the optimistic commit detects conflicts.
#[async_trait]
pub trait TallyStore: Send + Sync {
    /// Read the record once
    async fn read(&self) -> Result<Option<VoteTally>, StoreError>;

    /// Read-modify-write the record, retrying on concurrent writes until the
    /// commit lands or the retry budget is spent. Returns the committed record.
    async fn transaction(&self, update: &TallyUpdate) -> Result<VoteTally, StoreError>;

    /// Continuous view of the record
    fn subscribe(&self) -> TallySubscription;
}

/// Live mirror of the tally record.
///
/// Clones share the same listener; a background listener task (if any) is
/// aborted when the last clone is dropped.
#[derive(Clone)]
pub struct TallySubscription {
    receiver: watch::Receiver<Option<VoteTally>>,
    _listener: Option<Arc<ListenerGuard>>,
}

impl TallySubscription {
    pub fn new(receiver: watch::Receiver<Option<VoteTally>>) -> Self {
        Self {
            receiver,
            _listener: None,
        }
    }

    /// Ties the lifetime of `task` to this subscription and its clones
    pub fn with_listener(receiver: watch::Receiver<Option<VoteTally>>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            _listener: Some(Arc::new(ListenerGuard(task))),
        }
    }

    /// Latest record seen, `None` while the record does not exist
    pub fn current(&self) -> Option<VoteTally> {
        *self.receiver.borrow()
    }

    /// Wait for the next remote change. Returns `None` once the source is gone.
    pub async fn changed(&mut self) -> Option<Option<VoteTally>> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// Stream of records, starting with the current one. The stream keeps
    /// the listener alive.
    pub fn into_stream(self) -> impl Stream<Item = Option<VoteTally>> + Send + Unpin {
        let listener = self._listener;
        WatchStream::new(self.receiver).map(move |tally| {
            let _keep = &listener;
            tally
        })
    }
}

struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn subscription_reports_changes() {
        let (tx, rx) = watch::channel(None);
        let mut subscription = TallySubscription::new(rx);
        assert_eq!(subscription.current(), None);

        let tally = VoteTally {
            votes1: 2,
            votes2: 1,
            active: true,
        };
        tx.send_replace(Some(tally));
        assert_eq!(subscription.changed().await, Some(Some(tally)));
        assert_eq!(subscription.current(), Some(tally));

        drop(tx);
        assert_eq!(subscription.changed().await, None);
    }

    #[tokio::test]
    async fn stream_starts_with_current_record() {
        let tally = VoteTally {
            votes1: 1,
            votes2: 0,
            active: true,
        };
        let (_tx, rx) = watch::channel(Some(tally));
        let mut stream = TallySubscription::new(rx).into_stream();
        assert_eq!(stream.next().await, Some(Some(tally)));
    }

    #[tokio::test]
    async fn dropping_last_clone_aborts_listener() {
        let (_tx, rx) = watch::channel(None);
        let (alive_tx, mut alive_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        });
        let subscription = TallySubscription::with_listener(rx, task);
        let clone = subscription.clone();

        drop(subscription);
        tokio::task::yield_now().await;
        assert_eq!(alive_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty));

        drop(clone);
        assert!(alive_rx.await.is_err());
    }
}
